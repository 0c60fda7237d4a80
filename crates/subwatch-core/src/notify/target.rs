//! Delivery targets for notifications.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::DeliveryError;
use crate::types::Notification;

/// Something that can receive notifications.
///
/// Delivery runs while the monitor holds its state lock, so implementations
/// must not block and must not call back into the monitor.
pub trait NotificationTarget: Send + Sync {
    /// Deliver a single notification.
    fn deliver(&self, notification: Notification) -> Result<(), DeliveryError>;
}

/// Shared handle to a notification target.
///
/// Identity is the allocation: two handles name the same observer when they
/// point at the same target.
pub type SharedTarget = Arc<dyn NotificationTarget>;

/// Whether two handles refer to the same target.
pub fn same_target(a: &SharedTarget, b: &SharedTarget) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

impl NotificationTarget for mpsc::UnboundedSender<Notification> {
    fn deliver(&self, notification: Notification) -> Result<(), DeliveryError> {
        self.send(notification).map_err(|_| DeliveryError::Disconnected)
    }
}

impl NotificationTarget for mpsc::Sender<Notification> {
    fn deliver(&self, notification: Notification) -> Result<(), DeliveryError> {
        self.try_send(notification).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryError::Full,
            mpsc::error::TrySendError::Closed(_) => DeliveryError::Disconnected,
        })
    }
}

/// Target backed by a closure.
pub struct FnTarget<F>(F);

impl<F> FnTarget<F>
where
    F: Fn(Notification) -> Result<(), DeliveryError> + Send + Sync,
{
    /// Wrap a closure as a target.
    pub fn new(f: F) -> Self {
        Self(f)
    }

    /// Wrap a closure as a shared target.
    pub fn shared(f: F) -> SharedTarget
    where
        F: 'static,
    {
        Arc::new(Self(f))
    }
}

impl<F> NotificationTarget for FnTarget<F>
where
    F: Fn(Notification) -> Result<(), DeliveryError> + Send + Sync,
{
    fn deliver(&self, notification: Notification) -> Result<(), DeliveryError> {
        (self.0)(notification)
    }
}

/// Create an unbounded channel target and its receiver.
pub fn channel_target() -> (SharedTarget, mpsc::UnboundedReceiver<Notification>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Arc::new(tx), rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RegistryKind, SubscriptionId};

    fn notification() -> Notification {
        Notification {
            kind: RegistryKind::SubscriptionChanged,
            slot: 0,
            what: 1,
            payload: None,
            subscription_id: SubscriptionId::new(3),
            is_default_data: false,
            default_data: SubscriptionId::INVALID,
        }
    }

    #[test]
    fn test_unbounded_target_disconnects() {
        let (target, mut rx) = channel_target();
        target.deliver(notification()).unwrap();
        assert_eq!(rx.try_recv().unwrap().what, 1);

        drop(rx);
        assert_eq!(target.deliver(notification()), Err(DeliveryError::Disconnected));
    }

    #[test]
    fn test_bounded_target_full() {
        let (tx, _rx) = mpsc::channel(1);
        tx.deliver(notification()).unwrap();
        assert_eq!(tx.deliver(notification()), Err(DeliveryError::Full));
    }

    #[test]
    fn test_same_target_identity() {
        let (a, _rx_a) = channel_target();
        let (b, _rx_b) = channel_target();
        let a2 = a.clone();

        assert!(same_target(&a, &a2));
        assert!(!same_target(&a, &b));
    }

    #[test]
    fn test_fn_target() {
        let target = FnTarget::shared(|n: Notification| {
            if n.slot == 0 {
                Ok(())
            } else {
                Err(DeliveryError::Disconnected)
            }
        });
        assert!(target.deliver(notification()).is_ok());
    }
}
