//! Change-signal processing.
//!
//! External change signals are turned into messages on a channel and handled
//! one at a time by a single processor task, so the monitor only ever sees
//! serialized update requests.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use subwatch_core::SharedMonitor;

use crate::error::Error;

/// A "something changed, re-poll" signal from the lookup side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSignal {
    /// One or more slot bindings may have changed.
    SubscriptionsChanged,
    /// The default-data subscription may have changed.
    DefaultDataChanged,
}

/// Processor that applies change signals to the monitor.
pub struct SignalProcessor {
    /// Receiver for change signals.
    rx: mpsc::Receiver<ChangeSignal>,
    /// Monitor the signals are applied to.
    monitor: SharedMonitor,
}

impl SignalProcessor {
    /// Create a new signal processor.
    pub fn new(rx: mpsc::Receiver<ChangeSignal>, monitor: SharedMonitor) -> Self {
        Self { rx, monitor }
    }

    /// Run until the channel is closed.
    pub async fn run(mut self) {
        info!("signal processor started");

        while let Some(signal) = self.rx.recv().await {
            if let Err(e) = self.process(signal) {
                // The next signal re-polls everything
                warn!(?signal, error = %e, "failed to process change signal");
            }
        }

        info!("signal processor stopped (channel closed)");
    }

    /// Apply a single signal.
    pub fn process(&self, signal: ChangeSignal) -> Result<(), Error> {
        match signal {
            ChangeSignal::SubscriptionsChanged => {
                let changed = self.monitor.on_subscriptions_changed()?;
                debug!(?changed, "subscriptions changed signal processed");
            }
            ChangeSignal::DefaultDataChanged => {
                let change = self.monitor.on_default_data_changed()?;
                debug!(?change, "default data signal processed");
            }
        }
        Ok(())
    }
}

/// Signal channel sender.
pub type SignalSender = mpsc::Sender<ChangeSignal>;

/// Signal channel receiver.
pub type SignalReceiver = mpsc::Receiver<ChangeSignal>;

/// Create a new signal channel with the given buffer size.
pub fn channel(buffer_size: usize) -> (SignalSender, SignalReceiver) {
    mpsc::channel(buffer_size)
}

/// Handle for submitting change signals.
#[derive(Clone)]
pub struct SignalHandle {
    tx: SignalSender,
}

impl SignalHandle {
    /// Create a new signal handle.
    pub fn new(tx: SignalSender) -> Self {
        Self { tx }
    }

    /// Submit a signal without waiting. Fails if the queue is full.
    pub fn try_send(
        &self,
        signal: ChangeSignal,
    ) -> Result<(), mpsc::error::TrySendError<ChangeSignal>> {
        self.tx.try_send(signal)
    }

    /// Submit a signal, waiting if the queue is full.
    pub async fn send(&self, signal: ChangeSignal) -> Result<(), Error> {
        self.tx
            .send(signal)
            .await
            .map_err(|_| Error::SignalChannelClosed)
    }

    /// Signal that slot bindings may have changed.
    pub async fn subscriptions_changed(&self) -> Result<(), Error> {
        self.send(ChangeSignal::SubscriptionsChanged).await
    }

    /// Signal that the default-data subscription may have changed.
    pub async fn default_data_changed(&self) -> Result<(), Error> {
        self.send(ChangeSignal::DefaultDataChanged).await
    }
}

/// Start a signal processor and return a handle for sending signals.
pub fn start_processor(monitor: SharedMonitor, buffer_size: usize) -> SignalHandle {
    let (tx, rx) = channel(buffer_size);
    let processor = SignalProcessor::new(rx, monitor);

    tokio::spawn(async move {
        processor.run().await;
    });

    SignalHandle::new(tx)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use subwatch_core::{
        channel_target, InMemoryLookup, MonitorConfig, SubscriptionId, SubscriptionMonitor,
    };

    use super::*;

    fn setup() -> (Arc<InMemoryLookup>, SharedMonitor) {
        let lookup = Arc::new(InMemoryLookup::with_bindings(
            vec![SubscriptionId::new(1), SubscriptionId::new(2)],
            SubscriptionId::new(1),
        ));
        let monitor =
            Arc::new(SubscriptionMonitor::new(MonitorConfig::new(2), lookup.clone()).unwrap());
        (lookup, monitor)
    }

    #[tokio::test]
    async fn test_processor_applies_signals_in_order() {
        let (lookup, monitor) = setup();
        let (target, mut rx_notes) = channel_target();
        monitor
            .register_for_default_data_changed(1, target, 0, None)
            .unwrap();
        rx_notes.try_recv().unwrap();

        let (tx, rx) = channel(10);
        let processor = SignalProcessor::new(rx, monitor.clone());
        let handle = tokio::spawn(async move {
            processor.run().await;
        });

        lookup.bind(0, SubscriptionId::new(3)).unwrap();
        tx.send(ChangeSignal::SubscriptionsChanged).await.unwrap();
        lookup.set_default_data(SubscriptionId::new(2));
        tx.send(ChangeSignal::DefaultDataChanged).await.unwrap();

        // Close the channel and wait for the processor to drain it
        drop(tx);
        handle.await.unwrap();

        assert_eq!(monitor.subscription_for_slot(0).unwrap(), SubscriptionId::new(3));
        assert_eq!(monitor.default_data_slot(), Some(1));
        let note = rx_notes.try_recv().unwrap();
        assert!(note.is_default_data);
    }

    #[tokio::test]
    async fn test_processor_survives_lookup_failure() {
        let (lookup, monitor) = setup();
        let (tx, rx) = channel(10);
        let processor = SignalProcessor::new(rx, monitor.clone());
        let handle = tokio::spawn(processor.run());

        lookup.bind(1, SubscriptionId::new(9)).unwrap();
        lookup.set_available(false);
        tx.send(ChangeSignal::SubscriptionsChanged).await.unwrap();
        tx.send(ChangeSignal::DefaultDataChanged).await.unwrap();
        drop(tx);
        handle.await.unwrap();

        assert_eq!(monitor.subscription_for_slot(1).unwrap(), SubscriptionId::new(2));
        assert_eq!(monitor.stats().lookup_failures, 2);
    }

    #[test]
    fn test_process_directly() {
        let (lookup, monitor) = setup();
        let (_tx, rx) = channel(1);
        let processor = SignalProcessor::new(rx, monitor.clone());

        lookup.unbind(0).unwrap();
        processor.process(ChangeSignal::SubscriptionsChanged).unwrap();
        assert_eq!(monitor.default_data_slot(), None);
    }

    #[tokio::test]
    async fn test_handle_try_send_and_clone() {
        let (_lookup, monitor) = setup();
        let handle1 = start_processor(monitor, 10);
        let handle2 = handle1.clone();

        assert!(handle1.try_send(ChangeSignal::SubscriptionsChanged).is_ok());
        assert!(handle2.try_send(ChangeSignal::DefaultDataChanged).is_ok());
        assert!(handle2.subscriptions_changed().await.is_ok());
    }

    #[tokio::test]
    async fn test_send_after_processor_gone() {
        let (tx, rx) = channel(1);
        drop(rx);
        let handle = SignalHandle::new(tx);
        assert!(matches!(
            handle.default_data_changed().await,
            Err(Error::SignalChannelClosed)
        ));
    }
}
