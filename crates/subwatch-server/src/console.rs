//! Line-oriented operator console.
//!
//! Commands update the in-memory lookup service and raise the matching
//! change signal, standing in for the platform's own change broadcasts.

use std::fmt::Write as _;
use std::str::FromStr;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::info;

use subwatch_core::{
    FnTarget, InMemoryLookup, Notification, RegistryKind, SharedMonitor, SharedTarget,
    SubscriptionId,
};

use crate::error::Error;
use crate::signal::SignalHandle;

const HELP: &str =
    "commands: bind <slot> <sub>, unbind <slot>, default <sub|none>, show, stats, help, quit";

/// A parsed console command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Bind { slot: usize, subscription_id: SubscriptionId },
    Unbind { slot: usize },
    Default { subscription_id: SubscriptionId },
    Show,
    Stats,
    Help,
    Quit,
}

fn parse_slot(token: Option<&str>) -> Result<usize, Error> {
    let token = token.ok_or_else(|| Error::Command("missing slot".to_string()))?;
    token
        .parse()
        .map_err(|_| Error::Command(format!("invalid slot '{}'", token)))
}

fn parse_subscription(token: Option<&str>) -> Result<SubscriptionId, Error> {
    match token {
        None => Err(Error::Command("missing subscription id".to_string())),
        Some("none") => Ok(SubscriptionId::INVALID),
        Some(token) => token
            .parse::<i32>()
            .map(SubscriptionId::new)
            .map_err(|_| Error::Command(format!("invalid subscription id '{}'", token))),
    }
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut tokens = line.split_whitespace();
        let keyword = tokens
            .next()
            .ok_or_else(|| Error::Command("empty command".to_string()))?;

        let command = match keyword.to_ascii_lowercase().as_str() {
            "bind" => Command::Bind {
                slot: parse_slot(tokens.next())?,
                subscription_id: parse_subscription(tokens.next())?,
            },
            "unbind" => Command::Unbind {
                slot: parse_slot(tokens.next())?,
            },
            "default" => Command::Default {
                subscription_id: parse_subscription(tokens.next())?,
            },
            "show" => Command::Show,
            "stats" => Command::Stats,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(Error::Command(format!("unknown command '{}'", other))),
        };

        if let Some(extra) = tokens.next() {
            return Err(Error::Command(format!("unexpected argument '{}'", extra)));
        }
        Ok(command)
    }
}

/// Operator console bound to a lookup, a monitor and its signal processor.
pub struct Console {
    lookup: Arc<InMemoryLookup>,
    monitor: SharedMonitor,
    signals: SignalHandle,
}

impl Console {
    /// Create a console.
    pub fn new(lookup: Arc<InMemoryLookup>, monitor: SharedMonitor, signals: SignalHandle) -> Self {
        Self {
            lookup,
            monitor,
            signals,
        }
    }

    /// Execute one command, returning the text to show the operator.
    pub async fn execute(&self, command: Command) -> Result<String, Error> {
        match command {
            Command::Bind {
                slot,
                subscription_id,
            } => {
                self.lookup.bind(slot, subscription_id)?;
                self.signals.subscriptions_changed().await?;
                Ok(format!("slot {} -> {}", slot, subscription_id))
            }
            Command::Unbind { slot } => {
                self.lookup.unbind(slot)?;
                self.signals.subscriptions_changed().await?;
                Ok(format!("slot {} unbound", slot))
            }
            Command::Default { subscription_id } => {
                self.lookup.set_default_data(subscription_id);
                self.signals.default_data_changed().await?;
                Ok(format!("default data -> {}", subscription_id))
            }
            Command::Show => Ok(self.render_state()),
            Command::Stats => Ok(format!("{:?}", self.monitor.stats())),
            Command::Help | Command::Quit => Ok(HELP.to_string()),
        }
    }

    fn render_state(&self) -> String {
        let snapshot = self.monitor.snapshot();
        let mut out = String::new();
        for (slot, id) in snapshot.bindings.iter().enumerate() {
            let marker = if snapshot.default_data_slot == Some(slot) {
                " (default data)"
            } else {
                ""
            };
            let _ = writeln!(out, "slot {}: {}{}", slot, id, marker);
        }
        let _ = write!(out, "default data subscription: {}", snapshot.default_data);
        out
    }

    /// Read commands from `input` until `quit` or end of input.
    pub async fn run<R>(&self, input: R) -> Result<(), Error>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        println!("{}", HELP);

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match line.parse::<Command>() {
                Ok(Command::Quit) => break,
                Ok(command) => match self.execute(command).await {
                    Ok(output) => println!("{}", output),
                    Err(Error::SignalChannelClosed) => return Err(Error::SignalChannelClosed),
                    Err(e) => println!("error: {}", e),
                },
                Err(e) => println!("error: {}", e),
            }
        }

        Ok(())
    }
}

/// Observer target that logs every notification it receives.
pub fn log_target() -> SharedTarget {
    FnTarget::shared(|notification: Notification| {
        info!(
            kind = %notification.kind,
            slot = notification.slot,
            subscription_id = %notification.subscription_id,
            is_default_data = notification.is_default_data,
            default_data = %notification.default_data,
            "slot notification"
        );
        Ok(())
    })
}

/// Register `target` on every slot of both registries.
pub fn register_everywhere(monitor: &SharedMonitor, target: &SharedTarget) -> Result<(), Error> {
    for slot in 0..monitor.slot_count() {
        for kind in RegistryKind::ALL {
            match kind {
                RegistryKind::SubscriptionChanged => {
                    monitor.register_for_subscription_changed(slot, target.clone(), 0, None)?
                }
                RegistryKind::DefaultDataChanged => {
                    monitor.register_for_default_data_changed(slot, target.clone(), 0, None)?
                }
            };
        }
    }
    Ok(())
}
