//! Subwatch Server library.
//!
//! Process-level wiring around the subscription monitor: configuration,
//! change-signal processing and the operator console.

pub mod bindings;
pub mod config;
pub mod console;
pub mod error;
pub mod signal;

pub use bindings::BindingsFile;
pub use config::{Args, WatchConfig};
pub use console::{Command, Console};
pub use error::Error;
pub use signal::{start_processor, ChangeSignal, SignalHandle, SignalProcessor};
