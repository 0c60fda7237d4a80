//! Server error types.

use thiserror::Error;

/// Server errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Monitor error.
    #[error("monitor error: {0}")]
    Monitor(#[from] subwatch_core::Error),

    /// Lookup service error.
    #[error("lookup error: {0}")]
    Lookup(#[from] subwatch_core::LookupError),

    /// Bindings file could not be parsed.
    #[error("bindings file error: {0}")]
    Bindings(#[from] serde_json::Error),

    /// The signal processor is no longer running.
    #[error("signal channel closed")]
    SignalChannelClosed,

    /// Unrecognized console command.
    #[error("invalid command: {0}")]
    Command(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
