//! Error types for hotdogjobs.
//!
//! Library crates use [`HotdogError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all hotdogjobs operations.
#[derive(Debug, thiserror::Error)]
pub enum HotdogError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// A stage tried to set a job field that an earlier stage already set.
    #[error("field `{field}` is already assigned")]
    AlreadyAssigned { field: &'static str },

    /// A job reached a stage without a field the stage depends on.
    #[error("field `{field}` is missing")]
    MissingField { field: &'static str },

    /// The inbound channel of a stage was closed. Signals a clean shutdown.
    #[error("channel `{channel}` is closed")]
    ChannelClosed { channel: &'static str },

    /// A job could not be handed to the next stage and was dropped.
    #[error("stage `{stage}` could not deliver job: downstream channel closed")]
    SendFailure { stage: &'static str },

    /// Publishing a finished job to a completion sink failed.
    #[error("sink error: {0}")]
    Sink(String),

    /// HTTP listener could not bind or stopped with an error.
    #[error("server error: {0}")]
    Server(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (an ingested record is not fresh, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// JSON encoding or decoding error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, HotdogError>;

impl HotdogError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
