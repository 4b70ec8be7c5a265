//! Sink error types

use thiserror::Error;

/// Sink-specific errors
#[derive(Debug, Error)]
pub enum SinkError {
    /// Sink creation error
    #[error("failed to create sink '{name}': {message}")]
    SinkCreation { name: String, message: String },

    /// Required parameter missing from the sink's `params`
    #[error("sink '{name}' is missing required param '{param}'")]
    MissingParam { name: String, param: &'static str },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SinkError {
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }
}
