//! Layered error definitions
//!
//! Categorized by source: config / perception / io

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Perception Errors =====
    /// The perception subsystem could not produce a timestamp for a historical time
    #[error("perception timestamp unavailable for target time {target_ticks}: {message}")]
    PerceptionTimestamp { target_ticks: i64, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create perception timestamp error
    pub fn perception_timestamp(target_ticks: i64, message: impl Into<String>) -> Self {
        Self::PerceptionTimestamp {
            target_ticks,
            message: message.into(),
        }
    }
}
