use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{error, warn};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {message}")]
    Validation {
        message: String,
        details: Option<JsonValue>,
    },

    #[error("invalid configuration: {message}")]
    Config { message: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(target: "app::validation", %message, "validation error");
        AppError::Validation {
            message,
            details: None,
        }
    }

    pub fn validation_with_details(message: impl Into<String>, details: JsonValue) -> Self {
        let message = message.into();
        warn!(target: "app::validation", %message, details = %details, "validation error with details");
        AppError::Validation {
            message,
            details: Some(details),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(target: "app::config", %message, "configuration error");
        AppError::Config { message }
    }

    pub fn other(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(target: "app::other", %message, "other error");
        AppError::Other(message)
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation { .. })
    }

    pub fn validation_details(&self) -> Option<&JsonValue> {
        match self {
            AppError::Validation { details, .. } => details.as_ref(),
            _ => None,
        }
    }
}

/// Failure raised by a single constraint rule while evaluating a slot.
///
/// Never propagates past the constraint boundary: hard rules that fault are
/// treated as satisfied, soft rules as zero penalty.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConstraintFault {
    #[error("missing context data: {0}")]
    MissingContext(&'static str),

    #[error("{0}")]
    Evaluation(String),
}
