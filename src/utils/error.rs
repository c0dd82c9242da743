use crate::core::workflow::{Action, Step};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VessError {
    #[error("Validation error on {field}: {message}")]
    ValidationError { field: String, message: String },

    #[error("Cannot {action} from the {from} step")]
    InvalidTransition { from: Step, action: Action },

    #[error("{message}")]
    SyncError {
        message: String,
        #[source]
        source: Box<VessError>,
    },

    #[error("Remote error ({status}): {message}")]
    RemoteError { status: u16, message: String },

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Network,
    Remote,
    Configuration,
    Io,
}

impl VessError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        VessError::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Wraps a failed store operation, keeping the underlying cause.
    pub fn sync(source: VessError) -> Self {
        VessError::SyncError {
            message: source.to_string(),
            source: Box::new(source),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            VessError::SyncError { source, .. } => source.category(),
            VessError::ValidationError { .. } | VessError::InvalidTransition { .. } => {
                ErrorCategory::Validation
            }
            VessError::ApiError(_) => ErrorCategory::Network,
            VessError::RemoteError { .. }
            | VessError::Unauthorized { .. }
            | VessError::SerializationError(_) => ErrorCategory::Remote,
            VessError::ConfigError { .. } | VessError::InvalidConfigValue { .. } => {
                ErrorCategory::Configuration
            }
            VessError::CsvError(_) | VessError::IoError(_) => ErrorCategory::Io,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            VessError::SyncError { source, .. } => source.user_friendly_message(),
            VessError::ValidationError { field, message } => {
                format!("Check the field '{}': {}", field, message)
            }
            VessError::Unauthorized { .. } => "Your session is no longer valid".to_string(),
            VessError::ApiError(_) => "Could not reach the evaluation service".to_string(),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        if let VessError::SyncError { source, .. } = self {
            return source.recovery_suggestion();
        }
        match self.category() {
            ErrorCategory::Validation => "Correct the highlighted input and try again",
            ErrorCategory::Network => "Check your connection and retry the operation",
            ErrorCategory::Remote => match self {
                VessError::Unauthorized { .. } => "Log in again to obtain a fresh token",
                _ => "Refresh the list or retry the operation",
            },
            ErrorCategory::Configuration => "Review the configuration file and CLI flags",
            ErrorCategory::Io => "Check that the file path exists and is writable",
        }
    }
}

pub type Result<T> = std::result::Result<T, VessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(
            VessError::validation("name", "empty").category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            VessError::RemoteError {
                status: 500,
                message: "boom".to_string()
            }
            .category(),
            ErrorCategory::Remote
        );
        assert_eq!(
            VessError::ConfigError {
                message: "bad".to_string()
            }
            .category(),
            ErrorCategory::Configuration
        );
    }

    #[test]
    fn test_sync_error_displays_message_verbatim() {
        let err = VessError::sync(VessError::RemoteError {
            status: 404,
            message: "Avaliação não encontrada".to_string(),
        });
        assert_eq!(err.to_string(), "Remote error (404): Avaliação não encontrada");
        assert_eq!(err.category(), ErrorCategory::Remote);
    }

    #[test]
    fn test_sync_error_delegates_to_cause() {
        let err = VessError::sync(VessError::Unauthorized {
            message: "Token expirado".to_string(),
        });
        assert_eq!(err.category(), ErrorCategory::Remote);
        assert_eq!(err.recovery_suggestion(), "Log in again to obtain a fresh token");
        assert_eq!(err.user_friendly_message(), "Your session is no longer valid");
        assert!(std::error::Error::source(&err).is_some());
    }
}
