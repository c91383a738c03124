use http::StatusCode;

use crate::domain::value_objects::ObjectKey;

/// Errors that can occur during storage operations
#[derive(Debug, Clone)]
pub enum StorageError {
    /// The store answered with a structured error envelope
    RemoteOperation {
        code: Option<String>,
        message: String,
        request_id: Option<String>,
    },

    /// Object not found, with the store's message when it sent one
    ObjectNotFound {
        key: ObjectKey,
        message: Option<String>,
    },

    /// The store answered with a failure status and no envelope
    RemoteStatus { status: StatusCode },

    /// Unsupported operation
    UnsupportedOperation { operation: String, reason: String },

    /// A response could not be normalized (missing header, malformed listing)
    InvalidResponse { message: String },

    /// Validation error
    ValidationError { message: String },

    /// Infrastructure error with external source
    InfrastructureError {
        message: String,
        source: Option<String>, // Store error as string to allow Clone
    },
}

impl StorageError {
    pub fn unsupported(operation: &str, reason: &str) -> Self {
        StorageError::UnsupportedOperation {
            operation: operation.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::ObjectNotFound { .. })
    }

    /// Message supplied by the remote store, if this error carries one
    pub fn remote_message(&self) -> Option<&str> {
        match self {
            StorageError::RemoteOperation { message, .. } => Some(message),
            StorageError::ObjectNotFound { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::RemoteOperation { code, message, .. } => match code {
                Some(code) => write!(f, "OSS error message ({}): {}", code, message),
                None => write!(f, "OSS error message: {}", message),
            },
            StorageError::ObjectNotFound { key, message } => match message {
                Some(message) => write!(f, "Object not found: {}: {}", key, message),
                None => write!(f, "Object not found: {}", key),
            },
            StorageError::RemoteStatus { status } => {
                write!(f, "Remote store responded with status {}", status)
            }
            StorageError::UnsupportedOperation { operation, reason } => {
                write!(f, "Unsupported operation '{}': {}", operation, reason)
            }
            StorageError::InvalidResponse { message } => {
                write!(f, "Invalid response from store: {}", message)
            }
            StorageError::ValidationError { message } => {
                write!(f, "Validation error: {}", message)
            }
            StorageError::InfrastructureError { message, .. } => {
                write!(f, "Infrastructure error: {}", message)
            }
        }
    }
}

impl std::error::Error for StorageError {}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
