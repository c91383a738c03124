use crate::domain::errors::StorageError;
use std::io;
use thiserror::Error as ThisError;

/// Infrastructure-level failures raised while talking to or decoding from the store
#[derive(ThisError, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("XML decode error: {0}")]
    XmlDecode(#[from] quick_xml::de::DeError),

    #[error("Invalid header '{name}': {message}")]
    InvalidHeader { name: String, message: String },

    #[error("Missing header '{0}'")]
    MissingHeader(String),

    #[error("Invalid listing field '{field}': {message}")]
    InvalidListing { field: String, message: String },

    #[error("{0}")]
    Other(String),
}

/// Convert infrastructure StoreError to domain StorageError
impl From<StoreError> for StorageError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Io(io_err) => StorageError::InfrastructureError {
                message: format!("IO operation failed: {}", io_err),
                source: Some(io_err.to_string()),
            },
            StoreError::XmlDecode(xml_err) => StorageError::InvalidResponse {
                message: format!("Malformed XML body: {}", xml_err),
            },
            err @ (StoreError::InvalidHeader { .. }
            | StoreError::MissingHeader(_)
            | StoreError::InvalidListing { .. }) => StorageError::InvalidResponse {
                message: err.to_string(),
            },
            StoreError::Other(message) => StorageError::InfrastructureError {
                message,
                source: None,
            },
        }
    }
}

/// Convert standard io::Error to domain errors
impl From<io::Error> for StorageError {
    fn from(err: io::Error) -> Self {
        StoreError::Io(err).into()
    }
}
