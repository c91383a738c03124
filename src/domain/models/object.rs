use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use http::HeaderMap;

use crate::domain::{errors::StorageResult, value_objects::AccessControl};

/// Metadata about an object, normalized from a metadata request
#[derive(Debug, Clone)]
pub struct ObjectMetadata {
    pub content_length: u64,
    pub last_modified: DateTime<Utc>,
    pub content_type: String,
    /// Adapter-level access control, never queried per object
    pub visibility: AccessControl,
    pub etag: Option<String>,
    /// Full header set returned with the metadata
    pub headers: HeaderMap,
}

/// Object body read fully into memory
#[derive(Debug, Clone, PartialEq)]
pub struct FileContents {
    pub path: String,
    pub contents: Bytes,
}

/// Object body opened as a byte stream
pub struct FileStream {
    pub path: String,
    pub stream: BoxStream<'static, StorageResult<Bytes>>,
}

impl std::fmt::Debug for FileStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStream")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
