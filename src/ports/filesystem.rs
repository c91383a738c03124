use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use http::HeaderMap;
use tokio::io::AsyncRead;

use crate::domain::{
    errors::StorageResult,
    models::{Entry, FileContents, FileStream, ObjectMetadata},
    value_objects::AccessControl,
};

/// Lazily fetched directory listing
pub type EntryStream = BoxStream<'static, StorageResult<Entry>>;

/// Source handed to the streaming write operations
pub type ByteReader = Box<dyn AsyncRead + Send + Unpin>;

/// File-system capability contract offered to the host application.
///
/// Paths are logical paths relative to the adapter root and are trusted to be
/// normalized by the caller.
#[async_trait]
pub trait Filesystem: Send + Sync {
    /// Write a new file, returning the store's response headers
    async fn write(&self, path: &str, contents: Bytes) -> StorageResult<HeaderMap>;

    /// Write a new file from a reader; the reader is consumed and dropped
    /// before the upload is issued
    async fn write_stream(&self, path: &str, reader: ByteReader) -> StorageResult<HeaderMap>;

    /// Overwrite a file
    async fn update(&self, path: &str, contents: Bytes) -> StorageResult<HeaderMap>;

    /// Overwrite a file from a reader
    async fn update_stream(&self, path: &str, reader: ByteReader) -> StorageResult<HeaderMap>;

    /// Move a file. Not atomic: the source is removed only after the copy
    /// succeeded, and a failed removal leaves both paths present.
    async fn rename(&self, path: &str, new_path: &str) -> StorageResult<()>;

    async fn copy(&self, path: &str, new_path: &str) -> StorageResult<()>;

    /// Delete a file; deleting a missing file succeeds
    async fn delete(&self, path: &str) -> StorageResult<()>;

    async fn delete_dir(&self, dir: &str) -> StorageResult<()>;

    async fn create_dir(&self, dir: &str) -> StorageResult<Entry>;

    async fn set_visibility(&self, path: &str, visibility: AccessControl) -> StorageResult<()>;

    async fn has(&self, path: &str) -> StorageResult<bool>;

    async fn read(&self, path: &str) -> StorageResult<FileContents>;

    async fn read_stream(&self, path: &str) -> StorageResult<FileStream>;

    /// List a directory. Pages are fetched on demand; dropping the stream and
    /// calling this again restarts from the first page.
    fn list_contents(&self, dir: &str, recursive: bool) -> EntryStream;

    async fn get_metadata(&self, path: &str) -> StorageResult<ObjectMetadata>;

    async fn get_size(&self, path: &str) -> StorageResult<u64>;

    async fn get_mimetype(&self, path: &str) -> StorageResult<String>;

    async fn get_timestamp(&self, path: &str) -> StorageResult<DateTime<Utc>>;

    async fn get_visibility(&self, path: &str) -> StorageResult<AccessControl>;
}
