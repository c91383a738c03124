use async_trait::async_trait;
use bytes::Bytes;
use futures::{stream::BoxStream, StreamExt, TryStreamExt};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};

use crate::domain::{
    errors::{StorageError, StorageResult},
    value_objects::{BucketName, ObjectKey},
};

/// Stream of body chunks
pub type ByteStream = BoxStream<'static, StorageResult<Bytes>>;

/// Raw response from the object store, before any translation
#[derive(Debug, Clone)]
pub struct OssResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl OssResponse {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Add a header, silently skipping values that are not valid header text
    pub fn with_header(mut self, name: HeaderName, value: impl AsRef<str>) -> Self {
        if let Ok(value) = HeaderValue::from_str(value.as_ref()) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn is_ok(&self) -> bool {
        self.status.is_success()
    }

    /// Header value as text, if present and valid
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Parameters of a single listing request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListObjectsRequest {
    pub prefix: String,
    /// `None` lists every key under the prefix without grouping
    pub delimiter: Option<String>,
    pub max_keys: u32,
    /// Resume after this key
    pub marker: Option<String>,
}

/// Port for the remote object-store client.
///
/// Implementations issue the authenticated calls and hand back the raw
/// response. They only return `Err` for transport-level failures; remote
/// failures travel inside the `OssResponse`.
#[async_trait]
pub trait OssClient: Send + Sync + 'static {
    /// Upload `body` under `key` with an explicit content length
    async fn put_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        body: Bytes,
        length: u64,
    ) -> StorageResult<OssResponse>;

    /// Server-side copy
    async fn copy_object(
        &self,
        source_bucket: &BucketName,
        source_key: &ObjectKey,
        destination_bucket: &BucketName,
        destination_key: &ObjectKey,
    ) -> StorageResult<OssResponse>;

    async fn delete_object(&self, bucket: &BucketName, key: &ObjectKey)
        -> StorageResult<OssResponse>;

    /// Create the zero-byte marker `key/`
    async fn create_object_dir(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
    ) -> StorageResult<OssResponse>;

    /// Existence check; only the status is meaningful
    async fn is_object_exist(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
    ) -> StorageResult<OssResponse>;

    async fn get_object(&self, bucket: &BucketName, key: &ObjectKey) -> StorageResult<OssResponse>;

    /// Metadata-only request; the body is empty
    async fn get_object_meta(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
    ) -> StorageResult<OssResponse>;

    /// One page of a bucket listing; the body is a `ListBucketResult` document
    async fn list_objects(
        &self,
        bucket: &BucketName,
        request: &ListObjectsRequest,
    ) -> StorageResult<OssResponse>;

    /// Open a byte stream against a request URL handed out by the store
    async fn open_url(&self, url: &str) -> StorageResult<ByteStream> {
        let response = reqwest::get(url)
            .await
            .map_err(|e| StorageError::InfrastructureError {
                message: format!("Failed to open request URL: {}", e),
                source: Some(e.to_string()),
            })?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(StorageError::RemoteStatus {
                status: StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
            });
        }

        Ok(response
            .bytes_stream()
            .map_err(|e| StorageError::InfrastructureError {
                message: format!("Failed to read request URL body: {}", e),
                source: Some(e.to_string()),
            })
            .boxed())
    }
}
