use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use futures::{StreamExt, TryStreamExt};
use http::{header, HeaderName, StatusCode};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use tokio::sync::RwLock;
use tokio_util::io::ReaderStream;

use crate::{
    adapters::outbound::storage::{error::StoreError, response::REQUEST_URL_HEADER},
    domain::{
        errors::{StorageError, StorageResult},
        value_objects::{BucketName, ObjectKey, SEPARATOR},
    },
    ports::storage::{ByteStream, ListObjectsRequest, OssClient, OssResponse},
};

const URL_SCHEME: &str = "memory://";

/// In-memory object store speaking the same responses as the remote service:
/// status codes, headers, `ListBucketResult` and `<Error>` XML bodies.
///
/// Used for tests and development.
#[derive(Clone)]
pub struct InMemoryOssClient {
    bucket: BucketName,
    data: Arc<RwLock<BTreeMap<String, StoredObject>>>,
    requests: Arc<AtomicUsize>,
}

#[derive(Clone)]
struct StoredObject {
    data: Bytes,
    content_type: String,
    last_modified: DateTime<Utc>,
    etag: String,
}

impl StoredObject {
    fn new(data: Bytes, content_type: String) -> Self {
        let etag = format!("{:X}", md5::compute(&data));
        Self {
            data,
            content_type,
            // HTTP dates carry whole seconds
            last_modified: Utc::now().trunc_subsecs(0),
            etag,
        }
    }
}

impl InMemoryOssClient {
    pub fn new(bucket: BucketName) -> Self {
        Self {
            bucket,
            data: Arc::new(RwLock::new(BTreeMap::new())),
            requests: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of calls served so far
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Raw keys currently stored, in key order
    pub async fn keys(&self) -> Vec<String> {
        self.data.read().await.keys().cloned().collect()
    }

    /// Place an object directly, bypassing the request counter
    pub async fn insert(&self, key: &str, data: impl Into<Bytes>) {
        let data = data.into();
        let object = StoredObject::new(data, guess_content_type(key));
        self.data.write().await.insert(key.to_string(), object);
    }

    fn request_url(&self, key: &str) -> String {
        format!(
            "{}{}/{}",
            URL_SCHEME,
            self.bucket,
            urlencoding::encode(key)
        )
    }

    /// Count the request and reject buckets this store does not hold
    fn begin(&self, bucket: &BucketName) -> Option<OssResponse> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if bucket != &self.bucket {
            return Some(error_response(
                StatusCode::NOT_FOUND,
                "NoSuchBucket",
                "The specified bucket does not exist.",
            ));
        }
        None
    }

    fn object_headers(&self, key: &str, object: &StoredObject) -> OssResponse {
        OssResponse::new(StatusCode::OK)
            .with_header(header::CONTENT_LENGTH, object.data.len().to_string())
            .with_header(header::CONTENT_TYPE, &object.content_type)
            .with_header(
                header::LAST_MODIFIED,
                object
                    .last_modified
                    .format("%a, %d %b %Y %H:%M:%S GMT")
                    .to_string(),
            )
            .with_header(header::ETAG, format!("\"{}\"", object.etag))
            .with_header(
                HeaderName::from_static(REQUEST_URL_HEADER),
                self.request_url(key),
            )
            .with_header(HeaderName::from_static("x-oss-request-id"), request_id())
    }
}

#[async_trait]
impl OssClient for InMemoryOssClient {
    async fn put_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        body: Bytes,
        length: u64,
    ) -> StorageResult<OssResponse> {
        if let Some(rejected) = self.begin(bucket) {
            return Ok(rejected);
        }
        if body.len() as u64 != length {
            return Ok(error_response(
                StatusCode::BAD_REQUEST,
                "InvalidArgument",
                "Content-Length does not match the request body.",
            ));
        }

        let object = StoredObject::new(body, guess_content_type(key.as_str()));
        let etag = object.etag.clone();
        self.data
            .write()
            .await
            .insert(key.as_str().to_string(), object);

        Ok(OssResponse::new(StatusCode::OK)
            .with_header(header::ETAG, format!("\"{}\"", etag))
            .with_header(HeaderName::from_static("x-oss-request-id"), request_id()))
    }

    async fn copy_object(
        &self,
        source_bucket: &BucketName,
        source_key: &ObjectKey,
        destination_bucket: &BucketName,
        destination_key: &ObjectKey,
    ) -> StorageResult<OssResponse> {
        if let Some(rejected) = self.begin(source_bucket) {
            return Ok(rejected);
        }
        if destination_bucket != &self.bucket {
            return Ok(error_response(
                StatusCode::NOT_FOUND,
                "NoSuchBucket",
                "The specified bucket does not exist.",
            ));
        }

        let mut data = self.data.write().await;
        let Some(source) = data.get(source_key.as_str()) else {
            return Ok(no_such_key());
        };
        let copied = StoredObject::new(source.data.clone(), source.content_type.clone());
        let body = copy_result_xml(&copied)?;
        data.insert(destination_key.as_str().to_string(), copied);

        Ok(OssResponse::new(StatusCode::OK)
            .with_header(header::CONTENT_TYPE, "application/xml")
            .with_body(body))
    }

    async fn delete_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
    ) -> StorageResult<OssResponse> {
        if let Some(rejected) = self.begin(bucket) {
            return Ok(rejected);
        }
        self.data.write().await.remove(key.as_str());
        Ok(OssResponse::new(StatusCode::NO_CONTENT))
    }

    async fn create_object_dir(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
    ) -> StorageResult<OssResponse> {
        if let Some(rejected) = self.begin(bucket) {
            return Ok(rejected);
        }
        let mut marker = key.as_str().to_string();
        if !key.is_directory_marker() {
            marker.push(SEPARATOR);
        }
        let object = StoredObject::new(Bytes::new(), "application/octet-stream".to_string());
        let etag = object.etag.clone();
        self.data.write().await.insert(marker, object);

        Ok(OssResponse::new(StatusCode::OK).with_header(header::ETAG, format!("\"{}\"", etag)))
    }

    async fn is_object_exist(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
    ) -> StorageResult<OssResponse> {
        if let Some(rejected) = self.begin(bucket) {
            return Ok(OssResponse::new(rejected.status));
        }
        let status = if self.data.read().await.contains_key(key.as_str()) {
            StatusCode::OK
        } else {
            StatusCode::NOT_FOUND
        };
        Ok(OssResponse::new(status))
    }

    async fn get_object(&self, bucket: &BucketName, key: &ObjectKey) -> StorageResult<OssResponse> {
        if let Some(rejected) = self.begin(bucket) {
            return Ok(rejected);
        }
        let data = self.data.read().await;
        match data.get(key.as_str()) {
            Some(object) => Ok(self
                .object_headers(key.as_str(), object)
                .with_body(object.data.clone())),
            None => Ok(no_such_key()),
        }
    }

    async fn get_object_meta(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
    ) -> StorageResult<OssResponse> {
        if let Some(rejected) = self.begin(bucket) {
            // metadata requests are HEAD requests and never carry a body
            return Ok(OssResponse::new(rejected.status));
        }
        let data = self.data.read().await;
        match data.get(key.as_str()) {
            Some(object) => Ok(self.object_headers(key.as_str(), object)),
            None => Ok(OssResponse::new(StatusCode::NOT_FOUND)),
        }
    }

    async fn list_objects(
        &self,
        bucket: &BucketName,
        request: &ListObjectsRequest,
    ) -> StorageResult<OssResponse> {
        if let Some(rejected) = self.begin(bucket) {
            return Ok(rejected);
        }
        let data = self.data.read().await;
        let page = list_page(&data, request);
        let body = listing_xml(&self.bucket, request, &page)?;

        Ok(OssResponse::new(StatusCode::OK)
            .with_header(header::CONTENT_TYPE, "application/xml")
            .with_body(body))
    }

    async fn open_url(&self, url: &str) -> StorageResult<ByteStream> {
        let Some(location) = url.strip_prefix(URL_SCHEME) else {
            return Err(StorageError::unsupported(
                "open_url",
                "in-memory store only serves memory:// URLs",
            ));
        };
        let (bucket, encoded_key) = location.split_once('/').unwrap_or((location, ""));
        let key = urlencoding::decode(encoded_key).map_err(|e| StorageError::ValidationError {
            message: format!("Invalid request URL '{}': {}", url, e),
        })?;

        self.requests.fetch_add(1, Ordering::SeqCst);
        if bucket != self.bucket.as_str() {
            return Err(StorageError::RemoteStatus {
                status: StatusCode::NOT_FOUND,
            });
        }
        let data = match self.data.read().await.get(&*key) {
            Some(object) => object.data.clone(),
            None => {
                return Err(StorageError::ObjectNotFound {
                    key: ObjectKey::new(key.to_string()),
                    message: None,
                })
            }
        };

        Ok(ReaderStream::new(Cursor::new(data))
            .map_err(StorageError::from)
            .boxed())
    }
}

struct Page<'a> {
    contents: Vec<(&'a String, &'a StoredObject)>,
    common_prefixes: Vec<String>,
    is_truncated: bool,
    next_marker: Option<String>,
}

fn list_page<'a>(
    data: &'a BTreeMap<String, StoredObject>,
    request: &ListObjectsRequest,
) -> Page<'a> {
    let mut page = Page {
        contents: Vec::new(),
        common_prefixes: Vec::new(),
        is_truncated: false,
        next_marker: None,
    };
    let max_keys = request.max_keys.max(1) as usize;
    let marker = request.marker.as_deref().unwrap_or("");
    let delimiter = request.delimiter.as_deref().filter(|d| !d.is_empty());
    let mut emitted = 0usize;

    for (key, object) in data.iter() {
        if !key.starts_with(&request.prefix) || key.as_str() <= marker {
            continue;
        }
        // a marker that is an already emitted common prefix covered every key
        // below it; the listed directory's own marker key covers nothing
        let marker_is_group = marker.len() > request.prefix.len()
            && delimiter.is_some_and(|d| marker.ends_with(d));
        if marker_is_group && key.starts_with(marker) {
            continue;
        }

        let group = delimiter.and_then(|d| {
            key[request.prefix.len()..]
                .find(d)
                .map(|idx| key[..request.prefix.len() + idx + d.len()].to_string())
        });

        if let Some(common_prefix) = group {
            if page.common_prefixes.last() == Some(&common_prefix) {
                continue;
            }
            if emitted == max_keys {
                page.is_truncated = true;
                break;
            }
            page.next_marker = Some(common_prefix.clone());
            page.common_prefixes.push(common_prefix);
        } else {
            if emitted == max_keys {
                page.is_truncated = true;
                break;
            }
            page.next_marker = Some(key.clone());
            page.contents.push((key, object));
        }
        emitted += 1;
    }

    if !page.is_truncated {
        page.next_marker = None;
    }
    page
}

fn write_start(writer: &mut Writer<Cursor<Vec<u8>>>, name: &str) -> Result<(), StoreError> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(|e| StoreError::Other(format!("Failed to write {} start: {}", name, e)))
}

fn write_end(writer: &mut Writer<Cursor<Vec<u8>>>, name: &str) -> Result<(), StoreError> {
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(|e| StoreError::Other(format!("Failed to write {} end: {}", name, e)))
}

fn write_element(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    name: &str,
    text: &str,
) -> Result<(), StoreError> {
    write_start(writer, name)?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(|e| StoreError::Other(format!("Failed to write {} text: {}", name, e)))?;
    write_end(writer, name)
}

fn new_document() -> Result<Writer<Cursor<Vec<u8>>>, StoreError> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(|e| StoreError::Other(format!("Failed to write XML declaration: {}", e)))?;
    Ok(writer)
}

fn listing_xml(
    bucket: &BucketName,
    request: &ListObjectsRequest,
    page: &Page<'_>,
) -> Result<Bytes, StoreError> {
    let mut writer = new_document()?;

    write_start(&mut writer, "ListBucketResult")?;
    write_element(&mut writer, "Name", bucket.as_str())?;
    write_element(&mut writer, "Prefix", &request.prefix)?;
    write_element(&mut writer, "Marker", request.marker.as_deref().unwrap_or(""))?;
    write_element(&mut writer, "MaxKeys", &request.max_keys.to_string())?;
    write_element(
        &mut writer,
        "Delimiter",
        request.delimiter.as_deref().unwrap_or(""),
    )?;
    write_element(&mut writer, "IsTruncated", &page.is_truncated.to_string())?;
    if let Some(next_marker) = &page.next_marker {
        write_element(&mut writer, "NextMarker", next_marker)?;
    }

    for (key, object) in &page.contents {
        write_start(&mut writer, "Contents")?;
        write_element(&mut writer, "Key", key)?;
        write_element(
            &mut writer,
            "LastModified",
            &object
                .last_modified
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        )?;
        write_element(&mut writer, "ETag", &format!("\"{}\"", object.etag))?;
        write_element(&mut writer, "Type", "Normal")?;
        write_element(&mut writer, "Size", &object.data.len().to_string())?;
        write_element(&mut writer, "StorageClass", "Standard")?;
        write_end(&mut writer, "Contents")?;
    }

    for prefix in &page.common_prefixes {
        write_start(&mut writer, "CommonPrefixes")?;
        write_element(&mut writer, "Prefix", prefix)?;
        write_end(&mut writer, "CommonPrefixes")?;
    }

    write_end(&mut writer, "ListBucketResult")?;
    Ok(Bytes::from(writer.into_inner().into_inner()))
}

fn copy_result_xml(object: &StoredObject) -> Result<Bytes, StoreError> {
    let mut writer = new_document()?;
    write_start(&mut writer, "CopyObjectResult")?;
    write_element(&mut writer, "ETag", &format!("\"{}\"", object.etag))?;
    write_element(
        &mut writer,
        "LastModified",
        &object
            .last_modified
            .to_rfc3339_opts(SecondsFormat::Millis, true),
    )?;
    write_end(&mut writer, "CopyObjectResult")?;
    Ok(Bytes::from(writer.into_inner().into_inner()))
}

/// Build an `<Error>` envelope the way the remote service reports failures
pub fn error_body(code: &str, message: &str) -> Bytes {
    let id = request_id();
    let document = new_document().and_then(|mut writer| {
        write_start(&mut writer, "Error")?;
        write_element(&mut writer, "Code", code)?;
        write_element(&mut writer, "Message", message)?;
        write_element(&mut writer, "RequestId", &id)?;
        write_end(&mut writer, "Error")?;
        Ok(writer.into_inner().into_inner())
    });
    match document {
        Ok(bytes) => Bytes::from(bytes),
        Err(_) => Bytes::new(),
    }
}

pub fn error_response(status: StatusCode, code: &str, message: &str) -> OssResponse {
    OssResponse::new(status)
        .with_header(header::CONTENT_TYPE, "application/xml")
        .with_body(error_body(code, message))
}

fn no_such_key() -> OssResponse {
    error_response(
        StatusCode::NOT_FOUND,
        "NoSuchKey",
        "The specified key does not exist.",
    )
}

fn request_id() -> String {
    uuid::Uuid::new_v4().simple().to_string().to_uppercase()
}

fn guess_content_type(key: &str) -> String {
    mime_guess::from_path(key)
        .first_or_octet_stream()
        .to_string()
}
