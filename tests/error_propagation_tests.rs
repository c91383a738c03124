use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use http::StatusCode;
use ossfs_adapter::{
    adapters::outbound::storage::memory::error_response, AccessControl, BucketName, ByteStream,
    Entry, Filesystem, InMemoryOssClient, ListObjectsRequest, ObjectKey, OssAdapter, OssClient,
    OssResponse, StorageError, StorageResult,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const DENIED: &str = "You have no right to access this object because of bucket acl.";

/// Delegates to the in-memory store unless a canned response is scripted
/// for the operation
#[derive(Clone)]
struct ScriptedClient {
    inner: InMemoryOssClient,
    script: Arc<Mutex<HashMap<&'static str, Scripted>>>,
}

#[derive(Clone)]
enum Scripted {
    Respond(OssResponse),
    Transport,
    /// Serve this many calls normally, then respond
    After(usize, OssResponse),
}

impl ScriptedClient {
    fn new(bucket: BucketName) -> Self {
        Self {
            inner: InMemoryOssClient::new(bucket),
            script: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn fail(&self, operation: &'static str, scripted: Scripted) {
        self.script.lock().unwrap().insert(operation, scripted);
    }

    fn scripted(&self, operation: &'static str) -> Option<StorageResult<OssResponse>> {
        let mut script = self.script.lock().unwrap();
        match script.get_mut(operation)? {
            Scripted::Respond(response) => Some(Ok(response.clone())),
            Scripted::Transport => Some(Err(StorageError::InfrastructureError {
                message: "connection reset".to_string(),
                source: None,
            })),
            Scripted::After(0, response) => Some(Ok(response.clone())),
            Scripted::After(remaining, _) => {
                *remaining -= 1;
                None
            }
        }
    }
}

#[async_trait]
impl OssClient for ScriptedClient {
    async fn put_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        body: Bytes,
        length: u64,
    ) -> StorageResult<OssResponse> {
        match self.scripted("put_object") {
            Some(result) => result,
            None => self.inner.put_object(bucket, key, body, length).await,
        }
    }

    async fn copy_object(
        &self,
        source_bucket: &BucketName,
        source_key: &ObjectKey,
        destination_bucket: &BucketName,
        destination_key: &ObjectKey,
    ) -> StorageResult<OssResponse> {
        match self.scripted("copy_object") {
            Some(result) => result,
            None => {
                self.inner
                    .copy_object(source_bucket, source_key, destination_bucket, destination_key)
                    .await
            }
        }
    }

    async fn delete_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
    ) -> StorageResult<OssResponse> {
        match self.scripted("delete_object") {
            Some(result) => result,
            None => self.inner.delete_object(bucket, key).await,
        }
    }

    async fn create_object_dir(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
    ) -> StorageResult<OssResponse> {
        match self.scripted("create_object_dir") {
            Some(result) => result,
            None => self.inner.create_object_dir(bucket, key).await,
        }
    }

    async fn is_object_exist(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
    ) -> StorageResult<OssResponse> {
        match self.scripted("is_object_exist") {
            Some(result) => result,
            None => self.inner.is_object_exist(bucket, key).await,
        }
    }

    async fn get_object(&self, bucket: &BucketName, key: &ObjectKey) -> StorageResult<OssResponse> {
        match self.scripted("get_object") {
            Some(result) => result,
            None => self.inner.get_object(bucket, key).await,
        }
    }

    async fn get_object_meta(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
    ) -> StorageResult<OssResponse> {
        match self.scripted("get_object_meta") {
            Some(result) => result,
            None => self.inner.get_object_meta(bucket, key).await,
        }
    }

    async fn list_objects(
        &self,
        bucket: &BucketName,
        request: &ListObjectsRequest,
    ) -> StorageResult<OssResponse> {
        match self.scripted("list_objects") {
            Some(result) => result,
            None => self.inner.list_objects(bucket, request).await,
        }
    }

    async fn open_url(&self, url: &str) -> StorageResult<ByteStream> {
        self.inner.open_url(url).await
    }
}

fn bucket() -> BucketName {
    "media-assets".parse().unwrap()
}

fn setup() -> (OssAdapter, ScriptedClient) {
    let client = ScriptedClient::new(bucket());
    let adapter = OssAdapter::new(
        Arc::new(client.clone()),
        bucket(),
        "uploads",
        AccessControl::PublicRead,
    );
    (adapter, client)
}

fn denied() -> OssResponse {
    error_response(StatusCode::FORBIDDEN, "AccessDenied", DENIED)
}

fn assert_denied(err: StorageError) {
    match err {
        StorageError::RemoteOperation { code, message, .. } => {
            assert_eq!(code.as_deref(), Some("AccessDenied"));
            assert_eq!(message, DENIED);
        }
        other => panic!("expected remote operation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_write_surfaces_envelope_message() {
    let (adapter, client) = setup();
    client.fail("put_object", Scripted::Respond(denied()));

    let err = adapter.write("a.txt", Bytes::from("x")).await.unwrap_err();

    assert_eq!(err.remote_message(), Some(DENIED));
    assert_denied(err);
    assert!(client.inner.keys().await.is_empty());
}

#[tokio::test]
async fn test_envelope_with_success_status_still_fails() {
    let (adapter, client) = setup();
    let mut response = denied();
    response.status = StatusCode::OK;
    client.fail("put_object", Scripted::Respond(response));

    assert_denied(adapter.write("a.txt", Bytes::from("x")).await.unwrap_err());
}

#[tokio::test]
async fn test_copy_surfaces_envelope_message() {
    let (adapter, client) = setup();
    adapter.write("a.txt", Bytes::from("x")).await.unwrap();
    client.fail("copy_object", Scripted::Respond(denied()));

    assert_denied(adapter.copy("a.txt", "b.txt").await.unwrap_err());
}

#[tokio::test]
async fn test_rename_aborts_when_copy_fails() {
    let (adapter, client) = setup();
    adapter.write("a.txt", Bytes::from("x")).await.unwrap();
    client.fail("copy_object", Scripted::Respond(denied()));

    assert_denied(adapter.rename("a.txt", "b.txt").await.unwrap_err());
    assert_eq!(client.inner.keys().await, ["uploads/a.txt"]);
}

#[tokio::test]
async fn test_rename_partial_failure_leaves_both_keys() {
    let (adapter, client) = setup();
    adapter.write("a.txt", Bytes::from("x")).await.unwrap();
    client.fail("delete_object", Scripted::Respond(denied()));

    assert_denied(adapter.rename("a.txt", "b.txt").await.unwrap_err());
    assert_eq!(client.inner.keys().await, ["uploads/a.txt", "uploads/b.txt"]);
}

#[tokio::test]
async fn test_delete_surfaces_envelope_message() {
    let (adapter, client) = setup();
    client.fail("delete_object", Scripted::Respond(denied()));

    assert_denied(adapter.delete("a.txt").await.unwrap_err());
}

#[tokio::test]
async fn test_create_dir_surfaces_envelope_message() {
    let (adapter, client) = setup();
    client.fail("create_object_dir", Scripted::Respond(denied()));

    assert_denied(adapter.create_dir("photos").await.unwrap_err());
}

#[tokio::test]
async fn test_read_surfaces_envelope_message() {
    let (adapter, client) = setup();
    client.fail("get_object", Scripted::Respond(denied()));

    assert_denied(adapter.read("a.txt").await.unwrap_err());
}

#[tokio::test]
async fn test_status_without_envelope_is_remote_status() {
    let (adapter, client) = setup();
    client.fail(
        "put_object",
        Scripted::Respond(OssResponse::new(StatusCode::SERVICE_UNAVAILABLE)),
    );

    let err = adapter.write("a.txt", Bytes::from("x")).await.unwrap_err();
    assert!(matches!(
        err,
        StorageError::RemoteStatus { status } if status == StatusCode::SERVICE_UNAVAILABLE
    ));
}

#[tokio::test]
async fn test_has_answers_false_for_any_failure_status() {
    let (adapter, client) = setup();
    adapter.write("a.txt", Bytes::from("x")).await.unwrap();
    client.fail(
        "is_object_exist",
        Scripted::Respond(OssResponse::new(StatusCode::FORBIDDEN)),
    );

    assert!(!adapter.has("a.txt").await.unwrap());
}

#[tokio::test]
async fn test_has_propagates_transport_errors() {
    let (adapter, client) = setup();
    client.fail("is_object_exist", Scripted::Transport);

    assert!(matches!(
        adapter.has("a.txt").await,
        Err(StorageError::InfrastructureError { .. })
    ));
}

#[tokio::test]
async fn test_read_stream_without_request_url_is_invalid_response() {
    let (adapter, client) = setup();
    client.fail(
        "get_object_meta",
        Scripted::Respond(OssResponse::new(StatusCode::OK)),
    );

    assert!(matches!(
        adapter.read_stream("a.txt").await,
        Err(StorageError::InvalidResponse { .. })
    ));
}

#[tokio::test]
async fn test_failed_listing_page_ends_the_stream() {
    let (adapter, client) = setup();
    for i in 0..150 {
        client
            .inner
            .insert(&format!("uploads/bulk/{:03}.txt", i), "x")
            .await;
    }
    client.fail("list_objects", Scripted::After(1, denied()));

    let results: Vec<StorageResult<Entry>> = adapter.list_contents("bulk", false).collect().await;

    assert_eq!(results.len(), 101);
    assert!(results[..100].iter().all(Result::is_ok));
    match results.into_iter().last() {
        Some(Err(err)) => assert_denied(err),
        other => panic!("expected the listing to end with an error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_listing_is_invalid_response() {
    let (adapter, client) = setup();
    client.fail(
        "list_objects",
        Scripted::Respond(
            OssResponse::new(StatusCode::OK).with_body(
                "<ListBucketResult><IsTruncated>false</IsTruncated>\
                 <Contents><Key>uploads/a.txt</Key><Size>many</Size>\
                 <LastModified>2012-02-24T08:42:32.000Z</LastModified></Contents>\
                 </ListBucketResult>",
            ),
        ),
    );

    let results: Vec<StorageResult<Entry>> = adapter.list_contents("", false).collect().await;

    assert_eq!(results.len(), 1);
    assert!(matches!(results[0], Err(StorageError::InvalidResponse { .. })));
}
