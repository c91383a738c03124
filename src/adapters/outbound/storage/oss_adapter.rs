use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::{HeaderMap, StatusCode};
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

use crate::{
    adapters::outbound::storage::{
        listing::{ListingPaginator, PAGE_SIZE},
        path_prefixer::PathPrefixer,
        response,
    },
    config::{ConfigError, OssConfig},
    domain::{
        errors::{StorageError, StorageResult},
        models::{Entry, FileContents, FileStream, ObjectMetadata},
        value_objects::{AccessControl, BucketName, SEPARATOR},
    },
    ports::{
        filesystem::{ByteReader, EntryStream, Filesystem},
        storage::{ListObjectsRequest, OssClient, OssResponse},
    },
};

/// Presents one bucket of a flat object store as a hierarchical filesystem
#[derive(Clone)]
pub struct OssAdapter {
    client: Arc<dyn OssClient>,
    bucket: BucketName,
    prefixer: PathPrefixer,
    acl: AccessControl,
}

impl OssAdapter {
    pub fn new(
        client: Arc<dyn OssClient>,
        bucket: BucketName,
        prefix: &str,
        acl: AccessControl,
    ) -> Self {
        let prefixer = PathPrefixer::new(prefix);
        info!(
            bucket = %bucket,
            prefix = %prefixer.prefix(),
            acl = %acl,
            "OSS filesystem adapter ready"
        );
        Self {
            client,
            bucket,
            prefixer,
            acl,
        }
    }

    /// Build an adapter from loaded configuration
    pub fn from_config(client: Arc<dyn OssClient>, config: &OssConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            client,
            config.bucket_name()?,
            &config.prefix,
            config.access_control,
        ))
    }

    pub fn bucket(&self) -> &BucketName {
        &self.bucket
    }

    pub fn prefixer(&self) -> &PathPrefixer {
        &self.prefixer
    }

    pub fn access_control(&self) -> AccessControl {
        self.acl
    }

    async fn upload(&self, path: &str, contents: Bytes) -> StorageResult<HeaderMap> {
        let key = self.prefixer.resolve(path);
        let length = contents.len() as u64;
        debug!(bucket = %self.bucket, key = %key, length, "putting object");

        let response = self
            .client
            .put_object(&self.bucket, &key, contents, length)
            .await?;
        Ok(response::translate(response, &key)?.headers)
    }

    async fn head(&self, path: &str) -> StorageResult<OssResponse> {
        let key = self.prefixer.resolve(path);
        debug!(bucket = %self.bucket, key = %key, "fetching object metadata");

        let response = self.client.get_object_meta(&self.bucket, &key).await?;
        response::translate_read(response, &key)
    }
}

/// Read the whole source into memory. The reader is dropped on return.
async fn drain(mut reader: ByteReader) -> StorageResult<Bytes> {
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer).await?;
    Ok(Bytes::from(buffer))
}

#[async_trait]
impl Filesystem for OssAdapter {
    async fn write(&self, path: &str, contents: Bytes) -> StorageResult<HeaderMap> {
        self.upload(path, contents).await
    }

    async fn write_stream(&self, path: &str, reader: ByteReader) -> StorageResult<HeaderMap> {
        let contents = drain(reader).await?;
        self.upload(path, contents).await
    }

    async fn update(&self, path: &str, contents: Bytes) -> StorageResult<HeaderMap> {
        self.upload(path, contents).await
    }

    async fn update_stream(&self, path: &str, reader: ByteReader) -> StorageResult<HeaderMap> {
        let contents = drain(reader).await?;
        self.upload(path, contents).await
    }

    async fn rename(&self, path: &str, new_path: &str) -> StorageResult<()> {
        self.copy(path, new_path).await?;

        if let Err(err) = self.delete(path).await {
            warn!(
                bucket = %self.bucket,
                from = %path,
                to = %new_path,
                error = %err,
                "rename copied the object but failed to remove the source"
            );
            return Err(err);
        }
        Ok(())
    }

    async fn copy(&self, path: &str, new_path: &str) -> StorageResult<()> {
        let source = self.prefixer.resolve(path);
        let destination = self.prefixer.resolve(new_path);
        debug!(
            bucket = %self.bucket,
            source = %source,
            destination = %destination,
            "copying object"
        );

        let response = self
            .client
            .copy_object(&self.bucket, &source, &self.bucket, &destination)
            .await?;
        response::translate(response, &source)?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> StorageResult<()> {
        let key = self.prefixer.resolve(path);
        debug!(bucket = %self.bucket, key = %key, "deleting object");

        let response = self.client.delete_object(&self.bucket, &key).await?;
        match response::translate(response, &key) {
            Ok(_) => Ok(()),
            Err(err) if err.is_not_found() => Ok(()),
            Err(err) => Err(err),
        }
    }

    async fn delete_dir(&self, dir: &str) -> StorageResult<()> {
        warn!(bucket = %self.bucket, dir = %dir, "directory deletion requested");
        Err(StorageError::unsupported(
            "delete_dir",
            "directories are key prefixes and cannot be removed as a unit",
        ))
    }

    async fn create_dir(&self, dir: &str) -> StorageResult<Entry> {
        // the store appends the separator itself
        let key = self.prefixer.resolve(dir.trim_end_matches(SEPARATOR));
        debug!(bucket = %self.bucket, key = %key, "creating directory marker");

        let response = self.client.create_object_dir(&self.bucket, &key).await?;
        response::translate(response, &key)?;
        Ok(Entry::directory(dir))
    }

    async fn set_visibility(&self, path: &str, visibility: AccessControl) -> StorageResult<()> {
        warn!(
            bucket = %self.bucket,
            path = %path,
            visibility = %visibility,
            "per-object visibility change requested"
        );
        Err(StorageError::unsupported(
            "set_visibility",
            "visibility is fixed by the adapter configuration",
        ))
    }

    async fn has(&self, path: &str) -> StorageResult<bool> {
        let key = self.prefixer.resolve(path);
        debug!(bucket = %self.bucket, key = %key, "checking object existence");

        let response = self.client.is_object_exist(&self.bucket, &key).await?;
        Ok(response.status == StatusCode::OK)
    }

    async fn read(&self, path: &str) -> StorageResult<FileContents> {
        let key = self.prefixer.resolve(path);
        debug!(bucket = %self.bucket, key = %key, "getting object");

        let response = self.client.get_object(&self.bucket, &key).await?;
        let response = response::translate_read(response, &key)?;
        Ok(FileContents {
            path: path.to_string(),
            contents: response.body,
        })
    }

    async fn read_stream(&self, path: &str) -> StorageResult<FileStream> {
        let meta = self.head(path).await?;
        let url = response::request_url(&meta.headers)?;
        debug!(bucket = %self.bucket, path = %path, url = %url, "opening object stream");

        let stream = self.client.open_url(&url).await?;
        Ok(FileStream {
            path: path.to_string(),
            stream,
        })
    }

    fn list_contents(&self, dir: &str, recursive: bool) -> EntryStream {
        let request = ListObjectsRequest {
            prefix: self.prefixer.directory_prefix(dir),
            delimiter: (!recursive).then(|| SEPARATOR.to_string()),
            max_keys: PAGE_SIZE,
            marker: None,
        };
        ListingPaginator::new(self.client.clone(), self.bucket.clone(), request)
            .into_entries(self.prefixer.clone())
    }

    async fn get_metadata(&self, path: &str) -> StorageResult<ObjectMetadata> {
        let meta = self.head(path).await?;
        response::metadata_from_headers(&meta.headers, self.acl)
    }

    async fn get_size(&self, path: &str) -> StorageResult<u64> {
        let meta = self.head(path).await?;
        response::content_length(&meta.headers)
    }

    async fn get_mimetype(&self, path: &str) -> StorageResult<String> {
        let meta = self.head(path).await?;
        response::content_type(&meta.headers)
    }

    async fn get_timestamp(&self, path: &str) -> StorageResult<DateTime<Utc>> {
        let meta = self.head(path).await?;
        response::last_modified(&meta.headers)
    }

    async fn get_visibility(&self, _path: &str) -> StorageResult<AccessControl> {
        Ok(self.acl)
    }
}
