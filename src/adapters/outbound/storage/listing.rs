//! Listing of a flat key space as a directory tree.
//!
//! A `ListBucketResult` page holds `Contents` (real keys) and
//! `CommonPrefixes` (keys grouped by the delimiter). Both kinds of directory
//! representation, marker keys ending in `/` and common prefixes, become
//! [`EntryKind::Directory`](crate::domain::models::EntryKind) entries.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::{stream, StreamExt, TryStreamExt};
use serde::Deserialize;
use tracing::debug;

use crate::{
    adapters::outbound::storage::{error::StoreError, path_prefixer::PathPrefixer, response},
    domain::{
        errors::{StorageError, StorageResult},
        models::Entry,
        value_objects::{BucketName, ObjectKey, SEPARATOR},
    },
    ports::{
        filesystem::EntryStream,
        storage::{ListObjectsRequest, OssClient},
    },
};

/// Keys requested per listing call
pub const PAGE_SIZE: u32 = 100;

#[derive(Debug, Deserialize)]
struct ListBucketResult {
    #[serde(rename = "IsTruncated", default)]
    is_truncated: bool,
    #[serde(rename = "NextMarker", default)]
    next_marker: Option<String>,
    #[serde(rename = "Contents", default)]
    contents: Vec<ListedObject>,
    #[serde(rename = "CommonPrefixes", default)]
    common_prefixes: Vec<CommonPrefix>,
}

#[derive(Debug, Deserialize)]
struct ListedObject {
    #[serde(rename = "Key")]
    key: String,
    #[serde(rename = "LastModified", default)]
    last_modified: String,
    #[serde(rename = "Size", default)]
    size: String,
}

#[derive(Debug, Deserialize)]
struct CommonPrefix {
    #[serde(rename = "Prefix")]
    prefix: String,
}

/// One parsed listing page. Entry paths are raw keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingPage {
    pub entries: Vec<Entry>,
    pub is_truncated: bool,
    pub next_marker: Option<String>,
}

impl ListingPage {
    /// Where the next request should resume, if the listing continues
    fn continuation(&self) -> Option<String> {
        if !self.is_truncated {
            return None;
        }
        // Best effort when the store omits NextMarker. Keys and prefixes come
        // back in key order, so the greatest path sorts after every key under
        // each common prefix on this page.
        self.next_marker.clone().or_else(|| {
            self.entries
                .iter()
                .map(|entry| entry.path.as_str())
                .max()
                .map(str::to_string)
        })
    }
}

/// Parse a `ListBucketResult` body.
///
/// Content entries come first, then common prefixes, each in payload order.
/// Nothing is sorted or deduplicated.
pub fn parse_listing(body: &[u8]) -> StorageResult<ListingPage> {
    let text = std::str::from_utf8(body).map_err(|e| StoreError::InvalidListing {
        field: "body".to_string(),
        message: e.to_string(),
    })?;
    let result: ListBucketResult = quick_xml::de::from_str(text).map_err(StoreError::from)?;

    let mut entries = Vec::with_capacity(result.contents.len() + result.common_prefixes.len());
    for object in result.contents {
        entries.push(content_entry(object)?);
    }
    entries.extend(
        result
            .common_prefixes
            .into_iter()
            .map(|p| Entry::directory(p.prefix)),
    );

    Ok(ListingPage {
        entries,
        is_truncated: result.is_truncated,
        next_marker: result.next_marker.filter(|marker| !marker.is_empty()),
    })
}

fn content_entry(object: ListedObject) -> Result<Entry, StoreError> {
    if object.key.ends_with(SEPARATOR) {
        return Ok(Entry::directory(object.key));
    }

    let size = object
        .size
        .trim()
        .parse::<u64>()
        .map_err(|e| StoreError::InvalidListing {
            field: format!("Size of {}", object.key),
            message: e.to_string(),
        })?;
    let modified_at = DateTime::parse_from_rfc3339(object.last_modified.trim())
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::InvalidListing {
            field: format!("LastModified of {}", object.key),
            message: e.to_string(),
        })?;

    Ok(Entry::file(object.key, size, modified_at))
}

#[derive(Debug, PartialEq)]
enum State {
    Paginating { marker: Option<String> },
    Done,
}

/// Follows continuation markers until the listing is exhausted
pub struct ListingPaginator {
    client: Arc<dyn OssClient>,
    bucket: BucketName,
    request: ListObjectsRequest,
    state: State,
}

impl ListingPaginator {
    pub fn new(client: Arc<dyn OssClient>, bucket: BucketName, request: ListObjectsRequest) -> Self {
        let marker = request.marker.clone();
        Self {
            client,
            bucket,
            request,
            state: State::Paginating { marker },
        }
    }

    /// Fetch the next page, or `None` once the listing is exhausted.
    /// A failed page ends the listing.
    pub async fn next_page(&mut self) -> Option<StorageResult<ListingPage>> {
        let marker = match &self.state {
            State::Done => return None,
            State::Paginating { marker } => marker.clone(),
        };

        let request = ListObjectsRequest {
            marker: marker.clone(),
            ..self.request.clone()
        };
        debug!(
            bucket = %self.bucket,
            prefix = %request.prefix,
            delimiter = ?request.delimiter,
            marker = ?request.marker,
            "listing objects"
        );

        let result = self.fetch(&request).await;
        self.state = match &result {
            Ok(page) => match page.continuation() {
                // a marker that does not advance would loop forever
                Some(next) if Some(&next) != marker.as_ref() => State::Paginating {
                    marker: Some(next),
                },
                _ => State::Done,
            },
            Err(_) => State::Done,
        };
        Some(result)
    }

    async fn fetch(&self, request: &ListObjectsRequest) -> StorageResult<ListingPage> {
        let response = self.client.list_objects(&self.bucket, request).await?;
        let response = response::translate_read(response, &ObjectKey::from(request.prefix.as_str()))?;
        parse_listing(&response.body)
    }

    /// Flatten the pages into a stream of entries whose paths are made
    /// relative to the adapter root
    pub fn into_entries(self, prefixer: PathPrefixer) -> EntryStream {
        stream::try_unfold(self, |mut paginator| async move {
            match paginator.next_page().await {
                None => Ok(None),
                Some(Err(err)) => Err(err),
                Some(Ok(page)) => Ok(Some((page.entries, paginator))),
            }
        })
        .map_ok(|entries| stream::iter(entries.into_iter().map(Ok::<Entry, StorageError>)))
        .try_flatten()
        .map_ok(move |mut entry| {
            entry.path = prefixer.strip(&entry.path).to_string();
            entry
        })
        .boxed()
    }
}
