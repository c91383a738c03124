//! Translation of raw store responses into adapter results.
//!
//! This is the single place where the store's error envelope
//! (`<Error><Code/><Message/><RequestId/></Error>`) is turned into a
//! [`StorageError`], and where metadata headers are normalized.

use chrono::{DateTime, Utc};
use http::{header, HeaderMap, StatusCode};
use quick_xml::events::Event;
use serde::Deserialize;

use crate::{
    adapters::outbound::storage::error::StoreError,
    domain::{
        errors::{StorageError, StorageResult},
        models::ObjectMetadata,
        value_objects::{AccessControl, ObjectKey},
    },
    ports::storage::OssResponse,
};

/// Header carrying the URL the request was served from
pub const REQUEST_URL_HEADER: &str = "x-oss-request-url";

/// Error code the store uses for a missing key
const NO_SUCH_KEY: &str = "NoSuchKey";

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(rename = "Code", default)]
    code: Option<String>,
    #[serde(rename = "Message", default)]
    message: Option<String>,
    #[serde(rename = "RequestId", default)]
    request_id: Option<String>,
}

/// Translate a response whose success body carries no user data
/// (put, copy, delete, marker creation).
///
/// An error envelope fails the call even when the status claims success.
pub fn translate(response: OssResponse, key: &ObjectKey) -> StorageResult<OssResponse> {
    if let Some(err) = envelope_error(&response.body, key) {
        return Err(err);
    }
    check_status(response, key)
}

/// Translate a response whose success body is user content or a listing.
///
/// The body is only inspected for an envelope when the status is a failure,
/// so object bodies that happen to look like an envelope pass through.
pub fn translate_read(response: OssResponse, key: &ObjectKey) -> StorageResult<OssResponse> {
    if response.is_ok() {
        return Ok(response);
    }
    translate(response, key)
}

fn check_status(response: OssResponse, key: &ObjectKey) -> StorageResult<OssResponse> {
    match response.status {
        status if status.is_success() => Ok(response),
        StatusCode::NOT_FOUND => Err(StorageError::ObjectNotFound {
            key: key.clone(),
            message: None,
        }),
        status => Err(StorageError::RemoteStatus { status }),
    }
}

fn envelope_error(body: &[u8], key: &ObjectKey) -> Option<StorageError> {
    if !root_is_error_element(body) {
        return None;
    }

    let text = std::str::from_utf8(body).ok()?;
    let envelope: ErrorEnvelope = quick_xml::de::from_str(text).ok()?;
    let message = envelope.message?;

    if envelope.code.as_deref() == Some(NO_SUCH_KEY) {
        return Some(StorageError::ObjectNotFound {
            key: key.clone(),
            message: Some(message),
        });
    }

    Some(StorageError::RemoteOperation {
        code: envelope.code,
        message,
        request_id: envelope.request_id,
    })
}

fn root_is_error_element(body: &[u8]) -> bool {
    if body.is_empty() {
        return false;
    }

    let mut reader = quick_xml::Reader::from_reader(body);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => return e.name().as_ref() == b"Error",
            Ok(Event::Eof) | Err(_) => return false,
            _ => {}
        }
        buf.clear();
    }
}

fn header_text<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, StoreError> {
    let value = headers
        .get(name)
        .ok_or_else(|| StoreError::MissingHeader(name.to_string()))?;
    value.to_str().map_err(|e| StoreError::InvalidHeader {
        name: name.to_string(),
        message: e.to_string(),
    })
}

pub fn content_length(headers: &HeaderMap) -> StorageResult<u64> {
    let text = header_text(headers, header::CONTENT_LENGTH.as_str())?;
    text.trim().parse::<u64>().map_err(|e| {
        StoreError::InvalidHeader {
            name: header::CONTENT_LENGTH.to_string(),
            message: e.to_string(),
        }
        .into()
    })
}

pub fn content_type(headers: &HeaderMap) -> StorageResult<String> {
    match header_text(headers, header::CONTENT_TYPE.as_str()) {
        Ok(text) => Ok(text.to_string()),
        Err(StoreError::MissingHeader(_)) => Ok(DEFAULT_CONTENT_TYPE.to_string()),
        Err(e) => Err(e.into()),
    }
}

/// `Last-Modified` is an HTTP date (`Wed, 21 Oct 2015 07:28:00 GMT`)
pub fn last_modified(headers: &HeaderMap) -> StorageResult<DateTime<Utc>> {
    let text = header_text(headers, header::LAST_MODIFIED.as_str())?;
    DateTime::parse_from_rfc2822(text.trim())
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            StoreError::InvalidHeader {
                name: header::LAST_MODIFIED.to_string(),
                message: e.to_string(),
            }
            .into()
        })
}

pub fn request_url(headers: &HeaderMap) -> StorageResult<String> {
    Ok(header_text(headers, REQUEST_URL_HEADER)?.to_string())
}

/// Normalize metadata response headers into [`ObjectMetadata`]
pub fn metadata_from_headers(
    headers: &HeaderMap,
    visibility: AccessControl,
) -> StorageResult<ObjectMetadata> {
    Ok(ObjectMetadata {
        content_length: content_length(headers)?,
        last_modified: last_modified(headers)?,
        content_type: content_type(headers)?,
        visibility,
        etag: headers
            .get(header::ETAG)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim_matches('"').to_string()),
        headers: headers.clone(),
    })
}
