use chrono::{DateTime, Utc};
use serde::Serialize;

/// Whether a listed path is a file or an emulated directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EntryKind {
    #[serde(rename = "file")]
    File,
    #[serde(rename = "dir")]
    Directory,
}

/// A single path produced by a directory listing.
///
/// The store has no real directories, so a `Directory` entry only ever carries
/// its path: it comes either from a marker key ending in `/` or from a common
/// prefix grouped by the listing delimiter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(
        rename = "timestamp",
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub modified_at: Option<DateTime<Utc>>,
}

impl Entry {
    pub fn file(path: impl Into<String>, size: u64, modified_at: DateTime<Utc>) -> Self {
        Self {
            kind: EntryKind::File,
            path: path.into(),
            size: Some(size),
            modified_at: Some(modified_at),
        }
    }

    pub fn directory(path: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::Directory,
            path: path.into(),
            size: None,
            modified_at: None,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    /// Modification time as seconds since the Unix epoch
    pub fn timestamp(&self) -> Option<i64> {
        self.modified_at.map(|t| t.timestamp())
    }
}
