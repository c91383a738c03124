pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;

// Re-export key types for convenience

// Domain types - file-system entries, value objects and errors
pub use domain::{
    AccessControl,
    BucketName,
    // Models
    Entry,
    EntryKind,
    FileContents,
    FileStream,
    ObjectKey,
    ObjectMetadata,
    // Errors
    StorageError,
    StorageResult,
    ValidationError,
};

// Port types - the exposed capability contract and the consumed store client
pub use ports::{
    ByteReader, ByteStream, EntryStream, Filesystem, ListObjectsRequest, OssClient, OssResponse,
};

// Configuration
pub use config::{ConfigError, OssConfig};

// Adapter types - infrastructure implementations
pub use adapters::outbound::storage::{InMemoryOssClient, OssAdapter, PathPrefixer};

// Public facade for easy construction
pub mod prelude {
    pub use crate::{
        AccessControl, BucketName, Entry, EntryKind, Filesystem, InMemoryOssClient, OssAdapter,
        OssClient, OssConfig, StorageError, StorageResult,
    };
}
