pub mod filesystem;
pub mod storage;

// Re-export all port traits for convenience
pub use filesystem::{ByteReader, EntryStream, Filesystem};
pub use storage::{ByteStream, ListObjectsRequest, OssClient, OssResponse};
