// Infrastructure error types
pub mod error;

// Path and response handling shared by every operation
pub mod listing;
pub mod path_prefixer;
pub mod response;

// Filesystem adapter and the in-memory store it can run against
pub mod memory;
pub mod oss_adapter;

pub use error::StoreError;
pub use listing::{parse_listing, ListingPage, ListingPaginator, PAGE_SIZE};
pub use memory::InMemoryOssClient;
pub use oss_adapter::OssAdapter;
pub use path_prefixer::PathPrefixer;
