mod oss_client;

pub use oss_client::{ByteStream, ListObjectsRequest, OssClient, OssResponse};
