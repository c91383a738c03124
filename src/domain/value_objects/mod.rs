mod access_control;
mod bucket_name;
mod object_key;

pub use access_control::AccessControl;
pub use bucket_name::BucketName;
pub use object_key::{ObjectKey, SEPARATOR};
