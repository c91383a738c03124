pub mod entry;
pub mod object;

pub use entry::{Entry, EntryKind};
pub use object::{FileContents, FileStream, ObjectMetadata};
