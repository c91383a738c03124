/// Separator that turns the flat key space into a hierarchy
pub const SEPARATOR: char = '/';

/// A fully resolved key in the remote store.
///
/// Keys are derived by concatenation and are never validated or escaped; the
/// store is the authority on which keys it accepts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey(String);

impl ObjectKey {
    pub fn new(value: String) -> Self {
        Self(value)
    }

    /// Get the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Zero-byte keys ending in the separator stand in for directories
    pub fn is_directory_marker(&self) -> bool {
        self.0.ends_with(SEPARATOR)
    }
}

impl From<&str> for ObjectKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ObjectKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for ObjectKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
