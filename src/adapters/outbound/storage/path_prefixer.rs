use crate::domain::value_objects::{ObjectKey, SEPARATOR};

/// Joins and strips the configured root prefix.
///
/// Resolution is plain concatenation: logical paths are neither escaped nor
/// validated, and a path that already carries the prefix gets it twice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathPrefixer {
    /// Either empty or the configured prefix followed by one separator
    prefix: String,
}

impl PathPrefixer {
    pub fn new(prefix: &str) -> Self {
        let trimmed = prefix.trim_end_matches(SEPARATOR);
        let prefix = if trimmed.is_empty() {
            String::new()
        } else {
            format!("{}{}", trimmed, SEPARATOR)
        };
        Self { prefix }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Key for a logical path. Leading separators anchor at the root and are dropped.
    pub fn resolve(&self, path: &str) -> ObjectKey {
        ObjectKey::new(format!(
            "{}{}",
            self.prefix,
            path.trim_start_matches(SEPARATOR)
        ))
    }

    /// Logical path for a raw key; keys outside the prefix come back unchanged
    pub fn strip<'a>(&self, key: &'a str) -> &'a str {
        key.strip_prefix(self.prefix.as_str()).unwrap_or(key)
    }

    /// Listing prefix for a directory: its key with exactly one trailing separator
    pub fn directory_prefix(&self, dir: &str) -> String {
        let mut key = self.resolve(dir).into_string();
        if !key.is_empty() && !key.ends_with(SEPARATOR) {
            key.push(SEPARATOR);
        }
        key
    }
}
