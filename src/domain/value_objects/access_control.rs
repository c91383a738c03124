use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::errors::ValidationError;

/// Canned access-control level applied to objects written through the adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AccessControl {
    #[serde(rename = "private")]
    Private,
    #[default]
    #[serde(rename = "public-read")]
    PublicRead,
    #[serde(rename = "public-read-write")]
    PublicReadWrite,
    /// Inherit the bucket's ACL
    #[serde(rename = "default")]
    Default,
}

impl AccessControl {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessControl::Private => "private",
            AccessControl::PublicRead => "public-read",
            AccessControl::PublicReadWrite => "public-read-write",
            AccessControl::Default => "default",
        }
    }
}

impl FromStr for AccessControl {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "private" => Ok(AccessControl::Private),
            "public-read" => Ok(AccessControl::PublicRead),
            "public-read-write" => Ok(AccessControl::PublicReadWrite),
            "default" => Ok(AccessControl::Default),
            _ => Err(ValidationError::UnknownAccessControl(s.to_string())),
        }
    }
}

impl std::fmt::Display for AccessControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
