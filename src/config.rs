use bon::Builder;

use crate::domain::{
    errors::ValidationError,
    value_objects::{AccessControl, BucketName},
};

/// Adapter configuration: bucket, root prefix, default ACL and the
/// credentials the host hands to its store client.
#[derive(Debug, Clone, Builder)]
pub struct OssConfig {
    #[builder(into)]
    pub bucket: String,
    #[builder(into, default)]
    pub prefix: String,
    #[builder(default)]
    pub access_control: AccessControl,
    #[builder(into)]
    pub access_id: Option<String>,
    #[builder(into)]
    pub access_key: Option<String>,
    #[builder(into)]
    pub endpoint: Option<String>,
}

impl OssConfig {
    /// Load from `OSS_*` environment variables, honouring a `.env` file
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let bucket = var("OSS_BUCKET").ok_or_else(|| ConfigError::MissingVariable {
            name: "OSS_BUCKET".to_string(),
        })?;
        let access_control = match var("OSS_ACL") {
            Some(acl) => acl.parse::<AccessControl>()?,
            None => AccessControl::default(),
        };

        let config = Self {
            bucket,
            prefix: var("OSS_PREFIX").unwrap_or_default(),
            access_control,
            access_id: var("OSS_ACCESS_ID"),
            access_key: var("OSS_ACCESS_KEY"),
            endpoint: var("OSS_ENDPOINT"),
        };
        config.bucket_name()?;
        Ok(config)
    }

    pub fn bucket_name(&self) -> Result<BucketName, ConfigError> {
        Ok(self.bucket.parse::<BucketName>()?)
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} environment variable required")]
    MissingVariable { name: String },

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] ValidationError),
}
