//! S3 connection settings.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const DEFAULT_REGION: &str = "us-east-1";

/// Connection settings for [`crate::S3Store`].
///
/// Without explicit credentials the AWS default provider chain is used.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3Config {
    pub endpoint: Option<String>,
    pub region: String,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    /// Address buckets as `endpoint/bucket` rather than `bucket.endpoint`.
    pub path_style: bool,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            endpoint: None,
            region: DEFAULT_REGION.to_string(),
            access_key: None,
            secret_key: None,
            path_style: true,
        }
    }
}

impl S3Config {
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    #[must_use]
    pub fn with_credentials(
        mut self,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        self.access_key = Some(access_key.into());
        self.secret_key = Some(secret_key.into());
        self
    }

    #[must_use]
    pub fn with_path_style(mut self, path_style: bool) -> Self {
        self.path_style = path_style;
        self
    }

    /// Static credentials, when both halves are set.
    pub(crate) fn static_credentials(&self) -> Option<(&str, &str)> {
        match (&self.access_key, &self.secret_key) {
            (Some(access), Some(secret)) => Some((access, secret)),
            _ => None,
        }
    }
}

impl fmt::Debug for S3Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Config")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("access_key", &self.access_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field("path_style", &self.path_style)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = S3Config::default();
        assert_eq!(config.region, "us-east-1");
        assert!(config.path_style);
        assert!(config.static_credentials().is_none());
    }

    #[test]
    fn test_minio_style() {
        let config = S3Config::default()
            .with_endpoint("http://localhost:9000")
            .with_credentials("minio", "minio123");
        assert_eq!(config.endpoint.as_deref(), Some("http://localhost:9000"));
        assert_eq!(config.static_credentials(), Some(("minio", "minio123")));
    }

    #[test]
    fn test_debug_hides_secret() {
        let config = S3Config::default().with_credentials("minio", "hunter2");
        let text = format!("{config:?}");
        assert!(text.contains("minio"));
        assert!(!text.contains("hunter2"));
    }
}
