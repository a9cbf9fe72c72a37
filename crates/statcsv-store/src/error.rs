//! Error types for object store operations.

use thiserror::Error;

/// Outcome of a failed store call.
///
/// Adapters translate their transport's error codes into these variants so
/// callers never inspect error strings.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The bucket exists but the key does not.
    #[error("no object s3://{bucket}/{key}")]
    NoSuchKey { bucket: String, key: String },

    /// The bucket does not exist.
    #[error("no bucket {bucket}")]
    NoSuchBucket { bucket: String },

    /// Any other failure reported by the store or its transport.
    #[error("{operation} on {} failed: {message}", object_url(.bucket, .key.as_deref()))]
    Fault {
        operation: &'static str,
        bucket: String,
        /// Object the call addressed; `None` for bucket-level calls.
        key: Option<String>,
        message: String,
    },

    /// A value could not be encoded as JSON.
    #[error("cannot encode JSON for {key}")]
    Json {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type alias for object store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// `s3://bucket/key`, or `s3://bucket` without a key.
#[must_use]
pub fn object_url(bucket: &str, key: Option<&str>) -> String {
    match key {
        Some(key) => format!("s3://{bucket}/{key}"),
        None => format!("s3://{bucket}"),
    }
}

impl StoreError {
    pub fn no_such_key(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self::NoSuchKey {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    pub fn no_such_bucket(bucket: impl Into<String>) -> Self {
        Self::NoSuchBucket {
            bucket: bucket.into(),
        }
    }

    pub fn fault(
        operation: &'static str,
        bucket: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Fault {
            operation,
            bucket: bucket.into(),
            key: None,
            message: message.into(),
        }
    }

    /// Attach the object key to a [`StoreError::Fault`]; other variants are unchanged.
    #[must_use]
    pub fn with_key(mut self, object_key: impl Into<String>) -> Self {
        if let Self::Fault { key, .. } = &mut self {
            *key = Some(object_key.into());
        }
        self
    }

    /// Whether the key or its bucket is absent.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NoSuchKey { .. } | Self::NoSuchBucket { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classes() {
        assert!(StoreError::no_such_key("b", "k").is_not_found());
        assert!(StoreError::no_such_bucket("b").is_not_found());
        assert!(!StoreError::fault("get", "b", "timeout").is_not_found());
    }

    #[test]
    fn test_display_names_location() {
        let err = StoreError::no_such_key("raw", "p1/data.dta");
        assert_eq!(err.to_string(), "no object s3://raw/p1/data.dta");

        let err = StoreError::fault("put", "out", "AccessDenied").with_key("p1/d.csv");
        assert_eq!(err.to_string(), "put on s3://out/p1/d.csv failed: AccessDenied");
        let err = StoreError::fault("head_bucket", "out", "timeout");
        assert_eq!(err.to_string(), "head_bucket on s3://out failed: timeout");
    }
}
