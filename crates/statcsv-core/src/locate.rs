//! Source locations.
//!
//! Only one scheme is recognised: `s3a://bucket/key...`.

use statcsv_store::{ObjectBody, ObjectStore, StoreError};
use tracing::{debug, error};

use crate::error::{ConvertError, Result, Stage};

/// First `/`-separated segment of a supported location.
pub const SCHEME_MARKER: &str = "s3a:";

/// A parsed source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetRef {
    pub bucket: String,
    pub key: String,
}

impl TargetRef {
    /// Parse `s3a://bucket/key`. No store call is made.
    pub fn parse(location: &str) -> Result<Self> {
        let unsupported = |reason: &str| ConvertError::UnsupportedLocation {
            location: location.to_string(),
            reason: reason.to_string(),
        };
        let parts: Vec<&str> = location.split('/').collect();
        if parts[0] != SCHEME_MARKER {
            return Err(unsupported(&format!(
                "scheme {:?} is not {SCHEME_MARKER:?}",
                parts[0]
            )));
        }
        if parts.len() < 4 || !parts[1].is_empty() {
            return Err(unsupported("expected s3a://bucket/key"));
        }
        if parts[2].is_empty() {
            return Err(unsupported("no bucket"));
        }
        let key = parts[3..].join("/");
        if key.is_empty() {
            return Err(unsupported("no object key"));
        }
        Ok(Self {
            bucket: parts[2].to_string(),
            key,
        })
    }

    /// File name without directory or final extension.
    #[must_use]
    pub fn stem(&self) -> &str {
        let name = self.key.rsplit('/').next().unwrap_or(&self.key);
        match name.rfind('.') {
            Some(dot) if dot > 0 => &name[..dot],
            _ => name,
        }
    }
}

/// Open the source object for reading.
pub fn open_source<S: ObjectStore + ?Sized>(store: &S, target: &TargetRef) -> Result<ObjectBody> {
    let body = store
        .get(&target.bucket, &target.key)
        .map_err(|source| match source {
            StoreError::NoSuchKey { bucket, key } => {
                error!(%bucket, %key, "source file not found");
                ConvertError::SourceNotFound { bucket, key }
            }
            StoreError::NoSuchBucket { bucket } => {
                error!(%bucket, key = %target.key, "source bucket not found");
                ConvertError::SourceBucketNotFound {
                    bucket,
                    key: target.key.clone(),
                }
            }
            other => ConvertError::store(Stage::Locate, &target.bucket, Some(&target.key), other),
        })?;
    debug!(
        bucket = %target.bucket,
        key = %target.key,
        content_length = ?body.content_length(),
        "source opened"
    );
    Ok(body)
}

#[cfg(test)]
mod tests {
    use statcsv_store::MemoryStore;

    use super::*;

    fn reason(location: &str) -> String {
        match TargetRef::parse(location) {
            Err(ConvertError::UnsupportedLocation { reason, .. }) => reason,
            other => panic!("expected UnsupportedLocation, got {other:?}"),
        }
    }

    #[test]
    fn test_parse() {
        let target = TargetRef::parse("s3a://raw/p1/uploads/data.v2.dta").unwrap();
        assert_eq!(target.bucket, "raw");
        assert_eq!(target.key, "p1/uploads/data.v2.dta");
        assert_eq!(target.stem(), "data.v2");
    }

    #[test]
    fn test_rejections() {
        assert!(reason("hdfs://bucket/key").contains("hdfs:"));
        assert!(reason("s3://bucket/key").contains("s3:"));
        assert!(reason("").contains("scheme"));
        assert_eq!(reason("s3a://bucket"), "expected s3a://bucket/key");
        assert_eq!(reason("s3a:/bucket/key"), "expected s3a://bucket/key");
        assert_eq!(reason("s3a:///key"), "no bucket");
        assert_eq!(reason("s3a://bucket/"), "no object key");
    }

    #[test]
    fn test_stem_edge_cases() {
        let stem = |key: &str| {
            TargetRef {
                bucket: "b".to_string(),
                key: key.to_string(),
            }
            .stem()
            .to_string()
        };
        assert_eq!(stem("survey"), "survey");
        assert_eq!(stem("dir/.profile"), ".profile");
        assert_eq!(stem("a/b/wave 3.sav"), "wave 3");
    }

    #[test]
    fn test_open_source_not_found() {
        let store = MemoryStore::new().with_bucket("raw");
        let target = TargetRef::parse("s3a://raw/missing.sav").unwrap();
        match open_source(&store, &target).unwrap_err() {
            ConvertError::SourceNotFound { bucket, key } => {
                assert_eq!(bucket, "raw");
                assert_eq!(key, "missing.sav");
            }
            other => panic!("unexpected {other:?}"),
        }

        let target = TargetRef::parse("s3a://gone/x.sav").unwrap();
        let err = open_source(&store, &target).unwrap_err();
        assert!(matches!(err, ConvertError::SourceBucketNotFound { .. }));
        assert_eq!(err.stage(), Stage::Locate);
    }
}
