//! Post-write existence check.

use statcsv_store::ObjectStore;
use tracing::{debug, error};

use crate::error::{ConvertError, Result, Stage};

/// Confirm `key` can be fetched from `bucket`.
///
/// There is no soft outcome: a missing object is an error.
pub fn verify_output<S: ObjectStore + ?Sized>(store: &S, bucket: &str, key: &str) -> Result<()> {
    match store.get(bucket, key) {
        Ok(body) => {
            debug!(bucket, key, content_length = ?body.content_length(), "converted file present");
            Ok(())
        }
        Err(source) if source.is_not_found() => {
            error!(bucket, key, "converted file missing after write");
            Err(ConvertError::ConvertedFileMissing {
                bucket: bucket.to_string(),
                key: key.to_string(),
                source,
            })
        }
        Err(source) => Err(ConvertError::store(Stage::Verify, bucket, Some(key), source)),
    }
}
