//! Bounded in-memory copy of a source object.

use std::io::Read;
use std::ops::Deref;

use tracing::error;

use crate::error::{ConvertError, Result};

/// Default bound on a buffered source file: 2 GiB.
pub const DEFAULT_MAX_SOURCE_BYTES: u64 = 2048 * 1024 * 1024;

/// Source bytes owned by one conversion; dropped when it returns.
#[derive(Debug)]
pub struct SourceBuffer {
    bytes: Vec<u8>,
}

impl SourceBuffer {
    /// Drain `body`, failing once more than `limit` bytes arrive.
    pub fn read(
        body: impl Read,
        content_length: Option<u64>,
        limit: u64,
        location: &str,
    ) -> Result<Self> {
        let too_large = || {
            error!(location, limit, "source file exceeds buffer limit");
            ConvertError::SourceTooLarge {
                location: location.to_string(),
                limit,
            }
        };
        if content_length.is_some_and(|len| len > limit) {
            return Err(too_large());
        }

        let capacity = content_length
            .and_then(|len| usize::try_from(len).ok())
            .unwrap_or_default();
        let mut bytes = Vec::with_capacity(capacity);
        body.take(limit.saturating_add(1))
            .read_to_end(&mut bytes)
            .map_err(|source| ConvertError::SourceRead {
                location: location.to_string(),
                source,
            })?;
        if bytes.len() as u64 > limit {
            return Err(too_large());
        }
        Ok(Self { bytes })
    }
}

impl Deref for SourceBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}
