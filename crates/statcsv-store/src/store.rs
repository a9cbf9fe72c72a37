//! The gateway trait shared by every adapter.

use std::fmt;
use std::io::{self, Read};

use serde::Serialize;
use tracing::debug;

use crate::error::{Result, StoreError};

/// Readable body of a fetched object.
pub struct ObjectBody {
    reader: Box<dyn Read + Send>,
    content_length: Option<u64>,
}

impl ObjectBody {
    pub fn new(reader: impl Read + Send + 'static, content_length: Option<u64>) -> Self {
        Self {
            reader: Box::new(reader),
            content_length,
        }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let len = bytes.len() as u64;
        Self::new(io::Cursor::new(bytes), Some(len))
    }

    /// Size reported by the store, if any.
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }
}

impl Read for ObjectBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl fmt::Debug for ObjectBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectBody")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Blocking object store gateway.
pub trait ObjectStore {
    /// Open an object for reading.
    fn get(&self, bucket: &str, key: &str) -> Result<ObjectBody>;

    /// Create or overwrite an object.
    fn put(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()>;

    /// `Ok(false)` when the bucket does not exist.
    fn head_bucket(&self, bucket: &str) -> Result<bool>;

    /// Keys under `prefix`, sorted.
    fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>>;

    fn delete(&self, bucket: &str, key: &str) -> Result<()>;

    fn create_bucket(&self, bucket: &str) -> Result<()>;
}

/// Serialize `value` as JSON and store it, creating the bucket if needed.
pub fn put_json<S, T>(store: &S, bucket: &str, key: &str, value: &T) -> Result<()>
where
    S: ObjectStore + ?Sized,
    T: Serialize + ?Sized,
{
    let body = serde_json::to_vec(value).map_err(|source| StoreError::Json {
        key: key.to_string(),
        source,
    })?;
    if !store.head_bucket(bucket)? {
        debug!(bucket, "creating bucket for JSON document");
        store.create_bucket(bucket)?;
    }
    store.put(bucket, key, body)
}
