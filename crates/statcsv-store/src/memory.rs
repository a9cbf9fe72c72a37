//! In-process store.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{Result, StoreError};
use crate::store::{ObjectBody, ObjectStore};

/// One recorded gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Get { bucket: String, key: String },
    Put { bucket: String, key: String },
    HeadBucket { bucket: String },
    List { bucket: String, prefix: String },
    Delete { bucket: String, key: String },
    CreateBucket { bucket: String },
}

type Buckets = BTreeMap<String, BTreeMap<String, Vec<u8>>>;

/// Buckets held in memory, with a log of every gateway call.
///
/// Seeding helpers (`with_bucket`, `insert`) and inspection helpers
/// (`object`, `keys`) bypass the log.
#[derive(Debug, Default)]
pub struct MemoryStore {
    buckets: Mutex<Buckets>,
    calls: Mutex<Vec<StoreCall>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_bucket(self, bucket: &str) -> Self {
        lock(&self.buckets).entry(bucket.to_string()).or_default();
        self
    }

    /// Store an object, creating its bucket.
    pub fn insert(&self, bucket: &str, key: &str, body: impl Into<Vec<u8>>) {
        lock(&self.buckets)
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), body.into());
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        lock(&self.buckets)
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .cloned()
    }

    pub fn keys(&self, bucket: &str) -> Vec<String> {
        lock(&self.buckets)
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Calls recorded so far, oldest first.
    pub fn calls(&self) -> Vec<StoreCall> {
        lock(&self.calls).clone()
    }

    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    fn record(&self, call: StoreCall) {
        lock(&self.calls).push(call);
    }
}

impl ObjectStore for MemoryStore {
    fn get(&self, bucket: &str, key: &str) -> Result<ObjectBody> {
        self.record(StoreCall::Get {
            bucket: bucket.to_string(),
            key: key.to_string(),
        });
        let buckets = lock(&self.buckets);
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| StoreError::no_such_bucket(bucket))?;
        let body = objects
            .get(key)
            .ok_or_else(|| StoreError::no_such_key(bucket, key))?;
        Ok(ObjectBody::from_bytes(body.clone()))
    }

    fn put(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        self.record(StoreCall::Put {
            bucket: bucket.to_string(),
            key: key.to_string(),
        });
        let mut buckets = lock(&self.buckets);
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| StoreError::no_such_bucket(bucket))?;
        objects.insert(key.to_string(), body);
        Ok(())
    }

    fn head_bucket(&self, bucket: &str) -> Result<bool> {
        self.record(StoreCall::HeadBucket {
            bucket: bucket.to_string(),
        });
        Ok(lock(&self.buckets).contains_key(bucket))
    }

    fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        self.record(StoreCall::List {
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
        });
        let buckets = lock(&self.buckets);
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| StoreError::no_such_bucket(bucket))?;
        Ok(objects
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn delete(&self, bucket: &str, key: &str) -> Result<()> {
        self.record(StoreCall::Delete {
            bucket: bucket.to_string(),
            key: key.to_string(),
        });
        let mut buckets = lock(&self.buckets);
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| StoreError::no_such_bucket(bucket))?;
        objects.remove(key);
        Ok(())
    }

    fn create_bucket(&self, bucket: &str) -> Result<()> {
        self.record(StoreCall::CreateBucket {
            bucket: bucket.to_string(),
        });
        lock(&self.buckets).entry(bucket.to_string()).or_default();
        Ok(())
    }
}
