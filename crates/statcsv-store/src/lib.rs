//! Object store gateway.
//!
//! [`ObjectStore`] is the blocking interface the conversion job talks to.
//! [`S3Store`] drives an S3-compatible service; [`MemoryStore`] keeps
//! buckets in memory and records every call, for tests.

mod config;
mod error;
mod memory;
mod s3;
mod store;

pub use config::{DEFAULT_REGION, S3Config};
pub use error::{Result, StoreError, object_url};
pub use memory::{MemoryStore, StoreCall};
pub use s3::S3Store;
pub use store::{ObjectBody, ObjectStore, put_json};
