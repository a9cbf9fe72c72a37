//! Job ledger: which file to convert and where it lives.

use std::fmt;
use std::io::Read;
use std::str::FromStr;

use serde::Deserialize;
use statcsv_store::{ObjectStore, StoreError};
use tracing::{debug, error};

use crate::error::{ConvertError, Result, Stage};

/// Source formats the job can convert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Spss,
    Stata,
}

impl FileType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Spss => "spss",
            Self::Stata => "stata",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = ConvertError;

    /// Case-insensitive.
    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "spss" => Ok(Self::Spss),
            "stata" => Ok(Self::Stata),
            _ => Err(ConvertError::UnsupportedFileType {
                file_type: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LedgerAttributes {
    /// Declared source format, validated by [`Ledger::file_type`].
    pub file_type: String,
}

/// The manifest an upstream task writes before conversion runs.
///
/// Fields other than these are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Ledger {
    pub attributes: LedgerAttributes,
    /// `s3a://bucket/key` of the source file.
    pub location_details: String,
}

impl Ledger {
    pub fn parse(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    pub fn file_type(&self) -> Result<FileType> {
        self.attributes.file_type.parse()
    }
}

/// Fetch and parse the ledger at `key` in `bucket`.
pub fn load_ledger<S: ObjectStore + ?Sized>(store: &S, bucket: &str, key: &str) -> Result<Ledger> {
    let mut body = store.get(bucket, key).map_err(|source| {
        if source.is_not_found() {
            error!(bucket, key, "ledger not found");
            ConvertError::LedgerNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
                source,
            }
        } else {
            ConvertError::store(Stage::Ledger, bucket, Some(key), source)
        }
    })?;
    let mut bytes = Vec::new();
    body.read_to_end(&mut bytes).map_err(|err| {
        ConvertError::store(
            Stage::Ledger,
            bucket,
            Some(key),
            StoreError::fault("get", bucket, err.to_string()).with_key(key),
        )
    })?;
    let ledger = Ledger::parse(&bytes).map_err(|source| ConvertError::MalformedLedger {
        bucket: bucket.to_string(),
        key: key.to_string(),
        source,
    })?;
    debug!(
        file_type = %ledger.attributes.file_type,
        location = %ledger.location_details,
        "ledger loaded"
    );
    Ok(ledger)
}
