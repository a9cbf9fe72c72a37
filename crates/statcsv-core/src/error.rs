//! Conversion failure taxonomy.

use std::fmt;

use polars::prelude::PolarsError;
use statcsv_dta::DtaError;
use statcsv_sav::SavError;
use statcsv_store::{StoreError, object_url};
use thiserror::Error;

/// Pipeline stage a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Ledger,
    Locate,
    Decode,
    Write,
    Verify,
}

impl Stage {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ledger => "ledger",
            Self::Locate => "locate",
            Self::Decode => "decode",
            Self::Write => "write",
            Self::Verify => "verify",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a source file failed to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorruptKind {
    /// Empty, or shorter than the structures it declares.
    Truncated,
    /// An unsupported release, or not the declared format at all.
    UnsupportedOrWrongFormat,
}

impl fmt::Display for CorruptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Truncated => "truncated",
            Self::UnsupportedOrWrongFormat => "unsupported version or wrong format",
        })
    }
}

/// Error reported by one of the format decoders.
#[derive(Debug, Error)]
pub enum DecoderError {
    #[error(transparent)]
    Spss(#[from] SavError),
    #[error(transparent)]
    Stata(#[from] DtaError),
}

impl DecoderError {
    #[must_use]
    pub fn kind(&self) -> CorruptKind {
        let truncated = match self {
            Self::Spss(err) => err.is_truncated(),
            Self::Stata(err) => err.is_truncated(),
        };
        if truncated {
            CorruptKind::Truncated
        } else {
            CorruptKind::UnsupportedOrWrongFormat
        }
    }
}

/// Errors from a conversion job.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("ledger s3://{bucket}/{key} not found")]
    LedgerNotFound {
        bucket: String,
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("ledger s3://{bucket}/{key} is malformed")]
    MalformedLedger {
        bucket: String,
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported file type {file_type:?} (expected spss or stata)")]
    UnsupportedFileType { file_type: String },

    #[error("unsupported source location {location:?}: {reason}")]
    UnsupportedLocation { location: String, reason: String },

    #[error("source file s3://{bucket}/{key} not found")]
    SourceNotFound { bucket: String, key: String },

    #[error("source bucket {bucket} not found (looking for {key})")]
    SourceBucketNotFound { bucket: String, key: String },

    #[error("source file {location} is corrupt ({kind})")]
    CorruptSourceFile {
        location: String,
        kind: CorruptKind,
        #[source]
        source: DecoderError,
    },

    #[error("source file {location} exceeds the {limit} byte buffer limit")]
    SourceTooLarge { location: String, limit: u64 },

    #[error("reading source file {location} failed")]
    SourceRead {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("building tables for {location} failed")]
    Frame {
        location: String,
        #[source]
        source: PolarsError,
    },

    #[error("destination bucket {bucket} does not exist")]
    DestinationBucketMissing { bucket: String },

    #[error("serializing {key} as CSV failed")]
    Serialize {
        key: String,
        #[source]
        source: PolarsError,
    },

    #[error("converted file s3://{bucket}/{key} is missing after write")]
    ConvertedFileMissing {
        bucket: String,
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("object store call on {target} failed")]
    Store {
        stage: Stage,
        /// `s3://bucket/key` the call addressed.
        target: String,
        #[source]
        source: StoreError,
    },
}

/// Result type alias for conversion operations.
pub type Result<T> = std::result::Result<T, ConvertError>;

impl ConvertError {
    pub(crate) fn store(stage: Stage, bucket: &str, key: Option<&str>, source: StoreError) -> Self {
        Self::Store {
            stage,
            target: object_url(bucket, key),
            source,
        }
    }

    pub(crate) fn corrupt(location: &str, source: impl Into<DecoderError>) -> Self {
        let source = source.into();
        Self::CorruptSourceFile {
            location: location.to_string(),
            kind: source.kind(),
            source,
        }
    }

    pub(crate) fn frame(location: &str, source: PolarsError) -> Self {
        Self::Frame {
            location: location.to_string(),
            source,
        }
    }

    /// Stage that failed.
    #[must_use]
    pub fn stage(&self) -> Stage {
        match self {
            Self::LedgerNotFound { .. }
            | Self::MalformedLedger { .. }
            | Self::UnsupportedFileType { .. } => Stage::Ledger,
            Self::UnsupportedLocation { .. }
            | Self::SourceNotFound { .. }
            | Self::SourceBucketNotFound { .. } => Stage::Locate,
            Self::CorruptSourceFile { .. }
            | Self::SourceTooLarge { .. }
            | Self::SourceRead { .. }
            | Self::Frame { .. } => Stage::Decode,
            Self::DestinationBucketMissing { .. } | Self::Serialize { .. } => Stage::Write,
            Self::ConvertedFileMissing { .. } => Stage::Verify,
            Self::Store { stage, .. } => *stage,
        }
    }

    /// Decode failure class, for corrupt source files.
    #[must_use]
    pub fn corrupt_kind(&self) -> Option<CorruptKind> {
        match self {
            Self::CorruptSourceFile { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
