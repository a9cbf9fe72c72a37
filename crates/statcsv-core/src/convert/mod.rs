//! Format dispatch: source bytes to a primary table plus auxiliary tables.

mod labels;
mod spss;
mod stata;

use std::collections::BTreeMap;

use polars::prelude::DataFrame;
use statcsv_store::ObjectBody;
use tracing::error;

use crate::buffer::{DEFAULT_MAX_SOURCE_BYTES, SourceBuffer};
use crate::error::{ConvertError, DecoderError, Result};
use crate::ledger::FileType;

pub use labels::{CODE, FIELD, MEANING};

/// Suffix of the primary table's key.
pub const PRIMARY_SUFFIX: &str = "";
/// Suffix of the `(Field, Code, Meaning)` table.
pub const VALUES_SUFFIX: &str = "-values";
/// Suffix of the SPSS `(Field, Meaning)` table.
pub const DESCRIPTION_SUFFIX: &str = "-description";

/// Knobs for one conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionOptions {
    /// Largest source file buffered in memory.
    pub max_source_bytes: u64,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            max_source_bytes: DEFAULT_MAX_SOURCE_BYTES,
        }
    }
}

impl ConversionOptions {
    #[must_use]
    pub fn with_max_source_bytes(mut self, max_source_bytes: u64) -> Self {
        self.max_source_bytes = max_source_bytes;
        self
    }
}

/// Decoded tables ready to be written.
#[derive(Debug, Clone)]
pub struct ConvertedTables {
    pub primary: DataFrame,
    /// Auxiliary tables keyed by suffix.
    pub auxiliary: BTreeMap<&'static str, DataFrame>,
}

/// Buffer `body` and decode it with the decoder for `file_type`.
///
/// The buffer lives only for the duration of this call.
pub fn convert(
    file_type: FileType,
    body: ObjectBody,
    location: &str,
    options: &ConversionOptions,
) -> Result<ConvertedTables> {
    let content_length = body.content_length();
    let buffer = SourceBuffer::read(body, content_length, options.max_source_bytes, location)?;
    match file_type {
        FileType::Spss => spss::convert_spss(&buffer, location),
        FileType::Stata => stata::convert_stata(&buffer, location),
    }
}

fn decode_failed(location: &str, source: impl Into<DecoderError>) -> ConvertError {
    let err = ConvertError::corrupt(location, source);
    if let ConvertError::CorruptSourceFile { kind, source, .. } = &err {
        error!(location, %kind, error = %source, "source file could not be decoded");
    }
    err
}
