//! Error types for SPSS system file operations.

use thiserror::Error;

/// Errors that can occur when reading or writing SPSS system files.
#[derive(Debug, Error)]
pub enum SavError {
    /// The input ended before a complete structure could be read.
    #[error("file is truncated: needed {needed} bytes at offset {offset}, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// The input is not an SPSS system file.
    #[error("not an SPSS system file: {message}")]
    NotSav { message: String },

    /// A dictionary record could not be interpreted.
    #[error("invalid {record} record at offset {offset}: {message}")]
    InvalidRecord {
        record: &'static str,
        offset: usize,
        message: String,
    },

    /// Compression code outside the known set.
    #[error("unsupported compression code {code}")]
    UnsupportedCompression { code: i32 },

    /// A zlib block of a `.zsav` file failed to inflate.
    #[error("failed to inflate compressed block {index}: {source}")]
    Inflate {
        index: usize,
        #[source]
        source: std::io::Error,
    },

    /// Dataset cannot be written as described.
    #[error("cannot write dataset: {message}")]
    InvalidDataset { message: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for system file operations.
pub type Result<T> = std::result::Result<T, SavError>;

impl SavError {
    /// Create a NotSav error.
    pub fn not_sav(message: impl Into<String>) -> Self {
        Self::NotSav {
            message: message.into(),
        }
    }

    /// Create an InvalidRecord error.
    pub fn invalid_record(record: &'static str, offset: usize, message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            record,
            offset,
            message: message.into(),
        }
    }

    /// Create an InvalidDataset error.
    pub fn invalid_dataset(message: impl Into<String>) -> Self {
        Self::InvalidDataset {
            message: message.into(),
        }
    }

    /// Whether the failure means the input ended early (including empty input).
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::Truncated { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SavError::not_sav("bad magic");
        assert_eq!(format!("{err}"), "not an SPSS system file: bad magic");

        let err = SavError::invalid_record("variable", 176, "bad type");
        assert_eq!(
            format!("{err}"),
            "invalid variable record at offset 176: bad type"
        );
    }

    #[test]
    fn test_truncated_classification() {
        let err = SavError::Truncated {
            offset: 0,
            needed: 4,
            available: 0,
        };
        assert!(err.is_truncated());
        assert!(!SavError::UnsupportedCompression { code: 7 }.is_truncated());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "test");
        let sav_err: SavError = io_err.into();
        assert!(matches!(sav_err, SavError::Io(_)));
    }
}
