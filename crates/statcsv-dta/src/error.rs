//! Error types for Stata dataset operations.

use thiserror::Error;

/// Errors that can occur when reading or writing `.dta` files.
#[derive(Debug, Error)]
pub enum DtaError {
    /// The input ended before a complete structure could be read.
    #[error("file is truncated: needed {needed} bytes at offset {offset}, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// The input is not a Stata dataset.
    #[error("not a Stata dataset: {message}")]
    NotDta { message: String },

    /// A Stata format release this reader does not handle.
    #[error("unsupported Stata format release {release}")]
    UnsupportedVersion { release: u16 },

    /// A section of the file could not be interpreted.
    #[error("invalid {section} at offset {offset}: {message}")]
    InvalidSection {
        section: &'static str,
        offset: usize,
        message: String,
    },

    /// Dataset cannot be written as described.
    #[error("cannot write dataset: {message}")]
    InvalidDataset { message: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Stata dataset operations.
pub type Result<T> = std::result::Result<T, DtaError>;

impl DtaError {
    /// Create a NotDta error.
    pub fn not_dta(message: impl Into<String>) -> Self {
        Self::NotDta {
            message: message.into(),
        }
    }

    /// Create an InvalidSection error.
    pub fn invalid_section(
        section: &'static str,
        offset: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidSection {
            section,
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

    /// Whether the input ended early (including the zero-byte file).
    ///
    /// Every other read failure means the bytes are a release this reader
    /// does not support, or not a Stata dataset at all.
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
        let err = DtaError::UnsupportedVersion { release: 36 };
        assert_eq!(format!("{err}"), "unsupported Stata format release 36");

        let err = DtaError::invalid_section("map", 10, "missing tag");
        assert_eq!(format!("{err}"), "invalid map at offset 10: missing tag");
    }

    #[test]
    fn test_truncated_classification() {
        let err = DtaError::Truncated {
            offset: 0,
            needed: 1,
            available: 0,
        };
        assert!(err.is_truncated());
        assert!(!DtaError::not_dta("x").is_truncated());
    }
}
