//! Dataset headers and descriptors.
//!
//! Two layouts exist:
//!
//! - **Legacy binary** (releases 104-115): a fixed header starting with the
//!   release byte, followed by the type list, names, sort list, formats,
//!   value label names, variable labels, expansion fields, observations,
//!   and value label tables.
//! - **Tagged** (releases 117-119): `<stata_dta><header>...</header>`, a
//!   `<map>` of 14 section offsets, then the same descriptors wrapped in
//!   tags, plus `<strls>` for long strings.
//!
//! | Release | Names | Formats | Labels | Value labels | Text         |
//! |---------|-------|---------|--------|--------------|--------------|
//! | 104     | 9     | 7       | 32     | none         | windows-1252 |
//! | 105-108 | 9     | 12      | 32/81  | none         | windows-1252 |
//! | 110-113 | 33    | 12      | 81     | yes          | windows-1252 |
//! | 114-115 | 33    | 49      | 81     | yes          | windows-1252 |
//! | 117     | 33    | 49      | 81     | yes          | windows-1252 |
//! | 118-119 | 129   | 57      | 321    | yes          | UTF-8        |

mod legacy;
mod tagged;

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};

use crate::error::{DtaError, Result};
use crate::types::{DtaHeader, DtaVariable};

pub(crate) use legacy::parse_legacy;
pub(crate) use tagged::parse_tagged;

/// Legacy releases the reader accepts.
pub const LEGACY_RELEASES: [u16; 8] = [104, 105, 108, 110, 111, 113, 114, 115];

/// Tagged releases the reader accepts.
pub const TAGGED_RELEASES: [u16; 3] = [117, 118, 119];

/// Field widths and conventions of one format release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Release(pub u16);

impl Release {
    pub(crate) fn is_tagged(self) -> bool {
        self.0 >= 117
    }

    pub(crate) fn name_len(self) -> usize {
        match self.0 {
            0..=108 => 9,
            109..=117 => 33,
            _ => 129,
        }
    }

    pub(crate) fn format_len(self) -> usize {
        match self.0 {
            0..=104 => 7,
            105..=113 => 12,
            114..=117 => 49,
            _ => 57,
        }
    }

    /// Width of variable labels and (legacy) the dataset label.
    pub(crate) fn label_len(self) -> usize {
        match self.0 {
            0..=107 => 32,
            108..=117 => 81,
            _ => 321,
        }
    }

    pub(crate) fn has_value_labels(self) -> bool {
        self.0 > 108
    }

    /// Releases from 113 on reserve the top of each integer range for
    /// `.`, `.a`-`.z`; earlier ones only know the single system missing.
    pub(crate) fn extended_missing(self) -> bool {
        self.0 >= 113
    }

    /// Bytes of `v` in a strL `(v, o)` reference.
    pub(crate) fn strl_v_len(self) -> usize {
        match self.0 {
            117 => 4,
            118 => 2,
            _ => 3,
        }
    }

    pub(crate) fn encoding(self) -> &'static Encoding {
        if self.0 >= 118 { UTF_8 } else { WINDOWS_1252 }
    }
}

/// Where the value label tables start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LabelSection {
    /// Releases ≤ 108.
    Unsupported,
    Legacy(usize),
    Tagged(usize),
}

/// Everything needed to decode observations and labels.
#[derive(Debug)]
pub(crate) struct Layout {
    pub release: Release,
    pub header: DtaHeader,
    pub variables: Vec<DtaVariable>,
    pub nobs: usize,
    pub data_offset: usize,
    /// Offset of `<strls>` (tagged releases only).
    pub strls_offset: Option<usize>,
    pub labels: LabelSection,
}

/// Parse header and descriptors, dispatching on the first byte.
pub(crate) fn parse_layout(data: &[u8]) -> Result<Layout> {
    match data.first() {
        None => Err(DtaError::Truncated {
            offset: 0,
            needed: 1,
            available: 0,
        }),
        Some(b'<') => parse_tagged(data),
        Some(&release) => {
            let release = u16::from(release);
            if LEGACY_RELEASES.contains(&release) {
                parse_legacy(data, Release(release))
            } else {
                Err(DtaError::UnsupportedVersion { release })
            }
        }
    }
}

/// Decode a fixed-width, NUL-terminated text field.
pub(crate) fn fixed_text(encoding: &'static Encoding, bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let (text, _) = encoding.decode_without_bom_handling(&bytes[..end]);
    text.into_owned()
}

/// Turn an empty text field into `None`.
pub(crate) fn non_empty(text: String) -> Option<String> {
    if text.is_empty() { None } else { Some(text) }
}
