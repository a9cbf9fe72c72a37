//! System file header and dictionary records.
//!
//! A system file is laid out as:
//!
//! 1. File header (176 bytes, `$FL2` or `$FL3`)
//! 2. Dictionary records, each introduced by a 4-byte record type:
//!    variable (2), value labels (3) + variable index (4), documents (6),
//!    extension (7)
//! 3. Dictionary terminator (999)
//! 4. Case data (uncompressed, bytecode, or zlib blocks of bytecode)

mod dictionary;
mod file_header;

pub(crate) use dictionary::{Dictionary, RawLabelSet, RawVariable, parse_dictionary};
pub use file_header::{HEADER_LEN, MAGIC_STANDARD, MAGIC_ZLIB};
pub(crate) use file_header::{RawHeader, parse_file_header};

/// Record type codes.
pub mod record {
    pub const VARIABLE: i32 = 2;
    pub const VALUE_LABEL: i32 = 3;
    pub const VALUE_LABEL_VARIABLES: i32 = 4;
    pub const DOCUMENT: i32 = 6;
    pub const EXTENSION: i32 = 7;
    pub const DICTIONARY_END: i32 = 999;
}

/// Extension record subtypes that carry information this crate uses.
pub mod subtype {
    pub const INTEGER_INFO: i32 = 3;
    pub const FLOAT_INFO: i32 = 4;
    pub const LONG_NAMES: i32 = 13;
    pub const VERY_LONG_STRINGS: i32 = 14;
    pub const ENCODING: i32 = 20;
}

/// System-missing value.
pub const SYSMIS: f64 = -f64::MAX;
