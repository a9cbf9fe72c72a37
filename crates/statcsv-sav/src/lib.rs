//! SPSS system file (`.sav` / `.zsav`) reader and writer.
//!
//! The reader loads the whole file into memory and decodes the dictionary,
//! value labels and cases. Both byte orders, bytecode compression and zlib
//! compression are supported; strings are decoded with the encoding named
//! in the file (falling back to its code page, then windows-1252).
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use statcsv_sav::{SavFile, SavValue, SavVariable, ValueLabelSet, read_sav, write_sav};
//!
//! let file = read_sav(Path::new("survey.sav")).unwrap();
//! for (variable, labels) in file.variable_value_labels() {
//!     println!("{variable}: {} labels", labels.len());
//! }
//!
//! let mut out = SavFile::with_variables(vec![
//!     SavVariable::numeric("sex").with_label("Respondent sex"),
//!     SavVariable::string("city", 16),
//! ]);
//! out.add_value_labels(
//!     ValueLabelSet::new(vec![0])
//!         .with_numeric(1.0, "Male")
//!         .with_numeric(2.0, "Female"),
//! );
//! out.add_row(vec![SavValue::numeric(1.0), SavValue::string("Utrecht")]);
//! write_sav(Path::new("out.sav"), &out).unwrap();
//! ```

mod cursor;
mod data;
mod encoding;
mod error;
pub mod header;
mod layout;
mod reader;
mod types;
mod writer;

#[cfg(feature = "polars")]
mod polars_ext;

pub use cursor::Endian;
pub use error::{Result, SavError};

pub use types::{
    Compression, LabelValue, MissingValues, PrintFormat, SavFile, SavHeader, SavType, SavValue,
    SavVariable, Temporal, ValueLabelSet,
};

pub use reader::{SavReader, read_sav, read_sav_bytes};
pub use writer::{SavWriter, SavWriterOptions, write_sav, write_sav_to_vec};

#[cfg(feature = "polars")]
pub use polars_ext::sav_to_dataframe;
