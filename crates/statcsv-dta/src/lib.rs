//! Stata dataset (`.dta`) reader and writer.
//!
//! Reads legacy binary releases 104-115 and tagged releases 117-119 in
//! either byte order. Observations and value labels are exposed through
//! separate entry points; a file too short for any structure it declares
//! reports [`DtaError::Truncated`], anything else it cannot interpret
//! reports one of the format errors.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use statcsv_dta::{DtaReader, read_dta};
//!
//! let dataset = read_dta(Path::new("panel.dta")).unwrap();
//! println!("{} observations", dataset.num_rows());
//!
//! let labels = DtaReader::open(Path::new("panel.dta"))
//!     .unwrap()
//!     .read_value_labels()
//!     .unwrap();
//! for (variable, pairs) in labels.by_variable() {
//!     println!("{variable}: {} labels", pairs.len());
//! }
//! ```

mod cursor;
mod data;
mod error;
pub mod header;
mod labels;
mod reader;
mod types;
mod writer;

#[cfg(feature = "polars")]
mod polars_ext;

pub use cursor::ByteOrder;
pub use error::{DtaError, Result};

pub use types::{
    DtaDataset, DtaHeader, DtaType, DtaValue, DtaValueLabels, DtaVariable, Temporal,
    ValueLabelTable,
};

pub use reader::{DtaReader, read_dta, read_dta_bytes, read_dta_value_labels_bytes};
pub use writer::{DtaVersion, DtaWriter, DtaWriterOptions, write_dta, write_dta_to_vec};

#[cfg(feature = "polars")]
pub use polars_ext::{dta_to_dataframe, dta_to_labelled_dataframe};
