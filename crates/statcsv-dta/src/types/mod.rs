//! Core types for Stata dataset handling.

mod dataset;
mod labels;
mod value;
mod variable;

pub use dataset::{DtaDataset, DtaHeader};
pub use labels::{DtaValueLabels, ValueLabelTable};
pub use value::DtaValue;
pub use variable::{DtaType, DtaVariable, Temporal};
