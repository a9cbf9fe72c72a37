//! Core types for SPSS system file handling.
//!
//! This module provides the data structures for a decoded system file:
//! header, variables, values, and value label sets.

mod file;
mod value;
mod variable;

pub use file::{Compression, SavFile, SavHeader};
pub use value::{LabelValue, SavValue, ValueLabelSet};
pub use variable::{MissingValues, PrintFormat, SavType, SavVariable, Temporal};
