//! Decoded dataset.

use crate::cursor::ByteOrder;

use super::{DtaValue, DtaVariable};

/// Header fields.
#[derive(Debug, Clone, PartialEq)]
pub struct DtaHeader {
    /// Format release (104-119).
    pub release: u16,
    pub byte_order: ByteOrder,
    pub data_label: String,
    pub timestamp: String,
}

impl Default for DtaHeader {
    fn default() -> Self {
        Self {
            release: 118,
            byte_order: ByteOrder::Little,
            data_label: String::new(),
            timestamp: String::new(),
        }
    }
}

/// A decoded Stata dataset (without its value labels).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DtaDataset {
    pub header: DtaHeader,
    pub variables: Vec<DtaVariable>,
    /// Observations, one value per variable.
    pub rows: Vec<Vec<DtaValue>>,
}

impl DtaDataset {
    #[must_use]
    pub fn with_variables(variables: Vec<DtaVariable>) -> Self {
        Self {
            variables,
            ..Self::default()
        }
    }

    /// Append an observation.
    ///
    /// # Panics
    ///
    /// Panics if the row length does not match the variable count.
    pub fn add_row(&mut self, row: Vec<DtaValue>) {
        assert_eq!(
            row.len(),
            self.variables.len(),
            "row length does not match variable count"
        );
        self.rows.push(row);
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }
}
