//! Decoded system file.

use super::{LabelValue, SavValue, SavVariable, ValueLabelSet};

/// Case data compression scheme declared in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    None,
    /// Bytecode compression (`$FL2`, code 1).
    Bytecode,
    /// Zlib-wrapped bytecode (`$FL3`, code 2).
    Zlib,
}

impl Compression {
    #[must_use]
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::Bytecode),
            2 => Some(Self::Zlib),
            _ => None,
        }
    }

    #[must_use]
    pub fn code(self) -> i32 {
        match self {
            Self::None => 0,
            Self::Bytecode => 1,
            Self::Zlib => 2,
        }
    }
}

/// File header fields.
#[derive(Debug, Clone, PartialEq)]
pub struct SavHeader {
    /// Product string written by the producing application.
    pub product: String,
    pub compression: Compression,
    /// Declared case count; `None` when the writer left it as -1.
    pub case_count: Option<usize>,
    /// Compression bias (normally 100).
    pub bias: f64,
    pub creation_date: String,
    pub creation_time: String,
    pub file_label: String,
    /// Name of the text encoding used to decode strings.
    pub encoding: String,
}

impl Default for SavHeader {
    fn default() -> Self {
        Self {
            product: "@(#) SPSS DATA FILE statcsv".to_string(),
            compression: Compression::None,
            case_count: None,
            bias: 100.0,
            creation_date: String::new(),
            creation_time: String::new(),
            file_label: String::new(),
            encoding: "UTF-8".to_string(),
        }
    }
}

/// A fully decoded SPSS system file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SavFile {
    pub header: SavHeader,
    /// Variables in dictionary order.
    pub variables: Vec<SavVariable>,
    /// Value label sets in dictionary order.
    pub value_labels: Vec<ValueLabelSet>,
    /// Document lines (record type 6).
    pub documents: Vec<String>,
    /// Cases, one value per variable.
    pub rows: Vec<Vec<SavValue>>,
}

impl SavFile {
    /// Create an empty file with the given variables.
    #[must_use]
    pub fn with_variables(variables: Vec<SavVariable>) -> Self {
        Self {
            variables,
            ..Self::default()
        }
    }

    /// Append a case.
    ///
    /// # Panics
    ///
    /// Panics if the row length does not match the variable count.
    pub fn add_row(&mut self, row: Vec<SavValue>) {
        assert_eq!(
            row.len(),
            self.variables.len(),
            "row length does not match variable count"
        );
        self.rows.push(row);
    }

    /// Attach a value label set.
    pub fn add_value_labels(&mut self, set: ValueLabelSet) {
        self.value_labels.push(set);
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// Value labels keyed by variable.
    ///
    /// Variables appear in dictionary order; each carries the pairs of the
    /// label set applied to it, in record order. A variable named by more
    /// than one set keeps the last one, as SPSS does.
    #[must_use]
    pub fn variable_value_labels(&self) -> Vec<(&str, &[(LabelValue, String)])> {
        let mut assigned: Vec<Option<&ValueLabelSet>> = vec![None; self.variables.len()];
        for set in &self.value_labels {
            for &index in &set.variables {
                if let Some(slot) = assigned.get_mut(index) {
                    *slot = Some(set);
                }
            }
        }
        self.variables
            .iter()
            .zip(assigned)
            .filter_map(|(variable, set)| {
                set.map(|set| (variable.name.as_str(), set.labels.as_slice()))
            })
            .collect()
    }

    /// Variable labels for labelled variables, in dictionary order.
    #[must_use]
    pub fn column_labels(&self) -> Vec<(&str, &str)> {
        self.variables
            .iter()
            .filter_map(|variable| {
                variable
                    .label
                    .as_deref()
                    .map(|label| (variable.name.as_str(), label))
            })
            .collect()
    }
}
