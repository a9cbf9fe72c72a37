//! Dataset reader.
//!
//! Observations and value labels are read by two separate accessors; each
//! parses the header again from the same bytes.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::data::decode_rows;
use crate::error::Result;
use crate::header::parse_layout;
use crate::labels::read_label_tables;
use crate::types::{DtaDataset, DtaValueLabels};

/// Stata dataset reader.
pub struct DtaReader<R: Read> {
    reader: BufReader<R>,
}

impl<R: Read> DtaReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
        }
    }

    /// Read the variables and observations.
    pub fn read_dataset(mut self) -> Result<DtaDataset> {
        let data = self.read_all_bytes()?;
        read_dta_bytes(&data)
    }

    /// Read the value label tables and which variable uses which table.
    pub fn read_value_labels(mut self) -> Result<DtaValueLabels> {
        let data = self.read_all_bytes()?;
        read_dta_value_labels_bytes(&data)
    }

    fn read_all_bytes(&mut self) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        self.reader.read_to_end(&mut data)?;
        Ok(data)
    }
}

impl DtaReader<File> {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(File::open(path)?))
    }
}

/// Read a dataset from a path.
pub fn read_dta(path: &Path) -> Result<DtaDataset> {
    DtaReader::open(path)?.read_dataset()
}

/// Parse a dataset already held in memory.
pub fn read_dta_bytes(data: &[u8]) -> Result<DtaDataset> {
    let layout = parse_layout(data)?;
    let rows = decode_rows(data, &layout)?;
    Ok(DtaDataset {
        header: layout.header,
        variables: layout.variables,
        rows,
    })
}

/// Parse the value labels of a dataset held in memory.
///
/// Releases 108 and earlier yield an empty dictionary.
pub fn read_dta_value_labels_bytes(data: &[u8]) -> Result<DtaValueLabels> {
    let layout = parse_layout(data)?;
    read_label_tables(data, &layout)
}
