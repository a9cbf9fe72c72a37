//! System file reader.
//!
//! Reads `.sav` and `.zsav` files into a [`SavFile`].

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::data::{CaseSource, decode_cases};
use crate::encoding::{decode_text, resolve_encoding};
use crate::error::Result;
use crate::header::{parse_dictionary, parse_file_header};
use crate::layout::{assemble_value_labels, assemble_variables};
use crate::types::{SavFile, SavHeader};

/// SPSS system file reader.
///
/// Byte order, compression and text encoding are detected from the file.
pub struct SavReader<R: Read> {
    reader: BufReader<R>,
}

impl<R: Read> SavReader<R> {
    /// Create a new reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
        }
    }

    /// Read the whole file into memory and parse it.
    pub fn read_file(mut self) -> Result<SavFile> {
        let mut data = Vec::new();
        self.reader.read_to_end(&mut data)?;
        parse_sav_data(&data)
    }
}

impl SavReader<File> {
    /// Open a system file for reading.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(File::open(path)?))
    }
}

/// Read a system file from a path.
pub fn read_sav(path: &Path) -> Result<SavFile> {
    SavReader::open(path)?.read_file()
}

/// Parse a system file already held in memory.
pub fn read_sav_bytes(data: &[u8]) -> Result<SavFile> {
    parse_sav_data(data)
}

fn parse_sav_data(data: &[u8]) -> Result<SavFile> {
    let raw = parse_file_header(data)?;
    let dictionary = parse_dictionary(data, raw.endian)?;
    let encoding = resolve_encoding(dictionary.encoding_name, dictionary.character_code);

    let (variables, layout) = assemble_variables(&dictionary, encoding, raw.endian)?;
    let value_labels = assemble_value_labels(
        &dictionary.label_sets,
        &variables,
        &layout,
        encoding,
        raw.endian,
    )?;
    let rows = decode_cases(
        &CaseSource {
            data,
            offset: dictionary.data_offset,
            endian: raw.endian,
            compression: raw.compression,
            bias: raw.bias,
            case_count: raw.case_count,
        },
        &layout,
        &variables,
        encoding,
    )?;

    Ok(SavFile {
        header: SavHeader {
            product: decode_text(encoding, raw.product),
            compression: raw.compression,
            case_count: raw.case_count,
            bias: raw.bias,
            creation_date: decode_text(encoding, raw.creation_date),
            creation_time: decode_text(encoding, raw.creation_time),
            file_label: decode_text(encoding, raw.file_label),
            encoding: encoding.name().to_string(),
        },
        variables,
        value_labels,
        documents: dictionary
            .documents
            .iter()
            .map(|line| decode_text(encoding, line))
            .collect(),
        rows,
    })
}
