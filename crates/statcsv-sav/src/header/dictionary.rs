//! Dictionary records between the file header and the case data.
//!
//! # Variable record (type 2)
//!
//! | Field            | Type      | Notes                                   |
//! |------------------|-----------|-----------------------------------------|
//! | type             | i32       | 0 numeric, 1-255 string width, -1 cont. |
//! | has_var_label    | i32       | 0 or 1                                  |
//! | n_missing_values | i32       | 0-3, -2 range, -3 range + discrete      |
//! | print / write    | i32 × 2   | packed formats                          |
//! | name             | char[8]   | short name, space padded                |
//! | label            | i32 + str | only if has_var_label, padded to 4      |
//! | missing values   | 8 × n     |                                         |
//!
//! # Value label record (type 3) and variable index record (type 4)
//!
//! Type 3 lists `(value[8], len u8, label[len])` entries, each padded to a
//! multiple of 8 bytes. It must be followed directly by a type 4 record
//! naming the 1-based dictionary slots the labels apply to.

use crate::cursor::{ByteCursor, Endian};
use crate::error::{Result, SavError};

use super::file_header::HEADER_LEN;
use super::{record, subtype};

/// Variable record before text decoding.
#[derive(Debug)]
pub(crate) struct RawVariable<'a> {
    pub offset: usize,
    pub type_code: i32,
    pub name: &'a [u8],
    pub label: Option<&'a [u8]>,
    pub missing_code: i32,
    pub missing: Vec<[u8; 8]>,
    pub print_format: i32,
}

impl RawVariable<'_> {
    pub(crate) fn is_continuation(&self) -> bool {
        self.type_code == -1
    }
}

/// Value label record paired with its variable index record.
#[derive(Debug)]
pub(crate) struct RawLabelSet<'a> {
    pub offset: usize,
    pub labels: Vec<([u8; 8], &'a [u8])>,
    /// 1-based dictionary slot indices.
    pub slots: Vec<i32>,
}

/// Everything the dictionary declares, still as raw bytes.
#[derive(Debug, Default)]
pub(crate) struct Dictionary<'a> {
    pub variables: Vec<RawVariable<'a>>,
    pub label_sets: Vec<RawLabelSet<'a>>,
    pub documents: Vec<&'a [u8]>,
    pub long_names: Option<&'a [u8]>,
    pub very_long_strings: Option<&'a [u8]>,
    pub encoding_name: Option<&'a [u8]>,
    pub character_code: Option<i32>,
    /// Offset of the first byte after the terminator record.
    pub data_offset: usize,
}

/// Parse dictionary records until the terminator.
pub(crate) fn parse_dictionary(data: &[u8], endian: Endian) -> Result<Dictionary<'_>> {
    let mut cursor = ByteCursor::at(data, HEADER_LEN, endian);
    let mut dictionary = Dictionary::default();

    loop {
        let offset = cursor.position();
        match cursor.i32()? {
            record::VARIABLE => {
                let variable = parse_variable(&mut cursor, offset)?;
                dictionary.variables.push(variable);
            }
            record::VALUE_LABEL => {
                let set = parse_label_set(&mut cursor, offset)?;
                dictionary.label_sets.push(set);
            }
            record::VALUE_LABEL_VARIABLES => {
                return Err(SavError::invalid_record(
                    "variable index",
                    offset,
                    "not preceded by a value label record",
                ));
            }
            record::DOCUMENT => {
                let lines = cursor.count("document")?;
                for _ in 0..lines {
                    dictionary.documents.push(cursor.take(80)?);
                }
            }
            record::EXTENSION => parse_extension(&mut cursor, &mut dictionary, endian)?,
            record::DICTIONARY_END => {
                let _filler = cursor.i32()?;
                dictionary.data_offset = cursor.position();
                return Ok(dictionary);
            }
            other => {
                return Err(SavError::invalid_record(
                    "dictionary",
                    offset,
                    format!("unknown record type {other}"),
                ));
            }
        }
    }
}

fn parse_variable<'a>(cursor: &mut ByteCursor<'a>, offset: usize) -> Result<RawVariable<'a>> {
    let type_code = cursor.i32()?;
    if !(-1..=255).contains(&type_code) {
        return Err(SavError::invalid_record(
            "variable",
            offset,
            format!("invalid type code {type_code}"),
        ));
    }
    let has_label = cursor.i32()?;
    let missing_code = cursor.i32()?;
    let print_format = cursor.i32()?;
    let _write_format = cursor.i32()?;
    let name = cursor.take(8)?;

    let label = match has_label {
        0 => None,
        1 => {
            let len = cursor.count("variable label")?;
            let padded = cursor.take(len.div_ceil(4) * 4)?;
            Some(&padded[..len])
        }
        other => {
            return Err(SavError::invalid_record(
                "variable",
                offset,
                format!("invalid label flag {other}"),
            ));
        }
    };

    let missing_count = match missing_code {
        0..=3 => missing_code.unsigned_abs() as usize,
        -2 => 2,
        -3 => 3,
        other => {
            return Err(SavError::invalid_record(
                "variable",
                offset,
                format!("invalid missing value code {other}"),
            ));
        }
    };
    let mut missing = Vec::with_capacity(missing_count);
    for _ in 0..missing_count {
        missing.push(cursor.array::<8>()?);
    }

    Ok(RawVariable {
        offset,
        type_code,
        name,
        label,
        missing_code,
        missing,
        print_format,
    })
}

fn parse_label_set<'a>(cursor: &mut ByteCursor<'a>, offset: usize) -> Result<RawLabelSet<'a>> {
    let count = cursor.count("value label")?;
    let mut labels = Vec::with_capacity(count.min(4096));
    for _ in 0..count {
        let value = cursor.array::<8>()?;
        let len = usize::from(cursor.u8()?);
        // length byte + text is padded to a multiple of 8
        let padded = cursor.take((len + 1).div_ceil(8) * 8 - 1)?;
        labels.push((value, &padded[..len]));
    }

    let index_offset = cursor.position();
    if cursor.i32()? != record::VALUE_LABEL_VARIABLES {
        return Err(SavError::invalid_record(
            "value label",
            index_offset,
            "not followed by a variable index record",
        ));
    }
    let slot_count = cursor.count("variable index")?;
    let mut slots = Vec::with_capacity(slot_count.min(4096));
    for _ in 0..slot_count {
        slots.push(cursor.i32()?);
    }

    Ok(RawLabelSet {
        offset,
        labels,
        slots,
    })
}

fn parse_extension<'a>(
    cursor: &mut ByteCursor<'a>,
    dictionary: &mut Dictionary<'a>,
    endian: Endian,
) -> Result<()> {
    let offset = cursor.position();
    let kind = cursor.i32()?;
    let size = cursor.count("extension")?;
    let count = cursor.count("extension")?;
    let len = size.checked_mul(count).ok_or_else(|| {
        SavError::invalid_record("extension", offset, "record length overflows")
    })?;
    let payload = cursor.take(len)?;

    match kind {
        subtype::INTEGER_INFO if size == 4 && count >= 8 => {
            let mut bytes = [0u8; 4];
            bytes.copy_from_slice(&payload[28..32]);
            dictionary.character_code = Some(endian.read_i32(bytes));
        }
        subtype::LONG_NAMES => dictionary.long_names = Some(payload),
        subtype::VERY_LONG_STRINGS => dictionary.very_long_strings = Some(payload),
        subtype::ENCODING => dictionary.encoding_name = Some(payload),
        // display parameters, float info, attributes and the rest do not
        // affect decoded values
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> Vec<u8> {
        vec![0u8; HEADER_LEN]
    }

    fn push_i32(data: &mut Vec<u8>, value: i32) {
        data.extend_from_slice(&value.to_le_bytes());
    }

    fn push_numeric_variable(data: &mut Vec<u8>, name: &[u8; 8]) {
        push_i32(data, record::VARIABLE);
        push_i32(data, 0);
        push_i32(data, 0);
        push_i32(data, 0x0005_0802);
        push_i32(data, 0x0005_0802);
        data.extend_from_slice(name);
    }

    fn push_end(data: &mut Vec<u8>) {
        push_i32(data, record::DICTIONARY_END);
        push_i32(data, 0);
    }

    #[test]
    fn test_parse_variables_and_terminator() {
        let mut data = header();
        push_numeric_variable(&mut data, b"AGE     ");
        push_end(&mut data);
        let dictionary = parse_dictionary(&data, Endian::Little).unwrap();
        assert_eq!(dictionary.variables.len(), 1);
        assert_eq!(dictionary.variables[0].name, b"AGE     ");
        assert_eq!(dictionary.data_offset, data.len());
    }

    #[test]
    fn test_value_labels_need_index_record() {
        let mut data = header();
        push_numeric_variable(&mut data, b"SEX     ");
        push_i32(&mut data, record::VALUE_LABEL);
        push_i32(&mut data, 1);
        data.extend_from_slice(&1f64.to_le_bytes());
        data.push(4);
        data.extend_from_slice(b"Male   ");
        push_end(&mut data);
        let err = parse_dictionary(&data, Endian::Little).unwrap_err();
        assert!(matches!(
            err,
            SavError::InvalidRecord {
                record: "value label",
                ..
            }
        ));
    }

    #[test]
    fn test_value_label_padding() {
        let mut data = header();
        push_numeric_variable(&mut data, b"SEX     ");
        push_i32(&mut data, record::VALUE_LABEL);
        push_i32(&mut data, 1);
        data.extend_from_slice(&2f64.to_le_bytes());
        data.push(6);
        data.extend_from_slice(b"Female ");
        push_i32(&mut data, record::VALUE_LABEL_VARIABLES);
        push_i32(&mut data, 1);
        push_i32(&mut data, 1);
        push_end(&mut data);
        let dictionary = parse_dictionary(&data, Endian::Little).unwrap();
        let set = &dictionary.label_sets[0];
        assert_eq!(set.labels[0].1, b"Female");
        assert_eq!(set.slots, vec![1]);
    }

    #[test]
    fn test_missing_terminator_is_truncated() {
        let mut data = header();
        push_numeric_variable(&mut data, b"AGE     ");
        assert!(parse_dictionary(&data, Endian::Little)
            .unwrap_err()
            .is_truncated());
    }

    #[test]
    fn test_unknown_record_type() {
        let mut data = header();
        push_i32(&mut data, 42);
        assert!(matches!(
            parse_dictionary(&data, Endian::Little),
            Err(SavError::InvalidRecord { .. })
        ));
    }
}
