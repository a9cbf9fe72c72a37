//! File header record.
//!
//! # Structure (176 bytes)
//!
//! | Offset  | Length | Field             |
//! |---------|--------|-------------------|
//! | 0-3     | 4      | `$FL2` / `$FL3`   |
//! | 4-63    | 60     | product name      |
//! | 64-67   | 4      | layout code (2/3) |
//! | 68-71   | 4      | nominal case size |
//! | 72-75   | 4      | compression       |
//! | 76-79   | 4      | weight index      |
//! | 80-83   | 4      | case count (-1)   |
//! | 84-91   | 8      | compression bias  |
//! | 92-100  | 9      | creation date     |
//! | 101-108 | 8      | creation time     |
//! | 109-172 | 64     | file label        |
//! | 173-175 | 3      | padding           |

use crate::cursor::{ByteCursor, Endian};
use crate::error::{Result, SavError};
use crate::types::Compression;

/// Header length in bytes.
pub const HEADER_LEN: usize = 176;

/// Signature of uncompressed and bytecode-compressed files.
pub const MAGIC_STANDARD: &[u8; 4] = b"$FL2";

/// Signature of zlib-compressed files.
pub const MAGIC_ZLIB: &[u8; 4] = b"$FL3";

const LAYOUT_OFFSET: usize = 64;

/// Header fields before text decoding.
#[derive(Debug)]
pub(crate) struct RawHeader<'a> {
    pub endian: Endian,
    pub product: &'a [u8],
    pub compression: Compression,
    pub case_count: Option<usize>,
    pub bias: f64,
    pub creation_date: &'a [u8],
    pub creation_time: &'a [u8],
    pub file_label: &'a [u8],
}

/// Parse the file header at the start of `data`.
pub(crate) fn parse_file_header(data: &[u8]) -> Result<RawHeader<'_>> {
    let mut cursor = ByteCursor::at(data, 0, Endian::Little);
    let magic = cursor.take(4)?;
    if magic != MAGIC_STANDARD && magic != MAGIC_ZLIB {
        return Err(SavError::not_sav("missing $FL2/$FL3 signature"));
    }
    if data.len() < HEADER_LEN {
        return Err(SavError::Truncated {
            offset: data.len(),
            needed: HEADER_LEN - data.len(),
            available: 0,
        });
    }

    let endian = detect_endian(&data[LAYOUT_OFFSET..LAYOUT_OFFSET + 4])?;
    let mut cursor = ByteCursor::at(data, 4, endian);
    let product = cursor.take(60)?;
    let _layout_code = cursor.i32()?;
    let _nominal_case_size = cursor.i32()?;

    let compression_offset = cursor.position();
    let compression_code = cursor.i32()?;
    let compression = Compression::from_code(compression_code).ok_or(
        SavError::UnsupportedCompression {
            code: compression_code,
        },
    )?;
    if (compression == Compression::Zlib) != (magic == MAGIC_ZLIB) {
        return Err(SavError::invalid_record(
            "file header",
            compression_offset,
            format!("compression code {compression_code} does not match signature"),
        ));
    }

    let _weight_index = cursor.i32()?;
    let case_count = usize::try_from(cursor.i32()?).ok();
    let bias = cursor.f64()?;
    let creation_date = cursor.take(9)?;
    let creation_time = cursor.take(8)?;
    let file_label = cursor.take(64)?;
    cursor.skip(3)?;

    Ok(RawHeader {
        endian,
        product,
        compression,
        case_count,
        bias,
        creation_date,
        creation_time,
        file_label,
    })
}

fn detect_endian(layout: &[u8]) -> Result<Endian> {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(layout);
    for endian in [Endian::Little, Endian::Big] {
        if matches!(endian.read_i32(bytes), 2 | 3) {
            return Ok(endian);
        }
    }
    Err(SavError::invalid_record(
        "file header",
        LAYOUT_OFFSET,
        "layout code is neither 2 nor 3 in either byte order",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(magic: &[u8; 4], layout: [u8; 4], compression: [u8; 4]) -> Vec<u8> {
        let mut data = vec![b' '; HEADER_LEN];
        data[..4].copy_from_slice(magic);
        data[64..68].copy_from_slice(&layout);
        data[72..76].copy_from_slice(&compression);
        data[80..84].copy_from_slice(&[0xff; 4]);
        data[84..92].copy_from_slice(&100f64.to_le_bytes());
        data
    }

    #[test]
    fn test_little_endian_header() {
        let data = header_bytes(MAGIC_STANDARD, 2i32.to_le_bytes(), 1i32.to_le_bytes());
        let header = parse_file_header(&data).unwrap();
        assert_eq!(header.endian, Endian::Little);
        assert_eq!(header.compression, Compression::Bytecode);
        assert_eq!(header.case_count, None);
        assert!((header.bias - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_big_endian_layout_detected() {
        let mut data = header_bytes(MAGIC_STANDARD, 2i32.to_be_bytes(), 0i32.to_be_bytes());
        data[84..92].copy_from_slice(&100f64.to_be_bytes());
        let header = parse_file_header(&data).unwrap();
        assert_eq!(header.endian, Endian::Big);
        assert_eq!(header.compression, Compression::None);
    }

    #[test]
    fn test_empty_input_is_truncated() {
        assert!(parse_file_header(&[]).unwrap_err().is_truncated());
    }

    #[test]
    fn test_short_header_is_truncated() {
        let data = header_bytes(MAGIC_STANDARD, 2i32.to_le_bytes(), 0i32.to_le_bytes());
        assert!(parse_file_header(&data[..100]).unwrap_err().is_truncated());
    }

    #[test]
    fn test_wrong_magic_rejected() {
        let data = header_bytes(b"<sta", 2i32.to_le_bytes(), 0i32.to_le_bytes());
        assert!(matches!(
            parse_file_header(&data),
            Err(SavError::NotSav { .. })
        ));
    }

    #[test]
    fn test_zlib_code_requires_fl3() {
        let data = header_bytes(MAGIC_STANDARD, 2i32.to_le_bytes(), 2i32.to_le_bytes());
        assert!(matches!(
            parse_file_header(&data),
            Err(SavError::InvalidRecord { .. })
        ));
    }
}
