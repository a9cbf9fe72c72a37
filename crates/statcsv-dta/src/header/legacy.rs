//! Legacy binary layout (releases 104-115).
//!
//! # Header
//!
//! | Field       | Type        | Notes                        |
//! |-------------|-------------|------------------------------|
//! | release     | u8          |                              |
//! | byteorder   | u8          | 1 HILO, 2 LOHI               |
//! | filetype    | u8          | always 1                     |
//! | unused      | u8          |                              |
//! | nvar        | u16         |                              |
//! | nobs        | u32         |                              |
//! | data_label  | char[32/81] | 81 from release 108          |
//! | time_stamp  | char[18]    | absent in release 104        |

use crate::cursor::{ByteCursor, ByteOrder};
use crate::error::{DtaError, Result};
use crate::types::{DtaHeader, DtaType, DtaVariable};

use super::{LabelSection, Layout, Release, fixed_text, non_empty};

pub(crate) fn parse_legacy(data: &[u8], release: Release) -> Result<Layout> {
    let mut peek = ByteCursor::at(data, 1, ByteOrder::Little);
    let order_code = peek.u8()?;
    let order = ByteOrder::from_code(order_code).ok_or_else(|| {
        DtaError::invalid_section("header", 1, format!("unknown byte order {order_code}"))
    })?;
    let encoding = release.encoding();

    let mut cursor = ByteCursor::at(data, 2, order);
    let _filetype = cursor.u8()?;
    let _unused = cursor.u8()?;
    let nvar = usize::from(cursor.u16()?);
    let nobs = cursor.len_u32()?;
    let data_label = fixed_text(encoding, cursor.take(release.label_len())?);
    let timestamp = if release.0 >= 105 {
        fixed_text(encoding, cursor.take(18)?)
    } else {
        String::new()
    };

    let types_offset = cursor.position();
    let types = cursor
        .take(nvar)?
        .iter()
        .map(|&code| {
            let parsed = if release.0 < 111 {
                DtaType::from_old_code(code)
            } else {
                DtaType::from_legacy_code(code)
            };
            parsed.ok_or_else(|| {
                DtaError::invalid_section("type list", types_offset, format!("type code {code}"))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let names = fixed_fields(&mut cursor, nvar, release.name_len(), encoding)?;
    cursor.skip(2 * (nvar + 1))?;
    let formats = fixed_fields(&mut cursor, nvar, release.format_len(), encoding)?;
    let label_names = fixed_fields(&mut cursor, nvar, release.name_len(), encoding)?;
    let labels = fixed_fields(&mut cursor, nvar, release.label_len(), encoding)?;

    if release.0 >= 105 {
        loop {
            let kind = cursor.u8()?;
            let len = if release.0 > 108 {
                cursor.len_u32()?
            } else {
                usize::from(cursor.u16()?)
            };
            if kind == 0 {
                break;
            }
            cursor.skip(len)?;
        }
    }

    let variables: Vec<DtaVariable> = types
        .into_iter()
        .zip(names)
        .zip(formats)
        .zip(label_names.into_iter().zip(labels))
        .map(|(((var_type, name), format), (label_name, label))| DtaVariable {
            name,
            var_type,
            format,
            label: non_empty(label),
            value_labels: non_empty(label_name),
        })
        .collect();

    let data_offset = cursor.position();
    let labels = if release.has_value_labels() {
        let row_width: usize = variables.iter().map(|v| v.var_type.width()).sum();
        let end = row_width
            .checked_mul(nobs)
            .and_then(|len| len.checked_add(data_offset))
            .ok_or_else(|| DtaError::invalid_section("header", 4, "observation count overflows"))?;
        LabelSection::Legacy(end)
    } else {
        LabelSection::Unsupported
    };

    Ok(Layout {
        release,
        header: DtaHeader {
            release: release.0,
            byte_order: order,
            data_label,
            timestamp,
        },
        variables,
        nobs,
        data_offset,
        strls_offset: None,
        labels,
    })
}

fn fixed_fields(
    cursor: &mut ByteCursor<'_>,
    count: usize,
    width: usize,
    encoding: &'static encoding_rs::Encoding,
) -> Result<Vec<String>> {
    (0..count)
        .map(|_| Ok(fixed_text(encoding, cursor.take(width)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Release 104 file: one byte variable, one observation.
    fn release_104() -> Vec<u8> {
        let mut data = vec![104, 2, 1, 0];
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(&[0; 32]);
        data.push(b'b');
        let mut name = [0u8; 9];
        name[..3].copy_from_slice(b"age");
        data.extend_from_slice(&name);
        data.extend_from_slice(&[0; 4]);
        let mut format = [0u8; 7];
        format[..5].copy_from_slice(b"%8.0g");
        data.extend_from_slice(&format);
        data.extend_from_slice(&[0; 9]);
        data.extend_from_slice(&[0; 32]);
        data.push(42);
        data
    }

    #[test]
    fn test_release_104_descriptors() {
        let data = release_104();
        let layout = parse_legacy(&data, Release(104)).unwrap();
        assert_eq!(layout.variables.len(), 1);
        assert_eq!(layout.variables[0].name, "age");
        assert_eq!(layout.variables[0].var_type, DtaType::Byte);
        assert_eq!(layout.variables[0].format, "%8.0g");
        assert_eq!(layout.variables[0].value_labels, None);
        assert_eq!(layout.nobs, 1);
        assert_eq!(layout.data_offset, data.len() - 1);
        assert_eq!(layout.labels, LabelSection::Unsupported);
    }

    #[test]
    fn test_bad_byte_order() {
        let mut data = release_104();
        data[1] = 7;
        assert!(matches!(
            parse_legacy(&data, Release(104)),
            Err(DtaError::InvalidSection {
                section: "header",
                ..
            })
        ));
    }

    #[test]
    fn test_cut_descriptors_are_truncated() {
        let data = release_104();
        assert!(parse_legacy(&data[..20], Release(104)).unwrap_err().is_truncated());
    }
}
