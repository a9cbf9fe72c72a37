//! Observation decoding and the strL table.

use std::collections::HashMap;

use crate::cursor::{ByteCursor, ByteOrder};
use crate::error::{DtaError, Result};
use crate::header::{Layout, Release, fixed_text};
use crate::types::{DtaType, DtaValue};

/// Largest non-missing values for releases with extended missing codes.
const BYTE_MAX: i8 = 100;
const INT_MAX: i16 = 32_740;
const LONG_MAX: i32 = 2_147_483_620;

/// System missing of releases before 113.
const OLD_BYTE_MISSING: i8 = 127;
const OLD_INT_MISSING: i16 = 32_767;
const OLD_LONG_MISSING: i32 = 2_147_483_647;

/// `.` for floats and doubles; everything at or above is missing.
pub(crate) const FLOAT_MISSING: f32 = f32::from_bits(0x7f00_0000);
pub(crate) const DOUBLE_MISSING: f64 = f64::from_bits(0x7fe0_0000_0000_0000);

/// GSO content types.
const GSO_BINARY: u8 = 129;
const GSO_ASCII: u8 = 130;

type StrlTable = HashMap<(u64, u64), String>;

/// Decode every observation.
pub(crate) fn decode_rows(data: &[u8], layout: &Layout) -> Result<Vec<Vec<DtaValue>>> {
    let order = layout.header.byte_order;
    let strls = match layout.strls_offset {
        Some(offset) => parse_strls(data, offset, layout.release, order)?,
        None => StrlTable::new(),
    };

    let mut cursor = ByteCursor::at(data, layout.data_offset, order);
    let mut rows = Vec::with_capacity(layout.nobs.min(1 << 20));
    for _ in 0..layout.nobs {
        let row = layout
            .variables
            .iter()
            .map(|variable| read_value(&mut cursor, variable.var_type, layout.release, &strls))
            .collect::<Result<Vec<_>>>()?;
        rows.push(row);
    }
    if layout.release.is_tagged() {
        cursor.expect("</data>")?;
    }
    Ok(rows)
}

fn read_value(
    cursor: &mut ByteCursor<'_>,
    var_type: DtaType,
    release: Release,
    strls: &StrlTable,
) -> Result<DtaValue> {
    let extended = release.extended_missing();
    Ok(match var_type {
        DtaType::Byte => {
            let v = cursor.i8()?;
            let missing = if extended { v > BYTE_MAX } else { v == OLD_BYTE_MISSING };
            DtaValue::Byte((!missing).then_some(v))
        }
        DtaType::Int => {
            let v = cursor.i16()?;
            let missing = if extended { v > INT_MAX } else { v == OLD_INT_MISSING };
            DtaValue::Int((!missing).then_some(v))
        }
        DtaType::Long => {
            let v = cursor.i32()?;
            let missing = if extended { v > LONG_MAX } else { v == OLD_LONG_MISSING };
            DtaValue::Long((!missing).then_some(v))
        }
        DtaType::Float => {
            let v = cursor.f32()?;
            DtaValue::Float((v.is_finite() && v < FLOAT_MISSING).then_some(v))
        }
        DtaType::Double => {
            let v = cursor.f64()?;
            DtaValue::Double((v.is_finite() && v < DOUBLE_MISSING).then_some(v))
        }
        DtaType::Str(width) => {
            DtaValue::Str(fixed_text(release.encoding(), cursor.take(usize::from(width))?))
        }
        DtaType::StrL => {
            let offset = cursor.position();
            let bytes = cursor.take(8)?;
            let key = strl_key(bytes, release, cursor.order());
            if key == (0, 0) {
                DtaValue::Str(String::new())
            } else {
                let text = strls.get(&key).ok_or_else(|| {
                    DtaError::invalid_section(
                        "strL reference",
                        offset,
                        format!("no GSO entry for v={} o={}", key.0, key.1),
                    )
                })?;
                DtaValue::Str(text.clone())
            }
        }
    })
}

/// Split an 8-byte strL reference into `(v, o)`.
pub(crate) fn strl_key(bytes: &[u8], release: Release, order: ByteOrder) -> (u64, u64) {
    let v_len = release.strl_v_len();
    (order.uint(&bytes[..v_len]), order.uint(&bytes[v_len..8]))
}

/// Parse the `<strls>` section into a lookup table.
fn parse_strls(data: &[u8], offset: usize, release: Release, order: ByteOrder) -> Result<StrlTable> {
    let mut cursor = ByteCursor::at(data, offset, order);
    cursor.expect("<strls>")?;
    let mut table = StrlTable::new();
    while !cursor.accept("</strls>") {
        cursor.expect("GSO")?;
        let v = u64::from(cursor.u32()?);
        let o = if release.0 == 117 {
            u64::from(cursor.u32()?)
        } else {
            cursor.u64()?
        };
        let kind_offset = cursor.position();
        let kind = cursor.u8()?;
        let len = cursor.len_u32()?;
        let bytes = cursor.take(len)?;
        let text = match kind {
            GSO_ASCII => fixed_text(release.encoding(), bytes),
            GSO_BINARY => String::from_utf8_lossy(bytes).into_owned(),
            other => {
                return Err(DtaError::invalid_section(
                    "strls",
                    kind_offset,
                    format!("unknown GSO type {other}"),
                ));
            }
        };
        table.insert((v, o), text);
    }
    Ok(table)
}
