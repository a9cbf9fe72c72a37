//! Tagged layout (releases 117-119).
//!
//! ```text
//! <stata_dta><header><release>118</release><byteorder>LSF</byteorder>
//! <K>nvar</K><N>nobs</N><label>..</label><timestamp>..</timestamp></header>
//! <map>14 × u64</map><variable_types>..</variable_types><varnames>..</varnames>
//! <sortlist>..</sortlist><formats>..</formats><value_label_names>..</value_label_names>
//! <variable_labels>..</variable_labels><characteristics>..</characteristics>
//! <data>..</data><strls>..</strls><value_labels>..</value_labels></stata_dta>
//! ```
//!
//! | Field     | 117 | 118 | 119 |
//! |-----------|-----|-----|-----|
//! | K         | u16 | u16 | u32 |
//! | N         | u32 | u64 | u64 |
//! | label len | u8  | u16 | u16 |

use encoding_rs::Encoding;

use crate::cursor::{ByteCursor, ByteOrder};
use crate::error::{DtaError, Result};
use crate::types::{DtaHeader, DtaType, DtaVariable};

use super::{LabelSection, Layout, Release, TAGGED_RELEASES, fixed_text, non_empty};

const OPENING: &[u8] = b"<stata_dta>";

/// Indices into the 14-entry section map.
mod map {
    pub const VARIABLE_TYPES: usize = 2;
    pub const VARNAMES: usize = 3;
    pub const FORMATS: usize = 5;
    pub const VALUE_LABEL_NAMES: usize = 6;
    pub const VARIABLE_LABELS: usize = 7;
    pub const DATA: usize = 9;
    pub const STRLS: usize = 10;
    pub const VALUE_LABELS: usize = 11;
    pub const LEN: usize = 14;
}

pub(crate) fn parse_tagged(data: &[u8]) -> Result<Layout> {
    if !data.starts_with(OPENING) {
        if OPENING.starts_with(data) {
            return Err(DtaError::Truncated {
                offset: data.len(),
                needed: OPENING.len() - data.len(),
                available: 0,
            });
        }
        return Err(DtaError::not_dta("missing <stata_dta> opening tag"));
    }

    let mut cursor = ByteCursor::at(data, OPENING.len(), ByteOrder::Little);
    cursor.expect("<header>")?;
    cursor.expect("<release>")?;
    let release_offset = cursor.position();
    let release = std::str::from_utf8(cursor.take(3)?)
        .ok()
        .and_then(|text| text.parse::<u16>().ok())
        .ok_or_else(|| DtaError::invalid_section("release", release_offset, "not a number"))?;
    if !TAGGED_RELEASES.contains(&release) {
        return Err(DtaError::UnsupportedVersion { release });
    }
    let release = Release(release);
    cursor.expect("</release>")?;

    cursor.expect("<byteorder>")?;
    let order_offset = cursor.position();
    let order = match cursor.take(3)? {
        b"MSF" => ByteOrder::Big,
        b"LSF" => ByteOrder::Little,
        other => {
            return Err(DtaError::invalid_section(
                "byteorder",
                order_offset,
                format!("unknown byte order {}", String::from_utf8_lossy(other)),
            ));
        }
    };
    cursor.expect("</byteorder>")?;

    let mut cursor = ByteCursor::at(data, cursor.position(), order);
    let encoding = release.encoding();

    cursor.expect("<K>")?;
    let nvar = if release.0 >= 119 {
        cursor.len_u32()?
    } else {
        usize::from(cursor.u16()?)
    };
    cursor.expect("</K>")?;

    cursor.expect("<N>")?;
    let nobs = if release.0 == 117 {
        u64::from(cursor.u32()?)
    } else {
        cursor.u64()?
    };
    let nobs = usize::try_from(nobs)
        .map_err(|_| DtaError::invalid_section("N", cursor.position(), "too many observations"))?;
    cursor.expect("</N>")?;

    cursor.expect("<label>")?;
    let label_len = if release.0 == 117 {
        usize::from(cursor.u8()?)
    } else {
        usize::from(cursor.u16()?)
    };
    let data_label = fixed_text(encoding, cursor.take(label_len)?);
    cursor.expect("</label>")?;

    cursor.expect("<timestamp>")?;
    let stamp_len = usize::from(cursor.u8()?);
    let timestamp = fixed_text(encoding, cursor.take(stamp_len)?);
    cursor.expect("</timestamp>")?;
    cursor.expect("</header>")?;

    cursor.expect("<map>")?;
    let mut offsets = [0usize; map::LEN];
    for slot in &mut offsets {
        let offset = cursor.position();
        *slot = usize::try_from(cursor.u64()?)
            .map_err(|_| DtaError::invalid_section("map", offset, "offset too large"))?;
    }
    cursor.expect("</map>")?;

    let mut section = ByteCursor::at(data, offsets[map::VARIABLE_TYPES], order);
    section.expect("<variable_types>")?;
    let types = (0..nvar)
        .map(|_| {
            let offset = section.position();
            let code = section.u16()?;
            DtaType::from_tagged_code(code).ok_or_else(|| {
                DtaError::invalid_section("variable_types", offset, format!("type code {code}"))
            })
        })
        .collect::<Result<Vec<_>>>()?;
    section.expect("</variable_types>")?;

    let names = tagged_fields(
        data,
        offsets[map::VARNAMES],
        "varnames",
        nvar,
        release.name_len(),
        encoding,
        order,
    )?;
    let formats = tagged_fields(
        data,
        offsets[map::FORMATS],
        "formats",
        nvar,
        release.format_len(),
        encoding,
        order,
    )?;
    let label_names = tagged_fields(
        data,
        offsets[map::VALUE_LABEL_NAMES],
        "value_label_names",
        nvar,
        release.name_len(),
        encoding,
        order,
    )?;
    let labels = tagged_fields(
        data,
        offsets[map::VARIABLE_LABELS],
        "variable_labels",
        nvar,
        release.label_len(),
        encoding,
        order,
    )?;

    let mut section = ByteCursor::at(data, offsets[map::DATA], order);
    section.expect("<data>")?;
    let data_offset = section.position();

    let variables = types
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
        strls_offset: Some(offsets[map::STRLS]),
        labels: LabelSection::Tagged(offsets[map::VALUE_LABELS]),
    })
}

fn tagged_fields(
    data: &[u8],
    offset: usize,
    tag: &'static str,
    count: usize,
    width: usize,
    encoding: &'static Encoding,
    order: ByteOrder,
) -> Result<Vec<String>> {
    let mut cursor = ByteCursor::at(data, offset, order);
    let open = format!("<{tag}>");
    if !cursor.accept(&open) {
        return Err(DtaError::invalid_section(tag, offset, format!("expected {open}")));
    }
    let fields = (0..count)
        .map(|_| Ok(fixed_text(encoding, cursor.take(width)?)))
        .collect::<Result<Vec<_>>>()?;
    let close = format!("</{tag}>");
    if !cursor.accept(&close) {
        let at = cursor.position();
        cursor.take(close.len())?;
        return Err(DtaError::invalid_section(tag, at, format!("expected {close}")));
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_opening_tag_is_truncated() {
        assert!(parse_tagged(b"<stata").unwrap_err().is_truncated());
    }

    #[test]
    fn test_other_xml_is_not_dta() {
        assert!(matches!(
            parse_tagged(b"<?xml version=\"1.0\"?>"),
            Err(DtaError::NotDta { .. })
        ));
    }

    #[test]
    fn test_unknown_release() {
        let err = parse_tagged(b"<stata_dta><header><release>120</release>").unwrap_err();
        assert!(matches!(err, DtaError::UnsupportedVersion { release: 120 }));
    }

    #[test]
    fn test_header_cut_short() {
        let err = parse_tagged(b"<stata_dta><header><release>118</release><byteorder>LS")
            .unwrap_err();
        assert!(err.is_truncated());
    }
}
