//! Value label tables.
//!
//! Each table is stored as:
//!
//! | Field   | Type          |
//! |---------|---------------|
//! | len     | u32           |
//! | name    | char[33/129]  |
//! | padding | 3 bytes       |
//! | n       | u32           |
//! | txtlen  | u32           |
//! | off     | u32 × n       |
//! | val     | i32 × n       |
//! | txt     | char[txtlen]  |
//!
//! Tagged releases wrap the list in `<value_labels>` and each table in
//! `<lbl>`; legacy releases simply run tables until the end of the file.

use crate::cursor::ByteCursor;
use crate::error::{DtaError, Result};
use crate::header::{LabelSection, Layout, Release, fixed_text};
use crate::types::{DtaValueLabels, ValueLabelTable};

/// Read every value label table plus the variable assignments.
pub(crate) fn read_label_tables(data: &[u8], layout: &Layout) -> Result<DtaValueLabels> {
    let tables = match layout.labels {
        LabelSection::Unsupported => Vec::new(),
        LabelSection::Legacy(offset) => {
            let mut cursor = ByteCursor::at(data, offset, layout.header.byte_order);
            let mut tables = Vec::new();
            while cursor.remaining() > 0 {
                tables.push(read_table(&mut cursor, layout.release)?);
            }
            tables
        }
        LabelSection::Tagged(offset) => {
            let mut cursor = ByteCursor::at(data, offset, layout.header.byte_order);
            cursor.expect("<value_labels>")?;
            let mut tables = Vec::new();
            while !cursor.accept("</value_labels>") {
                cursor.expect("<lbl>")?;
                tables.push(read_table(&mut cursor, layout.release)?);
                cursor.expect("</lbl>")?;
            }
            tables
        }
    };

    let assignments = if tables.is_empty() {
        Vec::new()
    } else {
        layout
            .variables
            .iter()
            .filter_map(|variable| {
                variable
                    .value_labels
                    .as_ref()
                    .map(|set| (variable.name.clone(), set.clone()))
            })
            .collect()
    };
    Ok(DtaValueLabels {
        tables,
        assignments,
    })
}

fn read_table(cursor: &mut ByteCursor<'_>, release: Release) -> Result<ValueLabelTable> {
    let len = cursor.len_u32()?;
    let name = fixed_text(release.encoding(), cursor.take(release.name_len())?);
    cursor.skip(3)?;
    let table_offset = cursor.position();
    let body = cursor.take(len)?;

    let mut table = ByteCursor::at(body, 0, cursor.order());
    let count = table.len_u32()?;
    let text_len = table.len_u32()?;
    let offsets = (0..count)
        .map(|_| table.len_u32())
        .collect::<Result<Vec<_>>>()?;
    let codes = (0..count)
        .map(|_| table.i32())
        .collect::<Result<Vec<_>>>()?;
    let text = table.take(text_len)?;

    let entries = codes
        .into_iter()
        .zip(offsets)
        .map(|(code, start)| {
            let label = text.get(start..).ok_or_else(|| {
                DtaError::invalid_section(
                    "value label table",
                    table_offset,
                    format!("{name}: text offset {start} past {text_len} bytes"),
                )
            })?;
            Ok((code, fixed_text(release.encoding(), label)))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ValueLabelTable { name, entries })
}
