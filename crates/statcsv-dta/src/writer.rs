//! Dataset writer.
//!
//! Writes little-endian release 114 (legacy binary) or release 118 (tagged,
//! UTF-8, with strL support) files.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::cursor::ByteOrder;
use crate::data::{DOUBLE_MISSING, FLOAT_MISSING};
use crate::error::{DtaError, Result};
use crate::header::Release;
use crate::types::{DtaDataset, DtaType, DtaValue, DtaVariable, ValueLabelTable};

/// Missing codes written for `None`.
const BYTE_MISSING: i8 = 101;
const INT_MISSING: i16 = 32_741;
const LONG_MISSING: i32 = 2_147_483_621;

/// Release to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DtaVersion {
    /// Stata 10-12 legacy binary.
    V114,
    /// Stata 14+ tagged format.
    #[default]
    V118,
}

impl DtaVersion {
    fn release(self) -> Release {
        match self {
            Self::V114 => Release(114),
            Self::V118 => Release(118),
        }
    }
}

/// Options for writing datasets.
#[derive(Debug, Clone, Copy, Default)]
pub struct DtaWriterOptions {
    pub version: DtaVersion,
}

impl DtaWriterOptions {
    #[must_use]
    pub fn with_version(mut self, version: DtaVersion) -> Self {
        self.version = version;
        self
    }
}

/// Stata dataset writer.
pub struct DtaWriter<W: Write> {
    writer: W,
    options: DtaWriterOptions,
}

impl<W: Write> DtaWriter<W> {
    pub fn new(writer: W) -> Self {
        Self::with_options(writer, DtaWriterOptions::default())
    }

    pub fn with_options(writer: W, options: DtaWriterOptions) -> Self {
        Self { writer, options }
    }

    /// Write the dataset and its value label tables.
    pub fn write_file(mut self, dataset: &DtaDataset, labels: &[ValueLabelTable]) -> Result<()> {
        let bytes = write_dta_to_vec(dataset, labels, self.options)?;
        self.writer.write_all(&bytes)?;
        self.writer.flush()?;
        Ok(())
    }
}

impl DtaWriter<BufWriter<File>> {
    pub fn create(path: &Path) -> Result<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

/// Write a dataset to a path using release 118.
pub fn write_dta(path: &Path, dataset: &DtaDataset, labels: &[ValueLabelTable]) -> Result<()> {
    DtaWriter::create(path)?.write_file(dataset, labels)
}

/// Encode a dataset into memory.
pub fn write_dta_to_vec(
    dataset: &DtaDataset,
    labels: &[ValueLabelTable],
    options: DtaWriterOptions,
) -> Result<Vec<u8>> {
    let release = options.version.release();
    validate(dataset, release)?;
    let mut out = Out::default();
    match options.version {
        DtaVersion::V114 => write_legacy(&mut out, dataset, labels, release)?,
        DtaVersion::V118 => write_tagged(&mut out, dataset, labels, release)?,
    }
    Ok(out.bytes)
}

fn validate(dataset: &DtaDataset, release: Release) -> Result<()> {
    let mut names = HashSet::new();
    for variable in &dataset.variables {
        if variable.name.is_empty() || variable.name.len() >= release.name_len() {
            return Err(DtaError::invalid_dataset(format!(
                "variable name {:?} must be 1-{} bytes",
                variable.name,
                release.name_len() - 1
            )));
        }
        if !names.insert(variable.name.as_str()) {
            return Err(DtaError::invalid_dataset(format!(
                "duplicate variable name {}",
                variable.name
            )));
        }
        let supported = match (variable.var_type, release.is_tagged()) {
            (DtaType::StrL, tagged) => tagged,
            (DtaType::Str(width), false) => (1..=244).contains(&width),
            (DtaType::Str(width), true) => (1..=2045).contains(&width),
            _ => true,
        };
        if !supported {
            return Err(DtaError::invalid_dataset(format!(
                "{} has a type release {} cannot store",
                variable.name, release.0
            )));
        }
    }
    for (index, row) in dataset.rows.iter().enumerate() {
        for (value, variable) in row.iter().zip(&dataset.variables) {
            let fits = match (value, variable.var_type) {
                (DtaValue::Byte(v), DtaType::Byte) => v.is_none_or(|v| v < BYTE_MISSING),
                (DtaValue::Int(v), DtaType::Int) => v.is_none_or(|v| v < INT_MISSING),
                (DtaValue::Long(v), DtaType::Long) => v.is_none_or(|v| v < LONG_MISSING),
                (DtaValue::Float(_), DtaType::Float) | (DtaValue::Double(_), DtaType::Double) => {
                    true
                }
                (DtaValue::Str(text), DtaType::Str(width)) => text.len() <= usize::from(width),
                (DtaValue::Str(_), DtaType::StrL) => true,
                _ => false,
            };
            if !fits {
                return Err(DtaError::invalid_dataset(format!(
                    "row {index}: value does not fit variable {}",
                    variable.name
                )));
            }
        }
    }
    Ok(())
}

fn write_legacy(
    out: &mut Out,
    dataset: &DtaDataset,
    labels: &[ValueLabelTable],
    release: Release,
) -> Result<()> {
    let nvar = u16::try_from(dataset.variables.len())
        .map_err(|_| DtaError::invalid_dataset("too many variables"))?;
    out.bytes.extend_from_slice(&[
        u8::try_from(release.0).unwrap_or(114),
        ByteOrder::Little.code(),
        1,
        0,
    ]);
    out.u16(nvar);
    out.u32(to_u32(dataset.rows.len())?);
    out.fixed(&dataset.header.data_label, release.label_len());
    out.fixed(&dataset.header.timestamp, 18);

    for variable in &dataset.variables {
        out.bytes
            .push(variable.var_type.legacy_code().unwrap_or_default());
    }
    write_descriptors(out, &dataset.variables, release);
    // expansion fields: terminator only
    out.bytes.push(0);
    out.u32(0);

    for row in &dataset.rows {
        write_row(out, row, &dataset.variables, &[]);
    }
    for table in labels {
        write_label_table(out, table, release)?;
    }
    Ok(())
}

fn write_descriptors(out: &mut Out, variables: &[DtaVariable], release: Release) {
    for variable in variables {
        out.fixed(&variable.name, release.name_len());
    }
    let sort_width = 2 * (variables.len() + 1);
    out.bytes.resize(out.bytes.len() + sort_width, 0);
    for variable in variables {
        out.fixed(&variable.format, release.format_len());
    }
    for variable in variables {
        out.fixed(
            variable.value_labels.as_deref().unwrap_or_default(),
            release.name_len(),
        );
    }
    for variable in variables {
        out.fixed(
            variable.label.as_deref().unwrap_or_default(),
            release.label_len(),
        );
    }
}

fn write_tagged(
    out: &mut Out,
    dataset: &DtaDataset,
    labels: &[ValueLabelTable],
    release: Release,
) -> Result<()> {
    let nvar = u16::try_from(dataset.variables.len())
        .map_err(|_| DtaError::invalid_dataset("too many variables"))?;
    let mut map = [0u64; 14];

    out.tag("<stata_dta>");
    out.tag("<header>");
    out.tag("<release>118</release>");
    out.tag("<byteorder>");
    out.tag(ByteOrder::Little.tag());
    out.tag("</byteorder>");
    out.tag("<K>");
    out.u16(nvar);
    out.tag("</K>");
    out.tag("<N>");
    out.u64(dataset.rows.len() as u64);
    out.tag("</N>");
    out.tag("<label>");
    let label = truncate(&dataset.header.data_label, 80);
    out.u16(u16::try_from(label.len()).unwrap_or(80));
    out.bytes.extend_from_slice(label.as_bytes());
    out.tag("</label>");
    out.tag("<timestamp>");
    let stamp = truncate(&dataset.header.timestamp, 17);
    out.bytes.push(u8::try_from(stamp.len()).unwrap_or(17));
    out.bytes.extend_from_slice(stamp.as_bytes());
    out.tag("</timestamp>");
    out.tag("</header>");

    map[1] = out.offset();
    out.tag("<map>");
    let map_at = out.bytes.len();
    out.bytes.resize(map_at + 14 * 8, 0);
    out.tag("</map>");

    map[2] = out.offset();
    out.tag("<variable_types>");
    for variable in &dataset.variables {
        out.u16(variable.var_type.tagged_code());
    }
    out.tag("</variable_types>");

    map[3] = out.offset();
    out.tag("<varnames>");
    for variable in &dataset.variables {
        out.fixed(&variable.name, release.name_len());
    }
    out.tag("</varnames>");

    map[4] = out.offset();
    out.tag("<sortlist>");
    out.bytes
        .resize(out.bytes.len() + 2 * (dataset.variables.len() + 1), 0);
    out.tag("</sortlist>");

    map[5] = out.offset();
    out.tag("<formats>");
    for variable in &dataset.variables {
        out.fixed(&variable.format, release.format_len());
    }
    out.tag("</formats>");

    map[6] = out.offset();
    out.tag("<value_label_names>");
    for variable in &dataset.variables {
        out.fixed(
            variable.value_labels.as_deref().unwrap_or_default(),
            release.name_len(),
        );
    }
    out.tag("</value_label_names>");

    map[7] = out.offset();
    out.tag("<variable_labels>");
    for variable in &dataset.variables {
        out.fixed(
            variable.label.as_deref().unwrap_or_default(),
            release.label_len(),
        );
    }
    out.tag("</variable_labels>");

    map[8] = out.offset();
    out.tag("<characteristics>");
    out.tag("</characteristics>");

    // strL values are stored once per cell, keyed by (variable, observation)
    let mut strls: Vec<(u16, u64, &str)> = Vec::new();
    map[9] = out.offset();
    out.tag("<data>");
    for (obs, row) in dataset.rows.iter().enumerate() {
        let mut refs = Vec::new();
        for (index, (value, variable)) in row.iter().zip(&dataset.variables).enumerate() {
            if let (DtaType::StrL, DtaValue::Str(text)) = (variable.var_type, value)
                && !text.is_empty()
            {
                let v = u16::try_from(index + 1)
                    .map_err(|_| DtaError::invalid_dataset("too many variables"))?;
                let o = obs as u64 + 1;
                strls.push((v, o, text));
                refs.push((index, v, o));
            }
        }
        write_row(out, row, &dataset.variables, &refs);
    }
    out.tag("</data>");

    map[10] = out.offset();
    out.tag("<strls>");
    for (v, o, text) in &strls {
        out.tag("GSO");
        out.u32(u32::from(*v));
        out.u64(*o);
        out.bytes.push(130);
        out.u32(to_u32(text.len() + 1)?);
        out.bytes.extend_from_slice(text.as_bytes());
        out.bytes.push(0);
    }
    out.tag("</strls>");

    map[11] = out.offset();
    out.tag("<value_labels>");
    for table in labels {
        out.tag("<lbl>");
        write_label_table(out, table, release)?;
        out.tag("</lbl>");
    }
    out.tag("</value_labels>");

    map[12] = out.offset();
    out.tag("</stata_dta>");
    map[13] = out.offset();

    for (index, offset) in map.iter().enumerate() {
        let at = map_at + index * 8;
        out.bytes[at..at + 8].copy_from_slice(&offset.to_le_bytes());
    }
    Ok(())
}

/// Write one observation; `strl_refs` lists `(variable index, v, o)`.
fn write_row(
    out: &mut Out,
    row: &[DtaValue],
    variables: &[DtaVariable],
    strl_refs: &[(usize, u16, u64)],
) {
    for (index, (value, variable)) in row.iter().zip(variables).enumerate() {
        match (value, variable.var_type) {
            (DtaValue::Byte(v), _) => {
                out.bytes.extend_from_slice(&v.unwrap_or(BYTE_MISSING).to_le_bytes());
            }
            (DtaValue::Int(v), _) => {
                out.bytes.extend_from_slice(&v.unwrap_or(INT_MISSING).to_le_bytes());
            }
            (DtaValue::Long(v), _) => {
                out.bytes.extend_from_slice(&v.unwrap_or(LONG_MISSING).to_le_bytes());
            }
            (DtaValue::Float(v), _) => {
                out.bytes.extend_from_slice(&v.unwrap_or(FLOAT_MISSING).to_le_bytes());
            }
            (DtaValue::Double(v), _) => {
                out.bytes.extend_from_slice(&v.unwrap_or(DOUBLE_MISSING).to_le_bytes());
            }
            (DtaValue::Str(_), DtaType::StrL) => {
                let (v, o) = strl_refs
                    .iter()
                    .find(|(at, _, _)| *at == index)
                    .map_or((0, 0), |&(_, v, o)| (v, o));
                out.bytes.extend_from_slice(&v.to_le_bytes());
                out.bytes.extend_from_slice(&o.to_le_bytes()[..6]);
            }
            (DtaValue::Str(text), var_type) => {
                let start = out.bytes.len();
                out.bytes.extend_from_slice(text.as_bytes());
                out.bytes.resize(start + var_type.width(), 0);
            }
        }
    }
}

fn write_label_table(out: &mut Out, table: &ValueLabelTable, release: Release) -> Result<()> {
    let mut text = Vec::new();
    let mut offsets = Vec::with_capacity(table.entries.len());
    for (_, label) in &table.entries {
        offsets.push(to_u32(text.len())?);
        text.extend_from_slice(label.as_bytes());
        text.push(0);
    }
    let count = table.entries.len();
    let len = 8 + 8 * count + text.len();

    out.u32(to_u32(len)?);
    out.fixed(&table.name, release.name_len());
    out.bytes.extend_from_slice(&[0; 3]);
    out.u32(to_u32(count)?);
    out.u32(to_u32(text.len())?);
    for offset in offsets {
        out.u32(offset);
    }
    for (code, _) in &table.entries {
        out.bytes.extend_from_slice(&code.to_le_bytes());
    }
    out.bytes.extend_from_slice(&text);
    Ok(())
}

fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

fn to_u32(value: usize) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| DtaError::invalid_dataset(format!("{value} does not fit a 32-bit field")))
}

#[derive(Default)]
struct Out {
    bytes: Vec<u8>,
}

impl Out {
    fn offset(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn tag(&mut self, tag: &str) {
        self.bytes.extend_from_slice(tag.as_bytes());
    }

    fn u16(&mut self, value: u16) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    fn u32(&mut self, value: u32) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    fn u64(&mut self, value: u64) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    /// NUL-padded field; the last byte is always a terminator.
    fn fixed(&mut self, text: &str, width: usize) {
        let text = truncate(text, width - 1);
        let start = self.bytes.len();
        self.bytes.extend_from_slice(text.as_bytes());
        self.bytes.resize(start + width, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strl_rejected_in_legacy() {
        let dataset = DtaDataset::with_variables(vec![DtaVariable::new("notes", DtaType::StrL)]);
        let options = DtaWriterOptions::default().with_version(DtaVersion::V114);
        assert!(matches!(
            write_dta_to_vec(&dataset, &[], options),
            Err(DtaError::InvalidDataset { .. })
        ));
    }

    #[test]
    fn test_reserved_integer_rejected() {
        let mut dataset = DtaDataset::with_variables(vec![DtaVariable::new("b", DtaType::Byte)]);
        dataset.add_row(vec![DtaValue::Byte(Some(101))]);
        assert!(write_dta_to_vec(&dataset, &[], DtaWriterOptions::default()).is_err());
    }

    #[test]
    fn test_tagged_opening() {
        let dataset = DtaDataset::with_variables(vec![DtaVariable::new("x", DtaType::Double)]);
        let bytes = write_dta_to_vec(&dataset, &[], DtaWriterOptions::default()).unwrap();
        assert!(bytes.starts_with(b"<stata_dta><header><release>118</release>"));
        assert!(bytes.ends_with(b"</stata_dta>"));
    }

    #[test]
    fn test_truncate_respects_char_boundary() {
        assert_eq!(truncate("héllo", 2), "h");
        assert_eq!(truncate("abc", 5), "abc");
    }
}
