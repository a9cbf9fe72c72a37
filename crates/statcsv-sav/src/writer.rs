//! System file writer.
//!
//! Produces little-endian, UTF-8 system files. Used to build fixtures and to
//! hand converted datasets back to SPSS users; very long strings (over 255
//! bytes) are not written.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use flate2::Compression as ZlibLevel;
use flate2::write::ZlibEncoder;

use crate::error::{Result, SavError};
use crate::header::{HEADER_LEN, MAGIC_STANDARD, MAGIC_ZLIB, SYSMIS, record, subtype};
use crate::types::{Compression, LabelValue, MissingValues, SavFile, SavType, SavValue};

/// Uncompressed size of each zlib block.
const ZLIB_BLOCK_SIZE: usize = 0x3F_F000;

/// Options for writing system files.
#[derive(Debug, Clone, Copy, Default)]
pub struct SavWriterOptions {
    pub compression: Compression,
}

impl SavWriterOptions {
    #[must_use]
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }
}

/// SPSS system file writer.
pub struct SavWriter<W: Write> {
    writer: W,
    options: SavWriterOptions,
}

impl<W: Write> SavWriter<W> {
    /// Create a new writer with default options (uncompressed).
    pub fn new(writer: W) -> Self {
        Self::with_options(writer, SavWriterOptions::default())
    }

    pub fn with_options(writer: W, options: SavWriterOptions) -> Self {
        Self { writer, options }
    }

    /// Write a complete file.
    pub fn write_file(mut self, file: &SavFile) -> Result<()> {
        let bytes = encode_file(file, self.options)?;
        self.writer.write_all(&bytes)?;
        self.writer.flush()?;
        Ok(())
    }
}

impl SavWriter<BufWriter<File>> {
    /// Create a system file at `path`.
    pub fn create(path: &Path) -> Result<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

/// Write a system file to a path.
pub fn write_sav(path: &Path, file: &SavFile) -> Result<()> {
    SavWriter::create(path)?.write_file(file)
}

/// Encode a system file into memory.
pub fn write_sav_to_vec(file: &SavFile, options: SavWriterOptions) -> Result<Vec<u8>> {
    encode_file(file, options)
}

fn encode_file(file: &SavFile, options: SavWriterOptions) -> Result<Vec<u8>> {
    validate(file)?;
    let short_names = short_names(file);
    let slot_count: usize = file.variables.iter().map(|v| v.var_type.slots()).sum();

    let mut out = Out::default();
    write_header(&mut out, file, options.compression, slot_count)?;
    write_variables(&mut out, file, &short_names)?;
    write_value_labels(&mut out, file)?;
    if !file.documents.is_empty() {
        out.i32(record::DOCUMENT);
        out.i32(to_i32(file.documents.len())?);
        for line in &file.documents {
            out.padded(line.as_bytes(), 80);
        }
    }
    write_extensions(&mut out, file, &short_names)?;
    out.i32(record::DICTIONARY_END);
    out.i32(0);

    match options.compression {
        Compression::None => {
            for row in &file.rows {
                for slot in case_slots(file, row) {
                    out.bytes.extend_from_slice(&slot);
                }
            }
        }
        Compression::Bytecode => {
            let stream = bytecode(file, 100.0);
            out.bytes.extend_from_slice(&stream);
        }
        Compression::Zlib => {
            let stream = bytecode(file, 100.0);
            write_zlib(&mut out, &stream)?;
        }
    }
    Ok(out.bytes)
}

fn validate(file: &SavFile) -> Result<()> {
    let mut names = HashSet::new();
    for variable in &file.variables {
        if variable.name.is_empty() {
            return Err(SavError::invalid_dataset("variable name is empty"));
        }
        if !names.insert(variable.name.to_ascii_uppercase()) {
            return Err(SavError::invalid_dataset(format!(
                "duplicate variable name {}",
                variable.name
            )));
        }
        if let SavType::String { width } = variable.var_type
            && !(1..=255).contains(&width)
        {
            return Err(SavError::invalid_dataset(format!(
                "{} has unsupported string width {width}",
                variable.name
            )));
        }
    }
    for (index, row) in file.rows.iter().enumerate() {
        for (value, variable) in row.iter().zip(&file.variables) {
            match (value, variable.var_type) {
                (SavValue::Num(_), SavType::Numeric) => {}
                (SavValue::Str(text), SavType::String { width }) if text.len() <= width => {}
                _ => {
                    return Err(SavError::invalid_dataset(format!(
                        "row {index}: value does not fit variable {}",
                        variable.name
                    )));
                }
            }
        }
    }
    for set in &file.value_labels {
        if set.variables.iter().any(|&index| index >= file.variables.len()) {
            return Err(SavError::invalid_dataset(
                "value label set refers to an unknown variable",
            ));
        }
    }
    Ok(())
}

/// Dictionary names: uppercase ASCII, at most 8 bytes, unique.
fn short_names(file: &SavFile) -> Vec<String> {
    let mut taken = HashSet::new();
    file.variables
        .iter()
        .enumerate()
        .map(|(index, variable)| {
            let mut name: String = variable
                .name
                .chars()
                .map(|c| {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        c.to_ascii_uppercase()
                    } else {
                        '_'
                    }
                })
                .take(8)
                .collect();
            if !name.starts_with(|c: char| c.is_ascii_alphabetic()) || taken.contains(&name) {
                name = format!("V{index:07}");
            }
            taken.insert(name.clone());
            name
        })
        .collect()
}

fn write_header(
    out: &mut Out,
    file: &SavFile,
    compression: Compression,
    slot_count: usize,
) -> Result<()> {
    let magic = if compression == Compression::Zlib {
        MAGIC_ZLIB
    } else {
        MAGIC_STANDARD
    };
    out.bytes.extend_from_slice(magic);
    out.padded(file.header.product.as_bytes(), 60);
    out.i32(2);
    out.i32(to_i32(slot_count)?);
    out.i32(compression.code());
    out.i32(0);
    out.i32(to_i32(file.rows.len())?);
    out.f64(100.0);
    out.padded(file.header.creation_date.as_bytes(), 9);
    out.padded(file.header.creation_time.as_bytes(), 8);
    out.padded(file.header.file_label.as_bytes(), 64);
    out.bytes.extend_from_slice(&[0; 3]);
    debug_assert_eq!(out.bytes.len(), HEADER_LEN);
    Ok(())
}

fn write_variables(out: &mut Out, file: &SavFile, short_names: &[String]) -> Result<()> {
    for (variable, short_name) in file.variables.iter().zip(short_names) {
        let type_code = match variable.var_type {
            SavType::Numeric => 0,
            SavType::String { width } => to_i32(width)?,
        };
        let (missing_code, missing) = missing_slots(&variable.missing);

        out.i32(record::VARIABLE);
        out.i32(type_code);
        out.i32(i32::from(variable.label.is_some()));
        out.i32(missing_code);
        out.i32(variable.print_format.to_raw());
        out.i32(variable.print_format.to_raw());
        out.padded(short_name.as_bytes(), 8);
        if let Some(label) = &variable.label {
            let label = &label.as_bytes()[..label.len().min(255)];
            out.i32(to_i32(label.len())?);
            out.padded(label, label.len().div_ceil(4) * 4);
        }
        for slot in missing {
            out.bytes.extend_from_slice(&slot);
        }

        for _ in 1..variable.var_type.slots() {
            out.i32(record::VARIABLE);
            out.i32(-1);
            out.i32(0);
            out.i32(0);
            out.i32(0);
            out.i32(0);
            out.padded(b"", 8);
        }
    }
    Ok(())
}

fn missing_slots(missing: &MissingValues) -> (i32, Vec<[u8; 8]>) {
    match missing {
        MissingValues::None => (0, Vec::new()),
        MissingValues::Discrete(codes) => {
            let codes: Vec<[u8; 8]> = codes.iter().take(3).map(|c| c.to_le_bytes()).collect();
            (codes.len() as i32, codes)
        }
        MissingValues::Range {
            low,
            high,
            discrete,
        } => {
            let mut slots = vec![low.to_le_bytes(), high.to_le_bytes()];
            match discrete {
                Some(code) => {
                    slots.push(code.to_le_bytes());
                    (-3, slots)
                }
                None => (-2, slots),
            }
        }
        MissingValues::Strings(codes) => {
            let codes: Vec<[u8; 8]> = codes.iter().take(3).map(|c| pad8(c.as_bytes())).collect();
            (codes.len() as i32, codes)
        }
    }
}

fn write_value_labels(out: &mut Out, file: &SavFile) -> Result<()> {
    let first_slots: Vec<usize> = file
        .variables
        .iter()
        .scan(0usize, |next, variable| {
            let slot = *next;
            *next += variable.var_type.slots();
            Some(slot)
        })
        .collect();

    for set in &file.value_labels {
        out.i32(record::VALUE_LABEL);
        out.i32(to_i32(set.labels.len())?);
        for (code, label) in &set.labels {
            let value = match code {
                LabelValue::Num(value) => value.to_le_bytes(),
                LabelValue::Str(value) => pad8(value.as_bytes()),
            };
            out.bytes.extend_from_slice(&value);
            let label = &label.as_bytes()[..label.len().min(255)];
            out.bytes.push(label.len() as u8);
            out.padded(label, (label.len() + 1).div_ceil(8) * 8 - 1);
        }

        out.i32(record::VALUE_LABEL_VARIABLES);
        out.i32(to_i32(set.variables.len())?);
        for &index in &set.variables {
            out.i32(to_i32(first_slots[index] + 1)?);
        }
    }
    Ok(())
}

fn write_extensions(
    out: &mut Out,
    file: &SavFile,
    short_names: &[String],
) -> Result<()> {
    let mut integer_info = Vec::with_capacity(32);
    for value in [1, 0, 0, -1, 1, 1, 2, 65001] {
        integer_info.extend_from_slice(&i32::to_le_bytes(value));
    }
    out.extension(subtype::INTEGER_INFO, 4, &integer_info)?;

    let mut float_info = Vec::with_capacity(24);
    for value in [SYSMIS, f64::MAX, f64::from_bits(0xffef_ffff_ffff_fffe)] {
        float_info.extend_from_slice(&value.to_le_bytes());
    }
    out.extension(subtype::FLOAT_INFO, 8, &float_info)?;

    let long_names = file
        .variables
        .iter()
        .zip(short_names)
        .map(|(variable, short)| format!("{short}={}", variable.name))
        .collect::<Vec<_>>()
        .join("\t");
    if !long_names.is_empty() {
        out.extension(subtype::LONG_NAMES, 1, long_names.as_bytes())?;
    }
    out.extension(subtype::ENCODING, 1, b"UTF-8")
}

fn case_slots(file: &SavFile, row: &[SavValue]) -> Vec<[u8; 8]> {
    let mut slots = Vec::new();
    for (value, variable) in row.iter().zip(&file.variables) {
        match value {
            SavValue::Num(value) => slots.push(value.unwrap_or(SYSMIS).to_le_bytes()),
            SavValue::Str(text) => {
                let mut bytes = text.as_bytes().to_vec();
                bytes.resize(variable.var_type.slots() * 8, b' ');
                slots.extend(bytes.chunks_exact(8).map(pad8));
            }
        }
    }
    slots
}

/// Bytecode-compress all cases into one stream.
fn bytecode(file: &SavFile, bias: f64) -> Vec<u8> {
    let mut stream = Vec::new();
    let mut commands: Vec<u8> = Vec::with_capacity(8);
    let mut pending: Vec<[u8; 8]> = Vec::new();

    let numeric: Vec<bool> = file
        .variables
        .iter()
        .flat_map(|v| std::iter::repeat_n(v.var_type.is_numeric(), v.var_type.slots()))
        .collect();
    for row in &file.rows {
        for (slot, &is_numeric) in case_slots(file, row).into_iter().zip(&numeric) {
            let code = if is_numeric {
                let value = f64::from_le_bytes(slot);
                let shifted = value + bias;
                if value == SYSMIS {
                    255
                } else if value.fract() == 0.0 && (1.0..=251.0).contains(&shifted) {
                    shifted as u8
                } else {
                    pending.push(slot);
                    253
                }
            } else if slot == [b' '; 8] {
                254
            } else {
                pending.push(slot);
                253
            };
            commands.push(code);
            if commands.len() == 8 {
                flush_block(&mut stream, &mut commands, &mut pending);
            }
        }
    }
    if !commands.is_empty() {
        flush_block(&mut stream, &mut commands, &mut pending);
    }
    stream
}

fn flush_block(stream: &mut Vec<u8>, commands: &mut Vec<u8>, pending: &mut Vec<[u8; 8]>) {
    commands.resize(8, 0);
    stream.extend_from_slice(commands);
    for slot in pending.drain(..) {
        stream.extend_from_slice(&slot);
    }
    commands.clear();
}

fn write_zlib(out: &mut Out, stream: &[u8]) -> Result<()> {
    let zheader_offset = out.bytes.len();
    out.bytes.extend_from_slice(&[0; 24]);

    let mut entries = Vec::new();
    let mut uncompressed_offset = zheader_offset;
    for block in stream.chunks(ZLIB_BLOCK_SIZE) {
        let compressed_offset = out.bytes.len();
        let mut encoder = ZlibEncoder::new(Vec::new(), ZlibLevel::default());
        encoder.write_all(block)?;
        let compressed = encoder.finish()?;
        out.bytes.extend_from_slice(&compressed);
        entries.push((
            uncompressed_offset,
            compressed_offset,
            block.len(),
            compressed.len(),
        ));
        uncompressed_offset += block.len();
    }

    let trailer_offset = out.bytes.len();
    out.i64(-100);
    out.i64(0);
    out.i32(to_i32(ZLIB_BLOCK_SIZE)?);
    out.i32(to_i32(entries.len())?);
    for (uncompressed, compressed, uncompressed_len, compressed_len) in entries {
        out.i64(to_i64(uncompressed)?);
        out.i64(to_i64(compressed)?);
        out.i32(to_i32(uncompressed_len)?);
        out.i32(to_i32(compressed_len)?);
    }
    let trailer_len = out.bytes.len() - trailer_offset;

    let mut zheader = Vec::with_capacity(24);
    zheader.extend_from_slice(&to_i64(zheader_offset)?.to_le_bytes());
    zheader.extend_from_slice(&to_i64(trailer_offset)?.to_le_bytes());
    zheader.extend_from_slice(&to_i64(trailer_len)?.to_le_bytes());
    out.bytes[zheader_offset..zheader_offset + 24].copy_from_slice(&zheader);
    Ok(())
}

fn pad8(bytes: &[u8]) -> [u8; 8] {
    let mut slot = [b' '; 8];
    let len = bytes.len().min(8);
    slot[..len].copy_from_slice(&bytes[..len]);
    slot
}

fn to_i32(value: usize) -> Result<i32> {
    i32::try_from(value)
        .map_err(|_| SavError::invalid_dataset(format!("{value} does not fit a 32-bit field")))
}

fn to_i64(value: usize) -> Result<i64> {
    i64::try_from(value)
        .map_err(|_| SavError::invalid_dataset(format!("{value} does not fit a 64-bit field")))
}

#[derive(Default)]
struct Out {
    bytes: Vec<u8>,
}

impl Out {
    fn i32(&mut self, value: i32) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    fn i64(&mut self, value: i64) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    fn f64(&mut self, value: f64) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    /// Write `bytes` truncated or space padded to `len`.
    fn padded(&mut self, bytes: &[u8], len: usize) {
        let take = bytes.len().min(len);
        self.bytes.extend_from_slice(&bytes[..take]);
        self.bytes.resize(self.bytes.len() + (len - take), b' ');
    }

    fn extension(&mut self, kind: i32, size: usize, payload: &[u8]) -> Result<()> {
        self.i32(record::EXTENSION);
        self.i32(kind);
        self.i32(to_i32(size)?);
        self.i32(to_i32(payload.len() / size)?);
        self.bytes.extend_from_slice(payload);
        Ok(())
    }
}
