//! Case data decoding.
//!
//! Cases are sequences of 8-byte slots. Depending on the header they are
//! stored raw, bytecode compressed, or as zlib blocks of bytecode.
//!
//! # Bytecode
//!
//! Slots are grouped under 8-byte command blocks:
//!
//! | Code    | Meaning                                         |
//! |---------|-------------------------------------------------|
//! | 0       | padding, ignored                                |
//! | 1-251   | numeric value `code - bias`                     |
//! | 252     | end of data                                     |
//! | 253     | raw slot follows the command block              |
//! | 254     | eight spaces                                    |
//! | 255     | system-missing                                  |

use std::io::Read;

use encoding_rs::Encoding;
use flate2::read::ZlibDecoder;

use crate::cursor::{ByteCursor, Endian};
use crate::encoding::decode_text;
use crate::error::{Result, SavError};
use crate::header::SYSMIS;
use crate::layout::CaseLayout;
use crate::types::{Compression, SavType, SavValue, SavVariable};

/// Inputs needed to decode the case section.
pub(crate) struct CaseSource<'a> {
    pub data: &'a [u8],
    pub offset: usize,
    pub endian: Endian,
    pub compression: Compression,
    pub bias: f64,
    pub case_count: Option<usize>,
}

/// Decode every case in the file.
pub(crate) fn decode_cases(
    source: &CaseSource<'_>,
    layout: &CaseLayout,
    variables: &[SavVariable],
    encoding: &'static Encoding,
) -> Result<Vec<Vec<SavValue>>> {
    if layout.slot_count == 0 {
        return Ok(Vec::new());
    }

    let inflated: Vec<u8>;
    let mut slots = match source.compression {
        Compression::None => SlotReader::Raw(ByteCursor::at(
            source.data,
            source.offset,
            source.endian,
        )),
        Compression::Bytecode => SlotReader::Bytecode(Bytecode::new(
            ByteCursor::at(source.data, source.offset, source.endian),
            source.bias,
            source.endian,
        )),
        Compression::Zlib => {
            inflated = inflate_blocks(source.data, source.offset, source.endian)?;
            SlotReader::Bytecode(Bytecode::new(
                ByteCursor::at(&inflated, 0, source.endian),
                source.bias,
                source.endian,
            ))
        }
    };

    let mut rows = Vec::with_capacity(source.case_count.unwrap_or_default().min(1 << 20));
    let mut case = Vec::with_capacity(layout.slot_count);
    loop {
        if let Some(limit) = source.case_count
            && rows.len() >= limit
        {
            break;
        }
        case.clear();
        while case.len() < layout.slot_count {
            match slots.next_slot()? {
                Some(slot) => case.push(slot),
                None => break,
            }
        }
        if case.is_empty() {
            break;
        }
        if case.len() < layout.slot_count {
            return Err(SavError::Truncated {
                offset: slots.position(),
                needed: (layout.slot_count - case.len()) * 8,
                available: 0,
            });
        }
        rows.push(decode_case(&case, layout, variables, source.endian, encoding));
    }

    if let Some(expected) = source.case_count
        && rows.len() < expected
    {
        return Err(SavError::Truncated {
            offset: slots.position(),
            needed: (expected - rows.len()) * layout.slot_count * 8,
            available: 0,
        });
    }
    Ok(rows)
}

fn decode_case(
    slots: &[[u8; 8]],
    layout: &CaseLayout,
    variables: &[SavVariable],
    endian: Endian,
    encoding: &'static Encoding,
) -> Vec<SavValue> {
    layout
        .variables
        .iter()
        .zip(variables)
        .map(|(segments, variable)| match variable.var_type {
            SavType::Numeric => {
                let value = endian.read_f64(slots[segments[0].slot]);
                if is_sysmis(value) || variable.missing.contains(value) {
                    SavValue::Num(None)
                } else {
                    SavValue::Num(Some(value))
                }
            }
            SavType::String { .. } => {
                let mut bytes = Vec::new();
                for segment in segments {
                    let start = bytes.len();
                    for slot in &slots[segment.slot..segment.slot + segment.slots] {
                        bytes.extend_from_slice(slot);
                    }
                    bytes.truncate(start + segment.used);
                }
                SavValue::Str(decode_text(encoding, &bytes))
            }
        })
        .collect()
}

fn is_sysmis(value: f64) -> bool {
    value == SYSMIS
}

enum SlotReader<'a> {
    Raw(ByteCursor<'a>),
    Bytecode(Bytecode<'a>),
}

impl SlotReader<'_> {
    fn next_slot(&mut self) -> Result<Option<[u8; 8]>> {
        match self {
            Self::Raw(cursor) => {
                if cursor.is_at_end() {
                    Ok(None)
                } else {
                    cursor.array::<8>().map(Some)
                }
            }
            Self::Bytecode(bytecode) => bytecode.next_slot(),
        }
    }

    fn position(&self) -> usize {
        match self {
            Self::Raw(cursor) => cursor.position(),
            Self::Bytecode(bytecode) => bytecode.cursor.position(),
        }
    }
}

struct Bytecode<'a> {
    cursor: ByteCursor<'a>,
    commands: [u8; 8],
    next: usize,
    bias: f64,
    endian: Endian,
    finished: bool,
}

impl<'a> Bytecode<'a> {
    fn new(cursor: ByteCursor<'a>, bias: f64, endian: Endian) -> Self {
        Self {
            cursor,
            commands: [0; 8],
            next: 8,
            bias,
            endian,
            finished: false,
        }
    }

    fn next_slot(&mut self) -> Result<Option<[u8; 8]>> {
        loop {
            if self.finished {
                return Ok(None);
            }
            if self.next == self.commands.len() {
                if self.cursor.is_at_end() {
                    self.finished = true;
                    return Ok(None);
                }
                self.commands = self.cursor.array::<8>()?;
                self.next = 0;
            }
            let code = self.commands[self.next];
            self.next += 1;
            match code {
                0 => {}
                252 => self.finished = true,
                253 => return self.cursor.array::<8>().map(Some),
                254 => return Ok(Some([b' '; 8])),
                255 => return Ok(Some(self.endian.write_f64(SYSMIS))),
                code => {
                    return Ok(Some(
                        self.endian.write_f64(f64::from(code) - self.bias),
                    ));
                }
            }
        }
    }
}

/// Inflate the zlib blocks of a `.zsav` file into one bytecode stream.
///
/// The data section starts with a 24-byte zheader pointing at a trailer
/// that indexes every compressed block.
fn inflate_blocks(data: &[u8], offset: usize, endian: Endian) -> Result<Vec<u8>> {
    let mut zheader = ByteCursor::at(data, offset, endian);
    let _zheader_offset = zheader.i64()?;
    let trailer_offset = file_offset(zheader.i64()?, offset)?;
    let _trailer_len = zheader.i64()?;

    let mut trailer = ByteCursor::at(data, trailer_offset, endian);
    let _bias = trailer.i64()?;
    let _zero = trailer.i64()?;
    let _block_size = trailer.i32()?;
    let block_count = trailer.count("zlib trailer")?;

    let mut out = Vec::new();
    for index in 0..block_count {
        let _uncompressed_offset = trailer.i64()?;
        let compressed_offset = file_offset(trailer.i64()?, trailer_offset)?;
        let uncompressed_size = trailer.count("zlib trailer")?;
        let compressed_size = trailer.count("zlib trailer")?;

        let block = ByteCursor::at(data, compressed_offset, endian).take(compressed_size)?;
        let start = out.len();
        ZlibDecoder::new(block)
            .read_to_end(&mut out)
            .map_err(|source| SavError::Inflate { index, source })?;
        if out.len() - start != uncompressed_size {
            return Err(SavError::invalid_record(
                "zlib block",
                compressed_offset,
                format!(
                    "inflated to {} bytes, trailer declares {uncompressed_size}",
                    out.len() - start
                ),
            ));
        }
    }
    Ok(out)
}

fn file_offset(value: i64, at: usize) -> Result<usize> {
    usize::try_from(value)
        .map_err(|_| SavError::invalid_record("zlib header", at, format!("negative offset {value}")))
}
