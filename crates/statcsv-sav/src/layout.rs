//! Folding raw dictionary records into variables and a case layout.
//!
//! Each variable record occupies one 8-byte slot of a case; strings wider
//! than 8 bytes are followed by continuation records (type -1), one per
//! extra slot. Strings wider than 255 bytes are split into segments of 255
//! bytes each (252 used), announced by the very long string record.

use std::collections::HashMap;

use encoding_rs::Encoding;

use crate::cursor::Endian;
use crate::encoding::decode_text;
use crate::error::{Result, SavError};
use crate::header::{Dictionary, RawLabelSet, RawVariable};
use crate::types::{LabelValue, MissingValues, PrintFormat, SavType, SavVariable, ValueLabelSet};

/// Bytes of content carried by a non-final very long string segment.
const SEGMENT_USED: usize = 252;

/// Slot range one piece of a variable occupies in a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Segment {
    /// 0-based index of the first slot.
    pub slot: usize,
    pub slots: usize,
    /// Content bytes taken from the slots.
    pub used: usize,
}

/// Slot layout of one case.
#[derive(Debug, Default)]
pub(crate) struct CaseLayout {
    pub variables: Vec<Vec<Segment>>,
    pub slot_count: usize,
}

/// A non-continuation variable record together with its slot span.
struct SegmentRecord<'r, 'a> {
    raw: &'r RawVariable<'a>,
    short_name: String,
    segment: Segment,
}

/// Build caller-facing variables and the case layout.
pub(crate) fn assemble_variables(
    dictionary: &Dictionary<'_>,
    encoding: &'static Encoding,
    endian: Endian,
) -> Result<(Vec<SavVariable>, CaseLayout)> {
    let records = segment_records(&dictionary.variables, encoding)?;
    let long_names = parse_pairs(dictionary.long_names, encoding);
    let very_long: HashMap<String, usize> = parse_pairs(dictionary.very_long_strings, encoding)
        .into_iter()
        .filter_map(|(name, width)| width.trim().parse().ok().map(|width| (name, width)))
        .collect();

    let mut variables = Vec::with_capacity(records.len());
    let mut layout = CaseLayout {
        variables: Vec::with_capacity(records.len()),
        slot_count: dictionary.variables.len(),
    };

    let mut iter = records.into_iter();
    while let Some(record) = iter.next() {
        let mut segments = vec![record.segment];
        let var_type = match (record.raw.type_code, very_long.get(&record.short_name)) {
            (0, _) => SavType::Numeric,
            (_, Some(&width)) if width > 255 => {
                let count = width.div_ceil(SEGMENT_USED);
                segments[0].used = SEGMENT_USED;
                for index in 1..count {
                    let next = iter.next().ok_or_else(|| {
                        SavError::invalid_record(
                            "very long string",
                            record.raw.offset,
                            format!("{} is missing segment {index}", record.short_name),
                        )
                    })?;
                    let used = if index + 1 == count {
                        width - index * SEGMENT_USED
                    } else {
                        SEGMENT_USED
                    };
                    segments.push(Segment {
                        used,
                        ..next.segment
                    });
                }
                SavType::String { width }
            }
            (width, _) => SavType::String {
                width: width.unsigned_abs() as usize,
            },
        };

        let name = long_names
            .iter()
            .find(|(short, _)| short.eq_ignore_ascii_case(&record.short_name))
            .map_or_else(|| record.short_name.clone(), |(_, long)| long.clone());

        variables.push(SavVariable {
            name,
            short_name: record.short_name.clone(),
            label: record
                .raw
                .label
                .map(|bytes| decode_text(encoding, bytes))
                .filter(|label| !label.is_empty()),
            var_type,
            print_format: PrintFormat::from_raw(record.raw.print_format),
            missing: missing_values(record.raw, var_type, encoding, endian),
        });
        layout.variables.push(segments);
    }

    Ok((variables, layout))
}

/// Resolve value label records against the assembled variables.
pub(crate) fn assemble_value_labels(
    label_sets: &[RawLabelSet<'_>],
    variables: &[SavVariable],
    layout: &CaseLayout,
    encoding: &'static Encoding,
    endian: Endian,
) -> Result<Vec<ValueLabelSet>> {
    let by_first_slot: HashMap<usize, usize> = layout
        .variables
        .iter()
        .enumerate()
        .map(|(index, segments)| (segments[0].slot, index))
        .collect();

    label_sets
        .iter()
        .map(|raw| {
            let indices = raw
                .slots
                .iter()
                .map(|&slot| {
                    usize::try_from(slot - 1)
                        .ok()
                        .and_then(|slot| by_first_slot.get(&slot).copied())
                        .ok_or_else(|| {
                            SavError::invalid_record(
                                "variable index",
                                raw.offset,
                                format!("slot {slot} does not start a variable"),
                            )
                        })
                })
                .collect::<Result<Vec<usize>>>()?;

            let numeric = indices
                .first()
                .is_none_or(|&index| variables[index].var_type.is_numeric());
            let labels = raw
                .labels
                .iter()
                .map(|(value, text)| {
                    let code = if numeric {
                        LabelValue::Num(endian.read_f64(*value))
                    } else {
                        LabelValue::Str(decode_text(encoding, value))
                    };
                    (code, decode_text(encoding, text))
                })
                .collect();
            Ok(ValueLabelSet {
                labels,
                variables: indices,
            })
        })
        .collect()
}

fn segment_records<'r, 'a>(
    raw: &'r [RawVariable<'a>],
    encoding: &'static Encoding,
) -> Result<Vec<SegmentRecord<'r, 'a>>> {
    let mut records: Vec<SegmentRecord<'r, 'a>> = Vec::new();
    for (slot, variable) in raw.iter().enumerate() {
        if variable.is_continuation() {
            let last = records.last_mut().ok_or_else(|| {
                SavError::invalid_record(
                    "variable",
                    variable.offset,
                    "continuation record without a preceding string",
                )
            })?;
            last.segment.slots += 1;
            continue;
        }
        let width = if variable.type_code == 0 {
            8
        } else {
            variable.type_code.unsigned_abs() as usize
        };
        records.push(SegmentRecord {
            raw: variable,
            short_name: decode_text(encoding, variable.name),
            segment: Segment {
                slot,
                slots: 1,
                used: width,
            },
        });
    }
    Ok(records)
}

fn missing_values(
    raw: &RawVariable<'_>,
    var_type: SavType,
    encoding: &'static Encoding,
    endian: Endian,
) -> MissingValues {
    if raw.missing.is_empty() {
        return MissingValues::None;
    }
    if !var_type.is_numeric() {
        return MissingValues::Strings(
            raw.missing
                .iter()
                .map(|value| decode_text(encoding, value))
                .collect(),
        );
    }
    let values: Vec<f64> = raw
        .missing
        .iter()
        .map(|value| endian.read_f64(*value))
        .collect();
    match raw.missing_code {
        -2 | -3 => MissingValues::Range {
            low: values[0],
            high: values[1],
            discrete: values.get(2).copied(),
        },
        _ => MissingValues::Discrete(values),
    }
}

/// Parse `KEY=value` pairs separated by tabs (NUL padded).
fn parse_pairs(payload: Option<&[u8]>, encoding: &'static Encoding) -> Vec<(String, String)> {
    let Some(payload) = payload else {
        return Vec::new();
    };
    let (text, _) = encoding.decode_without_bom_handling(payload);
    text.split('\t')
        .filter_map(|pair| {
            let pair = pair.trim_matches(['\0', ' ']);
            pair.split_once('=')
                .map(|(key, value)| (key.to_string(), value.trim_end_matches('\0').to_string()))
        })
        .collect()
}
