//! Polars DataFrame integration.
//!
//! Storage types map to `Int8`, `Int16`, `Int32`, `Float32`, `Float64` and
//! `String`. Variables with `%td` formats become `Date`, `%tc` formats
//! become `Datetime[ms]` (both counted from 1960-01-01 in Stata).
//!
//! [`dta_to_labelled_dataframe`] additionally replaces the codes of
//! value-labelled numeric variables with their labels.

use std::collections::HashMap;

use polars::prelude::*;

use crate::types::{DtaDataset, DtaType, DtaValue, DtaValueLabels, Temporal};

/// Days between 1960-01-01 and 1970-01-01.
const STATA_EPOCH_OFFSET_DAYS: i64 = 3_653;
const MILLIS_PER_DAY: i64 = 86_400_000;

/// Convert a decoded dataset into a DataFrame.
pub fn dta_to_dataframe(dataset: &DtaDataset) -> PolarsResult<DataFrame> {
    let columns = dataset
        .variables
        .iter()
        .enumerate()
        .map(|(index, variable)| {
            let name = variable.name.as_str().into();
            let cells = dataset.rows.iter().map(|row| &row[index]);
            if let Some(temporal) = variable.temporal() {
                return temporal_column(name, cells.map(DtaValue::as_f64), temporal);
            }
            Ok(match variable.var_type {
                DtaType::Byte => Column::new(
                    name,
                    cells
                        .map(|cell| match cell {
                            DtaValue::Byte(v) => *v,
                            _ => None,
                        })
                        .collect::<Vec<_>>(),
                ),
                DtaType::Int => Column::new(
                    name,
                    cells
                        .map(|cell| match cell {
                            DtaValue::Int(v) => *v,
                            _ => None,
                        })
                        .collect::<Vec<_>>(),
                ),
                DtaType::Long => Column::new(
                    name,
                    cells
                        .map(|cell| match cell {
                            DtaValue::Long(v) => *v,
                            _ => None,
                        })
                        .collect::<Vec<_>>(),
                ),
                DtaType::Float => Column::new(
                    name,
                    cells
                        .map(|cell| match cell {
                            DtaValue::Float(v) => *v,
                            _ => None,
                        })
                        .collect::<Vec<_>>(),
                ),
                DtaType::Double => Column::new(
                    name,
                    cells.map(DtaValue::as_f64).collect::<Vec<_>>(),
                ),
                DtaType::Str(_) | DtaType::StrL => Column::new(
                    name,
                    cells.map(DtaValue::as_str).collect::<Vec<_>>(),
                ),
            })
        })
        .collect::<PolarsResult<Vec<Column>>>()?;
    DataFrame::new(columns)
}

/// Convert a dataset, writing value labels in place of coded values.
///
/// Only numeric, non-date variables with an assigned label set that the file
/// defines are converted; they become `String` columns. A code with no label
/// is written as the number itself and missing values stay null.
pub fn dta_to_labelled_dataframe(
    dataset: &DtaDataset,
    labels: &DtaValueLabels,
) -> PolarsResult<DataFrame> {
    let mut df = dta_to_dataframe(dataset)?;
    for (index, variable) in dataset.variables.iter().enumerate() {
        if !variable.var_type.is_numeric() || variable.temporal().is_some() {
            continue;
        }
        let Some(table) = variable
            .value_labels
            .as_deref()
            .and_then(|set| labels.table(set))
        else {
            continue;
        };
        let meanings: HashMap<i32, &str> = table
            .entries
            .iter()
            .map(|(code, label)| (*code, label.as_str()))
            .collect();
        let cells: Vec<Option<String>> = dataset
            .rows
            .iter()
            .map(|row| labelled_cell(&row[index], &meanings))
            .collect();
        df.replace(&variable.name, Series::new(variable.name.as_str().into(), cells))?;
    }
    Ok(df)
}

fn labelled_cell(cell: &DtaValue, meanings: &HashMap<i32, &str>) -> Option<String> {
    let value = cell.as_f64()?;
    let code = (value.fract() == 0.0)
        .then(|| i32::try_from(value as i64).ok())
        .flatten();
    if let Some(label) = code.and_then(|code| meanings.get(&code)) {
        return Some((*label).to_string());
    }
    Some(match cell {
        DtaValue::Byte(Some(v)) => v.to_string(),
        DtaValue::Int(Some(v)) => v.to_string(),
        DtaValue::Long(Some(v)) => v.to_string(),
        _ => value.to_string(),
    })
}

fn temporal_column(
    name: PlSmallStr,
    values: impl Iterator<Item = Option<f64>>,
    temporal: Temporal,
) -> PolarsResult<Column> {
    match temporal {
        Temporal::Date => {
            let days: Vec<Option<i32>> = values
                .map(|v| v.and_then(|v| i32::try_from(v.floor() as i64 - STATA_EPOCH_OFFSET_DAYS).ok()))
                .collect();
            Column::new(name, days).cast(&DataType::Date)
        }
        Temporal::DateTime => {
            let millis: Vec<Option<i64>> = values
                .map(|v| v.map(|v| v.round() as i64 - STATA_EPOCH_OFFSET_DAYS * MILLIS_PER_DAY))
                .collect();
            Column::new(name, millis).cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DtaVariable, ValueLabelTable};

    #[test]
    fn test_native_types_and_dates() {
        let mut dataset = DtaDataset::with_variables(vec![
            DtaVariable::new("flag", DtaType::Byte),
            DtaVariable::new("visit", DtaType::Long).with_format("%td"),
            DtaVariable::new("stamp", DtaType::Double).with_format("%tc"),
            DtaVariable::new("site", DtaType::Str(3)),
        ]);
        dataset.add_row(vec![
            DtaValue::Byte(Some(1)),
            DtaValue::Long(Some(3_654)),
            DtaValue::Double(Some(315_619_200_000.0 + 1_500.0)),
            DtaValue::string("AMS"),
        ]);
        dataset.add_row(vec![
            DtaValue::Byte(None),
            DtaValue::Long(None),
            DtaValue::Double(None),
            DtaValue::string(""),
        ]);

        let df = dta_to_dataframe(&dataset).unwrap();
        assert_eq!(df.column("flag").unwrap().dtype(), &DataType::Int8);
        assert_eq!(df.column("visit").unwrap().dtype(), &DataType::Date);
        let days = df.column("visit").unwrap().cast(&DataType::Int32).unwrap();
        assert_eq!(days.i32().unwrap().get(0), Some(1));
        assert_eq!(days.i32().unwrap().get(1), None);
        let millis = df.column("stamp").unwrap().cast(&DataType::Int64).unwrap();
        assert_eq!(millis.i64().unwrap().get(0), Some(1_500));
    }

    #[test]
    fn test_labelled_columns_carry_meanings() {
        let mut dataset = DtaDataset::with_variables(vec![
            DtaVariable::new("id", DtaType::Long),
            DtaVariable::new("owner", DtaType::Byte).with_value_labels("yesno"),
            DtaVariable::new("score", DtaType::Double).with_value_labels("yesno"),
            DtaVariable::new("region", DtaType::Int).with_value_labels("undefined"),
        ]);
        dataset.add_row(vec![
            DtaValue::Long(Some(1)),
            DtaValue::Byte(Some(1)),
            DtaValue::Double(Some(0.0)),
            DtaValue::Int(Some(4)),
        ]);
        dataset.add_row(vec![
            DtaValue::Long(Some(2)),
            DtaValue::Byte(Some(7)),
            DtaValue::Double(Some(1.5)),
            DtaValue::Int(None),
        ]);
        dataset.add_row(vec![
            DtaValue::Long(Some(3)),
            DtaValue::Byte(None),
            DtaValue::Double(None),
            DtaValue::Int(Some(5)),
        ]);
        let labels = DtaValueLabels {
            tables: vec![
                ValueLabelTable::new("yesno")
                    .with_entry(0, "No")
                    .with_entry(1, "Yes"),
            ],
            assignments: Vec::new(),
        };

        let df = dta_to_labelled_dataframe(&dataset, &labels).unwrap();
        assert_eq!(df.column("id").unwrap().dtype(), &DataType::Int32);
        assert_eq!(df.column("region").unwrap().dtype(), &DataType::Int16);

        let owner = df.column("owner").unwrap().str().unwrap();
        assert_eq!(owner.get(0), Some("Yes"));
        assert_eq!(owner.get(1), Some("7"));
        assert_eq!(owner.get(2), None);
        let score = df.column("score").unwrap().str().unwrap();
        assert_eq!(score.get(0), Some("No"));
        assert_eq!(score.get(1), Some("1.5"));
    }
}
