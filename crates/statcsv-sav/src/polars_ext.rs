//! Polars DataFrame integration.
//!
//! Numeric variables become `Float64` columns, except those with a date or
//! datetime display format, which are converted from SPSS seconds since
//! 1582-10-14 to `Date` / `Datetime[ms]`. String variables become `String`.

use polars::prelude::*;

use crate::types::{SavFile, SavType, Temporal};

/// Days between the SPSS epoch (1582-10-14) and the Unix epoch.
const SPSS_EPOCH_OFFSET_DAYS: i64 = 141_428;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Convert a decoded system file into a DataFrame.
pub fn sav_to_dataframe(file: &SavFile) -> PolarsResult<DataFrame> {
    let columns = file
        .variables
        .iter()
        .enumerate()
        .map(|(index, variable)| {
            let name = variable.name.as_str();
            match variable.var_type {
                SavType::String { .. } => {
                    let values: Vec<Option<&str>> = file
                        .rows
                        .iter()
                        .map(|row| row[index].as_str())
                        .collect();
                    Ok(Column::new(name.into(), values))
                }
                SavType::Numeric => {
                    let values = file.rows.iter().map(|row| row[index].as_f64());
                    match variable.temporal() {
                        None => Ok(Column::new(name.into(), values.collect::<Vec<_>>())),
                        Some(Temporal::Date) => {
                            let days: Vec<Option<i32>> =
                                values.map(|v| v.and_then(spss_days)).collect();
                            Column::new(name.into(), days).cast(&DataType::Date)
                        }
                        Some(Temporal::DateTime) => {
                            let millis: Vec<Option<i64>> =
                                values.map(|v| v.map(spss_millis)).collect();
                            Column::new(name.into(), millis)
                                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
                        }
                    }
                }
            }
        })
        .collect::<PolarsResult<Vec<Column>>>()?;
    DataFrame::new(columns)
}

fn spss_days(seconds: f64) -> Option<i32> {
    let days = (seconds / SECONDS_PER_DAY).floor() as i64 - SPSS_EPOCH_OFFSET_DAYS;
    i32::try_from(days).ok()
}

fn spss_millis(seconds: f64) -> i64 {
    let unix = seconds - SPSS_EPOCH_OFFSET_DAYS as f64 * SECONDS_PER_DAY;
    (unix * 1000.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PrintFormat, SavValue, SavVariable};

    #[test]
    fn test_dates_convert_from_spss_epoch() {
        let mut file = SavFile::with_variables(vec![
            SavVariable::numeric("visit").with_format(PrintFormat::date()),
            SavVariable::numeric("stamp").with_format(PrintFormat::datetime()),
            SavVariable::string("site", 4),
        ]);
        let unix_epoch = SPSS_EPOCH_OFFSET_DAYS as f64 * SECONDS_PER_DAY;
        file.add_row(vec![
            SavValue::numeric(unix_epoch + SECONDS_PER_DAY),
            SavValue::numeric(unix_epoch + 1.5),
            SavValue::string("AMS"),
        ]);
        file.add_row(vec![
            SavValue::missing(),
            SavValue::missing(),
            SavValue::string(""),
        ]);

        let df = sav_to_dataframe(&file).unwrap();
        assert_eq!(df.column("visit").unwrap().dtype(), &DataType::Date);
        let days = df.column("visit").unwrap().cast(&DataType::Int32).unwrap();
        assert_eq!(days.i32().unwrap().get(0), Some(1));
        assert_eq!(days.i32().unwrap().get(1), None);
        let millis = df.column("stamp").unwrap().cast(&DataType::Int64).unwrap();
        assert_eq!(millis.i64().unwrap().get(0), Some(1500));
        assert_eq!(df.column("site").unwrap().str().unwrap().get(0), Some("AMS"));
    }
}
