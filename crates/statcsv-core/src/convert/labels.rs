//! Flattening label dictionaries into auxiliary tables.

use polars::prelude::*;
use statcsv_sav::LabelValue;

pub const FIELD: &str = "Field";
pub const CODE: &str = "Code";
pub const MEANING: &str = "Meaning";

/// `(Field, Code, Meaning)` rows from SPSS value labels, variable order then
/// label order.
///
/// `Code` is numeric when every code is; string-valued sets make it text.
pub(crate) fn sav_values_frame(labels: &[(&str, &[(LabelValue, String)])]) -> PolarsResult<DataFrame> {
    let pairs = || labels.iter().flat_map(|(field, set)| set.iter().map(move |pair| (*field, pair)));
    let numeric: Option<Vec<f64>> = pairs()
        .map(|(_, (code, _))| match code {
            LabelValue::Num(value) => Some(*value),
            LabelValue::Str(_) => None,
        })
        .collect();
    let codes = match numeric {
        Some(values) => Column::new(CODE.into(), values),
        None => Column::new(
            CODE.into(),
            pairs()
                .map(|(_, (code, _))| match code {
                    LabelValue::Num(value) => value.to_string(),
                    LabelValue::Str(text) => text.clone(),
                })
                .collect::<Vec<_>>(),
        ),
    };
    let fields: Vec<&str> = pairs().map(|(field, _)| field).collect();
    let meanings: Vec<&str> = pairs().map(|(_, (_, label))| label.as_str()).collect();
    DataFrame::new(vec![
        Column::new(FIELD.into(), fields),
        codes,
        Column::new(MEANING.into(), meanings),
    ])
}

/// `(Field, Code, Meaning)` rows from Stata value labels, one block per
/// label set.
pub(crate) fn dta_values_frame(labels: &[(&str, &[(i32, String)])]) -> PolarsResult<DataFrame> {
    let mut fields = Vec::new();
    let mut codes = Vec::new();
    let mut meanings = Vec::new();
    for (field, set) in labels {
        for (code, label) in *set {
            fields.push(*field);
            codes.push(*code);
            meanings.push(label.as_str());
        }
    }
    DataFrame::new(vec![
        Column::new(FIELD.into(), fields),
        Column::new(CODE.into(), codes),
        Column::new(MEANING.into(), meanings),
    ])
}

/// `(Field, Meaning)` rows, one per labelled variable.
pub(crate) fn description_frame(labels: &[(&str, &str)]) -> PolarsResult<DataFrame> {
    let (fields, meanings): (Vec<&str>, Vec<&str>) = labels.iter().copied().unzip();
    DataFrame::new(vec![
        Column::new(FIELD.into(), fields),
        Column::new(MEANING.into(), meanings),
    ])
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_numeric_codes_stay_numeric() {
        let sex = vec![
            (LabelValue::Num(1.0), "Male".to_string()),
            (LabelValue::Num(2.0), "Female".to_string()),
        ];
        let frame = sav_values_frame(&[("sex", sex.as_slice())]).unwrap();
        assert_eq!(frame.shape(), (2, 3));
        assert_eq!(frame.column(CODE).unwrap().dtype(), &DataType::Float64);
        assert_eq!(
            frame.column(MEANING).unwrap().str().unwrap().get(1),
            Some("Female")
        );
    }

    #[test]
    fn test_mixed_codes_become_text() {
        let sex = vec![(LabelValue::Num(1.0), "Male".to_string())];
        let city = vec![(LabelValue::Str("AMS".to_string()), "Amsterdam".to_string())];
        let frame = sav_values_frame(&[("sex", sex.as_slice()), ("city", city.as_slice())]).unwrap();
        let codes = frame.column(CODE).unwrap().str().unwrap();
        assert_eq!(codes.get(0), Some("1"));
        assert_eq!(codes.get(1), Some("AMS"));
        let fields = frame.column(FIELD).unwrap().str().unwrap();
        assert_eq!(fields.get(1), Some("city"));
    }

    #[test]
    fn test_empty_dictionaries_keep_headers() {
        let frame = dta_values_frame(&[]).unwrap();
        assert_eq!(frame.shape(), (0, 3));
        let names: Vec<&str> = frame
            .get_column_names()
            .into_iter()
            .map(PlSmallStr::as_str)
            .collect();
        assert_eq!(names, vec![FIELD, CODE, MEANING]);
        let frame = description_frame(&[]).unwrap();
        assert_eq!(frame.shape(), (0, 2));
    }

    proptest! {
        #[test]
        fn prop_value_rows_match_pair_count(sets in prop::collection::vec(
            prop::collection::vec((any::<i32>(), "[a-z ,]{0,8}"), 0..6),
            0..6,
        )) {
            let names: Vec<String> = (0..sets.len()).map(|i| format!("v{i}")).collect();
            let labels: Vec<(&str, &[(i32, String)])> = names
                .iter()
                .zip(&sets)
                .map(|(name, set)| (name.as_str(), set.as_slice()))
                .collect();
            let frame = dta_values_frame(&labels).unwrap();
            let expected: usize = sets.iter().map(Vec::len).sum();
            prop_assert_eq!(frame.height(), expected);
        }
    }
}
