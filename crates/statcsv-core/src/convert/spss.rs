//! SPSS decode path: primary table, value labels and column descriptions.

use std::collections::BTreeMap;

use statcsv_sav::{read_sav_bytes, sav_to_dataframe};
use tracing::debug;

use super::labels::{description_frame, sav_values_frame};
use super::{ConvertedTables, DESCRIPTION_SUFFIX, VALUES_SUFFIX, decode_failed};
use crate::error::{ConvertError, Result};

pub(crate) fn convert_spss(bytes: &[u8], location: &str) -> Result<ConvertedTables> {
    let file = read_sav_bytes(bytes).map_err(|err| decode_failed(location, err))?;
    let frame_err = |err| ConvertError::frame(location, err);

    let primary = sav_to_dataframe(&file).map_err(frame_err)?;
    let values = sav_values_frame(&file.variable_value_labels()).map_err(frame_err)?;
    let description = description_frame(&file.column_labels()).map_err(frame_err)?;
    debug!(
        rows = primary.height(),
        columns = primary.width(),
        value_labels = values.height(),
        descriptions = description.height(),
        encoding = %file.header.encoding,
        "decoded SPSS file"
    );
    Ok(ConvertedTables {
        primary,
        auxiliary: BTreeMap::from([(VALUES_SUFFIX, values), (DESCRIPTION_SUFFIX, description)]),
    })
}

#[cfg(test)]
mod tests {
    use statcsv_sav::{
        Compression, SavFile, SavValue, SavVariable, SavWriterOptions, ValueLabelSet,
        write_sav_to_vec,
    };

    use super::*;
    use crate::convert::{CODE, FIELD, MEANING};
    use crate::error::CorruptKind;

    fn survey() -> Vec<u8> {
        let mut file = SavFile::with_variables(vec![
            SavVariable::numeric("sex").with_label("Respondent sex"),
            SavVariable::numeric("age"),
            SavVariable::numeric("region").with_label("Region, as coded"),
            SavVariable::string("comment", 40),
        ]);
        file.add_value_labels(
            ValueLabelSet::new(vec![0])
                .with_numeric(1.0, "Male")
                .with_numeric(2.0, "Female"),
        );
        file.add_value_labels(
            ValueLabelSet::new(vec![2])
                .with_numeric(1.0, "North, inland")
                .with_numeric(2.0, "")
                .with_numeric(3.0, "South"),
        );
        file.add_row(vec![
            SavValue::numeric(1.0),
            SavValue::numeric(34.0),
            SavValue::numeric(3.0),
            SavValue::string("none"),
        ]);
        file.add_row(vec![
            SavValue::numeric(2.0),
            SavValue::missing(),
            SavValue::numeric(1.0),
            SavValue::string(""),
        ]);
        let options = SavWriterOptions::default().with_compression(Compression::Bytecode);
        write_sav_to_vec(&file, options).unwrap()
    }

    #[test]
    fn test_two_auxiliary_tables() {
        let tables = convert_spss(&survey(), "s3a://raw/survey.sav").unwrap();
        assert_eq!(tables.primary.shape(), (2, 4));
        assert_eq!(
            tables.auxiliary.keys().copied().collect::<Vec<_>>(),
            vec![DESCRIPTION_SUFFIX, VALUES_SUFFIX]
        );

        let values = &tables.auxiliary[VALUES_SUFFIX];
        assert_eq!(values.height(), 5);
        let fields = values.column(FIELD).unwrap().str().unwrap();
        assert_eq!(fields.get(0), Some("sex"));
        assert_eq!(fields.get(2), Some("region"));
        let codes = values.column(CODE).unwrap().f64().unwrap();
        assert_eq!(codes.get(4), Some(3.0));

        let description = &tables.auxiliary[DESCRIPTION_SUFFIX];
        assert_eq!(description.height(), 2);
        let meanings = description.column(MEANING).unwrap().str().unwrap();
        assert_eq!(meanings.get(1), Some("Region, as coded"));
    }

    #[test]
    fn test_empty_file_is_truncated() {
        let err = convert_spss(&[], "s3a://raw/empty.sav").unwrap_err();
        assert_eq!(err.corrupt_kind(), Some(CorruptKind::Truncated));
    }
}
