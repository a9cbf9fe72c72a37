//! Stata decode path.
//!
//! Observations and value labels are two separate passes over the same
//! buffer. Value-labelled columns of the primary table carry their labels;
//! the `-values` table lists each label set once, under its own name.

use std::collections::BTreeMap;

use statcsv_dta::{dta_to_labelled_dataframe, read_dta_bytes, read_dta_value_labels_bytes};
use tracing::debug;

use super::labels::dta_values_frame;
use super::{ConvertedTables, VALUES_SUFFIX, decode_failed};
use crate::error::{ConvertError, Result};

pub(crate) fn convert_stata(bytes: &[u8], location: &str) -> Result<ConvertedTables> {
    let dataset = read_dta_bytes(bytes).map_err(|err| decode_failed(location, err))?;
    let labels = read_dta_value_labels_bytes(bytes).map_err(|err| decode_failed(location, err))?;
    let frame_err = |err| ConvertError::frame(location, err);

    let primary = dta_to_labelled_dataframe(&dataset, &labels).map_err(frame_err)?;
    let values = dta_values_frame(&labels.by_label_set()).map_err(frame_err)?;
    debug!(
        release = dataset.header.release,
        rows = primary.height(),
        columns = primary.width(),
        label_sets = labels.tables.len(),
        value_labels = values.height(),
        "decoded Stata file"
    );
    Ok(ConvertedTables {
        primary,
        auxiliary: BTreeMap::from([(VALUES_SUFFIX, values)]),
    })
}

#[cfg(test)]
mod tests {
    use statcsv_dta::{
        DtaDataset, DtaType, DtaValue, DtaVariable, DtaVersion, DtaWriterOptions,
        ValueLabelTable, write_dta_to_vec,
    };

    use super::*;
    use crate::convert::{CODE, FIELD};
    use crate::error::CorruptKind;

    fn panel(version: DtaVersion) -> Vec<u8> {
        let mut dataset = DtaDataset::with_variables(vec![
            DtaVariable::new("id", DtaType::Long),
            DtaVariable::new("owner", DtaType::Byte).with_value_labels("yesno"),
            DtaVariable::new("renter", DtaType::Byte).with_value_labels("yesno"),
            DtaVariable::new("visit", DtaType::Long).with_format("%td"),
        ]);
        dataset.add_row(vec![
            DtaValue::Long(Some(1)),
            DtaValue::Byte(Some(1)),
            DtaValue::Byte(Some(0)),
            DtaValue::Long(Some(22_000)),
        ]);
        let labels = [
            ValueLabelTable::new("yesno")
                .with_entry(0, "No")
                .with_entry(1, "Yes"),
            ValueLabelTable::new("unused").with_entry(9, "Never assigned"),
        ];
        let options = DtaWriterOptions::default().with_version(version);
        write_dta_to_vec(&dataset, &labels, options).unwrap()
    }

    #[test]
    fn test_single_values_table() {
        for version in [DtaVersion::V114, DtaVersion::V118] {
            let tables = convert_stata(&panel(version), "s3a://raw/panel.dta").unwrap();
            assert_eq!(tables.primary.shape(), (1, 4));
            assert_eq!(tables.auxiliary.len(), 1);

            let values = &tables.auxiliary[VALUES_SUFFIX];
            assert_eq!(values.height(), 3);
            let fields = values.column(FIELD).unwrap().str().unwrap();
            let fields: Vec<_> = fields.into_iter().flatten().collect();
            assert_eq!(fields, vec!["yesno", "yesno", "unused"]);
            let codes = values.column(CODE).unwrap().i32().unwrap();
            assert_eq!(codes.get(1), Some(1));
            assert_eq!(codes.get(2), Some(9));
        }
    }

    #[test]
    fn test_labelled_primary_columns() {
        let tables = convert_stata(&panel(DtaVersion::V118), "s3a://raw/panel.dta").unwrap();
        let owner = tables.primary.column("owner").unwrap().str().unwrap();
        assert_eq!(owner.get(0), Some("Yes"));
        let renter = tables.primary.column("renter").unwrap().str().unwrap();
        assert_eq!(renter.get(0), Some("No"));
        assert_eq!(tables.primary.column("id").unwrap().dtype(), &polars::prelude::DataType::Int32);
    }

    #[test]
    fn test_failure_kinds() {
        let err = convert_stata(&[], "s3a://raw/empty.dta").unwrap_err();
        assert_eq!(err.corrupt_kind(), Some(CorruptKind::Truncated));

        let bytes = panel(DtaVersion::V118);
        let err = convert_stata(&bytes[..40], "s3a://raw/cut.dta").unwrap_err();
        assert_eq!(err.corrupt_kind(), Some(CorruptKind::Truncated));

        let err = convert_stata(b"$FL2@(#) SPSS DATA FILE", "s3a://raw/a.dta").unwrap_err();
        assert_eq!(
            err.corrupt_kind(),
            Some(CorruptKind::UnsupportedOrWrongFormat)
        );
        assert!(err.to_string().contains("s3a://raw/a.dta"));
    }
}
