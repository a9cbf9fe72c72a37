//! Writing converted tables to job-scoped keys.

use polars::prelude::*;
use statcsv_store::ObjectStore;
use tracing::{debug, error, info};

use crate::convert::{ConvertedTables, PRIMARY_SUFFIX};
use crate::error::{ConvertError, Result, Stage};

/// `{project}/jobs/{run}/converted_files/{stem}{suffix}.csv`
#[must_use]
pub fn output_key(project_code: &str, run_id: &str, stem: &str, suffix: &str) -> String {
    format!("{project_code}/jobs/{run_id}/converted_files/{stem}{suffix}.csv")
}

/// One written CSV object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Empty for the primary table.
    pub suffix: String,
    pub key: String,
    pub rows: usize,
    pub columns: usize,
}

/// Where a job writes its outputs.
#[derive(Debug, Clone, Copy)]
pub struct Destination<'a> {
    pub bucket: &'a str,
    pub project_code: &'a str,
    pub run_id: &'a str,
    pub stem: &'a str,
}

impl Destination<'_> {
    #[must_use]
    pub fn key(&self, suffix: &str) -> String {
        output_key(self.project_code, self.run_id, self.stem, suffix)
    }
}

/// Write the primary table, then each auxiliary table.
///
/// Returns the artifacts in write order; the primary one comes first. A
/// failure part-way leaves earlier objects in place.
pub fn write_tables<S: ObjectStore + ?Sized>(
    store: &S,
    tables: ConvertedTables,
    destination: &Destination<'_>,
) -> Result<Vec<Artifact>> {
    let bucket = destination.bucket;
    let exists = store
        .head_bucket(bucket)
        .map_err(|source| ConvertError::store(Stage::Write, bucket, None, source))?;
    if !exists {
        error!(bucket, "destination bucket does not exist");
        return Err(ConvertError::DestinationBucketMissing {
            bucket: bucket.to_string(),
        });
    }

    let ConvertedTables {
        primary,
        auxiliary,
    } = tables;
    let mut artifacts = Vec::with_capacity(auxiliary.len() + 1);
    artifacts.push(write_one(store, destination, PRIMARY_SUFFIX, primary, None)?);
    for (suffix, frame) in auxiliary {
        artifacts.push(write_one(
            store,
            destination,
            suffix,
            frame,
            Some(QuoteStyle::NonNumeric),
        )?);
    }
    Ok(artifacts)
}

fn write_one<S: ObjectStore + ?Sized>(
    store: &S,
    destination: &Destination<'_>,
    suffix: &str,
    mut frame: DataFrame,
    quote_style: Option<QuoteStyle>,
) -> Result<Artifact> {
    let key = destination.key(suffix);
    let body = to_csv(&mut frame, quote_style).map_err(|source| ConvertError::Serialize {
        key: key.clone(),
        source,
    })?;
    let bytes = body.len();
    store
        .put(destination.bucket, &key, body)
        .map_err(|source| {
            error!(bucket = destination.bucket, %key, error = %source, "writing CSV failed");
            ConvertError::store(Stage::Write, destination.bucket, Some(&key), source.with_key(&key))
        })?;
    info!(bucket = destination.bucket, %key, rows = frame.height(), bytes, "wrote CSV");
    Ok(Artifact {
        suffix: suffix.to_string(),
        key,
        rows: frame.height(),
        columns: frame.width(),
    })
}

/// Serialize with a header row; `None` keeps the writer's default quoting.
pub(crate) fn to_csv(frame: &mut DataFrame, quote_style: Option<QuoteStyle>) -> PolarsResult<Vec<u8>> {
    let mut body = Vec::new();
    {
        let mut writer = CsvWriter::new(&mut body).include_header(true);
        if let Some(style) = quote_style {
            writer = writer.with_quote_style(style);
        }
        writer.finish(frame)?;
    }
    debug!(bytes = body.len(), "serialized table");
    Ok(body)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use statcsv_store::{MemoryStore, StoreCall};

    use super::*;
    use crate::convert::VALUES_SUFFIX;

    fn tables() -> ConvertedTables {
        let primary = DataFrame::new(vec![
            Column::new("id".into(), vec![1i32, 2]),
            Column::new("town".into(), vec!["Leiden", "Delft"]),
        ])
        .unwrap();
        let values = DataFrame::new(vec![
            Column::new("Field".into(), vec!["town"]),
            Column::new("Code".into(), vec![1i32]),
            Column::new("Meaning".into(), vec!["Leiden, ZH"]),
        ])
        .unwrap();
        ConvertedTables {
            primary,
            auxiliary: BTreeMap::from([(VALUES_SUFFIX, values)]),
        }
    }

    fn destination() -> Destination<'static> {
        Destination {
            bucket: "out",
            project_code: "p1",
            run_id: "r1",
            stem: "data",
        }
    }

    #[test]
    fn test_output_key() {
        assert_eq!(
            output_key("p1", "r1", "data", "-values"),
            "p1/jobs/r1/converted_files/data-values.csv"
        );
        assert_eq!(destination().key(""), "p1/jobs/r1/converted_files/data.csv");
    }

    #[test]
    fn test_write_tables() {
        let store = MemoryStore::new().with_bucket("out");
        let artifacts = write_tables(&store, tables(), &destination()).unwrap();
        assert_eq!(artifacts.len(), 2);
        assert_eq!(artifacts[0].key, "p1/jobs/r1/converted_files/data.csv");
        assert_eq!((artifacts[0].rows, artifacts[0].columns), (2, 2));
        assert_eq!(artifacts[1].suffix, "-values");

        let primary = store
            .object("out", "p1/jobs/r1/converted_files/data.csv")
            .unwrap();
        assert_eq!(String::from_utf8(primary).unwrap(), "id,town\n1,Leiden\n2,Delft\n");

        let values = store
            .object("out", "p1/jobs/r1/converted_files/data-values.csv")
            .unwrap();
        let text = String::from_utf8(values).unwrap();
        assert!(text.ends_with("\"town\",1,\"Leiden, ZH\"\n"), "{text}");
    }

    #[test]
    fn test_missing_destination_bucket_writes_nothing() {
        let store = MemoryStore::new();
        let err = write_tables(&store, tables(), &destination()).unwrap_err();
        assert!(matches!(err, ConvertError::DestinationBucketMissing { .. }));
        assert_eq!(err.stage(), Stage::Write);
        assert_eq!(
            store.calls(),
            vec![StoreCall::HeadBucket {
                bucket: "out".to_string()
            }]
        );
    }
}
