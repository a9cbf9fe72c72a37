//! End-to-end jobs against the in-memory store.

use statcsv_core::{
    ConversionOptions, ConvertError, CorruptKind, FileType, JobRequest, Stage, run_job,
};
use statcsv_dta::{
    DtaDataset, DtaType, DtaValue, DtaVariable, DtaWriterOptions, ValueLabelTable,
    write_dta_to_vec,
};
use statcsv_sav::{
    SavFile, SavValue, SavVariable, SavWriterOptions, ValueLabelSet, write_sav_to_vec,
};
use statcsv_store::{MemoryStore, ObjectBody, ObjectStore, StoreCall, StoreError};

const LEDGER_KEY: &str = "p1/ledgers/r1.json";

fn ledger(file_type: &str, location: &str) -> String {
    serde_json::json!({
        "attributes": {"file_type": file_type, "uploaded_by": "etl"},
        "location_details": location,
    })
    .to_string()
}

fn request() -> JobRequest {
    JobRequest::new("out", "p1", LEDGER_KEY, "r1")
}

fn stata_bytes() -> Vec<u8> {
    let mut dataset = DtaDataset::with_variables(vec![
        DtaVariable::new("id", DtaType::Long),
        DtaVariable::new("tenure", DtaType::Byte).with_value_labels("tenurelbl"),
        DtaVariable::new("town", DtaType::Str(16)),
    ]);
    dataset.add_row(vec![
        DtaValue::Long(Some(1)),
        DtaValue::Byte(Some(1)),
        DtaValue::string("Leiden"),
    ]);
    dataset.add_row(vec![
        DtaValue::Long(Some(2)),
        DtaValue::Byte(Some(2)),
        DtaValue::string("Delft"),
    ]);
    let labels = [ValueLabelTable::new("tenurelbl")
        .with_entry(1, "Owner, outright")
        .with_entry(2, "")];
    write_dta_to_vec(&dataset, &labels, DtaWriterOptions::default()).unwrap()
}

fn spss_bytes() -> Vec<u8> {
    let mut file = SavFile::with_variables(vec![
        SavVariable::numeric("q1").with_label("Satisfaction, overall"),
        SavVariable::numeric("q2"),
        SavVariable::string("note", 24).with_label("Free text"),
    ]);
    file.add_value_labels(
        ValueLabelSet::new(vec![0, 1])
            .with_numeric(1.0, "Low")
            .with_numeric(2.0, "High"),
    );
    file.add_row(vec![
        SavValue::numeric(1.0),
        SavValue::numeric(2.0),
        SavValue::string("ok"),
    ]);
    write_sav_to_vec(&file, SavWriterOptions::default()).unwrap()
}

fn store_with(file_type: &str, location: &str) -> MemoryStore {
    let store = MemoryStore::new().with_bucket("out").with_bucket("raw");
    store.insert("out", LEDGER_KEY, ledger(file_type, location));
    store
}

fn read_csv(store: &MemoryStore, key: &str) -> Vec<Vec<String>> {
    let body = store.object("out", key).unwrap();
    csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(body.as_slice())
        .records()
        .map(|record| record.unwrap().iter().map(str::to_string).collect())
        .collect()
}

#[test]
fn test_stata_scenario() {
    let store = store_with("stata", "s3a://raw/data.dta");
    store.insert("raw", "data.dta", stata_bytes());

    let outcome = run_job(&store, &request(), &ConversionOptions::default()).unwrap();
    assert_eq!(outcome.file_type, FileType::Stata);
    assert_eq!(outcome.primary_key, "p1/jobs/r1/converted_files/data.csv");
    assert!(outcome.verified);
    let keys: Vec<&str> = outcome.artifacts.iter().map(|a| a.key.as_str()).collect();
    assert_eq!(
        keys,
        vec![
            "p1/jobs/r1/converted_files/data.csv",
            "p1/jobs/r1/converted_files/data-values.csv",
        ]
    );
    assert_eq!(
        (outcome.artifacts[0].rows, outcome.artifacts[0].columns),
        (2, 3)
    );

    let primary = read_csv(&store, "p1/jobs/r1/converted_files/data.csv");
    assert_eq!(primary[0], vec!["id", "tenure", "town"]);
    assert_eq!(primary[1], vec!["1", "Owner, outright", "Leiden"]);
    assert_eq!(primary[2], vec!["2", "", "Delft"]);

    // verification is the last store call
    assert_eq!(
        store.calls().last(),
        Some(&StoreCall::Get {
            bucket: "out".to_string(),
            key: "p1/jobs/r1/converted_files/data.csv".to_string(),
        })
    );
    assert!(store.object("raw", "data.dta").is_some());
}

#[test]
fn test_auxiliary_csv_round_trip() {
    let store = store_with("STATA", "s3a://raw/data.dta");
    store.insert("raw", "data.dta", stata_bytes());
    run_job(&store, &request(), &ConversionOptions::default()).unwrap();

    let rows = read_csv(&store, "p1/jobs/r1/converted_files/data-values.csv");
    assert_eq!(
        rows,
        vec![
            vec!["Field", "Code", "Meaning"],
            vec!["tenurelbl", "1", "Owner, outright"],
            vec!["tenurelbl", "2", ""],
        ]
    );
}

#[test]
fn test_spss_outputs() {
    let store = store_with("spss", "s3a://raw/uploads/wave1.sav");
    store.insert("raw", "uploads/wave1.sav", spss_bytes());

    let outcome = run_job(&store, &request(), &ConversionOptions::default()).unwrap();
    let suffixes: Vec<&str> = outcome.artifacts.iter().map(|a| a.suffix.as_str()).collect();
    assert_eq!(suffixes, vec!["", "-description", "-values"]);
    // two variables share one label set: 2 x 2 pairs
    assert_eq!(outcome.artifacts[2].rows, 4);
    assert_eq!(outcome.artifacts[1].rows, 2);

    let description = read_csv(&store, "p1/jobs/r1/converted_files/wave1-description.csv");
    assert_eq!(
        description,
        vec![
            vec!["Field", "Meaning"],
            vec!["q1", "Satisfaction, overall"],
            vec!["note", "Free text"],
        ]
    );
    let values = read_csv(&store, "p1/jobs/r1/converted_files/wave1-values.csv");
    assert_eq!(values[4][0], "q2");
    assert_eq!(values[4][2], "High");
}

#[test]
fn test_rerun_overwrites_same_keys() {
    let store = store_with("stata", "s3a://raw/data.dta");
    store.insert("raw", "data.dta", stata_bytes());

    let first = run_job(&store, &request(), &ConversionOptions::default()).unwrap();
    let second = run_job(&store, &request(), &ConversionOptions::default()).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        store.keys("out"),
        vec![
            "p1/jobs/r1/converted_files/data-values.csv",
            "p1/jobs/r1/converted_files/data.csv",
            LEDGER_KEY,
        ]
    );
}

#[test]
fn test_unsupported_file_type_touches_only_ledger() {
    let store = store_with("csv", "s3a://raw/data.csv");
    let err = run_job(&store, &request(), &ConversionOptions::default()).unwrap_err();
    assert!(matches!(err, ConvertError::UnsupportedFileType { .. }));
    assert_eq!(err.stage(), Stage::Ledger);
    assert_eq!(
        store.calls(),
        vec![StoreCall::Get {
            bucket: "out".to_string(),
            key: LEDGER_KEY.to_string(),
        }]
    );
}

#[test]
fn test_unsupported_location_touches_only_ledger() {
    let store = store_with("stata", "hdfs://bucket/key");
    let err = run_job(&store, &request(), &ConversionOptions::default()).unwrap_err();
    assert!(matches!(err, ConvertError::UnsupportedLocation { .. }));
    assert_eq!(err.stage(), Stage::Locate);
    assert_eq!(store.calls().len(), 1);
}

#[test]
fn test_missing_source_names_bucket_and_key() {
    let store = store_with("spss", "s3a://raw/nope/missing.sav");
    let err = run_job(&store, &request(), &ConversionOptions::default()).unwrap_err();
    match &err {
        ConvertError::SourceNotFound { bucket, key } => {
            assert_eq!(bucket, "raw");
            assert_eq!(key, "nope/missing.sav");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(err.to_string().contains("s3://raw/nope/missing.sav"));
}

#[test]
fn test_empty_stata_file_is_truncated_and_nothing_written() {
    let store = store_with("stata", "s3a://raw/empty.dta");
    store.insert("raw", "empty.dta", Vec::new());

    let err = run_job(&store, &request(), &ConversionOptions::default()).unwrap_err();
    assert_eq!(err.corrupt_kind(), Some(CorruptKind::Truncated));
    assert_eq!(err.stage(), Stage::Decode);
    assert!(
        !store
            .calls()
            .iter()
            .any(|call| matches!(call, StoreCall::Put { .. }))
    );
}

#[test]
fn test_spss_file_declared_as_stata() {
    let store = store_with("stata", "s3a://raw/data.dta");
    store.insert("raw", "data.dta", spss_bytes());
    let err = run_job(&store, &request(), &ConversionOptions::default()).unwrap_err();
    assert_eq!(
        err.corrupt_kind(),
        Some(CorruptKind::UnsupportedOrWrongFormat)
    );
}

#[test]
fn test_missing_ledger() {
    let store = MemoryStore::new().with_bucket("out");
    let err = run_job(&store, &request(), &ConversionOptions::default()).unwrap_err();
    assert!(matches!(err, ConvertError::LedgerNotFound { .. }));
    assert_eq!(err.stage(), Stage::Ledger);
}

#[test]
fn test_malformed_ledger() {
    let store = MemoryStore::new().with_bucket("out");
    store.insert("out", LEDGER_KEY, "not json");
    let err = run_job(&store, &request(), &ConversionOptions::default()).unwrap_err();
    assert!(matches!(err, ConvertError::MalformedLedger { .. }));
}

/// Delegates to a `MemoryStore`, optionally hiding buckets from `head` or
/// refusing every `put`.
#[derive(Default)]
struct FaultyStore {
    inner: MemoryStore,
    hide_buckets: bool,
    deny_puts: bool,
}

impl ObjectStore for FaultyStore {
    fn get(&self, bucket: &str, key: &str) -> statcsv_store::Result<ObjectBody> {
        self.inner.get(bucket, key)
    }
    fn put(&self, bucket: &str, key: &str, body: Vec<u8>) -> statcsv_store::Result<()> {
        if self.deny_puts {
            return Err(StoreError::fault("put", bucket, "AccessDenied"));
        }
        self.inner.put(bucket, key, body)
    }
    fn head_bucket(&self, bucket: &str) -> statcsv_store::Result<bool> {
        if self.hide_buckets {
            return Ok(false);
        }
        self.inner.head_bucket(bucket)
    }
    fn list(&self, bucket: &str, prefix: &str) -> statcsv_store::Result<Vec<String>> {
        self.inner.list(bucket, prefix)
    }
    fn delete(&self, bucket: &str, key: &str) -> statcsv_store::Result<()> {
        self.inner.delete(bucket, key)
    }
    fn create_bucket(&self, bucket: &str) -> statcsv_store::Result<()> {
        self.inner.create_bucket(bucket)
    }
}

fn faulty_stata_store() -> FaultyStore {
    let inner = store_with("stata", "s3a://raw/d.dta");
    inner.insert("raw", "d.dta", stata_bytes());
    FaultyStore {
        inner,
        ..FaultyStore::default()
    }
}

#[test]
fn test_destination_bucket_missing() {
    let store = FaultyStore {
        hide_buckets: true,
        ..faulty_stata_store()
    };

    let err = run_job(&store, &request(), &ConversionOptions::default()).unwrap_err();
    assert!(matches!(err, ConvertError::DestinationBucketMissing { ref bucket } if bucket == "out"));
    assert_eq!(err.stage(), Stage::Write);
    assert_eq!(store.inner.keys("out"), vec![LEDGER_KEY]);
}

#[test]
fn test_failed_put_names_the_object() {
    let store = FaultyStore {
        deny_puts: true,
        ..faulty_stata_store()
    };

    let err = run_job(&store, &request(), &ConversionOptions::default()).unwrap_err();
    assert_eq!(err.stage(), Stage::Write);
    assert!(matches!(err, ConvertError::Store { .. }));
    let chain: Vec<String> = std::iter::successors(
        Some(&err as &dyn std::error::Error),
        |err| err.source(),
    )
    .map(ToString::to_string)
    .collect();
    assert_eq!(
        chain,
        vec![
            "object store call on s3://out/p1/jobs/r1/converted_files/d.csv failed",
            "put on s3://out/p1/jobs/r1/converted_files/d.csv failed: AccessDenied",
        ]
    );
}

#[test]
fn test_source_too_large() {
    let store = store_with("stata", "s3a://raw/data.dta");
    store.insert("raw", "data.dta", stata_bytes());
    let options = ConversionOptions::default().with_max_source_bytes(64);
    let err = run_job(&store, &request(), &options).unwrap_err();
    assert!(matches!(err, ConvertError::SourceTooLarge { limit: 64, .. }));
    assert_eq!(err.stage(), Stage::Decode);
}
