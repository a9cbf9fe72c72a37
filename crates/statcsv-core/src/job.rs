//! End-to-end job: ledger, locate, decode, write, verify.

use std::time::Instant;

use statcsv_store::ObjectStore;
use tracing::{error, info, info_span};

use crate::convert::{ConversionOptions, PRIMARY_SUFFIX, convert};
use crate::error::Result;
use crate::ledger::{FileType, load_ledger};
use crate::locate::{TargetRef, open_source};
use crate::output::{Artifact, Destination, write_tables};
use crate::verify::verify_output;

/// The four inputs a scheduler supplies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    /// Bucket holding the ledger and receiving the outputs.
    pub bucket: String,
    pub project_code: String,
    pub ledger_key: String,
    pub run_id: String,
}

impl JobRequest {
    pub fn new(
        bucket: impl Into<String>,
        project_code: impl Into<String>,
        ledger_key: impl Into<String>,
        run_id: impl Into<String>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            project_code: project_code.into(),
            ledger_key: ledger_key.into(),
            run_id: run_id.into(),
        }
    }
}

/// What a successful job produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    pub file_type: FileType,
    pub source: TargetRef,
    pub primary_key: String,
    /// Written objects, primary first.
    pub artifacts: Vec<Artifact>,
    /// Always true; verification failures are errors.
    pub verified: bool,
}

/// Run one conversion.
///
/// Every failure is terminal; nothing is retried here. Re-running with the
/// same request overwrites the same keys.
pub fn run_job<S: ObjectStore + ?Sized>(
    store: &S,
    request: &JobRequest,
    options: &ConversionOptions,
) -> Result<JobOutcome> {
    let span = info_span!(
        "conversion",
        run_id = %request.run_id,
        project = %request.project_code
    );
    let _guard = span.enter();
    let start = Instant::now();

    let (file_type, location) = info_span!("ledger").in_scope(|| -> Result<_> {
        let ledger = load_ledger(store, &request.bucket, &request.ledger_key)?;
        let file_type = ledger.file_type().inspect_err(|err| {
            error!(ledger = %request.ledger_key, error = %err, "unsupported file type");
        })?;
        Ok((file_type, ledger.location_details))
    })?;

    let (target, body) = info_span!("locate", %location).in_scope(|| -> Result<_> {
        let target = TargetRef::parse(&location).inspect_err(|err| {
            error!(error = %err, "unsupported source location");
        })?;
        let body = open_source(store, &target)?;
        Ok((target, body))
    })?;

    let tables = info_span!("decode", %file_type)
        .in_scope(|| convert(file_type, body, &location, options))?;

    let destination = Destination {
        bucket: &request.bucket,
        project_code: &request.project_code,
        run_id: &request.run_id,
        stem: target.stem(),
    };
    let artifacts = info_span!("write").in_scope(|| write_tables(store, tables, &destination))?;

    let primary_key = destination.key(PRIMARY_SUFFIX);
    info_span!("verify").in_scope(|| verify_output(store, &request.bucket, &primary_key))?;

    info!(
        %file_type,
        source = %location,
        primary_key = %primary_key,
        artifacts = artifacts.len(),
        duration_ms = start.elapsed().as_millis(),
        "conversion complete"
    );
    Ok(JobOutcome {
        file_type,
        source: target,
        primary_key,
        artifacts,
        verified: true,
    })
}
