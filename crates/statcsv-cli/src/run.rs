//! Wiring the CLI to the conversion job.

use anyhow::{Context, Result};
use statcsv_core::{ConversionOptions, JobOutcome, JobRequest, run_job};
use statcsv_store::S3Store;
use tracing::info;

use crate::cli::Cli;

const BYTES_PER_MIB: u64 = 1024 * 1024;

#[must_use]
pub fn job_request(cli: &Cli) -> JobRequest {
    JobRequest::new(
        cli.bucket.as_str(),
        cli.project_code.as_str(),
        cli.ledger_key.as_str(),
        cli.run_id.as_str(),
    )
}

#[must_use]
pub fn conversion_options(cli: &Cli) -> ConversionOptions {
    ConversionOptions::default()
        .with_max_source_bytes(cli.max_source_mb.saturating_mul(BYTES_PER_MIB))
}

/// Connect to the store and run the job.
///
/// Job failures are returned as [`statcsv_core::ConvertError`] inside the
/// `anyhow` error so the caller can name the failing stage.
pub fn run(cli: &Cli) -> Result<JobOutcome> {
    let config = cli.s3.to_config();
    let store = S3Store::connect(&config).context("failed to start the object store client")?;
    let request = job_request(cli);
    info!(
        bucket = %request.bucket,
        ledger = %request.ledger_key,
        run_id = %request.run_id,
        "starting conversion"
    );
    let outcome = run_job(&store, &request, &conversion_options(cli))?;
    Ok(outcome)
}
