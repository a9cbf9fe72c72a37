//! Ledger-driven conversion of SPSS and Stata files to CSV.
//!
//! A job reads its ledger from the object store, fetches the declared
//! source file, decodes it into a primary table plus auxiliary label
//! tables, writes each table as CSV under
//! `{project}/jobs/{run}/converted_files/`, and confirms the primary output
//! exists.
//!
//! ```no_run
//! use statcsv_core::{ConversionOptions, JobRequest, run_job};
//! use statcsv_store::{S3Config, S3Store};
//!
//! let store = S3Store::connect(&S3Config::default()).unwrap();
//! let request = JobRequest::new("bucket", "p1", "p1/ledger.json", "r1");
//! let outcome = run_job(&store, &request, &ConversionOptions::default()).unwrap();
//! println!("{}", outcome.primary_key);
//! ```

pub mod buffer;
pub mod convert;
pub mod error;
pub mod job;
pub mod ledger;
pub mod locate;
pub mod output;
pub mod verify;

pub use convert::{
    ConversionOptions, ConvertedTables, DESCRIPTION_SUFFIX, PRIMARY_SUFFIX, VALUES_SUFFIX, convert,
};
pub use error::{ConvertError, CorruptKind, DecoderError, Result, Stage};
pub use job::{JobOutcome, JobRequest, run_job};
pub use ledger::{FileType, Ledger, load_ledger};
pub use locate::{SCHEME_MARKER, TargetRef, open_source};
pub use output::{Artifact, Destination, output_key, write_tables};
pub use verify::verify_output;
