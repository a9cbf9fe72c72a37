//! CLI argument definitions.

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use colorchoice_clap::Color;
use statcsv_store::{DEFAULT_REGION, S3Config};
use tracing::level_filters::LevelFilter;

use crate::logging::LogFormat;

#[derive(Parser)]
#[command(
    name = "statcsv",
    version,
    about = "Convert an SPSS or Stata file in S3 to CSV",
    long_about = "Convert an SPSS (.sav) or Stata (.dta) file in S3 to CSV.\n\n\
                  Reads the job ledger at LEDGER_KEY in BUCKET, converts the source file \
                  it names, and writes the data plus its label tables to \
                  BUCKET/PROJECT_CODE/jobs/RUN_ID/converted_files/."
)]
pub struct Cli {
    /// Bucket holding the ledger and receiving the converted files.
    #[arg(value_name = "BUCKET")]
    pub bucket: String,

    /// Project code used as the output key prefix.
    #[arg(value_name = "PROJECT_CODE")]
    pub project_code: String,

    /// Key of the job ledger (JSON) inside BUCKET.
    #[arg(value_name = "LEDGER_KEY")]
    pub ledger_key: String,

    /// Run identifier used in the output key.
    #[arg(value_name = "RUN_ID")]
    pub run_id: String,

    #[command(flatten)]
    pub s3: S3Args,

    /// Largest source file to buffer in memory, in MiB.
    #[arg(long = "max-source-mb", value_name = "MIB", default_value_t = 2048)]
    pub max_source_mb: u64,

    /// Print the outcome as JSON on stdout instead of a table.
    #[arg(long = "json")]
    pub json: bool,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for warnings only).
    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(long = "log-format", value_enum, default_value = "pretty")]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

/// Object store connection.
#[derive(clap::Args)]
pub struct S3Args {
    /// S3 endpoint URL (AWS when unset).
    #[arg(long = "s3-endpoint", env = "S3_ENDPOINT", value_name = "URL")]
    pub endpoint: Option<String>,

    #[arg(long = "s3-access-key", env = "S3_ACCESS_KEY", value_name = "KEY")]
    pub access_key: Option<String>,

    #[arg(
        long = "s3-access-secret",
        env = "S3_ACCESS_SECRET",
        value_name = "SECRET",
        hide_env_values = true
    )]
    pub access_secret: Option<String>,

    #[arg(long = "s3-region", env = "S3_REGION", default_value = DEFAULT_REGION)]
    pub region: String,

    /// Path-style bucket addressing (MinIO and most self-hosted stores).
    #[arg(
        long = "s3-path-style",
        env = "S3_PATH_STYLE",
        value_name = "BOOL",
        default_value_t = true,
        action = ArgAction::Set
    )]
    pub path_style: bool,
}

impl S3Args {
    #[must_use]
    pub fn to_config(&self) -> S3Config {
        let mut config = S3Config::default()
            .with_region(self.region.clone())
            .with_path_style(self.path_style);
        if let Some(endpoint) = &self.endpoint {
            config = config.with_endpoint(endpoint.clone());
        }
        if let (Some(access), Some(secret)) = (&self.access_key, &self.access_secret) {
            config = config.with_credentials(access.clone(), secret.clone());
        }
        config
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

impl From<LogLevelArg> for LevelFilter {
    fn from(level: LogLevelArg) -> Self {
        match level {
            LogLevelArg::Error => Self::ERROR,
            LogLevelArg::Warn => Self::WARN,
            LogLevelArg::Info => Self::INFO,
            LogLevelArg::Debug => Self::DEBUG,
            LogLevelArg::Trace => Self::TRACE,
        }
    }
}

impl From<LogFormatArg> for LogFormat {
    fn from(format: LogFormatArg) -> Self {
        match format {
            LogFormatArg::Pretty => Self::Pretty,
            LogFormatArg::Compact => Self::Compact,
            LogFormatArg::Json => Self::Json,
        }
    }
}
