//! Logging to a file.

use std::fs;

use statcsv_cli::logging::{LogConfig, LogFormat, init_logging};
use tracing::info;
use tracing::level_filters::LevelFilter;

#[test]
fn test_log_file_receives_json_events() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("statcsv.log");
    let mut config = LogConfig::default()
        .with_level_filter(LevelFilter::INFO)
        .with_format(LogFormat::Json)
        .with_ansi(false)
        .with_log_file(Some(path.clone()));
    config.use_env_filter = false;
    init_logging(&config).unwrap();

    info!(target: "statcsv_core::job", bucket = "lake", "job complete");
    tracing::debug!(target: "statcsv_core::job", "filtered out");
    info!(target: "aws_smithy_runtime", "not a workspace crate");

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("job complete"));
    assert!(text.contains("\"bucket\":\"lake\""));
    assert!(!text.contains("filtered out"));
    assert!(!text.contains("not a workspace crate"));
}
