//! Argument parsing.

use clap::{CommandFactory, Parser};
use statcsv_cli::cli::{Cli, LogFormatArg};
use statcsv_cli::run::{conversion_options, job_request};

const POSITIONAL: [&str; 5] = ["statcsv", "lake", "p1", "jobs/ledger.json", "r1"];

#[test]
fn test_command_definition() {
    Cli::command().debug_assert();
}

#[test]
fn test_positional_arguments() {
    let cli = Cli::try_parse_from(POSITIONAL).unwrap();
    let request = job_request(&cli);
    assert_eq!(request.bucket, "lake");
    assert_eq!(request.project_code, "p1");
    assert_eq!(request.ledger_key, "jobs/ledger.json");
    assert_eq!(request.run_id, "r1");
    assert!(!cli.json);
    assert!(matches!(cli.log_format, LogFormatArg::Pretty));
}

#[test]
fn test_missing_run_id_is_rejected() {
    let result = Cli::try_parse_from(["statcsv", "lake", "p1", "jobs/ledger.json"]);
    assert!(result.is_err());
}

#[test]
fn test_s3_flags_build_config() {
    let mut args = POSITIONAL.to_vec();
    args.extend([
        "--s3-endpoint",
        "http://127.0.0.1:9000",
        "--s3-access-key",
        "minio",
        "--s3-access-secret",
        "minio-secret",
        "--s3-region",
        "eu-west-1",
        "--s3-path-style",
        "false",
    ]);
    let cli = Cli::try_parse_from(args).unwrap();
    let config = cli.s3.to_config();
    assert_eq!(config.endpoint.as_deref(), Some("http://127.0.0.1:9000"));
    assert_eq!(config.region, "eu-west-1");
    assert_eq!(config.access_key.as_deref(), Some("minio"));
    assert_eq!(config.secret_key.as_deref(), Some("minio-secret"));
    assert!(!config.path_style);
}

#[test]
fn test_max_source_limit_in_bytes() {
    let mut args = POSITIONAL.to_vec();
    args.extend(["--max-source-mb", "3", "--json", "--log-format", "json"]);
    let cli = Cli::try_parse_from(args).unwrap();
    assert_eq!(conversion_options(&cli).max_source_bytes, 3 * 1024 * 1024);
    assert!(cli.json);
    assert!(matches!(cli.log_format, LogFormatArg::Json));
}
