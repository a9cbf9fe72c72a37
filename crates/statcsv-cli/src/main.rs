//! `statcsv` binary.

use std::io::{self, IsTerminal};
use std::process::ExitCode;

use clap::{ColorChoice, Parser};
use statcsv_cli::cli::Cli;
use statcsv_cli::logging::{LogConfig, init_logging};
use statcsv_cli::run::run;
use statcsv_cli::summary::{print_json, print_summary};
use statcsv_core::ConvertError;
use tracing::level_filters::LevelFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(outcome) => {
            if cli.json {
                if let Err(error) = print_json(&outcome) {
                    eprintln!("error: {error}");
                    return ExitCode::FAILURE;
                }
            } else {
                print_summary(&outcome, &cli.bucket);
            }
            ExitCode::SUCCESS
        }
        Err(error) => {
            match error.downcast_ref::<ConvertError>() {
                Some(convert) => eprintln!("error: {} stage failed: {convert}", convert.stage()),
                None => eprintln!("error: {error}"),
            }
            for cause in error.chain().skip(1) {
                eprintln!("  caused by: {cause}");
            }
            ExitCode::FAILURE
        }
    }
}

/// Explicit `--log-level` wins over `-v`/`-q`; either one disables `RUST_LOG`.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let explicit = cli.log_level.map(LevelFilter::from);
    let ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    let mut config = LogConfig::default()
        .with_level_filter(explicit.unwrap_or_else(|| cli.verbosity.tracing_level_filter()))
        .with_format(cli.log_format.into())
        .with_ansi(ansi)
        .with_log_file(cli.log_file.clone());
    config.use_env_filter = explicit.is_none() && !cli.verbosity.is_present();
    config
}
