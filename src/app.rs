//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and sets up logging
//! - parses CLI arguments into a `FetchConfig`
//! - runs the fetch pipeline
//! - prints the run summary

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{CommonArgs, Command, FetchArgs, MonthArgs};
use crate::data::batch::MAX_BATCH_SIZE;
use crate::domain::{FetchConfig, OutputLayout};
use crate::error::AppError;

pub mod pipeline;

const DEFAULT_START_YEAR: i32 = 2020;
const DEFAULT_MONTH_START_YEAR: i32 = 2024;
const DEFAULT_OUTPUT: &str = "cpi_data.csv";
const DEFAULT_MONTH_OUTPUT: &str = "cpi_data_month.csv";

/// Entry point for the `cpi` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_logging();

    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    let config = match cli.command {
        Command::Fetch(args) => fetch_config_from_args(&args)?,
        Command::Month(args) => month_config_from_args(&args)?,
    };

    let run = pipeline::run_fetch(&config)?;
    println!("{}", crate::report::format_run_summary(&run, &config));
    println!("Data saved to {}", config.output_path.display());
    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A global subscriber may already be set (tests, embedding).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn fetch_config_from_args(args: &FetchArgs) -> Result<FetchConfig, AppError> {
    config_from_common(
        &args.common,
        DEFAULT_START_YEAR,
        DEFAULT_OUTPUT,
        OutputLayout::Full {
            footnotes: args.footnotes,
        },
    )
}

pub fn month_config_from_args(args: &MonthArgs) -> Result<FetchConfig, AppError> {
    config_from_common(
        &args.common,
        DEFAULT_MONTH_START_YEAR,
        DEFAULT_MONTH_OUTPUT,
        OutputLayout::Month(args.month),
    )
}

fn config_from_common(
    args: &CommonArgs,
    default_start: i32,
    default_output: &str,
    layout: OutputLayout,
) -> Result<FetchConfig, AppError> {
    let start_year = args.start_year.unwrap_or(default_start);
    if start_year > args.end_year {
        return Err(AppError::config(format!(
            "--start-year ({start_year}) must not be after --end-year ({}).",
            args.end_year
        )));
    }
    if args.batch_size == 0 || args.batch_size > MAX_BATCH_SIZE {
        return Err(AppError::config(format!(
            "--batch-size must be between 1 and {MAX_BATCH_SIZE} (got {}).",
            args.batch_size
        )));
    }

    Ok(FetchConfig {
        input_path: args.input_path.clone(),
        output_path: args
            .output_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(default_output)),
        start_year,
        end_year: args.end_year,
        api_key: args.api_key.clone().filter(|k| !k.trim().is_empty()),
        api_url: args.api_url.clone(),
        batch_size: args.batch_size,
        delay: Duration::from_millis(args.delay_ms),
        timeout: Duration::from_secs(args.timeout_secs),
        period_policy: args.period_policy,
        duplicate_policy: args.duplicate_policy,
        layout,
    })
}

/// Rewrite argv so `cpi` defaults to `cpi fetch`.
///
/// Rules:
/// - `cpi`                      -> `cpi fetch`
/// - `cpi --input x.csv ...`    -> `cpi fetch --input x.csv ...`
/// - `cpi --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("fetch".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "fetch".to_string());
    }
    argv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DuplicatePolicy, PeriodPolicy};
    use crate::error::ErrorKind;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    /// Flag values as clap would produce them with no env and no overrides.
    fn common() -> CommonArgs {
        CommonArgs {
            input_path: PathBuf::from("item.csv"),
            output_path: None,
            start_year: None,
            end_year: 2024,
            api_key: Some("k".to_string()),
            api_url: crate::data::bls::DEFAULT_API_URL.to_string(),
            batch_size: crate::data::batch::DEFAULT_BATCH_SIZE,
            delay_ms: 1000,
            timeout_secs: 60,
            period_policy: PeriodPolicy::Skip,
            duplicate_policy: DuplicatePolicy::Warn,
        }
    }

    fn fetch_args(common: CommonArgs) -> FetchArgs {
        FetchArgs {
            common,
            footnotes: false,
        }
    }

    #[test]
    fn bare_invocation_runs_fetch() {
        assert_eq!(rewrite_args(argv(&["cpi"])), argv(&["cpi", "fetch"]));
        assert_eq!(
            rewrite_args(argv(&["cpi", "--start-year", "2021"])),
            argv(&["cpi", "fetch", "--start-year", "2021"])
        );
        assert_eq!(rewrite_args(argv(&["cpi", "--help"])), argv(&["cpi", "--help"]));
        assert_eq!(rewrite_args(argv(&["cpi", "month"])), argv(&["cpi", "month"]));
    }

    #[test]
    fn fetch_and_month_have_their_own_defaults() {
        let cfg = fetch_config_from_args(&fetch_args(common())).unwrap();
        assert_eq!(cfg.output_path, PathBuf::from("cpi_data.csv"));
        assert_eq!((cfg.start_year, cfg.end_year), (2020, 2024));
        assert_eq!(cfg.layout, OutputLayout::Full { footnotes: false });
        assert_eq!(cfg.delay, Duration::from_secs(1));
        assert_eq!(cfg.api_key.as_deref(), Some("k"));

        let args = MonthArgs {
            common: common(),
            month: 4,
        };
        let cfg = month_config_from_args(&args).unwrap();
        assert_eq!(cfg.output_path, PathBuf::from("cpi_data_month.csv"));
        assert_eq!((cfg.start_year, cfg.end_year), (2024, 2024));
        assert_eq!(cfg.layout, OutputLayout::Month(4));
    }

    #[test]
    fn explicit_values_override_defaults() {
        let args = FetchArgs {
            common: CommonArgs {
                output_path: Some(PathBuf::from("out/cpi.csv")),
                start_year: Some(2018),
                api_key: Some("  ".to_string()),
                ..common()
            },
            footnotes: true,
        };
        let cfg = fetch_config_from_args(&args).unwrap();
        assert_eq!(cfg.output_path, PathBuf::from("out/cpi.csv"));
        assert_eq!(cfg.start_year, 2018);
        assert_eq!(cfg.api_key, None);
        assert_eq!(cfg.layout, OutputLayout::Full { footnotes: true });
    }

    #[test]
    fn inverted_year_range_is_config_error() {
        let args = fetch_args(CommonArgs {
            start_year: Some(2025),
            end_year: 2020,
            ..common()
        });
        let err = fetch_config_from_args(&args).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn batch_size_is_bounded() {
        for bad in [0, 51] {
            let args = fetch_args(CommonArgs {
                batch_size: bad,
                ..common()
            });
            assert_eq!(fetch_config_from_args(&args).unwrap_err().kind(), ErrorKind::Config);
        }
        let args = fetch_args(CommonArgs {
            batch_size: 50,
            ..common()
        });
        assert_eq!(fetch_config_from_args(&args).unwrap().batch_size, 50);
    }
}
