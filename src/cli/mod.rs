//! Command-line parsing for the CPI fetcher.
//!
//! Every option can also come from the environment (or a `.env` file), so the
//! tool still runs start-to-finish with no arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::data::batch::DEFAULT_BATCH_SIZE;
use crate::data::bls::DEFAULT_API_URL;
use crate::domain::{DuplicatePolicy, PeriodPolicy};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "cpi", version, about = "Fetch CPI series from the BLS API into CSV")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch every monthly observation and write `Series_ID,Item_name,Date,CPI_value`.
    Fetch(FetchArgs),
    /// Fetch and keep a single calendar month, writing `Series_ID,Date,CPI Value`.
    Month(MonthArgs),
}

/// Options shared by every command.
#[derive(Debug, Args, Clone)]
pub struct CommonArgs {
    /// Item table CSV with `item_code` and `item_name` columns.
    #[arg(long = "input", env = "CPI_INPUT_PATH", default_value = "item.csv")]
    pub input_path: PathBuf,

    /// Output CSV path.
    #[arg(long = "output", env = "CPI_OUTPUT_PATH")]
    pub output_path: Option<PathBuf>,

    /// First year to request.
    #[arg(long, env = "CPI_START_YEAR")]
    pub start_year: Option<i32>,

    /// Last year to request.
    #[arg(long, env = "CPI_END_YEAR", default_value_t = 2024)]
    pub end_year: i32,

    /// BLS registration key.
    #[arg(long, env = "BLS_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// API endpoint.
    #[arg(long, env = "BLS_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Series ids per request (1-50).
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Pause before each request (milliseconds).
    #[arg(long, default_value_t = 1000)]
    pub delay_ms: u64,

    /// HTTP request timeout (seconds).
    #[arg(long, default_value_t = 60)]
    pub timeout_secs: u64,

    /// Handling of annual / semiannual period codes such as `M13`.
    #[arg(long, value_enum, default_value_t = PeriodPolicy::Skip)]
    pub period_policy: PeriodPolicy,

    /// Handling of repeated item codes in the input table.
    #[arg(long = "duplicates", value_enum, default_value_t = DuplicatePolicy::Warn)]
    pub duplicate_policy: DuplicatePolicy,
}

#[derive(Debug, Args, Clone)]
pub struct FetchArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Add a `Footnotes` column with the comma-joined footnote text.
    #[arg(long)]
    pub footnotes: bool,
}

#[derive(Debug, Args, Clone)]
pub struct MonthArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Calendar month to keep (1-12).
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: u32,
}
