//! The extract -> flatten -> write pipeline.
//!
//! load items -> build series ids -> fetch in paced chunks -> flatten each
//! successful response into an explicit accumulator -> write once at the end.

use tracing::{info, warn};

use crate::data::{BatchPlan, BlsClient, ChunkOutcome, ChunkStatus, SeriesSource, fetch_batches, series_ids};
use crate::domain::{FetchConfig, ItemTable, OutputLayout, OutputRecord};
use crate::error::AppError;
use crate::flatten::{FlattenOptions, FlattenStats, flatten_response};
use crate::io::{load_items, write_month_csv, write_records_csv};

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub items: usize,
    pub series_requested: usize,
    pub chunks: Vec<ChunkOutcome>,
    pub stats: FlattenStats,
    pub records: Vec<OutputRecord>,
}

impl RunOutput {
    pub fn failed_chunks(&self) -> impl Iterator<Item = &ChunkOutcome> {
        self.chunks
            .iter()
            .filter(|c| matches!(c.status, ChunkStatus::Failed { .. }))
    }
}

/// Execute the full pipeline against the live API and write the output file.
pub fn run_fetch(config: &FetchConfig) -> Result<RunOutput, AppError> {
    let items = load_items(&config.input_path, config.duplicate_policy)?;

    if config.api_key.is_none() {
        warn!("no BLS API key configured; anonymous requests have lower limits");
    }
    let client = BlsClient::from_config(config)?;

    let run = run_with_source(config, &items, &client)?;
    write_output(config, &run.records)?;
    Ok(run)
}

/// Fetch and flatten with an already loaded item table and any series source.
pub fn run_with_source<S>(config: &FetchConfig, items: &ItemTable, source: &S) -> Result<RunOutput, AppError>
where
    S: SeriesSource + ?Sized,
{
    let ids = series_ids(items);
    let plan = BatchPlan {
        batch_size: config.batch_size,
        delay: config.delay,
        start_year: config.start_year,
        end_year: config.end_year,
    };
    let options = FlattenOptions {
        period_policy: config.period_policy,
        month: match config.layout {
            OutputLayout::Month(m) => Some(m),
            OutputLayout::Full { .. } => None,
        },
    };

    let mut records = Vec::new();
    let mut stats = FlattenStats::default();
    let chunks = fetch_batches(source, &ids, &plan, |response| {
        stats.absorb(flatten_response(response, items, &options, &mut records)?);
        Ok(())
    })?;

    info!(
        rows = records.len(),
        chunks = chunks.len(),
        skipped_periods = stats.skipped_periods,
        "fetch complete"
    );

    Ok(RunOutput {
        items: items.len(),
        series_requested: ids.len(),
        chunks,
        stats,
        records,
    })
}

pub fn write_output(config: &FetchConfig, records: &[OutputRecord]) -> Result<(), AppError> {
    match config.layout {
        OutputLayout::Full { footnotes } => write_records_csv(&config.output_path, records, footnotes),
        OutputLayout::Month(_) => write_month_csv(&config.output_path, records),
    }
}
