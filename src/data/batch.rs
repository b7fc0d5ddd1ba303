//! Batched, paced fetching of series ids.
//!
//! The API caps how many series one request may name, so ids are split into
//! contiguous chunks and requested strictly in order, one blocking call per
//! chunk with a fixed pause before each call.

use std::time::Duration;

use tracing::{info, warn};

use crate::data::bls::{ApiResponse, SeriesSource};
use crate::domain::{FetchRequest, SeriesId};
use crate::error::AppError;

/// Series per request. Unregistered callers are capped at 25.
pub const DEFAULT_BATCH_SIZE: usize = 24;
/// Upper bound for registered callers.
pub const MAX_BATCH_SIZE: usize = 50;
pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy)]
pub struct BatchPlan {
    pub batch_size: usize,
    pub delay: Duration,
    pub start_year: i32,
    pub end_year: i32,
}

/// How one chunk went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkStatus {
    Succeeded,
    /// Non-success API status; the chunk contributed no rows.
    Failed { status: String },
}

#[derive(Debug, Clone)]
pub struct ChunkOutcome {
    /// 1-based chunk number.
    pub index: usize,
    pub series: usize,
    pub status: ChunkStatus,
    /// Messages returned by the API (present on failures and on some successes).
    pub messages: Vec<String>,
}

/// Split ids into contiguous chunks of at most `batch_size`.
pub fn partition(ids: &[SeriesId], batch_size: usize) -> Vec<&[SeriesId]> {
    ids.chunks(batch_size.max(1)).collect()
}

/// Request every chunk in order and hand each successful response to `on_success`.
///
/// Non-success API statuses are logged and recorded, then the loop moves on.
/// Transport errors and errors returned by `on_success` abort immediately.
pub fn fetch_batches<S, F>(
    source: &S,
    ids: &[SeriesId],
    plan: &BatchPlan,
    mut on_success: F,
) -> Result<Vec<ChunkOutcome>, AppError>
where
    S: SeriesSource + ?Sized,
    F: FnMut(&ApiResponse) -> Result<(), AppError>,
{
    let chunks = partition(ids, plan.batch_size);
    let total = chunks.len();
    let mut outcomes = Vec::with_capacity(total);

    for (i, chunk) in chunks.into_iter().enumerate() {
        let index = i + 1;
        if !plan.delay.is_zero() {
            std::thread::sleep(plan.delay);
        }

        info!(chunk = index, of = total, series = chunk.len(), "requesting chunk");
        let request = FetchRequest {
            series_ids: chunk.to_vec(),
            start_year: plan.start_year,
            end_year: plan.end_year,
        };
        let response = source.fetch(&request)?;

        let status = if response.is_success() {
            for message in &response.message {
                warn!(chunk = index, %message, "API message");
            }
            on_success(&response)?;
            ChunkStatus::Succeeded
        } else {
            warn!(
                chunk = index,
                status = %response.status,
                message = %response.message.join("; "),
                "request failed; skipping chunk"
            );
            ChunkStatus::Failed {
                status: response.status.clone(),
            }
        };

        outcomes.push(ChunkOutcome {
            index,
            series: chunk.len(),
            status,
            messages: response.message,
        });
    }

    Ok(outcomes)
}
