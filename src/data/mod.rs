//! Remote data access: series ids, the BLS client, and batched fetching.

pub mod batch;
pub mod bls;
pub mod series;

pub use batch::{BatchPlan, ChunkOutcome, ChunkStatus, fetch_batches, partition};
pub use bls::{ApiResponse, BlsClient, SeriesSource};
pub use series::{SERIES_PREFIX, item_code_of, series_id_for, series_ids};
