//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the input item table (`ItemRecord`, `ItemTable`)
//! - request and response identifiers (`SeriesId`, `FetchRequest`, `Period`)
//! - flattened output rows (`OutputRecord`, `YearMonth`)
//! - run configuration (`FetchConfig` and its policy enums)

pub mod types;

pub use types::*;
