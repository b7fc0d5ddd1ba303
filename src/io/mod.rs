//! Input/output helpers.
//!
//! - item table CSV ingest + validation (`ingest`)
//! - CPI row exports (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
