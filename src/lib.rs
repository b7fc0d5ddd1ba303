//! `cpi-fetch` library crate.
//!
//! The binary (`cpi`) is a thin wrapper around this library so that:
//!
//! - the pipeline is testable without spawning processes or hitting the network
//! - each stage (ingest, fetch, flatten, export) can be reused on its own

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod flatten;
pub mod io;
pub mod report;
