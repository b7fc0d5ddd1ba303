//! Shared domain types.
//!
//! These types flow through every pipeline stage:
//!
//! - the input lookup table (`ItemRecord`, `ItemTable`)
//! - request-side identifiers (`SeriesId`, `FetchRequest`)
//! - parsed response pieces (`Period`, `YearMonth`)
//! - the flattened output row (`OutputRecord`)

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use clap::ValueEnum;
use serde::Deserialize;

use crate::error::AppError;

/// One row of the input item table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRecord {
    pub item_code: String,
    pub item_name: String,
}

/// Input items in file order plus a `code -> name` index built once.
///
/// When a code appears more than once the first row owns the index entry; the
/// later rows are still kept in `items` so series ids stay one-to-one with
/// input rows.
#[derive(Debug, Clone, Default)]
pub struct ItemTable {
    items: Vec<ItemRecord>,
    by_code: HashMap<String, usize>,
}

impl ItemTable {
    /// Append a record. Returns the earlier record when the code is a duplicate.
    pub fn push(&mut self, record: ItemRecord) -> Option<&ItemRecord> {
        let idx = self.items.len();
        let existing = self.by_code.get(&record.item_code).copied();
        if existing.is_none() {
            self.by_code.insert(record.item_code.clone(), idx);
        }
        self.items.push(record);
        existing.map(|i| &self.items[i])
    }

    pub fn items(&self) -> &[ItemRecord] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn name_for(&self, item_code: &str) -> Option<&str> {
        self.by_code
            .get(item_code)
            .map(|&i| self.items[i].item_name.as_str())
    }
}

impl FromIterator<ItemRecord> for ItemTable {
    fn from_iter<I: IntoIterator<Item = ItemRecord>>(iter: I) -> Self {
        let mut table = ItemTable::default();
        for record in iter {
            table.push(record);
        }
        table
    }
}

/// API identifier for one CPI series (prefix + item code).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct SeriesId(String);

impl SeriesId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One API call's worth of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub series_ids: Vec<SeriesId>,
    pub start_year: i32,
    pub end_year: i32,
}

/// A parsed BLS period code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Period {
    /// `M01`..`M12`.
    Month(u32),
    /// `M13`.
    AnnualAverage,
    /// Semiannual / annual codes such as `S01` or `A01`.
    Other(String),
}

impl Period {
    pub fn parse(code: &str) -> Result<Period, AppError> {
        let code = code.trim();
        let malformed = || AppError::parse(format!("Malformed period code '{code}'."));

        let Some(digits) = code.strip_prefix('M') else {
            let bytes = code.as_bytes();
            let is_other =
                bytes.len() == 3 && bytes[0].is_ascii_uppercase() && bytes[1..].iter().all(u8::is_ascii_digit);
            return if is_other {
                Ok(Period::Other(code.to_string()))
            } else {
                Err(malformed())
            };
        };

        if digits.len() != 2 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        match digits.parse::<u32>().map_err(|_| malformed())? {
            m @ 1..=12 => Ok(Period::Month(m)),
            13 => Ok(Period::AnnualAverage),
            _ => Err(malformed()),
        }
    }
}

/// A calendar month, rendered as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth(NaiveDate);

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(YearMonth)
    }

    /// Parse a `YYYY-MM` string.
    pub fn parse(s: &str) -> Result<Self, AppError> {
        NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d")
            .map(YearMonth)
            .map_err(|e| AppError::parse(format!("Invalid year-month '{s}': {e}")))
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m"))
    }
}

/// One flattened row: a series observation joined with its item name.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRecord {
    pub series_id: SeriesId,
    pub item_name: String,
    pub date: YearMonth,
    pub cpi_value: f64,
    /// Comma-joined footnote text (empty when the point has none).
    pub footnotes: String,
}

/// What to do with period codes that are not a calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PeriodPolicy {
    /// Drop the point and count it in the run summary.
    Skip,
    /// Abort the run with a parse error.
    Reject,
}

/// What to do when the input table repeats an item code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DuplicatePolicy {
    /// Keep the first row's name and log a warning.
    Warn,
    /// Abort with a schema error.
    Fail,
}

/// Which output layout the run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLayout {
    /// `Series_ID,Item_name,Date,CPI_value` for every monthly observation.
    Full { footnotes: bool },
    /// `Series_ID,Date,CPI Value` restricted to one calendar month.
    Month(u32),
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags and environment (plus defaults).
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub start_year: i32,
    pub end_year: i32,
    pub api_key: Option<String>,
    pub api_url: String,
    pub batch_size: usize,
    /// Fixed pause before every API call.
    pub delay: Duration,
    pub timeout: Duration,
    pub period_policy: PeriodPolicy,
    pub duplicate_policy: DuplicatePolicy,
    pub layout: OutputLayout,
}
