//! Write flattened CPI rows to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::OutputRecord;
use crate::error::AppError;

const FULL_HEADER: [&str; 4] = ["Series_ID", "Item_name", "Date", "CPI_value"];
const MONTH_HEADER: [&str; 3] = ["Series_ID", "Date", "CPI Value"];

/// Write every record with its item name (the primary layout).
pub fn write_records_csv(path: &Path, records: &[OutputRecord], footnotes: bool) -> Result<(), AppError> {
    let file = create(path)?;
    write_records(file, records, footnotes)
}

/// Write the single-month layout (no item name column).
pub fn write_month_csv(path: &Path, records: &[OutputRecord]) -> Result<(), AppError> {
    let file = create(path)?;
    write_month(file, records)
}

pub fn write_records<W: Write>(sink: W, records: &[OutputRecord], footnotes: bool) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(sink);

    let mut header: Vec<&str> = FULL_HEADER.to_vec();
    if footnotes {
        header.push("Footnotes");
    }
    writer
        .write_record(&header)
        .map_err(|e| AppError::io(format!("Failed to write CSV header: {e}")))?;

    for r in records {
        let date = r.date.to_string();
        let value = format_value(r.cpi_value);
        let mut row = vec![r.series_id.as_str(), r.item_name.as_str(), date.as_str(), value.as_str()];
        if footnotes {
            row.push(r.footnotes.as_str());
        }
        writer
            .write_record(&row)
            .map_err(|e| AppError::io(format!("Failed to write CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::io(format!("Failed to flush CSV: {e}")))
}

pub fn write_month<W: Write>(sink: W, records: &[OutputRecord]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(sink);
    writer
        .write_record(MONTH_HEADER)
        .map_err(|e| AppError::io(format!("Failed to write CSV header: {e}")))?;

    for r in records {
        writer
            .write_record([r.series_id.to_string(), r.date.to_string(), format_value(r.cpi_value)])
            .map_err(|e| AppError::io(format!("Failed to write CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::io(format!("Failed to flush CSV: {e}")))
}

/// Whole values keep one decimal (`300.0`), so the column always reads as numeric.
fn format_value(value: f64) -> String {
    format!("{value:?}")
}

fn create(path: &Path) -> Result<File, AppError> {
    File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create output CSV '{}': {e}", path.display())))
}
