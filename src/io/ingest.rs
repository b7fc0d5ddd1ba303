//! Item table ingest.
//!
//! Turns the `item_code,item_name` CSV into an `ItemTable`. The schema is
//! strict: both columns must exist and every row needs a code. Extra columns
//! are ignored.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use tracing::{info, warn};

use crate::domain::{DuplicatePolicy, ItemRecord, ItemTable};
use crate::error::{AppError, ErrorKind};

const COL_CODE: &str = "item_code";
const COL_NAME: &str = "item_name";

/// Load the item table from a CSV file.
pub fn load_items(path: &Path, duplicates: DuplicatePolicy) -> Result<ItemTable, AppError> {
    let file = File::open(path).map_err(|e| {
        let kind = if e.kind() == std::io::ErrorKind::NotFound {
            ErrorKind::NotFound
        } else {
            ErrorKind::Io
        };
        AppError::new(kind, format!("Failed to open item CSV '{}': {e}", path.display()))
    })?;

    let table = read_items(file, duplicates)?;
    info!(path = %path.display(), items = table.len(), "loaded item table");
    Ok(table)
}

/// Parse an item table from any reader (file, in-memory buffer).
pub fn read_items<R: Read>(source: R, duplicates: DuplicatePolicy) -> Result<ItemTable, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| AppError::schema(format!("Failed to read item CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    let code_idx = *header_map
        .get(COL_CODE)
        .ok_or_else(|| AppError::schema(format!("Missing required column: `{COL_CODE}`")))?;
    let name_idx = *header_map
        .get(COL_NAME)
        .ok_or_else(|| AppError::schema(format!("Missing required column: `{COL_NAME}`")))?;

    let mut table = ItemTable::default();
    for (idx, result) in reader.records().enumerate() {
        // records() starts after the header, and lines are 1-based.
        let line = idx + 2;
        let record =
            result.map_err(|e| AppError::schema(format!("Item CSV parse error on line {line}: {e}")))?;

        let item_code = field(&record, code_idx);
        if item_code.is_empty() {
            return Err(AppError::schema(format!(
                "Missing required value `{COL_CODE}` on line {line}."
            )));
        }
        let item_name = field(&record, name_idx);

        let record = ItemRecord {
            item_code: item_code.to_string(),
            item_name: item_name.to_string(),
        };
        if let Some(first) = table.push(record) {
            match duplicates {
                DuplicatePolicy::Warn => warn!(
                    code = %first.item_code,
                    line,
                    kept = %first.item_name,
                    "duplicate item code; keeping the first name"
                ),
                DuplicatePolicy::Fail => {
                    return Err(AppError::schema(format!(
                        "Duplicate item code '{}' on line {line}.",
                        first.item_code
                    )));
                }
            }
        }
    }

    if table.is_empty() {
        return Err(AppError::schema("Item CSV contains no items."));
    }
    Ok(table)
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn field(record: &StringRecord, idx: usize) -> &str {
    record.get(idx).map(str::trim).unwrap_or("")
}
