//! Terminal run summary.

use crate::app::pipeline::RunOutput;
use crate::data::ChunkStatus;
use crate::domain::{FetchConfig, OutputLayout};

/// Format the end-of-run summary (inputs, chunk outcomes, row counts).
pub fn format_run_summary(run: &RunOutput, config: &FetchConfig) -> String {
    let mut out = String::new();

    out.push_str("=== cpi - BLS CPI fetch ===\n");
    out.push_str(&format!("Years: {}-{}\n", config.start_year, config.end_year));
    if let OutputLayout::Month(m) = config.layout {
        out.push_str(&format!("Month filter: {m:02}\n"));
    }
    out.push_str(&format!(
        "Items: {} | series requested: {} | chunks: {}\n",
        run.items,
        run.series_requested,
        run.chunks.len()
    ));
    out.push_str(&format!(
        "Series returned: {} | rows: {}",
        run.stats.series, run.stats.rows
    ));
    if run.stats.skipped_periods > 0 {
        out.push_str(&format!(" | non-monthly skipped: {}", run.stats.skipped_periods));
    }
    if run.stats.filtered > 0 {
        out.push_str(&format!(" | other months: {}", run.stats.filtered));
    }
    out.push('\n');

    let failed: Vec<_> = run.failed_chunks().collect();
    if !failed.is_empty() {
        out.push_str(&format!("\nFailed chunks ({}):\n", failed.len()));
        for c in failed {
            let ChunkStatus::Failed { status } = &c.status else {
                continue;
            };
            out.push_str(&format!(
                "- chunk {} ({} series): {status} {}\n",
                c.index,
                c.series,
                c.messages.join("; ")
            ));
        }
    }

    let noted: Vec<_> = run
        .chunks
        .iter()
        .filter(|c| c.status == ChunkStatus::Succeeded && !c.messages.is_empty())
        .collect();
    if !noted.is_empty() {
        out.push_str("\nAPI messages:\n");
        for c in noted {
            out.push_str(&format!("- chunk {}: {}\n", c.index, c.messages.join("; ")));
        }
    }

    out.trim_end().to_string()
}
