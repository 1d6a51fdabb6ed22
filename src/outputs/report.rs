//! JSON run summary written next to the spreadsheet.
//!
//! Every run, successful or not, leaves `run_report.json` in the output
//! directory with the counts, the termination reason and the records that
//! were persisted.

use crate::error::Result;
use crate::models::RunReport;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

pub const REPORT_FILE: &str = "run_report.json";

/// Serialize `report` to `{output_dir}/run_report.json`, replacing any
/// previous report.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display()))]
pub async fn write_report(report: &RunReport, output_dir: &Path) -> Result<PathBuf> {
    let json = serde_json::to_string_pretty(report).map_err(std::io::Error::from)?;
    fs::create_dir_all(output_dir).await?;
    let path = output_dir.join(REPORT_FILE);
    fs::write(&path, json).await?;
    info!(path = %path.display(), records = report.records.len(), "Wrote run report");
    Ok(path)
}
