use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use serde::Serialize;

/// Serialize a run report as pretty JSON.
pub fn render_summary<T: Serialize>(report: &T) -> Result<String> {
    serde_json::to_string_pretty(report).context("Failed to serialize run summary")
}

/// Write the run summary next to the host's bug report artifacts.
pub fn write_summary<T: Serialize>(path: &Path, report: &T) -> Result<()> {
    let json = render_summary(report)?;
    fs::write(path, json).context(format!("Failed to write run summary to {}", path.display()))?;
    info!("Run summary written to {}", path.display());
    Ok(())
}
