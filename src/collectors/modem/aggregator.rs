use std::io::Write;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::Serialize;

use crate::constants::TITLE_COPY_MODEM_LOG;
use crate::utils::command::{CommandOptions, CommandRunner};

#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateReport {
    pub copied: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

/// Copies the fixed list of auxiliary radio logs next to the diag logs.
pub struct LogAggregator<'a> {
    runner: &'a dyn CommandRunner,
    cp_tool: &'a str,
    options: CommandOptions,
}

impl<'a> LogAggregator<'a> {
    pub fn new(runner: &'a dyn CommandRunner, cp_tool: &'a str, options: CommandOptions) -> Self {
        Self { runner, cp_tool, options }
    }

    /// Copy each file into `dest_dir`. Missing files and failed copies are
    /// recorded and skipped; the batch always runs to the end.
    pub fn collect(&self, dest_dir: &Path, files: &[PathBuf], sink: &mut dyn Write) -> AggregateReport {
        let mut report = AggregateReport::default();

        for file in files {
            let argv = vec![
                self.cp_tool.to_string(),
                file.to_string_lossy().into_owned(),
                dest_dir.to_string_lossy().into_owned(),
            ];

            let status = self.runner.run(TITLE_COPY_MODEM_LOG, &argv, &self.options, sink);
            if status.is_success() {
                report.copied.push(file.clone());
            } else {
                warn!("Failed to copy {}: {}", file.display(), status);
                report.failed.push(file.clone());
            }
        }

        info!("Copied {}/{} auxiliary modem logs", report.copied.len(), files.len());
        report
    }
}
