use std::fs;
use std::io::Write;
use std::path::Path;

use log::{debug, info, warn};
use serde::Serialize;

use crate::constants::{
    DEFAULT_DIAG_LOG_MAX_FILES, DIAG_MDLOG_NUMBER_BUGREPORT_PROPERTY, TITLE_COPY_DIAG_LOG,
    UNLIMITED_DIAG_LOG_FILES,
};
use crate::properties::PropertyStore;
use crate::utils::command::{CommandOptions, CommandRunner};

/// Most-recent-N retention cap for diag logs.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    max_files: i32,
}

impl RetentionPolicy {
    pub fn new(max_files: i32) -> Self {
        Self { max_files }
    }

    pub fn unlimited() -> Self {
        Self::new(UNLIMITED_DIAG_LOG_FILES)
    }

    /// Read the cap from the bug report property, defaulting to 100.
    pub fn from_properties(props: &dyn PropertyStore) -> Self {
        let value = props.get_int(
            DIAG_MDLOG_NUMBER_BUGREPORT_PROPERTY,
            i64::from(DEFAULT_DIAG_LOG_MAX_FILES),
        );
        // Out-of-range values clamp so they keep their sign
        Self::new(value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32)
    }

    pub fn max_files(&self) -> i32 {
        self.max_files
    }

    pub fn is_unlimited(&self) -> bool {
        self.max_files == UNLIMITED_DIAG_LOG_FILES
    }

    /// Whether another entry may be taken after `taken` have been.
    pub fn admits(&self, taken: usize) -> bool {
        if self.is_unlimited() {
            return true;
        }
        // Other negative caps admit nothing
        usize::try_from(self.max_files).map_or(false, |max| taken < max)
    }
}

/// Entries chosen from a directory listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Prefix matches within the cap, newest-named first
    pub selected: Vec<String>,
    /// Prefix matches beyond the cap
    pub over_cap: Vec<String>,
}

/// Order names newest-named first, drop non-matching names, apply the cap.
pub fn select_diag_logs(mut names: Vec<String>, prefix: &str, policy: RetentionPolicy) -> Selection {
    names.sort();

    let mut selection = Selection::default();
    for name in names.into_iter().rev() {
        debug!("Found {}", name);

        if !name.starts_with(prefix) {
            continue;
        }

        if policy.admits(selection.selected.len()) {
            selection.selected.push(name);
        } else {
            debug!("Skipped {}", name);
            selection.over_cap.push(name);
        }
    }

    selection
}

/// What a scan did.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub directory_readable: bool,
    pub entries_found: usize,
    pub copied: Vec<String>,
    pub failed: Vec<String>,
    pub over_cap: Vec<String>,
}

impl ScanReport {
    pub fn copied_count(&self) -> usize {
        self.copied.len()
    }
}

/// Copies the newest diag logs out of the daemon's log directory.
pub struct RetentionFilteringScanner<'a> {
    runner: &'a dyn CommandRunner,
    cp_tool: &'a str,
    options: CommandOptions,
}

impl<'a> RetentionFilteringScanner<'a> {
    pub fn new(runner: &'a dyn CommandRunner, cp_tool: &'a str, options: CommandOptions) -> Self {
        Self { runner, cp_tool, options }
    }

    /// Copy at most `policy` prefix-matching entries from `source_dir` into
    /// `dest_dir`. An unreadable source yields an empty report. A failed copy
    /// still uses up its retention slot.
    pub fn collect(
        &self,
        source_dir: &Path,
        dest_dir: &Path,
        prefix: &str,
        policy: RetentionPolicy,
        sink: &mut dyn Write,
    ) -> ScanReport {
        let names = match list_entry_names(source_dir) {
            Ok(names) => names,
            Err(e) => {
                debug!("Cannot scan {}: {}", source_dir.display(), e);
                return ScanReport::default();
            }
        };

        let mut report = ScanReport {
            directory_readable: true,
            entries_found: names.len(),
            ..ScanReport::default()
        };

        let selection = select_diag_logs(names, prefix, policy);
        report.over_cap = selection.over_cap;

        for name in selection.selected {
            let source = source_dir.join(&name);
            let dest = dest_dir.join(&name);
            debug!("Copying {} to {}", source.display(), dest.display());

            let argv = vec![
                self.cp_tool.to_string(),
                source.to_string_lossy().into_owned(),
                dest.to_string_lossy().into_owned(),
            ];

            let status = self.runner.run(TITLE_COPY_DIAG_LOG, &argv, &self.options, sink);
            if status.is_success() {
                report.copied.push(name);
            } else {
                warn!("Failed to copy {}: {}", source.display(), status);
                report.failed.push(name);
            }
        }

        info!(
            "Collected {} diag logs from {} ({} failed, {} over retention cap {})",
            report.copied.len(),
            source_dir.display(),
            report.failed.len(),
            report.over_cap.len(),
            policy.max_files()
        );
        report
    }
}

fn list_entry_names(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(raw) => debug!("Ignoring non UTF-8 entry {:?}", raw),
        }
    }
    Ok(names)
}
