//! Flat list of board file and command dumps written to the main report.

use std::io::Write;
use std::path::PathBuf;

use lazy_static::lazy_static;
use log::{debug, info};
use regex::{Captures, Regex};
use serde::Serialize;

use crate::config::{BoardConfig, BoardSection};
use crate::models::StepStatus;
use crate::properties::PropertyStore;
use crate::utils::command::CommandRunner;
use crate::utils::dump_file::{dump_file, is_readable};

lazy_static! {
    /// `${property.name}` placeholders in section argv
    static ref PROPERTY_PLACEHOLDER: Regex = Regex::new(r"\$\{([A-Za-z0-9._-]+)\}").unwrap();
}

/// How a single board section ended.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SectionOutcome {
    Dumped,
    /// The file could not be opened; nothing was written
    Unreadable,
    GuardNotReadable { path: String },
    PropertyUnset { key: String },
    Command(StepStatus),
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SectionReport {
    pub title: String,
    #[serde(flatten)]
    pub outcome: SectionOutcome,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardReport {
    pub sections: Vec<SectionReport>,
}

impl BoardReport {
    pub fn dumped_count(&self) -> usize {
        self.sections
            .iter()
            .filter(|s| matches!(s.outcome, SectionOutcome::Dumped | SectionOutcome::Command(StepStatus::Completed)))
            .count()
    }
}

/// Replace every `${key}` in `template` with the property value (empty when unset).
pub fn expand_properties(template: &str, props: &dyn PropertyStore) -> String {
    PROPERTY_PLACEHOLDER
        .replace_all(template, |caps: &Captures| props.get_string(&caps[1], ""))
        .into_owned()
}

/// Runs the configured board sections in order.
pub struct BoardDumper<'a> {
    config: &'a BoardConfig,
    props: &'a dyn PropertyStore,
    runner: &'a dyn CommandRunner,
}

impl<'a> BoardDumper<'a> {
    pub fn new(config: &'a BoardConfig, props: &'a dyn PropertyStore, runner: &'a dyn CommandRunner) -> Self {
        Self { config, props, runner }
    }

    fn guard(only_if_readable: &Option<PathBuf>) -> Option<SectionOutcome> {
        match only_if_readable {
            Some(path) if !is_readable(path) => Some(SectionOutcome::GuardNotReadable {
                path: path.display().to_string(),
            }),
            _ => None,
        }
    }

    fn run_section(&self, section: &BoardSection, sink: &mut dyn Write) -> SectionOutcome {
        match section {
            BoardSection::File { title, path, only_if_readable } => {
                if let Some(skipped) = Self::guard(only_if_readable) {
                    return skipped;
                }
                if dump_file(sink, title, path) {
                    SectionOutcome::Dumped
                } else {
                    SectionOutcome::Unreadable
                }
            }
            BoardSection::Command { title, argv, requires_property, only_if_readable } => {
                if let Some(key) = requires_property {
                    if self.props.get_string(key, "").is_empty() {
                        return SectionOutcome::PropertyUnset { key: key.clone() };
                    }
                }
                if let Some(skipped) = Self::guard(only_if_readable) {
                    return skipped;
                }

                let argv: Vec<String> = argv.iter().map(|arg| expand_properties(arg, self.props)).collect();
                SectionOutcome::Command(self.runner.run(title, &argv, &self.config.command_options(), sink))
            }
        }
    }

    /// Dump every section into `sink`. Nothing here fails the caller.
    pub fn dump(&self, sink: &mut dyn Write) -> BoardReport {
        let mut report = BoardReport::default();

        for section in &self.config.sections {
            let outcome = self.run_section(section, sink);
            debug!("{}: {:?}", section.title(), outcome);
            report.sections.push(SectionReport {
                title: section.title().to_string(),
                outcome,
            });
        }

        info!(
            "Board dump finished: {}/{} sections produced output",
            report.dumped_count(),
            report.sections.len()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::MemoryPropertyStore;
    use crate::test_utils::RecordingRunner;
    use std::fs;
    use tempfile::TempDir;

    fn board(sections: Vec<BoardSection>) -> BoardConfig {
        BoardConfig {
            command_timeout_secs: 10,
            sections,
        }
    }

    #[test]
    fn test_expand_properties() {
        let props = MemoryPropertyStore::with_values([("ro.boot.bootdevice", "1d84000.ufshc")]);

        assert_eq!(
            expand_properties("find /sys/devices/platform/soc/${ro.boot.bootdevice}/health", &props),
            "find /sys/devices/platform/soc/1d84000.ufshc/health"
        );
        assert_eq!(expand_properties("echo ${unset.key}!", &props), "echo !");
        assert_eq!(expand_properties("$HOME ${", &props), "$HOME ${");
    }

    #[test]
    fn test_files_are_dumped_in_order_and_missing_files_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("online"), "0-7\n").unwrap();
        fs::write(dir.path().join("serial"), "12345\n").unwrap();

        let config = board(vec![
            BoardSection::file("SoC serial number", dir.path().join("serial").to_str().unwrap()),
            BoardSection::file("F2FS", "/nonexistent/f2fs/status"),
            BoardSection::file("CPU online", dir.path().join("online").to_str().unwrap()),
        ]);
        let props = MemoryPropertyStore::new();
        let runner = RecordingRunner::new();
        let mut sink = Vec::new();

        let report = BoardDumper::new(&config, &props, &runner).dump(&mut sink);

        let outcomes: Vec<_> = report.sections.iter().map(|s| s.outcome.clone()).collect();
        assert_eq!(outcomes, vec![SectionOutcome::Dumped, SectionOutcome::Unreadable, SectionOutcome::Dumped]);
        assert_eq!(report.dumped_count(), 2);

        let output = String::from_utf8(sink).unwrap();
        let serial = output.find("12345").unwrap();
        let online = output.find("0-7").unwrap();
        assert!(serial < online);
        assert!(!output.contains("F2FS"));
    }

    #[test]
    fn test_required_property_gates_and_substitutes() {
        let config = board(vec![BoardSection::Command {
            title: "UFS health".to_string(),
            argv: vec!["sh".to_string(), "-c".to_string(), "ls /soc/${ro.boot.bootdevice}/health".to_string()],
            requires_property: Some("ro.boot.bootdevice".to_string()),
            only_if_readable: None,
        }]);
        let props = MemoryPropertyStore::new();
        let runner = RecordingRunner::new();
        let mut sink = Vec::new();

        let report = BoardDumper::new(&config, &props, &runner).dump(&mut sink);
        assert_eq!(
            report.sections[0].outcome,
            SectionOutcome::PropertyUnset { key: "ro.boot.bootdevice".to_string() }
        );
        assert!(runner.calls().is_empty());

        props.set("ro.boot.bootdevice", "1d84000.ufshc").unwrap();
        let report = BoardDumper::new(&config, &props, &runner).dump(&mut sink);

        assert_eq!(report.sections[0].outcome, SectionOutcome::Command(StepStatus::Completed));
        assert_eq!(runner.calls()[0].argv[2], "ls /soc/1d84000.ufshc/health");
    }

    #[test]
    fn test_readability_guard() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("vendor"), "synaptics\n").unwrap();

        let config = board(vec![
            BoardSection::File {
                title: "Synaptics touch firmware version".to_string(),
                path: dir.path().join("vendor"),
                only_if_readable: Some(dir.path().to_path_buf()),
            },
            BoardSection::File {
                title: "STM touch firmware config".to_string(),
                path: PathBuf::from("/nonexistent/ftm4_touch/version"),
                only_if_readable: Some(PathBuf::from("/nonexistent/ftm4_touch")),
            },
        ]);
        let props = MemoryPropertyStore::new();
        let runner = RecordingRunner::new();
        let mut sink = Vec::new();

        let report = BoardDumper::new(&config, &props, &runner).dump(&mut sink);

        assert_eq!(report.sections[0].outcome, SectionOutcome::Dumped);
        assert_eq!(
            report.sections[1].outcome,
            SectionOutcome::GuardNotReadable { path: "/nonexistent/ftm4_touch".to_string() }
        );
    }

    #[test]
    fn test_report_serializes_flat() {
        let report = SectionReport {
            title: "QSEE logs".to_string(),
            outcome: SectionOutcome::PropertyUnset { key: "k".to_string() },
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["title"], "QSEE logs");
        assert_eq!(json["outcome"], "property_unset");
        assert_eq!(json["key"], "k");
    }
}
