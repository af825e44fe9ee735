use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::{debug, info};
use serde::Serialize;
use uuid::Uuid;

use crate::config::ModemConfig;
use crate::constants::{
    MODEM_LOGGING_SWITCH_PROPERTY, MODEM_LOG_LOC_PROPERTY, MODEM_LOG_PREFIX_PROPERTY,
    MODEM_LOG_STAGING_DIR_NAME, TITLE_MKDIR, TITLE_SMLOG_DUMP,
};
use crate::models::StepStatus;
use crate::properties::{is_user_build, PropertyStore};
use crate::utils::command::CommandRunner;

use super::aggregator::{AggregateReport, LogAggregator};
use super::archive::{ArchiveReport, ArchiveStreamer, CleanupReport};
use super::diag_logger::{Clock, DiagLoggerController, StopReport};
use super::scanner::{RetentionFilteringScanner, RetentionPolicy, ScanReport};

/// Why the pipeline did or did not run.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GateDecision {
    Proceed,
    NoLogLocation,
    UserBuild,
}

/// Which log source fed the staging directory.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CollectionBranch {
    Smlog,
    DiagLogs,
    /// Neither smlog nor diag_mdlog enabled; only the auxiliary logs are bundled
    AuxiliaryOnly,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TitledStatus {
    pub title: String,
    pub status: StepStatus,
}

/// Everything one modem dump did, step by step.
#[derive(Serialize, Debug, Clone)]
pub struct ModemDumpReport {
    pub run_id: String,
    pub started_at: String,
    pub finished_at: String,
    pub gate: GateDecision,
    pub log_dir: Option<PathBuf>,
    pub staging_dir: Option<PathBuf>,
    pub info_commands: Vec<TitledStatus>,
    pub staging: Option<StepStatus>,
    pub branch: Option<CollectionBranch>,
    pub smlog: Option<StepStatus>,
    pub diag_stop: Option<StopReport>,
    pub scan: Option<ScanReport>,
    pub diag_restored: bool,
    pub aggregate: Option<AggregateReport>,
    /// Set when the archive prefix is empty; staged files stay on disk
    pub archive_skipped: bool,
    pub archive: Option<ArchiveReport>,
    pub cleanup: Option<CleanupReport>,
}

impl ModemDumpReport {
    fn started(gate: GateDecision) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            started_at: Utc::now().to_rfc3339(),
            finished_at: String::new(),
            gate,
            log_dir: None,
            staging_dir: None,
            info_commands: Vec::new(),
            staging: None,
            branch: None,
            smlog: None,
            diag_stop: None,
            scan: None,
            diag_restored: false,
            aggregate: None,
            archive_skipped: false,
            archive: None,
            cleanup: None,
        }
    }

    fn finish(mut self) -> Self {
        self.finished_at = Utc::now().to_rfc3339();
        self
    }

    /// Bytes delivered to the modem channel
    pub fn bytes_streamed(&self) -> u64 {
        self.archive.as_ref().map_or(0, |a| a.bytes_written())
    }
}

/// Gathers modem logs into a staging directory, archives them and streams
/// the archive into the modem channel.
pub struct ModemLogPipeline<'a> {
    config: &'a ModemConfig,
    props: &'a dyn PropertyStore,
    runner: &'a dyn CommandRunner,
    clock: &'a dyn Clock,
}

impl<'a> ModemLogPipeline<'a> {
    pub fn new(
        config: &'a ModemConfig,
        props: &'a dyn PropertyStore,
        runner: &'a dyn CommandRunner,
        clock: &'a dyn Clock,
    ) -> Self {
        Self { config, props, runner, clock }
    }

    fn gate(&self) -> (GateDecision, Option<PathBuf>) {
        let log_dir = self.props.get_string(MODEM_LOG_LOC_PROPERTY, "");
        if log_dir.is_empty() {
            return (GateDecision::NoLogLocation, None);
        }
        if is_user_build(self.props) {
            return (GateDecision::UserBuild, Some(PathBuf::from(log_dir)));
        }
        (GateDecision::Proceed, Some(PathBuf::from(log_dir)))
    }

    fn branch(&self) -> CollectionBranch {
        if self.props.get_bool(MODEM_LOGGING_SWITCH_PROPERTY, false) && is_executable(&self.config.smlog_dump) {
            CollectionBranch::Smlog
        } else if DiagLoggerController::new(self.props, self.clock).is_enabled() {
            CollectionBranch::DiagLogs
        } else {
            CollectionBranch::AuxiliaryOnly
        }
    }

    /// Run the whole pipeline. Command output goes to `report`, the archive
    /// bytes go to `channel`. Every step is best-effort.
    pub fn run(&self, report: &mut dyn Write, channel: &mut dyn Write) -> ModemDumpReport {
        let (gate, log_dir) = self.gate();
        let mut result = ModemDumpReport::started(gate);
        result.log_dir = log_dir.clone();

        let log_dir = match (gate, log_dir) {
            (GateDecision::Proceed, Some(dir)) => dir,
            (GateDecision::NoLogLocation, _) => {
                debug!("No modem log place is set");
                return result.finish();
            }
            _ => {
                info!("User build, skipping modem log collection");
                return result.finish();
            }
        };

        info!("Collecting modem logs under {}", log_dir.display());
        let options = self.config.command_options();

        for command in &self.config.info_commands {
            let status = self.runner.run(&command.title, &command.argv, &options, report);
            result.info_commands.push(TitledStatus {
                title: command.title.clone(),
                status,
            });
        }

        let staging_dir = log_dir.join(MODEM_LOG_STAGING_DIR_NAME);
        result.staging_dir = Some(staging_dir.clone());
        let mkdir = vec![
            self.config.tools.mkdir.clone(),
            "-p".to_string(),
            staging_dir.to_string_lossy().into_owned(),
        ];
        result.staging = Some(self.runner.run(TITLE_MKDIR, &mkdir, &options, report));

        let branch = self.branch();
        result.branch = Some(branch);
        info!("Modem log source: {:?}", branch);

        let mut diag_logger = DiagLoggerController::new(self.props, self.clock);
        match branch {
            CollectionBranch::Smlog => {
                let smlog = vec![
                    self.config.smlog_dump.to_string_lossy().into_owned(),
                    "-d".to_string(),
                    "-o".to_string(),
                    staging_dir.to_string_lossy().into_owned(),
                ];
                result.smlog = Some(self.runner.run(TITLE_SMLOG_DUMP, &smlog, &options, report));
            }
            CollectionBranch::DiagLogs => {
                result.diag_stop = Some(diag_logger.stop_and_wait(self.config.quiesce_poll_budget));

                let scanner = RetentionFilteringScanner::new(self.runner, &self.config.tools.cp, options.clone());
                result.scan = Some(scanner.collect(
                    &self.config.diag_log_dir,
                    &staging_dir,
                    &self.config.diag_log_prefix,
                    RetentionPolicy::from_properties(self.props),
                    report,
                ));
            }
            CollectionBranch::AuxiliaryOnly => {}
        }

        let aggregator = LogAggregator::new(self.runner, &self.config.tools.cp, options);
        result.aggregate = Some(aggregator.collect(&staging_dir, &self.config.aux_log_files, report));

        if let Some(stop) = &result.diag_stop {
            result.diag_restored = diag_logger.restore(stop.was_running);
        }

        let prefix = self.props.get_string(MODEM_LOG_PREFIX_PROPERTY, "");
        if prefix.is_empty() {
            info!("No modem log prefix set, leaving {} in place", staging_dir.display());
            result.archive_skipped = true;
            return result.finish();
        }

        let streamer = ArchiveStreamer::new(self.runner, self.config);
        let archive_path = ArchiveStreamer::archive_path(&log_dir, &prefix, self.config.archive_format);
        result.archive = Some(streamer.archive_and_stream(&staging_dir, &archive_path, channel, report));
        result.cleanup = Some(streamer.cleanup(&staging_dir, &archive_path, report));

        info!("Modem log collection finished, {} bytes streamed", result.bytes_streamed());
        result.finish()
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
