use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::Serialize;

use crate::config::{ArchiveFormat, ModemConfig};
use crate::constants::{
    MODEM_LOG_ARCHIVE_BASENAME, TITLE_ARCHIVE, TITLE_PERMISSIONS, TITLE_REMOVE_ARCHIVE,
    TITLE_REMOVE_STAGING,
};
use crate::models::StepStatus;
use crate::utils::command::{CommandOptions, CommandRunner};
use crate::utils::compress::{make_world_read_writable, zip_directory};
use crate::utils::hash::sha256_file;
use crate::utils::stream::{stream_chunks, StreamReport};

/// Archive creation and streaming outcome.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ArchiveReport {
    pub archive_path: PathBuf,
    pub archive: StepStatus,
    pub permissions: StepStatus,
    pub sha256: Option<String>,
    /// Set when the archive could not be opened for streaming
    pub open_error: Option<String>,
    pub stream: Option<StreamReport>,
}

impl ArchiveReport {
    pub fn bytes_written(&self) -> u64 {
        self.stream.as_ref().map_or(0, |s| s.bytes_written)
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    pub staging: StepStatus,
    pub archive: StepStatus,
}

/// Bundles the staging directory into one archive and copies it into the
/// caller's modem channel.
pub struct ArchiveStreamer<'a> {
    runner: &'a dyn CommandRunner,
    config: &'a ModemConfig,
    options: CommandOptions,
}

impl<'a> ArchiveStreamer<'a> {
    pub fn new(runner: &'a dyn CommandRunner, config: &'a ModemConfig) -> Self {
        Self {
            runner,
            config,
            options: config.command_options(),
        }
    }

    /// `<log_dir>/<prefix>all.<ext>`
    pub fn archive_path(log_dir: &Path, prefix: &str, format: ArchiveFormat) -> PathBuf {
        log_dir.join(format!("{}{}.{}", prefix, MODEM_LOG_ARCHIVE_BASENAME, format.extension()))
    }

    /// Create the archive and open its permissions up for the host service.
    pub fn archive(&self, staging_dir: &Path, archive_path: &Path, sink: &mut dyn Write) -> (StepStatus, StepStatus) {
        match self.config.archive_format {
            ArchiveFormat::Tar => {
                let archive_str = archive_path.to_string_lossy().into_owned();
                let tar = vec![
                    self.config.tools.tar.clone(),
                    "cvf".to_string(),
                    archive_str.clone(),
                    "-C".to_string(),
                    staging_dir.to_string_lossy().into_owned(),
                    ".".to_string(),
                ];
                let archived = self.runner.run(TITLE_ARCHIVE, &tar, &self.options, sink);

                let chmod = vec![self.config.tools.chmod.clone(), "a+rw".to_string(), archive_str];
                let permissions = self.runner.run(TITLE_PERMISSIONS, &chmod, &self.options, sink);

                (archived, permissions)
            }
            ArchiveFormat::Zip => {
                let archived = match zip_directory(staging_dir, archive_path) {
                    Ok(_) => StepStatus::Completed,
                    Err(e) => {
                        warn!("{:#}", e);
                        StepStatus::error(format!("{:#}", e))
                    }
                };
                let permissions = match make_world_read_writable(archive_path) {
                    Ok(()) => StepStatus::Completed,
                    Err(e) => {
                        warn!("{:#}", e);
                        StepStatus::error(format!("{:#}", e))
                    }
                };
                (archived, permissions)
            }
        }
    }

    /// Copy the archive into `channel` in fixed-size chunks.
    pub fn stream(&self, archive_path: &Path, channel: &mut dyn Write) -> Result<StreamReport, std::io::Error> {
        let mut archive = open_nonblocking(archive_path)?;
        let report = stream_chunks(&mut archive, channel, self.config.stream_chunk_size);

        if report.is_complete() {
            info!("Streamed {} bytes of {} to the modem channel", report.bytes_written, archive_path.display());
        } else {
            warn!(
                "Modem log stream incomplete after {} bytes: {:?}",
                report.bytes_written, report.outcome
            );
        }
        Ok(report)
    }

    /// Archive `staging_dir` to `archive_path`, then stream the result into
    /// `channel`. Command output goes to `sink`. An archive that cannot be
    /// opened streams nothing.
    pub fn archive_and_stream(
        &self,
        staging_dir: &Path,
        archive_path: &Path,
        channel: &mut dyn Write,
        sink: &mut dyn Write,
    ) -> ArchiveReport {
        let (archive, permissions) = self.archive(staging_dir, archive_path, sink);

        let sha256 = match sha256_file(archive_path) {
            Ok(digest) => Some(digest),
            Err(e) => {
                debug!("Cannot hash {}: {}", archive_path.display(), e);
                None
            }
        };

        let (stream, open_error) = match self.stream(archive_path, channel) {
            Ok(report) => (Some(report), None),
            Err(e) => {
                warn!("Cannot open {} for streaming: {}", archive_path.display(), e);
                (None, Some(e.to_string()))
            }
        };

        ArchiveReport {
            archive_path: archive_path.to_path_buf(),
            archive,
            permissions,
            sha256,
            open_error,
            stream,
        }
    }

    /// Remove the staging tree and the archive. Failures are logged only.
    pub fn cleanup(&self, staging_dir: &Path, archive_path: &Path, sink: &mut dyn Write) -> CleanupReport {
        let rm_staging = vec![
            self.config.tools.rm.clone(),
            "-r".to_string(),
            staging_dir.to_string_lossy().into_owned(),
        ];
        let staging = self.runner.run(TITLE_REMOVE_STAGING, &rm_staging, &self.options, sink);

        let rm_archive = vec![self.config.tools.rm.clone(), archive_path.to_string_lossy().into_owned()];
        let archive = self.runner.run(TITLE_REMOVE_ARCHIVE, &rm_archive, &self.options, sink);

        if !staging.is_success() || !archive.is_success() {
            warn!("Modem log cleanup incomplete: staging {}, archive {}", staging, archive);
        }

        CleanupReport { staging, archive }
    }
}

#[cfg(unix)]
fn open_nonblocking(path: &Path) -> std::io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;

    // std already sets O_CLOEXEC
    OpenOptions::new()
        .read(true)
        .custom_flags(libc::O_NONBLOCK)
        .open(path)
}

#[cfg(not(unix))]
fn open_nonblocking(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().read(true).open(path)
}
