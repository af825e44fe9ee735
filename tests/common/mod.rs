//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use tempfile::TempDir;

use dumpstate_collector::collectors::modem::Clock;
use dumpstate_collector::config::{ArchiveFormat, CommandSpec, DumpConfig, ToolPaths};
use dumpstate_collector::constants::*;
use dumpstate_collector::properties::MemoryPropertyStore;

/// Clock that never blocks
pub struct InstantClock;

impl Clock for InstantClock {
    fn sleep(&self, _duration: Duration) {}
}

/// A fake device tree: log location, diag log directory and auxiliary logs.
pub struct RadioFixture {
    pub root: TempDir,
}

impl RadioFixture {
    pub fn new() -> Result<Self> {
        let root = TempDir::new()?;
        fs::create_dir_all(root.path().join("radio"))?;
        fs::create_dir_all(root.path().join("diag_logs"))?;
        fs::create_dir_all(root.path().join("aux"))?;

        for name in ["diag_log_001", "diag_log_002", "diag_log_003", "other_file"] {
            fs::write(root.path().join("diag_logs").join(name), format!("{} payload\n", name))?;
        }
        fs::write(root.path().join("aux/ril_log"), "ril\n")?;
        fs::write(root.path().join("aux/ssr_log.txt"), "ssr\n")?;

        Ok(Self { root })
    }

    pub fn log_dir(&self) -> PathBuf {
        self.root.path().join("radio")
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.log_dir().join(MODEM_LOG_STAGING_DIR_NAME)
    }

    pub fn diag_dir(&self) -> PathBuf {
        self.root.path().join("diag_logs")
    }

    /// Defaults rewired to the fixture and to tools found on PATH
    pub fn config(&self, format: ArchiveFormat) -> DumpConfig {
        let mut config = DumpConfig::default();
        config.modem.tools = ToolPaths::from_path();
        config.modem.diag_log_dir = self.diag_dir();
        config.modem.aux_log_files = vec![
            self.root.path().join("aux/ril_log"),
            self.root.path().join("aux/netmgr_log"),
            self.root.path().join("aux/ssr_log.txt"),
        ];
        config.modem.info_commands = vec![CommandSpec::new(
            TITLE_RFS_INFO,
            &["ls", self.diag_dir().to_str().unwrap_or_default()],
        )];
        config.modem.smlog_dump = self.root.path().join("no_smlog_dump");
        config.modem.command_timeout_secs = 30;
        config.modem.archive_format = format;
        config.board.sections = Vec::new();
        config
    }

    /// userdebug build with diag_mdlog enabled and currently stopped
    pub fn props(&self, prefix: &str) -> MemoryPropertyStore {
        MemoryPropertyStore::with_values([
            (MODEM_LOG_LOC_PROPERTY, self.log_dir().to_string_lossy().into_owned()),
            (MODEM_LOG_PREFIX_PROPERTY, prefix.to_string()),
            (BUILD_TYPE_PROPERTY, "userdebug".to_string()),
            (DIAG_MDLOG_PERSIST_PROPERTY, "true".to_string()),
            (DIAG_MDLOG_STATUS_PROPERTY, "false".to_string()),
            (DIAG_MDLOG_NUMBER_BUGREPORT_PROPERTY, "2".to_string()),
        ])
    }
}

/// Member names of a tar stream, via the system tar
pub fn tar_members(bytes: &[u8], scratch: &Path) -> Result<Vec<String>> {
    let path = scratch.join("streamed.tar");
    fs::write(&path, bytes)?;
    let output = std::process::Command::new("tar").arg("-tf").arg(&path).output()?;
    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| line.trim_start_matches("./").to_string())
        .filter(|line| !line.is_empty())
        .collect())
}
