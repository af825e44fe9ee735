use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::utils::command::CommandOptions;

/// Archive container written for the modem log bundle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveFormat {
    /// `tar cvf` run as an external command
    #[default]
    Tar,
    /// ZIP written in-process
    Zip,
}

impl ArchiveFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveFormat::Tar => "tar",
            ArchiveFormat::Zip => "zip",
        }
    }
}

/// Vendor tool locations used by the modem pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ToolPaths {
    pub cp: String,
    pub tar: String,
    pub chmod: String,
    pub rm: String,
    pub mkdir: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            cp: "/vendor/bin/cp".to_string(),
            tar: "/vendor/bin/tar".to_string(),
            chmod: "/vendor/bin/chmod".to_string(),
            rm: "/vendor/bin/rm".to_string(),
            mkdir: "/vendor/bin/mkdir".to_string(),
        }
    }
}

impl ToolPaths {
    /// Resolve every tool through `PATH`. Handy off-device.
    pub fn from_path() -> Self {
        Self {
            cp: "cp".to_string(),
            tar: "tar".to_string(),
            chmod: "chmod".to_string(),
            rm: "rm".to_string(),
            mkdir: "mkdir".to_string(),
        }
    }
}

/// A titled command whose output goes into the main report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandSpec {
    pub title: String,
    pub argv: Vec<String>,
}

impl CommandSpec {
    pub fn new(title: &str, argv: &[&str]) -> Self {
        Self {
            title: title.to_string(),
            argv: argv.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Modem log pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ModemConfig {
    pub tools: ToolPaths,
    /// Where diag_mdlog writes its rotating logs
    pub diag_log_dir: PathBuf,
    /// Only entries starting with this prefix are collected
    pub diag_log_prefix: String,
    /// Auxiliary logs copied into every bundle
    pub aux_log_files: Vec<PathBuf>,
    /// Informational commands dumped into the main report before collection
    pub info_commands: Vec<CommandSpec>,
    /// smlog dump tool; its presence selects the smlog path
    pub smlog_dump: PathBuf,
    pub command_timeout_secs: u64,
    /// Number of one-second status polls while waiting for diag_mdlog to stop
    pub quiesce_poll_budget: u32,
    pub stream_chunk_size: usize,
    pub archive_format: ArchiveFormat,
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            tools: ToolPaths::default(),
            diag_log_dir: PathBuf::from(DEFAULT_DIAG_LOG_DIR),
            diag_log_prefix: DIAG_LOG_PREFIX.to_string(),
            aux_log_files: DEFAULT_AUX_MODEM_LOGS.iter().map(PathBuf::from).collect(),
            info_commands: vec![
                CommandSpec::new(TITLE_RFS_INFO, &["/vendor/bin/find", DEFAULT_RFS_INFO_DIR]),
                CommandSpec::new(
                    TITLE_DIAG_PROPERTIES,
                    &[VENDOR_SHELL, "-c", "getprop | grep vendor.sys.modem.diag"],
                ),
            ],
            smlog_dump: PathBuf::from(DEFAULT_SMLOG_DUMP_PATH),
            command_timeout_secs: MODEM_COMMAND_TIMEOUT_SECS,
            quiesce_poll_budget: DIAG_QUIESCE_POLL_BUDGET,
            stream_chunk_size: MODEM_LOG_STREAM_CHUNK_SIZE,
            archive_format: ArchiveFormat::Tar,
        }
    }
}

impl ModemConfig {
    pub fn command_options(&self) -> CommandOptions {
        CommandOptions::with_timeout_secs(self.command_timeout_secs)
    }
}

/// One entry of the board dump.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BoardSection {
    /// Copy a file's contents into the report
    File {
        title: String,
        path: PathBuf,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        only_if_readable: Option<PathBuf>,
    },
    /// Run a command and capture its output
    Command {
        title: String,
        argv: Vec<String>,
        /// Skip unless this property is set; `${key}` in argv is replaced by its value
        #[serde(default, skip_serializing_if = "Option::is_none")]
        requires_property: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        only_if_readable: Option<PathBuf>,
    },
}

impl BoardSection {
    pub fn file(title: &str, path: &str) -> Self {
        BoardSection::File {
            title: title.to_string(),
            path: PathBuf::from(path),
            only_if_readable: None,
        }
    }

    pub fn shell(title: &str, script: &str) -> Self {
        BoardSection::Command {
            title: title.to_string(),
            argv: vec![VENDOR_SHELL.to_string(), "-c".to_string(), script.to_string()],
            requires_property: None,
            only_if_readable: None,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            BoardSection::File { title, .. } | BoardSection::Command { title, .. } => title,
        }
    }
}

/// Board dump settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BoardConfig {
    pub command_timeout_secs: u64,
    pub sections: Vec<BoardSection>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            command_timeout_secs: BOARD_COMMAND_TIMEOUT_SECS,
            sections: super::default_configs::default_board_sections(),
        }
    }
}

impl BoardConfig {
    pub fn command_options(&self) -> CommandOptions {
        CommandOptions::with_timeout_secs(self.command_timeout_secs)
    }
}

/// Top-level collector configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DumpConfig {
    pub version: String,
    pub description: String,
    pub modem: ModemConfig,
    pub board: BoardConfig,
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            description: "Default board dumpstate configuration".to_string(),
            modem: ModemConfig::default(),
            board: BoardConfig::default(),
        }
    }
}

impl DumpConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let config: DumpConfig = serde_yaml::from_str(&content)
            .context("Failed to parse YAML config")?;

        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save_to_yaml_file(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self)
            .context("Failed to serialize config to YAML")?;

        fs::write(path, yaml)
            .context(format!("Failed to write config to {}", path.display()))?;

        info!("Saved configuration to {}", path.display());
        Ok(())
    }

    /// Create a default configuration YAML file
    pub fn create_default_config_file(path: &Path) -> Result<()> {
        DumpConfig::default().save_to_yaml_file(path)
    }
}

/// Load a configuration file or fall back to defaults.
///
/// * `Some(path)` that exists is parsed; a parse error is returned.
/// * `Some(path)` that does not exist gets the defaults written to it.
/// * `None` uses the built-in defaults without touching the filesystem.
pub fn load_or_create_config(config_path: Option<&Path>) -> Result<DumpConfig> {
    match config_path {
        Some(path) if path.exists() => DumpConfig::from_yaml_file(path),
        Some(path) => {
            info!("Creating default config at {}", path.display());
            let config = DumpConfig::default();
            config.save_to_yaml_file(path)?;
            Ok(config)
        }
        None => {
            debug!("No config file given, using built-in defaults");
            Ok(DumpConfig::default())
        }
    }
}
