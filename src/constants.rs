//! Global constants for the dumpstate collector.
//!
//! Property keys, default vendor paths and the fixed limits of the modem
//! log pipeline live here so the collectors and the default configuration
//! agree on them.

use std::time::Duration;

// Property keys
/// Directory under which the modem staging area and archive are created
pub const MODEM_LOG_LOC_PROPERTY: &str = "ro.radio.log_loc";

/// Filename prefix for the combined modem log archive
pub const MODEM_LOG_PREFIX_PROPERTY: &str = "ro.radio.log_prefix";

/// Switch selecting the smlog collection path
pub const MODEM_LOGGING_SWITCH_PROPERTY: &str = "persist.radio.smlog_switch";

/// Persisted flag enabling diag_mdlog collection
pub const DIAG_MDLOG_PERSIST_PROPERTY: &str = "persist.vendor.sys.modem.diag.mdlog";

/// Command flag read by the diag_mdlog daemon
pub const DIAG_MDLOG_PROPERTY: &str = "vendor.sys.modem.diag.mdlog";

/// Status flag published by the diag_mdlog daemon
pub const DIAG_MDLOG_STATUS_PROPERTY: &str = "vendor.sys.modem.diag.mdlog_on";

/// Number of diag logs to keep in a bug report (-1 for all)
pub const DIAG_MDLOG_NUMBER_BUGREPORT_PROPERTY: &str = "persist.vendor.sys.modem.diag.mdlog_br_num";

/// Boot device name used by the UFS health section
pub const UFS_BOOTDEVICE_PROPERTY: &str = "ro.boot.bootdevice";

/// Build type ("user", "userdebug", "eng")
pub const BUILD_TYPE_PROPERTY: &str = "ro.build.type";

// Modem pipeline limits
/// Default retention cap when the property is unset
pub const DEFAULT_DIAG_LOG_MAX_FILES: i32 = 100;

/// Retention value meaning "copy every matching log"
pub const UNLIMITED_DIAG_LOG_FILES: i32 = -1;

/// Name prefix of diag_mdlog output files
pub const DIAG_LOG_PREFIX: &str = "diag_log_";

/// Timeout applied to every modem pipeline subprocess
pub const MODEM_COMMAND_TIMEOUT_SECS: u64 = 120;

/// Timeout for board section commands
pub const BOARD_COMMAND_TIMEOUT_SECS: u64 = 10;

/// Number of status polls while waiting for diag_mdlog to exit
pub const DIAG_QUIESCE_POLL_BUDGET: u32 = 30;

/// Interval between status polls, also used as the settle delay
pub const DIAG_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Chunk size for streaming the archive into the modem channel (64KB)
pub const MODEM_LOG_STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// Staging directory name created under the log location
pub const MODEM_LOG_STAGING_DIR_NAME: &str = "modem_log";

/// Archive basename appended to the filename prefix
pub const MODEM_LOG_ARCHIVE_BASENAME: &str = "all";

// Default vendor paths
pub const DEFAULT_DIAG_LOG_DIR: &str = "/data/vendor/radio/diag_logs/logs";
pub const DEFAULT_RFS_INFO_DIR: &str = "/data/vendor/rfs/mpss/OEMFI/";
pub const DEFAULT_SMLOG_DUMP_PATH: &str = "/vendor/bin/smlog_dump";
pub const VENDOR_SHELL: &str = "/vendor/bin/sh";

/// Auxiliary radio, netmgr and subsystem-restart logs bundled with every modem dump
pub const DEFAULT_AUX_MODEM_LOGS: &[&str] = &[
    "/data/vendor/radio/ril_log",
    "/data/vendor/radio/ril_log_old",
    "/data/vendor/netmgr/netmgr_log",
    "/data/vendor/netmgr/netmgr_log_old",
    "/data/vendor/radio/power_anomaly_data.txt",
    "/data/vendor/radio/diag_logs/diag_trace.txt",
    "/data/vendor/radio/diag_logs/diag_trace_old.txt",
    "/data/vendor/ssrlog/ssr_log.txt",
    "/data/vendor/ssrlog/ssr_log_old.txt",
];

// Section titles written into the main report
pub const TITLE_RFS_INFO: &str = "MODEM RFS INFO";
pub const TITLE_DIAG_PROPERTIES: &str = "MODEM DIAG SYSTEM PROPERTIES";
pub const TITLE_MKDIR: &str = "MKDIR MODEM LOG";
pub const TITLE_SMLOG_DUMP: &str = "SMLOG DUMP";
pub const TITLE_COPY_DIAG_LOG: &str = "CP DIAG LOGS";
pub const TITLE_COPY_MODEM_LOG: &str = "CP MODEM LOG";
pub const TITLE_ARCHIVE: &str = "TAR LOG";
pub const TITLE_PERMISSIONS: &str = "CHG PERM";
pub const TITLE_REMOVE_STAGING: &str = "RM MODEM DIR";
pub const TITLE_REMOVE_ARCHIVE: &str = "RM LOG";
