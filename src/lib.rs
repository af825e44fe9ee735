//! # dumpstate_collector
//!
//! Vendor board dumpstate collector with modem diagnostic log harvesting.
//!
//! ## Overview
//!
//! A host bug-report service hands the collector a handle of descriptors.
//! The collector writes board diagnostics (sysfs and debugfs snapshots,
//! subsystem counters, command output) into the first one and, when a
//! second descriptor is present, streams an archive of the modem's
//! diagnostic logs into it.
//!
//! ## Usage
//!
//! ```no_run
//! use dumpstate_collector::collectors::modem::SystemClock;
//! use dumpstate_collector::config::DumpConfig;
//! use dumpstate_collector::device::{DumpHandle, DumpstateDevice};
//! use dumpstate_collector::properties::FilePropertyStore;
//! use dumpstate_collector::utils::command::SystemCommandRunner;
//!
//! let config = DumpConfig::default();
//! let props = FilePropertyStore::new("/vendor/build.prop");
//! let runner = SystemCommandRunner::new();
//! let device = DumpstateDevice::new(&config, &props, &runner, &SystemClock);
//!
//! if let Some(report) = device.dumpstate_board(&DumpHandle::new(vec![1, 3])) {
//!     println!("{} board sections dumped", report.board.dumped_count());
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`cli`]: Command-line interface definitions
//! - [`device`]: Descriptor handling and the board dump entry point
//! - [`collectors`]: Modem log pipeline and board sections
//! - [`config`]: YAML configuration and defaults
//! - [`properties`]: Property store backends
//! - [`models`]: Step outcomes shared by the collectors
//! - [`utils`]: Subprocesses, file dumps, chunked streaming, archiving, hashing
//! - [`constants`]: Property keys, vendor paths and fixed limits

/// Command-line interface definitions and argument parsing
pub mod cli;

/// Core data models and structures used throughout the application
pub mod models;

/// Modem log pipeline and board section collectors
pub mod collectors;

/// Utility functions for subprocesses, streaming, archiving and hashing
pub mod utils;

/// Configuration management and default board sections
pub mod config;

/// Property store access
pub mod properties;

/// Board dump entry point
pub mod device;

/// Application constants and configuration values
pub mod constants;

/// Test utilities and helpers
#[cfg(test)]
pub mod test_utils;
