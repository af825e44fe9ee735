//! Helpers shared by the collectors.
//!
//! - **command**: external command execution with timeouts
//! - **dump_file**: copying a single file into the report
//! - **stream**: bounded chunked copy with typed abort reasons
//! - **compress**: in-process ZIP archiving of a staging tree
//! - **hash**: SHA-256 of collected archives
//! - **summary**: JSON run summaries

/// External command execution ("run this command")
pub mod command;

/// Single file dumps ("dump this file")
pub mod dump_file;

/// Chunked copy into caller-owned channels
pub mod stream;

/// ZIP archive creation and permission helpers
pub mod compress;

/// Cryptographic hash calculation
pub mod hash;

/// Run summary serialization
pub mod summary;
