//! Collectors that write into the caller's dump channels.
//!
//! - [`modem`]: the modem diagnostic log pipeline, streamed into the modem fd
//! - [`board`]: single-shot file and command sections on the main report fd

/// Modem diagnostic log collection and streaming
pub mod modem;

/// Board file and command sections
pub mod board;
