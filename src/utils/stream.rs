use std::io::{ErrorKind, Read, Write};

use log::{debug, warn};
use serde::Serialize;

/// Why a chunked copy stopped.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StreamOutcome {
    /// Source reached end of file
    Completed,
    /// Source read failed; nothing further was written
    ReadFailed { error: String },
    /// Destination accepted fewer bytes than were read
    ShortWrite { requested: usize, written: usize },
    /// Destination write failed outright
    WriteFailed { error: String },
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct StreamReport {
    pub bytes_written: u64,
    pub chunks: u64,
    pub outcome: StreamOutcome,
}

impl StreamReport {
    pub fn is_complete(&self) -> bool {
        self.outcome == StreamOutcome::Completed
    }
}

/// Copy `reader` into `writer` one bounded chunk at a time.
///
/// Each chunk is handed to a single `write` call and must be accepted in
/// full; a short write, a write error or a read error stops the copy
/// immediately, leaving whatever was already written in place. Interrupted
/// calls are retried.
pub fn stream_chunks<R, W>(reader: &mut R, writer: &mut W, chunk_size: usize) -> StreamReport
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let mut buffer = vec![0u8; chunk_size.max(1)];
    let mut bytes_written = 0u64;
    let mut chunks = 0u64;

    let outcome = loop {
        let bytes_read = match retry_interrupted(|| reader.read(&mut buffer)) {
            Ok(0) => break StreamOutcome::Completed,
            Ok(n) => n,
            Err(e) => {
                warn!("Read failed after {} bytes: {}", bytes_written, e);
                break StreamOutcome::ReadFailed { error: e.to_string() };
            }
        };

        match retry_interrupted(|| writer.write(&buffer[..bytes_read])) {
            Ok(written) if written == bytes_read => {
                bytes_written += written as u64;
                chunks += 1;
            }
            Ok(written) => {
                warn!("Failed to write {} bytes, actually written: {}", bytes_read, written);
                bytes_written += written as u64;
                break StreamOutcome::ShortWrite { requested: bytes_read, written };
            }
            Err(e) => {
                warn!("Write failed after {} bytes: {}", bytes_written, e);
                break StreamOutcome::WriteFailed { error: e.to_string() };
            }
        }
    };

    debug!("Streamed {} bytes in {} chunks", bytes_written, chunks);
    StreamReport { bytes_written, chunks, outcome }
}

fn retry_interrupted<T>(mut op: impl FnMut() -> std::io::Result<T>) -> std::io::Result<T> {
    loop {
        match op() {
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}
