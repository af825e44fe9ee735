//! Entry point used by the host bug-report service.
//!
//! The service hands over a [`DumpHandle`] of raw descriptors: the first is
//! the main report, the optional second one receives the modem log archive.
//! Descriptors are duplicated before use so the caller keeps ownership.

use std::fs::File;
use std::io::{self, Write};

use log::{error, info};
use serde::Serialize;

use crate::collectors::board::{BoardDumper, BoardReport};
use crate::collectors::modem::{Clock, ModemDumpReport, ModemLogPipeline};
use crate::config::DumpConfig;
use crate::properties::PropertyStore;
use crate::utils::command::CommandRunner;

#[cfg(unix)]
pub use std::os::unix::io::RawFd;

#[cfg(not(unix))]
pub type RawFd = i32;

/// Descriptors supplied by the caller, in handle order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DumpHandle {
    pub fds: Vec<RawFd>,
}

impl DumpHandle {
    pub fn new(fds: Vec<RawFd>) -> Self {
        Self { fds }
    }
}

/// Combined result of one board dump.
#[derive(Serialize, Debug, Clone)]
pub struct BoardDumpReport {
    /// `None` when no modem channel was available
    pub modem: Option<ModemDumpReport>,
    pub board: BoardReport,
}

pub struct DumpstateDevice<'a> {
    config: &'a DumpConfig,
    props: &'a dyn PropertyStore,
    runner: &'a dyn CommandRunner,
    clock: &'a dyn Clock,
}

impl<'a> DumpstateDevice<'a> {
    pub fn new(
        config: &'a DumpConfig,
        props: &'a dyn PropertyStore,
        runner: &'a dyn CommandRunner,
        clock: &'a dyn Clock,
    ) -> Self {
        Self { config, props, runner, clock }
    }

    /// Run the modem pipeline (when a modem channel is given) and then the
    /// board sections, all reporting into `main`.
    pub fn dump_to(&self, main: &mut dyn Write, modem: Option<&mut dyn Write>) -> BoardDumpReport {
        let modem = modem.map(|channel| {
            ModemLogPipeline::new(&self.config.modem, self.props, self.runner, self.clock).run(main, channel)
        });

        let board = BoardDumper::new(&self.config.board, self.props, self.runner).dump(main);

        if let Err(e) = main.flush() {
            error!("Failed to flush main report: {}", e);
        }

        BoardDumpReport { modem, board }
    }

    /// Dump into the descriptors carried by `handle`.
    ///
    /// Returns `None` without writing anything when the handle has no usable
    /// main descriptor. A missing modem descriptor only skips the modem logs.
    pub fn dumpstate_board(&self, handle: &DumpHandle) -> Option<BoardDumpReport> {
        let main_fd = match handle.fds.first() {
            Some(&fd) => fd,
            None => {
                error!("no FDs");
                return None;
            }
        };

        if main_fd < 0 {
            error!("invalid FD: {}", main_fd);
            return None;
        }

        let mut main = match duplicate_fd(main_fd) {
            Ok(file) => file,
            Err(e) => {
                error!("invalid FD: {} ({})", main_fd, e);
                return None;
            }
        };

        let mut modem = match handle.fds.get(1) {
            None => {
                error!("no FD for modem");
                None
            }
            Some(&fd) => match duplicate_fd(fd) {
                Ok(file) => Some(file),
                Err(e) => {
                    error!("invalid modem FD: {} ({})", fd, e);
                    None
                }
            },
        };

        info!("Dumping board state ({} descriptors)", handle.fds.len());
        let report = self.dump_to(&mut main, modem.as_mut().map(|f| f as &mut dyn Write));
        Some(report)
    }
}

/// Duplicate a caller-owned descriptor into a `File` that closes only the copy.
#[cfg(unix)]
fn duplicate_fd(fd: RawFd) -> io::Result<File> {
    use std::os::unix::io::BorrowedFd;

    if fd < 0 {
        return Err(io::Error::from_raw_os_error(libc::EBADF));
    }
    // SAFETY: the descriptor is only borrowed for the dup call; F_DUPFD_CLOEXEC
    // reports EBADF for a closed descriptor instead of touching it.
    let borrowed = unsafe { BorrowedFd::borrow_raw(fd) };
    Ok(File::from(borrowed.try_clone_to_owned()?))
}

#[cfg(not(unix))]
fn duplicate_fd(_fd: RawFd) -> io::Result<File> {
    Err(io::Error::new(io::ErrorKind::Unsupported, "raw descriptors require unix"))
}
