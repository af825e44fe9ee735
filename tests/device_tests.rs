//! Board dump through raw descriptors, the way the host service calls it.

#![cfg(unix)]

mod common;

use std::fs;
use std::os::unix::io::AsRawFd;

use anyhow::Result;
use tempfile::{NamedTempFile, TempDir};

use common::{tar_members, InstantClock, RadioFixture};
use dumpstate_collector::config::{ArchiveFormat, BoardSection, DumpConfig};
use dumpstate_collector::device::{DumpHandle, DumpstateDevice};
use dumpstate_collector::utils::command::SystemCommandRunner;
use dumpstate_collector::utils::summary::render_summary;

fn with_board_sections(fixture: &RadioFixture, format: ArchiveFormat) -> Result<DumpConfig> {
    let online = fixture.root.path().join("cpu_online");
    fs::write(&online, "0-7\n")?;

    let mut config = fixture.config(format);
    config.board.sections = vec![
        BoardSection::file("CPU online", online.to_str().unwrap_or_default()),
        BoardSection::file("F2FS", "/nonexistent/f2fs/status"),
        BoardSection::Command {
            title: "Temperatures".to_string(),
            argv: vec!["/bin/sh".to_string(), "-c".to_string(), "echo cpu-thermal: 41000".to_string()],
            requires_property: None,
            only_if_readable: None,
        },
    ];
    Ok(config)
}

#[test]
fn test_two_fds_dump_board_and_stream_modem_archive() -> Result<()> {
    let fixture = RadioFixture::new()?;
    let config = with_board_sections(&fixture, ArchiveFormat::Tar)?;
    let props = fixture.props("bugreport_");
    let runner = SystemCommandRunner::new();
    let device = DumpstateDevice::new(&config, &props, &runner, &InstantClock);

    let main = NamedTempFile::new()?;
    let modem = NamedTempFile::new()?;
    let handle = DumpHandle::new(vec![main.as_file().as_raw_fd(), modem.as_file().as_raw_fd()]);

    let report = device.dumpstate_board(&handle).expect("main fd is valid");

    let modem_report = report.modem.as_ref().expect("modem fd was supplied");
    assert_eq!(modem_report.bytes_streamed(), fs::metadata(modem.path())?.len());
    assert_eq!(report.board.dumped_count(), 2);

    let scratch = TempDir::new()?;
    let members = tar_members(&fs::read(modem.path())?, scratch.path())?;
    assert!(members.contains(&"diag_log_003".to_string()));

    let output = fs::read_to_string(main.path())?;
    assert!(output.contains("cpu-thermal: 41000"));
    assert!(output.contains("0-7"));
    assert!(output.find("CP DIAG LOGS").unwrap() < output.find("CPU online").unwrap());

    let json: serde_json::Value = serde_json::from_str(&render_summary(&report)?)?;
    assert_eq!(json["modem"]["gate"], "proceed");
    assert_eq!(json["modem"]["branch"], "diag_logs");
    assert_eq!(json["board"]["sections"][1]["outcome"], "unreadable");
    assert_eq!(json["board"]["sections"][2]["status"], "completed");
    Ok(())
}

#[test]
fn test_single_fd_runs_board_sections_only() -> Result<()> {
    let fixture = RadioFixture::new()?;
    let config = with_board_sections(&fixture, ArchiveFormat::Tar)?;
    let props = fixture.props("bugreport_");
    let runner = SystemCommandRunner::new();
    let device = DumpstateDevice::new(&config, &props, &runner, &InstantClock);

    let main = NamedTempFile::new()?;
    let report = device
        .dumpstate_board(&DumpHandle::new(vec![main.as_file().as_raw_fd()]))
        .expect("main fd is valid");

    assert!(report.modem.is_none());
    assert_eq!(report.board.sections.len(), 3);

    let output = fs::read_to_string(main.path())?;
    assert!(!output.contains("MODEM RFS INFO"));
    assert!(output.contains("CPU online"));
    assert!(!fixture.staging_dir().exists());
    Ok(())
}

#[test]
fn test_unusable_handles_produce_nothing() -> Result<()> {
    let fixture = RadioFixture::new()?;
    let config = with_board_sections(&fixture, ArchiveFormat::Tar)?;
    let props = fixture.props("bugreport_");
    let runner = SystemCommandRunner::new();
    let device = DumpstateDevice::new(&config, &props, &runner, &InstantClock);

    assert!(device.dumpstate_board(&DumpHandle::new(Vec::new())).is_none());
    assert!(device.dumpstate_board(&DumpHandle::new(vec![-1])).is_none());
    assert!(!fixture.staging_dir().exists());
    Ok(())
}
