//! The binary as the host service launches it.

#![cfg(unix)]

use std::fs;
use std::process::Command;

use anyhow::Result;
use tempfile::TempDir;

use dumpstate_collector::config::{BoardSection, DumpConfig};

#[test]
fn test_stdout_report_carries_no_log_lines() -> Result<()> {
    let dir = TempDir::new()?;
    let soc_id = dir.path().join("soc_id");
    fs::write(&soc_id, "0x1c5a\n")?;

    let mut config = DumpConfig::default();
    config.board.sections = vec![BoardSection::file("SoC id", soc_id.to_str().unwrap())];
    let config_path = dir.path().join("dumpstate.yaml");
    config.save_to_yaml_file(&config_path)?;

    let output = Command::new(env!("CARGO_BIN_EXE_dumpstate_collector"))
        .arg("--config")
        .arg(&config_path)
        .arg("--verbose")
        .output()?;
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8(output.stdout)?;
    assert_eq!(stdout, format!("------ SoC id ({}) ------\n0x1c5a\n", soc_id.display()));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Starting board dump"));
    assert!(stderr.contains("No property file given"));
    Ok(())
}
