use std::fs::{File, OpenOptions};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::{info, warn, LevelFilter};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use dumpstate_collector::cli::{Args, Commands};
use dumpstate_collector::collectors::modem::SystemClock;
use dumpstate_collector::config::{load_or_create_config, DumpConfig, ToolPaths};
use dumpstate_collector::device::{DumpHandle, DumpstateDevice, RawFd};
use dumpstate_collector::properties::{FilePropertyStore, MemoryPropertyStore, PropertyStore};
use dumpstate_collector::utils::command::SystemCommandRunner;
use dumpstate_collector::utils::summary::write_summary;

/// Descriptor used for the main report when none is given
const STDOUT_FD: RawFd = 1;

fn main() -> Result<()> {
    let args = Args::parse();

    initialize_logging(args.verbose)?;

    if let Some(cmd) = &args.command {
        return handle_subcommand(cmd);
    }

    let mut config = load_or_create_config(args.config.as_deref())?;
    if args.path_tools {
        config.modem.tools = ToolPaths::from_path();
    }

    let props = open_property_store(args.properties.as_deref());

    // Files opened here must outlive the dump; the handle only carries their descriptors
    let (handle, _outputs) = build_handle(&args)?;

    let runner = SystemCommandRunner::new();
    let clock = SystemClock;
    let device = DumpstateDevice::new(&config, props.as_ref(), &runner, &clock);

    info!("Starting board dump");
    let report = device
        .dumpstate_board(&handle)
        .ok_or_else(|| anyhow!("No usable descriptor in {:?}", handle.fds))?;

    if let Some(path) = &args.summary {
        write_summary(path, &report)?;
    }

    info!("Board dump completed");
    Ok(())
}

/// Initialize logging with the specified verbosity level.
/// Everything goes to stderr; stdout may be the main report.
fn initialize_logging(verbose: bool) -> Result<()> {
    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    TermLogger::init(
        log_level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    ).context("Failed to initialize logger")?;
    Ok(())
}

/// Handle subcommands
fn handle_subcommand(cmd: &Commands) -> Result<()> {
    match cmd {
        Commands::InitConfig { path } => {
            info!("Creating default configuration file at {}", path.display());
            DumpConfig::create_default_config_file(path)?;
            info!("Configuration created successfully");
            Ok(())
        }
    }
}

fn open_property_store(path: Option<&Path>) -> Box<dyn PropertyStore> {
    match path {
        Some(path) => {
            info!("Reading properties from {}", path.display());
            Box::new(FilePropertyStore::new(path))
        }
        None => {
            warn!("No property file given, modem collection will be skipped");
            Box::new(MemoryPropertyStore::new())
        }
    }
}

fn create_output(path: &Path) -> Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .context(format!("Failed to create {}", path.display()))
}

#[cfg(unix)]
fn build_handle(args: &Args) -> Result<(DumpHandle, Vec<File>)> {
    use std::os::unix::io::AsRawFd;

    if !args.fds.is_empty() {
        return Ok((DumpHandle::new(args.fds.clone()), Vec::new()));
    }

    let Some(report_path) = &args.report else {
        return Ok((DumpHandle::new(vec![STDOUT_FD]), Vec::new()));
    };

    let mut outputs = vec![create_output(report_path)?];
    if let Some(modem_path) = &args.modem_output {
        outputs.push(create_output(modem_path)?);
    }

    let fds = outputs.iter().map(|f| f.as_raw_fd()).collect();
    Ok((DumpHandle::new(fds), outputs))
}

#[cfg(not(unix))]
fn build_handle(_args: &Args) -> Result<(DumpHandle, Vec<File>)> {
    Err(anyhow!("Descriptor handles are only supported on unix"))
}
