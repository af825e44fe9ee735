use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for the dumpstate collector.
///
/// The host service passes its descriptors with repeated `--fd` options in
/// handle order (main report first, modem channel second). Off-device the
/// channels can be plain files given with `--report` and `--modem-output`.
#[derive(Parser, Debug)]
#[clap(name = "dumpstate-collector", about = "Board dumpstate and modem log collector")]
pub struct Args {
    /// Descriptor to dump into, repeat for the modem channel
    #[clap(long = "fd", value_name = "FD", allow_hyphen_values = true)]
    pub fds: Vec<i32>,

    /// Write the main report to this file instead of an inherited descriptor
    #[clap(long, conflicts_with = "fds")]
    pub report: Option<PathBuf>,

    /// Write the modem log archive to this file
    #[clap(long, requires = "report")]
    pub modem_output: Option<PathBuf>,

    /// Path to configuration YAML file
    #[clap(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// build.prop style file backing the property store
    #[clap(short = 'p', long)]
    pub properties: Option<PathBuf>,

    /// Write a JSON run summary to this path
    #[clap(short = 's', long)]
    pub summary: Option<PathBuf>,

    /// Resolve cp, tar, chmod, rm and mkdir through PATH instead of /vendor/bin
    #[clap(long)]
    pub path_tools: bool,

    /// Verbose logging
    #[clap(short, long)]
    pub verbose: bool,

    /// Subcommands
    #[clap(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands for the collector.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a default configuration file
    InitConfig {
        /// Path to output configuration file
        #[clap(default_value = "dumpstate.yaml")]
        path: PathBuf,
    },
}
