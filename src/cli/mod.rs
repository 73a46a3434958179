//! CLI subcommand definitions and handlers.
//!
//! Implements a git-like subcommand architecture:
//! - `titlescan scan --start-ip IP --end-ip IP` - Scan a range
//! - `titlescan config show|init` - Manage the settings file

mod config;
mod prompt;
mod scan;

pub use config::{ConfigAction, ConfigCommand};
pub use scan::ScanCommand;

use crate::config::AppSettings;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

/// titlescan - find web servers in an IPv4 range and record their page titles.
#[derive(Parser, Debug)]
#[command(name = "titlescan")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Scan IP ranges for web servers and their titles", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Log failed probes as well as found titles
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress console logging and non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to custom settings file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan an address range for web page titles
    #[command(alias = "s")]
    Scan(ScanCommand),

    /// Inspect or create the settings file
    Config(ConfigCommand),
}

/// How a command finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanExit {
    Completed,
    /// Stopped early by the user; partial results were still written.
    Interrupted,
}

impl ScanExit {
    pub fn code(self) -> u8 {
        match self {
            Self::Completed => 0,
            Self::Interrupted => 1,
        }
    }
}

impl From<ScanExit> for ExitCode {
    fn from(exit: ScanExit) -> Self {
        ExitCode::from(exit.code())
    }
}

/// Exit code for validation and configuration failures.
pub const FAILURE_EXIT_CODE: u8 = 2;

impl Cli {
    /// Dispatch to the selected subcommand.
    pub async fn run(self) -> anyhow::Result<ScanExit> {
        match &self.command {
            Commands::Scan(cmd) => {
                let (settings, _) = AppSettings::load(self.config.as_deref())?;
                cmd.execute(&settings, self.verbose, self.quiet).await
            }
            Commands::Config(cmd) => {
                cmd.execute(self.config.as_deref(), self.quiet)?;
                Ok(ScanExit::Completed)
            }
        }
    }
}
