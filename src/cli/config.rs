//! Config subcommand implementation.
//!
//! `titlescan config show` and `titlescan config init`.

use crate::config::{AppSettings, Paths};
use crate::output;
use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Inspect or create the settings file.
#[derive(Parser, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective settings and where they were loaded from
    Show,

    /// Write the default settings to the settings file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl ConfigCommand {
    /// Execute the config command.
    pub fn execute(&self, explicit: Option<&Path>, quiet: bool) -> anyhow::Result<()> {
        match &self.action {
            ConfigAction::Show => {
                let (settings, source) = AppSettings::load(explicit)?;
                if !quiet {
                    match source {
                        Some(path) => output::print_info(&format!("Loaded from {}", path.display())),
                        None => output::print_info("No settings file found, using defaults"),
                    }
                }
                println!("{}", serde_json::to_string_pretty(&settings)?);
                Ok(())
            }
            ConfigAction::Init { force } => {
                let path = settings_path(explicit)?;
                init_settings(&path, *force)?;
                if !quiet {
                    output::print_success(&format!("Wrote default settings to {}", path.display()));
                }
                Ok(())
            }
        }
    }
}

fn settings_path(explicit: Option<&Path>) -> anyhow::Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(Paths::resolve()?.settings_file()),
    }
}

fn init_settings(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    AppSettings::default()
        .save_to(path)
        .with_context(|| format!("cannot write {}", path.display()))
}
