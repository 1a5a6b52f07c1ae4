//! `hostship systemd install|remove|status`.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;

use crate::systemd;

/// Manage the hostship systemd service.
#[derive(Args, Debug)]
pub struct SystemdCommand {
    #[command(subcommand)]
    action: SystemdAction,
}

#[derive(Subcommand, Debug)]
enum SystemdAction {
    /// Install hostship as a systemd service
    Install {
        /// Print commands without executing them.
        #[arg(long)]
        dry_run: bool,

        /// Verbose output.
        #[arg(short, long)]
        verbose: bool,
    },

    /// Remove the hostship systemd service
    Remove {
        /// Print commands without executing them.
        #[arg(long)]
        dry_run: bool,

        /// Verbose output.
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show the status of the systemd service
    Status {
        /// Verbose output.
        #[arg(short, long)]
        verbose: bool,
    },
}

impl SystemdCommand {
    pub(super) const fn verbose(&self) -> bool {
        match self.action {
            SystemdAction::Install {
                verbose, ..
            }
            | SystemdAction::Remove {
                verbose, ..
            }
            | SystemdAction::Status {
                verbose,
            } => verbose,
        }
    }

    pub async fn execute(self) -> Result<()> {
        match self.action {
            SystemdAction::Install {
                dry_run, ..
            } => {
                let binary = std::env::current_exe().context("Failed to get current executable path")?;
                let working_dir = std::env::current_dir().context("Failed to get current directory")?;
                systemd::install(&binary, &working_dir, dry_run).await?;
                if !dry_run {
                    println!("{}", "✓ hostship service installed".green());
                }
            }
            SystemdAction::Remove {
                dry_run, ..
            } => {
                systemd::remove(dry_run).await?;
                if !dry_run {
                    println!("{}", "✓ hostship service removed".green());
                }
            }
            SystemdAction::Status {
                ..
            } => systemd::status().await?,
        }
        Ok(())
    }
}
