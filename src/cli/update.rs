//! `hostship update`: replace the running binary with the latest release on
//! its channel.
//!
//! The new binary is verified by running it before the command reports
//! success; a binary that fails to start is rolled back automatically. When
//! the listener runs under systemd the unit is reinstalled afterwards so the
//! service restarts on the new executable.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tracing::debug;

use crate::config::LayeredConfig;
use crate::systemd;
use crate::upgrade::{SelfUpdater, UpdateStatus};
use crate::utils::Spinner;

/// Check for updates and replace the hostship binary.
#[derive(Args, Debug)]
pub struct UpdateCommand {
    /// Only report whether an update is available.
    #[arg(long)]
    check: bool,

    /// Reinstall even if already on the latest version.
    #[arg(long)]
    force: bool,

    /// Verbose output.
    #[arg(short, long)]
    pub(super) verbose: bool,
}

impl UpdateCommand {
    pub async fn execute(self) -> Result<()> {
        let updater = SelfUpdater::new(&LayeredConfig::standard())?.force(self.force);
        debug!("Release metadata: {}", updater.metadata_url());

        if self.check {
            return check(&updater).await;
        }

        let spinner = Spinner::start("Checking for updates...");
        let result = updater.update().await;
        spinner.finish_and_clear();

        match result.context("Update failed")? {
            UpdateStatus::UpToDate {
                current, ..
            } => {
                println!("{}", format!("hostship is up to date ({current})").green());
            }
            UpdateStatus::Updated {
                from,
                to,
                backup,
            } => {
                println!(
                    "{}",
                    format!("Updated {} from {} to {}", updater.executable().display(), from, to).green()
                );
                debug!("Previous binary kept at {}", backup.display());
                systemd::reinstall_if_active(updater.executable()).await;
            }
        }
        Ok(())
    }
}

async fn check(updater: &SelfUpdater) -> Result<()> {
    match updater.check_for_update().await? {
        Some(latest) => {
            println!("{}", format!("Update available: {} -> {}", updater.current_version(), latest).yellow());
            println!("Run `hostship update` to install it");
        }
        None => {
            println!("{}", format!("hostship is up to date ({})", updater.current_version()).green());
        }
    }
    Ok(())
}
