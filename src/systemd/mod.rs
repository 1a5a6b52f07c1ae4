//! Running hostship as a systemd service.
//!
//! The unit starts `hostship hotreload` from the directory `hostship setup`
//! was run in, so `compose.json` and `.env` resolve relative to it. All
//! `systemctl` calls are prefixed with `sudo` when not running as root.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::constants::{SERVICE_NAME, UNIT_FILE_PATH};
use crate::core::HostshipError;
use crate::utils::fs::write_with_mode;
use crate::utils::{HostCommand, command_exists, is_root};

const UNIT_TEMPLATE: &str = include_str!("hostship.service");

/// Render the unit file for `binary`, started in `working_dir`.
pub fn render_unit(binary: &Path, working_dir: &Path) -> String {
    UNIT_TEMPLATE
        .replace("@BINARY@", &binary.display().to_string())
        .replace("@WORKING_DIR@", &working_dir.display().to_string())
}

async fn write_unit_file(unit: &str) -> Result<()> {
    let path = Path::new(UNIT_FILE_PATH);
    match write_with_mode(path, unit.as_bytes(), 0o644) {
        Ok(()) => Ok(()),
        Err(e) if !is_root() => {
            debug!("Direct write failed ({:#}); copying with sudo", e);
            let mut staged = tempfile::Builder::new()
                .prefix("hostship")
                .suffix(".service")
                .tempfile()
                .context("Failed to create temporary unit file")?;
            staged.write_all(unit.as_bytes()).context("Failed to write temporary unit file")?;
            HostCommand::privileged("cp")
                .arg(staged.path().display().to_string())
                .arg(UNIT_FILE_PATH)
                .execute()
                .await
                .context("Failed to install unit file")?;
            Ok(())
        }
        Err(e) => Err(e.context("Failed to install unit file")),
    }
}

fn systemctl(args: &[&str], dry_run: bool) -> HostCommand {
    HostCommand::systemctl().args(args.iter().copied()).inherit_stdio().dry_run(dry_run)
}

/// Write the unit, then reload systemd and (re)start the service.
pub async fn install(binary: &Path, working_dir: &Path, dry_run: bool) -> Result<()> {
    let unit = render_unit(binary, working_dir);
    info!("Installing unit file to {}", UNIT_FILE_PATH);
    if dry_run {
        println!("write {UNIT_FILE_PATH}");
    } else {
        write_unit_file(&unit).await?;
    }

    for args in [
        &["daemon-reload"][..],
        &["enable", "--now", SERVICE_NAME],
        &["restart", SERVICE_NAME],
    ] {
        systemctl(args, dry_run).execute().await?;
    }
    Ok(())
}

/// Stop and disable the service and delete the unit file.
///
/// A missing `systemctl` or an already removed unit is not an error.
pub async fn remove(dry_run: bool) -> Result<()> {
    for args in [&["disable", "--now", SERVICE_NAME][..], &["daemon-reload"]] {
        match systemctl(args, dry_run).execute().await {
            Ok(_) => {}
            Err(HostshipError::ToolNotFound {
                tool,
            }) => debug!("{} not found; skipping systemctl {}", tool, args.join(" ")),
            Err(e) => return Err(e.into()),
        }
    }

    if dry_run {
        println!("{}", HostCommand::privileged("rm").args(["-f", UNIT_FILE_PATH]).display());
        return Ok(());
    }
    if is_root() {
        match std::fs::remove_file(UNIT_FILE_PATH) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                return Err(e).with_context(|| format!("Failed to remove {UNIT_FILE_PATH}"));
            }
            _ => {}
        }
    } else {
        HostCommand::privileged("rm").args(["-f", UNIT_FILE_PATH]).execute().await?;
    }
    Ok(())
}

/// Show `systemctl status hostship`.
pub async fn status() -> Result<()> {
    systemctl(&["status", SERVICE_NAME], false).execute().await?;
    Ok(())
}

/// Whether the service is currently running. `false` without systemd.
pub async fn is_active() -> bool {
    if !command_exists("systemctl") {
        return false;
    }
    HostCommand::new("systemctl")
        .args(["is-active", "--quiet", SERVICE_NAME])
        .with_timeout(Some(Duration::from_secs(10)))
        .succeeds()
        .await
}

/// `WorkingDirectory=` of a rendered unit.
pub fn unit_working_dir(unit: &str) -> Option<PathBuf> {
    unit.lines()
        .filter_map(|line| line.trim().strip_prefix("WorkingDirectory="))
        .map(str::trim)
        .find(|dir| !dir.is_empty())
        .map(PathBuf::from)
}

/// Reinstall the unit for `binary` if the service is running, so it picks
/// up a freshly replaced executable. The working directory of the installed
/// unit is kept. Failures are logged and swallowed.
pub async fn reinstall_if_active(binary: &Path) {
    if !command_exists("systemctl") {
        debug!("systemctl not found; skipping service reinstall");
        return;
    }
    if !is_active().await {
        debug!("{} service not active; skipping reinstall", SERVICE_NAME);
        return;
    }

    let working_dir = match std::fs::read_to_string(UNIT_FILE_PATH).ok().as_deref().and_then(unit_working_dir) {
        Some(dir) => dir,
        None => match std::env::current_dir() {
            Ok(dir) => dir,
            Err(e) => {
                warn!("Cannot determine working directory for service: {}", e);
                return;
            }
        },
    };

    info!("Reinstalling {} service", SERVICE_NAME);
    if let Err(e) = remove(false).await {
        warn!("Failed to remove service: {:#}", e);
    }
    if let Err(e) = install(binary, &working_dir, false).await {
        warn!("Failed to install service: {:#}", e);
    }
}
