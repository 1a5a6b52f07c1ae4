//! Making sure Docker and the compose plugin are present.

use anyhow::Result;
use tracing::{debug, info};

use crate::constants::{DOCKER_INSTALL_SCRIPT, DOCKER_PROBE_TIMEOUT};
use crate::core::HostshipError;
use crate::utils::{HostCommand, command_exists};

fn install_docker(dry_run: bool) -> HostCommand {
    HostCommand::new("sh").args(["-c", DOCKER_INSTALL_SCRIPT]).inherit_stdio().dry_run(dry_run)
}

async fn compose_available() -> bool {
    if HostCommand::docker()
        .args(["compose", "version"])
        .with_timeout(Some(DOCKER_PROBE_TIMEOUT))
        .succeeds()
        .await
    {
        return true;
    }
    command_exists("docker-compose")
}

/// Install Docker with the convenience script unless `docker` is on `PATH`.
pub async fn ensure_docker(dry_run: bool) -> Result<()> {
    if command_exists("docker") {
        debug!("docker found");
        return Ok(());
    }

    info!("Docker not found, installing");
    install_docker(dry_run).execute().await?;
    if dry_run || command_exists("docker") {
        return Ok(());
    }
    Err(HostshipError::ToolNotFound {
        tool: "docker".to_string(),
    }
    .into())
}

/// Make sure `docker compose` (or a standalone `docker-compose`) works,
/// installing Docker if it does not.
pub async fn ensure_compose(dry_run: bool) -> Result<()> {
    if compose_available().await {
        debug!("docker compose found");
        return Ok(());
    }

    info!("Docker Compose not found, installing Docker");
    install_docker(dry_run).execute().await?;
    if dry_run || compose_available().await {
        return Ok(());
    }
    Err(HostshipError::ToolNotFound {
        tool: "docker compose".to_string(),
    }
    .into())
}
