//! Driving the stack through `docker compose`.

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use crate::constants::{DOCKER_PULL_TIMEOUT, DOCKER_UP_TIMEOUT};
use crate::core::HostshipError;
use crate::utils::HostCommand;

/// Pulls images for a stack and brings it up.
#[async_trait]
pub trait StackController: Send + Sync {
    /// Pull images for `services` (all services when empty). Returns the
    /// command output.
    async fn pull(
        &self,
        definition: &Path,
        project: &str,
        services: &[String],
    ) -> Result<String, HostshipError>;

    /// Start `services` in the background. Idempotent.
    async fn up(
        &self,
        definition: &Path,
        project: &str,
        services: &[String],
    ) -> Result<(), HostshipError>;
}

/// [`StackController`] backed by the `docker compose` plugin.
#[derive(Debug, Clone)]
pub struct ComposeClient {
    dry_run: bool,
    inherit_stdio: bool,
    pull_timeout: Duration,
    up_timeout: Duration,
}

impl Default for ComposeClient {
    fn default() -> Self {
        Self {
            dry_run: false,
            inherit_stdio: false,
            pull_timeout: DOCKER_PULL_TIMEOUT,
            up_timeout: DOCKER_UP_TIMEOUT,
        }
    }
}

impl ComposeClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Print commands instead of running them.
    pub const fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Stream docker output to the terminal (interactive commands).
    pub const fn inherit_stdio(mut self) -> Self {
        self.inherit_stdio = true;
        self
    }

    /// `docker compose -f <definition> --project-name <project> <action...> [services...]`
    pub fn command(
        &self,
        definition: &Path,
        project: &str,
        action: &[&str],
        services: &[String],
    ) -> HostCommand {
        let cmd = HostCommand::docker()
            .args(["compose", "-f"])
            .arg(definition.display().to_string())
            .args(["--project-name", project])
            .args(action.iter().copied())
            .args(services.iter().cloned())
            .with_context(project)
            .dry_run(self.dry_run);
        if self.inherit_stdio { cmd.inherit_stdio() } else { cmd }
    }
}

#[async_trait]
impl StackController for ComposeClient {
    async fn pull(
        &self,
        definition: &Path,
        project: &str,
        services: &[String],
    ) -> Result<String, HostshipError> {
        let output = self
            .command(definition, project, &["pull"], services)
            .with_timeout(Some(self.pull_timeout))
            .execute()
            .await?;
        Ok(output.combined())
    }

    async fn up(
        &self,
        definition: &Path,
        project: &str,
        services: &[String],
    ) -> Result<(), HostshipError> {
        self.command(definition, project, &["up", "-d"], services)
            .with_timeout(Some(self.up_timeout))
            .execute()
            .await?;
        Ok(())
    }
}
