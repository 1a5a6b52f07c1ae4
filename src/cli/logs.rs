//! `hostship logs <service>`: show a service's container logs.

use anyhow::Result;
use clap::{ArgAction, Args};
use std::path::Path;

use crate::constants::{PROJECT_NAME, STACK_DEFINITION_PATH};
use crate::core::HostshipError;
use crate::stack::definition;
use crate::utils::HostCommand;

/// Show live logs for a service.
#[derive(Args, Debug)]
pub struct LogsCommand {
    /// Service declared in compose.json.
    service: String,

    /// Follow log output (`--follow=false` prints and exits).
    #[arg(
        short,
        long,
        default_value_t = true,
        default_missing_value = "true",
        num_args = 0..=1,
        require_equals = true,
        action = ArgAction::Set
    )]
    follow: bool,
}

impl LogsCommand {
    pub async fn execute(self) -> Result<()> {
        let bytes = definition::load(Path::new(STACK_DEFINITION_PATH))?;
        self.command(&bytes)?.execute().await?;
        Ok(())
    }

    /// `docker logs [-f] <container>` for the requested service.
    fn command(&self, definition_bytes: &[u8]) -> Result<HostCommand, HostshipError> {
        let services = definition::service_names(definition_bytes)?;
        if !services.contains(&self.service) {
            return Err(HostshipError::Other {
                message: format!("service {} not found", self.service),
            });
        }

        let container = definition::container_name(definition_bytes, PROJECT_NAME, &self.service);
        let mut cmd = HostCommand::docker().arg("logs");
        if self.follow {
            cmd = cmd.arg("-f");
        }
        Ok(cmd.arg(container).inherit_stdio())
    }
}
