//! `hostship start`: pull images and bring the stack up.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::Path;

use crate::constants::{PROJECT_NAME, STACK_DEFINITION_PATH};
use crate::stack::{ComposeClient, StackController, installer};

/// Start the Docker compose services.
#[derive(Args, Debug)]
pub struct StartCommand {
    /// Print commands without executing them.
    #[arg(long)]
    dry_run: bool,

    /// Verbose output.
    #[arg(short, long)]
    pub(super) verbose: bool,
}

impl StartCommand {
    pub async fn execute(self) -> Result<()> {
        installer::ensure_docker(self.dry_run).await?;
        installer::ensure_compose(self.dry_run).await?;

        let client = ComposeClient::new().dry_run(self.dry_run).inherit_stdio();
        let path = Path::new(STACK_DEFINITION_PATH);
        client.pull(path, PROJECT_NAME, &[]).await?;
        client.up(path, PROJECT_NAME, &[]).await?;

        if !self.dry_run {
            println!("{}", "✓ Stack is up".green());
        }
        Ok(())
    }
}
