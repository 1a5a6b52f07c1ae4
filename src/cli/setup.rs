//! `hostship setup`: prepare a host to run the stack.
//!
//! Downloads the stack definition into `compose.json` (replacing any existing
//! one), makes sure Docker and the compose plugin are installed, and creates
//! `.env` with a freshly generated deploy URL. An existing `.env` is never
//! touched, so re-running setup keeps the capability URL stable.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

use crate::constants::{
    DEFAULT_COMPOSE_URL, DEPLOY_URL_HOST, DEPLOY_URL_KEY, ENV_FILE_PATH, LISTENER_PORT,
    STACK_DEFINITION_PATH, UPDATE_ROUTE,
};
use crate::fetch::ArtifactFetcher;
use crate::stack::{definition, installer};
use crate::utils::{Spinner, atomic_write};

/// Install Docker and download the compose configuration.
#[derive(Args, Debug)]
pub struct SetupCommand {
    /// Where to download the stack definition from.
    #[arg(value_name = "COMPOSE_URL", default_value = DEFAULT_COMPOSE_URL)]
    compose_url: String,

    /// Print commands without executing them.
    #[arg(long)]
    dry_run: bool,

    /// Verbose output.
    #[arg(short, long)]
    pub(super) verbose: bool,
}

/// A new capability URL with a random key.
#[must_use]
pub fn generate_deploy_url() -> String {
    format!("http://{DEPLOY_URL_HOST}:{LISTENER_PORT}/{UPDATE_ROUTE}/{}", Uuid::new_v4())
}

impl SetupCommand {
    pub async fn execute(self) -> Result<()> {
        self.execute_in(Path::new(".")).await
    }

    /// Run setup with `compose.json` and `.env` placed in `dir`.
    pub async fn execute_in(self, dir: &Path) -> Result<()> {
        let stack_path = dir.join(STACK_DEFINITION_PATH);
        if self.verbose {
            println!("downloading compose file to {}", stack_path.display());
        }

        let spinner = Spinner::start(format!("Downloading {}", self.compose_url));
        let fetched = ArtifactFetcher::new()?.fetch(&self.compose_url).await;
        spinner.finish_and_clear();
        let bytes = fetched.with_context(|| format!("Failed to fetch compose file from {}", self.compose_url))?;

        let services = definition::service_names(&bytes)?;
        debug!("Stack declares services: {}", services.join(", "));
        definition::save(&stack_path, &bytes)?;
        info!("Wrote {}", stack_path.display());

        installer::ensure_docker(self.dry_run).await?;
        installer::ensure_compose(self.dry_run).await?;

        let env_path = dir.join(ENV_FILE_PATH);
        if let Some(deploy_url) = create_env_file(&env_path)? {
            if self.verbose {
                println!("creating {} with {DEPLOY_URL_KEY}={deploy_url}", env_path.display());
            }
        } else {
            debug!("{} exists; keeping its deploy URL", env_path.display());
        }

        println!("{}", "✓ Setup complete".green());
        Ok(())
    }
}

/// Write `.env` with a new deploy URL unless it already exists. Returns the
/// generated URL.
fn create_env_file(path: &Path) -> Result<Option<String>> {
    if path.exists() {
        return Ok(None);
    }
    let deploy_url = generate_deploy_url();
    atomic_write(path, format!("{DEPLOY_URL_KEY}={deploy_url}\n").as_bytes(), 0o600)?;
    Ok(Some(deploy_url))
}
