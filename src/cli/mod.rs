//! Command-line interface for hostship.
//!
//! Each command lives in its own module with an argument struct deriving
//! [`clap::Args`] and an `execute` method.
//!
//! # Commands
//!
//! - `setup [compose_url]` - download the stack definition, install Docker,
//!   generate `.env` with a fresh deploy URL
//! - `start` - pull images and bring the stack up
//! - `logs <service>` - stream a service's container logs
//! - `systemd install|remove|status` - manage the listener service
//! - `update` - replace the hostship binary with the latest release
//! - `hotreload` (hidden) - run the update listener; started by systemd
//!
//! `hostship -v` prints `<channel> <version>`. A freshly downloaded binary
//! is run with exactly this flag to prove that it starts, so its output
//! format is part of the update protocol.
//!
//! # Logging
//!
//! `RUST_LOG` always wins. Otherwise commands log warnings and errors only,
//! the listener logs at `info`, and `-v/--verbose` on any command switches
//! to `debug`.

mod hotreload;
mod logs;
mod setup;
mod start;
mod systemd;
mod update;


use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::version_line;

pub use hotreload::HotreloadCommand;
pub use logs::LogsCommand;
pub use setup::SetupCommand;
pub use start::StartCommand;
pub use systemd::SystemdCommand;
pub use update::UpdateCommand;

/// Root command.
#[derive(Parser, Debug)]
#[command(
    name = "hostship",
    about = "Docker service manager",
    long_about = "hostship runs a single Docker Compose stack on a host, keeps it \
                  up to date through an authenticated webhook and updates itself \
                  from the release server.",
    disable_version_flag = true,
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Print the channel and version, then exit.
    #[arg(short = 'v', long = "version")]
    version: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Install Docker and download the compose configuration
    Setup(SetupCommand),

    /// Start the Docker compose services
    Start(StartCommand),

    /// Run only the hot-reload listener
    #[command(hide = true)]
    Hotreload(HotreloadCommand),

    /// Show live logs for a service
    Logs(LogsCommand),

    /// Manage the hostship systemd service
    Systemd(SystemdCommand),

    /// Check for updates and replace the hostship binary
    Update(UpdateCommand),
}

impl Cli {
    /// Filter used when `RUST_LOG` is not set.
    #[must_use]
    pub fn default_log_filter(&self) -> &'static str {
        let verbose = match &self.command {
            Some(Commands::Setup(cmd)) => cmd.verbose,
            Some(Commands::Start(cmd)) => cmd.verbose,
            Some(Commands::Hotreload(cmd)) => cmd.verbose,
            Some(Commands::Logs(_)) | None => false,
            Some(Commands::Systemd(cmd)) => cmd.verbose(),
            Some(Commands::Update(cmd)) => cmd.verbose,
        };
        if verbose {
            "hostship=debug,tower_http=debug,warn"
        } else if matches!(self.command, Some(Commands::Hotreload(_))) {
            "hostship=info,warn"
        } else {
            "warn"
        }
    }

    /// Install the global tracing subscriber. Logs go to stderr so command
    /// output on stdout stays parseable.
    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.default_log_filter()));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }

    /// Run the selected command.
    pub async fn execute(self) -> Result<()> {
        if self.version {
            println!("{}", version_line());
            return Ok(());
        }

        match self.command {
            Some(Commands::Setup(cmd)) => cmd.execute().await,
            Some(Commands::Start(cmd)) => cmd.execute().await,
            Some(Commands::Hotreload(cmd)) => cmd.execute().await,
            Some(Commands::Logs(cmd)) => cmd.execute().await,
            Some(Commands::Systemd(cmd)) => cmd.execute().await,
            Some(Commands::Update(cmd)) => cmd.execute().await,
            None => {
                Self::command().print_help()?;
                println!();
                Ok(())
            }
        }
    }
}
