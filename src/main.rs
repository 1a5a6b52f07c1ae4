//! hostship CLI entry point
//!
//! Parses arguments, installs logging, runs the command and turns a failure
//! into a readable message with exit status 1.

use anyhow::Result;
use clap::Parser;
use hostship::cli;
use hostship::core::error::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.init_logging();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            user_friendly_error(e).display();
            std::process::exit(1);
        }
    }
}
