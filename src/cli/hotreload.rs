//! `hostship hotreload`: run the update listener in the foreground.
//!
//! This is what the systemd unit starts. It stops on Ctrl-C or SIGTERM.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{ConfigSource, LayeredConfig};
use crate::constants::{GRACEFUL_SHUTDOWN_TIMEOUT, LISTENER_PORT, STACK_DEFINITION_PATH};
use crate::fetch::ArtifactFetcher;
use crate::hotreload::{ListenerState, UpdateOrchestrator, bind, serve};
use crate::stack::{ComposeClient, StackController};

/// Run only the hot-reload listener.
#[derive(Args, Debug)]
pub struct HotreloadCommand {
    /// Verbose output.
    #[arg(short, long)]
    pub(super) verbose: bool,
}

impl HotreloadCommand {
    pub async fn execute(self) -> Result<()> {
        let config: Arc<dyn ConfigSource> = Arc::new(LayeredConfig::standard());
        let controller: Arc<dyn StackController> = Arc::new(ComposeClient::new());
        let (orchestrator, worker) =
            UpdateOrchestrator::spawn(PathBuf::from(STACK_DEFINITION_PATH), ArtifactFetcher::new()?, controller);
        info!("Serving updates for {}", orchestrator.stack_path().display());
        let state = ListenerState::new(config, Arc::new(orchestrator));

        let listener = bind(LISTENER_PORT).await?;
        serve(listener, state, worker, shutdown_signal(), GRACEFUL_SHUTDOWN_TIMEOUT).await?;
        info!("Listener exited");
        Ok(())
    }
}

/// Resolves on Ctrl-C, or on SIGTERM where available.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl-C"),
        () = terminate => info!("Received SIGTERM"),
    }
}
