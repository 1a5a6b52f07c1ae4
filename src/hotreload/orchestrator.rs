//! Refreshing the stack from its metadata URL.
//!
//! [`UpdateOrchestrator::apply`] runs the synchronous half of an update:
//! load the current definition, fetch the candidate from `x-metadata.url`,
//! validate, persist and pull. Bringing the stack up is handed to the
//! [`RestartWorker`] as a [`RestartJob`]; its outcome goes to the log only.
//!
//! Applies are serialised: a second trigger waits until the first has
//! finished pulling before it reads the definition.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::constants::{METADATA_URL_KEY, PROJECT_NAME};
use crate::core::HostshipError;
use crate::fetch::ArtifactFetcher;
use crate::stack::StackController;
use crate::stack::definition;

/// A request to bring the stack up in the background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartJob {
    pub definition: PathBuf,
    pub project: String,
    pub services: Vec<String>,
}

/// Sending side of the restart worker.
#[derive(Debug, Clone)]
pub struct RestartQueue {
    tx: mpsc::UnboundedSender<RestartJob>,
}

impl RestartQueue {
    /// Hand `job` to the worker. Returns `false` if the worker has stopped.
    pub fn submit(&self, job: RestartJob) -> bool {
        match self.tx.send(job) {
            Ok(()) => true,
            Err(e) => {
                warn!("Restart worker stopped; dropping restart of {}", e.0.definition.display());
                false
            }
        }
    }
}

/// Background task that runs [`StackController::up`] for queued jobs, one
/// at a time.
pub struct RestartWorker {
    handle: JoinHandle<()>,
}

impl RestartWorker {
    /// Start the worker. Must be called inside a Tokio runtime.
    pub fn spawn(controller: Arc<dyn StackController>) -> (RestartQueue, Self) {
        let (tx, mut rx) = mpsc::unbounded_channel::<RestartJob>();
        let handle = tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                debug!("Bringing up {} ({})", job.project, job.services.join(", "));
                match controller.up(&job.definition, &job.project, &job.services).await {
                    Ok(()) => info!("Stack {} is up", job.project),
                    Err(e) => error!("Failed to bring stack {} up: {}", job.project, e),
                }
            }
            debug!("Restart worker stopped");
        });
        (
            RestartQueue {
                tx,
            },
            Self {
                handle,
            },
        )
    }

    /// Wait for queued jobs to finish once every [`RestartQueue`] is gone.
    /// Gives up after `limit`; returns whether the worker finished.
    pub async fn drain(self, limit: Duration) -> bool {
        let mut handle = self.handle;
        match tokio::time::timeout(limit, &mut handle).await {
            Ok(_) => true,
            Err(_) => {
                warn!("Restart still running after {}s; abandoning it", limit.as_secs());
                handle.abort();
                false
            }
        }
    }
}

/// What a successful [`UpdateOrchestrator::apply`] did.
#[derive(Debug, Clone)]
pub struct UpdateReport {
    /// URL the definition was fetched from.
    pub source: String,
    /// Services declared by the new definition.
    pub services: Vec<String>,
    /// Output of the image pull.
    pub pull_output: String,
    /// Whether the restart was queued.
    pub restart_queued: bool,
}

/// Fetches, validates, persists and pulls a new stack definition.
pub struct UpdateOrchestrator {
    stack_path: PathBuf,
    project: String,
    fetcher: ArtifactFetcher,
    controller: Arc<dyn StackController>,
    restarts: RestartQueue,
    lock: Mutex<()>,
}

impl UpdateOrchestrator {
    pub fn new(
        stack_path: impl Into<PathBuf>,
        fetcher: ArtifactFetcher,
        controller: Arc<dyn StackController>,
        restarts: RestartQueue,
    ) -> Self {
        Self {
            stack_path: stack_path.into(),
            project: PROJECT_NAME.to_string(),
            fetcher,
            controller,
            restarts,
            lock: Mutex::new(()),
        }
    }

    /// Build an orchestrator together with its restart worker.
    pub fn spawn(
        stack_path: impl Into<PathBuf>,
        fetcher: ArtifactFetcher,
        controller: Arc<dyn StackController>,
    ) -> (Self, RestartWorker) {
        let (queue, worker) = RestartWorker::spawn(controller.clone());
        (Self::new(stack_path, fetcher, controller, queue), worker)
    }

    pub fn stack_path(&self) -> &Path {
        &self.stack_path
    }

    /// Refresh the stack definition and pull its images.
    ///
    /// The definition on disk is replaced before the pull; a failed pull
    /// leaves the new definition in place.
    pub async fn apply(&self) -> Result<UpdateReport> {
        let _guard = self.lock.lock().await;
        let path = self.stack_path.as_path();

        let current = definition::load(path)?;
        let source = definition::string_field(&current, METADATA_URL_KEY);
        if source.is_empty() {
            return Err(HostshipError::MissingMetadataUrl {
                key: METADATA_URL_KEY.to_string(),
                path: path.display().to_string(),
            }
            .into());
        }

        info!("Fetching stack definition from {}", source);
        let candidate = self
            .fetcher
            .fetch(&source)
            .await
            .with_context(|| format!("Failed to fetch stack definition from {source}"))?;
        let services = definition::service_names(&candidate)?;
        debug!("Candidate declares services: {}", services.join(", "));

        definition::save(path, &candidate)?;
        info!("Saved new stack definition to {}", path.display());

        let pull_output = self.controller.pull(path, &self.project, &services).await?;
        info!("Pulled images for {}", services.join(", "));

        let restart_queued = self.restarts.submit(RestartJob {
            definition: path.to_path_buf(),
            project: self.project.clone(),
            services: services.clone(),
        });

        Ok(UpdateReport {
            source,
            services,
            pull_output,
            restart_queued,
        })
    }
}
