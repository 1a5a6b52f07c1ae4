//! A [`StackController`] that records calls instead of running docker.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Notify;

use crate::core::HostshipError;
use crate::stack::StackController;

/// One recorded controller invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControllerCall {
    pub action: &'static str,
    pub definition: PathBuf,
    pub project: String,
    pub services: Vec<String>,
}

/// Recording controller with optional scripted failures.
#[derive(Default)]
pub struct FakeController {
    calls: Mutex<Vec<ControllerCall>>,
    fail_pull: Option<String>,
    fail_up: Option<String>,
    up_delay: Option<Duration>,
    up_done: Notify,
    pull_delay: Option<Duration>,
    pulls_in_flight: AtomicUsize,
    max_pulls_in_flight: AtomicUsize,
}

impl FakeController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `pull` fail with `stderr`.
    pub fn failing_pull(mut self, stderr: &str) -> Self {
        self.fail_pull = Some(stderr.to_string());
        self
    }

    /// Make `up` fail with `stderr`.
    pub fn failing_up(mut self, stderr: &str) -> Self {
        self.fail_up = Some(stderr.to_string());
        self
    }

    /// Make `up` take `delay` before returning.
    pub const fn slow_up(mut self, delay: Duration) -> Self {
        self.up_delay = Some(delay);
        self
    }

    /// Make `pull` take `delay` before returning.
    pub const fn slow_pull(mut self, delay: Duration) -> Self {
        self.pull_delay = Some(delay);
        self
    }

    /// Highest number of `pull` calls seen running at the same time.
    pub fn max_concurrent_pulls(&self) -> usize {
        self.max_pulls_in_flight.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<ControllerCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Recorded action names, e.g. `["pull", "up"]`.
    pub fn actions(&self) -> Vec<&'static str> {
        self.calls().iter().map(|c| c.action).collect()
    }

    /// Wait until `up` has returned, at most `limit`. Returns whether it did.
    pub async fn wait_for_up(&self, limit: Duration) -> bool {
        tokio::time::timeout(limit, self.up_done.notified()).await.is_ok()
    }

    fn record(&self, action: &'static str, definition: &Path, project: &str, services: &[String]) {
        self.calls.lock().unwrap().push(ControllerCall {
            action,
            definition: definition.to_path_buf(),
            project: project.to_string(),
            services: services.to_vec(),
        });
    }
}

#[async_trait]
impl StackController for FakeController {
    async fn pull(
        &self,
        definition: &Path,
        project: &str,
        services: &[String],
    ) -> Result<String, HostshipError> {
        self.record("pull", definition, project, services);
        let running = self.pulls_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_pulls_in_flight.fetch_max(running, Ordering::SeqCst);
        if let Some(delay) = self.pull_delay {
            tokio::time::sleep(delay).await;
        }
        self.pulls_in_flight.fetch_sub(1, Ordering::SeqCst);
        match &self.fail_pull {
            Some(stderr) => Err(HostshipError::DockerCommandError {
                operation: "compose pull".to_string(),
                stderr: stderr.clone(),
            }),
            None => Ok(format!("pulled {}", services.join(" "))),
        }
    }

    async fn up(
        &self,
        definition: &Path,
        project: &str,
        services: &[String],
    ) -> Result<(), HostshipError> {
        self.record("up", definition, project, services);
        if let Some(delay) = self.up_delay {
            tokio::time::sleep(delay).await;
        }
        let result = match &self.fail_up {
            Some(stderr) => Err(HostshipError::DockerCommandError {
                operation: "compose up".to_string(),
                stderr: stderr.clone(),
            }),
            None => Ok(()),
        };
        self.up_done.notify_one();
        result
    }
}
