//! Atomic replacement of the running executable.
//!
//! Three paths are involved: the current executable, its backup
//! (`<current>.old`) and the staged new executable. [`AtomicReplacer`] walks
//! them through a small state machine:
//!
//! ```text
//! Idle ──backup──▶ BackupTaken ──swap──▶ Swapped ──verify ok──▶ Verified
//!                       │                   └──verify failed──▶ RolledBack
//!                       └──swap failed──▶ RollbackOnRenameFailure
//! ```
//!
//! Every failure after the backup restores the previous executable. The only
//! failure that leaves no backup is the backup rename itself, which never
//! touches the live executable. On success the backup stays on disk for
//! manual recovery and is replaced by the next run.
//!
//! Verification is a live execution of the new binary, injected through
//! [`BinaryVerifier`] so the state machine can be tested without spawning
//! processes.

use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::constants::{BACKUP_SUFFIX, VERIFY_TIMEOUT, VERSION_QUERY_FLAG};
use crate::core::HostshipError;

/// Where the replacer currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceState {
    /// Nothing has been touched.
    Idle,
    /// The current executable has been moved to the backup path.
    BackupTaken,
    /// The staged executable sits at the current path, not yet verified.
    Swapped,
    /// The new executable answered the version query. Terminal.
    Verified,
    /// Verification failed and the backup was moved back. Terminal.
    RolledBack,
    /// Promoting the staged file failed and the backup was moved back. Terminal.
    RollbackOnRenameFailure,
}

impl fmt::Display for ReplaceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::BackupTaken => "backup-taken",
            Self::Swapped => "swapped",
            Self::Verified => "verified",
            Self::RolledBack => "rolled-back",
            Self::RollbackOnRenameFailure => "rollback-on-rename-failure",
        };
        f.write_str(name)
    }
}

/// Proves that an executable starts.
#[async_trait]
pub trait BinaryVerifier: Send + Sync {
    /// Run `exe` and return what it printed to stdout. An error means the
    /// executable is not fit to replace the current one.
    async fn verify(&self, exe: &Path) -> Result<String, HostshipError>;
}

/// Runs `<exe> -v` and requires a zero exit status.
#[derive(Debug, Clone)]
pub struct ProcessVerifier {
    timeout: Duration,
}

impl Default for ProcessVerifier {
    fn default() -> Self {
        Self {
            timeout: VERIFY_TIMEOUT,
        }
    }
}

impl ProcessVerifier {
    /// Use a custom timeout for the version query.
    pub const fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
        }
    }
}

#[async_trait]
impl BinaryVerifier for ProcessVerifier {
    async fn verify(&self, exe: &Path) -> Result<String, HostshipError> {
        debug!("Verifying {} {}", exe.display(), VERSION_QUERY_FLAG);
        let run = Command::new(exe).arg(VERSION_QUERY_FLAG).kill_on_drop(true).output();

        let output = match tokio::time::timeout(self.timeout, run).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(HostshipError::VerificationFailed {
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                return Err(HostshipError::VerificationFailed {
                    reason: format!("no answer within {}s", self.timeout.as_secs()),
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            debug!("{} wrote to stderr: {}", exe.display(), stderr.trim());
        }

        if !output.status.success() {
            let detail = if stderr.trim().is_empty() { stdout.trim() } else { stderr.trim() };
            return Err(HostshipError::VerificationFailed {
                reason: format!("{}: {}", output.status, detail),
            });
        }
        Ok(stdout)
    }
}

#[async_trait]
impl<'a, V: BinaryVerifier> BinaryVerifier for &'a V {
    async fn verify(&self, exe: &Path) -> Result<String, HostshipError> {
        (**self).verify(exe).await
    }
}

/// The current / backup / staged path triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutablePaths {
    /// The executable being replaced.
    pub current: PathBuf,
    /// `current` with the backup suffix appended.
    pub backup: PathBuf,
    /// The downloaded executable waiting to be promoted.
    pub staged: PathBuf,
}

impl ExecutablePaths {
    /// Derive the backup path from `current`.
    pub fn new(current: impl Into<PathBuf>, staged: impl Into<PathBuf>) -> Self {
        let current = current.into();
        let mut backup = current.clone().into_os_string();
        backup.push(BACKUP_SUFFIX);
        Self {
            current,
            backup: PathBuf::from(backup),
            staged: staged.into(),
        }
    }
}

/// Result of a verified replacement.
#[derive(Debug, Clone)]
pub struct Replacement {
    /// Version reported by the new executable.
    pub version: String,
    /// Standard output of the verification run.
    pub output: String,
    /// Where the previous executable was kept.
    pub backup: PathBuf,
}

/// Swaps the staged executable into place. See the module docs.
pub struct AtomicReplacer<V> {
    paths: ExecutablePaths,
    verifier: V,
    state: ReplaceState,
}

impl<V: BinaryVerifier> AtomicReplacer<V> {
    /// Create a replacer in the [`ReplaceState::Idle`] state.
    pub const fn new(paths: ExecutablePaths, verifier: V) -> Self {
        Self {
            paths,
            verifier,
            state: ReplaceState::Idle,
        }
    }

    /// Current state.
    pub const fn state(&self) -> ReplaceState {
        self.state
    }

    /// The paths being operated on.
    pub const fn paths(&self) -> &ExecutablePaths {
        &self.paths
    }

    /// Run the full backup, swap and verify sequence.
    pub async fn replace(&mut self) -> Result<Replacement, HostshipError> {
        if self.state != ReplaceState::Idle {
            return Err(HostshipError::Other {
                message: format!("replacement already ran (state: {})", self.state),
            });
        }

        self.take_backup().await?;
        self.swap().await?;
        self.verify().await
    }

    async fn take_backup(&mut self) -> Result<(), HostshipError> {
        let ExecutablePaths {
            current,
            backup,
            ..
        } = &self.paths;

        if let Err(e) = fs::remove_file(backup).await
            && e.kind() != std::io::ErrorKind::NotFound
        {
            debug!("Could not remove stale backup {}: {}", backup.display(), e);
        }

        fs::rename(current, backup).await.map_err(|source| HostshipError::BackupFailed {
            path: current.display().to_string(),
            backup: backup.display().to_string(),
            source,
        })?;
        debug!("Moved {} to {}", current.display(), backup.display());
        self.state = ReplaceState::BackupTaken;
        Ok(())
    }

    async fn swap(&mut self) -> Result<(), HostshipError> {
        let ExecutablePaths {
            current,
            staged,
            ..
        } = &self.paths;

        if let Err(source) = fs::rename(staged, current).await {
            let failure = HostshipError::SwapFailed {
                staged: staged.display().to_string(),
                path: current.display().to_string(),
                source,
            };
            warn!("{}; restoring previous executable", failure);
            self.restore(&failure).await?;
            let _ = fs::remove_file(staged).await;
            self.state = ReplaceState::RollbackOnRenameFailure;
            return Err(failure);
        }

        debug!("Moved {} to {}", staged.display(), current.display());
        self.state = ReplaceState::Swapped;
        Ok(())
    }

    async fn verify(&mut self) -> Result<Replacement, HostshipError> {
        match self.verifier.verify(&self.paths.current).await {
            Ok(output) => {
                self.state = ReplaceState::Verified;
                let version = reported_version(&output);
                info!("Verified {} (version {})", self.paths.current.display(), version);
                Ok(Replacement {
                    version,
                    output,
                    backup: self.paths.backup.clone(),
                })
            }
            Err(failure) => {
                warn!("{}; restoring previous executable", failure);
                self.restore(&failure).await?;
                self.state = ReplaceState::RolledBack;
                Err(failure)
            }
        }
    }

    async fn restore(&self, cause: &HostshipError) -> Result<(), HostshipError> {
        let ExecutablePaths {
            current,
            backup,
            ..
        } = &self.paths;

        fs::rename(backup, current).await.map_err(|e| HostshipError::RollbackFailed {
            path: current.display().to_string(),
            backup: backup.display().to_string(),
            cause: cause.to_string(),
            reason: e.to_string(),
        })
    }
}

/// The version printed by `hostship -v` is its last word (`<channel> <version>`).
pub fn reported_version(output: &str) -> String {
    output.split_whitespace().last().unwrap_or_default().to_string()
}
