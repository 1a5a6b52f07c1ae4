//! Error handling for hostship
//!
//! This module provides the strongly-typed error enum used across the crate and
//! the user-facing error reporting used by the CLI entry point. The design
//! mirrors how failures are handled at runtime:
//!
//! 1. **Typed errors** ([`HostshipError`]) that callers can branch on, for
//!    example the hot-reload listener mapping authentication failures onto
//!    HTTP status codes.
//! 2. **User-friendly messages** ([`ErrorContext`]) with details and a
//!    suggestion, printed by `main` when a command fails.
//!
//! # Error Categories
//!
//! Every variant belongs to one [`ErrorCategory`]:
//! - **Network**: fetch and transport failures. Never retried automatically.
//! - **Format**: unparsable versions, malformed archives, missing archive entry.
//! - **Filesystem**: rename/write failures while swapping the executable.
//! - **Authentication**: missing/invalid capability token, bad `DEPLOY_URL`.
//! - **Orchestration**: stack validation or `docker compose` failures.
//! - **Platform**: missing tooling (docker, systemctl) and service manager errors.
//!
//! # Examples
//!
//! ```rust,no_run
//! use hostship::core::{HostshipError, user_friendly_error};
//!
//! let err = anyhow::Error::from(HostshipError::BinaryNotFound {
//!     archive: "/tmp/hostship_linux_amd64.tar.gz".to_string(),
//! });
//! user_friendly_error(err).display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// Broad classification of a [`HostshipError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Fetch and transport failures.
    Network,
    /// Malformed input: versions, archives, JSON documents.
    Format,
    /// Rename/write failures on the local filesystem.
    Filesystem,
    /// Capability checks on the update trigger.
    Authentication,
    /// Stack validation and stack controller failures.
    Orchestration,
    /// Missing host tooling and service-manager failures.
    Platform,
}

/// All failure cases raised by hostship itself.
#[derive(Error, Debug)]
pub enum HostshipError {
    /// A remote returned a non-success status.
    #[error("{url}: {status}")]
    FetchFailed {
        /// URL that was requested.
        url: String,
        /// Status line reported by the server (e.g. `404 Not Found`).
        status: String,
    },

    /// Transport-level failure talking to a remote.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// The release metadata document could not be decoded.
    #[error("invalid release metadata from {url}: {reason}")]
    InvalidReleaseInfo {
        /// URL of the metadata document.
        url: String,
        /// Decoder error.
        reason: String,
    },

    /// A version string reported by the release server is not semver.
    #[error("invalid version '{version}': {reason}")]
    InvalidVersion {
        /// The offending version string.
        version: String,
        /// Parser error.
        reason: String,
    },

    /// The release archive has no executable entry.
    #[error("binary not found in archive {archive}")]
    BinaryNotFound {
        /// Path of the archive that was scanned.
        archive: String,
    },

    /// The release archive could not be read.
    #[error("failed to read archive {archive}: {source}")]
    ArchiveRead {
        /// Path of the archive.
        archive: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Moving the running executable aside failed. Nothing was changed.
    #[error("failed to back up {path} to {backup}: {source}")]
    BackupFailed {
        /// Running executable.
        path: String,
        /// Intended backup location.
        backup: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Moving the staged executable into place failed. The backup was restored.
    #[error("failed to install {staged} as {path}: {source}")]
    SwapFailed {
        /// Staged executable.
        staged: String,
        /// Target path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The new executable did not answer the version query. The swap was undone.
    #[error("verification failed: {reason}")]
    VerificationFailed {
        /// Exit status and output of the failed invocation.
        reason: String,
    },

    /// Restoring the backup failed after an earlier failure.
    #[error("failed to restore {path} from {backup} after '{cause}': {reason}")]
    RollbackFailed {
        /// Path that should have been restored.
        path: String,
        /// Backup that could not be moved back.
        backup: String,
        /// The failure that triggered the rollback.
        cause: String,
        /// Why the rollback failed.
        reason: String,
    },

    /// No route matches the request.
    #[error("unknown endpoint")]
    UnknownEndpoint,

    /// `/update` was called without a token.
    #[error("missing key")]
    MissingKey,

    /// The presented token does not match the stored capability.
    #[error("invalid key")]
    InvalidKey,

    /// The locally stored deploy URL is unset or malformed.
    #[error("invalid DEPLOY_URL: {reason}")]
    DeployUrl {
        /// What is wrong with the stored URL.
        reason: String,
    },

    /// The stack definition is not usable.
    #[error("{reason}")]
    InvalidStackDefinition {
        /// What is wrong with the definition.
        reason: String,
    },

    /// The stack definition has no refresh URL.
    #[error("missing {key} in {path}")]
    MissingMetadataUrl {
        /// Dotted key that was looked up.
        key: String,
        /// Stack definition path.
        path: String,
    },

    /// A docker command exited unsuccessfully.
    #[error("docker {operation} failed: {stderr}")]
    DockerCommandError {
        /// Operation, e.g. `compose pull`.
        operation: String,
        /// Captured output of the command.
        stderr: String,
    },

    /// Docker (or the compose plugin) is not available.
    #[error("{tool} not found")]
    ToolNotFound {
        /// Missing tool.
        tool: String,
    },

    /// A systemctl invocation failed.
    #[error("service manager operation '{operation}' failed: {reason}")]
    ServiceManager {
        /// Operation that failed.
        operation: String,
        /// Failure detail.
        reason: String,
    },

    /// Low-level I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON decoding error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Anything else.
    #[error("{message}")]
    Other {
        /// Human readable message.
        message: String,
    },
}

impl HostshipError {
    /// Classify this error.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::FetchFailed { .. } | Self::Http(_) => ErrorCategory::Network,
            Self::InvalidReleaseInfo { .. }
            | Self::InvalidVersion { .. }
            | Self::BinaryNotFound { .. }
            | Self::ArchiveRead { .. }
            | Self::JsonError(_) => ErrorCategory::Format,
            Self::BackupFailed { .. }
            | Self::SwapFailed { .. }
            | Self::VerificationFailed { .. }
            | Self::RollbackFailed { .. }
            | Self::IoError(_) => ErrorCategory::Filesystem,
            Self::UnknownEndpoint | Self::MissingKey | Self::InvalidKey | Self::DeployUrl { .. } => {
                ErrorCategory::Authentication
            }
            Self::InvalidStackDefinition { .. }
            | Self::MissingMetadataUrl { .. }
            | Self::DockerCommandError { .. } => ErrorCategory::Orchestration,
            Self::ToolNotFound { .. } | Self::ServiceManager { .. } | Self::Other { .. } => {
                ErrorCategory::Platform
            }
        }
    }

    /// Whether this error means the archive had no executable entry.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::BinaryNotFound { .. })
    }
}

/// An error together with details and a suggestion for the operator.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error.
    pub error: HostshipError,
    /// Optional suggestion for fixing the problem.
    pub suggestion: Option<String>,
    /// Optional additional details.
    pub details: Option<String>,
}

impl ErrorContext {
    /// Wrap an error without details or suggestion.
    #[must_use]
    pub const fn new(error: HostshipError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Attach a suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Attach details.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

fn docker_hint(ctx: ErrorContext) -> ErrorContext {
    ctx.with_suggestion("Make sure docker and the compose plugin are installed and running")
}

/// Convert any error into an [`ErrorContext`] suitable for the terminal.
///
/// Typed [`HostshipError`]s found anywhere in the chain get a tailored
/// suggestion; everything else is reported with its full cause chain.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let chain_details = {
        let chain: Vec<String> =
            error.chain().skip(1).map(std::string::ToString::to_string).collect();
        if chain.is_empty() {
            None
        } else {
            Some(chain.join("\n  caused by: "))
        }
    };

    let typed = error.chain().find_map(|cause| cause.downcast_ref::<HostshipError>());
    if let Some(typed) = typed {
        let message = error.to_string();
        let ctx = ErrorContext::new(HostshipError::Other {
            message,
        });
        let ctx = match chain_details {
            Some(details) => ctx.with_details(details),
            None => ctx,
        };
        return match typed.category() {
            ErrorCategory::Network => ctx.with_suggestion(
                "Check network connectivity and that the release server is reachable",
            ),
            ErrorCategory::Format => match typed {
                HostshipError::BinaryNotFound { .. } | HostshipError::ArchiveRead { .. } => ctx
                    .with_suggestion("The release archive is incomplete; the current binary was not changed"),
                HostshipError::JsonError(_) => ctx,
                _ => ctx.with_suggestion("The release server returned malformed metadata; try again later"),
            },
            ErrorCategory::Filesystem => match typed {
                HostshipError::VerificationFailed { .. } => ctx.with_suggestion(
                    "The new binary failed to start; the previous version has been restored",
                ),
                HostshipError::RollbackFailed { backup, .. } => ctx.with_suggestion(format!(
                    "Restore the previous binary manually from {backup}"
                )),
                _ => ctx
                    .with_suggestion("Check write permissions on the directory containing hostship (try sudo)"),
            },
            ErrorCategory::Authentication => match typed {
                HostshipError::DeployUrl { .. } => {
                    ctx.with_suggestion("Run `hostship setup` to generate a DEPLOY_URL in .env")
                }
                _ => ctx,
            },
            ErrorCategory::Orchestration => match typed {
                HostshipError::DockerCommandError { .. } => docker_hint(ctx),
                _ => ctx.with_suggestion("Check compose.json; it must declare services and x-metadata.url"),
            },
            ErrorCategory::Platform => match typed {
                HostshipError::ToolNotFound { .. } => docker_hint(ctx),
                HostshipError::ServiceManager { .. } => {
                    ctx.with_suggestion("Check `hostship systemd status` and journalctl -u hostship")
                }
                _ => ctx,
            },
        };
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>()
        && io_error.kind() == std::io::ErrorKind::PermissionDenied
    {
        return ErrorContext::new(HostshipError::Other {
            message: error.to_string(),
        })
        .with_suggestion("Try running with elevated permissions (sudo) or check file ownership");
    }

    let mut message = error.to_string();
    if let Some(details) = chain_details {
        message.push_str("\n  caused by: ");
        message.push_str(&details);
    }
    ErrorContext::new(HostshipError::Other {
        message,
    })
}
