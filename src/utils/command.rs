//! Builder for running host tools (`docker`, `systemctl`, `sh`).
//!
//! Every external process hostship starts goes through [`HostCommand`] so
//! that timeouts, dry-run printing, output capture and error mapping behave
//! the same everywhere.
//!
//! ```rust,no_run
//! use hostship::utils::HostCommand;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), hostship::core::HostshipError> {
//! let output = HostCommand::docker()
//!     .args(["compose", "version"])
//!     .with_timeout(Some(Duration::from_secs(30)))
//!     .execute()
//!     .await?;
//! println!("{}", output.stdout);
//! # Ok(())
//! # }
//! ```

use colored::Colorize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use crate::core::HostshipError;

use super::platform::is_root;

/// Captured output of a finished command.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Stdout followed by stderr.
    pub fn combined(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }
}

/// A host command with consistent execution and error handling.
#[derive(Debug, Clone)]
pub struct HostCommand {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    capture_output: bool,
    timeout_duration: Option<Duration>,
    context: Option<String>,
    dry_run: bool,
}

impl HostCommand {
    /// Run `program`. Output is captured and there is no timeout.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            capture_output: true,
            timeout_duration: None,
            context: None,
            dry_run: false,
        }
    }

    pub fn docker() -> Self {
        Self::new("docker")
    }

    /// `systemctl`, prefixed with `sudo` unless running as root.
    pub fn systemctl() -> Self {
        Self::privileged("systemctl")
    }

    /// `program`, prefixed with `sudo` unless running as root.
    pub fn privileged(program: &str) -> Self {
        if is_root() {
            Self::new(program)
        } else {
            Self::new("sudo").arg(program)
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Let the command write straight to the terminal.
    pub const fn inherit_stdio(mut self) -> Self {
        self.capture_output = false;
        self
    }

    /// Set a timeout (`None` waits forever).
    pub const fn with_timeout(mut self, duration: Option<Duration>) -> Self {
        self.timeout_duration = duration;
        self
    }

    /// Label included in log lines, e.g. the service being operated on.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Print the command instead of running it.
    pub const fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Program and arguments as a shell-like line.
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }

    /// Program and arguments.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() + 1);
        argv.push(self.program.clone());
        argv.extend(self.args.iter().cloned());
        argv
    }

    /// The subcommand words used in error messages (`compose pull`,
    /// `daemon-reload`, ...).
    fn operation(&self) -> String {
        let words: Vec<&str> = self
            .args
            .iter()
            .map(String::as_str)
            .filter(|a| !a.starts_with('-') && *a != "systemctl")
            .take(2)
            .collect();
        if self.program == "docker" && words.first() == Some(&"compose") {
            // `docker compose -f file --project-name p pull`: report `compose pull`.
            let verb = self.args.iter().map(String::as_str).find(|a| {
                matches!(*a, "pull" | "up" | "down" | "version" | "logs" | "ps")
            });
            return match verb {
                Some(verb) => format!("compose {verb}"),
                None => "compose".to_string(),
            };
        }
        words.first().map_or_else(|| self.program.clone(), |w| (*w).to_string())
    }

    fn failure(&self, detail: String) -> HostshipError {
        let tool = self.argv().into_iter().find(|a| a != "sudo").unwrap_or_default();
        match tool.as_str() {
            "docker" => HostshipError::DockerCommandError {
                operation: self.operation(),
                stderr: detail,
            },
            "systemctl" => HostshipError::ServiceManager {
                operation: self.operation(),
                reason: detail,
            },
            _ => HostshipError::Other {
                message: format!("{} failed: {}", self.display(), detail),
            },
        }
    }

    /// Run the command and require a zero exit status.
    pub async fn execute(self) -> Result<CommandOutput, HostshipError> {
        let line = self.display();
        if self.dry_run {
            println!("{} {}", "[dry-run]".cyan(), line);
            return Ok(CommandOutput::default());
        }

        match &self.context {
            Some(ctx) => debug!(target: "command", "({}) Executing: {}", ctx, line),
            None => debug!(target: "command", "Executing: {}", line),
        }

        let start = Instant::now();
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).kill_on_drop(true);
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        if self.capture_output {
            cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        } else {
            cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        }

        let run = cmd.output();
        let result = match self.timeout_duration {
            Some(duration) => match timeout(duration, run).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(target: "command", "Timed out after {}s: {}", duration.as_secs(), line);
                    return Err(
                        self.failure(format!("timed out after {} seconds", duration.as_secs()))
                    );
                }
            },
            None => run.await,
        };

        let output = match result {
            Ok(output) => output,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(HostshipError::ToolNotFound {
                    tool: self.program.clone(),
                });
            }
            Err(e) => return Err(self.failure(e.to_string())),
        };

        let captured = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        trace!(target: "command", "{} finished in {}ms", line, start.elapsed().as_millis());

        if !output.status.success() {
            debug!(target: "command", "Command failed with exit code: {:?}", output.status.code());
            let detail = if captured.stderr.trim().is_empty() {
                captured.stdout.trim().to_string()
            } else {
                captured.stderr.trim().to_string()
            };
            let detail = if detail.is_empty() { output.status.to_string() } else { detail };
            return Err(self.failure(detail));
        }

        if !captured.stdout.trim().is_empty() {
            debug!(target: "command", "{}", captured.stdout.trim());
        }
        Ok(captured)
    }

    /// Run the command and report only whether it succeeded.
    ///
    /// A missing program, a timeout or a non-zero exit all count as `false`.
    /// Probes always run, even when built with `dry_run(true)`.
    pub async fn succeeds(self) -> bool {
        self.dry_run(false).execute().await.is_ok()
    }
}
