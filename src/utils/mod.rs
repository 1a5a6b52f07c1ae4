//! Cross-platform utilities and helpers
//!
//! - [`command`] - running host tools with timeouts and dry-run support
//! - [`fs`] - atomic writes and permission handling
//! - [`platform`] - release naming, tool discovery, privilege detection
//! - [`progress`] - spinners for long-running network operations

pub mod command;
pub mod fs;
pub mod platform;
pub mod progress;

pub use command::{CommandOutput, HostCommand};
pub use fs::{atomic_write, ensure_dir, write_with_mode};
pub use platform::{archive_name, binary_names, command_exists, is_root};
pub use progress::Spinner;

/// Shorten a secret for logging: at most four leading characters followed by
/// `…`. At least half of the secret is always hidden.
#[must_use]
pub fn redact(secret: &str) -> String {
    let shown = (secret.chars().count() / 2).min(4);
    let prefix: String = secret.chars().take(shown).collect();
    format!("{prefix}…")
}
