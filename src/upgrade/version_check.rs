//! Version gate for self-updates.
//!
//! The release server is the source of truth: its version must be valid
//! semver. The running binary's own version may be anything (development
//! builds report e.g. `dev`), and an unparsable local version is treated as
//! `0.0.0` so that an update always proceeds.

use semver::Version;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::HostshipError;

/// Release metadata published at `{base}/{channel}/metadata.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseInfo {
    /// Latest published version on the channel.
    pub version: String,
}

/// Parse a version string, accepting an optional leading `v` and missing
/// minor or patch components (`1.2` is `1.2.0`, `1` is `1.0.0`).
pub fn parse_version(version: &str) -> Result<Version, semver::Error> {
    let trimmed = version.trim();
    let bare = trimmed.strip_prefix('v').unwrap_or(trimmed);
    let core_end = bare.find(['-', '+']).unwrap_or(bare.len());
    let (core, suffix) = bare.split_at(core_end);

    let components = core.split('.').count();
    if core.is_empty() || components >= 3 {
        return Version::parse(bare);
    }
    let padding = ".0".repeat(3 - components);
    Version::parse(&format!("{core}{padding}{suffix}"))
}

/// Decide whether `latest` should replace `current`.
///
/// Returns `true` only when `latest` is strictly greater. An unparsable
/// `current` counts as the lowest version; an unparsable `latest` is an
/// [`HostshipError::InvalidVersion`].
pub fn should_update(current: &str, latest: &str) -> Result<bool, HostshipError> {
    let latest_version = parse_version(latest).map_err(|e| HostshipError::InvalidVersion {
        version: latest.to_string(),
        reason: e.to_string(),
    })?;

    let current_version = parse_version(current).unwrap_or_else(|e| {
        debug!("Treating current version '{}' as 0.0.0: {}", current, e);
        Version::new(0, 0, 0)
    });

    Ok(latest_version > current_version)
}
