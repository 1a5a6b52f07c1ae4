//! Build identity: the release channel and version baked into the binary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Deployment track a binary was built for.
///
/// The channel selects the namespace on the release server that metadata and
/// archives are fetched from. A binary only ever updates from its own channel,
/// so a `prod` install can never pick up a `dev` build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Production releases.
    Prod,
    /// Development builds. Default for local builds.
    #[default]
    Dev,
}

impl Channel {
    /// The channel this binary was compiled for.
    ///
    /// Read from the `HOSTSHIP_CHANNEL` variable at compile time; anything
    /// unrecognised falls back to [`Channel::Dev`].
    #[must_use]
    pub fn current() -> Self {
        option_env!("HOSTSHIP_CHANNEL").and_then(|raw| raw.parse().ok()).unwrap_or_default()
    }

    /// Path segment used on the release server.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prod => "prod",
            Self::Dev => "dev",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prod" => Ok(Self::Prod),
            "dev" => Ok(Self::Dev),
            other => Err(format!("unknown channel '{other}' (expected 'prod' or 'dev')")),
        }
    }
}

/// Version of the running binary.
///
/// Release builds inject `HOSTSHIP_VERSION` at compile time; local builds
/// report the crate version.
#[must_use]
pub fn current_version() -> &'static str {
    option_env!("HOSTSHIP_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// The line printed by `hostship -v`: `<channel> <version>`.
#[must_use]
pub fn version_line() -> String {
    format!("{} {}", Channel::current(), current_version())
}
