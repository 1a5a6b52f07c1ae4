//! Layered key/value configuration.
//!
//! The hot-reload listener and the self-updater read a handful of settings
//! (`DEPLOY_URL`, `HOSTSHIP_RELEASE_URL`) that may come from the process
//! environment or from a local `.env` file. Rather than mutating the process
//! environment, each source implements [`ConfigSource`] and a
//! [`LayeredConfig`] asks them in order. Tests substitute a
//! [`StaticConfig`].
//!
//! # `.env` format
//!
//! ```text
//! # comment
//! DEPLOY_URL=http://172.17.0.1:8080/update/0b7c...
//!
//! OTHER = value with spaces
//! ```
//!
//! Keys and values are trimmed, blank lines and `#` comments are skipped, and
//! lines without `=` are ignored. Only the first `=` splits the line.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::trace;

use crate::constants::ENV_FILE_PATH;

/// A read-only source of configuration values.
pub trait ConfigSource: Send + Sync {
    /// Look up `key`. `None` means this source does not define it.
    fn get(&self, key: &str) -> Option<String>;
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl ConfigSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// A `KEY=VALUE` file that is re-read on every lookup.
///
/// Re-reading keeps the listener in step with an operator editing `.env`
/// without a restart. A missing or unreadable file defines nothing.
#[derive(Debug, Clone)]
pub struct EnvFile {
    path: PathBuf,
}

impl EnvFile {
    /// Source backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the whole file.
    pub fn load(&self) -> HashMap<String, String> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => parse_env(&content),
            Err(e) => {
                trace!("No env file at {}: {}", self.path.display(), e);
                HashMap::new()
            }
        }
    }
}

impl ConfigSource for EnvFile {
    fn get(&self, key: &str) -> Option<String> {
        self.load().remove(key)
    }
}

/// A fixed map, used by tests and for explicit overrides.
#[derive(Debug, Clone, Default)]
pub struct StaticConfig {
    values: HashMap<String, String>,
}

impl StaticConfig {
    /// Empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl ConfigSource for StaticConfig {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Sources consulted in order; the first one defining a key wins.
#[derive(Clone, Default)]
pub struct LayeredConfig {
    layers: Vec<Arc<dyn ConfigSource>>,
}

impl LayeredConfig {
    /// No layers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a lower-priority layer.
    pub fn layer(mut self, source: impl ConfigSource + 'static) -> Self {
        self.layers.push(Arc::new(source));
        self
    }

    /// Production order: process environment first, then `env_file`.
    pub fn from_env_file(env_file: impl Into<PathBuf>) -> Self {
        Self::new().layer(ProcessEnv).layer(EnvFile::new(env_file))
    }

    /// Process environment, then `.env` in the working directory.
    pub fn standard() -> Self {
        Self::from_env_file(ENV_FILE_PATH)
    }
}

impl ConfigSource for LayeredConfig {
    fn get(&self, key: &str) -> Option<String> {
        self.layers.iter().find_map(|layer| layer.get(key))
    }
}

impl std::fmt::Debug for LayeredConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayeredConfig").field("layers", &self.layers.len()).finish()
    }
}

/// Parse `.env` content into a map. Later duplicates overwrite earlier ones.
pub fn parse_env(content: &str) -> HashMap<String, String> {
    let mut values = HashMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        values.insert(key.trim().to_string(), value.trim().to_string());
    }
    values
}
