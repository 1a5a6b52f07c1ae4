use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::{Channel, ConfigSource, current_version};
use crate::constants::{RELEASE_BASE_URL, RELEASE_METADATA_FILE, RELEASE_URL_KEY, STAGED_BINARY_NAME};
use crate::core::HostshipError;
use crate::fetch::ArtifactFetcher;
use crate::utils::archive_name;
use crate::utils::fs::set_mode;

use super::archive;
use super::replacer::{AtomicReplacer, BinaryVerifier, ExecutablePaths, ProcessVerifier};
use super::version_check::{ReleaseInfo, should_update};

/// Outcome of [`SelfUpdater::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateStatus {
    /// The release server has nothing newer.
    UpToDate {
        /// Version of the running binary.
        current: String,
        /// Version published on the channel.
        latest: String,
    },
    /// The executable was replaced and verified.
    Updated {
        /// Version that was running before.
        from: String,
        /// Version reported by the new executable.
        to: String,
        /// Location of the previous executable.
        backup: PathBuf,
    },
}

/// Updates the hostship executable from its release channel.
///
/// The sequence is: fetch `metadata.json`, compare versions, download the
/// platform archive into a temporary directory, extract the executable as
/// `hostship.new`, mark it executable and hand it to [`AtomicReplacer`].
/// Nothing outside that directory is touched until the replacer runs.
///
/// The temporary directory is created next to the executable by default, so
/// the final rename never crosses a filesystem boundary.
///
/// # Examples
///
/// ```rust,no_run
/// use hostship::config::LayeredConfig;
/// use hostship::upgrade::{SelfUpdater, UpdateStatus};
///
/// # async fn example() -> anyhow::Result<()> {
/// let updater = SelfUpdater::new(&LayeredConfig::standard())?;
/// match updater.update().await? {
///     UpdateStatus::UpToDate { current, .. } => println!("already on {current}"),
///     UpdateStatus::Updated { from, to, .. } => println!("{from} -> {to}"),
/// }
/// # Ok(())
/// # }
/// ```
pub struct SelfUpdater<V = ProcessVerifier> {
    fetcher: ArtifactFetcher,
    base_url: String,
    channel: Channel,
    current_version: String,
    executable: PathBuf,
    staging_dir: Option<PathBuf>,
    verifier: V,
    force: bool,
}

impl SelfUpdater<ProcessVerifier> {
    /// Create an updater for the running executable.
    ///
    /// The release server defaults to `https://cli.hostship.com` and can be
    /// overridden with `HOSTSHIP_RELEASE_URL`.
    pub fn new(config: &dyn ConfigSource) -> Result<Self> {
        let executable = std::env::current_exe().context("Failed to locate the running executable")?;
        let executable = std::fs::canonicalize(&executable).unwrap_or(executable);
        let base_url = config
            .get(RELEASE_URL_KEY)
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| RELEASE_BASE_URL.to_string());

        Ok(Self {
            fetcher: ArtifactFetcher::new()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            channel: Channel::current(),
            current_version: current_version().to_string(),
            executable,
            staging_dir: None,
            verifier: ProcessVerifier::default(),
            force: false,
        })
    }
}

impl<V: BinaryVerifier> SelfUpdater<V> {
    /// Replace a different executable than the running one.
    pub fn with_executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.executable = executable.into();
        self
    }

    /// Create the temporary staging directory under `dir` instead of next to
    /// the executable. `dir` must be on the executable's filesystem.
    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }

    /// Use a different release server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Pretend the running binary has `version`.
    pub fn with_current_version(mut self, version: impl Into<String>) -> Self {
        self.current_version = version.into();
        self
    }

    /// Install even when the published version is not newer.
    pub const fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Swap in a different verification step.
    pub fn with_verifier<W: BinaryVerifier>(self, verifier: W) -> SelfUpdater<W> {
        SelfUpdater {
            fetcher: self.fetcher,
            base_url: self.base_url,
            channel: self.channel,
            current_version: self.current_version,
            executable: self.executable,
            staging_dir: self.staging_dir,
            verifier,
            force: self.force,
        }
    }

    /// Version of the binary being replaced.
    pub fn current_version(&self) -> &str {
        &self.current_version
    }

    /// Path of the executable being replaced.
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Directory that receives the temporary staging area.
    pub fn staging_root(&self) -> &Path {
        match &self.staging_dir {
            Some(dir) => dir.as_path(),
            None => self
                .executable
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new(".")),
        }
    }

    /// `{base}/{channel}/metadata.json`
    pub fn metadata_url(&self) -> String {
        format!("{}/{}/{}", self.base_url, self.channel, RELEASE_METADATA_FILE)
    }

    /// `{base}/{channel}/hostship_{os}_{arch}.tar.gz`
    pub fn archive_url(&self) -> String {
        format!("{}/{}/{}", self.base_url, self.channel, archive_name())
    }

    /// Fetch the release metadata for this channel.
    pub async fn latest_release(&self) -> Result<ReleaseInfo> {
        let url = self.metadata_url();
        let body = self.fetcher.fetch(&url).await?;
        let info = serde_json::from_slice(&body).map_err(|e| HostshipError::InvalidReleaseInfo {
            url: url.clone(),
            reason: e.to_string(),
        })?;
        Ok(info)
    }

    /// Return the published version if it is newer than the running one.
    pub async fn check_for_update(&self) -> Result<Option<String>> {
        let latest = self.latest_release().await?;
        if should_update(&self.current_version, &latest.version)? {
            info!("Update available: {} -> {}", self.current_version, latest.version);
            Ok(Some(latest.version))
        } else {
            debug!("Already on latest version {}", self.current_version);
            Ok(None)
        }
    }

    /// Check, download, extract and swap in the latest release.
    pub async fn update(&self) -> Result<UpdateStatus> {
        let latest = self.latest_release().await?;
        let newer = should_update(&self.current_version, &latest.version)?;
        if !newer && !self.force {
            return Ok(UpdateStatus::UpToDate {
                current: self.current_version.clone(),
                latest: latest.version,
            });
        }
        info!(
            "Updating {} from {} to {} ({} channel)",
            self.executable.display(),
            self.current_version,
            latest.version,
            self.channel
        );

        let staging = tempfile::Builder::new()
            .prefix(".hostship-update-")
            .tempdir_in(self.staging_root())
            .with_context(|| {
                format!("Failed to create a staging directory in {}", self.staging_root().display())
            })?;
        let staged = self.download_and_stage(staging.path()).await?;

        let paths = ExecutablePaths::new(&self.executable, staged);
        let mut replacer = AtomicReplacer::new(paths, &self.verifier);
        let replacement = replacer.replace().await?;
        drop(staging);

        Ok(UpdateStatus::Updated {
            from: self.current_version.clone(),
            to: replacement.version,
            backup: replacement.backup,
        })
    }

    async fn download_and_stage(&self, dir: &Path) -> Result<PathBuf> {
        let archive_path = dir.join(archive_name());
        let staged = dir.join(STAGED_BINARY_NAME);

        let url = self.archive_url();
        self.fetcher
            .fetch_to_file(&url, &archive_path)
            .await
            .with_context(|| format!("Failed to download {url}"))?;

        let extract_from = archive_path.clone();
        let extract_to = staged.clone();
        let extracted =
            tokio::task::spawn_blocking(move || archive::extract(&extract_from, &extract_to))
                .await
                .context("Archive extraction task panicked")?;
        let _ = tokio::fs::remove_file(&archive_path).await;

        if let Err(e) = extracted {
            let _ = tokio::fs::remove_file(&staged).await;
            return Err(e.into());
        }

        set_mode(&staged, 0o755)?;
        debug!("Staged new executable at {}", staged.display());
        Ok(staged)
    }
}
