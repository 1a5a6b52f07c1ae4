//! Self-update for the hostship executable.
//!
//! hostship updates itself from a release server organised by channel:
//!
//! ```text
//! {base}/{channel}/metadata.json                  {"version": "1.4.0"}
//! {base}/{channel}/hostship_{os}_{arch}.tar.gz    archive with the executable
//! ```
//!
//! An update runs the pipeline
//! [`should_update`] → [`ArtifactFetcher`](crate::fetch::ArtifactFetcher) →
//! [`archive::extract`] → [`AtomicReplacer`]. The replacer keeps the previous
//! executable as `<path>.old` and only accepts the new one after it has
//! answered `hostship -v`; any failure puts the previous executable back.
//!
//! # Module Structure
//!
//! - [`version_check`]: semver comparison and the release metadata document
//! - [`archive`]: locating the executable inside a release tarball
//! - [`replacer`]: backup/swap/verify state machine with rollback
//! - [`self_updater`]: the end-to-end update driven by `hostship update`
//!
//! # Examples
//!
//! ```rust,no_run
//! use hostship::config::LayeredConfig;
//! use hostship::upgrade::SelfUpdater;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let updater = SelfUpdater::new(&LayeredConfig::standard())?;
//! if let Some(latest) = updater.check_for_update().await? {
//!     println!("{} is available", latest);
//! }
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod replacer;
pub mod self_updater;
pub mod version_check;

#[cfg(test)]
mod tests;

pub use replacer::{
    AtomicReplacer, BinaryVerifier, ExecutablePaths, ProcessVerifier, ReplaceState, Replacement,
};
pub use self_updater::{SelfUpdater, UpdateStatus};
pub use version_check::{ReleaseInfo, should_update};
