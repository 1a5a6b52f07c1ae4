//! hostship - keeps one Docker Compose stack and its own binary up to date.
//!
//! hostship runs on a single host next to a Compose stack described by a JSON
//! file (`compose.json`). It has two update paths:
//!
//! - **Self-update** (`hostship update`): compare the running version with the
//!   release channel's `metadata.json`, download the platform archive, swap
//!   the executable in place and run the new binary once to prove it starts.
//!   A binary that fails to start is rolled back.
//! - **Hot reload** (`hostship hotreload`, normally started by systemd): an
//!   HTTP listener that accepts `POST /update/<key>` from the deploy pipeline,
//!   refreshes `compose.json` from its `x-metadata.url`, pulls images and
//!   restarts the stack in the background.
//!
//! # Modules
//!
//! - [`cli`] - command-line surface
//! - [`config`] - build identity and layered runtime settings
//! - [`constants`] - paths, endpoints and timeouts
//! - [`core`] - error types and terminal error reporting
//! - [`fetch`] - HTTP downloads of metadata, archives and definitions
//! - [`hotreload`] - update listener, capability check and orchestration
//! - [`stack`] - stack definition store and `docker compose` driver
//! - [`systemd`] - service unit management
//! - [`upgrade`] - self-update engine
//! - [`utils`] - host commands, file helpers, platform naming, spinners

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod fetch;
pub mod hotreload;
pub mod stack;
pub mod systemd;
pub mod upgrade;
pub mod utils;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
