//! The managed container stack.
//!
//! - [`definition`]: reading, validating and persisting `compose.json`
//! - [`compose`]: the [`StackController`] seam and its `docker compose`
//!   implementation
//! - [`installer`]: installing Docker and the compose plugin on a fresh host

pub mod compose;
pub mod definition;
pub mod installer;

pub use compose::{ComposeClient, StackController};
