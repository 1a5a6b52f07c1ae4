//! Integration test suite for hostship
//!
//! End-to-end tests through the public API and the compiled binary. Network
//! peers are real HTTP servers on `127.0.0.1:0`; docker is replaced by a
//! recording fake controller, so no test touches the host's containers.
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! - **cli**: the binary's version query and help output
//! - **hotreload**: the update listener's status codes and side effects
//! - **self_update**: the self-update engine against a fake release server

mod cli;
mod hotreload;
mod self_update;
