//! Test utilities for hostship
//!
//! Compiled for unit tests and, through the `test-utils` feature, for the
//! integration suite.
//!
//! - [`fixtures`]: release tarballs and stack definitions
//! - [`server`]: a throwaway HTTP server standing in for the release server
//!   and the stack-definition origin
//! - [`controller`]: a recording [`StackController`](crate::stack::StackController)
//!
//! # Example
//!
//! ```rust,no_run
//! use hostship::test_utils::{StaticServer, TarballBuilder};
//! use axum::http::StatusCode;
//!
//! # async fn example() {
//! let server = StaticServer::spawn().await;
//! let archive = TarballBuilder::new().file("hostship", b"#!/bin/sh\n").build();
//! server.serve("/dev/hostship_linux_amd64.tar.gz", StatusCode::OK, archive);
//! # }
//! ```

pub mod controller;
pub mod fixtures;
pub mod server;

pub use controller::{ControllerCall, FakeController};
pub use fixtures::{StackFixture, TarballBuilder};
pub use server::{SeenRequest, StaticServer};

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Runs once per process. Uses `level` if given, otherwise `RUST_LOG`; with
/// neither, tests run without a subscriber.
///
/// ```bash
/// RUST_LOG=hostship=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}
