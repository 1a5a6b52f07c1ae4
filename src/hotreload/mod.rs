//! Hot-reload listener.
//!
//! `hostship hotreload` runs a small HTTP server on port 8080. A `POST` to
//! the capability URL generated by `hostship setup`
//! (`http://172.17.0.1:8080/update/<key>`) refreshes `compose.json` from its
//! `x-metadata.url`, pulls the new images and restarts the stack.
//!
//! - [`auth`]: matching the request path against `DEPLOY_URL`
//! - [`orchestrator`]: the fetch / validate / save / pull sequence and the
//!   background restart worker
//! - [`server`]: the axum router, status mapping and graceful shutdown

pub mod auth;
pub mod orchestrator;
pub mod server;

pub use orchestrator::{RestartJob, RestartQueue, RestartWorker, UpdateOrchestrator, UpdateReport};
pub use server::{ListenerState, bind, router, serve};
