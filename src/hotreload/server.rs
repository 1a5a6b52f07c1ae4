//! HTTP listener for `POST /update/<key>`.
//!
//! | Outcome                           | Status | Body                        |
//! |-----------------------------------|--------|-----------------------------|
//! | not POST, or unknown path         | 404    | `{"error":"unknown endpoint"}` |
//! | `/update` without a key           | 401    | `{"error":"missing key"}`   |
//! | key does not match `DEPLOY_URL`   | 403    | `{"error":"invalid key"}`   |
//! | `DEPLOY_URL` unset or malformed   | 500    | `{"error":"invalid DEPLOY_URL: ..."}` |
//! | update failed                     | 500    | `{"error":"<message>"}`     |
//! | update applied                    | 200    | `{"status":"updated"}`      |

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::config::ConfigSource;
use crate::core::HostshipError;
use crate::utils::redact;

use super::auth;
use super::orchestrator::{RestartWorker, UpdateOrchestrator};

/// Shared state of the listener.
#[derive(Clone)]
pub struct ListenerState {
    config: Arc<dyn ConfigSource>,
    orchestrator: Arc<UpdateOrchestrator>,
}

impl ListenerState {
    pub fn new(config: Arc<dyn ConfigSource>, orchestrator: Arc<UpdateOrchestrator>) -> Self {
        Self {
            config,
            orchestrator,
        }
    }
}

/// Build the router. Every request goes through a single fallback handler so
/// that method and path are judged together.
pub fn router(state: ListenerState) -> Router {
    Router::new().fallback(handle).layer(TraceLayer::new_for_http()).with_state(state)
}

fn status_for(err: &HostshipError) -> StatusCode {
    match err {
        HostshipError::UnknownEndpoint => StatusCode::NOT_FOUND,
        HostshipError::MissingKey => StatusCode::UNAUTHORIZED,
        HostshipError::InvalidKey => StatusCode::FORBIDDEN,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn handle(State(state): State<ListenerState>, method: Method, uri: Uri) -> Response {
    if method != Method::POST {
        debug!("Rejecting {} {}", method, uri.path());
        let err = HostshipError::UnknownEndpoint;
        return error_response(status_for(&err), err.to_string());
    }

    let key = match auth::authorize(uri.path(), state.config.as_ref()) {
        Ok(key) => key,
        Err(err) => {
            let status = status_for(&err);
            if status.is_server_error() {
                error!("Cannot authorise update trigger: {}", err);
            } else {
                warn!("Rejected update trigger ({}): {}", status.as_u16(), err);
            }
            return error_response(status, err.to_string());
        }
    };

    info!("Update triggered with key {}", redact(key));
    debug!("Full key: {}", key);

    match state.orchestrator.apply().await {
        Ok(report) => {
            info!(
                "Stack updated from {} ({} services)",
                report.source,
                report.services.len()
            );
            (StatusCode::OK, Json(json!({ "status": "updated" }))).into_response()
        }
        Err(err) => {
            let message = format!("{err:#}");
            error!("Update failed: {}", message);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, message)
        }
    }
}

/// Bind the listener on all interfaces.
pub async fn bind(port: u16) -> Result<TcpListener> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    TcpListener::bind(addr).await.with_context(|| format!("Failed to bind {addr}"))
}

/// Serve until `shutdown` completes, then drain.
///
/// Once `shutdown` resolves no new connections are accepted. In-flight
/// requests and queued restarts get `grace` to finish; after that the
/// listener returns anyway.
pub async fn serve<F>(
    listener: TcpListener,
    state: ListenerState,
    worker: RestartWorker,
    shutdown: F,
    grace: Duration,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr().context("Listener has no local address")?;
    let app = router(state);

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let mut server = tokio::spawn(
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = stop_rx.await;
            })
            .into_future(),
    );
    info!("Listening for update triggers on {}", addr);

    tokio::select! {
        () = shutdown => {
            info!("Shutdown requested, draining connections");
        }
        result = &mut server => {
            result.context("Listener task panicked")?.context("Listener failed")?;
            return Ok(());
        }
    }

    let _ = stop_tx.send(());
    let started = tokio::time::Instant::now();
    match tokio::time::timeout(grace, &mut server).await {
        Ok(result) => {
            result.context("Listener task panicked")?.context("Listener failed")?;
            info!("Listener stopped");
        }
        Err(_) => {
            warn!("Connections still open after {}s; stopping anyway", grace.as_secs());
            server.abort();
        }
    }

    let remaining = grace.saturating_sub(started.elapsed());
    worker.drain(remaining).await;
    Ok(())
}
