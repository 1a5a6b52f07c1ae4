//! A tiny HTTP file server on `127.0.0.1:0`.
//!
//! Unknown paths answer `404 Not Found`. Every request is recorded so tests
//! can assert on headers such as `Cache-Control`.

use axum::Router;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// A request observed by [`StaticServer`].
#[derive(Clone, Debug)]
pub struct SeenRequest {
    pub method: String,
    pub path: String,
    pub cache_control: Option<String>,
}

#[derive(Default)]
struct Shared {
    routes: Mutex<HashMap<String, (StatusCode, Vec<u8>)>>,
    seen: Mutex<Vec<SeenRequest>>,
}

/// Serves fixed bodies by path until dropped.
pub struct StaticServer {
    addr: SocketAddr,
    shared: Arc<Shared>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl StaticServer {
    /// Bind an ephemeral port and start serving.
    pub async fn spawn() -> Self {
        let shared = Arc::new(Shared::default());
        let app = Router::new().fallback(respond).with_state(shared.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = rx.await;
                })
                .await;
        });

        Self {
            addr,
            shared,
            shutdown: Some(tx),
        }
    }

    /// Answer `path` with `status` and `body`, replacing any earlier route.
    pub fn serve(&self, path: &str, status: StatusCode, body: Vec<u8>) {
        self.shared.routes.lock().unwrap().insert(path.to_string(), (status, body));
    }

    /// Absolute URL of `path` on this server.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<SeenRequest> {
        self.shared.seen.lock().unwrap().clone()
    }
}

impl Drop for StaticServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

async fn respond(State(shared): State<Arc<Shared>>, request: Request) -> Response {
    let path = request.uri().path().to_string();
    shared.seen.lock().unwrap().push(SeenRequest {
        method: request.method().to_string(),
        path: path.clone(),
        cache_control: request
            .headers()
            .get(header::CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    });

    let route = shared.routes.lock().unwrap().get(&path).cloned();
    match route {
        Some((status, body)) => (status, Body::from(body)).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
