//! The update listener driven through its router.

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use hostship::config::StaticConfig;
use hostship::fetch::ArtifactFetcher;
use hostship::hotreload::{ListenerState, RestartWorker, UpdateOrchestrator, router};
use hostship::test_utils::{FakeController, StackFixture, StaticServer};
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

const DEPLOY_URL: &str = "http://172.17.0.1:8080/update/abc123";

struct Listener {
    _temp: TempDir,
    upstream: StaticServer,
    stack_path: PathBuf,
    controller: Arc<FakeController>,
    app: Router,
    _worker: RestartWorker,
}

async fn listener(deploy_url: Option<&str>) -> Listener {
    let temp = TempDir::new().unwrap();
    let upstream = StaticServer::spawn().await;
    let stack_path = temp.path().join("compose.json");
    StackFixture::new()
        .service("web", "nginx:1")
        .metadata_url(&upstream.url("/compose.json"))
        .write_to(&stack_path);

    let mut config = StaticConfig::new();
    if let Some(url) = deploy_url {
        config = config.with("DEPLOY_URL", url);
    }
    let controller = Arc::new(FakeController::new());
    let (orchestrator, worker) =
        UpdateOrchestrator::spawn(&stack_path, ArtifactFetcher::new().unwrap(), controller.clone());
    let app = router(ListenerState::new(Arc::new(config), Arc::new(orchestrator)));

    Listener {
        _temp: temp,
        upstream,
        stack_path,
        controller,
        app,
        _worker: worker,
    }
}

async fn send(app: &Router, method: Method, path: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().method(method).uri(path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_unknown_endpoints() {
    let l = listener(Some(DEPLOY_URL)).await;

    for (method, path) in [
        (Method::GET, "/update/abc123"),
        (Method::PUT, "/update/abc123"),
        (Method::POST, "/other"),
        (Method::POST, "/"),
        (Method::POST, "/update/abc123/extra"),
    ] {
        let (status, body) = send(&l.app, method.clone(), path).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{method} {path}");
        assert_eq!(body, json!({ "error": "unknown endpoint" }));
    }
    assert!(l.controller.calls().is_empty());
}

#[tokio::test]
async fn test_missing_key() {
    let l = listener(Some(DEPLOY_URL)).await;
    let (status, body) = send(&l.app, Method::POST, "/update/").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "missing key" }));
}

#[tokio::test]
async fn test_wrong_key() {
    let l = listener(Some(DEPLOY_URL)).await;
    let before = std::fs::read(&l.stack_path).unwrap();

    let (status, body) = send(&l.app, Method::POST, "/update/wrong").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({ "error": "invalid key" }));
    assert_eq!(std::fs::read(&l.stack_path).unwrap(), before);
    assert!(l.upstream.requests().is_empty());
}

#[tokio::test]
async fn test_deploy_url_problems_fail_closed() {
    for deploy_url in [None, Some("::not a url"), Some("http://172.17.0.1:8080/hooks/abc123")] {
        let l = listener(deploy_url).await;
        let (status, body) = send(&l.app, Method::POST, "/update/abc123").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{deploy_url:?}");
        assert!(body["error"].as_str().unwrap().starts_with("invalid DEPLOY_URL"));
        assert!(l.upstream.requests().is_empty());
    }
}

#[tokio::test]
async fn test_authorised_update_replaces_definition_and_restarts() {
    let l = listener(Some(DEPLOY_URL)).await;
    let candidate = StackFixture::new()
        .service("web", "nginx:2")
        .service("worker", "app:2")
        .metadata_url(&l.upstream.url("/compose.json"))
        .to_bytes();
    l.upstream.serve("/compose.json", StatusCode::OK, candidate.clone());

    let (status, body) = send(&l.app, Method::POST, "/update/abc123").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "updated" }));
    assert_eq!(std::fs::read(&l.stack_path).unwrap(), candidate);

    assert!(l.controller.wait_for_up(Duration::from_secs(5)).await);
    assert_eq!(l.controller.actions(), vec!["pull", "up"]);
    let calls = l.controller.calls();
    assert_eq!(calls[0].project, "hostship");
    assert_eq!(calls[0].services, vec!["web", "worker"]);

    let requests = l.upstream.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].cache_control.as_deref(), Some("no-cache"));
}

#[tokio::test]
async fn test_candidate_without_services_is_rejected() {
    let l = listener(Some(DEPLOY_URL)).await;
    let before = std::fs::read(&l.stack_path).unwrap();
    l.upstream.serve("/compose.json", StatusCode::OK, br#"{"services":{}}"#.to_vec());

    let (status, body) = send(&l.app, Method::POST, "/update/abc123").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "compose file must define services" }));
    assert_eq!(std::fs::read(&l.stack_path).unwrap(), before);
    assert!(l.controller.calls().is_empty());
}

#[tokio::test]
async fn test_upstream_failure_is_reported() {
    let l = listener(Some(DEPLOY_URL)).await;
    l.upstream.serve("/compose.json", StatusCode::SERVICE_UNAVAILABLE, Vec::new());

    let (status, body) = send(&l.app, Method::POST, "/update/abc123").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("503"));
    assert!(l.controller.calls().is_empty());
}
