use anyhow::bail;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use common::{ModelSource, ModelState, ModelStore, OverlayStyle, ViewMode, VisageFilter};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use visage_d::control::get_router;

struct FixedSource;

impl ModelSource for FixedSource {
    fn capture(&self) -> anyhow::Result<ModelState> {
        Ok(ModelState::new(b"{\"samples\":1}".to_vec()))
    }
}

struct BrokenSource;

impl ModelSource for BrokenSource {
    fn capture(&self) -> anyhow::Result<ModelState> {
        bail!("tracker not ready")
    }
}

fn setup(dir: &TempDir) -> (Arc<VisageFilter>, Router) {
    let filter = Arc::new(VisageFilter::with_parts(
        ViewMode::FeaturePoints,
        OverlayStyle::default(),
        ModelStore::new(dir.path(), "face_model.bin"),
    ));
    let router = get_router(filter.clone());
    (filter, router)
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn get_mode_reports_current_mode() {
    let dir = TempDir::new().unwrap();
    let (filter, router) = setup(&dir);
    filter.set_mode(ViewMode::Wireframe);

    let (status, body) = send(router, get("/mode")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "wireframe");
}

#[tokio::test]
async fn post_mode_switches_and_reports_previous() {
    let dir = TempDir::new().unwrap();
    let (filter, router) = setup(&dir);

    let (status, body) = send(router, post_json("/mode", r#"{"mode":"mesh"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["previous"], "points");
    assert_eq!(body["mode"], "mesh");
    assert_eq!(filter.mode(), ViewMode::Mesh);
}

#[tokio::test]
async fn unknown_mode_is_bad_request_and_keeps_mode() {
    let dir = TempDir::new().unwrap();
    let (filter, router) = setup(&dir);
    filter.set_mode(ViewMode::Mesh);

    let (status, body) = send(router, post_json("/mode", r#"{"mode":"sparkles"}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert_eq!(filter.mode(), ViewMode::Mesh);
}

#[tokio::test]
async fn numeric_mode_code_switches_mode() {
    let dir = TempDir::new().unwrap();
    let (filter, router) = setup(&dir);

    let (status, body) = send(router, post_json("/mode", r#"{"mode":2}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["previous"], "points");
    assert_eq!(body["mode"], "mesh");
    assert_eq!(filter.mode(), ViewMode::Mesh);
}

#[tokio::test]
async fn bad_mode_payloads_get_json_bad_request() {
    let dir = TempDir::new().unwrap();
    let (filter, router) = setup(&dir);
    filter.set_mode(ViewMode::Wireframe);

    for body in [r#"{"mode":7}"#, r#"{"mode":-1}"#, r#"{"mode":true}"#, r#"{"view":"mesh"}"#, "{not json"] {
        let (status, reply) = send(router.clone(), post_json("/mode", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {}", body);
        assert_eq!(reply["status"], "error", "body {}", body);
        assert!(reply["message"].is_string());
    }

    let no_content_type = Request::builder()
        .method("POST")
        .uri("/mode")
        .body(Body::from(r#"{"mode":"mesh"}"#))
        .unwrap();
    let (status, reply) = send(router, no_content_type).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(reply["status"], "error");
    assert_eq!(filter.mode(), ViewMode::Wireframe);
}

#[tokio::test]
async fn save_writes_model_file() {
    let dir = TempDir::new().unwrap();
    let (filter, router) = setup(&dir);
    filter.attach_model_source(Arc::new(FixedSource));

    let (status, body) = send(router, post_json("/model/save", "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(
        std::fs::read(dir.path().join("face_model.bin")).unwrap(),
        b"{\"samples\":1}"
    );
}

#[tokio::test]
async fn save_without_source_is_unavailable() {
    let dir = TempDir::new().unwrap();
    let (_filter, router) = setup(&dir);

    let (status, body) = send(router, post_json("/model/save", "")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn failed_capture_is_server_error() {
    let dir = TempDir::new().unwrap();
    let (filter, router) = setup(&dir);
    filter.attach_model_source(Arc::new(BrokenSource));

    let (status, body) = send(router, post_json("/model/save", "")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["message"].as_str().unwrap().contains("tracker not ready"));
    assert!(!dir.path().join("face_model.bin").exists());
}

#[tokio::test]
async fn status_reports_stats_and_storage() {
    let dir = TempDir::new().unwrap();
    let (filter, router) = setup(&dir);
    let input = common::Frame::new(4, 4);
    let mut output = common::Frame::new(4, 4);
    filter.render_frame(&input, &mut output);

    let (status, body) = send(router, get("/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "points");
    assert_eq!(body["stats"]["frames"], 1);
    assert_eq!(body["stats"]["passthrough_frames"], 1);
    assert_eq!(body["face_tracked"], false);
    assert!(body["model_path"]
        .as_str()
        .unwrap()
        .ends_with("face_model.bin"));
}
