pub mod server;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use common::{VisageError, VisageFilter};
use log::{error, info};
use serde_json::{json, Value};
use std::sync::Arc;

pub use server::ControlServer;

#[derive(Clone)]
struct ControlState {
    filter: Arc<VisageFilter>,
}

pub fn get_router(filter: Arc<VisageFilter>) -> Router {
    let state = ControlState { filter };

    Router::new()
        .route("/mode", get(mode_handler).post(set_mode_handler))
        .route("/model/save", post(save_model_handler))
        .route("/status", get(status_handler))
        .with_state(state)
}

async fn mode_handler(State(state): State<ControlState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "mode": state.filter.mode()
    }))
}

fn bad_request(message: String) -> (StatusCode, Json<Value>) {
    info!("Rejected mode change: {}", message);
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "status": "error",
            "message": message
        })),
    )
}

/// Accepts `{"mode": "mesh"}` or a raw code such as `{"mode": 2}`.
async fn set_mode_handler(
    State(state): State<ControlState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> (StatusCode, Json<Value>) {
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => return bad_request(rejection.body_text()),
    };

    let result = match payload.get("mode") {
        Some(Value::String(name)) => state.filter.set_mode_by_name(name),
        Some(Value::Number(code)) => match code.as_u64().and_then(|c| u8::try_from(c).ok()) {
            Some(code) => state.filter.set_mode_code(code),
            None => Err(VisageError::InvalidMode(code.to_string())),
        },
        Some(other) => Err(VisageError::InvalidMode(other.to_string())),
        None => return bad_request("missing \"mode\" field".to_string()),
    };

    match result {
        Ok(previous) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "previous": previous,
                "mode": state.filter.mode()
            })),
        ),
        Err(e) => bad_request(e.to_string()),
    }
}

async fn save_model_handler(State(state): State<ControlState>) -> (StatusCode, Json<Value>) {
    let filter = state.filter.clone();
    let result = match tokio::task::spawn_blocking(move || filter.save_model()).await {
        Ok(result) => result,
        Err(e) => {
            error!("Model save task failed: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "status": "error",
                    "message": "save task did not complete"
                })),
            );
        }
    };

    match result {
        Ok(path) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "path": path.display().to_string()
            })),
        ),
        Err(e) => {
            let code = match e {
                VisageError::NoModelSource => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (
                code,
                Json(json!({
                    "status": "error",
                    "message": e.to_string()
                })),
            )
        }
    }
}

async fn status_handler(State(state): State<ControlState>) -> Json<Value> {
    let filter = &state.filter;
    let geometry = filter.geometry().latest();
    Json(json!({
        "status": "ok",
        "mode": filter.mode(),
        "stats": filter.stats(),
        "face_tracked": geometry.as_ref().is_some_and(|g| !g.is_empty()),
        "landmarks": geometry.as_ref().map_or(0, |g| g.landmarks().len()),
        "model_path": filter.model_store().path().display().to_string()
    }))
}
