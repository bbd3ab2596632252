//! Defines the Axum API routes and handlers.

use crate::kiln::KilnController;
use crate::web::models::{StartRequest, StartResponse, StatusResponse, StopResponse};
use axum::{
    body::to_bytes,
    extract::{Form, FromRequest, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

pub type AppState = KilnController;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const MAX_START_BODY: usize = 4096;

/// Helper to create a JSON error response with a message and status code
fn json_error(message: &str, status: StatusCode) -> axum::response::Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

/// Creates the Axum router with all the API endpoints.
pub fn create_router(kiln: AppState) -> Router {
    Router::new()
        .route("/", get(get_status))
        .route("/start", post(start_firing))
        .route("/stop", post(stop_firing))
        .route("/log", get(get_log))
        .with_state(kiln)
}

/// GET / -- live temperature plus session state.
async fn get_status(State(kiln): State<AppState>) -> axum::response::Response {
    match kiln.status().await {
        Ok(status) => (StatusCode::OK, Json(StatusResponse::from(status))).into_response(),
        Err(e) => {
            tracing::warn!("Status request failed: {}", e);
            json_error(&e.to_string(), StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

/// POST /start -- begin (or restart) a firing at `set_temp`.
async fn start_firing(State(kiln): State<AppState>, request: Request) -> axum::response::Response {
    let request = match parse_start_request(request).await {
        Ok(request) => request,
        Err(message) => {
            tracing::warn!("Rejected start request: {}", message);
            return json_error(&message, StatusCode::BAD_REQUEST);
        }
    };

    let setpoint = match request.set_temp.as_deref() {
        Some(raw) => kiln.setpoint_limits().parse(raw),
        None => Ok(kiln.default_setpoint_f()),
    };
    let result = match setpoint {
        Ok(setpoint_f) => kiln.start_firing(setpoint_f).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(set_temp) => (
            StatusCode::OK,
            Json(StartResponse { status: "firing started", set_temp }),
        )
            .into_response(),
        Err(e) => {
            tracing::warn!("Rejected start request: {}", e);
            json_error(&e.to_string(), StatusCode::BAD_REQUEST)
        }
    }
}

/// Decode the `/start` body. A form body is parsed as such; a POST with no
/// body at all means "use the default setpoint". Any other body is refused.
async fn parse_start_request(request: Request) -> Result<StartRequest, String> {
    let is_form = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with(FORM_CONTENT_TYPE));
    if is_form {
        return Form::<StartRequest>::from_request(request, &())
            .await
            .map(|Form(request)| request)
            .map_err(|rejection| rejection.body_text());
    }

    let body = to_bytes(request.into_body(), MAX_START_BODY)
        .await
        .map_err(|e| format!("Failed to read request body: {}", e))?;
    if body.is_empty() {
        Ok(StartRequest::default())
    } else {
        Err(format!("Expected a {} body with a set_temp field", FORM_CONTENT_TYPE))
    }
}

/// POST /stop -- end the firing and force the heater off.
async fn stop_firing(State(kiln): State<AppState>) -> axum::response::Response {
    kiln.stop_firing().await;
    (StatusCode::OK, Json(StopResponse { status: "firing stopped" })).into_response()
}

/// GET /log -- every sample recorded so far, oldest first.
async fn get_log(State(kiln): State<AppState>) -> axum::response::Response {
    let samples = kiln.log().snapshot().await;
    (StatusCode::OK, Json(samples)).into_response()
}
