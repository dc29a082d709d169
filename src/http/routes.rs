use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::context::AppContext;
use crate::error::{log_hub_error, ErrorCode};
use crate::ingest::{ingest, ExternalLevel, InputLevelsSample, SplMeterSample};
use crate::status::StatusSnapshot;

use super::ws::ws_handler;

/// HTTP error variants mapped to JSON responses.
#[derive(Debug)]
pub enum HttpServerError {
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for HttpServerError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// Health endpoint response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub subscribers: usize,
    pub samples: u64,
    pub uptime_ms: u64,
}

/// Webhook acknowledgement payload.
#[derive(Debug, Serialize)]
pub struct IngestAck {
    pub published: usize,
}

/// Build the Axum router with all handlers.
pub fn build_router(context: AppContext) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/dbfs", post(input_levels))
        .route("/spl", post(spl_meter))
        .route("/status", get(status))
        .route("/health", get(health))
        .with_state(context)
}

pub async fn health(State(context): State<AppContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        subscribers: context.hub().subscriber_count(),
        samples: context.hub().samples(),
        uptime_ms: context.status().uptime_ms(),
    })
}

pub async fn status(State(context): State<AppContext>) -> Json<StatusSnapshot> {
    Json(context.status().snapshot())
}

/// Input-levels webhook: RMS per input in dBFS
pub async fn input_levels(
    State(context): State<AppContext>,
    body: Bytes,
) -> Result<Json<IngestAck>, HttpServerError> {
    let sample: InputLevelsSample = parse_body(&body)?;
    let levels = sample.levels().map_err(|err| {
        log::warn!("[HTTP] Rejected input levels: {}", err);
        HttpServerError::BadRequest(err.message())
    })?;
    publish(&context, &levels)
}

/// SPL meter webhook: one calibrated level per meter
pub async fn spl_meter(
    State(context): State<AppContext>,
    body: Bytes,
) -> Result<Json<IngestAck>, HttpServerError> {
    let sample: SplMeterSample = parse_body(&body)?;
    let level = sample.level().map_err(|err| {
        log::warn!("[HTTP] Rejected SPL meter sample: {}", err);
        HttpServerError::BadRequest(err.message())
    })?;
    publish(&context, &[level])
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, HttpServerError> {
    serde_json::from_slice(body).map_err(|err| {
        log::debug!("[HTTP] Invalid webhook body: {}", err);
        HttpServerError::BadRequest("Invalid JSON format".to_string())
    })
}

fn publish(context: &AppContext, levels: &[ExternalLevel]) -> Result<Json<IngestAck>, HttpServerError> {
    let published = ingest(levels, context.status(), context.hub()).map_err(|err| {
        log_hub_error(&err, "http::publish");
        HttpServerError::Internal(err.message())
    })?;
    Ok(Json(IngestAck { published }))
}
