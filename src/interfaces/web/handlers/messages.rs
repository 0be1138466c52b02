use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::error;

use super::super::AppState;
use crate::core::gateway::{GatewayError, HistoryEntry};
use crate::core::poller::RunError;

#[derive(Deserialize)]
pub struct SendMessageQuery {
    message: Option<String>,
    thread_id: Option<String>,
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    thread_id: Option<String>,
}

/// JSON error body; the status code follows the failing layer.
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl ApiError {
    fn bad_request(message: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            kind: "bad_request",
            message: message.to_string(),
        }
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        let (status, kind) = match &err {
            GatewayError::BadInput(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            GatewayError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage"),
            GatewayError::Remote(_) => (StatusCode::BAD_GATEWAY, "remote"),
            GatewayError::Run(RunError::TimedOut { .. }) => (StatusCode::GATEWAY_TIMEOUT, "timeout"),
            GatewayError::Run(RunError::Failed { .. }) => (StatusCode::BAD_GATEWAY, "run_failed"),
            GatewayError::Run(_) => (StatusCode::BAD_GATEWAY, "remote"),
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Gateway storage failure: {}", err);
        }
        Self {
            status,
            kind,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message, "kind": self.kind })),
        )
            .into_response()
    }
}

fn required(value: Option<String>, name: &str) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiError::bad_request(&format!("{} is required", name))),
    }
}

pub async fn send_message(
    State(state): State<AppState>,
    Query(query): Query<SendMessageQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let message = required(query.message, "message")?;
    let conversation = match query.thread_id.filter(|t| !t.trim().is_empty()) {
        Some(thread_id) => state.gateway.resume_conversation(&thread_id).await?,
        None => state.gateway.open_conversation().await?,
    };

    let reply = state.gateway.send_message(&conversation, &message).await?;
    Ok(Json(serde_json::json!({
        "thread_id": reply.thread_id,
        "response": reply.response,
        "message_received": message,
    })))
}

pub async fn conversation_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let thread_id = required(query.thread_id, "thread_id")?;
    let history: Vec<HistoryEntry> = state.gateway.get_history(&thread_id).await?;
    Ok(Json(serde_json::json!({
        "thread_id": thread_id,
        "conversation_history": history,
    })))
}
