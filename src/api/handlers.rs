//! HTTP request handlers

use super::types::{
    ErrorResponse, ExchangeListResponse, HealthResponse, SecretQuery, WebhookPayload,
    WebhookResponse,
};
use super::AppState;
use crate::runtime::{ExchangeStore, InboundMessage, TurnError};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};

const SECRET_HEADER: &str = "x-webhook-secret";

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Provider webhook
        .route("/webhook", post(receive_webhook))
        // Health check
        .route("/health", get(health))
        // Audit trail
        .route("/api/senders/:sender/exchanges", get(list_exchanges))
        .with_state(state)
}

// ============================================================
// Authentication
// ============================================================

/// Secret from the header, else from the `secret` query parameter
fn check_secret(state: &AppState, headers: &HeaderMap, query: &SecretQuery) -> Result<(), AppError> {
    let provided = headers
        .get(SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .or(query.secret.as_deref());

    if provided == Some(&*state.webhook_secret) {
        Ok(())
    } else {
        Err(AppError::Unauthorized)
    }
}

// ============================================================
// Webhook
// ============================================================

async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SecretQuery>,
    body: Bytes,
) -> Result<Json<WebhookResponse>, AppError> {
    check_secret(&state, &headers, &query)?;

    let json: Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {e}")))?;
    if !json.is_object() {
        return Err(AppError::BadRequest("Expected a JSON object".to_string()));
    }

    let payload = WebhookPayload::from_json(&json);
    if let Some(sid) = &payload.message_sid {
        tracing::debug!(message_sid = %sid, "Webhook received");
    }

    let inbound = InboundMessage::normalize(payload.sender.as_deref(), payload.body.as_deref());
    let outcome = state.processor.process_turn(inbound).await?;
    tracing::debug!(
        exchange_id = outcome.exchange_id,
        step = %outcome.state.step,
        "Webhook handled"
    );

    Ok(Json(WebhookResponse {
        ok: outcome.delivered,
        outbound: outcome.reply,
    }))
}

// ============================================================
// Health
// ============================================================

async fn health() -> Json<HealthResponse> {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0.0, |d| d.as_secs_f64());
    Json(HealthResponse { status: "ok", ts })
}

// ============================================================
// Audit Trail
// ============================================================

async fn list_exchanges(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SecretQuery>,
    Path(sender): Path<String>,
) -> Result<Json<ExchangeListResponse>, AppError> {
    check_secret(&state, &headers, &query)?;

    let storage = state.processor.storage();
    let current = storage
        .load_latest_state(&sender)
        .await
        .map_err(|e| AppError::StorageUnavailable(e.to_string()))?;
    let exchanges = storage
        .inner()
        .exchanges_for_sender(&sender)
        .map_err(|e| AppError::StorageUnavailable(e.to_string()))?;

    Ok(Json(ExchangeListResponse {
        sender,
        state: current,
        exchanges,
    }))
}

// ============================================================
// Error Handling
// ============================================================

enum AppError {
    Unauthorized,
    BadRequest(String),
    StorageUnavailable(String),
    Internal(String),
}

impl From<TurnError> for AppError {
    fn from(err: TurnError) -> Self {
        tracing::error!(error = %err, "Turn failed");
        match err {
            TurnError::StateLoad(_) | TurnError::Append(_) => {
                AppError::StorageUnavailable(err.to_string())
            }
            TurnError::Aborted(_) => AppError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Unauthorized => {
                (StatusCode::FORBIDDEN, "Invalid webhook secret".to_string())
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::StorageUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
