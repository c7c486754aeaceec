//! Trigger endpoint.

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;

use crate::gateway::ProcessingAck;
use crate::middleware::auth::TriggerAuth;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/webhook", post(receive_trigger))
}

/// POST /webhook?token=... — Run one queue cycle for a message update.
///
/// Always answers `{"ok": true}` once authenticated, whatever the cycle did.
async fn receive_trigger(
    State(state): State<AppState>,
    _auth: TriggerAuth,
    body: Bytes,
) -> Json<serde_json::Value> {
    let ack = state.gateway.handle_trigger(&body).await;
    if ack == ProcessingAck::Ignored {
        tracing::debug!("Non-message update acknowledged");
    }
    Json(json!({ "ok": true }))
}
