//! Health check endpoint.

use axum::routing::get;
use axum::{Json, Router};
use chrono::Local;
use serde_json::json;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "ok": true,
        "time": Local::now().format("%H:%M:%S").to_string()
    }))
}
