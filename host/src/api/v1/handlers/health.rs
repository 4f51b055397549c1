/*
 * Responsibility
 * - GET /health (疎通用 + どの CAS server を向いているかの確認)
 * - CAS server への疎通確認はしない (ticket を消費しないため)
 */
use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "cas_server_url": &*state.cas_server_url,
    }))
}
