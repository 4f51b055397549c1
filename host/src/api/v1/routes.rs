/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - /cas/validate (ticket 検証)
 */
use axum::{Router, routing::get};

use crate::api::v1::handlers::cas::validate;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/cas/validate", get(validate))
}
