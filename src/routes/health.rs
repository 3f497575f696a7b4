//! Liveness endpoint

use axum::{extract::State, Json};
use chrono::Utc;
use serde_json::{json, Value};

use crate::AppState;

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let stats = state.sessions.stats();
    Json(json!({
        "status": "ok",
        "now": Utc::now().to_rfc3339(),
        "today": state.clock.today().to_string(),
        "sessionsCached": stats.sessions_size,
        "paymentsConfigured": state.config.stripe_secret_key.is_some()
            && state.config.redirect_urls().is_some(),
    }))
}
