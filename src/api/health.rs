use axum::{Extension, response::Json};
use serde_json::{Value, json};

use crate::api::CallbackState;

pub async fn health(Extension(state): Extension<CallbackState>) -> Json<Value> {
    let completed = state.is_handled().await;
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "flow": state.flow.flow().response_type(),
        "awaiting_redirect": !completed,
    }))
}
