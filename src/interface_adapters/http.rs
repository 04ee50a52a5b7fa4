// Plain HTTP routes served next to the websocket.

use crate::interface_adapters::state::AppState;
use axum::extract::State;
use std::sync::Arc;

/// Liveness probe; answers with the deployment environment name.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> String {
    state.environment.to_string()
}
