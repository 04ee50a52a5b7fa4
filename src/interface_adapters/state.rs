use crate::interface_adapters::net::HubCommand;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Clone)]
pub struct AppState {
    // Commands flowing from sockets into the hub task that owns all room state.
    pub hub_tx: mpsc::Sender<HubCommand>,
    // Deployment environment name reported by `/health`.
    pub environment: Arc<str>,
}
