// Network adapter modules: per-socket session loop and the hub task it talks to.

pub mod client;
pub mod hub;

pub use client::ws_handler;
pub use hub::{HubCommand, spawn_hub};
