// Interface adapters: wire protocol, websocket sessions, hub task and HTTP handlers.

pub mod http;
pub mod net;
pub mod protocol;
pub mod state;
pub mod utils;
