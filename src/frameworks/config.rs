use crate::domain::Bounds;
use std::{env, net::IpAddr, time::Duration};

// Runtime/server constants (not gameplay tuning).

pub fn http_port() -> u16 {
    env::var("ARENA_SERVER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(5000)
}

pub fn bind_addr() -> IpAddr {
    env::var("ARENA_BIND_ADDR")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(IpAddr::from([127, 0, 0, 1]))
}

/// Deployment environment name, reported by `/health`.
pub fn app_env() -> String {
    env::var("APP_ENV")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| "development".to_string())
}

pub fn playfield() -> Bounds {
    Bounds {
        width: dimension("ARENA_WIDTH", 1280.0),
        height: dimension("ARENA_HEIGHT", 720.0),
    }
}

fn dimension(key: &str, default: f32) -> f32 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<f32>().ok())
        .filter(|v| v.is_finite() && *v > 0.0)
        .unwrap_or(default)
}

pub const HUB_CHANNEL_CAPACITY: usize = 1024;
pub const OUTBOUND_CHANNEL_CAPACITY: usize = 256;

// Empty custom rooms that nobody joined are reaped after this long.
pub const ROOM_IDLE_GRACE: Duration = Duration::from_secs(30);
