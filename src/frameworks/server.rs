// Framework bootstrap for the arena server runtime.

use crate::domain::ports::SystemClock;
use crate::domain::tuning::{ArenaTuning, AsteroidTuning, PowerupTuning};
use crate::frameworks::config;
use crate::interface_adapters::http::health_handler;
use crate::interface_adapters::net::{spawn_hub, ws_handler};
use crate::interface_adapters::state::AppState;
use crate::use_cases::{Arena, ArenaSettings};

use axum::{Router, routing::get};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::net::SocketAddr;
use std::{io::Result, sync::Arc};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    let address = listener.local_addr()?;
    // build state
    let state = build_state();
    // Start the Web Server
    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler))
        .with_state(state);

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking
    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::new(config::bind_addr(), config::http_port());

    // Bind TCP listener with error handling
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

fn build_state() -> Arc<AppState> {
    let environment = config::app_env();
    let bounds = config::playfield();
    tracing::debug!(
        environment = %environment,
        width = bounds.width,
        height = bounds.height,
        "arena configured"
    );

    // The hub task owns every room; sockets only hold its sender.
    let arena = Arena::new(
        ArenaSettings {
            bounds,
            arena: ArenaTuning::default(),
            asteroids: AsteroidTuning::default(),
            powerups: PowerupTuning::default(),
            room_idle_grace: config::ROOM_IDLE_GRACE,
        },
        Box::new(SystemClock),
        StdRng::from_entropy(),
    );
    let hub_tx = spawn_hub(arena, config::HUB_CHANNEL_CAPACITY);

    Arc::new(AppState {
        hub_tx,
        environment: Arc::from(environment.as_str()),
    })
}
