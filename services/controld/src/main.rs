use axum::{
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower::ServiceBuilder;
use tracing::info;
use tracing_subscriber::fmt::init;

use sadrn_control_plane::{scheduler, RouteCoordinator, StaticProbe};

mod config;
mod handlers;
mod seed;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init();

    let config = Config::from_env();
    let topology = seed::default_topology()?;
    let coordinator = RouteCoordinator::with_cache_ttl(topology, config.cache_ttl);
    let state = Arc::new(AppState::new(coordinator));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    scheduler::spawn_topology_refresh(
        state.coordinator.clone(),
        StaticProbe::default(),
        config.scheduler.topology_refresh,
        state.events.clone(),
        shutdown_rx.clone(),
    );
    scheduler::spawn_battery_drain(
        state.coordinator.clone(),
        config.scheduler.battery_drain,
        state.events.clone(),
        shutdown_rx.clone(),
    );
    scheduler::spawn_traffic_generator(
        state.coordinator.clone(),
        config.scheduler.traffic,
        state.events.clone(),
        shutdown_rx,
    );

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/api/topology", get(handlers::get_topology))
        .route("/api/routes", get(handlers::get_routes))
        .route("/api/events", get(handlers::get_events))
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/sensors/:id", put(handlers::update_sensor))
        .route("/api/switches/:id/battery", put(handlers::update_battery))
        .route("/api/switches/:id/fail", post(handlers::fail_switch))
        .route("/api/switches/:id/restore", post(handlers::restore_switch))
        .route("/api/links/:id/fail", post(handlers::fail_link))
        .route("/api/links/:id/restore", post(handlers::restore_link))
        .route(
            "/api/intent",
            get(handlers::get_intent).put(handlers::update_intent),
        )
        .route("/api/traffic/toggle", post(handlers::toggle_traffic))
        .route("/api/reset", post(handlers::reset))
        .route("/ws", get(handlers::ws_upgrade))
        .with_state(state)
        .layer(ServiceBuilder::new().into_inner());

    let bind_addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&bind_addr).await?;
    info!("SADRN control plane listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;
    // Serve has drained; stop the maintenance loops too
    shutdown_tx.send(true).ok();
    Ok(())
}

async fn health_check() -> Result<Json<Value>, StatusCode> {
    Ok(Json(json!({
        "status": "healthy",
        "service": "sadrn-controld",
        "timestamp": Utc::now().to_rfc3339()
    })))
}
