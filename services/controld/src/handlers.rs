use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, Query, State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use sadrn_control_plane::{ControlPlaneError, Intent, NodeStatus, PushEvent};

use crate::state::AppState;

fn map_error(err: ControlPlaneError) -> StatusCode {
    match err {
        ControlPlaneError::SwitchNotFound { .. }
        | ControlPlaneError::LinkNotFound { .. }
        | ControlPlaneError::GatewayNotFound { .. }
        | ControlPlaneError::SensorNotFound { .. } => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub async fn get_topology(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, StatusCode> {
    let coordinator = state.lock()?;
    let snapshot = coordinator.snapshot();
    serde_json::to_value(snapshot)
        .map(Json)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

pub async fn get_routes(State(state): State<Arc<AppState>>) -> Result<Json<Value>, StatusCode> {
    let coordinator = state.lock()?;
    Ok(Json(json!({
        "intent": coordinator.intent(),
        "routes": coordinator.routes(),
    })))
}

#[derive(Deserialize)]
pub struct EventsQuery {
    limit: Option<usize>,
}

pub async fn get_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<Value>, StatusCode> {
    let coordinator = state.lock()?;
    let events = match query.limit {
        Some(limit) => coordinator.event_tail(limit),
        None => coordinator.events(),
    };
    Ok(Json(json!({ "events": events })))
}

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Result<Json<Value>, StatusCode> {
    let coordinator = state.lock()?;
    Ok(Json(json!({ "stats": coordinator.stats() })))
}

#[derive(Deserialize)]
pub struct SensorUpdate {
    value: f64,
}

pub async fn update_sensor(
    State(state): State<Arc<AppState>>,
    Path(sensor_id): Path<String>,
    Json(payload): Json<SensorUpdate>,
) -> Result<Json<Value>, StatusCode> {
    let mut coordinator = state.lock()?;
    coordinator
        .set_sensor_value(&sensor_id, payload.value)
        .map_err(map_error)?;
    state.broadcast_snapshot(&coordinator);
    let sensor = coordinator
        .topology()
        .sensor(&sensor_id)
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(json!({ "sensor": sensor, "intent": coordinator.intent() })))
}

#[derive(Deserialize)]
pub struct BatteryUpdate {
    battery: i64,
}

pub async fn update_battery(
    State(state): State<Arc<AppState>>,
    Path(switch_id): Path<String>,
    Json(payload): Json<BatteryUpdate>,
) -> Result<Json<Value>, StatusCode> {
    let mut coordinator = state.lock()?;
    // Operators cannot command a dead battery; telemetry can
    coordinator
        .set_battery(&switch_id, payload.battery.max(1))
        .map_err(map_error)?;
    state.broadcast_snapshot(&coordinator);
    let switch = coordinator
        .topology()
        .switch(&switch_id)
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(json!({ "switch": switch })))
}

async fn set_switch(
    state: Arc<AppState>,
    switch_id: String,
    status: NodeStatus,
) -> Result<Json<Value>, StatusCode> {
    let mut coordinator = state.lock()?;
    coordinator
        .set_switch_status(&switch_id, status)
        .map_err(map_error)?;
    state.broadcast_snapshot(&coordinator);
    Ok(Json(json!({ "switch": coordinator.topology().switch(&switch_id) })))
}

pub async fn fail_switch(
    State(state): State<Arc<AppState>>,
    Path(switch_id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    warn!(switch = %switch_id, "operator failed switch");
    set_switch(state, switch_id, NodeStatus::Failed).await
}

pub async fn restore_switch(
    State(state): State<Arc<AppState>>,
    Path(switch_id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    info!(switch = %switch_id, "operator restored switch");
    set_switch(state, switch_id, NodeStatus::Active).await
}

async fn set_link(
    state: Arc<AppState>,
    link_id: String,
    status: NodeStatus,
) -> Result<Json<Value>, StatusCode> {
    let mut coordinator = state.lock()?;
    coordinator
        .set_link_status(&link_id, status)
        .map_err(map_error)?;
    state.broadcast_snapshot(&coordinator);
    Ok(Json(json!({ "link": coordinator.topology().link(&link_id) })))
}

pub async fn fail_link(
    State(state): State<Arc<AppState>>,
    Path(link_id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    warn!(link = %link_id, "operator failed link");
    set_link(state, link_id, NodeStatus::Failed).await
}

pub async fn restore_link(
    State(state): State<Arc<AppState>>,
    Path(link_id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    info!(link = %link_id, "operator restored link");
    set_link(state, link_id, NodeStatus::Active).await
}

pub async fn get_intent(State(state): State<Arc<AppState>>) -> Result<Json<Value>, StatusCode> {
    let coordinator = state.lock()?;
    Ok(Json(json!({
        "intent": coordinator.intent(),
        "auto": coordinator.auto_intent(),
    })))
}

#[derive(Deserialize)]
pub struct IntentUpdate {
    intent: Option<Intent>,
    auto: Option<bool>,
}

pub async fn update_intent(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<IntentUpdate>,
) -> Result<Json<Value>, StatusCode> {
    let mut coordinator = state.lock()?;
    if let Some(auto) = payload.auto {
        coordinator.set_auto_intent(auto);
    }
    if let Some(intent) = payload.intent {
        coordinator.set_intent(intent);
    }
    state.broadcast_snapshot(&coordinator);
    Ok(Json(json!({
        "intent": coordinator.intent(),
        "auto": coordinator.auto_intent(),
    })))
}

pub async fn toggle_traffic(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, StatusCode> {
    let mut coordinator = state.lock()?;
    let enabled = coordinator.toggle_auto_traffic();
    info!(enabled, "synthetic traffic toggled");
    Ok(Json(json!({ "auto_traffic": enabled })))
}

pub async fn reset(State(state): State<Arc<AppState>>) -> Result<Json<Value>, StatusCode> {
    let mut coordinator = state.lock()?;
    coordinator.reset();
    state.broadcast_snapshot(&coordinator);
    Ok(Json(json!({ "status": "reset" })))
}

pub async fn ws_upgrade(
    State(state): State<Arc<AppState>>,
    upgrade: WebSocketUpgrade,
) -> impl IntoResponse {
    upgrade.on_upgrade(move |socket| ws_session(state, socket))
}

/// Push the current snapshot, then relay broadcast events until the client
/// disconnects. A lagging client just misses intermediate snapshots.
async fn ws_session(state: Arc<AppState>, mut socket: WebSocket) {
    let initial = {
        let Ok(coordinator) = state.lock() else {
            return;
        };
        PushEvent::Snapshot(Box::new(coordinator.snapshot()))
    };
    if send_event(&mut socket, &initial).await.is_err() {
        return;
    }

    let mut events = state.events.subscribe();
    loop {
        tokio::select! {
            received = events.recv() => {
                match received {
                    Ok(event) => {
                        if send_event(&mut socket, &event).await.is_err() {
                            return;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "websocket subscriber lagged");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => return,
                }
            }
            inbound = socket.recv() => {
                match inbound {
                    Some(Ok(Message::Close(_))) | None => return,
                    Some(Err(_)) => return,
                    // Inbound frames are ignored; the socket is push-only
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}

async fn send_event(socket: &mut WebSocket, event: &PushEvent) -> Result<(), axum::Error> {
    match serde_json::to_string(event) {
        Ok(payload) => socket.send(Message::Text(payload)).await,
        Err(err) => {
            warn!(%err, "failed to serialize push event");
            Ok(())
        }
    }
}
