use std::sync::{Arc, Mutex, MutexGuard};

use axum::http::StatusCode;
use sadrn_control_plane::{PushEvent, RouteCoordinator, SharedCoordinator};
use tokio::sync::broadcast;
use tracing::error;

pub struct AppState {
    pub coordinator: SharedCoordinator,
    pub events: broadcast::Sender<PushEvent>,
}

impl AppState {
    pub fn new(coordinator: RouteCoordinator) -> Self {
        let (events, _) = broadcast::channel(64);
        AppState {
            coordinator: Arc::new(Mutex::new(coordinator)),
            events,
        }
    }

    /// Lock the coordinator, mapping a poisoned lock to a 500
    pub fn lock(&self) -> Result<MutexGuard<'_, RouteCoordinator>, StatusCode> {
        self.coordinator.lock().map_err(|_| {
            error!("coordinator lock poisoned");
            StatusCode::INTERNAL_SERVER_ERROR
        })
    }

    /// Push a fresh snapshot to live subscribers after a mutation
    pub fn broadcast_snapshot(&self, coordinator: &RouteCoordinator) {
        let _ = self
            .events
            .send(PushEvent::Snapshot(Box::new(coordinator.snapshot())));
    }
}
