//! Background maintenance: discovery refresh, battery drain, synthetic
//! traffic
//!
//! Each concern runs as its own tokio task on a fixed interval, guarded by a
//! shared watch channel for shutdown. The tick bodies are plain synchronous
//! functions over the coordinator so tests can drive them deterministically
//! without timers.
//!
//! Locking discipline: take the coordinator lock, apply the tick, copy out
//! whatever subscribers need, release the lock, then emit. Nothing is ever
//! sent on the broadcast channel while the lock is held.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::coordinator::{PacketReport, RouteCoordinator, TopologySnapshot};
use crate::types::{LinkId, NodeStatus, SwitchId};

/// Coordinator handle shared between the API surface and maintenance tasks
pub type SharedCoordinator = Arc<Mutex<RouteCoordinator>>;

/// State change pushed to live subscribers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushEvent {
    /// Full state snapshot after a route-affecting change
    Snapshot(Box<TopologySnapshot>),
    /// Outcome of one synthetic traffic unit
    Packet(PacketReport),
}

/// One observation of element liveness from the discovery layer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProbeReport {
    /// Observed switch statuses; sorted map for deterministic apply order
    pub switches: BTreeMap<SwitchId, NodeStatus>,
    /// Observed link statuses
    pub links: BTreeMap<LinkId, NodeStatus>,
}

/// Source of liveness observations for the periodic topology refresh
pub trait NetworkProbe: Send {
    /// Produce the current observation
    fn observe(&mut self) -> ProbeReport;
}

/// Probe that reports a fixed observation until told otherwise. Stands in
/// for real southbound discovery in the emulated deployment and in tests.
#[derive(Debug, Clone, Default)]
pub struct StaticProbe {
    report: Arc<Mutex<ProbeReport>>,
}

impl StaticProbe {
    /// Create a probe reporting the given observation
    pub fn new(report: ProbeReport) -> Self {
        Self {
            report: Arc::new(Mutex::new(report)),
        }
    }

    /// Replace the observation subsequent ticks will see
    pub fn set_report(&self, report: ProbeReport) {
        if let Ok(mut guard) = self.report.lock() {
            *guard = report;
        }
    }
}

impl NetworkProbe for StaticProbe {
    fn observe(&mut self) -> ProbeReport {
        self.report
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

/// Maintenance intervals
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// How often the discovery probe is consulted
    pub topology_refresh: Duration,
    /// How often switch batteries drain
    pub battery_drain: Duration,
    /// How often a synthetic traffic unit is generated
    pub traffic: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            topology_refresh: Duration::from_secs(10),
            battery_drain: Duration::from_secs(30),
            traffic: Duration::from_secs(3),
        }
    }
}

/// Reconcile one probe observation into the coordinator. Unknown element
/// ids are skipped: discovery is best-effort and may race provisioning.
/// Returns whether anything changed.
pub fn probe_tick(coordinator: &mut RouteCoordinator, report: &ProbeReport) -> bool {
    let mut changed = false;
    for (id, status) in &report.switches {
        let Some(current) = coordinator.topology().switch(id).map(|s| s.status) else {
            continue;
        };
        if current != *status {
            if coordinator.set_switch_status(id, *status).is_ok() {
                changed = true;
            }
        }
    }
    for (id, status) in &report.links {
        let Some(current) = coordinator.topology().link(id).map(|l| l.status) else {
            continue;
        };
        if current != *status {
            if coordinator.set_link_status(id, *status).is_ok() {
                changed = true;
            }
        }
    }
    changed
}

/// Spawn the periodic topology refresh task
pub fn spawn_topology_refresh(
    coordinator: SharedCoordinator,
    mut probe: impl NetworkProbe + 'static,
    interval: Duration,
    events: broadcast::Sender<PushEvent>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = probe.observe();
                    let snapshot = {
                        let Ok(mut guard) = coordinator.lock() else {
                            warn!("coordinator lock poisoned, stopping topology refresh");
                            return;
                        };
                        if !probe_tick(&mut guard, &report) {
                            continue;
                        }
                        guard.snapshot()
                    };
                    debug!("probe observed a change, pushing snapshot");
                    let _ = events.send(PushEvent::Snapshot(Box::new(snapshot)));
                }
                _ = shutdown.changed() => return,
            }
        }
    })
}

/// Spawn the periodic battery drain task
pub fn spawn_battery_drain(
    coordinator: SharedCoordinator,
    interval: Duration,
    events: broadcast::Sender<PushEvent>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let snapshot = {
                        let Ok(mut guard) = coordinator.lock() else {
                            warn!("coordinator lock poisoned, stopping battery drain");
                            return;
                        };
                        guard.drain_batteries();
                        guard.snapshot()
                    };
                    let _ = events.send(PushEvent::Snapshot(Box::new(snapshot)));
                }
                _ = shutdown.changed() => return,
            }
        }
    })
}

/// Spawn the synthetic traffic generator task
pub fn spawn_traffic_generator(
    coordinator: SharedCoordinator,
    interval: Duration,
    events: broadcast::Sender<PushEvent>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut rng = StdRng::from_entropy();
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = {
                        let Ok(mut guard) = coordinator.lock() else {
                            warn!("coordinator lock poisoned, stopping traffic generator");
                            return;
                        };
                        guard.traffic_tick(&mut rng)
                    };
                    if let Some(report) = report {
                        let _ = events.send(PushEvent::Packet(report));
                    }
                }
                _ = shutdown.changed() => return,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::TopologyStore;
    use crate::types::{Gateway, Link, Switch, SwitchRole};

    fn test_coordinator() -> RouteCoordinator {
        let mut store = TopologyStore::new();
        store.upsert_switch(Switch::new("s1", "S1", SwitchRole::Core, 100));
        store.upsert_switch(Switch::new("s4", "S4", SwitchRole::Zone, 100));
        store.upsert_switch(Switch::new("s5", "S5", SwitchRole::Zone, 100));
        store
            .upsert_link(Link::new("l4", "s4", "s1", 3.0, 100))
            .unwrap();
        store
            .upsert_link(Link::new("l5", "s5", "s1", 3.0, 100))
            .unwrap();
        store.upsert_gateway(Gateway::new("gw_a", "Gateway A", "10.0.0.1", "s4", "s5"));
        store.set_sink(vec!["s1".into()]);
        RouteCoordinator::new(store)
    }

    #[test]
    fn probe_tick_applies_only_differences() {
        let mut coordinator = test_coordinator();
        let mut report = ProbeReport::default();
        report.switches.insert("s4".into(), NodeStatus::Active);

        // Matching status: nothing to do
        assert!(!probe_tick(&mut coordinator, &report));

        report.switches.insert("s4".into(), NodeStatus::Failed);
        assert!(probe_tick(&mut coordinator, &report));
        assert!(!coordinator
            .topology()
            .switch("s4")
            .unwrap()
            .status
            .is_active());
        // Failover to s5 happened as part of the same tick
        assert_eq!(
            coordinator.route("gw_a").unwrap().switch_path[0],
            "s5"
        );
    }

    #[test]
    fn probe_tick_skips_unknown_elements() {
        let mut coordinator = test_coordinator();
        let mut report = ProbeReport::default();
        report.switches.insert("s99".into(), NodeStatus::Failed);
        report.links.insert("l99".into(), NodeStatus::Failed);
        assert!(!probe_tick(&mut coordinator, &report));
    }

    #[test]
    fn static_probe_reflects_updates() {
        let probe = StaticProbe::default();
        let mut handle = probe.clone();
        assert!(handle.observe().switches.is_empty());

        let mut report = ProbeReport::default();
        report.links.insert("l4".into(), NodeStatus::Failed);
        probe.set_report(report);
        assert_eq!(
            handle.observe().links.get("l4"),
            Some(&NodeStatus::Failed)
        );
    }

    #[tokio::test]
    async fn shutdown_stops_background_tasks() {
        let coordinator: SharedCoordinator = Arc::new(Mutex::new(test_coordinator()));
        let (events, _) = broadcast::channel(16);
        let (stop_tx, stop_rx) = watch::channel(false);

        let drain = spawn_battery_drain(
            coordinator.clone(),
            Duration::from_secs(3600),
            events.clone(),
            stop_rx.clone(),
        );
        let traffic = spawn_traffic_generator(
            coordinator,
            Duration::from_secs(3600),
            events,
            stop_rx,
        );

        stop_tx.send(true).expect("receivers alive");
        drain.await.expect("drain task joins");
        traffic.await.expect("traffic task joins");
    }
}
