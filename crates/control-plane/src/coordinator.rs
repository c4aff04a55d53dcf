//! Route coordination - the control plane's single mutation surface
//!
//! Every external event (topology change, sensor reading, operator command,
//! inbound traffic unit) enters through one `RouteCoordinator` instance. A
//! mutation updates the topology store, invalidates the path cache when
//! route-affecting, recomputes every gateway route through the planner,
//! cost model, and failover policy, and appends to the audit log.
//!
//! Recomputation is wholesale: every mutation that can affect routing
//! recomputes all gateways. At single-digit switch counts this is a
//! deliberate simplicity tradeoff; selective invalidation could be added
//! without changing external behavior.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::{ControlPlaneError, ControlPlaneResult};
use crate::event_log::{EventKind, EventLog, EventRecord, Severity};
use crate::failover::FailoverPolicy;
use crate::planner::{PathPlanner, DEFAULT_CACHE_TTL};
use crate::topology::TopologyStore;
use crate::types::{
    FlowSpec, Gateway, GatewayId, Intent, Link, LinkId, NodeStatus, PacketStats, PriorityClass,
    Route, Sensor, SensorId, Switch, SwitchId,
};

/// Terminal marker appended to every display path
pub const SINK_MARKER: &str = "sink";

/// Extra first-hop cost by priority class: emergency traffic models
/// expedited queuing at the uplink switch
pub fn priority_hop_cost(priority: PriorityClass) -> f64 {
    match priority {
        PriorityClass::Emergency => 0.5,
        PriorityClass::Warning => 1.0,
        PriorityClass::Normal => 2.0,
    }
}

/// Why a gateway's route was withheld or a traffic unit dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Neither primary nor backup uplink is usable
    NoUplink,
    /// No sink reachable from the chosen uplink
    NoPath,
    /// No committed route for the source gateway
    NoRoute,
    /// Traffic unit referenced an unknown source
    Malformed,
}

/// Result of one gateway recomputation
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    /// Route committed into the route table
    Committed(Route),
    /// Route withdrawn; the drop counter was incremented
    Dropped(DropReason),
}

/// What to do with an inbound traffic unit
#[derive(Debug, Clone, PartialEq)]
pub enum PacketDisposition {
    /// Forward along the committed route, installing the given flow state
    Forwarded {
        /// The committed route for the source gateway
        route: Route,
        /// Forwarding state hint for the path
        flow: FlowSpec,
    },
    /// Drop the unit
    Dropped {
        /// Why it was dropped
        reason: DropReason,
    },
}

/// Outcome report for one synthetic traffic unit, for dashboards
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacketReport {
    /// Source sensor
    pub sensor: SensorId,
    /// Sensor display name
    pub sensor_name: String,
    /// Owning gateway
    pub gateway: GatewayId,
    /// Sensor value carried by the unit
    pub value: f64,
    /// Measurement unit
    pub unit: String,
    /// Priority class of the unit
    pub priority: PriorityClass,
    /// Whether the unit was forwarded
    pub forwarded: bool,
    /// Display path taken, if forwarded
    pub path: Option<Vec<String>>,
    /// Route cost, if forwarded
    pub cost: Option<f64>,
    /// When the unit was generated
    pub timestamp: DateTime<Utc>,
}

/// Consistent copy of the full control plane state for subscribers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologySnapshot {
    /// All switches, sorted by id
    pub switches: Vec<Switch>,
    /// All switch links, sorted by id
    pub links: Vec<Link>,
    /// All gateways, sorted by id
    pub gateways: Vec<Gateway>,
    /// All sensors, sorted by id
    pub sensors: Vec<Sensor>,
    /// Sink switch set
    pub sink: Vec<SwitchId>,
    /// Committed route table
    pub routes: HashMap<GatewayId, Route>,
    /// Current intent mode
    pub intent: Intent,
    /// Whether auto-intent is active
    pub auto_intent: bool,
    /// Whether synthetic traffic generation is active
    pub auto_traffic: bool,
    /// Aggregate traffic counters
    pub stats: PacketStats,
}

/// Orchestrates topology state, route recomputation, and the audit trail
#[derive(Debug)]
pub struct RouteCoordinator {
    topology: TopologyStore,
    /// Pristine copy of the initial topology, restored on reset
    initial: TopologyStore,
    planner: PathPlanner,
    failover: FailoverPolicy,
    event_log: EventLog,
    routes: HashMap<GatewayId, Route>,
    stats: PacketStats,
    intent: Intent,
    auto_intent: bool,
    auto_traffic: bool,
    traffic_cursor: usize,
}

impl RouteCoordinator {
    /// Create a coordinator over the given initial topology and compute the
    /// first route table
    pub fn new(topology: TopologyStore) -> Self {
        Self::with_cache_ttl(topology, DEFAULT_CACHE_TTL)
    }

    /// Like [`RouteCoordinator::new`] with an explicit path cache TTL
    pub fn with_cache_ttl(topology: TopologyStore, ttl: std::time::Duration) -> Self {
        let mut coordinator = Self {
            initial: topology.clone(),
            topology,
            planner: PathPlanner::new(ttl),
            failover: FailoverPolicy::default(),
            event_log: EventLog::default(),
            routes: HashMap::new(),
            stats: PacketStats::default(),
            intent: Intent::Balanced,
            auto_intent: true,
            auto_traffic: true,
            traffic_cursor: 0,
        };
        coordinator.recompute_all();
        coordinator
    }

    /// Read-only view of the topology store
    pub fn topology(&self) -> &TopologyStore {
        &self.topology
    }

    /// Current intent mode
    pub fn intent(&self) -> Intent {
        self.intent
    }

    /// Committed route for one gateway, if any
    pub fn route(&self, gateway_id: &str) -> Option<&Route> {
        self.routes.get(gateway_id)
    }

    /// The committed route table
    pub fn routes(&self) -> &HashMap<GatewayId, Route> {
        &self.routes
    }

    /// Aggregate traffic counters
    pub fn stats(&self) -> &PacketStats {
        &self.stats
    }

    /// Every retained audit entry, newest first
    pub fn events(&self) -> Vec<EventRecord> {
        self.event_log.entries()
    }

    /// The most recent `n` audit entries
    pub fn event_tail(&self, n: usize) -> Vec<EventRecord> {
        self.event_log.tail(n)
    }

    /// Whether synthetic traffic generation is active
    pub fn auto_traffic(&self) -> bool {
        self.auto_traffic
    }

    /// Toggle synthetic traffic generation, returning the new value
    pub fn toggle_auto_traffic(&mut self) -> bool {
        self.auto_traffic = !self.auto_traffic;
        self.auto_traffic
    }

    /// Whether auto-intent is active
    pub fn auto_intent(&self) -> bool {
        self.auto_intent
    }

    /// Enable or disable auto-intent. Enabling immediately reclassifies.
    pub fn set_auto_intent(&mut self, enabled: bool) {
        self.auto_intent = enabled;
        if enabled {
            let wanted = auto_intent_for(self.topology.highest_sensor_status());
            self.apply_intent(wanted);
        }
    }

    /// Build a consistent snapshot for subscribers
    pub fn snapshot(&self) -> TopologySnapshot {
        let mut switches: Vec<_> = self.topology.switches().cloned().collect();
        switches.sort_by(|a, b| a.id.cmp(&b.id));
        let mut links: Vec<_> = self.topology.links().cloned().collect();
        links.sort_by(|a, b| a.id.cmp(&b.id));
        let mut gateways: Vec<_> = self.topology.gateways().cloned().collect();
        gateways.sort_by(|a, b| a.id.cmp(&b.id));
        let mut sensors: Vec<_> = self.topology.sensors().cloned().collect();
        sensors.sort_by(|a, b| a.id.cmp(&b.id));

        TopologySnapshot {
            switches,
            links,
            gateways,
            sensors,
            sink: self.topology.sink().to_vec(),
            routes: self.routes.clone(),
            intent: self.intent,
            auto_intent: self.auto_intent,
            auto_traffic: self.auto_traffic,
            stats: self.stats.clone(),
        }
    }

    // ---- mutation surface -------------------------------------------------

    /// Fail or restore a switch
    pub fn set_switch_status(&mut self, id: &str, status: NodeStatus) -> ControlPlaneResult<()> {
        let affecting = self.topology.apply_switch_status(id, status)?;
        if affecting {
            match status {
                NodeStatus::Failed => {
                    error!(switch = id, "switch failed");
                    self.event_log.append(
                        EventKind::Failure,
                        format!("{} FAILED", id.to_uppercase()),
                        Severity::Critical,
                    );
                }
                NodeStatus::Active => {
                    info!(switch = id, "switch restored");
                    self.event_log.append(
                        EventKind::Restore,
                        format!("{} restored", id.to_uppercase()),
                        Severity::Info,
                    );
                }
            }
            self.planner.invalidate();
            self.recompute_all();
        }
        Ok(())
    }

    /// Fail or restore a link
    pub fn set_link_status(&mut self, id: &str, status: NodeStatus) -> ControlPlaneResult<()> {
        let affecting = self.topology.apply_link_status(id, status)?;
        if affecting {
            let (source, target) = self
                .topology
                .link(id)
                .map(|l| (l.source.clone(), l.target.clone()))
                .unwrap_or_default();
            match status {
                NodeStatus::Failed => {
                    error!(link = id, "link failed");
                    self.event_log.append(
                        EventKind::Failure,
                        format!("Link {source}-{target} FAILED"),
                        Severity::Critical,
                    );
                }
                NodeStatus::Active => {
                    info!(link = id, "link restored");
                    self.event_log.append(
                        EventKind::Restore,
                        format!("Link {source}-{target} restored"),
                        Severity::Info,
                    );
                }
            }
            self.planner.invalidate();
            self.recompute_all();
        }
        Ok(())
    }

    /// Set a switch battery level (clamped). Recomputes when the level
    /// crosses a routing-relevant band.
    pub fn set_battery(&mut self, id: &str, level: i64) -> ControlPlaneResult<()> {
        let affecting = self.topology.apply_battery(id, level)?;
        if affecting {
            self.log_battery_band(id);
            self.planner.invalidate();
            self.recompute_all();
        }
        Ok(())
    }

    /// Apply a sensor reading (clamped). A derived-status change updates the
    /// gateway's priority, may flip the auto intent, and recomputes.
    pub fn set_sensor_value(&mut self, id: &str, value: f64) -> ControlPlaneResult<()> {
        let old_status = self
            .topology
            .sensor(id)
            .map(|s| s.status)
            .ok_or_else(|| ControlPlaneError::SensorNotFound { id: id.to_string() })?;
        let changed = self.topology.apply_sensor_value(id, value)?;
        if changed {
            let sensor = self
                .topology
                .sensor(id)
                .ok_or_else(|| ControlPlaneError::SensorNotFound { id: id.to_string() })?;
            let severity = match sensor.status {
                PriorityClass::Emergency => Severity::Critical,
                PriorityClass::Warning => Severity::Warning,
                PriorityClass::Normal => Severity::Info,
            };
            let message = format!("{}: {:?} -> {:?}", sensor.name, old_status, sensor.status);
            self.event_log.append(EventKind::Sensor, message, severity);
        }

        let intent_changed = if self.auto_intent {
            let wanted = auto_intent_for(self.topology.highest_sensor_status());
            self.apply_intent(wanted)
        } else {
            false
        };

        // Intent changes already recomputed; a priority flip alone still
        // moves the extra-hop cost, so recompute for that too.
        if changed && !intent_changed {
            self.recompute_all();
        }
        Ok(())
    }

    /// Set the intent mode manually
    pub fn set_intent(&mut self, intent: Intent) {
        self.apply_intent(intent);
    }

    /// Restore the initial topology and defaults, clearing routes, cache,
    /// statistics, and the audit trail
    pub fn reset(&mut self) {
        self.topology = self.initial.clone();
        self.routes.clear();
        self.planner.invalidate();
        self.stats = PacketStats::default();
        self.event_log.clear();
        self.intent = Intent::Balanced;
        self.auto_intent = true;
        self.auto_traffic = true;
        self.traffic_cursor = 0;
        self.recompute_all();
        self.event_log
            .append(EventKind::System, "Simulation reset", Severity::Info);
        info!("control plane reset to initial topology");
    }

    // ---- recomputation ----------------------------------------------------

    /// Recompute the route for one gateway and commit or withdraw it
    pub fn recompute_route(&mut self, gateway_id: &str) -> ControlPlaneResult<RouteOutcome> {
        let gateway = self
            .topology
            .gateway(gateway_id)
            .cloned()
            .ok_or_else(|| ControlPlaneError::GatewayNotFound {
                id: gateway_id.to_string(),
            })?;

        let decision = self.failover.select_uplink(&self.topology, &gateway);
        let Some(uplink) = decision.switch().cloned() else {
            self.topology.set_active_uplink(gateway_id, None)?;
            warn!(gateway = gateway_id, "no usable uplink");
            return Ok(self.drop_route(gateway_id, DropReason::NoUplink));
        };

        if decision.is_failover() && gateway.active_uplink.as_deref() != Some(uplink.as_str()) {
            warn!(gateway = gateway_id, backup = %uplink, "failover to backup uplink");
            self.event_log.append(
                EventKind::Failover,
                format!("{} failover to backup {}", gateway.name, uplink),
                Severity::Warning,
            );
        }
        self.topology
            .set_active_uplink(gateway_id, Some(uplink.clone()))?;

        let congestion = self.link_congestion(Some(gateway_id));
        let sinks = self.topology.sink().to_vec();
        let planned = self.planner.shortest_path(
            &self.topology,
            &uplink,
            &sinks,
            self.intent,
            gateway.priority,
            &congestion,
        );

        match planned {
            None => {
                warn!(gateway = gateway_id, uplink = %uplink, "no route to sink");
                Ok(self.drop_route(gateway_id, DropReason::NoPath))
            }
            Some(planned) => {
                let mut path = Vec::with_capacity(planned.hops.len() + 2);
                path.push(gateway.id.clone());
                path.extend(planned.hops.iter().cloned());
                path.push(SINK_MARKER.to_string());

                let route = Route {
                    gateway: gateway.id.clone(),
                    path,
                    switch_path: planned.hops,
                    cost: planned.cost + priority_hop_cost(gateway.priority),
                    priority: gateway.priority,
                    intent: self.intent,
                };
                self.routes.insert(gateway.id.clone(), route.clone());
                Ok(RouteOutcome::Committed(route))
            }
        }
    }

    /// Recompute every gateway route, in sorted gateway order
    pub fn recompute_all(&mut self) {
        for gateway_id in self.topology.gateway_ids() {
            // Ids come from the store, so the only failure mode is a
            // concurrent removal, which cannot happen under the single lock.
            let _ = self.recompute_route(&gateway_id);
        }
    }

    // ---- traffic ----------------------------------------------------------

    /// Decide the fate of one inbound traffic unit from a sensor. An
    /// unknown source is dropped and counted, never an error, so one bad
    /// unit cannot fail a batch.
    pub fn handle_packet(&mut self, source_sensor: &str, emergency: bool) -> PacketDisposition {
        self.stats.total += 1;

        let Some(sensor) = self.topology.sensor(source_sensor) else {
            self.stats.dropped += 1;
            return PacketDisposition::Dropped {
                reason: DropReason::Malformed,
            };
        };
        let gateway_id = sensor.gateway.clone();

        match self.routes.get(&gateway_id) {
            Some(route) => {
                self.stats.forwarded += 1;
                *self
                    .stats
                    .per_source
                    .entry(source_sensor.to_string())
                    .or_default() += 1;
                let class = if emergency {
                    PriorityClass::Emergency
                } else {
                    route.priority
                };
                PacketDisposition::Forwarded {
                    route: route.clone(),
                    flow: FlowSpec::for_priority(class),
                }
            }
            None => {
                self.stats.dropped += 1;
                PacketDisposition::Dropped {
                    reason: DropReason::NoRoute,
                }
            }
        }
    }

    /// One synthetic traffic iteration: pick a sensor (emergencies always
    /// win, warnings win 60% of the time, otherwise round-robin), push a
    /// unit through [`Self::handle_packet`], and report the outcome.
    pub fn traffic_tick<R: Rng>(&mut self, rng: &mut R) -> Option<PacketReport> {
        if !self.auto_traffic {
            return None;
        }
        let sensor_ids = self.topology.sensor_ids();
        if sensor_ids.is_empty() {
            return None;
        }

        let emergencies: Vec<&SensorId> = sensor_ids
            .iter()
            .filter(|id| {
                self.topology
                    .sensor(id)
                    .is_some_and(|s| s.status == PriorityClass::Emergency)
            })
            .collect();
        let warnings: Vec<&SensorId> = sensor_ids
            .iter()
            .filter(|id| {
                self.topology
                    .sensor(id)
                    .is_some_and(|s| s.status == PriorityClass::Warning)
            })
            .collect();

        let chosen = if !emergencies.is_empty() {
            emergencies[rng.gen_range(0..emergencies.len())].clone()
        } else if !warnings.is_empty() && rng.gen_bool(0.6) {
            warnings[rng.gen_range(0..warnings.len())].clone()
        } else {
            let id = sensor_ids[self.traffic_cursor % sensor_ids.len()].clone();
            self.traffic_cursor += 1;
            id
        };

        let sensor = self.topology.sensor(&chosen)?.clone();
        let disposition = self.handle_packet(&chosen, sensor.status == PriorityClass::Emergency);

        let (forwarded, path, cost) = match &disposition {
            PacketDisposition::Forwarded { route, .. } => {
                (true, Some(route.path.clone()), Some(route.cost))
            }
            PacketDisposition::Dropped { .. } => (false, None, None),
        };

        Some(PacketReport {
            sensor: chosen,
            sensor_name: sensor.name,
            gateway: sensor.gateway,
            value: sensor.value,
            unit: sensor.unit,
            priority: sensor.status,
            forwarded,
            path,
            cost,
            timestamp: Utc::now(),
        })
    }

    // ---- maintenance ------------------------------------------------------

    /// One battery drain iteration: each active switch loses one percent,
    /// plus one more if it carries a committed route, then routes are
    /// recomputed so a threshold crossing can move traffic.
    pub fn drain_batteries(&mut self) {
        let mut switch_ids: Vec<_> = self.topology.switches().map(|s| s.id.clone()).collect();
        switch_ids.sort();

        let mut crossed = false;
        for id in switch_ids {
            let Some(switch) = self.topology.switch(&id) else {
                continue;
            };
            if !switch.status.is_active() || switch.battery == 0 {
                continue;
            }
            let carrying = self.routes.values().any(|route| route.visits(&id));
            let drain: i64 = 1 + i64::from(carrying);
            let next = i64::from(switch.battery) - drain;
            if let Ok(affecting) = self.topology.apply_battery(&id, next) {
                if affecting {
                    self.log_battery_band(&id);
                    crossed = true;
                }
            }
        }

        if crossed {
            self.planner.invalidate();
        }
        self.recompute_all();
    }

    // ---- internals --------------------------------------------------------

    /// Apply an intent change; returns whether it actually changed
    fn apply_intent(&mut self, intent: Intent) -> bool {
        if self.intent == intent {
            return false;
        }
        self.intent = intent;
        info!(?intent, "intent changed");
        self.event_log.append(
            EventKind::Intent,
            format!("Intent changed to {}", intent_name(intent)),
            Severity::Warning,
        );
        self.planner.invalidate();
        self.recompute_all();
        true
    }

    /// Committed routes per link, excluding one gateway's own route so a
    /// recomputation does not penalize the path it is about to replace
    fn link_congestion(&self, exclude: Option<&str>) -> HashMap<LinkId, usize> {
        let mut congestion: HashMap<LinkId, usize> = HashMap::new();
        for (gateway_id, route) in &self.routes {
            if exclude.is_some_and(|ex| ex == gateway_id) {
                continue;
            }
            for hop in route.switch_path.windows(2) {
                let crossing = self
                    .topology
                    .links()
                    .find(|link| link.connects(&hop[0], &hop[1]));
                if let Some(link) = crossing {
                    *congestion.entry(link.id.clone()).or_default() += 1;
                }
            }
        }
        congestion
    }

    /// Withdraw a gateway's route, bump the drop counter, log CRITICAL
    fn drop_route(&mut self, gateway_id: &str, reason: DropReason) -> RouteOutcome {
        self.routes.remove(gateway_id);
        self.stats.dropped += 1;
        let message = match reason {
            DropReason::NoUplink => format!("No uplinks for {gateway_id}"),
            _ => format!("No route from {gateway_id} to sink"),
        };
        self.event_log
            .append(EventKind::Route, message, Severity::Critical);
        RouteOutcome::Dropped(reason)
    }

    /// Log a battery band crossing when it lands in a degraded band
    fn log_battery_band(&mut self, id: &str) {
        let Some(switch) = self.topology.switch(id) else {
            return;
        };
        let battery = switch.battery;
        if battery < 20 {
            self.event_log.append(
                EventKind::Battery,
                format!("{} CRITICAL ({battery}%)", id.to_uppercase()),
                Severity::Critical,
            );
        } else if battery < 40 {
            self.event_log.append(
                EventKind::Battery,
                format!("{} battery low ({battery}%)", id.to_uppercase()),
                Severity::Warning,
            );
        }
    }
}

/// Intent implied by the worst sensor status, in auto-intent mode
fn auto_intent_for(status: PriorityClass) -> Intent {
    match status {
        PriorityClass::Emergency => Intent::HighPriority,
        PriorityClass::Warning => Intent::LowLatency,
        PriorityClass::Normal => Intent::Balanced,
    }
}

/// Wire name of an intent, for log messages
fn intent_name(intent: Intent) -> &'static str {
    match intent {
        Intent::Balanced => "balanced",
        Intent::LowLatency => "low_latency",
        Intent::LowPower => "low_power",
        Intent::HighPriority => "high_priority",
    }
}
