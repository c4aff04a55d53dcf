//! SADRN Control Plane - Adaptive Routing for Disaster-Response Sensor Networks
//!
//! Decides how traffic from battery-powered field gateways reaches the
//! central collection sink across an emulated switch fabric, and adapts
//! those decisions as elements fail, batteries drain, and sensor alerts
//! escalate.
//!
//! # Core Components
//!
//! - **Topology Store**: Authoritative in-memory state for switches, links,
//!   gateways, and sensors
//! - **Cost Model**: Intent-parameterized edge weights (balanced,
//!   low-latency, low-power, high-priority)
//! - **Path Planner**: Multi-target Dijkstra with a TTL-bounded path cache
//! - **Failover Policy**: Battery-aware primary/backup uplink selection
//! - **Route Coordinator**: The single mutation surface tying it together
//! - **Scheduler**: Discovery refresh, battery drain, and synthetic traffic
//!   loops
//!
//! # Design Principles
//!
//! 1. **Deterministic**: Identical topology snapshots always produce
//!    identical routes
//! 2. **Fail-Visible**: Every failover, threshold crossing, and route loss
//!    lands in the audit trail
//! 3. **Single Writer**: All mutations flow through one coordinator behind
//!    one lock
//!
//! # Example Usage
//!
//! ```rust
//! use sadrn_control_plane::{
//!     Gateway, Link, RouteCoordinator, Switch, SwitchRole, TopologyStore,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut store = TopologyStore::new();
//! store.upsert_switch(Switch::new("s1", "Core 1", SwitchRole::Core, 100));
//! store.upsert_switch(Switch::new("s4", "Zone A", SwitchRole::Zone, 100));
//! store.upsert_switch(Switch::new("s5", "Zone B", SwitchRole::Zone, 100));
//! store.upsert_link(Link::new("l4", "s4", "s1", 3.0, 100))?;
//! store.upsert_link(Link::new("l5", "s5", "s1", 3.0, 100))?;
//! store.upsert_gateway(Gateway::new("gw_a", "Gateway A", "10.0.0.1", "s4", "s5"));
//! store.set_sink(vec!["s1".into()]);
//!
//! let coordinator = RouteCoordinator::new(store);
//! let route = coordinator.route("gw_a").expect("route to sink");
//! assert_eq!(route.switch_path, vec!["s4", "s1"]);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod coordinator;
pub mod cost;
pub mod error;
pub mod event_log;
pub mod failover;
pub mod planner;
pub mod scheduler;
pub mod topology;
pub mod types;

// Re-export main types
pub use coordinator::{
    DropReason, PacketDisposition, PacketReport, RouteCoordinator, RouteOutcome,
    TopologySnapshot, SINK_MARKER,
};
pub use error::{ControlPlaneError, ControlPlaneResult};
pub use event_log::{EventKind, EventLog, EventRecord, Severity};
pub use failover::{FailoverPolicy, UplinkDecision, UPLINK_BATTERY_FLOOR};
pub use planner::{PathPlanner, PlannedPath, DEFAULT_CACHE_TTL};
pub use scheduler::{
    NetworkProbe, ProbeReport, PushEvent, SchedulerConfig, SharedCoordinator, StaticProbe,
};
pub use topology::TopologyStore;
pub use types::{
    FlowSpec, Gateway, GatewayId, Intent, Link, LinkId, NodeStatus, PacketStats, PriorityClass,
    Route, Sensor, SensorId, Switch, SwitchId, SwitchRole,
};
