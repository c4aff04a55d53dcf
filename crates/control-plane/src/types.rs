//! Data model for the SADRN control plane
//!
//! Typed records for switches, links, gateways, sensors, and committed
//! routes, plus the closed enumerations (intent, priority, status) that the
//! rest of the control plane is parameterized over. Constructors clamp
//! numeric telemetry at the boundary so invalid values can never enter the
//! topology store.

use serde::{Deserialize, Serialize};

/// Unique identifier for a switch
pub type SwitchId = String;
/// Unique identifier for a switch-to-switch link
pub type LinkId = String;
/// Unique identifier for an edge gateway
pub type GatewayId = String;
/// Unique identifier for a sensor
pub type SensorId = String;

/// Operational status of a switch or link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    /// Carrying traffic normally
    Active,
    /// Down; carries no traffic regardless of battery
    Failed,
}

impl NodeStatus {
    /// Whether the element can carry traffic
    pub fn is_active(self) -> bool {
        self == NodeStatus::Active
    }
}

/// Role of a switch in the emulated network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchRole {
    /// Backbone switch adjacent to the sink
    Core,
    /// Edge aggregation switch serving gateways
    Zone,
}

/// Operator-selected routing objective
///
/// A closed enumeration so a typo'd mode can never silently fall back to
/// balanced routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Latency plus bandwidth utilization plus congestion
    Balanced,
    /// Latency-dominant weighting
    LowLatency,
    /// Battery-dominant weighting
    LowPower,
    /// Strongest latency weighting, used for emergency traffic
    HighPriority,
}

/// Alert classification shared by sensors and gateways
///
/// Ordered: `Normal < Warning < Emergency`, so a gateway's priority is the
/// max over its sensors.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum PriorityClass {
    /// Below all thresholds
    Normal,
    /// At or above the warning threshold
    Warning,
    /// At or above the emergency threshold
    Emergency,
}

/// Network switch with battery-powered radio hardware
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Switch {
    /// Switch identifier (e.g. "s1")
    pub id: SwitchId,
    /// Human-readable name for dashboards
    pub name: String,
    /// Core or zone role
    pub role: SwitchRole,
    /// Operational status
    pub status: NodeStatus,
    /// Battery percentage, always within [0, 100]
    pub battery: u8,
}

impl Switch {
    /// Create a switch, clamping the battery into [0, 100]
    pub fn new(id: impl Into<SwitchId>, name: impl Into<String>, role: SwitchRole, battery: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role,
            status: NodeStatus::Active,
            battery: clamp_battery(battery),
        }
    }
}

/// Bidirectional link between two switches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    /// Link identifier (e.g. "l4")
    pub id: LinkId,
    /// One endpoint switch
    pub source: SwitchId,
    /// Other endpoint switch
    pub target: SwitchId,
    /// Operational status
    pub status: NodeStatus,
    /// Propagation latency in milliseconds
    pub latency_ms: f64,
    /// Nominal capacity in bandwidth units
    pub capacity: u32,
    /// Currently available bandwidth units, never above `capacity`
    pub bandwidth: u32,
}

impl Link {
    /// Create an active link with full bandwidth available
    pub fn new(
        id: impl Into<LinkId>,
        source: impl Into<SwitchId>,
        target: impl Into<SwitchId>,
        latency_ms: f64,
        capacity: u32,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            status: NodeStatus::Active,
            latency_ms,
            capacity,
            bandwidth: capacity,
        }
    }

    /// Whether this link joins the two given switches, in either direction
    pub fn connects(&self, a: &str, b: &str) -> bool {
        (self.source == a && self.target == b) || (self.source == b && self.target == a)
    }
}

/// Edge aggregation point with two candidate uplink switches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gateway {
    /// Gateway identifier (e.g. "gw_a")
    pub id: GatewayId,
    /// Human-readable name for dashboards
    pub name: String,
    /// Management IP address
    pub ip: String,
    /// Preferred uplink switch
    pub primary_switch: SwitchId,
    /// Failover uplink switch
    pub backup_switch: SwitchId,
    /// Currently selected uplink; derived by the failover policy, never set
    /// independently of it
    pub active_uplink: Option<SwitchId>,
    /// Sensors owned by this gateway
    pub sensors: Vec<SensorId>,
    /// Derived: max priority over owned sensors
    pub priority: PriorityClass,
}

impl Gateway {
    /// Create a gateway with its uplink pair
    pub fn new(
        id: impl Into<GatewayId>,
        name: impl Into<String>,
        ip: impl Into<String>,
        primary_switch: impl Into<SwitchId>,
        backup_switch: impl Into<SwitchId>,
    ) -> Self {
        let primary = primary_switch.into();
        Self {
            id: id.into(),
            name: name.into(),
            ip: ip.into(),
            active_uplink: Some(primary.clone()),
            primary_switch: primary,
            backup_switch: backup_switch.into(),
            sensors: Vec::new(),
            priority: PriorityClass::Normal,
        }
    }
}

/// Field sensor reporting a scalar measurement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sensor {
    /// Sensor identifier (e.g. "water_a1")
    pub id: SensorId,
    /// Human-readable name for dashboards
    pub name: String,
    /// Owning gateway
    pub gateway: GatewayId,
    /// Latest reported value, clamped to [0, 100]
    pub value: f64,
    /// Value at or above which the sensor is WARNING
    pub threshold_warning: f64,
    /// Value at or above which the sensor is EMERGENCY
    pub threshold_emergency: f64,
    /// Measurement unit (e.g. "cm", "ppm")
    pub unit: String,
    /// Derived status from value vs. thresholds
    pub status: PriorityClass,
}

impl Sensor {
    /// Create a sensor; the initial value is clamped and classified
    pub fn new(
        id: impl Into<SensorId>,
        name: impl Into<String>,
        gateway: impl Into<GatewayId>,
        value: f64,
        threshold_warning: f64,
        threshold_emergency: f64,
        unit: impl Into<String>,
    ) -> Self {
        let mut sensor = Self {
            id: id.into(),
            name: name.into(),
            gateway: gateway.into(),
            value: clamp_sensor_value(value),
            threshold_warning,
            threshold_emergency,
            unit: unit.into(),
            status: PriorityClass::Normal,
        };
        sensor.status = sensor.classify();
        sensor
    }

    /// Classify the current value against the thresholds
    pub fn classify(&self) -> PriorityClass {
        if self.value >= self.threshold_emergency {
            PriorityClass::Emergency
        } else if self.value >= self.threshold_warning {
            PriorityClass::Warning
        } else {
            PriorityClass::Normal
        }
    }
}

/// Committed route for one gateway
///
/// Replaced wholesale on every recomputation; readers never observe a
/// partially updated path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Gateway this route serves
    pub gateway: GatewayId,
    /// Display path: gateway id, switch hops, then the sink marker
    pub path: Vec<String>,
    /// Switch hops only, from active uplink to a sink switch
    pub switch_path: Vec<SwitchId>,
    /// Total cost including the priority extra-hop surcharge
    pub cost: f64,
    /// Gateway priority at computation time
    pub priority: PriorityClass,
    /// Intent snapshot at computation time
    pub intent: Intent,
}

impl Route {
    /// Whether this route traverses the link (u, v) in either direction
    pub fn traverses(&self, a: &str, b: &str) -> bool {
        self.switch_path
            .windows(2)
            .any(|hop| (hop[0] == a && hop[1] == b) || (hop[0] == b && hop[1] == a))
    }

    /// Whether this route passes through the given switch
    pub fn visits(&self, switch: &str) -> bool {
        self.switch_path.iter().any(|s| s == switch)
    }
}

/// Forwarding state hint for a committed route
///
/// What a southbound shim would install on the path's switches. Emergency
/// traffic gets a higher install priority; the timeouts bound how long a
/// stale flow can linger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowSpec {
    /// Flow table priority
    pub priority: u16,
    /// Seconds of inactivity before the flow is evicted
    pub idle_timeout_s: u16,
    /// Maximum flow lifetime in seconds
    pub hard_timeout_s: u16,
}

impl FlowSpec {
    /// Render the forwarding hint for a route of the given priority class
    pub fn for_priority(priority: PriorityClass) -> Self {
        match priority {
            PriorityClass::Emergency => Self {
                priority: 200,
                idle_timeout_s: 30,
                hard_timeout_s: 60,
            },
            _ => Self {
                priority: 100,
                idle_timeout_s: 30,
                hard_timeout_s: 60,
            },
        }
    }
}

/// Aggregate traffic counters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PacketStats {
    /// All traffic units seen
    pub total: u64,
    /// Units forwarded along a committed route
    pub forwarded: u64,
    /// Units dropped (no uplink, no path, or malformed)
    pub dropped: u64,
    /// Per-source forwarded counts, keyed by sensor id
    pub per_source: std::collections::HashMap<SensorId, u64>,
}

/// Clamp a raw battery level into [0, 100]
pub fn clamp_battery(level: i64) -> u8 {
    level.clamp(0, 100) as u8
}

/// Clamp a raw sensor reading into [0, 100]
pub fn clamp_sensor_value(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}
