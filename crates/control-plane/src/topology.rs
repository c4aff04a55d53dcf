//! Authoritative in-memory topology state
//!
//! Owns every switch, link, gateway, and sensor record plus the sink set.
//! Mutators validate identity, clamp numeric telemetry, recompute derived
//! statuses synchronously, and report whether the change is route-affecting
//! so the coordinator knows when to trigger recomputation. The store never
//! recomputes routes itself and never talks to collaborators.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{ControlPlaneError, ControlPlaneResult};
use crate::types::{
    clamp_battery, clamp_sensor_value, Gateway, GatewayId, Link, LinkId, NodeStatus,
    PriorityClass, Sensor, SensorId, Switch, SwitchId,
};

/// Battery bands that change routing behavior: the 40%/20% penalty steps and
/// the 15% uplink floor. Crossing any of these is route-affecting.
fn battery_band(battery: u8) -> u8 {
    if battery >= 40 {
        0
    } else if battery >= 20 {
        1
    } else if battery >= 15 {
        2
    } else {
        3
    }
}

/// In-memory topology aggregate
#[derive(Debug, Clone, Default)]
pub struct TopologyStore {
    switches: HashMap<SwitchId, Switch>,
    links: HashMap<LinkId, Link>,
    gateways: HashMap<GatewayId, Gateway>,
    sensors: HashMap<SensorId, Sensor>,
    /// Switches directly reachable by the central collector
    sink: Vec<SwitchId>,
}

impl TopologyStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a switch
    pub fn upsert_switch(&mut self, switch: Switch) {
        self.switches.insert(switch.id.clone(), switch);
    }

    /// Insert or replace a link; both endpoints must already exist
    pub fn upsert_link(&mut self, link: Link) -> ControlPlaneResult<()> {
        for endpoint in [&link.source, &link.target] {
            if !self.switches.contains_key(endpoint) {
                return Err(ControlPlaneError::DanglingEndpoint {
                    link: link.id.clone(),
                    switch: endpoint.clone(),
                });
            }
        }
        self.links.insert(link.id.clone(), link);
        Ok(())
    }

    /// Insert or replace a gateway
    pub fn upsert_gateway(&mut self, gateway: Gateway) {
        self.gateways.insert(gateway.id.clone(), gateway);
    }

    /// Insert or replace a sensor, registering it with its owning gateway
    pub fn upsert_sensor(&mut self, sensor: Sensor) -> ControlPlaneResult<()> {
        let gateway = self
            .gateways
            .get_mut(&sensor.gateway)
            .ok_or_else(|| ControlPlaneError::GatewayNotFound {
                id: sensor.gateway.clone(),
            })?;
        if !gateway.sensors.contains(&sensor.id) {
            gateway.sensors.push(sensor.id.clone());
        }
        let gateway_id = sensor.gateway.clone();
        self.sensors.insert(sensor.id.clone(), sensor);
        self.refresh_gateway_priority(&gateway_id);
        Ok(())
    }

    /// Replace the sink set
    pub fn set_sink(&mut self, switches: Vec<SwitchId>) {
        self.sink = switches;
    }

    /// Switches directly reachable by the collector
    pub fn sink(&self) -> &[SwitchId] {
        &self.sink
    }

    /// Set a switch up or down. Returns whether the change is
    /// route-affecting (i.e. the status actually changed).
    pub fn apply_switch_status(
        &mut self,
        id: &str,
        status: NodeStatus,
    ) -> ControlPlaneResult<bool> {
        let switch = self
            .switches
            .get_mut(id)
            .ok_or_else(|| ControlPlaneError::SwitchNotFound { id: id.to_string() })?;
        let changed = switch.status != status;
        switch.status = status;
        if changed {
            debug!(switch = id, ?status, "switch status changed");
        }
        Ok(changed)
    }

    /// Set a link up or down. Returns whether the change is route-affecting.
    pub fn apply_link_status(&mut self, id: &str, status: NodeStatus) -> ControlPlaneResult<bool> {
        let link = self
            .links
            .get_mut(id)
            .ok_or_else(|| ControlPlaneError::LinkNotFound { id: id.to_string() })?;
        let changed = link.status != status;
        link.status = status;
        if changed {
            debug!(link = id, ?status, "link status changed");
        }
        Ok(changed)
    }

    /// Set a switch battery level. Out-of-range input is clamped to
    /// [0, 100], not rejected: battery readings are best-effort telemetry.
    /// Returns whether the change crossed a routing-relevant battery band.
    pub fn apply_battery(&mut self, id: &str, level: i64) -> ControlPlaneResult<bool> {
        let switch = self
            .switches
            .get_mut(id)
            .ok_or_else(|| ControlPlaneError::SwitchNotFound { id: id.to_string() })?;
        let old_band = battery_band(switch.battery);
        switch.battery = clamp_battery(level);
        let new_band = battery_band(switch.battery);
        Ok(old_band != new_band)
    }

    /// Apply a sensor reading. The value is clamped, the sensor status and
    /// the owning gateway's priority are recomputed synchronously. Returns
    /// whether the sensor's derived status changed (which shifts the
    /// gateway's priority class and therefore route costs).
    pub fn apply_sensor_value(&mut self, id: &str, value: f64) -> ControlPlaneResult<bool> {
        let sensor = self
            .sensors
            .get_mut(id)
            .ok_or_else(|| ControlPlaneError::SensorNotFound { id: id.to_string() })?;
        let old_status = sensor.status;
        sensor.value = clamp_sensor_value(value);
        sensor.status = sensor.classify();
        let changed = sensor.status != old_status;
        let gateway_id = sensor.gateway.clone();
        self.refresh_gateway_priority(&gateway_id);
        Ok(changed)
    }

    /// Recompute a gateway's priority as the max over its sensors
    fn refresh_gateway_priority(&mut self, gateway_id: &str) {
        let Some(gateway) = self.gateways.get(gateway_id) else {
            return;
        };
        let priority = gateway
            .sensors
            .iter()
            .filter_map(|sid| self.sensors.get(sid))
            .map(|s| s.status)
            .max()
            .unwrap_or(PriorityClass::Normal);
        if let Some(gateway) = self.gateways.get_mut(gateway_id) {
            gateway.priority = priority;
        }
    }

    /// Record the uplink chosen by the failover policy
    pub fn set_active_uplink(
        &mut self,
        gateway_id: &str,
        uplink: Option<SwitchId>,
    ) -> ControlPlaneResult<()> {
        let gateway = self.gateways.get_mut(gateway_id).ok_or_else(|| {
            ControlPlaneError::GatewayNotFound {
                id: gateway_id.to_string(),
            }
        })?;
        gateway.active_uplink = uplink;
        Ok(())
    }

    /// Look up a switch
    pub fn switch(&self, id: &str) -> Option<&Switch> {
        self.switches.get(id)
    }

    /// Look up a link
    pub fn link(&self, id: &str) -> Option<&Link> {
        self.links.get(id)
    }

    /// Look up a gateway
    pub fn gateway(&self, id: &str) -> Option<&Gateway> {
        self.gateways.get(id)
    }

    /// Look up a sensor
    pub fn sensor(&self, id: &str) -> Option<&Sensor> {
        self.sensors.get(id)
    }

    /// All switches
    pub fn switches(&self) -> impl Iterator<Item = &Switch> {
        self.switches.values()
    }

    /// All links
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    /// All gateways
    pub fn gateways(&self) -> impl Iterator<Item = &Gateway> {
        self.gateways.values()
    }

    /// All sensors
    pub fn sensors(&self) -> impl Iterator<Item = &Sensor> {
        self.sensors.values()
    }

    /// Gateway ids in deterministic (sorted) order, for stable recompute
    /// and test reproducibility
    pub fn gateway_ids(&self) -> Vec<GatewayId> {
        let mut ids: Vec<_> = self.gateways.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Sensor ids in deterministic (sorted) order
    pub fn sensor_ids(&self) -> Vec<SensorId> {
        let mut ids: Vec<_> = self.sensors.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// A link is usable only if it and both endpoints are active
    pub fn is_link_usable(&self, link: &Link) -> bool {
        link.status.is_active()
            && self
                .switch(&link.source)
                .is_some_and(|s| s.status.is_active())
            && self
                .switch(&link.target)
                .is_some_and(|s| s.status.is_active())
    }

    /// Whether any EMERGENCY / WARNING sensor exists, for auto-intent
    pub fn highest_sensor_status(&self) -> PriorityClass {
        self.sensors
            .values()
            .map(|s| s.status)
            .max()
            .unwrap_or(PriorityClass::Normal)
    }
}
