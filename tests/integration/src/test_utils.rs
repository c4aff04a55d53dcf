//! Test fixtures for control plane integration tests

use sadrn_control_plane::{
    Gateway, Link, RouteCoordinator, Sensor, Switch, SwitchRole, TopologyStore,
};

/// The full emulated deployment: a three-switch core triangle forming the
/// sink, one zone switch per disaster zone, three gateways on a failover
/// ring, and two sensors per gateway.
pub fn emulated_topology() -> TopologyStore {
    let mut store = TopologyStore::new();

    for (id, name, role) in [
        ("s1", "Core Switch 1", SwitchRole::Core),
        ("s2", "Core Switch 2", SwitchRole::Core),
        ("s3", "Core Switch 3", SwitchRole::Core),
        ("s4", "Zone A Switch", SwitchRole::Zone),
        ("s5", "Zone B Switch", SwitchRole::Zone),
        ("s6", "Zone C Switch", SwitchRole::Zone),
    ] {
        store.upsert_switch(Switch::new(id, name, role, 100));
    }

    for (id, source, target, latency_ms, capacity) in [
        ("l1", "s1", "s2", 2.0, 1000),
        ("l2", "s2", "s3", 2.0, 1000),
        ("l3", "s3", "s1", 2.0, 1000),
        ("l4", "s4", "s1", 3.0, 100),
        ("l5", "s5", "s2", 3.0, 100),
        ("l6", "s6", "s3", 3.0, 100),
    ] {
        store
            .upsert_link(Link::new(id, source, target, latency_ms, capacity))
            .expect("endpoints exist");
    }

    for (id, name, ip, primary, backup) in [
        ("gw_a", "Gateway A", "10.0.0.1", "s4", "s5"),
        ("gw_b", "Gateway B", "10.0.0.2", "s5", "s6"),
        ("gw_c", "Gateway C", "10.0.0.3", "s6", "s4"),
    ] {
        store.upsert_gateway(Gateway::new(id, name, ip, primary, backup));
    }

    for (id, name, gateway, value, warning, emergency, unit) in [
        ("water_a1", "Water Level", "gw_a", 25.0, 50.0, 80.0, "cm"),
        ("rain_a2", "Rainfall", "gw_a", 15.0, 40.0, 70.0, "mm/hr"),
        ("seismic_b1", "Seismic", "gw_b", 8.0, 30.0, 60.0, "Hz"),
        ("tilt_b2", "Tilt", "gw_b", 3.0, 15.0, 30.0, "deg"),
        ("temp_c1", "Temperature", "gw_c", 28.0, 45.0, 70.0, "C"),
        ("smoke_c2", "Smoke", "gw_c", 8.0, 30.0, 60.0, "ppm"),
    ] {
        store
            .upsert_sensor(Sensor::new(id, name, gateway, value, warning, emergency, unit))
            .expect("gateway exists");
    }

    store.set_sink(vec!["s1".into(), "s2".into(), "s3".into()]);
    store
}

/// Coordinator over the full emulated deployment with the initial route
/// table already committed
pub fn emulated_coordinator() -> RouteCoordinator {
    let _ = tracing_subscriber::fmt::try_init();
    RouteCoordinator::new(emulated_topology())
}
