//! Default emulated topology: three core switches in a triangle around the
//! sink, one zone switch per disaster zone, and three gateways whose
//! primary/backup uplinks form a failover ring across the zones.

use sadrn_control_plane::{
    ControlPlaneResult, Gateway, Link, Sensor, Switch, SwitchRole, TopologyStore,
};

pub fn default_topology() -> ControlPlaneResult<TopologyStore> {
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
        store.upsert_link(Link::new(id, source, target, latency_ms, capacity))?;
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
        store.upsert_sensor(Sensor::new(id, name, gateway, value, warning, emergency, unit))?;
    }

    store.set_sink(vec!["s1".into(), "s2".into(), "s3".into()]);
    Ok(store)
}
