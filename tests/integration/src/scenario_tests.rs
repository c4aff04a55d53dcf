//! End-to-end routing scenarios over the emulated deployment
//!
//! Each test walks one operational story: quiet network, link loss,
//! escalating emergency, energy-constrained routing.

use sadrn_control_plane::coordinator::priority_hop_cost;
use sadrn_control_plane::{
    EventKind, Gateway, Intent, Link, NodeStatus, PriorityClass, RouteCoordinator, Sensor,
    Severity, Switch, SwitchRole, TopologyStore, SINK_MARKER,
};

use crate::test_utils::emulated_coordinator;

#[test]
fn quiet_network_routes_every_gateway_through_its_primary() {
    let coordinator = emulated_coordinator();

    for (gateway, uplink, core) in [("gw_a", "s4", "s1"), ("gw_b", "s5", "s2"), ("gw_c", "s6", "s3")] {
        let route = coordinator.route(gateway).expect("route committed");
        assert_eq!(route.switch_path, vec![uplink, core]);
        assert_eq!(
            route.path,
            vec![gateway, uplink, core, SINK_MARKER]
        );
        // Under balanced intent on a fresh topology the path cost is the
        // plain latency sum; the only addition is the first-hop surcharge.
        assert_eq!(
            route.cost,
            3.0 + priority_hop_cost(PriorityClass::Normal)
        );
        assert_eq!(route.priority, PriorityClass::Normal);
        assert_eq!(route.intent, Intent::Balanced);
    }

    // No degradation anywhere: the audit trail has no failover or critical
    // entries.
    assert!(coordinator
        .events()
        .iter()
        .all(|e| e.kind != EventKind::Failover && e.severity != Severity::Critical));
}

#[test]
fn failed_uplink_link_withdraws_the_route_and_spares_the_rest() {
    let mut coordinator = emulated_coordinator();
    coordinator
        .set_link_status("l4", NodeStatus::Failed)
        .unwrap();

    // s4 is still an acceptable uplink but has no surviving path to the
    // sink, so gw_a's route is withdrawn rather than ever touching l4.
    assert!(coordinator.route("gw_a").is_none());
    for route in coordinator.routes().values() {
        assert!(!route.traverses("s4", "s1"));
    }
    assert_eq!(coordinator.route("gw_b").unwrap().switch_path, vec!["s5", "s2"]);
    assert_eq!(coordinator.route("gw_c").unwrap().switch_path, vec!["s6", "s3"]);

    coordinator
        .set_link_status("l4", NodeStatus::Active)
        .unwrap();
    assert_eq!(coordinator.route("gw_a").unwrap().switch_path, vec!["s4", "s1"]);
}

#[test]
fn escalating_emergency_cuts_route_cost() {
    let mut coordinator = emulated_coordinator();
    let baseline = coordinator.route("gw_c").unwrap().cost;

    // Smoke over the emergency threshold: auto-intent goes high_priority
    // and gw_c is reclassified EMERGENCY
    coordinator.set_sensor_value("smoke_c2", 90.0).unwrap();

    assert_eq!(coordinator.intent(), Intent::HighPriority);
    let escalated = coordinator.route("gw_c").unwrap();
    assert_eq!(escalated.priority, PriorityClass::Emergency);
    assert!(escalated.cost < baseline);
    // 3ms at quarter weight plus the emergency first-hop surcharge
    assert_eq!(
        escalated.cost,
        3.0 * 0.25 + priority_hop_cost(PriorityClass::Emergency)
    );

    // The other gateways ride the intent change at their own priority
    let routine = coordinator.route("gw_a").unwrap();
    assert_eq!(routine.priority, PriorityClass::Normal);
    assert!(escalated.cost < routine.cost);
}

#[test]
fn low_power_intent_steers_around_weak_batteries() {
    // A zone switch with two uplink choices so battery can actually move
    // the path: s4 reaches s1 at 3ms and s2 at 4ms, both sinks.
    let mut store = TopologyStore::new();
    store.upsert_switch(Switch::new("s1", "Core 1", SwitchRole::Core, 100));
    store.upsert_switch(Switch::new("s2", "Core 2", SwitchRole::Core, 100));
    store.upsert_switch(Switch::new("s4", "Zone A", SwitchRole::Zone, 100));
    store
        .upsert_link(Link::new("l4", "s4", "s1", 3.0, 100))
        .unwrap();
    store
        .upsert_link(Link::new("l7", "s4", "s2", 4.0, 100))
        .unwrap();
    store.upsert_gateway(Gateway::new("gw_a", "Gateway A", "10.0.0.1", "s4", "s4"));
    store
        .upsert_sensor(Sensor::new(
            "water_a1", "Water Level", "gw_a", 25.0, 50.0, 80.0, "cm",
        ))
        .unwrap();
    store.set_sink(vec!["s1".into(), "s2".into()]);

    let mut coordinator = RouteCoordinator::new(store);
    assert_eq!(coordinator.route("gw_a").unwrap().switch_path, vec!["s4", "s1"]);

    coordinator.set_auto_intent(false);
    coordinator.set_intent(Intent::LowPower);
    // s1 below 20%: its edges carry a 30-point surcharge under low_power
    coordinator.set_battery("s1", 18).unwrap();

    let route = coordinator.route("gw_a").unwrap();
    assert_eq!(route.switch_path, vec!["s4", "s2"]);
    assert_eq!(route.intent, Intent::LowPower);
}

#[test]
fn low_power_intent_keeps_the_path_when_no_cheaper_alternative_exists() {
    // gw_a's only path to the sink runs through s1, so even a drained s1
    // cannot move the route
    let mut coordinator = emulated_coordinator();
    coordinator.set_auto_intent(false);
    coordinator.set_intent(Intent::LowPower);
    let before = coordinator.route("gw_a").unwrap().switch_path.clone();

    coordinator.set_battery("s1", 18).unwrap();

    let after = coordinator.route("gw_a").expect("route stays committed");
    assert_eq!(after.switch_path, before);
    assert_eq!(after.switch_path, vec!["s4", "s1"]);
    // The weak battery shows up in the cost, not the path
    assert!(after.cost > 3.0);
}
