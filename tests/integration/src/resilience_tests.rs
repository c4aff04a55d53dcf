//! Failure handling, accounting, and determinism guarantees

use sadrn_control_plane::coordinator::{DropReason, PacketDisposition, RouteOutcome};
use sadrn_control_plane::{
    EventKind, NodeStatus, RouteCoordinator, Severity,
};

use crate::test_utils::{emulated_coordinator, emulated_topology};

#[test]
fn battery_updates_always_land_in_range() {
    let mut coordinator = emulated_coordinator();

    coordinator.set_battery("s1", 5_000_000).unwrap();
    assert_eq!(coordinator.topology().switch("s1").unwrap().battery, 100);

    coordinator.set_battery("s1", -42).unwrap();
    assert_eq!(coordinator.topology().switch("s1").unwrap().battery, 0);

    coordinator.set_battery("s1", 73).unwrap();
    assert_eq!(coordinator.topology().switch("s1").unwrap().battery, 73);
}

#[test]
fn primary_switch_failure_fails_over_with_a_warning() {
    let mut coordinator = emulated_coordinator();
    coordinator
        .set_switch_status("s4", NodeStatus::Failed)
        .unwrap();

    // gw_a moves to its backup uplink s5
    let route = coordinator.route("gw_a").expect("backup route");
    assert_eq!(route.switch_path, vec!["s5", "s2"]);
    assert_eq!(
        coordinator.topology().gateway("gw_a").unwrap().active_uplink,
        Some("s5".to_string())
    );

    // gw_c only loses its backup; its primary s6 keeps working
    assert_eq!(coordinator.route("gw_c").unwrap().switch_path, vec!["s6", "s3"]);

    let events = coordinator.events();
    assert!(events
        .iter()
        .any(|e| e.kind == EventKind::Failover && e.severity == Severity::Warning));
    assert!(events
        .iter()
        .any(|e| e.kind == EventKind::Failure && e.severity == Severity::Critical));
}

#[test]
fn losing_both_uplinks_withdraws_the_route_and_counts_one_drop() {
    let mut coordinator = emulated_coordinator();
    coordinator
        .set_switch_status("s4", NodeStatus::Failed)
        .unwrap();
    coordinator
        .set_switch_status("s5", NodeStatus::Failed)
        .unwrap();

    assert!(coordinator.route("gw_a").is_none());
    assert!(coordinator
        .topology()
        .gateway("gw_a")
        .unwrap()
        .active_uplink
        .is_none());

    // Exactly one drop per recompute of the stranded gateway
    let before = coordinator.stats().dropped;
    let outcome = coordinator.recompute_route("gw_a").unwrap();
    assert_eq!(outcome, RouteOutcome::Dropped(DropReason::NoUplink));
    assert_eq!(coordinator.stats().dropped, before + 1);

    // Traffic from the stranded zone is dropped, traffic elsewhere flows
    let stranded = coordinator.handle_packet("water_a1", false);
    assert_eq!(
        stranded,
        PacketDisposition::Dropped {
            reason: DropReason::NoRoute
        }
    );
    let flowing = coordinator.handle_packet("temp_c1", false);
    assert!(matches!(flowing, PacketDisposition::Forwarded { .. }));
}

#[test]
fn recomputation_is_idempotent_within_the_cache_ttl() {
    let mut coordinator = emulated_coordinator();

    let first = match coordinator.recompute_route("gw_b").unwrap() {
        RouteOutcome::Committed(route) => route,
        other => panic!("expected committed route, got {other:?}"),
    };
    let second = match coordinator.recompute_route("gw_b").unwrap() {
        RouteOutcome::Committed(route) => route,
        other => panic!("expected committed route, got {other:?}"),
    };
    assert_eq!(first, second);
}

#[test]
fn identical_topologies_yield_identical_route_tables() {
    let build = || {
        let mut coordinator = RouteCoordinator::new(emulated_topology());
        coordinator
            .set_switch_status("s5", NodeStatus::Failed)
            .unwrap();
        coordinator.set_sensor_value("seismic_b1", 65.0).unwrap();
        coordinator
    };

    let a = build();
    let b = build();
    assert_eq!(a.routes(), b.routes());
    assert_eq!(a.intent(), b.intent());
}

#[test]
fn audit_trail_is_bounded() {
    let mut coordinator = emulated_coordinator();
    // Flap a sensor across the warning threshold far past the retention cap
    for i in 0..60 {
        let value = if i % 2 == 0 { 55.0 } else { 25.0 };
        coordinator.set_sensor_value("water_a1", value).unwrap();
    }
    let events = coordinator.events();
    assert_eq!(events.len(), 50);
    // Newest first
    assert!(events[0].timestamp >= events[events.len() - 1].timestamp);
}

#[test]
fn reset_returns_to_the_initial_deployment() {
    let mut coordinator = emulated_coordinator();
    coordinator
        .set_switch_status("s4", NodeStatus::Failed)
        .unwrap();
    coordinator.set_battery("s6", 10).unwrap();
    coordinator.set_sensor_value("smoke_c2", 95.0).unwrap();
    coordinator.handle_packet("water_a1", false);

    coordinator.reset();

    let snapshot = coordinator.snapshot();
    assert!(snapshot.switches.iter().all(|s| s.battery == 100));
    assert!(snapshot.switches.iter().all(|s| s.status.is_active()));
    assert_eq!(snapshot.stats.total, 0);
    assert_eq!(snapshot.routes.len(), 3);
    assert_eq!(
        coordinator.route("gw_a").unwrap().switch_path,
        vec!["s4", "s1"]
    );
}
