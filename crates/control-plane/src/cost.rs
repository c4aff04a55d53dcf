//! Intent-parameterized edge cost model
//!
//! One canonical weight function for the whole control plane. Deterministic
//! and pure given the current switch/link state: the same inputs always
//! produce the same weight.
//!
//! Battery is deliberately the dominant non-linear signal. The stepped
//! penalty kicks in below 40% so traffic visibly steers away from a switch
//! well before it nears exhaustion.

use crate::types::{Intent, Link, Switch};

/// Every edge weight floors here to avoid zero or negative edges
pub const MIN_EDGE_WEIGHT: f64 = 0.1;

/// Divisor for the bandwidth-utilization term
pub const K_BANDWIDTH: f64 = 10.0;

/// Added weight per committed route already traversing a link
pub const CONGESTION_STEP: f64 = 1.5;

/// Latency multiplier under `low_latency`
pub const LOW_LATENCY_FACTOR: f64 = 0.5;

/// Latency multiplier under `high_priority`, stronger than `low_latency`
pub const HIGH_PRIORITY_FACTOR: f64 = 0.25;

/// Stepped battery surcharge: 0 at or above 40%, 15 between 20% and 40%,
/// 30 below 20%
pub fn battery_penalty(battery: u8) -> f64 {
    if battery >= 40 {
        0.0
    } else if battery >= 20 {
        15.0
    } else {
        30.0
    }
}

/// Weight of one link edge under the given intent.
///
/// `committed_routes` is the count of currently committed routes traversing
/// this link; it adds a mild load-spreading term under every intent.
pub fn edge_weight(
    link: &Link,
    source: &Switch,
    target: &Switch,
    intent: Intent,
    committed_routes: usize,
) -> f64 {
    let congestion = committed_routes as f64 * CONGESTION_STEP;
    let utilization = (link.capacity.saturating_sub(link.bandwidth)) as f64 / K_BANDWIDTH;

    let weight = match intent {
        Intent::Balanced => link.latency_ms + utilization + congestion,
        Intent::LowLatency => link.latency_ms * LOW_LATENCY_FACTOR + congestion,
        Intent::HighPriority => link.latency_ms * HIGH_PRIORITY_FACTOR + congestion,
        Intent::LowPower => {
            link.latency_ms
                + battery_penalty(source.battery)
                + battery_penalty(target.battery)
                + utilization * 0.5
                + congestion
        }
    };

    weight.max(MIN_EDGE_WEIGHT)
}
