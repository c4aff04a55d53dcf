//! Gateway uplink selection with battery-aware failover
//!
//! Battery avoidance is a soft preference subordinate to availability: a
//! primary below the battery floor is still chosen when the backup is down,
//! because a degraded uplink beats no service at all.

use crate::topology::TopologyStore;
use crate::types::{Gateway, SwitchId};

/// Primary switches below this battery level yield to a healthy backup
pub const UPLINK_BATTERY_FLOOR: u8 = 15;

/// Outcome of uplink selection for one gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UplinkDecision {
    /// Primary switch is active with sufficient battery
    Primary(SwitchId),
    /// Primary unusable, backup is active; callers log a WARNING failover
    Backup(SwitchId),
    /// Backup is down too, but the primary is at least active; degraded
    /// service on a weak battery
    DegradedPrimary(SwitchId),
    /// Neither uplink is usable
    NoUplink,
}

impl UplinkDecision {
    /// The chosen switch, if any
    pub fn switch(&self) -> Option<&SwitchId> {
        match self {
            Self::Primary(s) | Self::Backup(s) | Self::DegradedPrimary(s) => Some(s),
            Self::NoUplink => None,
        }
    }

    /// Whether this decision switched away from the primary
    pub fn is_failover(&self) -> bool {
        matches!(self, Self::Backup(_))
    }
}

/// Uplink selection policy shared by every gateway
#[derive(Debug, Clone)]
pub struct FailoverPolicy {
    battery_floor: u8,
}

impl Default for FailoverPolicy {
    fn default() -> Self {
        Self {
            battery_floor: UPLINK_BATTERY_FLOOR,
        }
    }
}

impl FailoverPolicy {
    /// Choose the gateway's active uplink.
    ///
    /// Order: primary if active with battery at or above the floor; else
    /// backup if active; else primary if merely active; else no uplink.
    pub fn select_uplink(&self, store: &TopologyStore, gateway: &Gateway) -> UplinkDecision {
        let primary_active = store
            .switch(&gateway.primary_switch)
            .is_some_and(|s| s.status.is_active());
        let primary_battery = store
            .switch(&gateway.primary_switch)
            .map(|s| s.battery)
            .unwrap_or(0);
        let backup_active = store
            .switch(&gateway.backup_switch)
            .is_some_and(|s| s.status.is_active());

        if primary_active && primary_battery >= self.battery_floor {
            UplinkDecision::Primary(gateway.primary_switch.clone())
        } else if backup_active {
            UplinkDecision::Backup(gateway.backup_switch.clone())
        } else if primary_active {
            UplinkDecision::DegradedPrimary(gateway.primary_switch.clone())
        } else {
            UplinkDecision::NoUplink
        }
    }
}
