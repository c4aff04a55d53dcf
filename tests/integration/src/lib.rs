//! Integration tests for the SADRN control plane
//!
//! This test suite validates:
//! - End-to-end routing scenarios across the full emulated topology
//! - Failover and route-withdrawal behavior under element failures
//! - Path cache and determinism guarantees
//! - Traffic accounting and the maintenance loops

pub mod test_utils;

#[cfg(test)]
mod scenario_tests;

#[cfg(test)]
mod resilience_tests;

#[cfg(test)]
mod maintenance_tests;
