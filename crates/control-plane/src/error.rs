//! Error types for SADRN control plane operations.
//!
//! Only identity errors are surfaced to callers: an unknown id in a command
//! is rejected at the mutation surface with no state change. Routing
//! negatives (no uplink, no path) are ordinary outcomes, not errors, and are
//! modeled as enum results on the coordinator.

use thiserror::Error;

/// Errors that can occur in control plane operations.
#[derive(Debug, Error)]
pub enum ControlPlaneError {
    /// Unknown switch id in a command
    #[error("Switch not found: {id}")]
    SwitchNotFound {
        /// The offending id
        id: String,
    },

    /// Unknown link id in a command
    #[error("Link not found: {id}")]
    LinkNotFound {
        /// The offending id
        id: String,
    },

    /// Unknown gateway id in a command
    #[error("Gateway not found: {id}")]
    GatewayNotFound {
        /// The offending id
        id: String,
    },

    /// Unknown sensor id in a command
    #[error("Sensor not found: {id}")]
    SensorNotFound {
        /// The offending id
        id: String,
    },

    /// A link references a switch that is not in the store
    #[error("Link {link} references unknown switch {switch}")]
    DanglingEndpoint {
        /// The link being inserted
        link: String,
        /// The missing endpoint
        switch: String,
    },
}

/// Result type for control plane operations.
pub type ControlPlaneResult<T> = Result<T, ControlPlaneError>;
