//! Bounded, severity-tagged audit trail of state transitions
//!
//! Fixed-capacity ring buffer, most-recent-first. Once full, the oldest
//! entry is silently dropped; appending never fails.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default number of retained events
pub const DEFAULT_CAPACITY: usize = 50;

/// Severity of a logged transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Routine transition
    Info,
    /// Degraded but serviceable (failover, threshold crossing)
    Warning,
    /// Loss of service or element failure
    Critical,
}

/// Category of a logged transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventKind {
    /// Sensor status transition
    Sensor,
    /// Battery threshold crossing
    Battery,
    /// Switch or link failure
    Failure,
    /// Switch or link restoration
    Restore,
    /// Intent mode change
    Intent,
    /// Gateway uplink failover
    Failover,
    /// Route committed or withdrawn
    Route,
    /// Process-level event (reset, startup)
    System,
}

/// One audit trail entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    /// When the transition was recorded
    pub timestamp: DateTime<Utc>,
    /// Category
    pub kind: EventKind,
    /// Human-readable description
    pub message: String,
    /// Severity tag
    pub severity: Severity,
}

/// Ring buffer of recent events, newest first
#[derive(Debug, Clone)]
pub struct EventLog {
    entries: VecDeque<EventRecord>,
    capacity: usize,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventLog {
    /// Create a log retaining at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an entry, evicting the oldest when at capacity
    pub fn append(&mut self, kind: EventKind, message: impl Into<String>, severity: Severity) {
        if self.entries.len() == self.capacity {
            self.entries.pop_back();
        }
        self.entries.push_front(EventRecord {
            timestamp: Utc::now(),
            kind,
            message: message.into(),
            severity,
        });
    }

    /// The most recent `n` entries, newest first
    pub fn tail(&self, n: usize) -> Vec<EventRecord> {
        self.entries.iter().take(n).cloned().collect()
    }

    /// Every retained entry, newest first
    pub fn entries(&self) -> Vec<EventRecord> {
        self.entries.iter().cloned().collect()
    }

    /// Number of retained entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all entries
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
