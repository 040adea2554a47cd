//! Event log records: timestamped events classified by a named category.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// Name of the category seeded into every fresh event log.
pub const DEFAULT_EVENT_TYPE: &str = "Turn On";

/// A named event category (e.g. `"Turn On"`, `"Ultrasonic"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct EventType {
    /// Row identifier.
    pub id: i64,
    /// Unique category name.
    pub name: String,
}

/// One logged event.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EventRecord {
    /// Row identifier.
    pub id: i64,
    /// Free-form description.
    pub description: String,
    /// When the event happened.
    pub timestamp: DateTime<Utc>,
    /// Category the event belongs to.
    pub event_type: EventType,
}

impl EventRecord {
    /// POSIX timestamp in fractional seconds, as the firmware reports it.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn raw_timestamp(&self) -> f64 {
        self.timestamp.timestamp_micros() as f64 / 1_000_000.0
    }
}
