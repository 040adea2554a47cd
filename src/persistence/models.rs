//! Write-side models for the event log.

use chrono::{DateTime, Utc};

/// Fields of an event to insert. Defaults are already applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    /// Free-form description.
    pub description: String,
    /// When the event happened.
    pub timestamp: DateTime<Utc>,
    /// Name of an existing event type.
    pub event_type: String,
}

/// Partial update of an event. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventUpdate {
    /// New description.
    pub description: Option<String>,
    /// New timestamp.
    pub timestamp: Option<DateTime<Utc>>,
    /// Name of an existing event type to reclassify the event under.
    pub event_type: Option<String>,
}
