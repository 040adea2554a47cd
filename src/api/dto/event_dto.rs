//! Event log DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common_dto::PaginationMeta;
use crate::domain::{EventRecord, EventType};

/// Request body for `POST /events`. Every field is optional.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct CreateEventRequest {
    /// Free-form description. Defaults to `"N/A"`.
    pub description: Option<String>,
    /// POSIX timestamp in seconds. Defaults to the current time.
    pub raw_timestamp: Option<f64>,
    /// Name of an existing event type. Defaults to `"Turn On"`.
    pub event_type: Option<String>,
}

/// Request body for `PUT /events/:id`. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct UpdateEventRequest {
    /// New description.
    pub description: Option<String>,
    /// New POSIX timestamp in seconds.
    pub raw_timestamp: Option<f64>,
    /// Name of an existing event type.
    pub event_type: Option<String>,
}

/// A logged event as returned by the API.
#[derive(Debug, Serialize, ToSchema)]
pub struct EventResponse {
    /// Event identifier.
    pub id: i64,
    /// Free-form description.
    pub description: String,
    /// ISO-8601 timestamp.
    pub timestamp: DateTime<Utc>,
    /// Same instant as POSIX seconds.
    pub raw_timestamp: f64,
    /// Category of the event.
    pub event_type: EventType,
}

impl From<EventRecord> for EventResponse {
    fn from(record: EventRecord) -> Self {
        Self {
            raw_timestamp: record.raw_timestamp(),
            id: record.id,
            description: record.description,
            timestamp: record.timestamp,
            event_type: record.event_type,
        }
    }
}

/// Paginated list response for `GET /events`.
#[derive(Debug, Serialize, ToSchema)]
pub struct EventListResponse {
    /// Events on this page, ordered by id.
    pub data: Vec<EventResponse>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

/// Request body for `POST /event-types`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateEventTypeRequest {
    /// Unique category name.
    pub name: String,
}
