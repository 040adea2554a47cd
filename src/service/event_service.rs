//! Event log service: request defaults and validation in front of
//! [`EventLog`].

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::event_record::DEFAULT_EVENT_TYPE;
use crate::domain::{EventRecord, EventType};
use crate::error::GatewayError;
use crate::persistence::{EventLog, EventUpdate, NewEvent};

/// Description stored when the client gives none.
pub const DEFAULT_DESCRIPTION: &str = "N/A";

/// Converts POSIX seconds (fractional allowed) to a UTC timestamp.
///
/// # Errors
///
/// [`GatewayError::InvalidRequest`] for NaN, infinities, or values outside
/// the representable date range.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn timestamp_from_posix(raw: f64) -> Result<DateTime<Utc>, GatewayError> {
    if !raw.is_finite() {
        return Err(GatewayError::InvalidRequest(format!(
            "raw_timestamp must be finite, got {raw}"
        )));
    }
    let secs = raw.floor();
    let nanos = ((raw - secs) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(secs as i64, nanos).ok_or_else(|| {
        GatewayError::InvalidRequest(format!("raw_timestamp {raw} is out of range"))
    })
}

/// Orchestrates event log operations.
#[derive(Debug, Clone)]
pub struct EventService {
    log: Arc<EventLog>,
}

impl EventService {
    /// Creates a new `EventService`.
    #[must_use]
    pub const fn new(log: Arc<EventLog>) -> Self {
        Self { log }
    }

    /// Returns the backing [`EventLog`].
    #[must_use]
    pub const fn log(&self) -> &Arc<EventLog> {
        &self.log
    }

    /// Logs a new event. Missing fields default to `"N/A"`, now, and the
    /// `"Turn On"` category.
    ///
    /// # Errors
    ///
    /// [`GatewayError::InvalidRequest`] for a bad timestamp,
    /// [`GatewayError::EventTypeNameNotFound`] for an unknown category.
    pub async fn create_event(
        &self,
        description: Option<String>,
        raw_timestamp: Option<f64>,
        event_type: Option<String>,
    ) -> Result<EventRecord, GatewayError> {
        let timestamp = raw_timestamp
            .map(timestamp_from_posix)
            .transpose()?
            .unwrap_or_else(Utc::now);
        let new = NewEvent {
            description: description.unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            timestamp,
            event_type: event_type.unwrap_or_else(|| DEFAULT_EVENT_TYPE.to_string()),
        };

        let record = self.log.create_event(new).await?;
        tracing::info!(event_id = record.id, event_type = %record.event_type.name, "event logged");
        Ok(record)
    }

    /// Lists every event.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn list_events(&self) -> Result<Vec<EventRecord>, GatewayError> {
        self.log.list_events().await
    }

    /// Fetches one event.
    ///
    /// # Errors
    ///
    /// [`GatewayError::EventNotFound`] if absent.
    pub async fn get_event(&self, id: i64) -> Result<EventRecord, GatewayError> {
        self.log.get_event(id).await
    }

    /// Updates the given fields of an event.
    ///
    /// # Errors
    ///
    /// [`GatewayError::InvalidRequest`], [`GatewayError::EventNotFound`] or
    /// [`GatewayError::EventTypeNameNotFound`].
    pub async fn update_event(
        &self,
        id: i64,
        description: Option<String>,
        raw_timestamp: Option<f64>,
        event_type: Option<String>,
    ) -> Result<EventRecord, GatewayError> {
        let update = EventUpdate {
            description,
            timestamp: raw_timestamp.map(timestamp_from_posix).transpose()?,
            event_type,
        };
        let record = self.log.update_event(id, update).await?;
        tracing::info!(event_id = id, "event updated");
        Ok(record)
    }

    /// Deletes an event.
    ///
    /// # Errors
    ///
    /// [`GatewayError::EventNotFound`] if absent.
    pub async fn delete_event(&self, id: i64) -> Result<(), GatewayError> {
        self.log.delete_event(id).await?;
        tracing::info!(event_id = id, "event deleted");
        Ok(())
    }

    /// Adds an event category.
    ///
    /// # Errors
    ///
    /// [`GatewayError::InvalidRequest`] for a blank name,
    /// [`GatewayError::Conflict`] for a duplicate.
    pub async fn create_event_type(&self, name: &str) -> Result<EventType, GatewayError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GatewayError::InvalidRequest(
                "event type name must not be empty".to_string(),
            ));
        }
        let event_type = self.log.create_event_type(name).await?;
        tracing::info!(event_type_id = event_type.id, name, "event type created");
        Ok(event_type)
    }

    /// Lists every event category.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn list_event_types(&self) -> Result<Vec<EventType>, GatewayError> {
        self.log.list_event_types().await
    }

    /// Fetches one event category.
    ///
    /// # Errors
    ///
    /// [`GatewayError::EventTypeNotFound`] if absent.
    pub async fn get_event_type(&self, id: i64) -> Result<EventType, GatewayError> {
        self.log.get_event_type(id).await
    }

    /// Deletes an unused event category.
    ///
    /// # Errors
    ///
    /// [`GatewayError::EventTypeNotFound`] or [`GatewayError::Conflict`].
    pub async fn delete_event_type(&self, id: i64) -> Result<(), GatewayError> {
        self.log.delete_event_type(id).await?;
        tracing::info!(event_type_id = id, "event type deleted");
        Ok(())
    }
}
