//! In-memory event log, used when persistence is disabled and in tests.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::models::{EventUpdate, NewEvent};
use crate::domain::event_record::DEFAULT_EVENT_TYPE;
use crate::domain::{EventRecord, EventType};
use crate::error::GatewayError;

#[derive(Debug)]
struct StoredEvent {
    description: String,
    timestamp: DateTime<Utc>,
    type_id: i64,
}

#[derive(Debug, Default)]
struct State {
    last_event_id: i64,
    last_type_id: i64,
    events: BTreeMap<i64, StoredEvent>,
    types: BTreeMap<i64, String>,
}

impl State {
    fn type_id_by_name(&self, name: &str) -> Result<i64, GatewayError> {
        self.types
            .iter()
            .find(|(_, n)| n.as_str() == name)
            .map(|(id, _)| *id)
            .ok_or_else(|| GatewayError::EventTypeNameNotFound(name.to_string()))
    }

    fn insert_type(&mut self, name: &str) -> Result<EventType, GatewayError> {
        if self.types.values().any(|n| n == name) {
            return Err(GatewayError::Conflict(format!(
                "event type {name:?} already exists"
            )));
        }
        self.last_type_id += 1;
        self.types.insert(self.last_type_id, name.to_string());
        Ok(EventType {
            id: self.last_type_id,
            name: name.to_string(),
        })
    }

    fn record(&self, id: i64) -> Result<EventRecord, GatewayError> {
        let stored = self.events.get(&id).ok_or(GatewayError::EventNotFound(id))?;
        let type_name = self
            .types
            .get(&stored.type_id)
            .cloned()
            .ok_or_else(|| GatewayError::Internal(format!("event {id} has a dangling type")))?;
        Ok(EventRecord {
            id,
            description: stored.description.clone(),
            timestamp: stored.timestamp,
            event_type: EventType {
                id: stored.type_id,
                name: type_name,
            },
        })
    }
}

/// Event log kept in process memory. Contents are lost on restart.
#[derive(Debug)]
pub struct MemoryEventLog {
    state: RwLock<State>,
}

impl MemoryEventLog {
    /// Creates a log holding only the default event type.
    #[must_use]
    pub fn new() -> Self {
        let mut state = State::default();
        // Fresh state has no types, so the insert cannot conflict.
        let _ = state.insert_type(DEFAULT_EVENT_TYPE);
        Self {
            state: RwLock::new(state),
        }
    }

    /// Inserts an event and returns it.
    ///
    /// # Errors
    ///
    /// [`GatewayError::EventTypeNameNotFound`] for an unknown category.
    pub async fn create_event(&self, new: NewEvent) -> Result<EventRecord, GatewayError> {
        let mut state = self.state.write().await;
        let type_id = state.type_id_by_name(&new.event_type)?;
        state.last_event_id += 1;
        let id = state.last_event_id;
        state.events.insert(
            id,
            StoredEvent {
                description: new.description,
                timestamp: new.timestamp,
                type_id,
            },
        );
        state.record(id)
    }

    /// Returns every event ordered by id.
    ///
    /// # Errors
    ///
    /// Only on internal inconsistency.
    pub async fn list_events(&self) -> Result<Vec<EventRecord>, GatewayError> {
        let state = self.state.read().await;
        state.events.keys().map(|id| state.record(*id)).collect()
    }

    /// Returns one event.
    ///
    /// # Errors
    ///
    /// [`GatewayError::EventNotFound`] if absent.
    pub async fn get_event(&self, id: i64) -> Result<EventRecord, GatewayError> {
        self.state.read().await.record(id)
    }

    /// Applies a partial update and returns the updated event.
    ///
    /// # Errors
    ///
    /// [`GatewayError::EventNotFound`] or
    /// [`GatewayError::EventTypeNameNotFound`].
    pub async fn update_event(
        &self,
        id: i64,
        update: EventUpdate,
    ) -> Result<EventRecord, GatewayError> {
        let mut state = self.state.write().await;
        let type_id = update
            .event_type
            .as_deref()
            .map(|name| state.type_id_by_name(name))
            .transpose()?;
        let stored = state
            .events
            .get_mut(&id)
            .ok_or(GatewayError::EventNotFound(id))?;

        if let Some(description) = update.description {
            stored.description = description;
        }
        if let Some(timestamp) = update.timestamp {
            stored.timestamp = timestamp;
        }
        if let Some(type_id) = type_id {
            stored.type_id = type_id;
        }
        state.record(id)
    }

    /// Deletes an event.
    ///
    /// # Errors
    ///
    /// [`GatewayError::EventNotFound`] if absent.
    pub async fn delete_event(&self, id: i64) -> Result<(), GatewayError> {
        self.state
            .write()
            .await
            .events
            .remove(&id)
            .map(|_| ())
            .ok_or(GatewayError::EventNotFound(id))
    }

    /// Inserts a new event type.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Conflict`] if the name is taken.
    pub async fn create_event_type(&self, name: &str) -> Result<EventType, GatewayError> {
        self.state.write().await.insert_type(name)
    }

    /// Returns every event type ordered by id.
    ///
    /// # Errors
    ///
    /// Never fails; the signature matches the database backend.
    pub async fn list_event_types(&self) -> Result<Vec<EventType>, GatewayError> {
        let state = self.state.read().await;
        Ok(state
            .types
            .iter()
            .map(|(id, name)| EventType {
                id: *id,
                name: name.clone(),
            })
            .collect())
    }

    /// Returns one event type.
    ///
    /// # Errors
    ///
    /// [`GatewayError::EventTypeNotFound`] if absent.
    pub async fn get_event_type(&self, id: i64) -> Result<EventType, GatewayError> {
        let state = self.state.read().await;
        state
            .types
            .get(&id)
            .map(|name| EventType {
                id,
                name: name.clone(),
            })
            .ok_or(GatewayError::EventTypeNotFound(id))
    }

    /// Deletes an event type that no event refers to.
    ///
    /// # Errors
    ///
    /// [`GatewayError::EventTypeNotFound`] if absent,
    /// [`GatewayError::Conflict`] if events still use it.
    pub async fn delete_event_type(&self, id: i64) -> Result<(), GatewayError> {
        let mut state = self.state.write().await;
        if !state.types.contains_key(&id) {
            return Err(GatewayError::EventTypeNotFound(id));
        }
        if state.events.values().any(|e| e.type_id == id) {
            return Err(GatewayError::Conflict(format!(
                "event type {id} is still used by events"
            )));
        }
        state.types.remove(&id);
        Ok(())
    }
}

impl Default for MemoryEventLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn new_event(description: &str, event_type: &str) -> NewEvent {
        NewEvent {
            description: description.to_string(),
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
        }
    }

    #[tokio::test]
    async fn seeds_default_type() {
        let log = MemoryEventLog::new();
        let Ok(types) = log.list_event_types().await else {
            panic!("list failed");
        };
        assert_eq!(types.len(), 1);
        assert_eq!(types.first().map(|t| t.name.as_str()), Some(DEFAULT_EVENT_TYPE));
    }

    #[tokio::test]
    async fn create_get_update_delete() {
        let log = MemoryEventLog::new();
        let Ok(created) = log.create_event(new_event("door opened", DEFAULT_EVENT_TYPE)).await else {
            panic!("create failed");
        };
        assert_eq!(created.id, 1);

        let Ok(ultra) = log.create_event_type("Ultrasonic").await else {
            panic!("create type failed");
        };
        let update = EventUpdate {
            description: Some("obstacle".to_string()),
            event_type: Some("Ultrasonic".to_string()),
            ..EventUpdate::default()
        };
        let Ok(updated) = log.update_event(created.id, update).await else {
            panic!("update failed");
        };
        assert_eq!(updated.description, "obstacle");
        assert_eq!(updated.event_type, ultra);
        assert_eq!(updated.timestamp, created.timestamp);

        assert!(log.delete_event(created.id).await.is_ok());
        assert!(matches!(
            log.get_event(created.id).await,
            Err(GatewayError::EventNotFound(1))
        ));
        assert!(matches!(
            log.delete_event(created.id).await,
            Err(GatewayError::EventNotFound(1))
        ));
    }

    #[tokio::test]
    async fn unknown_type_name_is_rejected() {
        let log = MemoryEventLog::new();
        let result = log.create_event(new_event("x", "Nope")).await;
        assert!(matches!(result, Err(GatewayError::EventTypeNameNotFound(n)) if n == "Nope"));
    }

    #[tokio::test]
    async fn duplicate_type_conflicts() {
        let log = MemoryEventLog::new();
        let result = log.create_event_type(DEFAULT_EVENT_TYPE).await;
        assert!(matches!(result, Err(GatewayError::Conflict(_))));
    }

    #[tokio::test]
    async fn type_in_use_cannot_be_deleted() {
        let log = MemoryEventLog::new();
        let Ok(event) = log.create_event(new_event("x", DEFAULT_EVENT_TYPE)).await else {
            panic!("create failed");
        };
        let type_id = event.event_type.id;
        assert!(matches!(
            log.delete_event_type(type_id).await,
            Err(GatewayError::Conflict(_))
        ));

        assert!(log.delete_event(event.id).await.is_ok());
        assert!(log.delete_event_type(type_id).await.is_ok());
        assert!(matches!(
            log.get_event_type(type_id).await,
            Err(GatewayError::EventTypeNotFound(_))
        ));
    }

    #[tokio::test]
    async fn list_is_ordered_by_id() {
        let log = MemoryEventLog::new();
        for d in ["a", "b", "c"] {
            assert!(log.create_event(new_event(d, DEFAULT_EVENT_TYPE)).await.is_ok());
        }
        let Ok(events) = log.list_events().await else {
            panic!("list failed");
        };
        let ids: Vec<i64> = events.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
