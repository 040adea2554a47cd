//! Persistence layer: the event log behind the REST API.
//!
//! [`EventLog`] picks one backend at startup: PostgreSQL through
//! `sqlx::PgPool`, or an in-memory store when `PERSISTENCE_ENABLED=false`.
//! The relay core never touches this module.

pub mod memory;
pub mod models;
pub mod postgres;

use crate::domain::{EventRecord, EventType};
use crate::error::GatewayError;

pub use memory::MemoryEventLog;
pub use models::{EventUpdate, NewEvent};
pub use postgres::PostgresEventLog;

/// Event log backend.
#[derive(Debug)]
pub enum EventLog {
    /// Durable PostgreSQL storage.
    Postgres(PostgresEventLog),
    /// Volatile in-process storage.
    Memory(MemoryEventLog),
}

impl EventLog {
    /// In-memory log seeded with the default event type.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::Memory(MemoryEventLog::new())
    }

    /// Short backend name for logs and health output.
    #[must_use]
    pub const fn backend(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::Memory(_) => "memory",
        }
    }

    /// Inserts an event.
    ///
    /// # Errors
    ///
    /// See [`PostgresEventLog::create_event`].
    pub async fn create_event(&self, new: NewEvent) -> Result<EventRecord, GatewayError> {
        match self {
            Self::Postgres(db) => db.create_event(new).await,
            Self::Memory(mem) => mem.create_event(new).await,
        }
    }

    /// Returns every event ordered by id.
    ///
    /// # Errors
    ///
    /// See [`PostgresEventLog::list_events`].
    pub async fn list_events(&self) -> Result<Vec<EventRecord>, GatewayError> {
        match self {
            Self::Postgres(db) => db.list_events().await,
            Self::Memory(mem) => mem.list_events().await,
        }
    }

    /// Returns one event.
    ///
    /// # Errors
    ///
    /// [`GatewayError::EventNotFound`] if absent.
    pub async fn get_event(&self, id: i64) -> Result<EventRecord, GatewayError> {
        match self {
            Self::Postgres(db) => db.get_event(id).await,
            Self::Memory(mem) => mem.get_event(id).await,
        }
    }

    /// Applies a partial update.
    ///
    /// # Errors
    ///
    /// See [`PostgresEventLog::update_event`].
    pub async fn update_event(
        &self,
        id: i64,
        update: EventUpdate,
    ) -> Result<EventRecord, GatewayError> {
        match self {
            Self::Postgres(db) => db.update_event(id, update).await,
            Self::Memory(mem) => mem.update_event(id, update).await,
        }
    }

    /// Deletes an event.
    ///
    /// # Errors
    ///
    /// [`GatewayError::EventNotFound`] if absent.
    pub async fn delete_event(&self, id: i64) -> Result<(), GatewayError> {
        match self {
            Self::Postgres(db) => db.delete_event(id).await,
            Self::Memory(mem) => mem.delete_event(id).await,
        }
    }

    /// Inserts an event type.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Conflict`] if the name is taken.
    pub async fn create_event_type(&self, name: &str) -> Result<EventType, GatewayError> {
        match self {
            Self::Postgres(db) => db.create_event_type(name).await,
            Self::Memory(mem) => mem.create_event_type(name).await,
        }
    }

    /// Returns every event type.
    ///
    /// # Errors
    ///
    /// See [`PostgresEventLog::list_event_types`].
    pub async fn list_event_types(&self) -> Result<Vec<EventType>, GatewayError> {
        match self {
            Self::Postgres(db) => db.list_event_types().await,
            Self::Memory(mem) => mem.list_event_types().await,
        }
    }

    /// Returns one event type.
    ///
    /// # Errors
    ///
    /// [`GatewayError::EventTypeNotFound`] if absent.
    pub async fn get_event_type(&self, id: i64) -> Result<EventType, GatewayError> {
        match self {
            Self::Postgres(db) => db.get_event_type(id).await,
            Self::Memory(mem) => mem.get_event_type(id).await,
        }
    }

    /// Deletes an unused event type.
    ///
    /// # Errors
    ///
    /// See [`PostgresEventLog::delete_event_type`].
    pub async fn delete_event_type(&self, id: i64) -> Result<(), GatewayError> {
        match self {
            Self::Postgres(db) => db.delete_event_type(id).await,
            Self::Memory(mem) => mem.delete_event_type(id).await,
        }
    }
}
