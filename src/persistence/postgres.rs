//! PostgreSQL implementation of the event log.

use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::models::{EventUpdate, NewEvent};
use crate::config::GatewayConfig;
use crate::domain::{EventRecord, EventType};
use crate::error::GatewayError;

type EventRow = (i64, String, DateTime<Utc>, i64, String);

const SELECT_EVENT: &str = "SELECT e.id, e.description, e.occurred_at, t.id, t.name \
     FROM events e JOIN event_types t ON t.id = e.event_type_id";

fn into_record((id, description, timestamp, type_id, type_name): EventRow) -> EventRecord {
    EventRecord {
        id,
        description,
        timestamp,
        event_type: EventType {
            id: type_id,
            name: type_name,
        },
    }
}

/// PostgreSQL-backed event log using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresEventLog {
    pool: PgPool,
}

impl PostgresEventLog {
    /// Creates an event log over an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool from the configured URL and runs pending migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] if the database is
    /// unreachable or a migration fails.
    pub async fn connect(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("event log migrations applied");

        Ok(Self::new(pool))
    }

    async fn type_id_by_name(&self, name: &str) -> Result<i64, GatewayError> {
        sqlx::query_scalar::<_, i64>("SELECT id FROM event_types WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| GatewayError::EventTypeNameNotFound(name.to_string()))
    }

    /// Inserts an event and returns it.
    ///
    /// # Errors
    ///
    /// [`GatewayError::EventTypeNameNotFound`] for an unknown category,
    /// [`GatewayError::PersistenceError`] on database failure.
    pub async fn create_event(&self, new: NewEvent) -> Result<EventRecord, GatewayError> {
        let type_id = self.type_id_by_name(&new.event_type).await?;
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO events (description, occurred_at, event_type_id) \
             VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&new.description)
        .bind(new.timestamp)
        .bind(type_id)
        .fetch_one(&self.pool)
        .await?;

        self.get_event(id).await
    }

    /// Returns every event ordered by id.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn list_events(&self) -> Result<Vec<EventRecord>, GatewayError> {
        let rows = sqlx::query_as::<_, EventRow>(&format!("{SELECT_EVENT} ORDER BY e.id ASC"))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(into_record).collect())
    }

    /// Returns one event.
    ///
    /// # Errors
    ///
    /// [`GatewayError::EventNotFound`] if absent.
    pub async fn get_event(&self, id: i64) -> Result<EventRecord, GatewayError> {
        sqlx::query_as::<_, EventRow>(&format!("{SELECT_EVENT} WHERE e.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(into_record)
            .ok_or(GatewayError::EventNotFound(id))
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
        let type_id = match update.event_type.as_deref() {
            Some(name) => Some(self.type_id_by_name(name).await?),
            None => None,
        };

        let result = sqlx::query(
            "UPDATE events SET \
                description = COALESCE($2, description), \
                occurred_at = COALESCE($3, occurred_at), \
                event_type_id = COALESCE($4, event_type_id) \
             WHERE id = $1",
        )
        .bind(id)
        .bind(update.description)
        .bind(update.timestamp)
        .bind(type_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(GatewayError::EventNotFound(id));
        }
        self.get_event(id).await
    }

    /// Deletes an event.
    ///
    /// # Errors
    ///
    /// [`GatewayError::EventNotFound`] if absent.
    pub async fn delete_event(&self, id: i64) -> Result<(), GatewayError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(GatewayError::EventNotFound(id));
        }
        Ok(())
    }

    /// Inserts a new event type.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Conflict`] if the name is taken.
    pub async fn create_event_type(&self, name: &str) -> Result<EventType, GatewayError> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO event_types (name) VALUES ($1) ON CONFLICT (name) DO NOTHING RETURNING id",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| GatewayError::Conflict(format!("event type {name:?} already exists")))?;

        Ok(EventType {
            id,
            name: name.to_string(),
        })
    }

    /// Returns every event type ordered by id.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn list_event_types(&self) -> Result<Vec<EventType>, GatewayError> {
        let rows =
            sqlx::query_as::<_, (i64, String)>("SELECT id, name FROM event_types ORDER BY id ASC")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows
            .into_iter()
            .map(|(id, name)| EventType { id, name })
            .collect())
    }

    /// Returns one event type.
    ///
    /// # Errors
    ///
    /// [`GatewayError::EventTypeNotFound`] if absent.
    pub async fn get_event_type(&self, id: i64) -> Result<EventType, GatewayError> {
        sqlx::query_as::<_, (i64, String)>("SELECT id, name FROM event_types WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(|(id, name)| EventType { id, name })
            .ok_or(GatewayError::EventTypeNotFound(id))
    }

    /// Deletes an event type that no event refers to.
    ///
    /// # Errors
    ///
    /// [`GatewayError::EventTypeNotFound`] if absent,
    /// [`GatewayError::Conflict`] if events still use it.
    pub async fn delete_event_type(&self, id: i64) -> Result<(), GatewayError> {
        let in_use = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM events WHERE event_type_id = $1)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        if in_use {
            return Err(GatewayError::Conflict(format!(
                "event type {id} is still used by events"
            )));
        }

        let result = sqlx::query("DELETE FROM event_types WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(GatewayError::EventTypeNotFound(id));
        }
        Ok(())
    }
}
