//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::RelaySettings;
use crate::domain::ConnectionRegistry;
use crate::persistence::EventLog;
use crate::service::{EventService, RelayDispatcher};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Relay forwarding rules; also owns the connection registry.
    pub dispatcher: RelayDispatcher,
    /// Event log service for the REST API.
    pub event_service: EventService,
    /// Relay tuning knobs.
    pub relay: RelaySettings,
}

impl AppState {
    /// Builds the state around a fresh [`ConnectionRegistry`].
    #[must_use]
    pub fn new(relay: RelaySettings, event_log: EventLog) -> Self {
        let registry = Arc::new(ConnectionRegistry::new(
            relay.max_connections,
            relay.send_queue_capacity,
        ));
        Self {
            dispatcher: RelayDispatcher::new(registry),
            event_service: EventService::new(Arc::new(event_log)),
            relay,
        }
    }

    /// The process-wide connection registry.
    #[must_use]
    pub const fn registry(&self) -> &Arc<ConnectionRegistry> {
        self.dispatcher.registry()
    }
}
