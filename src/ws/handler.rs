//! Axum WebSocket upgrade handlers, one per role.

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::response::{IntoResponse, Response};

use super::connection::run_connection;
use crate::app_state::AppState;
use crate::domain::Role;
use crate::error::{GatewayError, RelayError};

/// `GET /ws/actuator` — Upgrade an embedded controller connection.
pub async fn actuator_ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    upgrade(ws, &state, Role::Actuator)
}

/// `GET /ws/operator` — Upgrade a remote control client connection.
pub async fn operator_ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    upgrade(ws, &state, Role::Operator)
}

fn upgrade(ws: WebSocketUpgrade, state: &AppState, role: Role) -> Response {
    if state.registry().is_full() {
        tracing::warn!(%role, "connection limit reached, refusing upgrade");
        return GatewayError::from(RelayError::ConnectionLimit(state.relay.max_connections))
            .into_response();
    }

    let dispatcher = state.dispatcher.clone();
    let idle_timeout = state.relay.idle_timeout;

    ws.on_failed_upgrade(move |e| {
        tracing::warn!(%role, error = %e, "websocket upgrade failed");
    })
    .on_upgrade(move |socket| run_connection(socket, role, dispatcher, idle_timeout))
}
