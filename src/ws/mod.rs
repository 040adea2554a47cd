//! WebSocket layer: the two role-specific relay entry points.
//!
//! Actuators connect at `/ws/actuator` (aliases `/mcu/ws/` and `/mcu/ws`),
//! operators at `/ws/operator` (aliases `/remote/ws/` and `/remote/ws`).
//! Deployed clients use the slashed aliases; axum matches trailing slashes
//! exactly, so both forms are routed. Both run the same lifecycle in
//! [`connection::run_connection`], differing only in the [`Role`] tag.
//!
//! [`Role`]: crate::domain::Role

pub mod connection;
pub mod handler;

use axum::Router;
use axum::routing::get;

use crate::app_state::AppState;

/// Relay routes mounted at the root level.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ws/actuator", get(handler::actuator_ws_handler))
        .route("/ws/operator", get(handler::operator_ws_handler))
        .route("/mcu/ws/", get(handler::actuator_ws_handler))
        .route("/mcu/ws", get(handler::actuator_ws_handler))
        .route("/remote/ws/", get(handler::operator_ws_handler))
        .route("/remote/ws", get(handler::operator_ws_handler))
}
