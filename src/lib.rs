//! # peeper-gateway
//!
//! Real-time relay between embedded controllers ("actuators") and remote
//! control clients ("operators"), plus a REST event log.
//!
//! Operators send binary commands that fan out to every connected
//! actuator; actuators send text status notifications that fan out to
//! every connected operator. The relay is broadcast-only and keeps no
//! history of what it forwards.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)        ├── WS entry points (ws/)
//!     │                               │
//!     ├── EventService (service/)     ├── RelayDispatcher (service/)
//!     │                               │
//!     └── EventLog (persistence/)     └── ConnectionRegistry (domain/)
//!             │
//!             └── PostgreSQL / in-memory
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod server;
pub mod service;
pub mod ws;
