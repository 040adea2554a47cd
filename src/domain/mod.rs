//! Domain layer: roles, connections, the connection registry, and event
//! log records.
//!
//! The relay core lives here: [`Role`] tags each connection,
//! [`ConnectionRegistry`] tracks who is connected, and [`Connection`] is
//! the non-blocking send handle the registry hands to broadcasts.

pub mod connection;
pub mod connection_id;
pub mod connection_registry;
pub mod event_record;
pub mod role;

pub use connection::{Connection, Outbound};
pub use connection_id::ConnectionId;
pub use connection_registry::{BroadcastReport, ConnectionRegistry, RegistrationHandle};
pub use event_record::{EventRecord, EventType};
pub use role::{InboundKind, Role};
