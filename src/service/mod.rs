//! Service layer: relay forwarding rules and event log orchestration.

pub mod event_service;
pub mod relay_dispatcher;

pub use event_service::EventService;
pub use relay_dispatcher::{Inbound, RelayDispatcher};
