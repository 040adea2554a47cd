//! Relay dispatcher: the two directional forwarding rules.
//!
//! Operator commands fan out to every actuator as binary frames; actuator
//! notifications fan out to every operator as text frames. Recipients
//! whose send fails are evicted from the registry on the spot, which
//! ends their connection. The sender never sees those failures.

use std::sync::Arc;

use bytes::Bytes;

use crate::domain::{BroadcastReport, ConnectionRegistry, Role};

/// A message accepted from a connection, already checked against the
/// sender's role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Command bytes from an operator.
    Command(Bytes),
    /// Status text from an actuator.
    Notification(String),
}

impl Inbound {
    /// Role that sends this kind of message.
    #[must_use]
    pub const fn sender_role(&self) -> Role {
        match self {
            Self::Command(_) => Role::Operator,
            Self::Notification(_) => Role::Actuator,
        }
    }

    /// Role that receives this kind of message.
    #[must_use]
    pub const fn recipient_role(&self) -> Role {
        self.sender_role().peer()
    }
}

/// Stateless forwarding layer over a shared [`ConnectionRegistry`].
#[derive(Debug, Clone)]
pub struct RelayDispatcher {
    registry: Arc<ConnectionRegistry>,
}

impl RelayDispatcher {
    /// Creates a dispatcher over `registry`.
    #[must_use]
    pub const fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Returns a reference to the inner [`ConnectionRegistry`].
    #[must_use]
    pub const fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Routes `inbound` to the role opposite its sender.
    pub fn dispatch(&self, inbound: Inbound) -> BroadcastReport {
        tracing::trace!(
            from = %inbound.sender_role(),
            to = %inbound.recipient_role(),
            "dispatching inbound message"
        );
        match inbound {
            Inbound::Command(payload) => self.forward_command(payload),
            Inbound::Notification(payload) => self.forward_notification(payload),
        }
    }

    /// Sends `payload` as a binary frame to every actuator.
    pub fn forward_command(&self, payload: Bytes) -> BroadcastReport {
        let report = self
            .registry
            .for_each_with_role(Role::Actuator, |conn| conn.send_binary(payload.clone()));
        tracing::debug!(
            bytes = payload.len(),
            delivered = report.delivered,
            failed = report.failed.len(),
            "command forwarded"
        );
        self.evict_failed(&report);
        report
    }

    /// Sends `payload` as a text frame to every operator.
    pub fn forward_notification(&self, payload: String) -> BroadcastReport {
        let report = self
            .registry
            .for_each_with_role(Role::Operator, |conn| conn.send_text(payload.clone()));
        tracing::debug!(
            bytes = payload.len(),
            delivered = report.delivered,
            failed = report.failed.len(),
            "notification forwarded"
        );
        self.evict_failed(&report);
        report
    }

    fn evict_failed(&self, report: &BroadcastReport) {
        for (id, reason) in &report.failed {
            if self.registry.deregister(*id) {
                tracing::warn!(connection_id = %id, %reason, "evicting recipient after failed send");
            }
        }
    }
}
