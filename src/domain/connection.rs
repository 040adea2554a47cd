//! Registry-side handle of one open relay connection.

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{ConnectionId, Role};
use crate::error::RelayError;

/// A payload queued for delivery to one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Opaque command bytes, written as a binary frame.
    Command(Bytes),
    /// Status notification, written as a text frame.
    Notification(String),
}

/// Handle the registry keeps for a live connection.
///
/// Holds the sending half of the connection's outbound queue and the
/// token its lifecycle task waits on. Dropping the `Connection` (removing
/// it from the registry) cancels the token, which ends the lifecycle even
/// when the writer is stuck on a peer that stopped reading.
///
/// Sends never wait: a full queue means the peer is not keeping up and
/// is reported as [`RelayError::SendQueueFull`].
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    role: Role,
    outbound: mpsc::Sender<Outbound>,
    closed: CancellationToken,
}

impl Connection {
    /// Wraps an outbound queue sender. `closed` is cancelled when this
    /// value is dropped.
    #[must_use]
    pub const fn new(
        id: ConnectionId,
        role: Role,
        outbound: mpsc::Sender<Outbound>,
        closed: CancellationToken,
    ) -> Self {
        Self {
            id,
            role,
            outbound,
            closed,
        }
    }

    /// Connection identifier.
    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// Role assigned at accept time.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Queues a binary payload.
    ///
    /// # Errors
    ///
    /// [`RelayError::SendQueueFull`] if the peer is too slow,
    /// [`RelayError::ConnectionClosed`] if its writer has gone away.
    pub fn send_binary(&self, payload: Bytes) -> Result<(), RelayError> {
        self.enqueue(Outbound::Command(payload))
    }

    /// Queues a text payload.
    ///
    /// # Errors
    ///
    /// Same as [`Connection::send_binary`].
    pub fn send_text(&self, payload: String) -> Result<(), RelayError> {
        self.enqueue(Outbound::Notification(payload))
    }

    fn enqueue(&self, item: Outbound) -> Result<(), RelayError> {
        self.outbound.try_send(item).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => RelayError::SendQueueFull(self.id),
            mpsc::error::TrySendError::Closed(_) => RelayError::ConnectionClosed(self.id),
        })
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.closed.cancel();
    }
}
