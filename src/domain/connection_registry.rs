//! Registry of live relay connections.
//!
//! [`ConnectionRegistry`] is the only shared mutable state of the relay.
//! Membership changes and broadcast passes are serialized by a single
//! [`std::sync::RwLock`]: a broadcast holds the read lock for the whole
//! pass, so a concurrent deregistration either happens before the pass
//! (and the connection is skipped) or after it (and the connection was
//! visited exactly once).
//!
//! The lock is never held across an `.await`. Callbacks run under the lock
//! must not block; [`Connection`] sends are `try_send` for that reason.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::connection::{Connection, Outbound};
use super::{ConnectionId, Role};
use crate::error::RelayError;

/// Outbound queue depth used by [`ConnectionRegistry::default`].
pub const DEFAULT_SEND_QUEUE_CAPACITY: usize = 256;

/// Outcome of one [`ConnectionRegistry::for_each_with_role`] pass.
#[derive(Debug, Default)]
pub struct BroadcastReport {
    /// Connections with a matching role at the time of the pass.
    pub attempted: usize,
    /// Connections for which the callback succeeded.
    pub delivered: usize,
    /// Connections for which the callback failed, with the reason.
    pub failed: Vec<(ConnectionId, RelayError)>,
}

/// Process-wide set of open connections, tagged by [`Role`].
///
/// Constructed once at startup and injected into every connection
/// handler; tests build their own.
#[derive(Debug)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<ConnectionId, Connection>>,
    max_connections: Option<usize>,
    send_queue_capacity: usize,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    ///
    /// `max_connections == 0` means unlimited. A `send_queue_capacity` of
    /// zero is raised to one.
    #[must_use]
    pub fn new(max_connections: usize, send_queue_capacity: usize) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            max_connections: (max_connections > 0).then_some(max_connections),
            send_queue_capacity: send_queue_capacity.max(1),
        }
    }

    /// Adds a new connection with the given role.
    ///
    /// Returns the handle that removes it again, and the receiving end of
    /// its outbound queue for the connection's writer.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::ConnectionLimit`] when the registry already
    /// holds `max_connections` entries.
    pub fn register(
        self: &Arc<Self>,
        role: Role,
    ) -> Result<(RegistrationHandle, mpsc::Receiver<Outbound>), RelayError> {
        let id = ConnectionId::new();
        let (tx, rx) = mpsc::channel(self.send_queue_capacity);
        let closed = CancellationToken::new();

        let mut map = self.write();
        if let Some(limit) = self.max_connections
            && map.len() >= limit
        {
            return Err(RelayError::ConnectionLimit(limit));
        }
        map.insert(id, Connection::new(id, role, tx, closed.clone()));
        drop(map);

        tracing::debug!(connection_id = %id, %role, "connection registered");
        Ok((
            RegistrationHandle {
                id,
                role,
                registry: Arc::clone(self),
                closed,
                released: AtomicBool::new(false),
            },
            rx,
        ))
    }

    /// Removes a connection. Returns `false` if it was already gone.
    pub fn deregister(&self, id: ConnectionId) -> bool {
        let removed = self.write().remove(&id).is_some();
        if removed {
            tracing::debug!(connection_id = %id, "connection deregistered");
        }
        removed
    }

    /// Calls `f` once for every registered connection with `role`.
    ///
    /// A failing callback is recorded in the report and does not stop the
    /// pass. Registration changes made by other tasks wait for the pass
    /// to finish.
    pub fn for_each_with_role<F>(&self, role: Role, mut f: F) -> BroadcastReport
    where
        F: FnMut(&Connection) -> Result<(), RelayError>,
    {
        let map = self.read();
        let mut report = BroadcastReport::default();
        for conn in map.values().filter(|c| c.role() == role) {
            report.attempted += 1;
            match f(conn) {
                Ok(()) => report.delivered += 1,
                Err(e) => report.failed.push((conn.id(), e)),
            }
        }
        report
    }

    /// Number of registered connections with `role`.
    #[must_use]
    pub fn count(&self, role: Role) -> usize {
        self.read().values().filter(|c| c.role() == role).count()
    }

    /// Total number of registered connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Returns `true` if `id` is currently registered.
    #[must_use]
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.read().contains_key(&id)
    }

    /// Returns `true` if a new registration would be refused.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.max_connections
            .is_some_and(|limit| self.read().len() >= limit)
    }

    /// Drops every connection, closing all outbound queues. Used at
    /// shutdown. Returns how many were removed.
    pub fn close_all(&self) -> usize {
        let mut map = self.write();
        let n = map.len();
        map.clear();
        n
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<ConnectionId, Connection>> {
        self.connections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<ConnectionId, Connection>> {
        self.connections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new(0, DEFAULT_SEND_QUEUE_CAPACITY)
    }
}

/// Membership token returned by [`ConnectionRegistry::register`].
///
/// Deregisters the connection on [`RegistrationHandle::deregister`] or on
/// drop, whichever comes first; the second call is a no-op.
#[derive(Debug)]
pub struct RegistrationHandle {
    id: ConnectionId,
    role: Role,
    registry: Arc<ConnectionRegistry>,
    closed: CancellationToken,
    released: AtomicBool,
}

impl RegistrationHandle {
    /// Identifier of the registered connection.
    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// Role the connection was registered with.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Resolves once the connection is no longer registered, whoever
    /// removed it: this handle, an eviction, or
    /// [`ConnectionRegistry::close_all`].
    pub async fn closed(&self) {
        self.closed.cancelled().await;
    }

    /// Removes the connection from the registry.
    ///
    /// Returns `true` only for the call that actually removed it; later
    /// calls, or calls after the dispatcher already evicted it, return
    /// `false`.
    pub fn deregister(&self) -> bool {
        if self.released.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.registry.deregister(self.id)
    }
}

impl Drop for RegistrationHandle {
    fn drop(&mut self) {
        self.deregister();
    }
}
