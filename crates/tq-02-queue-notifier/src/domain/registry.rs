//! # Connection Registry
//!
//! Live connections keyed by [`ConnectionId`], each with its [`Role`].
//!
//! The registry's mutex is also the broadcast lock: the notifier holds it
//! for a whole fan-out cycle, so no insert or remove interleaves with a
//! broadcast. It is an async mutex because that cycle awaits the queue
//! store and the broker ack while holding it.
//!
//! The registry never logs; callers report lifecycle changes.

use crate::ports::ConnectionTransport;
use shared_types::{ConnectionId, Role};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// Shared handle to a live connection's write side.
pub type ConnectionHandle = Arc<dyn ConnectionTransport>;

/// A registered connection.
#[derive(Clone)]
pub struct RegisteredConnection {
    pub role: Role,
    pub handle: ConnectionHandle,
}

impl fmt::Debug for RegisteredConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredConnection")
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

pub(crate) type ConnectionMap = HashMap<ConnectionId, RegisteredConnection>;

/// Thread-safe map of live connections.
///
/// Cloning yields another handle to the same registry.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    connections: Arc<Mutex<ConnectionMap>>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection, replacing any entry with the same id.
    ///
    /// Returns the replaced entry. Its handle is no longer reachable through
    /// the registry; closing it is the caller's job.
    pub async fn insert(
        &self,
        id: ConnectionId,
        role: Role,
        handle: ConnectionHandle,
    ) -> Option<RegisteredConnection> {
        self.connections
            .lock()
            .await
            .insert(id, RegisteredConnection { role, handle })
    }

    /// Deregister a connection. An unknown id is a no-op.
    pub async fn remove(&self, id: &ConnectionId) -> Option<RegisteredConnection> {
        self.connections.lock().await.remove(id)
    }

    /// Deregister `id` only if it is still bound to `handle`.
    ///
    /// A connection that was replaced under the same id must not evict its
    /// successor when it shuts down.
    pub async fn remove_if_current(&self, id: &ConnectionId, handle: &ConnectionHandle) -> bool {
        let mut connections = self.connections.lock().await;
        match connections.get(id) {
            Some(entry) if Arc::ptr_eq(&entry.handle, handle) => {
                connections.remove(id);
                true
            }
            _ => false,
        }
    }

    pub async fn contains(&self, id: &ConnectionId) -> bool {
        self.connections.lock().await.contains_key(id)
    }

    /// Role of a registered connection.
    pub async fn role_of(&self, id: &ConnectionId) -> Option<Role> {
        self.connections.lock().await.get(id).map(|entry| entry.role)
    }

    /// Number of live connections.
    pub async fn len(&self) -> usize {
        self.connections.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.connections.lock().await.is_empty()
    }

    /// Registered ids, sorted.
    pub async fn ids(&self) -> Vec<ConnectionId> {
        let mut ids: Vec<_> = self.connections.lock().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Close and deregister every connection. Returns how many were open.
    pub async fn close_all(&self) -> usize {
        let drained: Vec<_> = self.connections.lock().await.drain().collect();
        for (_, entry) in &drained {
            entry.handle.close();
        }
        drained.len()
    }

    /// Take the broadcast lock.
    pub(crate) async fn lock(&self) -> MutexGuard<'_, ConnectionMap> {
        self.connections.lock().await
    }
}

impl fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionRegistry").finish_non_exhaustive()
    }
}
