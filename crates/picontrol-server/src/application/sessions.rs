//! The set of currently open client sessions.
//!
//! Registration returns a [`SessionGuard`]; dropping the guard removes the
//! entry.  Every way a session task can end (clean close, transport error,
//! panic unwinding through the task) therefore leaves the set consistent.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use uuid::Uuid;

/// Identifier assigned to a session when it is registered.
pub type SessionId = Uuid;

/// Shared handle to the active-session set.  Clones refer to the same set.
#[derive(Debug, Clone, Default)]
pub struct ActiveSessions {
    inner: Arc<Mutex<HashMap<SessionId, SocketAddr>>>,
}

impl ActiveSessions {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SessionId, SocketAddr>> {
        // The map stays valid even if a holder panicked mid-operation.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a session for `peer` and returns the guard that owns the entry.
    pub fn register(&self, peer: SocketAddr) -> SessionGuard {
        let id = Uuid::new_v4();
        self.lock().insert(id, peer);
        SessionGuard {
            id,
            sessions: self.clone(),
        }
    }

    /// `true` while the session is open.
    pub fn contains(&self, id: SessionId) -> bool {
        self.lock().contains_key(&id)
    }

    /// Number of open sessions.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Membership of one session in [`ActiveSessions`].
#[derive(Debug)]
pub struct SessionGuard {
    id: SessionId,
    sessions: ActiveSessions,
}

impl SessionGuard {
    pub fn id(&self) -> SessionId {
        self.id
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.sessions.lock().remove(&self.id);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    #[test]
    fn test_register_then_drop_removes_entry() {
        // Arrange
        let sessions = ActiveSessions::new();

        // Act
        let guard = sessions.register(peer(5000));
        let id = guard.id();

        // Assert
        assert!(sessions.contains(id));
        assert_eq!(sessions.len(), 1);
        drop(guard);
        assert!(!sessions.contains(id));
        assert!(sessions.is_empty());
    }

    #[test]
    fn test_sessions_have_distinct_ids() {
        let sessions = ActiveSessions::new();
        let a = sessions.register(peer(5000));
        let b = sessions.register(peer(5000));
        assert_ne!(a.id(), b.id());
        assert_eq!(sessions.len(), 2);
        drop(a);
        assert_eq!(sessions.len(), 1);
        assert!(sessions.contains(b.id()));
    }

    #[test]
    fn test_guard_is_released_when_owner_panics() {
        let sessions = ActiveSessions::new();
        let shared = sessions.clone();

        let outcome = std::thread::spawn(move || {
            let _guard = shared.register(peer(6000));
            panic!("session task died");
        })
        .join();

        assert!(outcome.is_err());
        assert!(sessions.is_empty());
    }
}
