//! # LiveDeliveryChannel
//!
//! Process-local registry of connected clients, keyed by user id.
//!
//! Volatile and best-effort: nothing here is persisted and nothing is
//! guaranteed to arrive. The durable `Notification` row stays the source of
//! truth; the push only shortens the time until the client sees it.
//!
//! At most one connection per user: the latest registration wins. Each
//! registration gets a fresh [`ConnectionId`] so a late disconnect from the
//! replaced socket cannot evict the current one.

use dashmap::DashMap;
use domains::{ConnectionId, LiveDelivery, LiveEvent, UserId};
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// Sending half handed over by the socket task.
pub type LiveSender = mpsc::UnboundedSender<LiveEvent>;

struct Session {
    id: ConnectionId,
    tx: LiveSender,
}

#[derive(Default)]
pub struct LiveRegistry {
    sessions: DashMap<UserId, Session>,
}

impl LiveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `tx` as the user's connection, replacing any previous one.
    pub fn register(&self, user: UserId, tx: LiveSender) -> ConnectionId {
        let id = ConnectionId::new();
        if let Some(previous) = self.sessions.insert(user, Session { id, tx }) {
            debug!(user = %user, replaced = %previous.id.0, "live connection replaced");
        }
        id
    }

    /// Removes the user's entry only if it still belongs to `connection`.
    pub fn unregister(&self, user: UserId, connection: ConnectionId) -> bool {
        self.sessions
            .remove_if(&user, |_, session| session.id == connection)
            .is_some()
    }

    pub fn is_connected(&self, user: UserId) -> bool {
        self.sessions.contains_key(&user)
    }

    /// Number of users with a live connection.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl LiveDelivery for LiveRegistry {
    fn push(&self, user: UserId, event: LiveEvent) -> bool {
        let Some(session) = self.sessions.get(&user) else {
            trace!(user = %user, "no live connection, dropping event");
            return false;
        };
        if session.tx.send(event).is_ok() {
            return true;
        }

        // The socket task is gone; release the shard guard before pruning.
        let stale = session.id;
        drop(session);
        self.unregister(user, stale);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn message(text: &str) -> LiveEvent {
        LiveEvent::NewMessage {
            message: text.into(),
            sender_id: UserId(1),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn push_without_connection_is_dropped() {
        let registry = LiveRegistry::new();
        assert!(!registry.push(UserId(5), message("hello")));
    }

    #[test]
    fn reconnect_replaces_and_stale_disconnect_is_ignored() {
        let registry = LiveRegistry::new();
        let (old_tx, mut old_rx) = mpsc::unbounded_channel();
        let (new_tx, mut new_rx) = mpsc::unbounded_channel();

        let old = registry.register(UserId(2), old_tx);
        let new = registry.register(UserId(2), new_tx);
        assert_ne!(old, new);

        // The replaced socket closing must not evict the new one.
        assert!(!registry.unregister(UserId(2), old));
        assert!(registry.is_connected(UserId(2)));

        assert!(registry.push(UserId(2), message("hi")));
        assert!(new_rx.try_recv().is_ok());
        assert!(old_rx.try_recv().is_err());

        assert!(registry.unregister(UserId(2), new));
        assert!(registry.is_empty());
    }

    #[test]
    fn closed_receiver_is_pruned_on_push() {
        let registry = LiveRegistry::new();
        let (tx, rx) = mpsc::unbounded_channel();
        registry.register(UserId(3), tx);
        drop(rx);

        assert!(!registry.push(UserId(3), message("gone")));
        assert!(!registry.is_connected(UserId(3)));
    }
}
