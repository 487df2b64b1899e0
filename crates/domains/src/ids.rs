//! # Typed Identifiers
//!
//! Every persisted entity is keyed by an `i64` row id. Wrapping them in
//! distinct newtypes keeps a `PostId` from ever being passed where a
//! `UserId` is expected (the notification target union relies on this).

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }
    };
}

row_id!(
    /// Identity of a registered user.
    UserId
);
row_id!(PostId);
row_id!(MessageId);
row_id!(NotificationId);
row_id!(CommunityId);
row_id!(EventId);

/// Identity of one live socket. A user reconnecting gets a fresh one, which
/// lets the registry tell a stale disconnect apart from the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub uuid::Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}
