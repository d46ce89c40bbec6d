//! Session model: conversation turns and the store contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Label used when rendering a conversation into a prompt.
    pub fn label(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Assistant => "Assistant",
        }
    }
}

/// One message in a conversation. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Exclusive hold on one session, released on drop.
pub type SessionGuard = tokio::sync::OwnedMutexGuard<()>;

/// Keyed, ordered conversation histories.
///
/// `append` and `get` never fail. Sessions are created on first `append`.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Push a turn to the end of the session, creating it if absent.
    async fn append(&self, session_id: &str, turn: Turn);

    /// Snapshot of the session's turns; empty if the session does not exist.
    async fn get(&self, session_id: &str) -> Vec<Turn>;

    /// Wait for exclusive use of a session. Holders are never evicted.
    async fn acquire(&self, session_id: &str) -> SessionGuard;

    /// Drop sessions idle past the store's TTL. Returns how many were removed.
    async fn evict_expired(&self) -> usize;

    /// Number of live sessions.
    async fn len(&self) -> usize;
}
