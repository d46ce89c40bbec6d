//! In-memory session store with per-session locking and idle eviction.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::debug;

use crate::session::{SessionGuard, SessionStore, Turn};

struct SessionSlot {
    turns: Vec<Turn>,
    last_touched: Instant,
    run_lock: Arc<Mutex<()>>,
}

impl SessionSlot {
    fn new() -> Self {
        Self {
            turns: Vec::new(),
            last_touched: Instant::now(),
            run_lock: Arc::new(Mutex::new(())),
        }
    }

    /// A guard is held or awaited somewhere.
    fn busy(&self) -> bool {
        Arc::strong_count(&self.run_lock) > 1
    }
}

/// Process-local session store.
///
/// Sessions idle longer than `ttl` are dropped by [`SessionStore::evict_expired`].
/// Creating a session beyond `max_sessions` first evicts the least recently
/// touched idle session.
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, SessionSlot>>,
    ttl: Option<Duration>,
    max_sessions: Option<usize>,
}

impl InMemorySessionStore {
    pub fn new(ttl: Option<Duration>, max_sessions: Option<usize>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
            max_sessions,
        }
    }

    /// Store without expiry or capacity bound.
    pub fn unbounded() -> Self {
        Self::new(None, None)
    }

    /// Make room for one more session. Caller holds the write lock.
    fn enforce_capacity(&self, sessions: &mut HashMap<String, SessionSlot>) {
        let Some(max) = self.max_sessions else {
            return;
        };
        while sessions.len() >= max {
            let oldest = sessions
                .iter()
                .filter(|(_, slot)| !slot.busy())
                .min_by_key(|(_, slot)| slot.last_touched)
                .map(|(id, _)| id.clone());
            match oldest {
                Some(id) => {
                    sessions.remove(&id);
                    debug!(session = %id, "Evicted least recently used session");
                }
                None => break,
            }
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::unbounded()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn append(&self, session_id: &str, turn: Turn) {
        let mut sessions = self.sessions.write().await;
        if !sessions.contains_key(session_id) {
            self.enforce_capacity(&mut sessions);
        }
        let slot = sessions
            .entry(session_id.to_string())
            .or_insert_with(SessionSlot::new);
        slot.turns.push(turn);
        slot.last_touched = Instant::now();
    }

    async fn get(&self, session_id: &str) -> Vec<Turn> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .map(|slot| slot.turns.clone())
            .unwrap_or_default()
    }

    async fn acquire(&self, session_id: &str) -> SessionGuard {
        let lock = {
            let mut sessions = self.sessions.write().await;
            if !sessions.contains_key(session_id) {
                self.enforce_capacity(&mut sessions);
            }
            let slot = sessions
                .entry(session_id.to_string())
                .or_insert_with(SessionSlot::new);
            slot.last_touched = Instant::now();
            slot.run_lock.clone()
        };
        lock.lock_owned().await
    }

    async fn evict_expired(&self) -> usize {
        let Some(ttl) = self.ttl else {
            return 0;
        };
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, slot| slot.busy() || slot.last_touched.elapsed() < ttl);
        let evicted = before - sessions.len();
        if evicted > 0 {
            debug!(evicted, remaining = sessions.len(), "Evicted idle sessions");
        }
        evicted
    }

    async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
