/// In-process session store with a sliding idle timeout

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::session::{Session, SessionStore};
use crate::tools::ToolExecutorFactory;

struct StoredSession {
    session: Arc<Session>,
    last_seen: DateTime<Utc>,
}

/// Keeps sessions in a mutex-guarded map
///
/// The lock is only held for map operations, never across an await. A
/// caller-supplied id is resumed when it names a live session; otherwise a
/// fresh random id is minted, so clients cannot pick their own ids.
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<Uuid, StoredSession>>,
    idle_ttl: Duration,
    factory: Arc<dyn ToolExecutorFactory>,
}

impl InMemorySessionStore {
    pub fn new(factory: Arc<dyn ToolExecutorFactory>, idle_ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle_ttl,
            factory,
        }
    }

    /// Drop every session idle for longer than the TTL; returns how many
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, stored| !self.is_expired(stored, now));
        let purged = before - sessions.len();
        if purged > 0 {
            info!("Purged {} expired sessions", purged);
        }
        purged
    }

    /// Number of sessions currently held, expired or not
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, StoredSession>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_expired(&self, stored: &StoredSession, now: DateTime<Utc>) -> bool {
        // A negative age (clock moved backwards) counts as fresh
        (now - stored.last_seen)
            .to_std()
            .map(|age| age > self.idle_ttl)
            .unwrap_or(false)
    }

    /// Return the live session for `id`, refreshing its idle timer
    fn touch(
        &self,
        sessions: &mut HashMap<Uuid, StoredSession>,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Option<Arc<Session>> {
        let stored = sessions.get_mut(&id)?;
        if !self.is_expired(stored, now) {
            stored.last_seen = now;
            return Some(Arc::clone(&stored.session));
        }
        debug!(
            "Session {} expired (created {})",
            id,
            stored.session.created_at().to_rfc3339()
        );
        sessions.remove(&id);
        None
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_or_create(&self, requested: Option<Uuid>) -> Arc<Session> {
        let now = Utc::now();
        let mut sessions = self.lock();

        if let Some(id) = requested {
            if let Some(session) = self.touch(&mut sessions, id, now) {
                debug!("Resumed session {}", id);
                return session;
            }
        }

        let session = Arc::new(Session::new(Uuid::new_v4(), self.factory.create()));
        sessions.insert(
            session.id(),
            StoredSession {
                session: Arc::clone(&session),
                last_seen: now,
            },
        );
        info!("Created session {}", session.id());
        session
    }

    async fn get_existing(&self, id: Uuid) -> Option<Arc<Session>> {
        let now = Utc::now();
        let mut sessions = self.lock();
        self.touch(&mut sessions, id, now)
    }
}
