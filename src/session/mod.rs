/// HTTP session affinity
///
/// A session binds a run of stateless HTTP requests to one conversation and
/// owns the tool executor used for that conversation. Stores are injected
/// behind `SessionStore`, so the backing storage stays pluggable.

pub mod memory;

pub use memory::InMemorySessionStore;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::tools::ToolExecutor;

/// Session lifecycle failures reported back to the HTTP caller
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error("MCP-SessionResponse-Id header must be a valid GUID")]
    InvalidHeader,

    #[error("MCP-SessionResponse-Id header required for this method")]
    HeaderRequired,

    #[error("Session {0} not found or expired, call initialize again")]
    NotFound(Uuid),
}

/// One live MCP conversation
pub struct Session {
    id: Uuid,
    executor: Arc<dyn ToolExecutor>,
    created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: Uuid, executor: Arc<dyn ToolExecutor>) -> Self {
        Self {
            id,
            executor,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Tool executor bound to this session
    pub fn executor(&self) -> &dyn ToolExecutor {
        self.executor.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// Storage for sessions; must tolerate concurrent calls from many requests
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Resume or create a session
    ///
    /// `None` always creates a new session. With `Some(id)` the store decides
    /// whether to resume that session or mint a new one.
    async fn get_or_create(&self, requested: Option<Uuid>) -> Arc<Session>;

    /// Look up a live session
    async fn get_existing(&self, id: Uuid) -> Option<Arc<Session>>;
}
