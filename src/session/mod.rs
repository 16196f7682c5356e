//! Per-browser session state
//!
//! Sessions are held in memory and addressed by a random id carried in a
//! signed cookie (see [`cookie`]). Each session sits behind its own mutex so
//! a request's read-modify-write of documents or history cannot interleave
//! with another request from the same browser. Upload ownership across
//! sessions is tracked separately in [`DocumentRefs`].

pub mod cookie;
pub mod refs;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{Document, HistoryEntry};
use crate::storage::Storage;

pub use refs::DocumentRefs;

pub type SessionHandle = Arc<Mutex<Session>>;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Session {
    pub documents: Vec<Document>,
    pub response: Option<String>,
    pub history: Vec<HistoryEntry>,
    pub chart_path: Option<PathBuf>,
    pub report_path: Option<PathBuf>,
    /// Messages shown once on the next rendered page
    pub flashes: Vec<String>,
}

impl Session {
    pub fn flash(&mut self, message: impl Into<String>) {
        self.flashes.push(message.into());
    }

    pub fn take_flashes(&mut self) -> Vec<String> {
        std::mem::take(&mut self.flashes)
    }

    /// Drop all state, returning the documents that were tracked
    pub fn clear(&mut self) -> Vec<Document> {
        std::mem::take(self).documents
    }

    pub fn has_response(&self) -> bool {
        self.response.as_deref().is_some_and(|r| !r.is_empty())
    }
}

struct Slot {
    handle: SessionHandle,
    last_seen: Instant,
}

#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, Slot>>>,
    documents: DocumentRefs,
    secret: Arc<str>,
}

impl SessionStore {
    pub fn new(secret: &str) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            documents: DocumentRefs::default(),
            secret: Arc::from(secret),
        }
    }

    /// Find the session named by a cookie value, or start a new one.
    ///
    /// Returns the id, the handle and whether the session was just created
    /// (the caller must then send a cookie). Marks the session as seen.
    pub async fn resolve(&self, cookie_value: Option<&str>) -> (Uuid, SessionHandle, bool) {
        let verified = cookie_value.and_then(|v| cookie::verify(v, &self.secret));
        let mut sessions = self.inner.write().await;

        if let Some(id) = verified {
            if let Some(slot) = sessions.get_mut(&id) {
                slot.last_seen = Instant::now();
                return (id, slot.handle.clone(), false);
            }
        }

        let id = Uuid::new_v4();
        let handle = SessionHandle::default();
        sessions.insert(
            id,
            Slot {
                handle: handle.clone(),
                last_seen: Instant::now(),
            },
        );
        debug!(session_id = %id, "Created session");
        (id, handle, true)
    }

    pub async fn get(&self, id: Uuid) -> Option<SessionHandle> {
        self.inner.read().await.get(&id).map(|slot| slot.handle.clone())
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Signed cookie value for `id`
    pub fn cookie_value(&self, id: Uuid) -> String {
        cookie::sign(id, &self.secret)
    }

    /// Upload reference counts shared by every session
    pub fn documents(&self) -> &DocumentRefs {
        &self.documents
    }

    /// Drop sessions idle for at least `max_idle` and release their uploads.
    ///
    /// A session whose lock is held by a running request is left for a later
    /// sweep. Returns the number of sessions removed.
    pub async fn sweep_idle(&self, max_idle: Duration, storage: &Storage) -> usize {
        let now = Instant::now();
        let mut released = Vec::new();
        let mut removed = 0;

        self.inner.write().await.retain(|id, slot| {
            if now.duration_since(slot.last_seen) < max_idle {
                return true;
            }
            match slot.handle.try_lock() {
                Ok(mut session) => {
                    released.extend(session.clear());
                    removed += 1;
                    debug!(session_id = %id, "Expired idle session");
                    false
                }
                Err(_) => true,
            }
        });

        if removed > 0 {
            let deleted = self.documents.release_all(&released, storage).await;
            info!(sessions = removed, files = deleted.len(), "Swept idle sessions");
        }
        removed
    }

    /// Run [`sweep_idle`](Self::sweep_idle) in the background for the life of the process
    pub fn spawn_sweeper(&self, max_idle: Duration, storage: Storage) -> tokio::task::JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SWEEP_INTERVAL.min(max_idle.max(Duration::from_secs(1))));
            loop {
                ticker.tick().await;
                store.sweep_idle(max_idle, &storage).await;
            }
        })
    }
}
