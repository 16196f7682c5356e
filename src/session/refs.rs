//! Reference counts of stored upload paths across all sessions
//!
//! Kept apart from the per-session locks so releasing one session's files
//! never waits on a request that another session is running.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::models::Document;
use crate::storage::Storage;

#[derive(Clone, Default)]
pub struct DocumentRefs {
    counts: Arc<Mutex<HashMap<PathBuf, usize>>>,
}

impl DocumentRefs {
    /// Record one more session entry pointing at `path`. Call before writing the file.
    pub async fn retain(&self, path: &Path) {
        *self.counts.lock().await.entry(path.to_path_buf()).or_insert(0) += 1;
    }

    /// Undo a [`retain`](Self::retain) whose upload never made it into a session
    pub async fn release(&self, path: &Path) {
        let mut counts = self.counts.lock().await;
        if let Some(count) = counts.get_mut(path) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                counts.remove(path);
            }
        }
    }

    /// Release every document and delete the files nothing references any more.
    ///
    /// Deletion happens under the index lock, so an upload that retains the
    /// same path either keeps the file alive or writes it afresh afterwards.
    pub async fn release_all(&self, documents: &[Document], storage: &Storage) -> Vec<PathBuf> {
        let mut counts = self.counts.lock().await;
        let mut orphaned = Vec::new();
        for doc in documents {
            let Some(count) = counts.get_mut(&doc.path) else {
                continue;
            };
            *count = count.saturating_sub(1);
            if *count == 0 {
                counts.remove(&doc.path);
                orphaned.push(doc.path.clone());
            }
        }

        storage.remove_documents(&orphaned).await;
        debug!(released = documents.len(), deleted = orphaned.len(), "Released documents");
        orphaned
    }

    pub async fn count(&self, path: &Path) -> usize {
        self.counts.lock().await.get(path).copied().unwrap_or(0)
    }
}
