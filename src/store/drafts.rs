//! Draft store — reply candidates with upsert.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use super::model::{Draft, UpsertStatus};
use crate::error::ServiceError;

struct Drafts {
    drafts: Vec<Draft>,
    next_id: u64,
}

impl Drafts {
    fn insert(&mut self, email_id: Option<u64>, content: String) -> Draft {
        let draft = Draft {
            id: self.next_id,
            email_id,
            content,
        };
        self.next_id += 1;
        self.drafts.push(draft.clone());
        draft
    }
}

/// In-memory draft collection. Ids start at 1 and are never reused.
pub struct DraftStore {
    inner: RwLock<Drafts>,
}

impl DraftStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: RwLock::new(Drafts {
                drafts: Vec::new(),
                next_id: 1,
            }),
        })
    }

    /// Always creates a new draft.
    pub async fn create(&self, email_id: Option<u64>, content: String) -> Draft {
        let draft = self.inner.write().await.insert(email_id, content);
        info!(draft_id = draft.id, email_id = ?draft.email_id, "Draft created");
        draft
    }

    /// Update the draft's content if `draft_id` names an existing draft,
    /// otherwise create a new one with a fresh id.
    ///
    /// An update touches `content` only; `email_id` is used for creation.
    pub async fn upsert(
        &self,
        draft_id: Option<u64>,
        content: String,
        email_id: Option<u64>,
    ) -> (UpsertStatus, Draft) {
        let mut drafts = self.inner.write().await;

        if let Some(id) = draft_id {
            if let Some(existing) = drafts.drafts.iter_mut().find(|d| d.id == id) {
                existing.content = content;
                info!(draft_id = id, "Draft updated");
                return (UpsertStatus::Updated, existing.clone());
            }
        }

        let draft = drafts.insert(email_id, content);
        info!(
            draft_id = draft.id,
            requested_id = ?draft_id,
            "Draft created by upsert"
        );
        (UpsertStatus::Created, draft)
    }

    /// All drafts in insertion order.
    pub async fn list(&self) -> Vec<Draft> {
        self.inner.read().await.drafts.clone()
    }

    pub async fn get(&self, id: u64) -> Result<Draft, ServiceError> {
        self.inner
            .read()
            .await
            .drafts
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or_else(|| ServiceError::draft_not_found(id))
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.drafts.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.drafts.is_empty()
    }
}
