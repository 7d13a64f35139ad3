//! Records held by the in-memory stores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An ingested email.
///
/// `result` is `Some` exactly when `processed` is true; only
/// [`EmailStore::mark_processed`](super::EmailStore::mark_processed) changes
/// either field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    pub id: u64,
    pub sender: String,
    pub subject: String,
    pub body: String,
    pub processed: bool,
    pub result: Option<String>,
    pub received_at: DateTime<Utc>,
}

/// A stored, editable reply candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    pub id: u64,
    /// Email this draft answers. Not owned; the email may be absent for
    /// drafts created through upsert.
    pub email_id: Option<u64>,
    pub content: String,
}

/// Outcome of [`DraftStore::upsert`](super::DraftStore::upsert).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertStatus {
    Created,
    Updated,
}
