//! Email store — ordered in-memory inbox.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::model::Email;
use crate::error::ServiceError;

/// Fields accepted at ingestion. Sender, subject and body must be present.
#[derive(Debug, Clone, Default)]
pub struct NewEmail {
    pub sender: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    /// Arrival time reported by the source; ingestion time when absent.
    pub received_at: Option<DateTime<Utc>>,
}

impl NewEmail {
    pub fn new(
        sender: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            sender: Some(sender.into()),
            subject: Some(subject.into()),
            body: Some(body.into()),
            received_at: None,
        }
    }
}

struct Inbox {
    emails: Vec<Email>,
    next_id: u64,
}

/// In-memory inbox. Ids start at 1 and are never reused.
pub struct EmailStore {
    inner: RwLock<Inbox>,
}

impl EmailStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: RwLock::new(Inbox {
                emails: Vec::new(),
                next_id: 1,
            }),
        })
    }

    /// Record a new email and return it.
    pub async fn ingest(&self, new: NewEmail) -> Result<Email, ServiceError> {
        let sender = new.sender.ok_or_else(|| ServiceError::missing_field("sender"))?;
        let subject = new
            .subject
            .ok_or_else(|| ServiceError::missing_field("subject"))?;
        let body = new.body.ok_or_else(|| ServiceError::missing_field("body"))?;

        let mut inbox = self.inner.write().await;
        let email = Email {
            id: inbox.next_id,
            sender,
            subject,
            body,
            processed: false,
            result: None,
            received_at: new.received_at.unwrap_or_else(Utc::now),
        };
        inbox.next_id += 1;
        inbox.emails.push(email.clone());

        info!(email_id = email.id, sender = %email.sender, "Email ingested");
        Ok(email)
    }

    /// All emails in insertion order.
    pub async fn list(&self) -> Vec<Email> {
        self.inner.read().await.emails.clone()
    }

    pub async fn get(&self, id: u64) -> Result<Email, ServiceError> {
        let inbox = self.inner.read().await;
        find(&inbox.emails, id)
            .cloned()
            .ok_or_else(|| ServiceError::email_not_found(id))
    }

    /// Emails still waiting for the pipeline, in insertion order.
    pub async fn unprocessed(&self) -> Vec<Email> {
        let inbox = self.inner.read().await;
        inbox
            .emails
            .iter()
            .filter(|e| !e.processed)
            .cloned()
            .collect()
    }

    /// Store the pipeline result and flip `processed` in one write.
    pub async fn mark_processed(&self, id: u64, result: String) -> Result<Email, ServiceError> {
        let mut inbox = self.inner.write().await;
        let email = inbox
            .emails
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| ServiceError::email_not_found(id))?;

        email.result = Some(result);
        email.processed = true;

        debug!(email_id = id, "Email marked processed");
        Ok(email.clone())
    }

    /// Results of every processed email, keyed by id.
    pub async fn results(&self) -> BTreeMap<u64, String> {
        let inbox = self.inner.read().await;
        inbox
            .emails
            .iter()
            .filter_map(|e| e.result.clone().map(|r| (e.id, r)))
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.emails.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.emails.is_empty()
    }
}

fn find(emails: &[Email], id: u64) -> Option<&Email> {
    // Ids are allocated in push order, so the vector is sorted by id.
    emails
        .binary_search_by_key(&id, |e| e.id)
        .ok()
        .map(|idx| &emails[idx])
}

/// Two sample emails for local demos.
pub fn demo_inbox() -> Vec<NewEmail> {
    vec![
        NewEmail::new(
            "boss@company.com",
            "Urgent: Q3 Report",
            "Hi, I need the Q3 financial report by EOD tomorrow.",
        ),
        NewEmail::new(
            "newsletter@techweekly.com",
            "The Future of AI",
            "Top stories this week: LLMs are taking over...",
        ),
    ]
}
