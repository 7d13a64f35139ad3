//! Draft generator — asks the completer for a reply and stores it.

use std::sync::Arc;

use secrecy::SecretString;
use serde::Serialize;
use tracing::info;

use crate::error::ServiceError;
use crate::llm::{Completer, CredentialResolver};
use crate::prompts::PromptLibrary;
use crate::store::{DraftStore, Email, EmailStore};

/// Reply text plus the id of the draft that now holds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedDraft {
    pub draft: String,
    pub draft_id: u64,
}

pub struct DraftGenerator {
    emails: Arc<EmailStore>,
    drafts: Arc<DraftStore>,
    prompts: Arc<PromptLibrary>,
    completer: Arc<dyn Completer>,
    credentials: CredentialResolver,
}

impl DraftGenerator {
    pub fn new(
        emails: Arc<EmailStore>,
        drafts: Arc<DraftStore>,
        prompts: Arc<PromptLibrary>,
        completer: Arc<dyn Completer>,
        credentials: CredentialResolver,
    ) -> Self {
        Self {
            emails,
            drafts,
            prompts,
            completer,
            credentials,
        }
    }

    /// Generate a reply for `email_id` and store it as a new draft.
    ///
    /// Every call creates a draft; nothing is stored if the completion fails.
    pub async fn draft(
        &self,
        email_id: u64,
        api_key: Option<SecretString>,
    ) -> Result<GeneratedDraft, ServiceError> {
        let email = self.emails.get(email_id).await?;
        let credential = self.credentials.resolve(api_key)?;
        let instruction = self.prompts.reply_instruction().await;

        let completion = self
            .completer
            .complete(&credential, &instruction, &reply_input(&email))
            .await?;

        let draft = self.drafts.create(Some(email.id), completion.text).await;
        info!(email_id, draft_id = draft.id, "Reply drafted");

        Ok(GeneratedDraft {
            draft: draft.content,
            draft_id: draft.id,
        })
    }
}

fn reply_input(email: &Email) -> String {
    format!(
        "Original Email:\nSubject: {}\nFrom: {}\n\n{}",
        email.subject, email.sender, email.body
    )
}
