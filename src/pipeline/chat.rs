//! Chat assistant — free-form questions about the inbox.

use std::sync::Arc;

use secrecy::SecretString;
use tracing::{debug, info};

use crate::error::ServiceError;
use crate::llm::{Completer, CredentialResolver};
use crate::prompts::PromptLibrary;
use crate::store::EmailStore;

const GENERAL_CONTEXT: &str = "General Inbox";

pub struct ChatAssistant {
    emails: Arc<EmailStore>,
    prompts: Arc<PromptLibrary>,
    completer: Arc<dyn Completer>,
    credentials: CredentialResolver,
}

impl ChatAssistant {
    pub fn new(
        emails: Arc<EmailStore>,
        prompts: Arc<PromptLibrary>,
        completer: Arc<dyn Completer>,
        credentials: CredentialResolver,
    ) -> Self {
        Self {
            emails,
            prompts,
            completer,
            credentials,
        }
    }

    /// Answer `query`, optionally grounded on one email.
    ///
    /// An unknown `context_email_id` falls back to the general inbox context.
    pub async fn chat(
        &self,
        query: &str,
        context_email_id: Option<u64>,
        api_key: Option<SecretString>,
    ) -> Result<String, ServiceError> {
        let credential = self.credentials.resolve(api_key)?;
        let instruction = self.system_instruction(context_email_id).await;

        let completion = self
            .completer
            .complete(&credential, &instruction, query)
            .await?;

        info!(context_email_id = ?context_email_id, "Chat answered");
        Ok(completion.text)
    }

    async fn system_instruction(&self, context_email_id: Option<u64>) -> String {
        let context = match context_email_id {
            Some(id) => match self.emails.get(id).await {
                Ok(email) => format!("Email Subject: {}\nBody: {}", email.subject, email.body),
                Err(_) => {
                    debug!(email_id = id, "Chat context email not found, using inbox context");
                    GENERAL_CONTEXT.to_string()
                }
            },
            None => GENERAL_CONTEXT.to_string(),
        };

        let prompts = serde_json::to_string(&self.prompts.all().await).unwrap_or_default();
        format!("You are an email assistant. Context: {context}. User Prompts: {prompts}")
    }
}
