//! Prompt library — named, editable system instructions.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::error::ServiceError;

pub const CATEGORIZE: &str = "categorize";
pub const ACTION_ITEMS: &str = "action_items";
pub const AUTO_REPLY: &str = "auto_reply";

const DEFAULT_CATEGORIZE: &str =
    "Categorize emails into: Important, Newsletter, Spam. Respond with just the category name.";
const DEFAULT_ACTION_ITEMS: &str =
    "Extract tasks. JSON format: {'task': '...', 'deadline': '...'}.";
const DEFAULT_AUTO_REPLY: &str = "Draft a polite professional reply.";

/// Shared prompt set, seeded with the defaults.
pub struct PromptLibrary {
    prompts: RwLock<BTreeMap<String, String>>,
}

impl PromptLibrary {
    pub fn new() -> Arc<Self> {
        let prompts = [
            (CATEGORIZE, DEFAULT_CATEGORIZE),
            (ACTION_ITEMS, DEFAULT_ACTION_ITEMS),
            (AUTO_REPLY, DEFAULT_AUTO_REPLY),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Arc::new(Self {
            prompts: RwLock::new(prompts),
        })
    }

    pub async fn all(&self) -> BTreeMap<String, String> {
        self.prompts.read().await.clone()
    }

    pub async fn get(&self, name: &str) -> Option<String> {
        self.prompts.read().await.get(name).cloned()
    }

    /// Insert or replace a prompt. The name must not be blank.
    pub async fn set(&self, name: &str, content: String) -> Result<(), ServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::Validation("prompt type must not be empty".into()));
        }

        self.prompts.write().await.insert(name.to_string(), content);
        info!(prompt = name, "Prompt updated");
        Ok(())
    }

    /// Instruction used by the processing pipeline: triage followed by task
    /// extraction, answered in a single completion.
    pub async fn processing_instruction(&self) -> String {
        let prompts = self.prompts.read().await;
        [CATEGORIZE, ACTION_ITEMS]
            .iter()
            .filter_map(|name| prompts.get(*name))
            .filter(|p| !p.trim().is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub async fn reply_instruction(&self) -> String {
        self.get(AUTO_REPLY)
            .await
            .unwrap_or_else(|| DEFAULT_AUTO_REPLY.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeded_with_defaults() {
        let library = PromptLibrary::new();
        let all = library.all().await;
        assert_eq!(all.len(), 3);
        assert!(all.contains_key(CATEGORIZE));
        assert!(all.contains_key(ACTION_ITEMS));
        assert!(all.contains_key(AUTO_REPLY));
    }

    #[tokio::test]
    async fn set_replaces_and_adds() {
        let library = PromptLibrary::new();
        library.set(AUTO_REPLY, "Reply in French.".into()).await.unwrap();
        library.set("tone", "Be brief.".into()).await.unwrap();

        assert_eq!(library.reply_instruction().await, "Reply in French.");
        assert_eq!(library.get("tone").await.as_deref(), Some("Be brief."));
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let library = PromptLibrary::new();
        assert!(library.set("  ", "x".into()).await.is_err());
        assert_eq!(library.all().await.len(), 3);
    }

    #[tokio::test]
    async fn processing_instruction_joins_triage_prompts() {
        let library = PromptLibrary::new();
        library.set(CATEGORIZE, "Label it.".into()).await.unwrap();
        library.set(ACTION_ITEMS, "List tasks.".into()).await.unwrap();
        assert_eq!(library.processing_instruction().await, "Label it.\n\nList tasks.");

        library.set(ACTION_ITEMS, String::new()).await.unwrap();
        assert_eq!(library.processing_instruction().await, "Label it.");
    }
}
