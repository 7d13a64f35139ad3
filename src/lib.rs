//! Inbox Assist — email ingestion, LLM processing and reply drafts over HTTP.

pub mod api;
pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod prompts;
pub mod store;
