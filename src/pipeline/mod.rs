//! Email pipeline built on the completion capability.
//!
//! 1. `ProcessingPipeline::process()` — one completion per unprocessed email
//! 2. `DraftGenerator::draft()` — reply text stored as a new draft
//! 3. `ChatAssistant::chat()` — ad-hoc questions, optionally about one email
//!
//! No store lock is held while a completion is in flight.

pub mod chat;
pub mod drafter;
pub mod processor;

pub use chat::ChatAssistant;
pub use drafter::{DraftGenerator, GeneratedDraft};
pub use processor::{BatchOutcome, ProcessingPipeline};
