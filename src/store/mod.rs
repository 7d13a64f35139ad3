//! In-memory stores for emails and drafts.
//!
//! Both stores live for the lifetime of the process and are shared through
//! `Arc`. Each guards its records with a single `RwLock`; id allocation and
//! every mutation happen under the write half.

pub mod drafts;
pub mod emails;
pub mod model;

pub use drafts::DraftStore;
pub use emails::{EmailStore, NewEmail, demo_inbox};
pub use model::{Draft, Email, UpsertStatus};
