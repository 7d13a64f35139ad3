//! Processing pipeline — runs every unprocessed email through the completer.
//!
//! Failure policy is skip-and-continue: an email whose completion fails keeps
//! `processed = false`, gets no result, and is retried by the next batch.

use std::collections::BTreeMap;
use std::sync::Arc;

use secrecy::SecretString;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::ServiceError;
use crate::llm::{Completer, CredentialResolver};
use crate::prompts::PromptLibrary;
use crate::store::EmailStore;

/// Outcome of one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Results for the emails completed during this batch, keyed by id.
    pub results: BTreeMap<u64, String>,
    /// Emails whose completion failed and stay unprocessed.
    pub failed: Vec<u64>,
}

pub struct ProcessingPipeline {
    emails: Arc<EmailStore>,
    prompts: Arc<PromptLibrary>,
    completer: Arc<dyn Completer>,
    credentials: CredentialResolver,
    /// Serializes batches so an email is never completed twice.
    batch: Mutex<()>,
}

impl ProcessingPipeline {
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
            batch: Mutex::new(()),
        }
    }

    /// Process every email with `processed = false`, in insertion order.
    ///
    /// Fails up front, before touching any email, when no credential can be
    /// resolved.
    pub async fn process(
        &self,
        api_key: Option<SecretString>,
    ) -> Result<BatchOutcome, ServiceError> {
        let credential = self.credentials.resolve(api_key)?;

        let _batch = self.batch.lock().await;

        let pending = self.emails.unprocessed().await;
        let mut outcome = BatchOutcome::default();
        if pending.is_empty() {
            debug!("No unprocessed emails");
            return Ok(outcome);
        }

        let instruction = self.prompts.processing_instruction().await;
        info!(
            count = pending.len(),
            backend = self.completer.name(),
            "Processing unprocessed emails"
        );

        for email in pending {
            match self
                .completer
                .complete(&credential, &instruction, &email.body)
                .await
            {
                Ok(completion) => {
                    let stored = self
                        .emails
                        .mark_processed(email.id, completion.text)
                        .await?;
                    if let Some(result) = stored.result {
                        outcome.results.insert(stored.id, result);
                    }
                }
                Err(e) => {
                    warn!(email_id = email.id, error = %e, "Completion failed, email left unprocessed");
                    outcome.failed.push(email.id);
                }
            }
        }

        info!(
            processed = outcome.results.len(),
            failed = outcome.failed.len(),
            "Batch finished"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::error::LlmError;
    use crate::llm::{CannedCompleter, Completion};
    use crate::store::NewEmail;

    /// Fails whenever the input contains "boom"; counts calls.
    struct Flaky {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Completer for Flaky {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn complete(
            &self,
            _credential: &SecretString,
            _system_instruction: &str,
            user_input: &str,
        ) -> Result<Completion, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if user_input.contains("boom") {
                return Err(LlmError::RequestFailed {
                    provider: "flaky".into(),
                    reason: "exploded".into(),
                });
            }
            Ok(Completion::new(format!("done: {user_input}")))
        }
    }

    /// Sleeps before answering so overlapping batches would interleave.
    struct Slow {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Completer for Slow {
        fn name(&self) -> &str {
            "slow"
        }

        async fn complete(
            &self,
            _credential: &SecretString,
            _system_instruction: &str,
            user_input: &str,
        ) -> Result<Completion, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            Ok(Completion::new(format!("done: {user_input}")))
        }
    }

    fn pipeline(emails: &Arc<EmailStore>, completer: Arc<dyn Completer>) -> ProcessingPipeline {
        ProcessingPipeline::new(
            Arc::clone(emails),
            PromptLibrary::new(),
            completer,
            CredentialResolver::default(),
        )
    }

    fn key() -> Option<SecretString> {
        Some(SecretString::from("fake"))
    }

    #[tokio::test]
    async fn processes_each_email_once() {
        let emails = EmailStore::new();
        let a = emails
            .ingest(NewEmail::new("test@local", "Hello", "Please do X"))
            .await
            .unwrap();
        let pipeline = pipeline(&emails, Arc::new(CannedCompleter::new("stubbed response")));

        let first = pipeline.process(key()).await.unwrap();
        assert_eq!(first.results.len(), 1);
        assert_eq!(first.results[&a.id], "stubbed response");

        let stored = emails.get(a.id).await.unwrap();
        assert!(stored.processed);
        assert_eq!(stored.result.as_deref(), Some("stubbed response"));

        let second = pipeline.process(key()).await.unwrap();
        assert!(second.results.is_empty());
        assert!(second.failed.is_empty());
    }

    #[tokio::test]
    async fn only_new_emails_are_in_the_next_batch() {
        let emails = EmailStore::new();
        let pipeline = pipeline(&emails, Arc::new(CannedCompleter::new("ok")));

        let a = emails.ingest(NewEmail::new("a", "s", "b")).await.unwrap();
        pipeline.process(key()).await.unwrap();
        let b = emails.ingest(NewEmail::new("b", "s", "b")).await.unwrap();

        let outcome = pipeline.process(key()).await.unwrap();
        assert!(!outcome.results.contains_key(&a.id));
        assert!(outcome.results.contains_key(&b.id));
    }

    #[tokio::test]
    async fn failed_email_is_skipped_and_retried_later() {
        let emails = EmailStore::new();
        let flaky = Arc::new(Flaky {
            calls: AtomicUsize::new(0),
        });
        let pipeline = pipeline(&emails, flaky.clone());

        let good = emails.ingest(NewEmail::new("a", "s", "fine")).await.unwrap();
        let bad = emails.ingest(NewEmail::new("b", "s", "boom")).await.unwrap();
        let later = emails.ingest(NewEmail::new("c", "s", "also fine")).await.unwrap();

        let outcome = pipeline.process(key()).await.unwrap();
        assert_eq!(outcome.failed, vec![bad.id]);
        assert_eq!(
            outcome.results.keys().copied().collect::<Vec<_>>(),
            vec![good.id, later.id]
        );

        let stored = emails.get(bad.id).await.unwrap();
        assert!(!stored.processed);
        assert!(stored.result.is_none());

        // Only the failed email is attempted again.
        let retry = pipeline.process(key()).await.unwrap();
        assert_eq!(retry.failed, vec![bad.id]);
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn missing_credential_touches_nothing() {
        let emails = EmailStore::new();
        let email = emails.ingest(NewEmail::new("a", "s", "b")).await.unwrap();
        let pipeline = pipeline(&emails, Arc::new(CannedCompleter::new("ok")));

        let err = pipeline.process(None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Upstream(LlmError::MissingCredential)));
        assert!(!emails.get(email.id).await.unwrap().processed);
    }

    #[tokio::test]
    async fn default_credential_is_used_when_request_has_none() {
        let emails = EmailStore::new();
        emails.ingest(NewEmail::new("a", "s", "b")).await.unwrap();
        let pipeline = ProcessingPipeline::new(
            Arc::clone(&emails),
            PromptLibrary::new(),
            Arc::new(CannedCompleter::new("ok")),
            CredentialResolver::new(Some(SecretString::from("server-key"))),
        );

        let outcome = pipeline.process(None).await.unwrap();
        assert_eq!(outcome.results.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_batches_never_complete_an_email_twice() {
        let emails = EmailStore::new();
        for i in 0..5 {
            emails
                .ingest(NewEmail::new("a@b", "s", format!("body {i}")))
                .await
                .unwrap();
        }
        let slow = Arc::new(Slow {
            calls: AtomicUsize::new(0),
        });
        let pipeline = Arc::new(pipeline(&emails, slow.clone()));

        let (a, b) = tokio::join!(
            {
                let pipeline = Arc::clone(&pipeline);
                tokio::spawn(async move { pipeline.process(key()).await })
            },
            {
                let pipeline = Arc::clone(&pipeline);
                tokio::spawn(async move { pipeline.process(key()).await })
            }
        );
        let a = a.unwrap().unwrap();
        let b = b.unwrap().unwrap();

        assert_eq!(slow.calls.load(Ordering::SeqCst), 5);
        assert_eq!(a.results.len() + b.results.len(), 5);
        assert!(a.results.keys().all(|id| !b.results.contains_key(id)));
        assert!(emails.unprocessed().await.is_empty());
    }
}
