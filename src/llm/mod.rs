//! Completion capability for Inbox Assist.
//!
//! Everything that talks to a language model goes through the [`Completer`]
//! trait: `complete(credential, system_instruction, user_input) -> text`.
//! The server ships with [`CannedCompleter`], an offline backend; tests and
//! embedders inject their own implementation as `Arc<dyn Completer>`.

mod canned;

pub use canned::CannedCompleter;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::error::LlmError;

/// Text produced by a completion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
}

impl Completion {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// A backend able to turn an instruction and an input into generated text.
#[async_trait]
pub trait Completer: Send + Sync {
    /// Backend name, used in logs and error messages.
    fn name(&self) -> &str;

    /// Run one completion.
    async fn complete(
        &self,
        credential: &SecretString,
        system_instruction: &str,
        user_input: &str,
    ) -> Result<Completion, LlmError>;
}

/// Picks the credential for a completion call.
///
/// A non-blank key supplied with the request wins; otherwise the server-wide
/// default is used.
#[derive(Debug, Clone, Default)]
pub struct CredentialResolver {
    default_key: Option<SecretString>,
}

impl CredentialResolver {
    pub fn new(default_key: Option<SecretString>) -> Self {
        Self { default_key }
    }

    pub fn resolve(&self, supplied: Option<SecretString>) -> Result<SecretString, LlmError> {
        supplied
            .filter(|k| !k.expose_secret().trim().is_empty())
            .or_else(|| self.default_key.clone())
            .ok_or(LlmError::MissingCredential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supplied_key_wins() {
        let resolver = CredentialResolver::new(Some(SecretString::from("server")));
        let key = resolver.resolve(Some(SecretString::from("request"))).unwrap();
        assert_eq!(key.expose_secret(), "request");
    }

    #[test]
    fn blank_key_falls_back_to_default() {
        let resolver = CredentialResolver::new(Some(SecretString::from("server")));
        let key = resolver.resolve(Some(SecretString::from("   "))).unwrap();
        assert_eq!(key.expose_secret(), "server");
    }

    #[test]
    fn no_key_anywhere_is_an_error() {
        let resolver = CredentialResolver::default();
        assert!(matches!(
            resolver.resolve(None),
            Err(LlmError::MissingCredential)
        ));
    }
}
