//! Offline completer that answers every request with fixed text.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use super::{Completer, Completion};
use crate::error::LlmError;

const PROVIDER: &str = "canned";

/// Returns the same reply for every call.
///
/// Behaves like a hosted backend at the credential boundary: an empty key is
/// rejected with [`LlmError::AuthFailed`]. A blank configured reply is
/// reported as [`LlmError::InvalidResponse`], the way an empty model answer
/// would be.
pub struct CannedCompleter {
    reply: String,
}

impl CannedCompleter {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

#[async_trait]
impl Completer for CannedCompleter {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn complete(
        &self,
        credential: &SecretString,
        system_instruction: &str,
        user_input: &str,
    ) -> Result<Completion, LlmError> {
        if credential.expose_secret().is_empty() {
            return Err(LlmError::AuthFailed {
                provider: PROVIDER.to_string(),
            });
        }

        if self.reply.trim().is_empty() {
            return Err(LlmError::InvalidResponse {
                provider: PROVIDER.to_string(),
                reason: "empty completion".to_string(),
            });
        }

        debug!(
            instruction_len = system_instruction.len(),
            input_len = user_input.len(),
            "Canned completion"
        );

        Ok(Completion::new(self.reply.clone()))
    }
}
