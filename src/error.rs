//! Error types for Inbox Assist.

/// Top-level error type for the server binary.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Completion backend errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("No API key supplied and no default key configured")]
    MissingCredential,

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

/// Errors surfaced by the stores and the pipeline to the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },

    #[error("Upstream completion failed: {0}")]
    Upstream(#[from] LlmError),
}

impl ServiceError {
    pub fn missing_field(field: &str) -> Self {
        Self::Validation(format!("missing field `{field}`"))
    }

    pub fn email_not_found(id: u64) -> Self {
        Self::NotFound { entity: "Email", id }
    }

    pub fn draft_not_found(id: u64) -> Self {
        Self::NotFound { entity: "Draft", id }
    }
}

/// Result type alias for the server.
pub type Result<T> = std::result::Result<T, Error>;
