//! Configuration types.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use secrecy::SecretString;

use crate::error::ConfigError;

/// Reply text used by the offline completer when none is configured.
pub const DEFAULT_CANNED_REPLY: &str =
    "No language model is wired into this server; this is a canned completion.";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP server binds to.
    pub bind: IpAddr,
    /// HTTP port.
    pub port: u16,
    /// Credential used when a request does not carry its own `api_key`.
    pub default_api_key: Option<SecretString>,
    /// Seed the inbox with two demo emails at startup.
    pub seed_demo_inbox: bool,
    /// Text returned by the offline completer.
    pub canned_reply: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8000,
            default_api_key: None,
            seed_demo_inbox: false,
            canned_reply: DEFAULT_CANNED_REPLY.to_string(),
        }
    }
}

impl ServerConfig {
    /// Build configuration from `INBOX_ASSIST_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(bind) = lookup("INBOX_ASSIST_BIND") {
            config.bind = bind.parse().map_err(|e| ConfigError::InvalidValue {
                key: "INBOX_ASSIST_BIND".to_string(),
                message: format!("{bind:?}: {e}"),
            })?;
        }

        if let Some(port) = lookup("INBOX_ASSIST_PORT") {
            config.port = port.parse().map_err(|e| ConfigError::InvalidValue {
                key: "INBOX_ASSIST_PORT".to_string(),
                message: format!("{port:?}: {e}"),
            })?;
        }

        config.default_api_key = lookup("INBOX_ASSIST_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .map(SecretString::from);

        if let Some(seed) = lookup("INBOX_ASSIST_SEED_DEMO") {
            config.seed_demo_inbox = parse_flag("INBOX_ASSIST_SEED_DEMO", &seed)?;
        }

        if let Some(reply) = lookup("INBOX_ASSIST_CANNED_REPLY") {
            config.canned_reply = reply;
        }

        Ok(config)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a boolean, got {other:?}"),
        }),
    }
}
