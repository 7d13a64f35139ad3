use std::sync::Arc;

use inbox_assist::api::{AppState, router};
use inbox_assist::config::ServerConfig;
use inbox_assist::error::Result;
use inbox_assist::llm::{CannedCompleter, Completer, CredentialResolver};
use inbox_assist::store::demo_inbox;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ServerConfig::from_env()?;
    let addr = config.socket_addr();

    eprintln!("📬 Inbox Assist v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   API: http://{}/api", addr);
    eprintln!(
        "   Default API key: {}",
        if config.default_api_key.is_some() {
            "configured"
        } else {
            "none (requests must send api_key)"
        }
    );

    // No hosted model is wired in; every completion returns the canned reply.
    let completer: Arc<dyn Completer> = Arc::new(CannedCompleter::new(config.canned_reply.clone()));
    tracing::warn!(backend = completer.name(), "Serving canned completions");

    let state = AppState::new(
        completer,
        CredentialResolver::new(config.default_api_key.clone()),
    );

    if config.seed_demo_inbox {
        for email in demo_inbox() {
            state.emails.ingest(email).await?;
        }
        eprintln!("   Demo inbox: {} emails", state.emails.len().await);
    }

    let listener = tokio::net::TcpListener::bind(addr).await.inspect_err(|e| {
        tracing::error!(%addr, error = %e, "Failed to bind HTTP port");
    })?;
    tracing::info!(%addr, "HTTP server started");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
    }
}
