//! REST endpoints for the inbox, the pipeline, drafts and prompts.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info};

use super::error::ApiError;
use crate::error::ServiceError;
use crate::llm::{Completer, CredentialResolver};
use crate::pipeline::{ChatAssistant, DraftGenerator, GeneratedDraft, ProcessingPipeline};
use crate::prompts::PromptLibrary;
use crate::store::{Draft, DraftStore, Email, EmailStore, NewEmail, UpsertStatus};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub emails: Arc<EmailStore>,
    pub drafts: Arc<DraftStore>,
    pub prompts: Arc<PromptLibrary>,
    pub pipeline: Arc<ProcessingPipeline>,
    pub generator: Arc<DraftGenerator>,
    pub assistant: Arc<ChatAssistant>,
}

impl AppState {
    /// Wire empty stores and the pipeline around one completion backend.
    pub fn new(completer: Arc<dyn Completer>, credentials: CredentialResolver) -> Self {
        let emails = EmailStore::new();
        let drafts = DraftStore::new();
        let prompts = PromptLibrary::new();

        let pipeline = Arc::new(ProcessingPipeline::new(
            Arc::clone(&emails),
            Arc::clone(&prompts),
            Arc::clone(&completer),
            credentials.clone(),
        ));
        let generator = Arc::new(DraftGenerator::new(
            Arc::clone(&emails),
            Arc::clone(&drafts),
            Arc::clone(&prompts),
            Arc::clone(&completer),
            credentials.clone(),
        ));
        let assistant = Arc::new(ChatAssistant::new(
            Arc::clone(&emails),
            Arc::clone(&prompts),
            completer,
            credentials,
        ));

        Self {
            emails,
            drafts,
            prompts,
            pipeline,
            generator,
            assistant,
        }
    }
}

/// Build the REST routes, all under `/api` except `/health`.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/emails", get(list_emails))
        .route("/api/emails/{id}", get(get_email))
        .route("/api/ingest", post(ingest_email))
        .route("/api/process", post(process_inbox))
        .route("/api/processed", get(list_processed))
        .route("/api/processed/{id}", get(get_processed))
        .route("/api/draft", post(generate_draft))
        .route("/api/drafts", get(list_drafts).post(upsert_draft))
        .route("/api/prompts", get(list_prompts).post(set_prompt))
        .route("/api/chat", post(chat))
        .with_state(state)
}

fn api_key(raw: Option<String>) -> Option<SecretString> {
    raw.map(SecretString::from)
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "inbox-assist"
    }))
}

// ── Emails ──────────────────────────────────────────────────────────────

async fn list_emails(State(state): State<AppState>) -> Json<Vec<Email>> {
    Json(state.emails.list().await)
}

async fn get_email(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Email>, ApiError> {
    Ok(Json(state.emails.get(id).await?))
}

#[derive(Deserialize)]
struct IngestRequest {
    sender: Option<String>,
    subject: Option<String>,
    body: Option<String>,
    /// RFC 3339 arrival time. Unparsable values fall back to ingestion time.
    timestamp: Option<String>,
}

#[derive(Serialize)]
struct IngestResponse {
    status: &'static str,
    email: Email,
}

async fn ingest_email(
    State(state): State<AppState>,
    payload: Result<Json<IngestRequest>, JsonRejection>,
) -> Result<Json<IngestResponse>, ApiError> {
    let Json(req) = payload?;
    let email = state
        .emails
        .ingest(NewEmail {
            sender: req.sender,
            subject: req.subject,
            body: req.body,
            received_at: req.timestamp.as_deref().and_then(parse_timestamp),
        })
        .await?;

    Ok(Json(IngestResponse {
        status: "ingested",
        email,
    }))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(t) => Some(t.with_timezone(&Utc)),
        Err(e) => {
            debug!(timestamp = raw, error = %e, "Ignoring unparsable timestamp");
            None
        }
    }
}

// ── Processing ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ProcessRequest {
    #[serde(default)]
    api_key: Option<String>,
}

/// POST /api/process
///
/// Returns `{ "<email id>": "<result>" }` for the emails completed by this
/// call only.
async fn process_inbox(
    State(state): State<AppState>,
    payload: Result<Json<ProcessRequest>, JsonRejection>,
) -> Result<Json<BTreeMap<u64, String>>, ApiError> {
    let Json(req) = payload?;
    let outcome = state.pipeline.process(api_key(req.api_key)).await?;

    if !outcome.failed.is_empty() {
        info!(failed = ?outcome.failed, "Some emails stay unprocessed until the next run");
    }
    Ok(Json(outcome.results))
}

async fn list_processed(State(state): State<AppState>) -> Json<BTreeMap<u64, String>> {
    Json(state.emails.results().await)
}

#[derive(Serialize)]
struct ProcessedResponse {
    email_id: u64,
    processed: bool,
    result: Option<String>,
}

async fn get_processed(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<ProcessedResponse>, ApiError> {
    let email = state.emails.get(id).await?;
    Ok(Json(ProcessedResponse {
        email_id: email.id,
        processed: email.processed,
        result: email.result,
    }))
}

// ── Drafts ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct DraftRequest {
    email_id: Option<u64>,
    #[serde(default)]
    api_key: Option<String>,
}

async fn generate_draft(
    State(state): State<AppState>,
    payload: Result<Json<DraftRequest>, JsonRejection>,
) -> Result<Json<GeneratedDraft>, ApiError> {
    let Json(req) = payload?;
    let email_id = req
        .email_id
        .ok_or_else(|| ServiceError::missing_field("email_id"))?;

    let generated = state
        .generator
        .draft(email_id, api_key(req.api_key))
        .await?;
    Ok(Json(generated))
}

async fn list_drafts(State(state): State<AppState>) -> Json<Vec<Draft>> {
    Json(state.drafts.list().await)
}

#[derive(Deserialize)]
struct UpsertRequest {
    #[serde(default)]
    draft_id: Option<u64>,
    content: Option<String>,
    #[serde(default)]
    email_id: Option<u64>,
}

#[derive(Serialize)]
struct UpsertResponse {
    status: UpsertStatus,
    draft: Draft,
}

async fn upsert_draft(
    State(state): State<AppState>,
    payload: Result<Json<UpsertRequest>, JsonRejection>,
) -> Result<Json<UpsertResponse>, ApiError> {
    let Json(req) = payload?;
    let content = req
        .content
        .ok_or_else(|| ServiceError::missing_field("content"))?;

    let (status, draft) = state
        .drafts
        .upsert(req.draft_id, content, req.email_id)
        .await;

    Ok(Json(UpsertResponse {
        status,
        draft,
    }))
}

// ── Prompts ─────────────────────────────────────────────────────────────

async fn list_prompts(State(state): State<AppState>) -> Json<BTreeMap<String, String>> {
    Json(state.prompts.all().await)
}

#[derive(Deserialize)]
struct PromptRequest {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    content: String,
}

async fn set_prompt(
    State(state): State<AppState>,
    payload: Result<Json<PromptRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(req) = payload?;
    let kind = req.kind.ok_or_else(|| ServiceError::missing_field("type"))?;

    state.prompts.set(&kind, req.content).await?;
    Ok(Json(json!({ "status": "success" })))
}

// ── Chat ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ChatRequest {
    query: Option<String>,
    #[serde(default)]
    context_email_id: Option<u64>,
    #[serde(default)]
    api_key: Option<String>,
}

async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(req) = payload?;
    let query = req.query.ok_or_else(|| ServiceError::missing_field("query"))?;

    let response = state
        .assistant
        .chat(&query, req.context_email_id, api_key(req.api_key))
        .await?;
    Ok(Json(json!({ "response": response })))
}
