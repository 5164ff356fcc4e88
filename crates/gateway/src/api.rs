//! HTTP API v1 — chat sessions over REST.
//!
//! Endpoints:
//!
//! - `GET  /v1/models`                    — Configured and locally available models
//! - `POST /v1/sessions`                  — Create a session
//! - `GET  /v1/sessions/{id}`             — Session snapshot
//! - `POST /v1/sessions/{id}/chat`        — Send a message, get the answer
//! - `PUT  /v1/sessions/{id}/document`    — Upload a PDF (raw body, `X-File-Name`)
//! - `POST /v1/sessions/{id}/model`       — Switch the active model
//! - `POST /v1/sessions/{id}/clear`       — Clear the conversation
//! - `POST /v1/sessions/{id}/reset`       — Clear everything
//! - `POST /v1/sessions/{id}/save`        — Write the transcript to disk
//! - `GET  /v1/sessions/{id}/transcript`  — Transcript as plain text

use axum::{
    Router,
    body::Bytes,
    extract::{
        Path, State,
        rejection::{BytesRejection, JsonRejection},
    },
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, warn};

use docchat_agent::{AnswerSource, ChatSession, DocumentContext, Orchestrator, SessionView};
use docchat_config::AppConfig;
use docchat_core::error::{Error, ErrorKind};
use docchat_document::DocumentExtractor;

// ── State ─────────────────────────────────────────────────────────────────

/// Maximum number of in-memory sessions before the oldest are evicted.
pub const MAX_SESSIONS: usize = 256;

/// Display name of an upload sent without `X-File-Name`.
const DEFAULT_DOCUMENT_NAME: &str = "document.pdf";

struct SessionEntry {
    /// Creation order; the smallest is evicted first.
    seq: u64,
    session: Arc<Mutex<ChatSession>>,
}

/// Shared state for the v1 API.
pub struct ApiState {
    pub config: AppConfig,
    pub orchestrator: Orchestrator,
    pub extractor: DocumentExtractor,
    sessions: RwLock<HashMap<String, SessionEntry>>,
    next_seq: AtomicU64,
    max_sessions: usize,
}

pub type SharedApiState = Arc<ApiState>;

impl ApiState {
    pub fn new(config: AppConfig, orchestrator: Orchestrator) -> Self {
        let extractor = DocumentExtractor::new(config.document.max_bytes);
        Self {
            config,
            orchestrator,
            extractor,
            sessions: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
            max_sessions: MAX_SESSIONS,
        }
    }

    pub fn with_max_sessions(mut self, max: usize) -> Self {
        self.max_sessions = max.max(1);
        self
    }

    /// Register a fresh session, evicting the oldest one at capacity.
    async fn create_session(&self) -> Arc<Mutex<ChatSession>> {
        let session = ChatSession::from_config(&self.config);
        let id = session.id().to_string();
        let entry = SessionEntry {
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
            session: Arc::new(Mutex::new(session)),
        };
        let handle = entry.session.clone();

        let mut sessions = self.sessions.write().await;
        if sessions.len() >= self.max_sessions {
            if let Some(oldest_key) = sessions
                .iter()
                .min_by_key(|(_, e)| e.seq)
                .map(|(k, _)| k.clone())
            {
                sessions.remove(&oldest_key);
                info!(session = %oldest_key, "Evicted oldest session");
            }
        }
        sessions.insert(id, entry);
        handle
    }

    async fn session(&self, id: &str) -> Result<Arc<Mutex<ChatSession>>, ApiError> {
        self.sessions
            .read()
            .await
            .get(id)
            .map(|e| e.session.clone())
            .ok_or_else(|| ApiError::session_not_found(id))
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    fn view(&self, session: &ChatSession) -> SessionView {
        session.view(&self.config.supported_models)
    }
}

// ── Router ────────────────────────────────────────────────────────────────

/// Build the v1 API router. Nest this under "/v1" in the main router.
pub fn v1_router(state: SharedApiState) -> Router {
    Router::new()
        .route("/models", get(list_models_handler))
        .route("/sessions", post(create_session_handler))
        .route("/sessions/{id}", get(get_session_handler))
        .route("/sessions/{id}/chat", post(chat_handler))
        .route("/sessions/{id}/document", put(upload_document_handler))
        .route("/sessions/{id}/model", post(select_model_handler))
        .route("/sessions/{id}/clear", post(clear_chat_handler))
        .route("/sessions/{id}/reset", post(reset_handler))
        .route("/sessions/{id}/save", post(save_handler))
        .route("/sessions/{id}/transcript", get(transcript_handler))
        .with_state(state)
}

// ── Errors ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
}

/// An error rendered as `{error, kind}` with a matching status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    fn session_not_found(id: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            body: ErrorResponse {
                error: format!("Session '{id}' not found"),
                kind: "session_not_found".into(),
            },
        }
    }

    /// A request whose body never reached the handler.
    fn rejected(status: StatusCode, message: String) -> Self {
        let kind = if status == StatusCode::PAYLOAD_TOO_LARGE {
            ErrorKind::TooLarge.as_str()
        } else {
            "invalid_request"
        };
        warn!(status = status.as_u16(), kind, error = %message, "Request body rejected");
        Self {
            status,
            body: ErrorResponse {
                error: message,
                kind: kind.into(),
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::rejected(rejection.status(), rejection.body_text())
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        Self::rejected(rejection.status(), rejection.body_text())
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        ErrorKind::Malformed | ErrorKind::NoExtractableText => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::EmptyInput | ErrorKind::UnsupportedModel => StatusCode::BAD_REQUEST,
        ErrorKind::ModelUnavailable => StatusCode::BAD_GATEWAY,
        ErrorKind::Transcript | ErrorKind::Config | ErrorKind::Internal => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        let kind = e.kind();
        let status = status_for(kind);
        if status.is_server_error() {
            error!(error = %e, kind = kind.as_str(), "Request failed");
        } else {
            warn!(error = %e, kind = kind.as_str(), "Request rejected");
        }
        Self {
            status,
            body: ErrorResponse {
                error: e.to_string(),
                kind: kind.as_str().into(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
struct ModelListResponse {
    default_model: String,
    supported_models: Vec<String>,
    /// Models the Ollama server reports as pulled; empty when unreachable.
    available: Vec<String>,
    ollama_reachable: bool,
}

async fn list_models_handler(State(state): State<SharedApiState>) -> Json<ModelListResponse> {
    let (available, ollama_reachable) = match state.orchestrator.provider().list_models().await {
        Ok(models) => (models, true),
        Err(e) => {
            warn!(error = %e, "Could not list models");
            (Vec::new(), false)
        }
    };

    Json(ModelListResponse {
        default_model: state.config.default_model.clone(),
        supported_models: state.config.supported_models.clone(),
        available,
        ollama_reachable,
    })
}

async fn create_session_handler(
    State(state): State<SharedApiState>,
) -> (StatusCode, Json<SessionView>) {
    let handle = state.create_session().await;
    let session = handle.lock().await;
    info!(session = %session.id(), "Session created");
    (StatusCode::CREATED, Json(state.view(&session)))
}

async fn get_session_handler(
    State(state): State<SharedApiState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    let handle = state.session(&id).await?;
    let session = handle.lock().await;
    Ok(Json(state.view(&session)))
}

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
}

#[derive(Serialize)]
struct ChatResponse {
    answer: String,
    source: AnswerSource,
    session: SessionView,
}

async fn chat_handler(
    State(state): State<SharedApiState>,
    Path(id): Path<String>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(payload) = payload?;
    let handle = state.session(&id).await?;
    let mut session = handle.lock().await;
    info!(session = %id, message_len = payload.message.len(), "v1/chat request");

    let result = session.send(&state.orchestrator, &payload.message).await?;

    Ok(Json(ChatResponse {
        answer: result.answer,
        source: result.source,
        session: state.view(&session),
    }))
}

async fn upload_document_handler(
    State(state): State<SharedApiState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<SessionView>, ApiError> {
    let body = body?;
    let handle = state.session(&id).await?;
    let mut session = handle.lock().await;

    let name = headers
        .get("X-File-Name")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_DOCUMENT_NAME)
        .to_string();
    info!(session = %id, document = %name, bytes = body.len(), "v1/document upload");

    // PDF parsing is CPU-bound.
    let extractor = state.extractor;
    let document = tokio::task::spawn_blocking(move || DocumentContext::extract(&extractor, name, &body))
        .await
        .map_err(|e| Error::Internal(format!("Extraction task failed: {e}")))?
        .map_err(Error::from)?;

    session.set_document(document);
    Ok(Json(state.view(&session)))
}

#[derive(Deserialize)]
struct SelectModelRequest {
    model: String,
}

async fn select_model_handler(
    State(state): State<SharedApiState>,
    Path(id): Path<String>,
    payload: Result<Json<SelectModelRequest>, JsonRejection>,
) -> Result<Json<SessionView>, ApiError> {
    let Json(payload) = payload?;
    let handle = state.session(&id).await?;
    let mut session = handle.lock().await;

    session
        .select_model(
            state.orchestrator.provider(),
            &state.config.supported_models,
            &payload.model,
        )
        .await?;
    Ok(Json(state.view(&session)))
}

async fn clear_chat_handler(
    State(state): State<SharedApiState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    let handle = state.session(&id).await?;
    let mut session = handle.lock().await;
    session.clear_chat();
    Ok(Json(state.view(&session)))
}

async fn reset_handler(
    State(state): State<SharedApiState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    let handle = state.session(&id).await?;
    let mut session = handle.lock().await;
    session.clear_all();
    Ok(Json(state.view(&session)))
}

#[derive(Serialize, Deserialize)]
struct SaveResponse {
    file: String,
}

async fn save_handler(
    State(state): State<SharedApiState>,
    Path(id): Path<String>,
) -> Result<Json<SaveResponse>, ApiError> {
    let handle = state.session(&id).await?;
    let session = handle.lock().await;
    let path = session.save_transcript(&state.config.transcript.dir)?;
    Ok(Json(SaveResponse {
        file: path.display().to_string(),
    }))
}

async fn transcript_handler(
    State(state): State<SharedApiState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let handle = state.session(&id).await?;
    let session = handle.lock().await;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        session.export(),
    ))
}
