//! Route handler functions for all API endpoints.
//!
//! Facade-backed handlers never fail: worker problems arrive as fallback
//! bodies with status 200. The direct chat route calls its worker without
//! the facade and reports worker failures as 500.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use pensionbot_chat::{ChatResponse, LanguageTable, SpeechResult, DEFAULT_LANGUAGE};

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request types
// =============================================================================

/// Body shared by the direct and facade chat routes.
///
/// `query` is kept as raw JSON so that a non-string value can be told apart
/// from a malformed body.
#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    pub query: Option<Value>,
    pub language: Option<Value>,
}

impl ChatRequest {
    fn query_text(&self) -> Option<&str> {
        self.query.as_ref().and_then(Value::as_str)
    }

    fn language_code(&self) -> Option<&str> {
        self.language.as_ref().and_then(Value::as_str)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SpeechRequest {
    pub text: Option<Value>,
    pub language: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SuggestedParams {
    pub language: Option<String>,
}

// =============================================================================
// Response types
// =============================================================================

/// Payload handed to the direct worker as its single argument.
#[derive(Debug, Serialize)]
struct DirectPayload<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<&'a Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DirectAnswer {
    pub answer: Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CurrentLanguageResponse {
    pub language: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub ready: bool,
    pub uptime_secs: u64,
    pub started_at: DateTime<Utc>,
}

// =============================================================================
// Handler functions
// =============================================================================

/// POST /api/chatbot/ - run the direct worker and wrap its JSON as `answer`.
pub async fn direct_chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<DirectAnswer>, ApiError> {
    let Json(body) = body.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Unusable direct chat body");
        ApiError::BadRequest("Query is required".to_string())
    })?;
    let query = body
        .query_text()
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Query is required".to_string()))?;

    let payload = DirectPayload {
        query,
        language: body.language.as_ref().filter(|l| !l.is_null()),
    };
    let payload = serde_json::to_string(&payload)
        .map_err(|e| ApiError::Internal(format!("Failed to encode worker payload: {}", e)))?;

    let output = state.direct_worker.invoke(&[payload]).await?;

    let answer: Value = serde_json::from_str(&output).map_err(|e| {
        tracing::warn!(error = %e, "Direct worker printed invalid JSON");
        ApiError::Internal("Invalid JSON from worker".to_string())
    })?;

    Ok(Json(DirectAnswer { answer }))
}

/// POST /api/chatbot/chat - answer through the facade, with fallbacks.
///
/// An unusable body is answered like a missing query.
pub async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Json<ChatResponse> {
    let body = json_or_default(body);
    let response = state
        .chatbot
        .get_response(body.query_text(), body.language_code())
        .await;
    Json(response)
}

/// GET /api/chatbot/suggested - suggested questions for `?language=` (default `en`).
pub async fn suggested(
    State(state): State<AppState>,
    Query(params): Query<SuggestedParams>,
) -> Result<Json<Vec<String>>, ApiError> {
    let language = params
        .language
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

    // Run on its own task so a panic below the facade becomes a 500.
    let chatbot = state.chatbot.clone();
    let questions = tokio::spawn(async move { chatbot.get_suggested_questions(&language).await })
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Suggested questions task failed");
            ApiError::Internal("Failed to get suggested questions".to_string())
        })?;

    Ok(Json(questions))
}

/// GET /api/chatbot/languages - the static supported-language table.
pub async fn languages(State(state): State<AppState>) -> Json<LanguageTable> {
    Json(state.chatbot.get_supported_languages())
}

/// GET /api/chatbot/language - language of the latest worker reply.
pub async fn current_language(State(state): State<AppState>) -> Json<CurrentLanguageResponse> {
    Json(CurrentLanguageResponse {
        language: state.chatbot.get_current_language(),
    })
}

/// POST /api/chatbot/tts - synthesize speech through the facade.
pub async fn text_to_speech(
    State(state): State<AppState>,
    body: Result<Json<SpeechRequest>, JsonRejection>,
) -> Json<SpeechResult> {
    let body = json_or_default(body);
    let text = body.text.as_ref().and_then(Value::as_str);
    let language = body
        .language
        .as_deref()
        .filter(|l| !l.is_empty())
        .unwrap_or(DEFAULT_LANGUAGE);
    Json(state.chatbot.text_to_speech(text, language).await)
}

/// GET /health - liveness plus readiness of the chatbot.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let ready = state.chatbot.is_ready();
    Json(HealthResponse {
        status: if ready { "healthy" } else { "initializing" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        ready,
        uptime_secs: state.start_time.elapsed().as_secs(),
        started_at: state.started_at,
    })
}

fn json_or_default<T: Default>(body: Result<Json<T>, JsonRejection>) -> T {
    match body {
        Ok(Json(body)) => body,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Unusable request body, treating fields as missing");
            T::default()
        }
    }
}
