//! Chatbot facade: the public contract over the worker channel.
//!
//! `ChatbotService` gates worker-dependent calls on a one-shot
//! initialization, dispatches each call to the worker, and turns every
//! failure into a fixed fallback value. None of its operations return an
//! error.
//!
//! The current language is last-writer-wins: concurrent requests each
//! overwrite it on completion and no ordering between them is imposed.

use std::sync::{Arc, Mutex};

use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::languages::LanguageTable;
use crate::normalizer::{fallback_questions, normalize_chat, normalize_questions, normalize_speech};
use crate::readiness::ReadinessGate;
use crate::types::{ChatResponse, SpeechResult, DEFAULT_LANGUAGE};
use crate::worker::WorkerInvoker;

/// Reply to a missing or empty query.
pub const INVALID_QUERY_RESPONSE: &str = "Please provide a valid query.";

/// Reply when the worker could not be run or failed.
pub const WORKER_FAILURE_RESPONSE: &str =
    "I'm having trouble processing your request. Please try again later.";

/// Speech error for missing or empty text.
pub const INVALID_SPEECH_TEXT: &str = "Please provide valid text for speech synthesis.";

/// Speech error when the worker could not be run or failed.
pub const SPEECH_FAILURE: &str = "Failed to generate speech. Please try again later.";

const SUGGESTED_QUESTIONS_FLAG: &str = "--get-suggested-questions";
const TEXT_TO_SPEECH_FLAG: &str = "--text-to-speech";

/// Central facade that coordinates readiness, the worker, and normalization.
pub struct ChatbotService {
    worker: Arc<dyn WorkerInvoker>,
    gate: ReadinessGate,
    seeded_questions: OnceCell<Vec<String>>,
    current_language: Mutex<String>,
    languages: LanguageTable,
}

impl ChatbotService {
    /// Create a service whose initialization has not run yet.
    ///
    /// The first worker-dependent call runs [`initialize`](Self::initialize)
    /// if nothing else has.
    pub fn new(worker: Arc<dyn WorkerInvoker>) -> Self {
        Self {
            worker,
            gate: ReadinessGate::new(),
            seeded_questions: OnceCell::new(),
            current_language: Mutex::new(DEFAULT_LANGUAGE.to_string()),
            languages: LanguageTable::supported(),
        }
    }

    /// Create a service and run its initialization in the background.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(worker: Arc<dyn WorkerInvoker>) -> Arc<Self> {
        let service = Arc::new(Self::new(worker));
        let background = Arc::clone(&service);
        tokio::spawn(async move {
            background.initialize().await;
        });
        service
    }

    /// Seed the suggested questions and open the readiness gate.
    ///
    /// Concurrent callers share a single seeding call. If the caller running
    /// it is dropped midway, the next caller starts it again. Never fails: a
    /// worker failure seeds the static fallback list.
    pub async fn initialize(&self) {
        self.seeded_questions
            .get_or_init(|| async {
                let questions = self.fetch_suggested_questions(DEFAULT_LANGUAGE).await;
                info!(count = questions.len(), "Loaded suggested questions");
                questions
            })
            .await;

        if self.gate.open() {
            info!("Chatbot initialized");
        }
    }

    /// Whether initialization has completed.
    pub fn is_ready(&self) -> bool {
        self.gate.is_ready()
    }

    /// Answer a user query, optionally in a preferred language.
    ///
    /// A `None` query stands for a missing or non-string value.
    pub async fn get_response(&self, query: Option<&str>, language: Option<&str>) -> ChatResponse {
        self.ensure_ready().await;

        let query = match query {
            Some(q) if !q.is_empty() => q,
            _ => return ChatResponse::new(INVALID_QUERY_RESPONSE, DEFAULT_LANGUAGE),
        };

        let mut arguments = vec![query.to_string()];
        if let Some(lang) = language.filter(|l| !l.is_empty()) {
            arguments.push(lang.to_string());
        }

        match self.worker.invoke(&arguments).await {
            Ok(raw) => {
                let normalized = normalize_chat(&raw);
                if let Some(lang) = normalized.observed_language {
                    self.observe_language(lang);
                }
                normalized.value
            }
            Err(e) => {
                warn!(error = %e, "Chat worker failed");
                ChatResponse::new(WORKER_FAILURE_RESPONSE, DEFAULT_LANGUAGE)
            }
        }
    }

    /// Suggested questions localized to `language`, or the static fallback.
    pub async fn get_suggested_questions(&self, language: &str) -> Vec<String> {
        self.ensure_ready().await;
        self.fetch_suggested_questions(language).await
    }

    /// Questions stored by initialization.
    pub async fn seeded_questions(&self) -> Vec<String> {
        self.ensure_ready().await;
        self.seeded_questions
            .get()
            .cloned()
            .unwrap_or_else(fallback_questions)
    }

    /// Synthesize speech for `text` in `language`.
    ///
    /// A `None` text stands for a missing or non-string value.
    pub async fn text_to_speech(&self, text: Option<&str>, language: &str) -> SpeechResult {
        self.ensure_ready().await;

        let text = match text {
            Some(t) if !t.is_empty() => t,
            _ => return SpeechResult::error(INVALID_SPEECH_TEXT),
        };

        let arguments = vec![
            TEXT_TO_SPEECH_FLAG.to_string(),
            text.to_string(),
            language.to_string(),
        ];

        match self.worker.invoke(&arguments).await {
            Ok(raw) => {
                let normalized = normalize_speech(&raw);
                if let Some(lang) = normalized.observed_language {
                    self.observe_language(lang);
                }
                normalized.value
            }
            Err(e) => {
                warn!(error = %e, "Text-to-speech worker failed");
                SpeechResult::error(SPEECH_FAILURE)
            }
        }
    }

    /// The static table of supported languages. Does not wait for readiness.
    pub fn get_supported_languages(&self) -> LanguageTable {
        self.languages
    }

    /// Language reported by the most recently completed worker reply.
    pub fn get_current_language(&self) -> String {
        self.current_language
            .lock()
            .map(|lang| lang.clone())
            .unwrap_or_else(|_| DEFAULT_LANGUAGE.to_string())
    }

    // -- Private helpers --

    async fn ensure_ready(&self) {
        if !self.gate.is_ready() {
            self.initialize().await;
        }
    }

    async fn fetch_suggested_questions(&self, language: &str) -> Vec<String> {
        let arguments = vec![SUGGESTED_QUESTIONS_FLAG.to_string(), language.to_string()];
        match self.worker.invoke(&arguments).await {
            Ok(raw) => normalize_questions(&raw).value,
            Err(e) => {
                warn!(error = %e, language, "Suggested questions worker failed, using defaults");
                fallback_questions()
            }
        }
    }

    fn observe_language(&self, language: String) {
        debug!(language = %language, "Current language updated");
        if let Ok(mut current) = self.current_language.lock() {
            *current = language;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
