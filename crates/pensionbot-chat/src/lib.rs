//! Chatbot orchestration for the pension grievance assistant.
//!
//! Runs an external worker process per request, gates requests on a one-shot
//! initialization, and normalizes worker output into stable response shapes
//! with fixed fallbacks.

pub mod error;
pub mod languages;
pub mod normalizer;
pub mod orchestrator;
pub mod readiness;
pub mod types;
pub mod worker;

pub use error::WorkerError;
pub use languages::LanguageTable;
pub use normalizer::{fallback_questions, Normalized, FALLBACK_QUESTIONS};
pub use orchestrator::ChatbotService;
pub use readiness::ReadinessGate;
pub use types::{ChatResponse, SpeechResult, DEFAULT_LANGUAGE};
pub use worker::{
    LimitedWorker, MockWorker, ProcessWorker, TimeoutWorker, WorkerCommand, WorkerInvocation,
    WorkerInvoker, WorkerPolicy,
};
