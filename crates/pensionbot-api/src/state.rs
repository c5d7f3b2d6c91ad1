//! Application state shared across all route handlers.
//!
//! AppState holds the chatbot facade and the direct worker. It is passed to
//! handlers via axum's State extractor.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};

use pensionbot_chat::{ChatbotService, WorkerInvoker};
use pensionbot_core::config::PensionbotConfig;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<PensionbotConfig>,
    /// Chatbot facade with fallback handling.
    pub chatbot: Arc<ChatbotService>,
    /// Worker behind `POST /api/chatbot/`, which bypasses the facade.
    pub direct_worker: Arc<dyn WorkerInvoker>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
    /// Wall-clock start time reported by the health check.
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        config: PensionbotConfig,
        chatbot: Arc<ChatbotService>,
        direct_worker: Arc<dyn WorkerInvoker>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            chatbot,
            direct_worker,
            start_time: Instant::now(),
            started_at: Utc::now(),
        }
    }
}
