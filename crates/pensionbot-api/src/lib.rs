//! pensionbot API crate - axum HTTP adapter over the chatbot facade.
//!
//! Exposes the chat, suggested-question, language, and text-to-speech
//! endpoints under `/api/chatbot`, plus the direct worker route and a
//! health check.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
