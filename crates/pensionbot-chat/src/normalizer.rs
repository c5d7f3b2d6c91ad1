//! Maps raw worker output onto the facade's response shapes.
//!
//! Nothing here returns an error: output that does not parse, or parses to
//! the wrong shape, is replaced by a fixed fallback and logged.

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::types::{ChatResponse, SpeechResult, DEFAULT_LANGUAGE};

/// Chat answer used when the worker's output cannot be understood.
pub const UNPARSEABLE_CHAT_RESPONSE: &str = "I'm having trouble processing your request. Please try rephrasing your query or contact the pension office directly.";

/// Speech result used when the worker's output cannot be understood.
pub const UNPARSEABLE_SPEECH_RESPONSE: &str = "Error processing text-to-speech request.";

/// Suggested questions served whenever the worker cannot provide them.
pub const FALLBACK_QUESTIONS: [&str; 10] = [
    "How do I submit my life certificate?",
    "Why is my pension payment delayed?",
    "How do I update my bank details?",
    "What documents are required for family pension?",
    "How can I check my pension status online?",
    "What is the process for filing a grievance?",
    "How long does it take to resolve a grievance?",
    "Can I submit my grievance in my regional language?",
    "What happens after I submit a grievance?",
    "How do I track the status of my grievance?",
];

/// The static suggested-question list as owned strings.
pub fn fallback_questions() -> Vec<String> {
    FALLBACK_QUESTIONS.iter().map(|q| q.to_string()).collect()
}

/// A normalized value plus what the parse revealed about it.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<T> {
    pub value: T,
    /// Language the worker reported, if any. Never set on a fallback.
    pub observed_language: Option<String>,
    pub fell_back: bool,
}

impl<T> Normalized<T> {
    fn parsed(value: T, observed_language: Option<String>) -> Self {
        Self {
            value,
            observed_language,
            fell_back: false,
        }
    }

    fn fallback(value: T) -> Self {
        Self {
            value,
            observed_language: None,
            fell_back: true,
        }
    }
}

#[derive(Deserialize)]
struct RawChatReply {
    response: String,
    /// Kept loose: a non-string value is treated as absent.
    #[serde(default)]
    language: Option<Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Normalize the output of a chat query.
pub fn normalize_chat(raw: &str) -> Normalized<ChatResponse> {
    match serde_json::from_str::<RawChatReply>(raw) {
        Ok(reply) => {
            let observed = reply
                .language
                .as_ref()
                .and_then(Value::as_str)
                .filter(|l| !l.is_empty())
                .map(str::to_string);
            let response = ChatResponse {
                response: reply.response,
                language: observed
                    .clone()
                    .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
                extra: reply.extra,
            };
            Normalized::parsed(response, observed)
        }
        Err(e) => {
            warn!(error = %e, "Unparseable chat output from worker");
            debug!(raw_output = %raw, "Raw worker output");
            Normalized::fallback(ChatResponse::new(
                UNPARSEABLE_CHAT_RESPONSE,
                DEFAULT_LANGUAGE,
            ))
        }
    }
}

/// Normalize the output of a text-to-speech request.
pub fn normalize_speech(raw: &str) -> Normalized<SpeechResult> {
    match serde_json::from_str::<Map<String, Value>>(raw) {
        Ok(fields) => {
            let observed = fields
                .get("language")
                .and_then(Value::as_str)
                .filter(|l| !l.is_empty())
                .map(str::to_string);
            Normalized::parsed(SpeechResult::new(fields), observed)
        }
        Err(e) => {
            warn!(error = %e, "Unparseable text-to-speech output from worker");
            debug!(raw_output = %raw, "Raw worker output");
            Normalized::fallback(SpeechResult::error(UNPARSEABLE_SPEECH_RESPONSE))
        }
    }
}

/// Normalize the output of a suggested-questions request.
pub fn normalize_questions(raw: &str) -> Normalized<Vec<String>> {
    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(questions) => Normalized::parsed(questions, None),
        Err(e) => {
            warn!(error = %e, "Unparseable suggested questions from worker");
            debug!(raw_output = %raw, "Raw worker output");
            Normalized::fallback(fallback_questions())
        }
    }
}
