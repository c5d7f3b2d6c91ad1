//! Values produced by the chatbot facade.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Language used when nothing else is known.
pub const DEFAULT_LANGUAGE: &str = "en";

/// A localized answer to a user query.
///
/// Fields other than `response` and `language` that the worker prints are
/// carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub language: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatResponse {
    pub fn new(response: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            language: language.into(),
            extra: Map::new(),
        }
    }
}

/// Result of a text-to-speech request: the worker's JSON object as printed,
/// or an `{ "error": ... }` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeechResult {
    pub fields: Map<String, Value>,
}

impl SpeechResult {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// An `{ "error": message }` result.
    pub fn error(message: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("error".to_string(), Value::String(message.into()));
        Self { fields }
    }

    /// The `error` field, when present and a string.
    pub fn error_message(&self) -> Option<&str> {
        self.fields.get("error").and_then(Value::as_str)
    }

    pub fn is_error(&self) -> bool {
        self.fields.contains_key("error")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_response_serializes_flat() {
        let resp = ChatResponse::new("Visit the grievance portal.", "en");
        assert_eq!(
            serde_json::to_value(&resp).unwrap(),
            json!({"response": "Visit the grievance portal.", "language": "en"})
        );
    }

    #[test]
    fn test_chat_response_keeps_extra_fields() {
        let raw = json!({"response": "ok", "language": "hi", "sources": ["faq"]});
        let resp: ChatResponse = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(resp.extra.get("sources"), Some(&json!(["faq"])));
        assert_eq!(serde_json::to_value(&resp).unwrap(), raw);
    }

    #[test]
    fn test_speech_error() {
        let result = SpeechResult::error("Please provide valid text for speech synthesis.");
        assert!(result.is_error());
        assert_eq!(
            result.error_message(),
            Some("Please provide valid text for speech synthesis.")
        );
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"error": "Please provide valid text for speech synthesis."})
        );
    }

    #[test]
    fn test_speech_result_is_transparent() {
        let raw = json!({"audio": "UklGRg==", "format": "wav"});
        let result: SpeechResult = serde_json::from_value(raw.clone()).unwrap();
        assert!(!result.is_error());
        assert_eq!(serde_json::to_value(&result).unwrap(), raw);
    }
}
