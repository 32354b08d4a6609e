//! Decoding of raw decision-service response bodies.
//!
//! Some local model servers return bodies that are not valid UTF-8. Each
//! strategy is tried in order and the first one that yields a JSON object wins.
use serde_json::Value;

use crate::errors::{TouchPilotError, TouchPilotResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Ascii,
    Latin1,
}

/// Preference order used for every response.
pub const DECODE_ORDER: [TextEncoding; 3] =
    [TextEncoding::Utf8, TextEncoding::Ascii, TextEncoding::Latin1];

impl TextEncoding {
    pub fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            TextEncoding::Utf8 => std::str::from_utf8(bytes).ok().map(str::to_string),
            TextEncoding::Ascii => bytes
                .is_ascii()
                .then(|| bytes.iter().map(|&b| b as char).collect()),
            // Every byte maps to the code point of the same value.
            TextEncoding::Latin1 => Some(bytes.iter().map(|&b| b as char).collect()),
        }
    }
}

/// Decode `bytes` into a JSON object using [`DECODE_ORDER`].
pub fn decode_json_body(bytes: &[u8]) -> TouchPilotResult<Value> {
    for encoding in DECODE_ORDER {
        let Some(text) = encoding.decode(bytes) else {
            tracing::debug!(?encoding, "response body is not valid in this encoding");
            continue;
        };
        match serde_json::from_str::<Value>(&text) {
            Ok(value) if value.is_object() => {
                tracing::debug!(?encoding, "response body decoded");
                return Ok(value);
            }
            Ok(_) => tracing::debug!(?encoding, "response body is JSON but not an object"),
            Err(e) => tracing::debug!(?encoding, error = %e, "response body is not JSON"),
        }
    }
    Err(TouchPilotError::DecisionUnavailable(format!(
        "response body ({} bytes) could not be decoded as JSON in any supported encoding",
        bytes.len()
    )))
}

/// Text of the last choice in a chat-completions reply.
pub fn extract_message_content(reply: &Value) -> TouchPilotResult<String> {
    reply["choices"]
        .as_array()
        .and_then(|choices| choices.last())
        .and_then(|choice| choice["message"]["content"].as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            TouchPilotError::MalformedAction("reply has no choices[-1].message.content".into())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_body_decodes_first() {
        let body = r#"{"choices":[{"message":{"content":"{\"TYPE\":\"你好\"}"}}]}"#;
        let value = decode_json_body(body.as_bytes()).unwrap();
        assert_eq!(extract_message_content(&value).unwrap(), r#"{"TYPE":"你好"}"#);
    }

    #[test]
    fn latin1_rescues_invalid_utf8() {
        let mut body = br#"{"choices":[{"message":{"content":"caf"#.to_vec();
        body.push(0xE9);
        body.extend_from_slice(br#""}}]}"#);
        assert!(std::str::from_utf8(&body).is_err());

        let value = decode_json_body(&body).unwrap();
        assert_eq!(extract_message_content(&value).unwrap(), "café");
    }

    #[test]
    fn ascii_rejects_high_bytes() {
        assert_eq!(TextEncoding::Ascii.decode(&[0x41, 0xFF]), None);
        assert_eq!(TextEncoding::Ascii.decode(b"ok").as_deref(), Some("ok"));
    }

    #[test]
    fn non_json_body_is_unavailable() {
        let err = decode_json_body(b"<html>502 Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, TouchPilotError::DecisionUnavailable(_)));

        let err = decode_json_body(b"[1,2,3]").unwrap_err();
        assert!(matches!(err, TouchPilotError::DecisionUnavailable(_)));
    }

    #[test]
    fn last_choice_wins() {
        let value = serde_json::json!({
            "choices": [
                {"message": {"content": "first"}},
                {"message": {"content": "second"}}
            ]
        });
        assert_eq!(extract_message_content(&value).unwrap(), "second");
    }

    #[test]
    fn missing_content_is_malformed() {
        let value = serde_json::json!({"error": "model not loaded"});
        assert!(matches!(
            extract_message_content(&value),
            Err(TouchPilotError::MalformedAction(_))
        ));
    }
}
