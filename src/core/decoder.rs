use crate::domain::model::{DecodedBody, RawResponse};
use crate::utils::error::{Result, ViewerError};
use serde_json::Value;
use std::collections::HashMap;

/// Classifies a raw response into a decoded body or a `ViewerError`.
#[derive(Debug, Clone, Default)]
pub struct ResponseDecoder {
    status_fallbacks: HashMap<String, String>,
}

impl ResponseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages used for a failing status when the body carries no
    /// `error`/`message` text, keyed by the status code (`"404"`).
    pub fn with_status_fallbacks(status_fallbacks: HashMap<String, String>) -> Self {
        Self { status_fallbacks }
    }

    pub fn decode(&self, response: &RawResponse) -> Result<DecodedBody> {
        if !response.is_success() {
            return Err(ViewerError::TransportError {
                status: response.status,
                message: self.failure_message(response),
            });
        }

        if is_json_content_type(response.content_type.as_deref()) {
            serde_json::from_str::<Value>(&response.body)
                .map(DecodedBody::Json)
                .map_err(|e| ViewerError::DecodeError {
                    message: format!("invalid JSON body ({})", e),
                })
        } else {
            Ok(DecodedBody::Text(response.body.clone()))
        }
    }

    fn failure_message(&self, response: &RawResponse) -> String {
        let from_body = serde_json::from_str::<Value>(&response.body)
            .ok()
            .and_then(|body| {
                body_text(&body, "error").or_else(|| body_text(&body, "message"))
            });

        from_body
            .or_else(|| self.status_fallbacks.get(&response.status.to_string()).cloned())
            .unwrap_or_else(|| format!("Error {}: {}", response.status, response.status_text))
    }
}

fn body_text(body: &Value, field: &str) -> Option<String> {
    match body.get(field)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::String(_) | Value::Null | Value::Bool(false) => None,
        other => Some(other.to_string()),
    }
}

fn is_json_content_type(content_type: Option<&str>) -> bool {
    content_type
        .map(|ct| {
            let mime = ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
            mime == "application/json" || mime.ends_with("+json")
        })
        .unwrap_or(false)
}
