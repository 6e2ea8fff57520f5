//! Normalized response envelope produced by the executor.

use reqwest::StatusCode;
use serde_json::Value;

/// Parsed body of a response.
///
/// `Json` when the body parsed as JSON, otherwise `Text` with the raw body
/// (or the parse-error text when the body was empty, e.g. a 204). Callers
/// must check [`ResponsePayload::status`] before assuming either shape.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadData {
    Json(Value),
    Text(String),
}

/// One normalized HTTP round-trip result.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponsePayload {
    pub status: StatusCode,
    pub data: PayloadData,
}

impl ResponsePayload {
    pub(crate) fn from_body(status: StatusCode, body: String) -> Self {
        let data = match serde_json::from_str(&body) {
            Ok(value) => PayloadData::Json(value),
            Err(parse_error) if body.is_empty() => PayloadData::Text(parse_error.to_string()),
            Err(_) => PayloadData::Text(body),
        };

        Self { status, data }
    }

    /// Message from the server's `{"detail": ...}` error shape, if present.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match &self.data {
            PayloadData::Json(value) => value.get("detail").and_then(Value::as_str),
            PayloadData::Text(_) => None,
        }
    }

    pub(crate) fn detail_or_unknown(&self) -> String {
        self.detail()
            .unwrap_or(crate::UNKNOWN_ERROR_MESSAGE)
            .to_string()
    }

    /// Rows of the list envelope `{"data": [...]}`.
    ///
    /// Any other shape (missing field, non-array, top-level array, plain
    /// text) is `None`; list callers treat that as "no rows", not an error.
    #[must_use]
    pub fn rows(&self) -> Option<&[Value]> {
        match &self.data {
            PayloadData::Json(value) => value
                .get("data")
                .and_then(Value::as_array)
                .map(Vec::as_slice),
            PayloadData::Text(_) => None,
        }
    }

    /// Token carried by the CSRF bootstrap response, which serves it either
    /// as a bare JSON string or wrapped as `{"token": "..."}`.
    pub(crate) fn csrf_token(&self) -> Option<&str> {
        let PayloadData::Json(value) = &self.data else {
            return None;
        };

        value
            .as_str()
            .or_else(|| value.get("token").and_then(Value::as_str))
            .filter(|token| !token.is_empty())
    }
}
