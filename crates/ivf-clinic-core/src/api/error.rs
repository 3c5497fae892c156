//! API error taxonomy.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Fallback text when the backend supplies no message.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Errors returned by a [`Transport`](super::Transport) or while decoding its output.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Invalid record id {0:?}")]
    InvalidId(String),

    #[error("List at {path} did not end after {pages} pages")]
    UnboundedList { path: String, pages: u32 },
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}

/// Error body shape: `{ "message": ..., "errors": ... }`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    errors: Option<Value>,
}

impl ApiError {
    /// Build an error from a non-success status and an optional raw body.
    pub fn from_status(status: u16, body: Option<&str>) -> Self {
        let message = body
            .and_then(extract_message)
            .unwrap_or_else(|| default_status_text(status).to_string());

        match status {
            404 => ApiError::NotFound(message),
            403 => ApiError::Forbidden(message),
            _ => ApiError::Status { status, message },
        }
    }

    /// HTTP status, when the error came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NotFound(_) => Some(404),
            ApiError::Forbidden(_) => Some(403),
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(_)
            | ApiError::Decode(_)
            | ApiError::InvalidId(_)
            | ApiError::UnboundedList { .. } => None,
        }
    }

    /// 403 and 404 mean "data absent" on read paths.
    pub fn is_absent(&self) -> bool {
        matches!(self, ApiError::NotFound(_) | ApiError::Forbidden(_))
    }

    /// Best human-readable message for a notification.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::NotFound(m) | ApiError::Forbidden(m) | ApiError::Status { message: m, .. }
                if !m.trim().is_empty() =>
            {
                m.clone()
            }
            _ => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }
}

/// Pull the most specific message out of an error body.
///
/// `errors` wins over `message` because it carries the field-level detail;
/// it may be a list of strings or a map of field → message(s).
fn extract_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(_) => {
            let trimmed = body.trim();
            return (!trimmed.is_empty() && !trimmed.starts_with('<')).then(|| trimmed.to_string());
        }
    };

    if let Some(errors) = parsed.errors.as_ref().and_then(flatten_errors) {
        return Some(errors);
    }
    parsed
        .message
        .or(parsed.title)
        .filter(|m| !m.trim().is_empty())
}

fn flatten_errors(errors: &Value) -> Option<String> {
    let parts: Vec<String> = match errors {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items.iter().filter_map(value_text).collect(),
        Value::Object(fields) => fields
            .iter()
            .flat_map(|(field, v)| {
                let messages: Vec<String> = match v {
                    Value::Array(items) => items.iter().filter_map(value_text).collect(),
                    other => value_text(other).into_iter().collect(),
                };
                messages
                    .into_iter()
                    .map(move |m| format!("{}: {}", field, m))
            })
            .collect(),
        _ => Vec::new(),
    };

    (!parts.is_empty()).then(|| parts.join("; "))
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

fn default_status_text(status: u16) -> &'static str {
    match status {
        400 => "Bad request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not found",
        409 => "Conflict",
        422 => "Unprocessable entity",
        500..=599 => "Server error",
        _ => "Request failed",
    }
}
