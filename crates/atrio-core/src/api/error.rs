//! Error taxonomy for backend API calls.
//!
//! Every failure crossing the client boundary becomes an [`ApiError`] with a
//! category, a display-ready message, and the parsed failure payload when one
//! was received. Raw payloads never leak past this module undigested.

use std::fmt;

use serde_json::Value;

/// Fallback shown when a failure payload yields no usable message.
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred";
/// Fallback shown when a validation details list is present but unusable.
pub const VALIDATION_ERROR_MESSAGE: &str = "Please check your input";

/// Categories of API errors for consistent handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// Malformed input (HTTP 400/422); field-level details in the payload
    Validation,
    /// Bad credentials, a rejected token, or no token at all (HTTP 401)
    Auth,
    /// Authenticated but not allowed (HTTP 403)
    Forbidden,
    /// Missing resource (HTTP 404)
    NotFound,
    /// Duplicate resource (HTTP 409)
    Conflict,
    /// Response missing a required field, or an undecodable success body
    Protocol,
    /// Transport failure before any response arrived
    Network,
    /// Any other received status (5xx, 429, ...)
    Http(u16),
}

impl ApiErrorKind {
    /// Maps a received HTTP status to an error category.
    fn from_status(status: u16) -> Self {
        match status {
            400 | 422 => ApiErrorKind::Validation,
            401 => ApiErrorKind::Auth,
            403 => ApiErrorKind::Forbidden,
            404 => ApiErrorKind::NotFound,
            409 => ApiErrorKind::Conflict,
            other => ApiErrorKind::Http(other),
        }
    }
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorKind::Validation => write!(f, "validation"),
            ApiErrorKind::Auth => write!(f, "auth"),
            ApiErrorKind::Forbidden => write!(f, "forbidden"),
            ApiErrorKind::NotFound => write!(f, "not_found"),
            ApiErrorKind::Conflict => write!(f, "conflict"),
            ApiErrorKind::Protocol => write!(f, "protocol"),
            ApiErrorKind::Network => write!(f, "network"),
            ApiErrorKind::Http(status) => write!(f, "http_{status}"),
        }
    }
}

/// Structured error from the backend with kind, message, and payload.
#[derive(Debug, Clone)]
pub struct ApiError {
    /// Error category
    pub kind: ApiErrorKind,
    /// One-line summary suitable for display
    pub message: String,
    /// HTTP status of the failure response, when one was received
    pub status: Option<u16>,
    /// Parsed failure payload, when the body was valid JSON
    pub payload: Option<Value>,
}

impl ApiError {
    /// Creates a new API error without a response attached.
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            payload: None,
        }
    }

    /// Creates an error from a failure response status and raw body.
    ///
    /// The body is parsed as JSON when possible; otherwise the message falls
    /// back to a fixed per-status phrase.
    pub fn from_response(status: u16, body: &str) -> Self {
        let kind = ApiErrorKind::from_status(status);
        match serde_json::from_str::<Value>(body) {
            Ok(payload) => Self {
                kind,
                message: extract_error_message(&payload),
                status: Some(status),
                payload: Some(payload),
            },
            Err(_) => Self {
                kind,
                message: status_message(status).to_string(),
                status: Some(status),
                payload: None,
            },
        }
    }

    /// Creates an auth error (bad credentials, missing or rejected token).
    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Auth, message)
    }

    /// Creates a protocol error (required field missing from a response).
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Protocol, message)
    }

    /// Classifies a transport or decode failure from the HTTP client.
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_decode() {
            Self::new(ApiErrorKind::Protocol, format!("Malformed response: {err}"))
        } else if err.is_timeout() {
            Self::new(ApiErrorKind::Network, format!("Request timed out: {err}"))
        } else {
            Self::new(ApiErrorKind::Network, format!("Request failed: {err}"))
        }
    }

    /// Returns true if this error means the token is not (or no longer) valid.
    pub fn is_auth(&self) -> bool {
        matches!(self.kind, ApiErrorKind::Auth)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for API operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Extracts a display message from a failure payload.
///
/// Selection order: `message` field, `detail` (string form, then first list
/// entry), first `details[]` entry, `error` field, generic fallback. List
/// entries are read as `message` then `msg`.
pub fn extract_error_message(payload: &Value) -> String {
    if let Some(message) = payload.get("message").and_then(Value::as_str) {
        return message.to_string();
    }

    match payload.get("detail") {
        Some(Value::String(detail)) => return detail.clone(),
        Some(Value::Array(entries)) => {
            return first_entry_message(entries)
                .unwrap_or_else(|| VALIDATION_ERROR_MESSAGE.to_string());
        }
        _ => {}
    }

    if let Some(Value::Array(entries)) = payload.get("details") {
        return first_entry_message(entries)
            .unwrap_or_else(|| VALIDATION_ERROR_MESSAGE.to_string());
    }

    if let Some(error) = payload.get("error").and_then(Value::as_str) {
        return error.to_string();
    }

    GENERIC_ERROR_MESSAGE.to_string()
}

/// Reads the first validation entry's message, preferring `message` over `msg`.
fn first_entry_message(entries: &[Value]) -> Option<String> {
    let first = entries.first()?;
    first
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| first.get("msg").and_then(Value::as_str))
        .map(ToString::to_string)
}

/// Returns a fixed message for an HTTP status code.
///
/// Used when a failure body carries no parseable JSON payload.
pub fn status_message(status: u16) -> &'static str {
    match status {
        400 => "Bad request",
        401 => "Authentication required",
        403 => "Access denied",
        404 => "Resource not found",
        422 => "Input validation failed",
        500 => "Server error",
        503 => "Service temporarily unavailable",
        _ => GENERIC_ERROR_MESSAGE,
    }
}
