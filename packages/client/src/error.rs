use std::fmt;

use serde_json::Value;

/// Classification the API uses for "temporary issue, retry the operation".
pub const TRANSIENT_ERROR_CODE: i64 = 2;

/// The classification carried by an [`ApiError`].
///
/// The API reports error codes as integers, but some error shapes carry a
/// string or nothing at all.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ErrorCode {
    #[default]
    None,
    Int(i64),
    Str(String),
}

impl ErrorCode {
    /// Only the integer sentinel is retry-safe; the string `"2"` is not.
    pub fn is_transient(&self) -> bool {
        matches!(self, ErrorCode::Int(TRANSIENT_ERROR_CODE))
    }

    fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => ErrorCode::None,
            Value::Number(n) => n
                .as_i64()
                .map(ErrorCode::Int)
                .unwrap_or_else(|| ErrorCode::Str(n.to_string())),
            Value::String(s) => ErrorCode::Str(s.clone()),
            other => ErrorCode::Str(other.to_string()),
        }
    }
}

impl From<u16> for ErrorCode {
    fn from(status: u16) -> Self {
        ErrorCode::Int(i64::from(status))
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::None => Ok(()),
            ErrorCode::Int(code) => write!(f, "{}", code),
            ErrorCode::Str(code) => write!(f, "{}", code),
        }
    }
}

/// Results collected before a follow-up page failed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PartialPages {
    pub data: Vec<Value>,
    pub pages_seen: u32,
}

/// An error reported by the API, or a response that could not be understood.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ApiError {
    pub message: String,
    pub code: ErrorCode,
    /// The structured error payload, or the message when there was none.
    pub result: Value,
    pub status: Option<u16>,
    pub partial: Option<PartialPages>,
}

impl ApiError {
    /// An error with no structured payload behind it.
    pub fn new(message: impl Into<String>, status: Option<u16>) -> Self {
        let message = message.into();
        Self {
            result: Value::String(message.clone()),
            message,
            code: status.map(ErrorCode::from).unwrap_or_default(),
            status,
            partial: None,
        }
    }

    /// Build an error from the payload the API returned.
    ///
    /// The classification starts as the HTTP status (or the payload's
    /// `error_code` without one). The message is taken from the first of
    /// `error_description`, `error.message` (which also brings `error.code`)
    /// and `error_msg`, falling back to the payload itself.
    pub fn from_result(result: Value, status: Option<u16>) -> Self {
        let mut code = match status {
            Some(status) => ErrorCode::from(status),
            None => result
                .get("error_code")
                .map(ErrorCode::from_value)
                .unwrap_or_default(),
        };

        let nested = result.get("error").filter(|error| error.is_object());
        let message = if let Some(description) = result.get("error_description") {
            value_to_message(description)
        } else if let Some(message) = nested.and_then(|error| error.get("message")) {
            if let Some(nested_code) = nested.and_then(|error| error.get("code")) {
                code = ErrorCode::from_value(nested_code);
            }
            value_to_message(message)
        } else if let Some(message) = result.get("error_msg") {
            value_to_message(message)
        } else {
            value_to_message(&result)
        };

        Self {
            message,
            code,
            result,
            status,
            partial: None,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.code.is_transient()
    }

    pub(crate) fn with_partial(mut self, data: Vec<Value>, pages_seen: u32) -> Self {
        self.partial = Some(PartialPages { data, pages_seen });
        self
    }
}

fn value_to_message(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Unexpected response: {message}")]
    UnexpectedResponse { message: String },
}

impl Error {
    /// The API error behind this failure, if it came from the API.
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            Error::Api(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_description_uses_status_as_code() {
        let err = ApiError::from_result(
            json!({"error": "invalid_request", "error_description": "bad code"}),
            Some(400),
        );
        assert_eq!(err.message, "bad code");
        assert_eq!(err.code, ErrorCode::Int(400));
        assert_eq!(err.status, Some(400));
    }

    #[test]
    fn nested_error_overrides_code() {
        let err = ApiError::from_result(
            json!({"error": {"message": "Service temporarily unavailable", "code": 2}}),
            Some(500),
        );
        assert_eq!(err.message, "Service temporarily unavailable");
        assert_eq!(err.code, ErrorCode::Int(2));
        assert!(err.is_transient());
    }

    #[test]
    fn nested_error_without_code_keeps_status() {
        let err = ApiError::from_result(json!({"error": {"message": "nope"}}), Some(403));
        assert_eq!(err.message, "nope");
        assert_eq!(err.code, ErrorCode::Int(403));
    }

    #[test]
    fn error_msg_is_used_for_rest_style_errors() {
        let err = ApiError::from_result(json!({"error_code": 190, "error_msg": "expired"}), None);
        assert_eq!(err.message, "expired");
        assert_eq!(err.code, ErrorCode::Int(190));
    }

    #[test]
    fn fallback_message_is_the_payload() {
        let err = ApiError::from_result(json!({"something": "odd"}), None);
        assert_eq!(err.message, r#"{"something":"odd"}"#);
        assert_eq!(err.code, ErrorCode::None);
        assert_eq!(err.to_string(), err.message);
    }

    #[test]
    fn string_codes_are_not_transient() {
        let err = ApiError::from_result(json!({"error": {"message": "m", "code": "2"}}), None);
        assert_eq!(err.code, ErrorCode::Str("2".to_string()));
        assert!(!err.is_transient());
    }

    #[test]
    fn plain_message_error() {
        let err = ApiError::new("boom", Some(502));
        assert_eq!(err.result, json!("boom"));
        assert_eq!(err.code, ErrorCode::Int(502));
        assert_eq!(ApiError::new("boom", None).code, ErrorCode::None);
    }

    #[test]
    fn error_exposes_api_error() {
        let err: Error = ApiError::new("boom", None).into();
        assert_eq!(err.as_api().map(|e| e.message.as_str()), Some("boom"));
        assert_eq!(err.to_string(), "boom");

        let err = Error::InvalidRequest {
            message: "x".to_string(),
        };
        assert!(err.as_api().is_none());
    }
}
