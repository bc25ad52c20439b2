use serde::Deserialize;
use thiserror::Error;

/// Failure talking to the queue API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The configured base URL is unusable.
    #[error("invalid API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    /// A credential could not be encoded as a header value.
    #[error("invalid credential in {0}")]
    InvalidCredential(&'static str),
    /// The request never produced a response (connect, timeout, TLS).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The server answered with a non-success status.
    #[error("API error {status}: {message}")]
    Status {
        status: u16,
        message: String,
        code: Option<String>,
        request_id: Option<String>,
    },
    /// The body did not match the expected shape.
    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// HTTP status for [`ApiError::Status`], `None` otherwise.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Builds a status error from a failed response body.
    ///
    /// JSON bodies contribute `message`, `code` and `request_id`
    /// (`requestId` is accepted too); anything else is used verbatim.
    pub(crate) fn from_response_body(status: u16, is_json: bool, body: &str, header_request_id: Option<String>) -> Self {
        let payload = if is_json {
            serde_json::from_str::<ErrorPayload>(body).ok()
        } else {
            None
        };
        match payload {
            Some(payload) => Self::Status {
                status,
                message: payload
                    .message
                    .or(payload.error)
                    .unwrap_or_else(|| "request failed".to_string()),
                code: payload.code,
                request_id: payload.request_id.or(header_request_id),
            },
            None => {
                let trimmed = body.trim();
                Self::Status {
                    status,
                    message: if trimmed.is_empty() {
                        "request failed".to_string()
                    } else {
                        trimmed.to_string()
                    },
                    code: None,
                    request_id: header_request_id,
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default, alias = "requestId")]
    request_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_error_body_populates_fields() {
        let body = r#"{"message":"queue unavailable","code":"QUEUE_DOWN","requestId":"req-9"}"#;
        let error = ApiError::from_response_body(503, true, body, None);
        match error {
            ApiError::Status {
                status,
                message,
                code,
                request_id,
            } => {
                assert_eq!(status, 503);
                assert_eq!(message, "queue unavailable");
                assert_eq!(code.as_deref(), Some("QUEUE_DOWN"));
                assert_eq!(request_id.as_deref(), Some("req-9"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn plain_text_body_becomes_message() {
        let error = ApiError::from_response_body(502, false, "bad gateway\n", Some("hdr-1".into()));
        assert_eq!(error.to_string(), "API error 502: bad gateway");
        assert_eq!(error.status(), Some(502));
    }

    #[test]
    fn unparseable_json_body_falls_back_to_text() {
        let error = ApiError::from_response_body(500, true, "", None);
        assert_eq!(error.to_string(), "API error 500: request failed");
    }
}
