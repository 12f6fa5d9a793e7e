use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Normalized failure of an upstream call
///
/// Every client method returns this instead of panicking or leaking a raw
/// transport error, so callers can always render a failure as text.
///
/// # Examples
///
/// ```rust
/// # use datagouv_api::UpstreamError;
/// let err = UpstreamError::Status {
///     status: 404,
///     message: "not found".to_string(),
/// };
/// assert_eq!(err.status(), Some(404));
/// assert_eq!(err.to_string(), "upstream returned 404: not found");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    /// The call did not complete within the session timeout
    #[error("request to {url} timed out after {}s", timeout.as_secs_f32())]
    Timeout { url: String, timeout: Duration },

    /// Connection refused, DNS failure, TLS or body read error
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// Upstream answered with a non-2xx status
    #[error("upstream returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Upstream answered 2xx but the payload did not have the expected shape
    #[error("unexpected response from {url}: {message}")]
    Shape { url: String, message: String },

    /// The call was rejected locally before reaching upstream
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl UpstreamError {
    /// HTTP status reported by upstream, if the call got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            UpstreamError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, UpstreamError::Timeout { .. })
    }

    /// True for failures reported by upstream itself (non-2xx responses).
    pub fn is_http(&self) -> bool {
        matches!(self, UpstreamError::Status { .. })
    }

    pub(crate) fn from_reqwest(url: &str, timeout: Duration, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout {
                url: url.to_string(),
                timeout,
            }
        } else {
            UpstreamError::Transport {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }

    pub(crate) fn from_status(status: u16, body: &str) -> Self {
        UpstreamError::Status {
            status,
            message: upstream_message(body),
        }
    }
}

/// Result of every upstream client operation.
pub type UpstreamResult<T> = std::result::Result<T, UpstreamError>;

const MAX_MESSAGE_CHARS: usize = 300;

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

/// Extract a human readable message from an upstream error body.
fn upstream_message(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        let detail = parsed.detail.map(|detail| match detail {
            serde_json::Value::String(text) => text,
            other => other.to_string(),
        });
        if let Some(message) = parsed.message.or(parsed.error).or(detail) {
            return message;
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "no response body".to_string();
    }
    if trimmed.chars().count() > MAX_MESSAGE_CHARS {
        let cut: String = trimmed.chars().take(MAX_MESSAGE_CHARS).collect();
        format!("{cut}…")
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_field_wins() {
        assert_eq!(upstream_message(r#"{"message":"not found"}"#), "not found");
        assert_eq!(
            upstream_message(r#"{"error":"bad filter","message":null}"#),
            "bad filter"
        );
    }

    #[test]
    fn detail_objects_are_stringified() {
        let message = upstream_message(r#"{"detail":{"field":"page_size"}}"#);
        assert!(message.contains("page_size"));
    }

    #[test]
    fn plain_bodies_are_trimmed() {
        assert_eq!(upstream_message("  Service Unavailable \n"), "Service Unavailable");
        assert_eq!(upstream_message(""), "no response body");

        let long = "x".repeat(1000);
        let message = upstream_message(&long);
        assert!(message.ends_with('…'));
        assert_eq!(message.chars().count(), MAX_MESSAGE_CHARS + 1);
    }

    #[test]
    fn only_status_failures_carry_a_status() {
        let timeout = UpstreamError::Timeout {
            url: "http://localhost/".into(),
            timeout: Duration::from_secs(15),
        };
        assert_eq!(timeout.status(), None);
        assert!(timeout.is_timeout());
        assert!(!timeout.is_http());

        let status = UpstreamError::from_status(502, "");
        assert_eq!(status.status(), Some(502));
        assert!(status.is_http());
    }
}
