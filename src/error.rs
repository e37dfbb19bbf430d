use std::time::{Duration, SystemTime};

use hyper::{HeaderMap, StatusCode};
use thiserror::Error;

/// Type alias for Result with GmailError
pub type Result<T> = std::result::Result<T, GmailError>;

/// Wait used when a 429 carries no usable Retry-After
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

/// Failures of a bulk delete run.
///
/// API variants carry the action that failed (for example
/// `delete message 18c2f`) so the final diagnostic names what was being
/// touched. Every variant is fatal once it reaches a driver; only the
/// production client's retry loop looks at [`GmailError::is_transient`].
#[derive(Error, Debug)]
pub enum GmailError {
    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Rate limited while trying to {target}, retry after {retry_after}s")]
    RateLimited { target: String, retry_after: u64 },

    #[error("Gmail server error (HTTP {status}) while trying to {target}")]
    ServerError { target: String, status: u16 },

    #[error("Network error while trying to {target}: {reason}")]
    Network { target: String, reason: String },

    /// 404; usually a message that was already deleted
    #[error("Could not {target}: not found")]
    NotFound { target: String },

    /// 403; deletion without the full mail scope ends up here
    #[error("Could not {target}: permission denied ({reason})")]
    Forbidden { target: String, reason: String },

    /// 400, any other 4xx, or a request refused before it was sent
    #[error("Could not {target}: {reason}")]
    BadRequest { target: String, reason: String },

    #[error("Unreadable Gmail response: {0}")]
    MalformedResponse(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Operator input ended while a prompt was waiting for an answer
    #[error("Input closed while waiting for: {0}")]
    InputClosed(String),
}

impl GmailError {
    /// Map a google-gmail1 failure for the action described by `target`
    pub fn from_api(target: impl Into<String>, error: google_gmail1::Error) -> Self {
        let target = target.into();
        match error {
            google_gmail1::Error::Failure(response) => {
                Self::from_status(target, response.status(), response.headers())
            }
            google_gmail1::Error::BadRequest(body) => GmailError::BadRequest {
                target,
                reason: body.to_string(),
            },
            google_gmail1::Error::HttpError(err) => GmailError::Network {
                target,
                reason: err.to_string(),
            },
            google_gmail1::Error::Io(err) => GmailError::Network {
                target,
                reason: err.to_string(),
            },
            google_gmail1::Error::MissingToken(err) => {
                GmailError::AuthError(format!("no usable access token to {}: {}", target, err))
            }
            google_gmail1::Error::JsonDecodeError(body, err) => {
                GmailError::MalformedResponse(format!("{} ({} bytes): {}", target, body.len(), err))
            }
            other => GmailError::BadRequest {
                target,
                reason: other.to_string(),
            },
        }
    }

    fn from_status(target: String, status: StatusCode, headers: &HeaderMap) -> Self {
        let reason = status.canonical_reason().unwrap_or("unknown status").to_string();
        match status {
            StatusCode::TOO_MANY_REQUESTS => GmailError::RateLimited {
                target,
                retry_after: retry_after_secs(headers, SystemTime::now()),
            },
            StatusCode::NOT_FOUND => GmailError::NotFound { target },
            StatusCode::FORBIDDEN => GmailError::Forbidden { target, reason },
            s if s.is_server_error() => GmailError::ServerError {
                target,
                status: s.as_u16(),
            },
            s => GmailError::BadRequest {
                target,
                reason: format!("HTTP {} {}", s.as_u16(), reason),
            },
        }
    }

    /// Errors worth another attempt of the same read call
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GmailError::RateLimited { .. } | GmailError::ServerError { .. } | GmailError::Network { .. }
        )
    }

    /// Server-requested wait before the next attempt, if any
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            GmailError::RateLimited { retry_after, .. } => Some(Duration::from_secs(*retry_after)),
            _ => None,
        }
    }

    /// Operator advice printed under the final error line
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            GmailError::AuthError(_) => Some(
                "Check credentials.json (downloadable from Google Cloud Console), \
                 then run: gmail-bulk-delete auth --force",
            ),
            GmailError::Forbidden { .. } => Some(
                "Permanent deletion needs the https://mail.google.com/ scope. \
                 Re-authorize with: gmail-bulk-delete auth --force",
            ),
            GmailError::RateLimited { .. } => {
                Some("Gmail is throttling this account. Wait a minute and run the query again.")
            }
            GmailError::ConfigError(_) => {
                Some("Fix the configuration file or regenerate it: gmail-bulk-delete init-config --force")
            }
            GmailError::NotFound { .. } => {
                Some("The message may already be gone. Re-run the query to pick up the current matches.")
            }
            _ => None,
        }
    }
}

/// Seconds to wait according to a Retry-After header, either delay-seconds
/// or an HTTP-date. Missing, unparsable and past values give the default.
fn retry_after_secs(headers: &HeaderMap, now: SystemTime) -> u64 {
    let Some(value) = headers
        .get(hyper::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
    else {
        return DEFAULT_RETRY_AFTER_SECS;
    };

    if let Ok(secs) = value.parse::<u64>() {
        return secs;
    }
    httpdate::parse_http_date(value)
        .ok()
        .and_then(|at| at.duration_since(now).ok())
        .map(|wait| wait.as_secs())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}
