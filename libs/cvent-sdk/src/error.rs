use cvent_http::HttpError;
use http::{HeaderMap, Method, StatusCode};
use thiserror::Error;

/// Errors surfaced by the SDK.
///
/// Construction-time failures (`Configuration`, `InvalidCredentials`) are
/// returned before any session is published. Per-request failures travel up
/// through repository and service unchanged.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SdkError {
    /// Missing or contradictory credentials, or an unusable setting.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The token endpoint did not hand out a usable access token.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// A session accessor was used before `set_credentials` / `set_auth_token`.
    #[error("You need to set credentials or auth token first")]
    UninitializedSession,

    /// The API answered with a status >= 400 and no handler was registered for it.
    #[error("HTTP {status} for {method} {url}: {body}")]
    Http {
        /// Method of the failed request
        method: Method,
        /// URL of the failed request
        url: String,
        /// Response status
        status: StatusCode,
        /// Response headers
        headers: HeaderMap,
        /// Leading part of the response body
        body: String,
    },

    /// Network, TLS, timeout or request-building failure.
    #[error("transport error: {0}")]
    Transport(#[source] HttpError),

    /// The response body is not valid JSON.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Configuration sources could not be merged or extracted.
    #[error("failed to load configuration: {0}")]
    Config(#[source] Box<figment::Error>),
}

impl SdkError {
    /// HTTP status associated with this error, if any.
    ///
    /// `InvalidCredentials` always reports 401.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::InvalidCredentials => Some(StatusCode::UNAUTHORIZED),
            Self::Http { status, .. } => Some(*status),
            Self::Transport(e) => e.status(),
            _ => None,
        }
    }
}

impl From<HttpError> for SdkError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::HttpStatus {
                method,
                url,
                status,
                headers,
                body_preview,
            } => Self::Http {
                method,
                url,
                status,
                headers,
                body: body_preview,
            },
            other => Self::Transport(other),
        }
    }
}

impl From<figment::Error> for SdkError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}
