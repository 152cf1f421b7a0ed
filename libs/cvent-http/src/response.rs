use crate::error::HttpError;
use bytes::Bytes;
use http::{HeaderMap, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use serde::de::DeserializeOwned;

/// Maximum body preview size for error messages (8KB).
pub const ERROR_BODY_PREVIEW_LIMIT: usize = 8 * 1024;

/// Type-erased response body.
///
/// Holds either the (possibly decompressed) network body or a body
/// synthesized in memory by a middleware.
pub type ResponseBody =
    http_body_util::combinators::BoxBody<Bytes, Box<dyn std::error::Error + Send + Sync>>;

/// Build a [`ResponseBody`] from in-memory bytes.
///
/// Useful for middleware that replaces a response instead of forwarding it.
pub fn body_from_bytes(bytes: impl Into<Bytes>) -> ResponseBody {
    Full::new(bytes.into())
        .map_err(|never| match never {})
        .boxed()
}

/// HTTP response wrapper with body-reading helpers
///
/// All body reads enforce the configured `max_body_size` limit. The status
/// is not checked here; classification of error statuses is left to the
/// middleware stack.
#[derive(Debug)]
pub struct HttpResponse {
    pub(crate) inner: Response<ResponseBody>,
    pub(crate) max_body_size: usize,
}

impl HttpResponse {
    /// Get the response status code
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    /// Get the response headers
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// Consume the wrapper and return the inner response
    #[must_use]
    pub fn into_inner(self) -> Response<ResponseBody> {
        self.inner
    }

    /// Read response body as bytes
    ///
    /// # Errors
    /// Returns `HttpError::BodyTooLarge` if body exceeds limit.
    /// Returns `HttpError::Transport` if the body stream fails.
    pub async fn bytes(self) -> Result<Bytes, HttpError> {
        read_body_limited(self.inner.into_body(), self.max_body_size).await
    }

    /// Parse response body as JSON
    ///
    /// # Errors
    /// Returns `HttpError::BodyTooLarge` if body exceeds limit.
    /// Returns `HttpError::Json` if parsing fails.
    pub async fn json<T: DeserializeOwned>(self) -> Result<T, HttpError> {
        let body_bytes = read_body_limited(self.inner.into_body(), self.max_body_size).await?;
        Ok(serde_json::from_slice(&body_bytes)?)
    }
}

/// Collect a response body into memory, failing once `limit` bytes are exceeded.
///
/// # Errors
/// Returns `HttpError::BodyTooLarge` if body exceeds limit.
/// Returns `HttpError::Transport` if the body stream fails.
pub async fn read_body_limited(body: ResponseBody, limit: usize) -> Result<Bytes, HttpError> {
    let mut collected = Vec::new();
    let mut body = std::pin::pin!(body);

    while let Some(frame) = body.frame().await {
        let frame = frame.map_err(HttpError::Transport)?;
        if let Some(chunk) = frame.data_ref() {
            if collected.len() + chunk.len() > limit {
                return Err(HttpError::BodyTooLarge {
                    limit,
                    actual: collected.len() + chunk.len(),
                });
            }
            collected.extend_from_slice(chunk);
        }
    }

    Ok(Bytes::from(collected))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn body_from_bytes_round_trips() {
        let body = body_from_bytes("hello");
        let bytes = read_body_limited(body, 16).await.unwrap();
        assert_eq!(&bytes[..], b"hello");
    }

    #[tokio::test]
    async fn limit_is_enforced() {
        let body = body_from_bytes("x".repeat(32));
        let err = read_body_limited(body, 8).await.unwrap_err();
        assert!(matches!(
            err,
            HttpError::BodyTooLarge {
                limit: 8,
                actual: 32
            }
        ));
    }

    #[tokio::test]
    async fn empty_body_reads_as_empty() {
        let bytes = read_body_limited(body_from_bytes(Bytes::new()), 8)
            .await
            .unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn json_helper_parses_payload() {
        let response = HttpResponse {
            inner: Response::builder()
                .status(StatusCode::OK)
                .body(body_from_bytes(r#"{"id":"e1"}"#))
                .unwrap(),
            max_body_size: 1024,
        };

        let value: serde_json::Value = response.json().await.unwrap();
        assert_eq!(value["id"], "e1");
    }
}
