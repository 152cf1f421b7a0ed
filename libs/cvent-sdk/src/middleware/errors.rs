use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use cvent_http::{ERROR_BODY_PREVIEW_LIMIT, HttpError, ResponseBody};
use http::{Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use tower::{Layer, Service};

/// Replacement producer for one HTTP status.
///
/// Invoked with no arguments; whatever it returns is handed to the caller in
/// place of the original response.
pub type ErrorHandler = Arc<dyn Fn() -> Result<Response<ResponseBody>, HttpError> + Send + Sync>;

/// Handlers keyed by exact status code.
#[derive(Clone, Default)]
pub struct ErrorHandlers {
    handlers: HashMap<StatusCode, ErrorHandler>,
}

impl ErrorHandlers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `status`, replacing any previous one.
    #[must_use]
    pub fn on<F>(mut self, status: StatusCode, handler: F) -> Self
    where
        F: Fn() -> Result<Response<ResponseBody>, HttpError> + Send + Sync + 'static,
    {
        self.handlers.insert(status, Arc::new(handler));
        self
    }

    #[must_use]
    pub fn get(&self, status: StatusCode) -> Option<&ErrorHandler> {
        self.handlers.get(&status)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for ErrorHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut codes: Vec<u16> = self.handlers.keys().map(StatusCode::as_u16).collect();
        codes.sort_unstable();
        f.debug_struct("ErrorHandlers")
            .field("statuses", &codes)
            .finish()
    }
}

/// Tower layer that turns error statuses into [`HttpError::HttpStatus`].
///
/// - status `< 400`: the response is returned untouched
/// - a handler is registered for the exact status: its result replaces the response
/// - otherwise: `HttpError::HttpStatus` carrying method, URL, status, headers
///   and a body preview
///
/// Errors raised by inner layers pass through as they are. Install this layer
/// outermost so every failure leaves the client through it.
#[derive(Clone, Debug)]
pub struct ErrorsLayer {
    handlers: Arc<ErrorHandlers>,
}

impl ErrorsLayer {
    #[must_use]
    pub fn new(handlers: ErrorHandlers) -> Self {
        Self {
            handlers: Arc::new(handlers),
        }
    }
}

impl<S> Layer<S> for ErrorsLayer {
    type Service = ErrorsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ErrorsService {
            inner,
            handlers: Arc::clone(&self.handlers),
        }
    }
}

/// Service created by [`ErrorsLayer`].
#[derive(Clone, Debug)]
pub struct ErrorsService<S> {
    inner: S,
    handlers: Arc<ErrorHandlers>,
}

impl<S> Service<Request<Full<Bytes>>> for ErrorsService<S>
where
    S: Service<Request<Full<Bytes>>, Response = Response<ResponseBody>, Error = HttpError>
        + Clone
        + Send
        + 'static,
    S::Future: Send,
{
    type Response = Response<ResponseBody>;
    type Error = HttpError;
    type Future = Pin<Box<dyn Future<Output = Result<Response<ResponseBody>, HttpError>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Full<Bytes>>) -> Self::Future {
        let method = req.method().clone();
        let url = req.uri().to_string();
        let handlers = Arc::clone(&self.handlers);

        // Clone-swap pattern (Tower Service contract).
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let response = inner.call(req).await?;
            let status = response.status();

            if status.as_u16() < 400 {
                return Ok(response);
            }

            if let Some(handler) = handlers.get(status) {
                tracing::debug!(status = status.as_u16(), %method, "error status handled by registered handler");
                return handler();
            }

            let (parts, body) = response.into_parts();
            let body_preview = body_preview(body, ERROR_BODY_PREVIEW_LIMIT).await;

            Err(HttpError::HttpStatus {
                method,
                url,
                status,
                headers: parts.headers,
                body_preview,
            })
        })
    }
}

/// Read at most `limit` bytes of `body` as lossy UTF-8.
///
/// A body that fails mid-stream yields whatever was read before the failure.
async fn body_preview(body: ResponseBody, limit: usize) -> String {
    let mut collected = Vec::new();
    let mut body = std::pin::pin!(body);

    while let Some(Ok(frame)) = body.frame().await {
        if let Some(chunk) = frame.data_ref() {
            let remaining = limit - collected.len();
            if chunk.len() >= remaining {
                collected.extend_from_slice(&chunk[..remaining]);
                break;
            }
            collected.extend_from_slice(chunk);
        }
    }

    String::from_utf8_lossy(&collected).into_owned()
}
