use bytes::Bytes;
use http::{Request, Response};
use http_body_util::Full;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::Instrument;

/// Tower layer that logs every outbound request
///
/// Creates an `outgoing_http` span carrying `http.method` and `http.url`
/// (query string stripped), records `http.status_code` on completion and
/// emits one `info` event per exchange. Installed when the client is built
/// with `debug` enabled.
#[derive(Clone, Debug, Default)]
pub struct RequestLogLayer;

impl RequestLogLayer {
    /// Create a new request log layer
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for RequestLogLayer {
    type Service = RequestLogService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestLogService { inner }
    }
}

/// Service that wraps requests with a tracing span
#[derive(Clone, Debug)]
pub struct RequestLogService<S> {
    inner: S,
}

impl<S, ResBody> Service<Request<Full<Bytes>>> for RequestLogService<S>
where
    S: Service<Request<Full<Bytes>>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    S::Error: std::fmt::Display + Send + 'static,
    ResBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Full<Bytes>>) -> Self::Future {
        let method = req.method().clone();
        let uri = req.uri();

        // Query strings may carry filter values; keep them out of logs.
        let url = format!(
            "{}://{}{}",
            uri.scheme_str().unwrap_or("https"),
            uri.authority().map_or("", http::uri::Authority::as_str),
            uri.path()
        );

        // Clone-swap pattern (Tower Service contract).
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let span = tracing::info_span!(
                "outgoing_http",
                http.method = %method,
                http.url = %url,
                http.status_code = tracing::field::Empty,
            );

            let result = inner.call(req).instrument(span.clone()).await;

            span.in_scope(|| match &result {
                Ok(response) => {
                    span.record("http.status_code", response.status().as_u16());
                    tracing::info!(status = response.status().as_u16(), "request completed");
                }
                Err(e) => {
                    tracing::info!(error = %e, "request failed");
                }
            });

            result
        })
    }
}
