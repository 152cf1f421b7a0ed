use crate::client::{HttpClient, InnerService};
use crate::config::{HttpClientConfig, TransportSecurity};
use crate::error::HttpError;
use crate::layers::{DefaultHeadersLayer, RequestLogLayer};
use crate::response::ResponseBody;
use crate::tls;
use bytes::Bytes;
use http::Response;
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::{TokioExecutor, TokioTimer};
use std::time::Duration;
use tower::timeout::TimeoutLayer;
use tower::util::BoxCloneSyncService;
use tower::{Layer, ServiceBuilder, ServiceExt};
use tower_http::decompression::DecompressionLayer;

type MiddlewareFn = Box<dyn FnOnce(InnerService) -> InnerService + Send>;

/// Configures and assembles an [`HttpClient`].
///
/// The SDK builds one client per API group from an [`HttpClientConfig`]
/// and installs its error and auth middleware through
/// [`with_middleware`](Self::with_middleware).
pub struct HttpClientBuilder {
    config: HttpClientConfig,
    middleware: Option<MiddlewareFn>,
}

impl HttpClientBuilder {
    /// Start from [`HttpClientConfig::default`]
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(HttpClientConfig::default())
    }

    /// Start from an existing configuration
    #[must_use]
    pub fn with_config(config: HttpClientConfig) -> Self {
        Self {
            config,
            middleware: None,
        }
    }

    /// Per-request timeout, covering connect, send and response headers
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Header added to requests that do not set it themselves
    #[must_use]
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.push((name.into(), value.into()));
        self
    }

    /// Cap on buffered response bodies
    #[must_use]
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.config.max_body_size = size;
        self
    }

    /// Accept `http://` URLs, for mock servers in tests.
    ///
    /// Only available in debug builds or with the `allow-insecure-http` feature.
    #[must_use]
    #[cfg(any(debug_assertions, feature = "allow-insecure-http"))]
    pub fn allow_insecure_http(mut self) -> Self {
        self.config.transport = TransportSecurity::AllowInsecureHttp;
        self
    }

    /// Trace every request and its outcome
    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Wrap the whole transport stack with caller-supplied middleware.
    ///
    /// Stack position: `**this middleware** → [RequestLog] → Timeout → …`
    ///
    /// The middleware is the first code to see a request and the last to see
    /// the response or error. Only one wrapper can be set; a second call
    /// replaces the first, so compose several layers inside one closure.
    #[must_use]
    pub fn with_middleware(
        mut self,
        wrap: impl FnOnce(InnerService) -> InnerService + Send + 'static,
    ) -> Self {
        self.middleware = Some(Box::new(wrap));
        self
    }

    /// Assemble the client.
    ///
    /// Layers from the outside in: caller middleware, request log (when
    /// `debug` is set), timeout, default headers, decompression, then the
    /// pooled hyper client. Every HTTP status leaves this stack as
    /// `Ok(Response)`.
    ///
    /// # Errors
    /// Returns an error if TLS initialization fails or a default header is invalid
    pub fn build(self) -> Result<HttpClient, HttpError> {
        let Self { config, middleware } = self;
        if config.transport == TransportSecurity::AllowInsecureHttp {
            tracing::warn!(
                target: "cvent_http::security",
                "plain HTTP accepted by this client; meant for mock servers only"
            );
        }

        let mut service = transport_stack(&config)?;
        if config.debug {
            service = BoxCloneSyncService::new(RequestLogLayer::new().layer(service));
        }
        if let Some(wrap) = middleware {
            service = wrap(service);
        }

        Ok(HttpClient {
            service,
            max_body_size: config.max_body_size,
            transport_security: config.transport,
        })
    }
}

/// Timeout, default headers and decompression over a pooled hyper client.
fn transport_stack(config: &HttpClientConfig) -> Result<InnerService, HttpError> {
    let connector = build_https_connector(config.transport)?;
    let mut pool = Client::builder(TokioExecutor::new());
    // the idle timeout only fires with a timer installed
    pool.pool_timer(TokioTimer::new())
        .pool_max_idle_per_host(config.pool_max_idle_per_host);
    if let Some(idle) = config.pool_idle_timeout {
        pool.pool_idle_timeout(idle);
    }
    let hyper_client = pool.build::<_, Full<Bytes>>(connector);

    let timeout = config.request_timeout;
    let stack = ServiceBuilder::new()
        .layer(TimeoutLayer::new(timeout))
        .layer(DefaultHeadersLayer::try_new(
            &config.user_agent,
            &config.default_headers,
        )?)
        .layer(DecompressionLayer::new())
        .service(hyper_client)
        .map_response(box_response_body)
        .map_err(move |e: tower::BoxError| map_tower_error(e, timeout));

    Ok(BoxCloneSyncService::new(stack))
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Map tower errors to `HttpError` with actual timeout duration
fn map_tower_error(err: tower::BoxError, timeout: Duration) -> HttpError {
    if err.is::<tower::timeout::error::Elapsed>() {
        return HttpError::Timeout(timeout);
    }

    match err.downcast::<HttpError>() {
        Ok(http_err) => *http_err,
        Err(other) => HttpError::Transport(other),
    }
}

/// Erase the decompression body into [`ResponseBody`].
fn box_response_body<B>(response: Response<B>) -> Response<ResponseBody>
where
    B: hyper::body::Body<Data = Bytes> + Send + Sync + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    response.map(|body| body.map_err(Into::into).boxed())
}

/// Build the HTTPS connector backed by the webpki root store.
///
/// # Errors
///
/// Returns `HttpError::Tls` if the crypto provider cannot be configured.
fn build_https_connector(
    transport: TransportSecurity,
) -> Result<HttpsConnector<HttpConnector>, HttpError> {
    let provider = tls::get_crypto_provider();
    let builder = hyper_rustls::HttpsConnectorBuilder::new()
        .with_provider_and_webpki_roots(provider)
        .map_err(|e| HttpError::Tls(Box::new(e)))?;

    let connector = if transport == TransportSecurity::AllowInsecureHttp {
        builder.https_or_http().enable_all_versions().build()
    } else {
        builder.https_only().enable_all_versions().build()
    };
    Ok(connector)
}
