use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use arc_swap::ArcSwap;
use cvent_http::HttpError;
use http::header::AUTHORIZATION;
use http::{HeaderValue, Request, Response};
use tower::{Layer, Service};
use zeroize::Zeroizing;

use crate::secret::SecretString;

/// Tower layer that sets `Authorization: Bearer <token>` on outbound requests.
///
/// The token is fixed when the layer is created. Clones of the layer and every
/// service it produced share one slot, so [`set_token`](Self::set_token) is
/// the only way to change the value that goes out.
#[derive(Clone, Debug)]
pub struct TokenAuthLayer {
    token: Arc<ArcSwap<SecretString>>,
}

impl TokenAuthLayer {
    #[must_use]
    pub fn new(token: SecretString) -> Self {
        Self {
            token: Arc::new(ArcSwap::from_pointee(token)),
        }
    }

    /// Replace the token sent on subsequent requests.
    pub fn set_token(&self, token: SecretString) {
        self.token.store(Arc::new(token));
    }

    /// Token currently being injected.
    #[must_use]
    pub fn token(&self) -> Arc<SecretString> {
        self.token.load_full()
    }
}

impl<S> Layer<S> for TokenAuthLayer {
    type Service = TokenAuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TokenAuthService {
            inner,
            token: Arc::clone(&self.token),
        }
    }
}

/// Service created by [`TokenAuthLayer`].
#[derive(Clone, Debug)]
pub struct TokenAuthService<S> {
    inner: S,
    token: Arc<ArcSwap<SecretString>>,
}

impl<S, B, ResBody> Service<Request<B>> for TokenAuthService<S>
where
    S: Service<Request<B>, Response = Response<ResBody>, Error = HttpError>
        + Clone
        + Send
        + 'static,
    S::Future: Send,
    B: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = HttpError;
    type Future = Pin<Box<dyn Future<Output = Result<Response<ResBody>, HttpError>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        let raw = Zeroizing::new(format!("Bearer {}", self.token.load().expose()));
        let mut bearer_value = match HeaderValue::from_str(&raw) {
            Ok(v) => v,
            Err(e) => return Box::pin(async { Err(HttpError::InvalidHeaderValue(e)) }),
        };
        bearer_value.set_sensitive(true);

        // insert, not append: a request carries exactly one Authorization value
        req.headers_mut().insert(AUTHORIZATION, bearer_value);

        // Clone-swap pattern (Tower Service contract).
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move { inner.call(req).await })
    }
}
