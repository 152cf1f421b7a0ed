use crate::client::InnerService;
use crate::config::TransportSecurity;
use crate::error::{HttpError, InvalidUriKind};
use crate::response::HttpResponse;
use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http::{Method, Request, Uri};
use http_body_util::Full;
use tower::ServiceExt;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// A single outgoing call: the API only ever sends bodiless GETs and
/// form-encoded token POSTs.
///
/// Created by [`HttpClient::get`](crate::HttpClient::get) and
/// [`HttpClient::post`](crate::HttpClient::post). The first header error is
/// kept and reported by [`send()`](RequestBuilder::send) or
/// [`form()`](RequestBuilder::form).
#[must_use = "RequestBuilder does nothing until .send() is called"]
pub struct RequestBuilder {
    service: InnerService,
    max_body_size: usize,
    transport_security: TransportSecurity,
    method: Method,
    url: String,
    headers: Vec<(HeaderName, HeaderValue)>,
    form: Option<Bytes>,
    pending: Result<(), HttpError>,
}

impl RequestBuilder {
    pub(crate) fn new(
        service: InnerService,
        max_body_size: usize,
        method: Method,
        url: String,
        transport_security: TransportSecurity,
    ) -> Self {
        Self {
            service,
            max_body_size,
            transport_security,
            method,
            url,
            headers: Vec::new(),
            form: None,
            pending: Ok(()),
        }
    }

    /// Add a single header to the request
    pub fn header(self, name: &str, value: &str) -> Self {
        self.push_header(name, value, false)
    }

    /// Add a header whose value `http`'s `Debug` impls redact, such as a
    /// bearer token.
    pub fn sensitive_header(self, name: &str, value: &str) -> Self {
        self.push_header(name, value, true)
    }

    fn push_header(mut self, name: &str, value: &str, sensitive: bool) -> Self {
        if self.pending.is_err() {
            return self;
        }
        let parsed = HeaderName::try_from(name)
            .map_err(HttpError::InvalidHeaderName)
            .and_then(|name| {
                let mut value =
                    HeaderValue::try_from(value).map_err(HttpError::InvalidHeaderValue)?;
                value.set_sensitive(sensitive);
                Ok((name, value))
            });
        match parsed {
            Ok(pair) => self.headers.push(pair),
            Err(e) => self.pending = Err(e),
        }
        self
    }

    /// Encode `fields` as the request body.
    ///
    /// Content-Type becomes `application/x-www-form-urlencoded` unless the
    /// caller already set one.
    ///
    /// # Errors
    ///
    /// Returns the header error captured earlier, or
    /// `HttpError::FormEncode` if the fields cannot be encoded.
    pub fn form(mut self, fields: &[(&str, &str)]) -> Result<Self, HttpError> {
        std::mem::replace(&mut self.pending, Ok(()))?;
        self.form = Some(Bytes::from(serde_urlencoded::to_string(fields)?));
        Ok(self)
    }

    /// Send the request through the client's middleware stack.
    ///
    /// Every HTTP status comes back as `Ok`; only middleware installed on
    /// the client turns a status into an error.
    ///
    /// # Errors
    ///
    /// Returns `HttpError` for a captured header error, a URL that is not
    /// absolute or whose scheme the transport security forbids, a transport
    /// failure or timeout, or a middleware rejection.
    pub async fn send(self) -> Result<HttpResponse, HttpError> {
        self.pending?;
        let uri = parse_target(&self.url, self.transport_security)?;

        let mut request = Request::builder().method(self.method).uri(uri);
        let caller_typed = self.headers.iter().any(|(name, _)| name == CONTENT_TYPE);
        if self.form.is_some() && !caller_typed {
            request = request.header(CONTENT_TYPE, FORM_CONTENT_TYPE);
        }
        for (name, value) in self.headers {
            request = request.header(name, value);
        }
        let request = request.body(Full::new(self.form.unwrap_or_default()))?;

        let inner = self.service.oneshot(request).await?;
        Ok(HttpResponse {
            inner,
            max_body_size: self.max_body_size,
        })
    }
}

/// Parse an absolute URL and check its scheme against `security`.
fn parse_target(url: &str, security: TransportSecurity) -> Result<Uri, HttpError> {
    let invalid = |kind, reason: String| HttpError::InvalidUri {
        url: url.to_owned(),
        kind,
        reason,
    };

    let uri: Uri = url
        .parse()
        .map_err(|e: http::uri::InvalidUri| invalid(InvalidUriKind::ParseError, e.to_string()))?;
    if uri.authority().is_none() {
        return Err(invalid(
            InvalidUriKind::MissingAuthority,
            "missing host/authority".to_owned(),
        ));
    }

    let scheme = uri
        .scheme_str()
        .ok_or_else(|| invalid(InvalidUriKind::MissingScheme, "missing scheme".to_owned()))?;
    let allowed = match scheme {
        "https" => true,
        "http" => security == TransportSecurity::AllowInsecureHttp,
        _ => {
            return Err(HttpError::InvalidScheme {
                scheme: scheme.to_owned(),
                reason: "only http:// and https:// schemes are supported".to_owned(),
            });
        }
    };
    if !allowed {
        return Err(HttpError::InvalidScheme {
            scheme: scheme.to_owned(),
            reason: "HTTPS required (transport security is TlsOnly)".to_owned(),
        });
    }
    Ok(uri)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::HttpClientBuilder;
    use httpmock::prelude::*;

    #[test]
    fn targets_follow_transport_security() {
        assert!(parse_target("https://api-platform.cvent.com/ea", TransportSecurity::TlsOnly).is_ok());
        assert!(
            parse_target("http://localhost:1/ea", TransportSecurity::AllowInsecureHttp).is_ok()
        );

        let err = parse_target("http://localhost:1/ea", TransportSecurity::TlsOnly).unwrap_err();
        assert!(matches!(err, HttpError::InvalidScheme { ref scheme, .. } if scheme == "http"));

        let err =
            parse_target("ftp://host/file", TransportSecurity::AllowInsecureHttp).unwrap_err();
        assert!(matches!(err, HttpError::InvalidScheme { ref scheme, .. } if scheme == "ftp"));
    }

    #[tokio::test]
    async fn plain_http_rejected_when_tls_only() {
        let client = HttpClientBuilder::new().build().unwrap();
        let err = client
            .get("http://localhost:1/anything")
            .send()
            .await
            .unwrap_err();

        assert!(matches!(err, HttpError::InvalidScheme { ref scheme, .. } if scheme == "http"));
    }

    #[tokio::test]
    async fn relative_url_rejected() {
        let client = HttpClientBuilder::new().build().unwrap();
        let err = client.get("/ea/events").send().await.unwrap_err();

        assert!(matches!(
            err,
            HttpError::InvalidUri {
                kind: InvalidUriKind::MissingAuthority,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn invalid_header_is_deferred_to_send() {
        let client = HttpClientBuilder::new().build().unwrap();
        let err = client
            .get("https://example.com/")
            .header("bad header", "v")
            .header("accept", "application/json")
            .send()
            .await
            .unwrap_err();

        assert!(matches!(err, HttpError::InvalidHeaderName(_)));
    }

    #[tokio::test]
    async fn invalid_header_is_reported_by_form() {
        let client = HttpClientBuilder::new().build().unwrap();
        let result = client
            .post("https://example.com/")
            .sensitive_header("authorization", "bad\nvalue")
            .form(&[("a", "b")]);

        assert!(matches!(result, Err(HttpError::InvalidHeaderValue(_))));
    }

    #[tokio::test]
    async fn form_sets_content_type_unless_given() {
        let server = MockServer::start();
        let defaulted = server.mock(|when, then| {
            when.method(POST)
                .path("/token")
                .header("content-type", FORM_CONTENT_TYPE)
                .body("grant_type=client_credentials&client_id=a+b");
            then.status(200);
        });
        let explicit = server.mock(|when, then| {
            when.method(POST)
                .path("/custom")
                .header("content-type", "text/plain");
            then.status(200);
        });

        let client = HttpClientBuilder::new().allow_insecure_http().build().unwrap();
        client
            .post(&server.url("/token"))
            .form(&[("grant_type", "client_credentials"), ("client_id", "a b")])
            .unwrap()
            .send()
            .await
            .unwrap();
        client
            .post(&server.url("/custom"))
            .header("content-type", "text/plain")
            .form(&[("k", "v")])
            .unwrap()
            .send()
            .await
            .unwrap();

        defaulted.assert();
        explicit.assert();
    }
}
