use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use cvent_http::{HttpClient, HttpError};
use http::header::AUTHORIZATION;
use serde::Deserialize;
use zeroize::Zeroizing;

use crate::config::API_VERSION;
use crate::error::SdkError;
use crate::secret::SecretString;

/// Body of the token endpoint response.
///
/// `Deserialize`-only so the token never ends up serialized into logs.
#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

/// Token endpoint under `base_uri`.
#[must_use]
pub fn token_endpoint(base_uri: &str) -> String {
    let separator = if base_uri.ends_with('/') { "" } else { "/" };
    format!("{base_uri}{separator}{API_VERSION}oauth2/token")
}

/// Exchange client credentials for a bearer token.
///
/// Sends `POST {endpoint}` with `Authorization: Basic base64(id:secret)` and
/// the form `grant_type=client_credentials&client_id={id}`.
///
/// A request that fails in transport or answers with a non-success status is
/// swallowed (logged at `error` when `debug` is set) and treated as "no token".
///
/// # Errors
/// Returns [`SdkError::InvalidCredentials`] unless the response is a JSON
/// object with a non-empty `access_token`.
pub async fn authenticate(
    client: &HttpClient,
    endpoint: &str,
    client_id: &str,
    client_secret: &SecretString,
    debug: bool,
) -> Result<SecretString, SdkError> {
    let body = match request_token(client, endpoint, client_id, client_secret).await {
        Ok(body) => Some(body),
        Err(e) => {
            if debug {
                tracing::error!(error = %e, endpoint, "authentication request failed");
            }
            None
        }
    };

    let token = body
        .and_then(|body| serde_json::from_slice::<TokenResponse>(&body).ok())
        .and_then(|response| response.access_token)
        .filter(|token| !token.is_empty())
        .ok_or(SdkError::InvalidCredentials)?;

    tracing::debug!(endpoint, "obtained access token");
    Ok(SecretString::new(token))
}

async fn request_token(
    client: &HttpClient,
    endpoint: &str,
    client_id: &str,
    client_secret: &SecretString,
) -> Result<Bytes, HttpError> {
    // Intermediates hold the plaintext secret; scrub them on drop.
    let credentials = Zeroizing::new(format!("{client_id}:{}", client_secret.expose()));
    let encoded = Zeroizing::new(general_purpose::STANDARD.encode(credentials.as_bytes()));
    let header_value = Zeroizing::new(format!("Basic {}", &*encoded));

    let response = client
        .post(endpoint)
        .sensitive_header(AUTHORIZATION.as_str(), &header_value)
        .form(&[
            ("grant_type", "client_credentials"),
            ("client_id", client_id),
        ])?
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let headers = response.headers().clone();
        let body = response.bytes().await.unwrap_or_default();
        return Err(HttpError::HttpStatus {
            method: http::Method::POST,
            url: endpoint.to_owned(),
            status,
            headers,
            body_preview: String::from_utf8_lossy(&body).into_owned(),
        });
    }

    response.bytes().await
}
