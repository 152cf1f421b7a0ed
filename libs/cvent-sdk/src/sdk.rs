use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tokio::sync::Mutex;

use crate::config::{HttpOptions, SdkConfig, SdkOptions};
use crate::error::SdkError;
use crate::secret::SecretString;
use crate::service::RegistrationApi;
use crate::session::Session;

/// Owner of the single active [`Session`].
///
/// Create one `Sdk` at application start and pass it (or an `Arc` of it) to
/// whoever needs the API. Installing a session replaces the previous one;
/// readers holding an `Arc<Session>` keep using the old one until they drop it.
///
/// ```ignore
/// let sdk = Sdk::new();
/// sdk.set_credentials("client-id", "client-secret", SdkOptions::default(), HttpOptions::default())
///     .await?;
///
/// let mut paging = Metadata::new();
/// let events = sdk.registration_service()?.find_events(&filters, &mut paging).await?;
/// ```
#[derive(Debug, Default)]
pub struct Sdk {
    current: ArcSwapOption<Session>,
    /// Serialises session construction so two authentications never interleave.
    install: Mutex<()>,
}

impl Sdk {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session with the client-credentials flow.
    ///
    /// # Errors
    /// - [`SdkError::Configuration`] if `client_id` or `client_secret` is empty
    /// - [`SdkError::InvalidCredentials`] if the token endpoint hands out no token
    pub async fn set_credentials(
        &self,
        client_id: impl Into<String>,
        client_secret: impl Into<SecretString>,
        options: SdkOptions,
        http_options: HttpOptions,
    ) -> Result<Arc<Session>, SdkError> {
        self.install(SdkConfig {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token: None,
            options,
            http: http_options,
        })
        .await
    }

    /// Open a session with a pre-obtained bearer token. No authentication request is made.
    ///
    /// # Errors
    /// Returns [`SdkError::Configuration`] if `token` is empty.
    pub async fn set_auth_token(
        &self,
        token: impl Into<SecretString>,
        options: SdkOptions,
        http_options: HttpOptions,
    ) -> Result<Arc<Session>, SdkError> {
        self.install(SdkConfig {
            client_id: String::new(),
            client_secret: SecretString::default(),
            token: Some(token.into()),
            options,
            http: http_options,
        })
        .await
    }

    /// Open a session from loaded configuration.
    ///
    /// A non-empty `token` takes the [`set_auth_token`](Self::set_auth_token)
    /// path, anything else [`set_credentials`](Self::set_credentials).
    ///
    /// # Errors
    /// Same as [`set_credentials`](Self::set_credentials).
    pub async fn connect(&self, config: SdkConfig) -> Result<Arc<Session>, SdkError> {
        match config.token {
            Some(token) if !token.is_empty() => {
                self.set_auth_token(token, config.options, config.http).await
            }
            _ => {
                self.set_credentials(
                    config.client_id,
                    config.client_secret,
                    config.options,
                    config.http,
                )
                .await
            }
        }
    }

    /// Whether a session is installed. Says nothing about token validity.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.current.load().is_some()
    }

    /// The active session.
    ///
    /// # Errors
    /// Returns [`SdkError::UninitializedSession`] if none is installed.
    pub fn session(&self) -> Result<Arc<Session>, SdkError> {
        self.current.load_full().ok_or(SdkError::UninitializedSession)
    }

    /// # Errors
    /// Returns [`SdkError::UninitializedSession`] if no session is installed.
    pub fn client_id(&self) -> Result<String, SdkError> {
        Ok(self.session()?.client_id().to_owned())
    }

    /// # Errors
    /// Returns [`SdkError::UninitializedSession`] if no session is installed.
    pub fn client_secret(&self) -> Result<SecretString, SdkError> {
        Ok(self.session()?.client_secret().clone())
    }

    /// # Errors
    /// Returns [`SdkError::UninitializedSession`] if no session is installed.
    pub fn token(&self) -> Result<SecretString, SdkError> {
        Ok(self.session()?.token().clone())
    }

    /// # Errors
    /// Returns [`SdkError::UninitializedSession`] if no session is installed.
    pub fn options(&self) -> Result<SdkOptions, SdkError> {
        Ok(self.session()?.options().clone())
    }

    /// # Errors
    /// Returns [`SdkError::UninitializedSession`] if no session is installed.
    pub fn http_options(&self) -> Result<HttpOptions, SdkError> {
        Ok(self.session()?.http_options().clone())
    }

    /// # Errors
    /// Returns [`SdkError::UninitializedSession`] if no session is installed.
    pub fn registration_service(&self) -> Result<Arc<dyn RegistrationApi>, SdkError> {
        Ok(self.session()?.registration_service())
    }

    async fn install(&self, config: SdkConfig) -> Result<Arc<Session>, SdkError> {
        let _guard = self.install.lock().await;

        let session = Arc::new(Session::establish(config).await?);
        if self.current.swap(Some(Arc::clone(&session))).is_some() {
            tracing::debug!("replaced previous session");
        }
        Ok(session)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn accessors_fail_before_a_session_exists() {
        let sdk = Sdk::new();
        assert!(!sdk.is_authenticated());
        assert!(matches!(sdk.session(), Err(SdkError::UninitializedSession)));
        assert!(matches!(sdk.client_id(), Err(SdkError::UninitializedSession)));
        assert!(matches!(sdk.client_secret(), Err(SdkError::UninitializedSession)));
        assert!(matches!(sdk.token(), Err(SdkError::UninitializedSession)));
        assert!(matches!(sdk.options(), Err(SdkError::UninitializedSession)));
        assert!(matches!(sdk.http_options(), Err(SdkError::UninitializedSession)));
        assert!(matches!(
            sdk.registration_service(),
            Err(SdkError::UninitializedSession)
        ));
    }

    #[tokio::test]
    async fn set_auth_token_installs_session() {
        let sdk = Sdk::new();
        sdk.set_auth_token("tok", SdkOptions::default(), HttpOptions::default())
            .await
            .unwrap();

        assert!(sdk.is_authenticated());
        assert_eq!(sdk.token().unwrap().expose(), "tok");
        assert!(sdk.client_id().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_construction_keeps_previous_session() {
        let sdk = Sdk::new();
        sdk.set_auth_token("first", SdkOptions::default(), HttpOptions::default())
            .await
            .unwrap();

        let err = sdk
            .set_credentials("", "", SdkOptions::default(), HttpOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SdkError::Configuration(_)));
        assert_eq!(sdk.token().unwrap().expose(), "first");
    }

    #[tokio::test]
    async fn last_writer_wins() {
        let sdk = Sdk::new();
        let first = sdk
            .set_auth_token("first", SdkOptions::default(), HttpOptions::default())
            .await
            .unwrap();
        sdk.set_auth_token("second", SdkOptions::default(), HttpOptions::default())
            .await
            .unwrap();

        assert_eq!(sdk.token().unwrap().expose(), "second");
        // holders of the old session are unaffected
        assert_eq!(first.token().expose(), "first");
    }

    #[tokio::test]
    async fn connect_prefers_token() {
        let sdk = Sdk::new();
        let config = SdkConfig {
            token: Some(SecretString::new("cfg-token")),
            ..SdkConfig::default()
        };

        sdk.connect(config).await.unwrap();
        assert_eq!(sdk.token().unwrap().expose(), "cfg-token");
    }

    #[tokio::test]
    async fn connect_without_anything_is_a_configuration_error() {
        let sdk = Sdk::new();
        let err = sdk.connect(SdkConfig::default()).await.unwrap_err();
        assert!(matches!(err, SdkError::Configuration(_)));
        assert!(!sdk.is_authenticated());
    }
}
