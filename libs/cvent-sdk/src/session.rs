use std::fmt;
use std::sync::Arc;

use cvent_http::{HttpClient, HttpClientBuilder};
use tower::ServiceBuilder;
use tower::util::BoxCloneSyncService;

use crate::auth::{authenticate, token_endpoint};
use crate::config::{HttpOptions, SdkConfig, SdkOptions};
use crate::error::SdkError;
use crate::middleware::{ErrorsLayer, TokenAuthLayer};
use crate::model::{Attendee, Event};
use crate::repository::{Repository, Resource};
use crate::secret::SecretString;
use crate::service::{RegistrationApi, RegistrationService};

/// One authenticated connection to the API.
///
/// Holds the credentials it was built from, the bearer token, the merged
/// options and the fully wired registration client. Immutable once built;
/// the only mutable piece is the token inside [`auth_middleware`](Self::auth_middleware).
pub struct Session {
    client_id: String,
    client_secret: SecretString,
    token: SecretString,
    options: SdkOptions,
    http_options: HttpOptions,
    auth: TokenAuthLayer,
    repositories: RegistrationService,
    registration: Arc<dyn RegistrationApi>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret)
            .field("token", &self.token)
            .field("options", &self.options)
            .field("http_options", &self.http_options)
            .field("auth", &self.auth)
            .field("repositories", &self.repositories)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Validate `config`, authenticate if needed and wire the client stack.
    ///
    /// Steps, in order:
    /// 1. reject configurations with neither a token nor a full credential pair
    /// 2. copy `options.debug` into every HTTP group
    /// 3. obtain a token through the client-credentials flow unless one was given
    /// 4. build `errors(auth(transport))` and the repositories on top of it
    /// 5. hand the wired service to `options.services`, if it overrides it
    ///
    /// # Errors
    /// - [`SdkError::Configuration`] for missing credentials or a bad base URI
    /// - [`SdkError::InvalidCredentials`] if no token could be obtained
    /// - [`SdkError::Transport`] if the HTTP client cannot be built
    pub async fn establish(config: SdkConfig) -> Result<Self, SdkError> {
        let SdkConfig {
            client_id,
            client_secret,
            token,
            options,
            mut http,
        } = config;

        let token = token.filter(|t| !t.is_empty());
        if token.is_none() && (client_id.is_empty() || client_secret.is_empty()) {
            return Err(SdkError::Configuration("Empty credentials".to_owned()));
        }

        http.registration.debug |= options.debug;
        let group = &http.registration;

        let token = match token {
            Some(token) => token,
            None => {
                let client = HttpClientBuilder::with_config(group.client_config()).build()?;
                authenticate(
                    &client,
                    &token_endpoint(&group.base_uri),
                    &client_id,
                    &client_secret,
                    options.debug,
                )
                .await?
            }
        };

        let auth = TokenAuthLayer::new(token.clone());
        let errors = ErrorsLayer::new(options.error_handlers.clone());

        let client = HttpClientBuilder::with_config(group.client_config())
            .with_middleware({
                let auth = auth.clone();
                move |inner| {
                    BoxCloneSyncService::new(
                        ServiceBuilder::new()
                            .layer(errors)
                            .layer(auth)
                            .service(inner),
                    )
                }
            })
            .build()?;

        let repositories = RegistrationService::new(
            repository::<Attendee>(&client, &group.base_uri, &options)?,
            repository::<Event>(&client, &group.base_uri, &options)?,
        );
        let registration = options.services.build_registration(repositories.clone());

        tracing::info!(
            base_uri = %group.base_uri,
            client_credentials = !client_id.is_empty(),
            "session established"
        );

        Ok(Self {
            client_id,
            client_secret,
            token,
            options,
            http_options: http,
            auth,
            repositories,
            registration,
        })
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[must_use]
    pub fn client_secret(&self) -> &SecretString {
        &self.client_secret
    }

    /// Token obtained (or supplied) when the session was built.
    #[must_use]
    pub fn token(&self) -> &SecretString {
        &self.token
    }

    #[must_use]
    pub fn options(&self) -> &SdkOptions {
        &self.options
    }

    /// HTTP options after merging defaults, overrides and the debug flag.
    #[must_use]
    pub fn http_options(&self) -> &HttpOptions {
        &self.http_options
    }

    /// Token injection layer installed on the registration client.
    ///
    /// Use [`TokenAuthLayer::set_token`] to change the token sent on
    /// subsequent requests; [`token`](Self::token) keeps the original value.
    #[must_use]
    pub fn auth_middleware(&self) -> &TokenAuthLayer {
        &self.auth
    }

    /// Registration API of this session, honouring
    /// [`SdkOptions::services`](crate::SdkOptions::services).
    #[must_use]
    pub fn registration_service(&self) -> Arc<dyn RegistrationApi> {
        Arc::clone(&self.registration)
    }

    /// Repository-backed registration service wired for this session,
    /// whether or not an override replaced it.
    #[must_use]
    pub fn repositories(&self) -> &RegistrationService {
        &self.repositories
    }
}

fn repository<M: Resource>(
    client: &HttpClient,
    base_uri: &str,
    options: &SdkOptions,
) -> Result<Repository<M>, SdkError> {
    Repository::new(client.clone(), base_uri, options.params_for(M::NAME))
}
