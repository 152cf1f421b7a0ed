use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::time::Duration;

use cvent_http::{HttpClientConfig, TransportSecurity};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::Deserialize;

use crate::error::SdkError;
use crate::middleware::ErrorHandlers;
use crate::repository::Filters;
use crate::secret::SecretString;
use crate::service::ServiceOverrides;

/// Default API host.
pub const BASE_URL: &str = "https://api-platform.cvent.com/";

/// Version prefix of every API path.
pub const API_VERSION: &str = "ea/";

/// Prefix of environment variables read by [`SdkConfig::load`].
pub const ENV_PREFIX: &str = "CVENT__";

/// Top-level keys whose environment values are taken verbatim, never parsed
/// as numbers or booleans.
const OPAQUE_KEYS: [&str; 3] = ["client_id", "client_secret", "token"];

/// Everything needed to open a session.
///
/// Either `token` or both `client_id` and `client_secret` must be non-empty.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SdkConfig {
    #[serde(deserialize_with = "crate::scalar_string::deserialize")]
    pub client_id: String,
    pub client_secret: SecretString,
    /// Pre-obtained bearer token; when set, no authentication request is made.
    pub token: Option<SecretString>,
    pub options: SdkOptions,
    pub http: HttpOptions,
}

impl SdkConfig {
    /// Load configuration from an optional YAML file and the environment.
    ///
    /// Layers, later ones winning: defaults, the YAML file (if `path` is
    /// given), then `CVENT__*` environment variables with nested keys split on
    /// `__` (e.g. `CVENT__HTTP__REGISTRATION__BASE_URI`). `CVENT__CLIENT_ID`,
    /// `CVENT__CLIENT_SECRET` and `CVENT__TOKEN` are read as raw strings, so
    /// `00123` stays `00123`.
    ///
    /// # Errors
    /// Returns [`SdkError::Config`] if a source cannot be read or a value has
    /// the wrong shape.
    pub fn load(path: Option<&Path>) -> Result<Self, SdkError> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        let env = Env::prefixed(ENV_PREFIX).split("__");
        figment = figment.merge(env.clone().ignore(&OPAQUE_KEYS));
        for (key, value) in env.only(&OPAQUE_KEYS).iter() {
            figment = figment.merge(Serialized::default(key.as_str(), value));
        }
        Ok(figment.extract()?)
    }
}

/// Behavioural switches for a session.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SdkOptions {
    /// Log the swallowed authentication failure and every outbound request.
    pub debug: bool,
    /// Fixed query parameters per resource name (e.g. `"event"`).
    ///
    /// Caller filters override these on key collision.
    pub repository_params: HashMap<String, Filters>,
    /// Replacement responses for specific error statuses. Code only.
    #[serde(skip)]
    pub error_handlers: ErrorHandlers,
    /// Replacement services handed out by the session. Code only.
    #[serde(skip)]
    pub services: ServiceOverrides,
}

impl SdkOptions {
    /// Fixed query parameters configured for `resource`.
    #[must_use]
    pub fn params_for(&self, resource: &str) -> Filters {
        self.repository_params
            .get(resource)
            .cloned()
            .unwrap_or_default()
    }
}

/// Transport settings per API group.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HttpOptions {
    pub registration: GroupHttpOptions,
}

/// Transport settings for one API group.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GroupHttpOptions {
    /// Base URI every path is joined onto (default [`BASE_URL`]).
    pub base_uri: String,
    /// Headers sent when a request does not set them itself.
    ///
    /// A configured map replaces the defaults as a whole.
    pub headers: BTreeMap<String, String>,
    #[serde(with = "crate::humantime_serde")]
    pub timeout: Duration,
    /// Overrides the transport's default User-Agent.
    pub user_agent: Option<String>,
    /// Accept `http://` base URIs. Meant for local mock servers.
    pub allow_insecure_http: bool,
    /// Log every request of this group.
    pub debug: bool,
}

impl Default for GroupHttpOptions {
    fn default() -> Self {
        Self {
            base_uri: BASE_URL.to_owned(),
            headers: default_headers(),
            timeout: Duration::from_secs(30),
            user_agent: None,
            allow_insecure_http: false,
            debug: false,
        }
    }
}

impl GroupHttpOptions {
    /// Translate into a transport configuration.
    #[must_use]
    pub fn client_config(&self) -> HttpClientConfig {
        let mut config = HttpClientConfig {
            request_timeout: self.timeout,
            default_headers: self
                .headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            debug: self.debug,
            ..HttpClientConfig::default()
        };
        if let Some(user_agent) = &self.user_agent {
            config.user_agent.clone_from(user_agent);
        }
        if self.allow_insecure_http {
            config.transport = TransportSecurity::AllowInsecureHttp;
        }
        config
    }
}

fn default_headers() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("Accept".to_owned(), "application/json".to_owned()),
        (
            "Content-Type".to_owned(),
            "application/x-www-form-urlencoded".to_owned(),
        ),
    ])
}
