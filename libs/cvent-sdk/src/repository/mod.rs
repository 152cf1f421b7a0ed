//! Resource repositories
//!
//! A [`Repository`] maps one resource type onto its collection endpoint
//! (`{base_uri}ea/{plural}`) and normalises the two response shapes:
//!
//! - single entity (`get`): the decoded payload, verbatim
//! - list (`all`): the `{ "data": [...], "paging": {...} }` envelope, unwrapped
//!   into payloads plus paging metadata

mod plural;
mod query;

use std::fmt;
use std::marker::PhantomData;

use cvent_http::HttpClient;
use serde_json::Value;
use url::Url;

use crate::config::API_VERSION;
use crate::error::SdkError;

pub use plural::pluralize;
pub use query::build_query;

/// Filter / parameter map sent as the list query string.
pub type Filters = serde_json::Map<String, Value>;

/// Paging metadata of the last list call.
pub type Metadata = serde_json::Map<String, Value>;

/// A remote resource type served by a [`Repository`].
pub trait Resource: Send + Sync + Sized + 'static {
    /// Singular resource name, e.g. `"event"`.
    const NAME: &'static str;

    /// Build the model from a raw payload.
    fn from_payload(payload: Value) -> Self;
}

/// `API_VERSION` followed by the plural of `resource`, e.g. `ea/events`.
#[must_use]
pub fn resource_path(resource: &str) -> String {
    format!("{API_VERSION}{}", pluralize(resource))
}

/// Read access to one resource collection.
pub struct Repository<M> {
    client: HttpClient,
    collection: Url,
    params: Filters,
    _model: PhantomData<fn() -> M>,
}

impl<M> Clone for Repository<M> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            collection: self.collection.clone(),
            params: self.params.clone(),
            _model: PhantomData,
        }
    }
}

impl<M: Resource> fmt::Debug for Repository<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("resource", &M::NAME)
            .field("collection", &self.collection.as_str())
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl<M: Resource> Repository<M> {
    /// Create a repository for `M` rooted at `base_uri`.
    ///
    /// `params` are fixed query parameters merged into every list call.
    ///
    /// # Errors
    /// Returns [`SdkError::Configuration`] if `base_uri` is not an absolute URL.
    pub fn new(client: HttpClient, base_uri: &str, params: Filters) -> Result<Self, SdkError> {
        let collection = collection_url(base_uri, &resource_path(M::NAME))?;
        Ok(Self {
            client,
            collection,
            params,
            _model: PhantomData,
        })
    }

    /// Path of the collection relative to the base URI, e.g. `ea/attendees`.
    #[must_use]
    pub fn resource_path(&self) -> String {
        resource_path(M::NAME)
    }

    /// Fixed query parameters of this repository.
    #[must_use]
    pub fn params(&self) -> &Filters {
        &self.params
    }

    /// Fetch one entity and return its payload as decoded.
    ///
    /// No envelope is unwrapped. An empty body yields `Value::Null`.
    ///
    /// # Errors
    /// Returns [`SdkError::Configuration`] for a blank `id`,
    /// [`SdkError::Http`] for an unhandled error status,
    /// [`SdkError::Transport`] for network failures and
    /// [`SdkError::Decode`] for a body that is not JSON.
    pub async fn get(&self, id: &str) -> Result<Value, SdkError> {
        // an empty segment would address the collection itself
        if id.trim().is_empty() {
            return Err(SdkError::Configuration("empty resource id".to_owned()));
        }

        let mut url = self.collection.clone();
        url.path_segments_mut()
            .map_err(|()| SdkError::Configuration("base uri cannot hold a path".to_owned()))?
            .push(id);

        tracing::debug!(resource = M::NAME, %id, "fetching entity");
        let body = self.client.get(url.as_str()).send().await?.bytes().await?;

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&body)?)
    }

    /// List payloads matching `filters`.
    ///
    /// `filters` are merged with the fixed parameters (filters win).
    /// `metadata` is cleared before the request; on success it holds the
    /// `paging` object of the response, or stays empty.
    ///
    /// # Errors
    /// Same as [`get`](Self::get).
    pub async fn all(
        &self,
        filters: &Filters,
        metadata: &mut Metadata,
    ) -> Result<Vec<Value>, SdkError> {
        metadata.clear();

        let query = build_query(filters, &self.params);
        let mut url = self.collection.clone();
        {
            let pairs = query::encode_query(&query);
            if !pairs.is_empty() {
                url.query_pairs_mut().extend_pairs(pairs);
            }
        }

        tracing::debug!(resource = M::NAME, filters = query.len(), "listing entities");
        let body = self.client.get(url.as_str()).send().await?.bytes().await?;

        parse_many(&body, metadata)
    }

    /// [`get`](Self::get), wrapped into the model.
    ///
    /// # Errors
    /// Same as [`get`](Self::get).
    pub async fn find_one(&self, id: &str) -> Result<M, SdkError> {
        self.get(id).await.map(M::from_payload)
    }

    /// [`all`](Self::all), wrapped into models.
    ///
    /// # Errors
    /// Same as [`get`](Self::get).
    pub async fn find_many(
        &self,
        filters: &Filters,
        metadata: &mut Metadata,
    ) -> Result<Vec<M>, SdkError> {
        let payloads = self.all(filters, metadata).await?;
        Ok(payloads.into_iter().map(M::from_payload).collect())
    }
}

fn collection_url(base_uri: &str, path: &str) -> Result<Url, SdkError> {
    let mut base = base_uri.to_owned();
    if !base.ends_with('/') {
        base.push('/');
    }
    let base = Url::parse(&base)
        .map_err(|e| SdkError::Configuration(format!("invalid base uri '{base_uri}': {e}")))?;
    if base.cannot_be_a_base() {
        return Err(SdkError::Configuration(format!(
            "invalid base uri '{base_uri}': not a hierarchical URL"
        )));
    }
    base.join(path)
        .map_err(|e| SdkError::Configuration(format!("invalid resource path '{path}': {e}")))
}

/// Unwrap a list envelope.
///
/// Empty bodies and any JSON that is not a non-empty object give `([], {})`.
/// A `paging` that is not an object gives `{}`; a `data` that is not an array
/// gives `[]`.
fn parse_many(body: &[u8], metadata: &mut Metadata) -> Result<Vec<Value>, SdkError> {
    metadata.clear();

    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    let Value::Object(mut envelope) = serde_json::from_slice::<Value>(body)? else {
        return Ok(Vec::new());
    };

    if let Some(Value::Object(paging)) = envelope.remove("paging") {
        *metadata = paging;
    }

    match envelope.remove("data") {
        Some(Value::Array(items)) => Ok(items),
        _ => Ok(Vec::new()),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    struct Thing;

    impl Resource for Thing {
        const NAME: &'static str = "category";

        fn from_payload(_payload: Value) -> Self {
            Thing
        }
    }

    fn parse(body: &str) -> (Vec<Value>, Metadata) {
        let mut metadata = Metadata::new();
        metadata.insert("stale".to_owned(), json!(true));
        let items = parse_many(body.as_bytes(), &mut metadata).unwrap();
        (items, metadata)
    }

    #[test]
    fn resource_path_is_versioned_plural() {
        assert_eq!(resource_path("attendee"), "ea/attendees");
        assert_eq!(resource_path("category"), "ea/categories");
    }

    #[test]
    fn collection_url_joins_base_and_path() {
        let url = collection_url("https://api.example.com/", "ea/events").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/ea/events");

        let url = collection_url("https://api.example.com/v2", "ea/events").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v2/ea/events");
    }

    #[test]
    fn collection_url_rejects_relative_base() {
        assert!(matches!(
            collection_url("api.example.com", "ea/events"),
            Err(SdkError::Configuration(_))
        ));
        assert!(matches!(
            collection_url("mailto:someone@example.com", "ea/events"),
            Err(SdkError::Configuration(_))
        ));
    }

    #[test]
    fn envelope_is_unwrapped() {
        let (items, metadata) = parse(r#"{"data":[{"id":1}],"paging":{"page":1}}"#);
        assert_eq!(items, vec![json!({"id": 1})]);
        assert_eq!(Value::Object(metadata), json!({"page": 1}));
    }

    #[test]
    fn empty_payloads_give_empty_results() {
        for body in ["", "  ", "null", "{}", "[]", "42", r#""text""#] {
            let (items, metadata) = parse(body);
            assert!(items.is_empty(), "items for {body:?}");
            assert!(metadata.is_empty(), "metadata for {body:?}");
        }
    }

    #[test]
    fn malformed_envelope_members_are_normalised() {
        let (items, metadata) = parse(r#"{"data":{"id":1},"paging":[1,2]}"#);
        assert!(items.is_empty());
        assert!(metadata.is_empty());

        let (items, metadata) = parse(r#"{"paging":{"total":0}}"#);
        assert!(items.is_empty());
        assert_eq!(Value::Object(metadata), json!({"total": 0}));
    }

    #[test]
    fn invalid_json_is_a_decode_error() {
        let mut metadata = Metadata::new();
        let err = parse_many(b"<html>", &mut metadata).unwrap_err();
        assert!(matches!(err, SdkError::Decode(_)));
    }

    #[tokio::test]
    async fn blank_id_is_rejected_before_any_request() {
        let client = cvent_http::HttpClient::new().unwrap();
        // unroutable host: reaching the network would fail differently
        let repo = Repository::<Thing>::new(client, "https://invalid.invalid/", Filters::new())
            .unwrap();

        for id in ["", "  "] {
            let err = repo.get(id).await.unwrap_err();
            assert!(
                matches!(err, SdkError::Configuration(ref msg) if msg == "empty resource id"),
                "id {id:?}: {err:?}"
            );
        }
    }

    #[test]
    fn debug_names_the_resource() {
        let client = cvent_http::HttpClient::new().unwrap();
        let repo = Repository::<Thing>::new(client, "https://api.example.com/", Filters::new())
            .unwrap();
        let rendered = format!("{repo:?}");
        assert!(rendered.contains("category"));
        assert!(rendered.contains("https://api.example.com/ea/categories"));
        assert_eq!(repo.resource_path(), "ea/categories");
    }
}
