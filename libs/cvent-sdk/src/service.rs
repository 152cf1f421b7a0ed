use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::SdkError;
use crate::model::{Attendee, Event};
use crate::repository::{Filters, Metadata, Repository};

/// Registration operations of the API.
///
/// Object-safe so callers can hold an `Arc<dyn RegistrationApi>` and swap in
/// a double for tests.
#[async_trait]
pub trait RegistrationApi: Send + Sync {
    /// Fetch one attendee by id.
    async fn get_attendee(&self, id: &str) -> Result<Attendee, SdkError>;

    /// List attendees matching `filters`; paging metadata lands in `metadata`.
    async fn find_attendees(
        &self,
        filters: &Filters,
        metadata: &mut Metadata,
    ) -> Result<Vec<Attendee>, SdkError>;

    /// Fetch one event by id.
    async fn get_event(&self, id: &str) -> Result<Event, SdkError>;

    /// List events matching `filters`; paging metadata lands in `metadata`.
    async fn find_events(
        &self,
        filters: &Filters,
        metadata: &mut Metadata,
    ) -> Result<Vec<Event>, SdkError>;
}

/// [`RegistrationApi`] backed by the attendee and event repositories.
#[derive(Clone, Debug)]
pub struct RegistrationService {
    attendees: Repository<Attendee>,
    events: Repository<Event>,
}

impl RegistrationService {
    #[must_use]
    pub fn new(attendees: Repository<Attendee>, events: Repository<Event>) -> Self {
        Self { attendees, events }
    }

    #[must_use]
    pub fn attendees(&self) -> &Repository<Attendee> {
        &self.attendees
    }

    #[must_use]
    pub fn events(&self) -> &Repository<Event> {
        &self.events
    }
}

#[async_trait]
impl RegistrationApi for RegistrationService {
    async fn get_attendee(&self, id: &str) -> Result<Attendee, SdkError> {
        self.attendees.find_one(id).await
    }

    async fn find_attendees(
        &self,
        filters: &Filters,
        metadata: &mut Metadata,
    ) -> Result<Vec<Attendee>, SdkError> {
        self.attendees.find_many(filters, metadata).await
    }

    async fn get_event(&self, id: &str) -> Result<Event, SdkError> {
        self.events.find_one(id).await
    }

    async fn find_events(
        &self,
        filters: &Filters,
        metadata: &mut Metadata,
    ) -> Result<Vec<Event>, SdkError> {
        self.events.find_many(filters, metadata).await
    }
}

/// Builds the registration API a session hands out, given the wired default.
///
/// The argument carries the session's repositories (and through them the
/// authenticated client), so a replacement can decorate or delegate to it.
pub type RegistrationFactory =
    Arc<dyn Fn(RegistrationService) -> Arc<dyn RegistrationApi> + Send + Sync>;

/// Caller-supplied replacements for the services a session exposes.
#[derive(Clone, Default)]
pub struct ServiceOverrides {
    registration: Option<RegistrationFactory>,
}

impl ServiceOverrides {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the registration service with whatever `factory` returns.
    #[must_use]
    pub fn registration<F>(mut self, factory: F) -> Self
    where
        F: Fn(RegistrationService) -> Arc<dyn RegistrationApi> + Send + Sync + 'static,
    {
        self.registration = Some(Arc::new(factory));
        self
    }

    /// The registration API for a session: the override if one is set,
    /// `wired` otherwise.
    #[must_use]
    pub fn build_registration(&self, wired: RegistrationService) -> Arc<dyn RegistrationApi> {
        match &self.registration {
            Some(factory) => factory(wired),
            None => Arc::new(wired),
        }
    }
}

impl fmt::Debug for ServiceOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceOverrides")
            .field("registration", &self.registration.is_some())
            .finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    struct Canned;

    #[async_trait]
    impl RegistrationApi for Canned {
        async fn get_attendee(&self, id: &str) -> Result<Attendee, SdkError> {
            Ok(Attendee::from(serde_json::Map::from_iter([(
                "id".to_owned(),
                json!(id),
            )])))
        }

        async fn find_attendees(
            &self,
            _filters: &Filters,
            metadata: &mut Metadata,
        ) -> Result<Vec<Attendee>, SdkError> {
            metadata.clear();
            Ok(Vec::new())
        }

        async fn get_event(&self, _id: &str) -> Result<Event, SdkError> {
            Err(SdkError::UninitializedSession)
        }

        async fn find_events(
            &self,
            _filters: &Filters,
            metadata: &mut Metadata,
        ) -> Result<Vec<Event>, SdkError> {
            metadata.insert("source".to_owned(), json!("canned"));
            Ok(Vec::new())
        }
    }

    fn wired() -> RegistrationService {
        let client = cvent_http::HttpClient::new().unwrap();
        let base = "https://api.example.com/";
        RegistrationService::new(
            Repository::new(client.clone(), base, Filters::new()).unwrap(),
            Repository::new(client, base, Filters::new()).unwrap(),
        )
    }

    #[tokio::test]
    async fn override_replaces_the_wired_service() {
        let overrides = ServiceOverrides::new().registration(|_wired| Arc::new(Canned));
        let api = overrides.build_registration(wired());

        let attendee = api.get_attendee("a9").await.unwrap();
        assert_eq!(attendee.id(), Some(&json!("a9")));

        let mut metadata = Metadata::new();
        api.find_events(&Filters::new(), &mut metadata).await.unwrap();
        assert_eq!(metadata["source"], "canned");
    }

    #[test]
    fn factory_receives_the_wired_repositories() {
        let overrides = ServiceOverrides::new().registration(|wired| {
            assert_eq!(wired.events().resource_path(), "ea/events");
            assert_eq!(wired.attendees().resource_path(), "ea/attendees");
            Arc::new(wired)
        });
        let _api = overrides.build_registration(wired());
    }

    #[test]
    fn debug_reports_presence_only() {
        assert_eq!(
            format!("{:?}", ServiceOverrides::new()),
            "ServiceOverrides { registration: false }"
        );
        let set = ServiceOverrides::new().registration(|wired| Arc::new(wired));
        assert!(format!("{set:?}").contains("registration: true"));
    }
}
