//! Full client-credentials round trip.
//!
//! Wires up: mock token endpoint → `Sdk::set_credentials` → registration
//! service → mock events endpoint, and verifies the bearer header, the
//! envelope unwrapping and the paging metadata.

use cvent_sdk::{
    Filters, GroupHttpOptions, HttpOptions, Metadata, RegistrationApi, Sdk, SdkError, SdkOptions,
};
use httpmock::prelude::*;
use serde_json::{Value, json};

fn http_options(server: &MockServer) -> HttpOptions {
    HttpOptions {
        registration: GroupHttpOptions {
            base_uri: server.base_url(),
            allow_insecure_http: true,
            ..GroupHttpOptions::default()
        },
    }
}

fn filters(value: Value) -> Filters {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

#[tokio::test]
async fn credentials_then_find_events() {
    let server = MockServer::start();

    let token_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/ea/oauth2/token")
            .header("authorization", "Basic aWQ6c2VjcmV0")
            .body_includes("grant_type=client_credentials");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"access_token":"tok"}"#);
    });

    let events_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/ea/events")
            .query_param("city", "NYC")
            .header("authorization", "Bearer tok")
            .header("accept", "application/json");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"data":[{"id":"e1"}],"paging":{"total":1}}"#);
    });

    let sdk = Sdk::new();
    sdk.set_credentials("id", "secret", SdkOptions::default(), http_options(&server))
        .await
        .unwrap();

    assert!(sdk.is_authenticated());
    assert_eq!(sdk.token().unwrap().expose(), "tok");

    let mut metadata = Metadata::new();
    let events = sdk
        .registration_service()
        .unwrap()
        .find_events(&filters(json!({"city": "NYC"})), &mut metadata)
        .await
        .unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id(), Some(&json!("e1")));
    assert_eq!(Value::Object(metadata), json!({"total": 1}));

    token_mock.assert_calls(1);
    events_mock.assert_calls(1);
}

#[tokio::test]
async fn attendees_thread_metadata_too() {
    let server = MockServer::start();
    let _m = server.mock(|when, then| {
        when.method(GET)
            .path("/ea/attendees")
            .header("authorization", "Bearer given");
        then.status(200)
            .body(r#"{"data":[{"id":"a1"},{"id":"a2"}],"paging":{"nextToken":"n2"}}"#);
    });

    let sdk = Sdk::new();
    sdk.set_auth_token("given", SdkOptions::default(), http_options(&server))
        .await
        .unwrap();

    let mut metadata = Metadata::new();
    let attendees = sdk
        .registration_service()
        .unwrap()
        .find_attendees(&Filters::new(), &mut metadata)
        .await
        .unwrap();

    assert_eq!(attendees.len(), 2);
    assert_eq!(metadata["nextToken"], "n2");
}

#[tokio::test]
async fn rejected_credentials_leave_no_session() {
    let server = MockServer::start();
    let token_mock = server.mock(|when, then| {
        when.method(POST).path("/ea/oauth2/token");
        then.status(200).body("{}");
    });

    let sdk = Sdk::new();
    let err = sdk
        .set_credentials("id", "secret", SdkOptions::default(), http_options(&server))
        .await
        .unwrap_err();

    assert!(matches!(err, SdkError::InvalidCredentials));
    assert_eq!(err.status().map(|s| s.as_u16()), Some(401));
    assert!(!sdk.is_authenticated());
    token_mock.assert_calls(1);
}

#[tokio::test]
async fn token_session_never_calls_token_endpoint() {
    let server = MockServer::start();
    let token_mock = server.mock(|when, then| {
        when.method(POST).path("/ea/oauth2/token");
        then.status(200).body(r#"{"access_token":"unused"}"#);
    });
    let event_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/ea/events/e1")
            .header("authorization", "Bearer given");
        then.status(200).body(r#"{"id":"e1","title":"Launch"}"#);
    });

    let sdk = Sdk::new();
    sdk.set_auth_token("given", SdkOptions::default(), http_options(&server))
        .await
        .unwrap();

    let event = sdk
        .registration_service()
        .unwrap()
        .get_event("e1")
        .await
        .unwrap();

    assert_eq!(event.get("title"), Some(&json!("Launch")));
    token_mock.assert_calls(0);
    event_mock.assert_calls(1);
}
