#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! Client SDK for the Cvent registration platform
//!
//! - [`Sdk`] owns the single active [`Session`], created with
//!   [`Sdk::set_credentials`] (`OAuth2` client credentials) or
//!   [`Sdk::set_auth_token`] (pre-obtained token)
//! - every request of a session goes through
//!   `ErrorsLayer(TokenAuthLayer(transport))`
//! - [`Repository`] maps a resource onto its collection endpoint and unwraps
//!   list envelopes into payloads plus paging [`Metadata`]
//! - [`RegistrationService`] exposes attendees and events; a replacement can
//!   be installed through [`SdkOptions::services`]
//!
//! # Example
//!
//! ```ignore
//! use cvent_sdk::{Filters, Metadata, RegistrationApi, Sdk, SdkConfig};
//!
//! let sdk = Sdk::new();
//! sdk.connect(SdkConfig::load(Some("cvent.yaml".as_ref()))?).await?;
//!
//! let mut filters = Filters::new();
//! filters.insert("city".into(), "NYC".into());
//! let mut paging = Metadata::new();
//! let events = sdk
//!     .registration_service()?
//!     .find_events(&filters, &mut paging)
//!     .await?;
//! ```

mod auth;
mod config;
mod error;
pub mod humantime_serde;
pub mod middleware;
mod model;
pub mod repository;
mod scalar_string;
mod sdk;
mod secret;
mod service;
mod session;

pub use auth::{authenticate, token_endpoint};
pub use config::{
    API_VERSION, BASE_URL, ENV_PREFIX, GroupHttpOptions, HttpOptions, SdkConfig, SdkOptions,
};
pub use error::SdkError;
pub use middleware::{ErrorHandler, ErrorHandlers, ErrorsLayer, TokenAuthLayer};
pub use model::{Attendee, Event};
pub use repository::{Filters, Metadata, Repository, Resource, build_query};
pub use sdk::Sdk;
pub use secret::SecretString;
pub use service::{RegistrationApi, RegistrationFactory, RegistrationService, ServiceOverrides};
pub use session::Session;

// Types needed to write error handlers without depending on the transport crate.
pub use cvent_http::{HttpError, ResponseBody, body_from_bytes};
pub use http::{Response, StatusCode};
