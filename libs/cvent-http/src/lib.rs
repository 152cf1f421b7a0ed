#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! HTTP transport for the Cvent SDK
//!
//! This crate provides a hyper-based HTTP client with:
//! - TLS via rustls (HTTPS only by default)
//! - Connection pooling
//! - A per-request timeout
//! - Default headers, including User-Agent
//! - Transparent response decompression (gzip, brotli, deflate)
//! - An optional request log built on `tracing`
//! - A single hook for caller-supplied tower middleware
//!
//! Every HTTP status is returned as `Ok(response)`. Turning a status into an
//! error is left to middleware installed through
//! [`HttpClientBuilder::with_middleware`].
//!
//! # Example
//!
//! ```ignore
//! use cvent_http::HttpClient;
//! use std::time::Duration;
//!
//! let client = HttpClient::builder()
//!     .timeout(Duration::from_secs(10))
//!     .default_header("accept", "application/json")
//!     .build()?;
//!
//! let data: serde_json::Value = client
//!     .get("https://api-platform.cvent.com/ea/events")
//!     .send()
//!     .await?
//!     .json()
//!     .await?;
//! ```

mod builder;
mod client;
mod config;
mod error;
mod layers;
mod request;
mod response;
mod tls;

pub use builder::HttpClientBuilder;
pub use client::{HttpClient, InnerService};
pub use config::{DEFAULT_MAX_BODY_SIZE, DEFAULT_USER_AGENT, HttpClientConfig, TransportSecurity};
pub use error::{HttpError, InvalidUriKind};
pub use layers::{DefaultHeadersLayer, DefaultHeadersService, RequestLogLayer, RequestLogService};
pub use request::RequestBuilder;
pub use response::{
    ERROR_BODY_PREVIEW_LIMIT, HttpResponse, ResponseBody, body_from_bytes, read_body_limited,
};
