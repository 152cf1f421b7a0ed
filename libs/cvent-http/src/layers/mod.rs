//! Tower layers for HTTP client middleware
//!
//! - [`DefaultHeadersLayer`] - Adds configured headers to requests that lack them
//! - [`RequestLogLayer`] - Wraps each request in a tracing span and logs its outcome

mod default_headers;
mod request_log;

pub use default_headers::{DefaultHeadersLayer, DefaultHeadersService};
pub use request_log::{RequestLogLayer, RequestLogService};
