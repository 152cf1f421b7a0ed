//! Request pipeline middleware for the registration client
//!
//! - [`TokenAuthLayer`] - attaches `Authorization: Bearer <token>`
//! - [`ErrorsLayer`] - maps error statuses to a registered handler or an error
//!
//! The session wires them as `errors(auth(transport))`.

mod errors;
mod token_auth;

pub use errors::{ErrorHandler, ErrorHandlers, ErrorsLayer, ErrorsService};
pub use token_auth::{TokenAuthLayer, TokenAuthService};
