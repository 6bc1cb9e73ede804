/// Middleware module
///
/// Bearer token authentication for protected routes.

mod bearer_auth;

pub use bearer_auth::{extract_bearer_token, BearerAuth};
