/// Middleware modules for the API server
///
/// - `auth`: bearer token authentication and the manager gate
/// - `errors`: exposes internal error details outside production
/// - `security`: security response headers

pub mod auth;
pub mod errors;
pub mod security;
