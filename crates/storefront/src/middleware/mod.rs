//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, capture errors)
//! 2. Path normalization (trailing slash)
//! 3. `TraceLayer` (request tracing)
//! 4. Request ID (add unique ID to each request)
//! 5. Security headers
//! 6. Auth gate (bearer token to `Subject`)

pub mod auth;
pub mod request_id;
pub mod security_headers;

pub use auth::{RequireAuth, Subject, auth_gate};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
