//! HTTP middleware stack for the API server.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transaction)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (recorded on the span, echoed in the response)
//! 4. CORS
//! 5. Security headers
//! 6. Rate limiting (governor), per route group
//!
//! Authentication is done by extractors in [`auth`], not by a layer.

pub mod auth;
pub mod cors;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;

pub use auth::{OptionalAuth, RequireAdmin, RequireAuth, RequireSeller};
pub use cors::cors_layer;
pub use rate_limit::{api_rate_limiter, auth_rate_limiter};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
pub use security_headers::security_headers_middleware;
