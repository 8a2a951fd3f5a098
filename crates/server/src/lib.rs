//! ShopX API server library.
//!
//! Multi-vendor marketplace backend: customers shop from many sellers in
//! one cart, sellers run their own shops, admins run the platform. The
//! binary in `main.rs` is a thin wrapper around [`app`] and [`jobs`]; the
//! CLI and the integration tests use the same pieces.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod jobs;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{Router, extract::Request, middleware::from_fn};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// The full application: routes plus the outer middleware stack.
pub fn app(state: AppState) -> Router {
    let cors = middleware::cors_layer(&state.config().cors_origins);

    routes::routes()
        .layer(from_fn(middleware::security_headers_middleware))
        .layer(cors)
        .layer(from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                path = %request.uri().path(),
                request_id = tracing::field::Empty,
                user_id = tracing::field::Empty,
            )
        }))
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
