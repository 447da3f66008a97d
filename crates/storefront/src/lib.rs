//! Gallery Storefront library.
//!
//! An art gallery storefront served as a JSON API: catalog browsing, a
//! persistent cart, a three-step checkout and per-user profiles. The crate
//! is a library so the router can be driven directly in tests.
//!
//! # Modules
//!
//! - [`storage`] - Per-visitor key-value stores (memory, files)
//! - [`catalog`] - Read-only artwork catalog
//! - [`cart`] - Cart engine over a store
//! - [`checkout`] - Checkout state machine and auto-close timer
//! - [`profile`] - Profile fields and avatars
//! - [`services`] - Identity providers
//! - [`visitor`] - Per-browser state and its registry
//! - [`routes`] - HTTP handlers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod middleware;
pub mod profile;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;
pub mod visitor;

use axum::{Router, extract::Request, routing::get};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the storefront router with its middleware stack.
pub fn app(state: AppState) -> Router {
    let session_layer =
        middleware::create_session_layer(state.sessions().clone(), state.config());

    Router::new()
        .route("/health", get(health))
        .merge(routes::routes())
        .layer(session_layer)
        .with_state(state)
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
                visitor_id = tracing::field::Empty,
            )
        }))
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}
