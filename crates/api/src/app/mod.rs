//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: the application services shared by all handlers
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use stockroom_infra::store::{InMemoryStore, Store};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router over the given services.
pub fn build_app<S: Store>(services: Arc<AppServices<S>>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router::<S>())
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::log_requests))
                .layer(Extension(services)),
        )
}

/// Router over a fresh in-memory store (dev runs and tests).
pub fn build_in_memory_app() -> Router {
    build_app(Arc::new(AppServices::new(Arc::new(InMemoryStore::new()))))
}
