use axum::{
    routing::{get, post},
    Router,
};

use stockroom_infra::store::Store;

pub mod common;
pub mod items;
pub mod locations;
pub mod movements;
pub mod orders;
pub mod system;
pub mod users;

/// Router for all store-backed endpoints.
pub fn router<S: Store>() -> Router {
    Router::new()
        .nest("/items", items::router::<S>())
        .route("/categories", get(items::categories::<S>))
        .nest("/locations", locations::router::<S>())
        .nest("/users", users::router::<S>())
        .route("/move", post(movements::relocate::<S>))
        .nest("/orders", orders::router::<S>())
}
