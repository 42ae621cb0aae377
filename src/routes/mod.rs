use axum::Router;

use crate::state::SharedState;

/// Availability endpoints.
pub mod availability;
/// Swagger UI and OpenAPI document.
pub mod docs;
/// Fixture and candidate endpoints.
pub mod fixtures;
/// Health endpoint.
pub mod health;
/// Login and participant endpoints.
pub mod participants;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(participants::router())
        .merge(availability::router())
        .merge(fixtures::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
