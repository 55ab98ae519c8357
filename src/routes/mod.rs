use axum::Router;

use crate::state::SharedState;

/// Token-protected official result registration.
pub mod admin;
/// Leagues, teams and fixtures.
pub mod catalog;
/// Swagger UI and the OpenAPI document.
pub mod docs;
/// Health check.
pub mod health;
/// Prediction intake and scoring.
pub mod predictions;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(catalog::router())
        .merge(predictions::router())
        .merge(admin::router(state.clone()));

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
