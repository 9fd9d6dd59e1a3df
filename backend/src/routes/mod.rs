//! Route definitions for the Pollination Monitor

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes
        .nest("/auth", auth_routes(state.clone()))
        // Protected routes - farms and their evaluations
        .nest("/farms", farm_routes(state))
}

/// Authentication routes
fn auth_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/logout", post(handlers::logout))
        .route("/me", get(handlers::me))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/login", post(handlers::login))
        .merge(protected)
}

/// Farm and evaluation routes (protected)
fn farm_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_farms))
        .route("/:farm_id", get(handlers::get_farm))
        .route("/:farm_id/evaluations", get(handlers::list_farm_evaluations))
        .route(
            "/:farm_id/evaluations/metrics",
            get(handlers::get_selection_metrics),
        )
        .route(
            "/:farm_id/evaluations/:evaluation_id/metrics",
            get(handlers::get_evaluation_metrics),
        )
        .route(
            "/:farm_id/evaluations/:evaluation_id/export",
            get(handlers::export_evaluation),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
