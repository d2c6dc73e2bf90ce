//! API route definitions

use super::experiment_handlers;
use super::handlers::{self, GriseraState};
use super::series_handlers;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the API router
pub fn create_router(state: GriseraState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // ====================================================================
        // Experiments (stamp chain owners)
        // ====================================================================
        .route(
            "/api/experiments",
            post(experiment_handlers::create_experiment),
        )
        .route(
            "/api/experiments/{id}",
            get(experiment_handlers::get_experiment),
        )
        // ====================================================================
        // Time series
        // ====================================================================
        .route(
            "/api/time_series",
            post(series_handlers::save_time_series),
        )
        .route(
            "/api/time_series/transformation",
            post(series_handlers::transform_time_series),
        )
        .route(
            "/api/time_series/{id}",
            get(series_handlers::get_time_series).delete(series_handlers::delete_time_series),
        )
        // ====================================================================
        // Frequency-domain series
        // ====================================================================
        .route(
            "/api/frequency_domain_series",
            post(series_handlers::save_frequency_domain_series),
        )
        .route(
            "/api/frequency_domain_series/transformation",
            post(series_handlers::transform_frequency_domain_series),
        )
        .route(
            "/api/frequency_domain_series/{id}",
            get(series_handlers::get_frequency_domain_series)
                .delete(series_handlers::delete_frequency_domain_series),
        )
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
