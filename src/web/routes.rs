use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

// API Routes - the pipeline steps, one endpoint each
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new().nest(
        "/api",
        Router::new()
            // Connection management
            .route("/connect", post(handlers::api::connect))
            .route("/schema", get(handlers::api::get_schema))

            // Natural language to SQL, then execution
            .route("/nl-to-sql", post(handlers::api::nl_to_sql))
            .route("/query", post(handlers::api::run_query))

            // Chart insights from result rows
            .route("/generate-insights", post(handlers::api::generate_insights))

            // System status
            .route("/status", get(handlers::api::system_status)),
    )
}
