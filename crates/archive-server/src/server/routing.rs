//! Axum router configuration for all endpoints

use axum::{routing::get, Router};

use crate::server::handlers::{search, status, tables};
use crate::server::types::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
  Router::new()
    // Health endpoint
    .route("/status", get(status::status))
    // Per-table passthrough endpoints
    .route("/api/games", get(tables::games))
    .route("/api/packs", get(tables::packs))
    .route("/api/items", get(tables::items))
    .route("/api/categories", get(tables::categories))
    .route("/api/subcategories", get(tables::subcategories))
    // Aggregate load
    .route("/api/all", get(tables::all))
    // Fallback search
    .route("/api/search", get(search::search))
    .with_state(state)
}
