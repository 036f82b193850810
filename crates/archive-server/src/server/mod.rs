//! REST API module for the archive server
//!
//! HTTP endpoints for the catalog tables, the aggregate load, and
//! the fallback search. Uses axum for routing with tower-http CORS
//! and tracing layers.

pub mod handlers;
pub mod routing;
pub mod startup;
pub mod types;
