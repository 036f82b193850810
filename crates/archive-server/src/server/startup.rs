//! REST server startup and configuration

use anyhow::Result;
use axum::http::{header, Method};
use axum::serve;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::Any, cors::CorsLayer, trace::TraceLayer};

use crate::server::routing::create_router;
use crate::server::types::AppState;

/// Preflight answers are cacheable for a day.
const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(86_400);

/// CORS for a public read-only API: GET/OPTIONS from anywhere, the
/// headers the web client actually sends.
pub fn cors_layer() -> CorsLayer {
  CorsLayer::new()
    .allow_origin(Any)
    .allow_methods([Method::GET, Method::OPTIONS])
    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    .max_age(PREFLIGHT_MAX_AGE)
}

/// Start the REST server
pub async fn start_server(addr: SocketAddr, state: AppState) -> Result<()> {
  let app = create_router(state)
    .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors_layer()));

  let listener = TcpListener::bind(addr).await?;
  tracing::info!(%addr, "archive server listening");

  serve(listener, app).await?;
  tracing::info!("server shutdown");
  Ok(())
}
