//! Fallback search endpoint.

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Json};

use crate::search::fallback_search;
use crate::server::handlers::tables::cache_control;
use crate::server::types::{AppState, SearchParams, SearchResponse, ServerError};

const SEARCH_MAX_AGE: u32 = 60;

/// GET /api/search?q= - exact pass with expansion, fuzzy rescue when
/// that comes up empty. An empty query is a valid request with an
/// empty result set, not an error.
pub async fn search(
  State(state): State<AppState>,
  Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, ServerError> {
  let query = params.q.unwrap_or_default();
  if query.trim().is_empty() {
    return Ok((cache_control(SEARCH_MAX_AGE), Json(SearchResponse { results: Vec::new() })));
  }

  let source = state.source()?;
  let results = fallback_search(source.as_ref(), &query).await?;
  tracing::debug!(query = %query, hits = results.len(), "fallback search served");

  Ok((cache_control(SEARCH_MAX_AGE), Json(SearchResponse { results })))
}
