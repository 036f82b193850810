//! Table passthrough endpoints: one route per upstream table plus
//! the `/api/all` aggregate. Responses carry a short public cache
//! lifetime to keep load off the upstream source.

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Json};
use futures::future::try_join_all;

use crate::server::types::{AllResponse, AppState, ServerError, TableParams, TableResponse};
use crate::upstream::table;

const TABLE_MAX_AGE: u32 = 300;
const ALL_MAX_AGE: u32 = 600;

pub(crate) fn cache_control(max_age: u32) -> [(header::HeaderName, String); 1] {
  [(header::CACHE_CONTROL, format!("public, max-age={max_age}"))]
}

async fn table_page(
  state: AppState,
  table_name: &str,
  params: TableParams,
) -> Result<impl IntoResponse, ServerError> {
  let source = state.source()?;
  let page = source.fetch_page(table_name, params.offset.as_deref()).await?;

  Ok((
    cache_control(TABLE_MAX_AGE),
    Json(TableResponse { records: page.records, offset: page.offset }),
  ))
}

/// GET /api/games
pub async fn games(
  State(state): State<AppState>,
  Query(params): Query<TableParams>,
) -> Result<impl IntoResponse, ServerError> {
  table_page(state, table::GAMES, params).await
}

/// GET /api/packs
pub async fn packs(
  State(state): State<AppState>,
  Query(params): Query<TableParams>,
) -> Result<impl IntoResponse, ServerError> {
  table_page(state, table::PACKS, params).await
}

/// GET /api/items
pub async fn items(
  State(state): State<AppState>,
  Query(params): Query<TableParams>,
) -> Result<impl IntoResponse, ServerError> {
  table_page(state, table::ITEMS, params).await
}

/// GET /api/categories
pub async fn categories(
  State(state): State<AppState>,
  Query(params): Query<TableParams>,
) -> Result<impl IntoResponse, ServerError> {
  table_page(state, table::CATEGORIES, params).await
}

/// GET /api/subcategories
pub async fn subcategories(
  State(state): State<AppState>,
  Query(params): Query<TableParams>,
) -> Result<impl IntoResponse, ServerError> {
  table_page(state, table::SUB_CATEGORIES, params).await
}

/// GET /api/all - every table in one payload, fetched concurrently.
/// Any single table failure fails the aggregate; the client's
/// per-category tolerance lives on the per-table routes.
pub async fn all(State(state): State<AppState>) -> Result<impl IntoResponse, ServerError> {
  let source = state.source()?;

  let fetches = table::ALL.iter().copied().map(|name| {
    let source = source.clone();
    async move { Ok::<_, anyhow::Error>((name, source.fetch_page(name, None).await?.records)) }
  });

  let mut response = AllResponse::default();
  for (name, records) in try_join_all(fetches).await? {
    response.tables.insert(name.to_string(), records);
  }

  Ok((cache_control(ALL_MAX_AGE), Json(response)))
}
