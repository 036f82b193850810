//! Wire types and shared state for the REST API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use archive::client::SearchMatch;
use archive::record::RawRow;

use crate::config::{Config, ConfigError};
use crate::upstream::{TableSource, UpstreamClient};

/// Structured error body: `{"error": "..."}` on every failure path.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
  pub error: String,
}

/// Everything a handler can fail with, mapped onto the error
/// taxonomy: missing credentials are a 500 on every data route,
/// upstream fetch failures inside a request are a 502.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
  #[error(transparent)]
  Config(#[from] ConfigError),
  #[error("{0}")]
  Upstream(#[from] anyhow::Error),
}

impl ServerError {
  pub fn status(&self) -> StatusCode {
    match self {
      ServerError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
      ServerError::Upstream(_) => StatusCode::BAD_GATEWAY,
    }
  }
}

impl IntoResponse for ServerError {
  fn into_response(self) -> Response {
    let status = self.status();
    tracing::warn!(status = %status, error = %self, "request failed");
    (status, Json(ErrorBody { error: self.to_string() })).into_response()
  }
}

/// Response for the per-table endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct TableResponse {
  pub records: Vec<RawRow>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub offset: Option<String>,
}

/// Response for /api/all: table name to records
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct AllResponse {
  #[serde(flatten)]
  pub tables: BTreeMap<String, Vec<RawRow>>,
}

/// Response for /api/search
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
  pub results: Vec<SearchMatch>,
}

/// Query parameters shared by the table endpoints
#[derive(Debug, Deserialize, Default)]
pub struct TableParams {
  pub offset: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct SearchParams {
  pub q: Option<String>,
}

/// Shared handler state. Built once at startup; if credentials were
/// missing the state carries the error instead and every data route
/// reports it.
#[derive(Clone)]
pub struct AppState {
  source: Option<Arc<dyn TableSource>>,
  config_error: Option<ConfigError>,
}

impl AppState {
  /// Production state from the environment.
  pub fn from_env() -> AppState {
    match Config::from_env() {
      Ok(config) => Self::ready(Arc::new(UpstreamClient::new(config))),
      Err(e) => {
        tracing::error!(error = %e, "upstream credentials missing; data routes will fail");
        Self::unconfigured(e)
      }
    }
  }

  pub fn ready(source: Arc<dyn TableSource>) -> AppState {
    AppState { source: Some(source), config_error: None }
  }

  pub fn unconfigured(error: ConfigError) -> AppState {
    AppState { source: None, config_error: Some(error) }
  }

  pub fn source(&self) -> Result<Arc<dyn TableSource>, ServerError> {
    match (&self.source, &self.config_error) {
      (Some(source), _) => Ok(source.clone()),
      (None, Some(error)) => Err(ServerError::Config(error.clone())),
      // Unreachable by construction; report it as a config failure.
      (None, None) => {
        Err(ServerError::Config(ConfigError::MissingVar(crate::config::API_KEY_VAR)))
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::API_KEY_VAR;

  #[test]
  fn test_config_error_maps_to_500() {
    let err = ServerError::Config(ConfigError::MissingVar(API_KEY_VAR));
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
  }

  #[test]
  fn test_upstream_error_maps_to_502() {
    let err = ServerError::Upstream(anyhow::anyhow!("Games fetch failed (503)"));
    assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
  }

  #[test]
  fn test_unconfigured_state_reports_config_error() {
    let state = AppState::unconfigured(ConfigError::MissingVar(API_KEY_VAR));
    let err = state.source().unwrap_err();
    assert!(matches!(err, ServerError::Config(_)));
  }

  #[test]
  fn test_error_body_shape() {
    let body = serde_json::to_value(ErrorBody { error: "boom".to_string() }).unwrap();
    assert_eq!(body, serde_json::json!({"error": "boom"}));
  }
}
