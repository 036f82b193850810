//! HTTP client for the archive API surface.
//!
//! The CLI talks to the same endpoints the web front end does: one
//! route per table for the initial load and `/api/search` for the
//! server-side fallback.

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::timeout;

use crate::record::{Category, CategoryPayloads, RawRow, Record, UNNAMED};

/// Configuration for the archive HTTP client
#[derive(Debug, Clone)]
pub struct ClientConfig {
  /// Base URL of the archive server (e.g., "http://localhost:8787")
  pub base_url: String,
  /// Request timeout in seconds
  pub timeout_secs: u64,
}

impl Default for ClientConfig {
  fn default() -> Self {
    Self { base_url: "http://localhost:8787".to_string(), timeout_secs: 30 }
  }
}

/// One fallback search hit as the server reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchMatch {
  /// Source table name ("Games", "Packs", "Items").
  pub source: String,
  pub name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub image: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub game: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub pack: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub category: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub subcategory: Option<String>,
  /// Similarity score, only present on fuzzy-rescue hits.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub score: Option<f32>,
}

impl SearchMatch {
  /// Re-derive the local record shape. Ids come from category plus
  /// name so remote hits dedup against locally indexed records.
  pub fn into_record(self) -> Record {
    let category = Category::parse(&self.source).unwrap_or(Category::Item);
    let name = self.name.filter(|n| !n.is_empty()).unwrap_or_else(|| UNNAMED.to_string());
    let mut record = Record::new(category, name);
    record.image = self.image;
    record.game = self.game;
    record.pack = self.pack;
    record.item_category = self.category;
    record.subcategory = self.subcategory;
    record
  }
}

#[derive(Debug, Deserialize)]
struct TableResponse {
  #[serde(default)]
  records: Vec<RawRow>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
  #[serde(default)]
  results: Vec<SearchMatch>,
}

/// HTTP client for the archive REST API
pub struct ArchiveClient {
  client: Client,
  config: ClientConfig,
}

impl Default for ArchiveClient {
  fn default() -> Self {
    Self::new()
  }
}

impl ArchiveClient {
  /// Create a new client with default configuration
  pub fn new() -> Self {
    Self::with_config(ClientConfig::default())
  }

  /// Create a new client with custom configuration
  pub fn with_config(config: ClientConfig) -> Self {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .expect("Failed to create HTTP client");

    Self { client, config }
  }

  /// Load all three tables concurrently. A failed table keeps its
  /// error in the payload; the others still come back, so one bad
  /// fetch never empties the whole catalog.
  pub async fn load_catalog(&self) -> CategoryPayloads {
    let (games, packs, items) = tokio::join!(
      self.fetch_table("/api/games"),
      self.fetch_table("/api/packs"),
      self.fetch_table("/api/items"),
    );
    CategoryPayloads { games, packs, items }
  }

  /// Run the server-side fallback search.
  pub async fn search(&self, query: &str) -> Result<Vec<Record>> {
    let url = format!("{}/api/search", self.config.base_url);
    let response = timeout(
      Duration::from_secs(self.config.timeout_secs),
      self.client.get(&url).query(&[("q", query)]).send(),
    )
    .await??;

    if !response.status().is_success() {
      let error_text = response.text().await?;
      return Err(anyhow!("Server search failed: {}", error_text));
    }

    let result: SearchResponse = response.json().await?;
    Ok(result.results.into_iter().map(SearchMatch::into_record).collect())
  }

  async fn fetch_table(&self, path: &str) -> Result<Vec<RawRow>> {
    let url = format!("{}{}", self.config.base_url, path);
    let response =
      timeout(Duration::from_secs(self.config.timeout_secs), self.client.get(&url).send())
        .await??;

    if !response.status().is_success() {
      let error_text = response.text().await?;
      return Err(anyhow!("Failed to fetch {}: {}", path, error_text));
    }

    let result: TableResponse = response.json().await?;
    Ok(result.records)
  }
}
