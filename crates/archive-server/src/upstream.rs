//! Authenticated client for the upstream tabular source.
//!
//! Handlers and the fallback search talk to the `TableSource` trait
//! so tests can inject canned tables; `UpstreamClient` is the
//! production implementation speaking the hosted REST dialect
//! (bearer auth, `filterByFormula`, opaque `offset` pagination).

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use archive::record::RawRow;

use crate::config::Config;

pub const UPSTREAM_BASE: &str = "https://api.airtable.com/v0/";

/// Upstream table names. `Sub Categories` really does contain a
/// space; URL encoding happens at request time.
pub mod table {
  pub const GAMES: &str = "Games";
  pub const PACKS: &str = "Packs";
  pub const ITEMS: &str = "Items";
  pub const CATEGORIES: &str = "Categories";
  pub const SUB_CATEGORIES: &str = "Sub Categories";

  pub const ALL: [&str; 5] = [GAMES, PACKS, ITEMS, CATEGORIES, SUB_CATEGORIES];
  /// Tables the fallback search scans.
  pub const SEARCHABLE: [&str; 3] = [GAMES, PACKS, ITEMS];
}

/// Hard stop for full-table pagination, independent of page size.
const MAX_PAGES: usize = 10;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// One page of rows plus the opaque continuation token, if any.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TablePage {
  #[serde(default)]
  pub records: Vec<RawRow>,
  #[serde(default)]
  pub offset: Option<String>,
}

#[async_trait]
pub trait TableSource: std::fmt::Debug + Send + Sync {
  /// Fetch one page, passing the caller's continuation token through.
  async fn fetch_page(&self, table: &str, offset: Option<&str>) -> Result<TablePage>;

  /// Fetch the rows matching a filter formula (single page; filtered
  /// sets are expected to be small).
  async fn fetch_filtered(&self, table: &str, formula: &str) -> Result<Vec<RawRow>>;

  /// Fetch the full table contents, following continuation tokens,
  /// bounded by `page_size` per request.
  async fn fetch_all(&self, table: &str, page_size: usize) -> Result<Vec<RawRow>>;
}

#[derive(Debug)]
pub struct UpstreamClient {
  client: reqwest::Client,
  config: Config,
}

impl UpstreamClient {
  pub fn new(config: Config) -> UpstreamClient {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
      .build()
      .expect("Failed to create HTTP client");

    UpstreamClient { client, config }
  }

  fn table_url(&self, table: &str) -> Result<Url> {
    let mut url = Url::parse(UPSTREAM_BASE)?;
    url
      .path_segments_mut()
      .map_err(|_| anyhow!("upstream base url is not a valid base"))?
      .push(&self.config.base_id)
      .push(table);
    Ok(url)
  }

  async fn get_page(&self, table: &str, url: Url) -> Result<TablePage> {
    let response = self.client.get(url).bearer_auth(&self.config.api_key).send().await?;
    let status = response.status();

    if !status.is_success() {
      let message = response
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|body| upstream_error_message(&body))
        .unwrap_or_else(|| status.to_string());
      return Err(anyhow!("{table} fetch failed ({}): {message}", status.as_u16()));
    }

    Ok(response.json::<TablePage>().await?)
  }
}

/// The upstream reports errors as `{"error": {"message": …}}` or the
/// older flat `{"error": "…"}`.
fn upstream_error_message(body: &serde_json::Value) -> Option<String> {
  let error = body.get("error")?;
  match error {
    serde_json::Value::String(s) => Some(s.clone()),
    _ => error.get("message")?.as_str().map(String::from),
  }
}

#[async_trait]
impl TableSource for UpstreamClient {
  async fn fetch_page(&self, table: &str, offset: Option<&str>) -> Result<TablePage> {
    let mut url = self.table_url(table)?;
    if let Some(offset) = offset {
      url.query_pairs_mut().append_pair("offset", offset);
    }
    self.get_page(table, url).await
  }

  async fn fetch_filtered(&self, table: &str, formula: &str) -> Result<Vec<RawRow>> {
    let mut url = self.table_url(table)?;
    url.query_pairs_mut().append_pair("filterByFormula", formula);
    Ok(self.get_page(table, url).await?.records)
  }

  async fn fetch_all(&self, table: &str, page_size: usize) -> Result<Vec<RawRow>> {
    let mut rows = Vec::new();
    let mut offset: Option<String> = None;

    for _ in 0..MAX_PAGES {
      let mut url = self.table_url(table)?;
      {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("pageSize", &page_size.to_string());
        if let Some(offset) = &offset {
          pairs.append_pair("offset", offset);
        }
      }

      let page = self.get_page(table, url).await?;
      rows.extend(page.records);
      match page.offset {
        Some(next) => offset = Some(next),
        None => break,
      }
    }

    Ok(rows)
  }
}
