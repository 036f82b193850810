//! Canned in-memory table source for exercising the fallback search
//! and handlers without the network.
//!
//! `fetch_filtered` actually evaluates the submitted formula's
//! `SEARCH(LOWER("…"), LOWER({…}))` clauses against the seeded rows,
//! so the formula construction is exercised end to end.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

use archive::record::RawRow;
use archive_server::upstream::{TablePage, TableSource};

#[derive(Debug, Default)]
pub struct MockSource {
  tables: HashMap<String, Vec<RawRow>>,
  fail: HashSet<String>,
}

impl MockSource {
  pub fn new() -> MockSource {
    MockSource::default()
  }

  pub fn with_table(mut self, table: &str, rows: Vec<RawRow>) -> MockSource {
    self.tables.insert(table.to_string(), rows);
    self
  }

  pub fn failing(mut self, table: &str) -> MockSource {
    self.fail.insert(table.to_string());
    self
  }

  fn rows(&self, table: &str) -> Result<Vec<RawRow>> {
    if self.fail.contains(table) {
      bail!("{table} fetch failed (503)");
    }
    Ok(self.tables.get(table).cloned().unwrap_or_default())
  }
}

pub fn row(fields: Value) -> RawRow {
  RawRow { id: "recMOCK".to_string(), fields: serde_json::from_value(fields).unwrap() }
}

/// Pull `(needle, field)` pairs out of a filter formula.
fn parse_clauses(formula: &str) -> Result<Vec<(String, String)>> {
  const OPEN: &str = "SEARCH(LOWER(\"";
  const MID: &str = "\"), LOWER({";
  const CLOSE: &str = "}))";

  let mut clauses = Vec::new();
  let mut rest = formula;
  while let Some(at) = rest.find(OPEN) {
    let after = &rest[at + OPEN.len()..];
    let mid = after.find(MID).ok_or_else(|| anyhow!("malformed formula: {formula}"))?;
    let needle = after[..mid].to_string();
    let after_field = &after[mid + MID.len()..];
    let close = after_field.find(CLOSE).ok_or_else(|| anyhow!("malformed formula: {formula}"))?;
    clauses.push((needle, after_field[..close].to_string()));
    rest = &after_field[close..];
  }

  if clauses.is_empty() {
    bail!("no SEARCH clauses in formula: {formula}");
  }
  Ok(clauses)
}

#[async_trait]
impl TableSource for MockSource {
  async fn fetch_page(&self, table: &str, _offset: Option<&str>) -> Result<TablePage> {
    Ok(TablePage { records: self.rows(table)?, offset: None })
  }

  async fn fetch_filtered(&self, table: &str, formula: &str) -> Result<Vec<RawRow>> {
    let clauses = parse_clauses(formula)?;
    Ok(
      self
        .rows(table)?
        .into_iter()
        .filter(|row| {
          clauses.iter().any(|(needle, field)| {
            row
              .text_field(field)
              .map(|value| value.to_lowercase().contains(needle))
              .unwrap_or(false)
          })
        })
        .collect(),
    )
  }

  async fn fetch_all(&self, table: &str, _page_size: usize) -> Result<Vec<RawRow>> {
    self.rows(table)
  }
}
