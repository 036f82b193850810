//! Server-side fallback search: an exact substring pass across all
//! tables, transitive expansion from matched games/packs to their
//! member items, id-keyed dedup, and an edit-distance rescue pass
//! when nothing matched exactly.
//!
//! Unlike the initial catalog load, a failed table fetch here fails
//! the whole invocation: this path is already the degraded mode and
//! partial answers would be indistinguishable from good ones.

use anyhow::Result;
use futures::future::try_join_all;
use std::collections::HashMap;

use archive::client::SearchMatch;
use archive::record::RawRow;
use archive::similarity;

use crate::upstream::{table, TableSource};

/// Minimum normalized similarity for a fuzzy-rescue hit.
pub const FUZZY_THRESHOLD: f32 = 0.4;

/// Page size used when the rescue pass pulls full tables.
pub const RESCUE_PAGE_SIZE: usize = 100;

pub async fn fallback_search(source: &dyn TableSource, query: &str) -> Result<Vec<SearchMatch>> {
  let folded = query.trim().to_lowercase();
  if folded.is_empty() {
    return Ok(Vec::new());
  }

  // 1. Exact substring pass, one concurrent query per table.
  let passes = table::SEARCHABLE.iter().copied().map(|name| {
    let formula = contains_formula(&folded, search_fields(name));
    async move {
      let rows = source.fetch_filtered(name, &formula).await?;
      Ok::<_, anyhow::Error>((name, rows))
    }
  });

  let mut matches: Vec<SearchMatch> = Vec::new();
  for (table_name, rows) in try_join_all(passes).await? {
    matches.extend(rows.iter().map(|row| row_to_match(table_name, row)));
  }

  // 2. A hit on a game or pack name also surfaces the items that
  //    belong to it, even when the item names themselves miss.
  let expansions: Vec<_> = matches
    .iter()
    .filter_map(|m| {
      let field = match m.source.as_str() {
        table::GAMES => "Game",
        table::PACKS => "Pack",
        _ => return None,
      };
      let parent = m.name.clone()?;
      Some((field, parent))
    })
    .collect();

  let member_queries = expansions.iter().map(|(field, parent)| {
    let formula = contains_formula(&parent.to_lowercase(), &[*field]);
    async move { source.fetch_filtered(table::ITEMS, &formula).await }
  });
  for rows in try_join_all(member_queries).await? {
    matches.extend(rows.iter().map(|row| row_to_match(table::ITEMS, row)));
  }

  // 3. Dedup by the deterministic record key, last write wins.
  let matches = dedup_matches(matches);
  if !matches.is_empty() {
    return Ok(matches);
  }

  // 4. Nothing matched exactly: fuzzy rescue over full tables.
  fuzzy_rescue(source, &folded).await
}

/// `OR(SEARCH(LOWER("q"), LOWER({Field})), …)` — true when the
/// case-folded query is a substring of any listed field.
fn contains_formula(needle: &str, fields: &[&str]) -> String {
  let escaped = needle.replace('\\', "\\\\").replace('"', "\\\"");
  let clauses: Vec<String> = fields
    .iter()
    .map(|field| format!("SEARCH(LOWER(\"{escaped}\"), LOWER({{{field}}}))"))
    .collect();
  format!("OR({})", clauses.join(","))
}

/// Searchable fields per table: the name column, plus the linked
/// classification columns for items.
fn search_fields(table_name: &str) -> &'static [&'static str] {
  match table_name {
    table::ITEMS => &["Items", "Categories", "Sub Categories"],
    _ => &["Name"],
  }
}

fn row_to_match(table_name: &str, row: &RawRow) -> SearchMatch {
  let name = match table_name {
    table::ITEMS => row.text_field("Items"),
    _ => row.text_field("Name").or_else(|| row.text_field("Title")),
  };

  SearchMatch {
    source: table_name.to_string(),
    name,
    image: row.attachment_url("Image"),
    game: row.text_field("Game"),
    pack: row.text_field("Pack"),
    category: row.text_field("Categories"),
    subcategory: row.text_field("Sub Categories"),
    score: None,
  }
}

/// Category-plus-name key, the same identity the client derives, so
/// re-fetched rows collapse to one entry.
fn match_key(m: &SearchMatch) -> String {
  let prefix = m.source.chars().next().unwrap_or('?').to_ascii_lowercase();
  format!("{}-{}", prefix, m.name.as_deref().unwrap_or(""))
}

fn dedup_matches(matches: Vec<SearchMatch>) -> Vec<SearchMatch> {
  let mut seen: HashMap<String, usize> = HashMap::new();
  let mut result: Vec<SearchMatch> = Vec::new();

  for m in matches {
    let key = match_key(&m);
    match seen.get(&key) {
      Some(&at) => result[at] = m,
      None => {
        seen.insert(key, result.len());
        result.push(m);
      }
    }
  }

  result
}

/// Score every record name in every table against the query; keep
/// anything above the threshold, best first. Rows without a name
/// score 0 and drop out.
async fn fuzzy_rescue(source: &dyn TableSource, folded: &str) -> Result<Vec<SearchMatch>> {
  let fetches = table::SEARCHABLE
    .iter()
    .copied()
    .map(|name| async move { Ok::<_, anyhow::Error>((name, source.fetch_all(name, RESCUE_PAGE_SIZE).await?)) });

  let mut scored: Vec<SearchMatch> = Vec::new();
  for (table_name, rows) in try_join_all(fetches).await? {
    for row in &rows {
      let mut m = row_to_match(table_name, row);
      let score = m
        .name
        .as_deref()
        .map(|name| similarity::normalized_similarity(folded, &name.to_lowercase()))
        .unwrap_or(0.0);
      if score > FUZZY_THRESHOLD {
        m.score = Some(score);
        scored.push(m);
      }
    }
  }

  scored.sort_by(|a, b| {
    b.score
      .partial_cmp(&a.score)
      .unwrap_or(std::cmp::Ordering::Equal)
  });

  Ok(scored)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn named_match(source: &str, name: &str) -> SearchMatch {
    SearchMatch {
      source: source.to_string(),
      name: Some(name.to_string()),
      image: None,
      game: None,
      pack: None,
      category: None,
      subcategory: None,
      score: None,
    }
  }

  #[test]
  fn test_formula_single_field() {
    assert_eq!(
      contains_formula("cat", &["Name"]),
      r#"OR(SEARCH(LOWER("cat"), LOWER({Name})))"#
    );
  }

  #[test]
  fn test_formula_item_fields() {
    assert_eq!(
      contains_formula("token", search_fields(table::ITEMS)),
      r#"OR(SEARCH(LOWER("token"), LOWER({Items})),SEARCH(LOWER("token"), LOWER({Categories})),SEARCH(LOWER("token"), LOWER({Sub Categories})))"#
    );
  }

  #[test]
  fn test_formula_escapes_quotes() {
    let formula = contains_formula(r#"8" tile"#, &["Name"]);
    assert!(formula.contains(r#"LOWER("8\" tile")"#));
  }

  #[test]
  fn test_match_key_uses_category_prefix() {
    assert_eq!(match_key(&named_match(table::GAMES, "Catan")), "g-Catan");
    assert_eq!(match_key(&named_match(table::ITEMS, "Robber Piece")), "i-Robber Piece");
  }

  #[test]
  fn test_dedup_is_last_write_wins() {
    let mut first = named_match(table::ITEMS, "Robber Piece");
    first.pack = Some("Base".to_string());
    let mut second = named_match(table::ITEMS, "Robber Piece");
    second.pack = Some("Seafarers".to_string());

    let deduped =
      dedup_matches(vec![first, named_match(table::GAMES, "Catan"), second]);
    assert_eq!(deduped.len(), 2);
    assert_eq!(deduped[0].pack.as_deref(), Some("Seafarers"));
    assert_eq!(deduped[1].name.as_deref(), Some("Catan"));
  }

  #[test]
  fn test_same_name_different_tables_both_survive() {
    let deduped = dedup_matches(vec![
      named_match(table::GAMES, "Seafarers"),
      named_match(table::PACKS, "Seafarers"),
    ]);
    assert_eq!(deduped.len(), 2);
  }
}
