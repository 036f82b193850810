//! In-memory search index over normalized records.
//!
//! Build is O(n) and synchronous; a rebuild produces a fresh index
//! that callers swap in whole, so readers never see a half-built
//! structure. Matching supports exact tokens, prefixes, and a small
//! edit-distance tolerance, with scores combined per query term.

use crate::record::Record;
use crate::similarity;

/// Fraction of a token's length allowed as edit distance before a
/// fuzzy match stops counting.
pub const DEFAULT_FUZZY_TOLERANCE: f32 = 0.3;

// Weighting keeps exact/prefix hits ahead of fuzzy ones.
const PREFIX_WEIGHT: f32 = 1.0;
const FUZZY_WEIGHT: f32 = 0.5;

#[derive(Debug, Clone, Copy)]
pub struct IndexOptions {
  pub fuzzy_tolerance: f32,
}

impl Default for IndexOptions {
  fn default() -> Self {
    Self { fuzzy_tolerance: DEFAULT_FUZZY_TOLERANCE }
  }
}

/// A record plus its derived searchable tokens. Owned by the index
/// and rebuilt with it; never patched in place.
#[derive(Debug, Clone)]
struct IndexedEntry {
  record: Record,
  tokens: Vec<String>,
}

/// One scored query hit.
#[derive(Debug, Clone)]
pub struct Ranked {
  pub record: Record,
  pub score: f32,
}

#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
  entries: Vec<IndexedEntry>,
  options: IndexOptions,
}

impl SearchIndex {
  pub fn build(records: &[Record]) -> SearchIndex {
    Self::build_with_options(records, IndexOptions::default())
  }

  pub fn build_with_options(records: &[Record], options: IndexOptions) -> SearchIndex {
    let entries = records
      .iter()
      .map(|record| IndexedEntry { record: record.clone(), tokens: tokenize(record) })
      .collect();

    SearchIndex { entries, options }
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Run a ranked query. Empty or whitespace-only text yields no
  /// results; browse mode is a separate path, not an empty query.
  /// Results are sorted by descending score, ties left in insertion
  /// order (stable sort).
  pub fn query(&self, text: &str) -> Vec<Ranked> {
    let terms: Vec<String> =
      text.to_lowercase().split_whitespace().map(String::from).collect();
    if terms.is_empty() {
      return Vec::new();
    }

    let mut results: Vec<Ranked> = self
      .entries
      .iter()
      .filter_map(|entry| {
        let score = self.score_entry(entry, &terms);
        (score > 0.0).then(|| Ranked { record: entry.record.clone(), score })
      })
      .collect();

    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    results
  }

  /// Sum of the best per-token score for each query term.
  fn score_entry(&self, entry: &IndexedEntry, terms: &[String]) -> f32 {
    terms
      .iter()
      .map(|term| {
        entry
          .tokens
          .iter()
          .map(|token| self.score_token(term, token))
          .fold(0.0f32, f32::max)
      })
      .sum()
  }

  fn score_token(&self, term: &str, token: &str) -> f32 {
    // Exact and prefix hits score by how much of the token the term
    // covers, so "catan" on "catan" beats "cat" on "catan".
    if token.starts_with(term) {
      let coverage = term.chars().count() as f32 / token.chars().count() as f32;
      return PREFIX_WEIGHT * coverage;
    }

    let token_len = token.chars().count();
    let max_distance = (self.options.fuzzy_tolerance * token_len as f32).ceil() as usize;
    let distance = similarity::levenshtein(term, token);
    if distance > 0 && distance <= max_distance {
      return FUZZY_WEIGHT * similarity::normalized_similarity(term, token);
    }

    0.0
  }
}

/// Searchable text: name words plus the category label, case-folded.
fn tokenize(record: &Record) -> Vec<String> {
  let mut tokens: Vec<String> =
    record.name.to_lowercase().split_whitespace().map(String::from).collect();
  tokens.push(record.category.label().to_string());
  tokens
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::record::{Category, Record};

  fn sample_records() -> Vec<Record> {
    vec![
      Record::new(Category::Game, "Catan"),
      Record::new(Category::Pack, "Seafarers"),
      Record::new(Category::Item, "Robber Piece"),
      Record::new(Category::Item, "Cat Token"),
    ]
  }

  #[test]
  fn test_empty_query_returns_nothing() {
    let index = SearchIndex::build(&sample_records());
    assert!(index.query("").is_empty());
    assert!(index.query("   ").is_empty());
  }

  #[test]
  fn test_prefix_match_is_case_folded() {
    let index = SearchIndex::build(&sample_records());
    let results = index.query("CAT");
    let names: Vec<&str> = results.iter().map(|r| r.record.name.as_str()).collect();
    assert!(names.contains(&"Catan"));
    assert!(names.contains(&"Cat Token"));
    assert!(!names.contains(&"Seafarers"));
  }

  #[test]
  fn test_exact_token_outranks_prefix() {
    let index = SearchIndex::build(&sample_records());
    let results = index.query("cat");
    // "Cat Token" holds the exact token "cat"; "Catan" only a prefix.
    assert_eq!(results[0].record.name, "Cat Token");
    assert!(results[0].score > results[1].score);
  }

  #[test]
  fn test_fuzzy_match_within_tolerance() {
    let index = SearchIndex::build(&sample_records());
    let results = index.query("catam");
    assert!(results.iter().any(|r| r.record.name == "Catan"));
  }

  #[test]
  fn test_fuzzy_match_outside_tolerance_is_dropped() {
    let index = SearchIndex::build(&sample_records());
    assert!(index.query("zzzzz").is_empty());
  }

  #[test]
  fn test_fuzzy_tolerance_moves_the_match_boundary() {
    let records = vec![Record::new(Category::Game, "Catan")];

    // Two edits pass the default tolerance but not a tighter one.
    let default = SearchIndex::build(&records);
    assert!(!default.query("catzz").is_empty());
    let strict =
      SearchIndex::build_with_options(&records, IndexOptions { fuzzy_tolerance: 0.2 });
    assert!(strict.query("catzz").is_empty());

    // Three edits need a looser tolerance than the default.
    assert!(default.query("cazzz").is_empty());
    let loose =
      SearchIndex::build_with_options(&records, IndexOptions { fuzzy_tolerance: 0.6 });
    assert!(!loose.query("cazzz").is_empty());
  }

  #[test]
  fn test_category_label_is_searchable() {
    let index = SearchIndex::build(&sample_records());
    let results = index.query("game");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].record.name, "Catan");
  }

  #[test]
  fn test_ties_keep_insertion_order() {
    let records = vec![
      Record::new(Category::Game, "Alpha"),
      Record::new(Category::Game, "Alpha"),
      Record::new(Category::Game, "Alpha"),
    ];
    let index = SearchIndex::build(&records);
    let results = index.query("alpha");
    assert_eq!(results.len(), 3);
    let ids: Vec<&str> = results.iter().map(|r| r.record.id.as_str()).collect();
    assert!(results.windows(2).all(|w| w[0].score == w[1].score));
    assert_eq!(ids, vec!["g-Alpha", "g-Alpha", "g-Alpha"]);
  }

  #[test]
  fn test_scores_sorted_descending() {
    let index = SearchIndex::build(&sample_records());
    let results = index.query("cat");
    assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
  }

  #[test]
  fn test_rebuild_replaces_old_entries() {
    let index = SearchIndex::build(&sample_records());
    assert_eq!(index.len(), 4);
    let rebuilt = SearchIndex::build(&[Record::new(Category::Game, "Gloomhaven")]);
    assert_eq!(rebuilt.len(), 1);
    assert!(rebuilt.query("catan").is_empty());
  }
}
