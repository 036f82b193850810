//! Presentation adapter: category-partitioned result lists, match
//! highlighting, and the record detail view.
//!
//! Everything here is a thin consumer of ranked results. The span
//! computation is kept separate from the terminal styling so it can
//! be tested without caring about ANSI escapes.

use colored::*;

use crate::record::{Category, CategoryFilter, Record};

/// What one search (or browse) pass wants on screen.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderPlan {
  /// Highlight term, empty in browse mode.
  pub term: String,
  pub filter: CategoryFilter,
  /// Results in rank order, all categories mixed.
  pub results: Vec<Record>,
  /// Per-category load failures to surface as section markers.
  pub errors: Vec<(Category, String)>,
}

/// A highlight segment: byte range into the text plus whether it
/// matched the term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
  pub start: usize,
  pub end: usize,
  pub matched: bool,
}

/// Case-insensitive all-occurrence match spans for `term` in `text`.
/// An empty term yields one unmatched span covering everything.
pub fn match_spans(text: &str, term: &str) -> Vec<Span> {
  if term.is_empty() || text.is_empty() {
    return vec![Span { start: 0, end: text.len(), matched: false }];
  }

  let haystack = text.to_lowercase();
  let needle = term.to_lowercase();
  // Case folding can change byte lengths for some scripts; fall back
  // to no highlight rather than slicing at the wrong boundary.
  if haystack.len() != text.len() {
    return vec![Span { start: 0, end: text.len(), matched: false }];
  }

  let mut spans = Vec::new();
  let mut cursor = 0;
  while let Some(found) = haystack[cursor..].find(&needle) {
    let start = cursor + found;
    let end = start + needle.len();
    if start > cursor {
      spans.push(Span { start: cursor, end: start, matched: false });
    }
    spans.push(Span { start, end, matched: true });
    cursor = end;
  }
  if cursor < text.len() {
    spans.push(Span { start: cursor, end: text.len(), matched: false });
  }

  spans
}

/// Apply terminal styling over the computed spans.
pub fn highlight(text: &str, term: &str) -> String {
  match_spans(text, term)
    .iter()
    .map(|span| {
      let piece = &text[span.start..span.end];
      if span.matched {
        piece.yellow().bold().to_string()
      } else {
        piece.to_string()
      }
    })
    .collect()
}

/// Render one list per visible category, rank order preserved within
/// each list. Hidden categories produce nothing at all, visible but
/// empty ones get a "no results" marker.
pub fn render_plan(plan: &RenderPlan) -> String {
  let mut out = String::new();

  for category in Category::ALL {
    if !plan.filter.includes(category) {
      continue;
    }

    out.push_str(&format!("{}\n", section_header(category)));

    if let Some((_, message)) = plan.errors.iter().find(|(c, _)| *c == category) {
      out.push_str(&format!("  {}\n", format!("failed to load: {message}").red()));
      continue;
    }

    let rows: Vec<&Record> =
      plan.results.iter().filter(|r| r.category == category).collect();
    if rows.is_empty() {
      out.push_str(&format!("  {}\n", "no results".dimmed()));
      continue;
    }

    for record in rows {
      out.push_str(&format!("  {}\n", highlight(&record.name, &plan.term)));
    }
  }

  out
}

/// Detail view for a selected record, the CLI stand-in for the old
/// modal panel.
pub fn render_detail(record: &Record) -> String {
  let mut out = format!("=== {} ===\n", record.name.yellow().bold());
  out.push_str(&format!("category: {}\n", record.category.label()));

  if let Some(image) = &record.image {
    out.push_str(&format!("image: {image}\n"));
  }
  if let Some(game) = &record.game {
    out.push_str(&format!("game: {game}\n"));
  }
  if let Some(pack) = &record.pack {
    out.push_str(&format!("pack: {pack}\n"));
  }
  out.push_str(&format!(
    "tags: {} / {}\n",
    record.item_category.as_deref().unwrap_or("Uncategorized"),
    record.subcategory.as_deref().unwrap_or("—")
  ));

  out
}

fn section_header(category: Category) -> String {
  format!("[{}s]", category.label()).blue().bold().to_string()
}
