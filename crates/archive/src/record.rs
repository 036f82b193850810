//! Record store: turns the loosely-typed per-table payloads from the
//! API into one uniform `Record` shape everything downstream depends
//! on.
//!
//! Upstream field names vary by table (games carry `Name` or the
//! older `Title`, items keep their display name in `Items`), and
//! linked fields may arrive as a single string or an array of
//! strings. All of that variance is absorbed here.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const UNNAMED: &str = "(Unnamed)";

/// The fixed catalog vocabulary. Every record belongs to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
  Game,
  Pack,
  Item,
}

impl Category {
  pub const ALL: [Category; 3] = [Category::Game, Category::Pack, Category::Item];

  /// Display/search label, also used as the id prefix source.
  pub fn label(&self) -> &'static str {
    match self {
      Category::Game => "game",
      Category::Pack => "pack",
      Category::Item => "item",
    }
  }

  /// Stable one-letter id prefix (`g-`, `p-`, `i-`).
  pub fn id_prefix(&self) -> char {
    match self {
      Category::Game => 'g',
      Category::Pack => 'p',
      Category::Item => 'i',
    }
  }

  pub fn parse(label: &str) -> Option<Category> {
    match label.to_lowercase().as_str() {
      "game" | "games" => Some(Category::Game),
      "pack" | "packs" => Some(Category::Pack),
      "item" | "items" => Some(Category::Item),
      _ => None,
    }
  }
}

/// Scope selector for queries and browse mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
  #[default]
  All,
  Only(Category),
}

impl CategoryFilter {
  pub fn includes(&self, category: Category) -> bool {
    match self {
      CategoryFilter::All => true,
      CategoryFilter::Only(c) => *c == category,
    }
  }
}

/// One normalized catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
  pub id: String,
  pub name: String,
  pub category: Category,
  /// Item-only attachment URL.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub image: Option<String>,
  /// Owning game name, items only.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub game: Option<String>,
  /// Owning pack name, items only.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub pack: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub item_category: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub subcategory: Option<String>,
}

impl Record {
  /// Build a record with the deterministic category-plus-name id, so
  /// the same logical record always dedups to the same key.
  pub fn new(category: Category, name: impl Into<String>) -> Record {
    let name = name.into();
    Record {
      id: format!("{}-{}", category.id_prefix(), name),
      name,
      category,
      image: None,
      game: None,
      pack: None,
      item_category: None,
      subcategory: None,
    }
  }
}

/// A raw upstream row: opaque row id plus a free-form field map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRow {
  #[serde(default)]
  pub id: String,
  #[serde(default)]
  pub fields: BTreeMap<String, Value>,
}

impl RawRow {
  /// Pull a display string out of a field that may be a string, a
  /// number, or an array of linked values (first entry wins).
  pub fn text_field(&self, name: &str) -> Option<String> {
    match self.fields.get(name)? {
      Value::String(s) if !s.is_empty() => Some(s.clone()),
      Value::Number(n) => Some(n.to_string()),
      Value::Array(items) => items.iter().find_map(|v| match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
      }),
      _ => None,
    }
  }

  /// Attachment URL: `fields.Image[0].url`.
  pub fn attachment_url(&self, name: &str) -> Option<String> {
    let attachments = self.fields.get(name)?.as_array()?;
    attachments.first()?.get("url")?.as_str().map(String::from)
  }
}

/// Per-category fetch results feeding one normalization pass. A
/// failed category arrives as `Err` and only empties its own slice.
pub struct CategoryPayloads {
  pub games: anyhow::Result<Vec<RawRow>>,
  pub packs: anyhow::Result<Vec<RawRow>>,
  pub items: anyhow::Result<Vec<RawRow>>,
}

/// An immutable normalized record set plus whatever went wrong per
/// category while producing it.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
  pub records: Vec<Record>,
  pub load_errors: Vec<(Category, String)>,
}

impl Snapshot {
  pub fn normalize(payloads: CategoryPayloads) -> Snapshot {
    let mut snapshot = Snapshot::default();

    match payloads.games {
      Ok(rows) => snapshot.records.extend(rows.iter().filter_map(normalize_game)),
      Err(e) => snapshot.load_errors.push((Category::Game, e.to_string())),
    }

    match payloads.packs {
      Ok(rows) => snapshot.records.extend(rows.iter().filter_map(normalize_pack)),
      Err(e) => snapshot.load_errors.push((Category::Pack, e.to_string())),
    }

    match payloads.items {
      Ok(rows) => snapshot.records.extend(rows.iter().map(normalize_item)),
      Err(e) => snapshot.load_errors.push((Category::Item, e.to_string())),
    }

    snapshot
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }
}

/// Games keep their name in `Name`, or `Title` in rows predating the
/// schema rename. Nameless rows are dropped, same as the old loader.
fn normalize_game(row: &RawRow) -> Option<Record> {
  let name = row.text_field("Name").or_else(|| row.text_field("Title"))?;
  Some(Record::new(Category::Game, name))
}

fn normalize_pack(row: &RawRow) -> Option<Record> {
  let name = row.text_field("Name")?;
  Some(Record::new(Category::Pack, name))
}

/// Items always produce a record; a missing display name becomes the
/// `(Unnamed)` placeholder instead of losing the row.
fn normalize_item(row: &RawRow) -> Record {
  let name = row.text_field("Items").unwrap_or_else(|| UNNAMED.to_string());
  let mut record = Record::new(Category::Item, name);
  record.image = row.attachment_url("Image");
  record.game = row.text_field("Game");
  record.pack = row.text_field("Pack");
  record.item_category = row.text_field("Categories");
  record.subcategory = row.text_field("Sub Categories");
  record
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn row(fields: Value) -> RawRow {
    RawRow {
      id: "rec123".to_string(),
      fields: serde_json::from_value(fields).unwrap(),
    }
  }

  #[test]
  fn test_game_name_falls_back_to_title() {
    let rows = vec![row(json!({"Title": "Catan"}))];
    let record = normalize_game(&rows[0]).unwrap();
    assert_eq!(record.name, "Catan");
    assert_eq!(record.id, "g-Catan");
    assert_eq!(record.category, Category::Game);
  }

  #[test]
  fn test_nameless_game_row_is_dropped() {
    assert!(normalize_game(&row(json!({"Notes": "???"}))).is_none());
  }

  #[test]
  fn test_item_row_keeps_linked_fields() {
    let record = normalize_item(&row(json!({
      "Items": "Robber Piece",
      "Image": [{"url": "https://cdn.example/robber.png", "size": 1024}],
      "Game": ["Catan"],
      "Pack": "Seafarers",
      "Categories": "Tokens",
      "Sub Categories": "Wood"
    })));

    assert_eq!(record.id, "i-Robber Piece");
    assert_eq!(record.image.as_deref(), Some("https://cdn.example/robber.png"));
    assert_eq!(record.game.as_deref(), Some("Catan"));
    assert_eq!(record.pack.as_deref(), Some("Seafarers"));
    assert_eq!(record.item_category.as_deref(), Some("Tokens"));
    assert_eq!(record.subcategory.as_deref(), Some("Wood"));
  }

  #[test]
  fn test_nameless_item_becomes_unnamed() {
    let record = normalize_item(&row(json!({"Game": "Catan"})));
    assert_eq!(record.name, UNNAMED);
    assert_eq!(record.id, "i-(Unnamed)");
  }

  #[test]
  fn test_failed_category_does_not_fail_the_rest() {
    let snapshot = Snapshot::normalize(CategoryPayloads {
      games: Ok(vec![row(json!({"Name": "Catan"}))]),
      packs: Err(anyhow::anyhow!("Packs fetch failed (502)")),
      items: Ok(vec![row(json!({"Items": "Robber Piece"}))]),
    });

    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot.load_errors.len(), 1);
    assert_eq!(snapshot.load_errors[0].0, Category::Pack);
    assert!(snapshot.load_errors[0].1.contains("502"));
  }

  #[test]
  fn test_same_payload_yields_same_ids() {
    let build = || {
      Snapshot::normalize(CategoryPayloads {
        games: Ok(vec![row(json!({"Name": "Catan"}))]),
        packs: Ok(vec![]),
        items: Ok(vec![]),
      })
    };
    assert_eq!(build().records[0].id, build().records[0].id);
  }
}
