//! End-to-end flow through normalization, the orchestrator, and the
//! terminal renderer, without any network or UI harness.

use archive::orchestrator::{Effect, Event, Orchestrator};
use archive::record::{Category, CategoryFilter, CategoryPayloads, RawRow, Snapshot};
use archive::render;
use serde_json::json;

fn row(fields: serde_json::Value) -> RawRow {
  RawRow { id: "rec1".to_string(), fields: serde_json::from_value(fields).unwrap() }
}

fn catalog() -> Snapshot {
  Snapshot::normalize(CategoryPayloads {
    games: Ok(vec![row(json!({"Name": "Catan"})), row(json!({"Title": "Firewatch"}))]),
    packs: Ok(vec![row(json!({"Name": "Seafarers"}))]),
    items: Ok(vec![row(json!({
      "Items": "Robber Piece",
      "Game": "Catan",
      "Categories": "Tokens"
    }))]),
  })
}

fn type_and_fire(orch: &mut Orchestrator, text: &str) -> Vec<Effect> {
  let effects = orch.handle(Event::Keystroke(text.to_string()));
  let timer = effects
    .iter()
    .find_map(|e| match e {
      Effect::StartDebounce { timer, .. } => Some(*timer),
      _ => None,
    })
    .expect("keystroke should arm a timer");
  orch.handle(Event::DebounceFired(timer))
}

fn rendered(effects: &[Effect]) -> String {
  colored::control::set_override(false);
  effects
    .iter()
    .filter_map(|e| match e {
      Effect::Render(plan) => Some(render::render_plan(plan)),
      _ => None,
    })
    .collect()
}

#[test]
fn search_partitions_results_into_category_lists() {
  let mut orch = Orchestrator::new(catalog());

  let output = rendered(&type_and_fire(&mut orch, "cat"));
  let games_section = output.split("[packs]").next().unwrap();
  assert!(games_section.contains("Catan"));
  assert!(!games_section.contains("Robber Piece"));

  let output = rendered(&type_and_fire(&mut orch, "robber"));
  let items_section = output.split("[items]").nth(1).unwrap();
  assert!(items_section.contains("Robber Piece"));
  assert!(!output.split("[packs]").next().unwrap().contains("Robber Piece"));
}

#[test]
fn category_filter_hides_other_sections() {
  let mut orch = Orchestrator::new(catalog());
  let _ = orch.handle(Event::CategoryChanged(CategoryFilter::Only(Category::Game)));

  let output = rendered(&type_and_fire(&mut orch, "cat"));
  assert!(output.contains("[games]"));
  assert!(!output.contains("[items]"));
}

#[test]
fn browse_lists_full_catalog_and_reset_clears_it() {
  let mut orch = Orchestrator::new(catalog());
  let effects = orch.handle(Event::BrowseToggled(true));
  let output = rendered(&effects);
  for name in ["Catan", "Firewatch", "Seafarers", "Robber Piece"] {
    assert!(output.contains(name), "browse output missing {name}");
  }

  let effects = orch.handle(Event::Reset);
  assert_eq!(effects, vec![Effect::Clear]);
  assert!(orch.displayed().is_empty());
}

#[test]
fn failed_category_still_searches_the_others() {
  let snapshot = Snapshot::normalize(CategoryPayloads {
    games: Ok(vec![row(json!({"Name": "Catan"}))]),
    packs: Err(anyhow::anyhow!("upstream 502")),
    items: Ok(vec![row(json!({"Items": "Robber Piece"}))]),
  });
  let mut orch = Orchestrator::new(snapshot);

  let output = rendered(&type_and_fire(&mut orch, "catan"));
  assert!(output.contains("Catan"));
  assert!(output.contains("failed to load: upstream 502"));
}

#[test]
fn fallback_merge_appends_into_the_right_section() {
  let mut orch = Orchestrator::new(catalog());
  let effects = type_and_fire(&mut orch, "seafarers");
  let token = effects
    .iter()
    .find_map(|e| match e {
      Effect::StartFallback { token, .. } => Some(*token),
      _ => None,
    })
    .expect("sparse result should trigger fallback");

  let mut remote = archive::record::Record::new(Category::Item, "Seafarers Tile");
  remote.pack = Some("Seafarers".to_string());
  let merged = orch.handle(Event::FallbackResolved { token, matches: vec![remote] });

  let output = rendered(&merged);
  let items_section = output.split("[items]").nth(1).unwrap();
  assert!(items_section.contains("Seafarers Tile"));
}
