use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use colored::*;

mod client;
mod index;
mod orchestrator;
mod record;
mod render;
mod runtime;
mod similarity;

use client::{ArchiveClient, ClientConfig};
use orchestrator::{Effect, Event, Orchestrator};
use record::{Category, CategoryFilter, Snapshot};

#[derive(Parser)]
#[command(name = "archive")]
#[command(
  about = "Arochea Archives\nSearch and browse the catalog of games, packs, and items"
)]
#[command(version)]
struct Cli {
  /// Base URL of the archive API server
  #[arg(long, env = "ARCHIVE_API_URL", default_value = "http://localhost:8787", global = true)]
  api_url: String,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Search the catalog (falls back to server search on weak results)
  Search {
    /// Search terms (space-separated)
    #[arg(required = true)]
    terms: Vec<String>,
    /// Restrict to one category (game, pack, item)
    #[arg(short, long)]
    category: Option<String>,
  },
  /// Show everything in scope, ignoring any search text
  Browse {
    /// Restrict to one category (game, pack, item)
    #[arg(short, long)]
    category: Option<String>,
  },
  /// Show the detail view for a single record
  Show {
    /// Record name, case-insensitive
    name: String,
  },
  /// Interactive search session (lines are keystrokes; :cat, :browse,
  /// :reset, :q control the rest)
  Live,
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();
  let client = ArchiveClient::with_config(ClientConfig {
    base_url: cli.api_url.clone(),
    ..ClientConfig::default()
  });

  match cli.command {
    Commands::Search { terms, category } => {
      run_search(&client, &terms.join(" "), parse_filter(category.as_deref())?).await?;
    }
    Commands::Browse { category } => {
      run_browse(&client, parse_filter(category.as_deref())?).await?;
    }
    Commands::Show { name } => {
      run_show(&client, &name).await?;
    }
    Commands::Live => {
      let orchestrator = Orchestrator::new(load_snapshot(&client).await);
      runtime::Session::new(orchestrator, client).run().await;
    }
  }

  Ok(())
}

fn parse_filter(category: Option<&str>) -> Result<CategoryFilter> {
  match category {
    None => Ok(CategoryFilter::All),
    Some(label) => Category::parse(label)
      .map(CategoryFilter::Only)
      .ok_or_else(|| anyhow!("unknown category: {label} (expected game, pack, or item)")),
  }
}

async fn load_snapshot(client: &ArchiveClient) -> Snapshot {
  let snapshot = Snapshot::normalize(client.load_catalog().await);
  for (category, message) in &snapshot.load_errors {
    eprintln!("{} {}s failed to load: {}", "warning:".yellow(), category.label(), message);
  }
  snapshot
}

/// One-shot search: drive the orchestrator through a keystroke, its
/// debounce fire, and (if requested) the fallback round trip.
async fn run_search(client: &ArchiveClient, text: &str, filter: CategoryFilter) -> Result<()> {
  let mut orchestrator = Orchestrator::new(load_snapshot(client).await);
  let _ = orchestrator.handle(Event::CategoryChanged(filter));

  let effects = orchestrator.handle(Event::Keystroke(text.to_string()));
  let timer = effects
    .iter()
    .find_map(|e| match e {
      Effect::StartDebounce { timer, .. } => Some(*timer),
      _ => None,
    })
    .ok_or_else(|| anyhow!("keystroke did not arm a debounce timer"))?;

  for effect in orchestrator.handle(Event::DebounceFired(timer)) {
    match effect {
      Effect::Render(plan) => print!("{}", render::render_plan(&plan)),
      Effect::StartFallback { token, query } => {
        let event = match client.search(&query).await {
          Ok(matches) => Event::FallbackResolved { token, matches },
          // Degraded mode: keep the local-only results quietly.
          Err(_) => Event::FallbackFailed { token },
        };
        for merged in orchestrator.handle(event) {
          if let Effect::Render(plan) = merged {
            print!("{}", render::render_plan(&plan));
          }
        }
      }
      _ => {}
    }
  }

  Ok(())
}

async fn run_browse(client: &ArchiveClient, filter: CategoryFilter) -> Result<()> {
  let mut orchestrator = Orchestrator::new(load_snapshot(client).await);
  let _ = orchestrator.handle(Event::CategoryChanged(filter));

  for effect in orchestrator.handle(Event::BrowseToggled(true)) {
    if let Effect::Render(plan) = effect {
      print!("{}", render::render_plan(&plan));
    }
  }

  Ok(())
}

async fn run_show(client: &ArchiveClient, name: &str) -> Result<()> {
  let snapshot = load_snapshot(client).await;
  let wanted = name.to_lowercase();
  let record = snapshot
    .records
    .iter()
    .find(|r| r.name.to_lowercase() == wanted)
    .ok_or_else(|| anyhow!("no record named \"{name}\""))?;

  print!("{}", render::render_detail(record));
  Ok(())
}
