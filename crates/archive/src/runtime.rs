//! Async driver wiring the pure orchestrator to tokio.
//!
//! One consumer loop owns the orchestrator and executes its effects:
//! debounce timers become spawned sleeps, fallback requests become
//! spawned HTTP calls, render plans go to the terminal. Everything
//! funnels back through a single mpsc channel, so state transitions
//! stay on one logical thread and no locking is needed. In-flight
//! work is never aborted, only ignored when its sequence number has
//! gone stale by the time it reports back.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::client::ArchiveClient;
use crate::orchestrator::{Effect, Event, Orchestrator};
use crate::record::{Category, CategoryFilter};
use crate::render;

/// Arm a debounce timer that reports back as a `DebounceFired`.
pub fn spawn_debounce(tx: mpsc::UnboundedSender<Event>, timer: u64, delay: Duration) {
  tokio::spawn(async move {
    tokio::time::sleep(delay).await;
    // Receiver gone means the session ended; nothing to do.
    let _ = tx.send(Event::DebounceFired(timer));
  });
}

/// Fire a fallback search that reports back tagged with its token.
pub fn spawn_fallback(
  tx: mpsc::UnboundedSender<Event>,
  client: Arc<ArchiveClient>,
  token: u64,
  query: String,
) {
  tokio::spawn(async move {
    let event = match client.search(&query).await {
      Ok(matches) => Event::FallbackResolved { token, matches },
      Err(e) => {
        tracing::debug!(error = %e, "fallback search failed");
        Event::FallbackFailed { token }
      }
    };
    let _ = tx.send(event);
  });
}

/// Interactive session: reads input lines, drives the orchestrator,
/// prints whatever it says to render.
pub struct Session {
  orchestrator: Orchestrator,
  client: Arc<ArchiveClient>,
  tx: mpsc::UnboundedSender<Event>,
  rx: mpsc::UnboundedReceiver<Event>,
}

impl Session {
  pub fn new(orchestrator: Orchestrator, client: ArchiveClient) -> Session {
    let (tx, rx) = mpsc::unbounded_channel();
    Session { orchestrator, client: Arc::new(client), tx, rx }
  }

  /// Feed one event through the machine and execute its effects.
  pub fn dispatch(&mut self, event: Event) {
    for effect in self.orchestrator.handle(event) {
      match effect {
        Effect::StartDebounce { timer, delay } => {
          spawn_debounce(self.tx.clone(), timer, delay);
        }
        Effect::StartFallback { token, query } => {
          spawn_fallback(self.tx.clone(), self.client.clone(), token, query);
        }
        Effect::Render(plan) => {
          print!("{}", render::render_plan(&plan));
        }
        Effect::Clear => {
          println!("(cleared)");
        }
      }
    }
  }

  /// Run the interactive loop over stdin until EOF or `:q`.
  ///
  /// Plain lines are keystrokes; `:cat <scope>`, `:browse`, `:reset`
  /// drive the other controls.
  pub async fn run(mut self) {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    let mut browsing = false;

    loop {
      tokio::select! {
        event = self.rx.recv() => {
          match event {
            Some(event) => self.dispatch(event),
            None => break,
          }
        }
        line = lines.next_line() => {
          let line = match line {
            Ok(Some(line)) => line,
            _ => break,
          };
          match parse_command(&line) {
            Command::Quit => break,
            Command::Reset => {
              browsing = false;
              self.dispatch(Event::Reset);
            }
            Command::Browse => {
              browsing = !browsing;
              self.dispatch(Event::BrowseToggled(browsing));
            }
            Command::Scope(filter) => self.dispatch(Event::CategoryChanged(filter)),
            Command::Keystroke(text) => self.dispatch(Event::Keystroke(text)),
          }
        }
      }
    }
  }
}

enum Command {
  Keystroke(String),
  Scope(CategoryFilter),
  Browse,
  Reset,
  Quit,
}

fn parse_command(line: &str) -> Command {
  let trimmed = line.trim();
  match trimmed {
    ":q" | ":quit" => Command::Quit,
    ":reset" => Command::Reset,
    ":browse" => Command::Browse,
    _ => {
      if let Some(scope) = trimmed.strip_prefix(":cat ") {
        let filter = match Category::parse(scope.trim()) {
          Some(category) => CategoryFilter::Only(category),
          None => CategoryFilter::All,
        };
        return Command::Scope(filter);
      }
      Command::Keystroke(trimmed.to_string())
    }
  }
}
