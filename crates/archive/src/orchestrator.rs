//! Query orchestrator: an explicit event-to-effect state machine.
//!
//! All interaction (keystrokes, debounce timers, category and browse
//! toggles, fallback completions) arrives as an `Event`; the machine
//! mutates its own state and hands back `Effect`s for the runtime to
//! execute. No I/O happens here, which is what makes the debounce
//! and staleness rules testable with synthetic event sequences.
//!
//! Staleness is handled with plain sequence numbers: every debounce
//! restart bumps the timer id, every executed search bumps the query
//! token. A timer fire or fallback result carrying an old number is
//! dropped on arrival.

use std::time::Duration;

use crate::index::SearchIndex;
use crate::record::{CategoryFilter, Record, Snapshot};
use crate::render::RenderPlan;

/// Pause after the last keystroke before a search runs.
pub const DEBOUNCE_DELAY: Duration = Duration::from_millis(200);

/// Below this many local hits (with non-empty text) the remote
/// fallback kicks in.
pub const FALLBACK_THRESHOLD: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
  /// Full current input text after a keystroke.
  Keystroke(String),
  /// The debounce timer with this id elapsed.
  DebounceFired(u64),
  CategoryChanged(CategoryFilter),
  BrowseToggled(bool),
  FallbackResolved { token: u64, matches: Vec<Record> },
  FallbackFailed { token: u64 },
  Reset,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
  /// Arm a debounce timer; a later keystroke makes it stale.
  StartDebounce { timer: u64, delay: Duration },
  /// Kick off a remote fallback search for `query`.
  StartFallback { token: u64, query: String },
  Render(RenderPlan),
  /// Empty every rendered list.
  Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
  #[default]
  Idle,
  Debouncing,
  Searching,
  Displaying,
  BrowseAll,
}

/// Current input text plus scope toggles. Mutated only by events.
#[derive(Debug, Clone, Default)]
pub struct QueryState {
  pub text: String,
  pub filter: CategoryFilter,
  pub browse: bool,
}

pub struct Orchestrator {
  index: SearchIndex,
  snapshot: Snapshot,
  state: QueryState,
  phase: Phase,
  /// Id of the most recently armed debounce timer.
  timer_seq: u64,
  /// Token of the most recently executed search; fallback results
  /// must present it to be applied.
  query_seq: u64,
  /// Results currently on screen, rank order.
  displayed: Vec<Record>,
}

impl Orchestrator {
  pub fn new(snapshot: Snapshot) -> Orchestrator {
    let index = SearchIndex::build(&snapshot.records);
    Orchestrator {
      index,
      snapshot,
      state: QueryState::default(),
      phase: Phase::Idle,
      timer_seq: 0,
      query_seq: 0,
      displayed: Vec::new(),
    }
  }

  /// Swap in a freshly loaded snapshot. The index is rebuilt whole
  /// and replaced, never patched.
  pub fn load(&mut self, snapshot: Snapshot) {
    self.index = SearchIndex::build(&snapshot.records);
    self.snapshot = snapshot;
  }

  pub fn phase(&self) -> Phase {
    self.phase
  }

  pub fn state(&self) -> &QueryState {
    &self.state
  }

  pub fn displayed(&self) -> &[Record] {
    &self.displayed
  }

  pub fn handle(&mut self, event: Event) -> Vec<Effect> {
    match event {
      Event::Keystroke(text) => self.on_keystroke(text),
      Event::DebounceFired(timer) => self.on_debounce_fired(timer),
      Event::CategoryChanged(filter) => self.on_category_changed(filter),
      Event::BrowseToggled(on) => self.on_browse_toggled(on),
      Event::FallbackResolved { token, matches } => self.on_fallback_resolved(token, matches),
      Event::FallbackFailed { token } => self.on_fallback_failed(token),
      Event::Reset => self.on_reset(),
    }
  }

  fn on_keystroke(&mut self, text: String) -> Vec<Effect> {
    self.state.text = text;
    // Restarting the timer makes any pending fire stale, and the new
    // text orphans any fallback still in flight for the old one.
    self.timer_seq += 1;
    self.query_seq += 1;
    self.phase = Phase::Debouncing;
    vec![Effect::StartDebounce { timer: self.timer_seq, delay: DEBOUNCE_DELAY }]
  }

  fn on_debounce_fired(&mut self, timer: u64) -> Vec<Effect> {
    if timer != self.timer_seq || self.phase != Phase::Debouncing {
      return Vec::new();
    }
    if self.state.browse {
      return self.render_browse();
    }
    self.run_search()
  }

  /// Category changes re-render immediately from the cached result
  /// set; no debounce and no new index query.
  fn on_category_changed(&mut self, filter: CategoryFilter) -> Vec<Effect> {
    self.state.filter = filter;
    // Supersede any in-flight fallback for the old scope.
    self.query_seq += 1;
    if self.state.browse {
      return self.render_browse();
    }
    vec![Effect::Render(self.plan(self.displayed.clone()))]
  }

  /// Browse on shows the full snapshot in scope, ignoring the text
  /// (browse replaces search, it does not union with it). Browse off
  /// re-runs the text search immediately.
  fn on_browse_toggled(&mut self, on: bool) -> Vec<Effect> {
    self.state.browse = on;
    self.query_seq += 1;
    if on {
      return self.render_browse();
    }
    if self.state.text.trim().is_empty() {
      self.phase = Phase::Idle;
      self.displayed.clear();
      return vec![Effect::Clear];
    }
    self.run_search()
  }

  fn on_fallback_resolved(&mut self, token: u64, matches: Vec<Record>) -> Vec<Effect> {
    if token != self.query_seq {
      tracing::debug!(token, current = self.query_seq, "dropping stale fallback result");
      return Vec::new();
    }

    // Append remote hits the local index missed; never displace or
    // reorder the local ones.
    let mut appended = false;
    for record in matches {
      if !self.displayed.iter().any(|r| r.id == record.id) {
        self.displayed.push(record);
        appended = true;
      }
    }

    if !appended {
      return Vec::new();
    }
    vec![Effect::Render(self.plan(self.displayed.clone()))]
  }

  /// Fallback failure keeps the local-only results on screen.
  fn on_fallback_failed(&mut self, token: u64) -> Vec<Effect> {
    if token == self.query_seq {
      tracing::debug!(token, "fallback search failed, keeping local results");
    }
    Vec::new()
  }

  fn on_reset(&mut self) -> Vec<Effect> {
    self.state = QueryState::default();
    self.phase = Phase::Idle;
    // Bumping both sequences orphans any timer or fallback still in
    // flight.
    self.timer_seq += 1;
    self.query_seq += 1;
    self.displayed.clear();
    vec![Effect::Clear]
  }

  fn run_search(&mut self) -> Vec<Effect> {
    self.phase = Phase::Searching;
    self.query_seq += 1;

    let ranked = self.index.query(&self.state.text);
    self.displayed = ranked.into_iter().map(|r| r.record).collect();

    let mut effects = vec![Effect::Render(self.plan(self.displayed.clone()))];
    if self.displayed.len() < FALLBACK_THRESHOLD && !self.state.text.trim().is_empty() {
      effects.push(Effect::StartFallback {
        token: self.query_seq,
        query: self.state.text.trim().to_string(),
      });
    }

    self.phase = Phase::Displaying;
    effects
  }

  fn render_browse(&mut self) -> Vec<Effect> {
    self.phase = Phase::BrowseAll;
    self.displayed = self.snapshot.records.clone();
    let mut plan = self.plan(self.displayed.clone());
    // Browse ignores the query text, so nothing to highlight.
    plan.term = String::new();
    vec![Effect::Render(plan)]
  }

  fn plan(&self, results: Vec<Record>) -> RenderPlan {
    RenderPlan {
      term: self.state.text.trim().to_string(),
      filter: self.state.filter,
      results,
      errors: self.snapshot.load_errors.clone(),
    }
  }
}
