//! Search-as-you-type plumbing.
//!
//! Keystrokes arrive faster than trees can be searched. A [`Debouncer`]
//! coalesces them: only the text that stayed unchanged for the configured delay
//! is released. Every released query becomes a [`QueryRun`] stamped by a
//! [`QueryRunTracker`]; when a newer run starts, results of older runs are
//! discarded instead of overwriting fresher ones.
//!
//! Time is passed in explicitly (`Instant`) so callers drive the clock from
//! their own event loop and tests stay deterministic.

use super::{parse_query, search_tree, SearchOptions, SearchOutcome, SearchQuery};
use crate::tree::Tree;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Holds the latest input until it has been quiet for `delay`.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<(String, Instant)>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replaces any pending input and restarts the quiet period.
    pub fn submit(&mut self, text: impl Into<String>, now: Instant) {
        self.pending = Some((text.into(), now));
    }

    /// Releases the pending input once the quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        let ready = self
            .pending
            .as_ref()
            .is_some_and(|(_, at)| now.saturating_duration_since(*at) >= self.delay);
        if ready {
            self.pending.take().map(|(text, _)| text)
        } else {
            None
        }
    }

    /// Releases the pending input immediately.
    pub fn flush(&mut self) -> Option<String> {
        self.pending.take().map(|(text, _)| text)
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Hands out monotonically increasing run ids.
///
/// Cloning shares the counter, so a run can be checked from wherever its
/// results end up.
#[derive(Debug, Clone, Default)]
pub struct QueryRunTracker {
    current: Arc<AtomicU64>,
}

impl QueryRunTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new run, superseding every earlier one.
    pub fn next_run(&self) -> u64 {
        self.current.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current_run(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, run: u64) -> bool {
        run == self.current_run()
    }
}

/// A query released by the debouncer, stamped with its run id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRun {
    pub id: u64,
    pub text: String,
    pub positive: SearchQuery,
    pub negative: SearchQuery,
}

/// Debouncer and run tracker for one search box.
#[derive(Debug, Clone)]
pub struct SearchSession {
    debouncer: Debouncer,
    runs: QueryRunTracker,
    options: SearchOptions,
    last_text: Option<String>,
}

impl SearchSession {
    pub fn new(delay: Duration, options: SearchOptions) -> Self {
        Self {
            debouncer: Debouncer::new(delay),
            runs: QueryRunTracker::new(),
            options,
            last_text: None,
        }
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    pub fn tracker(&self) -> QueryRunTracker {
        self.runs.clone()
    }

    /// Records a keystroke.
    pub fn input(&mut self, text: impl Into<String>, now: Instant) {
        self.debouncer.submit(text, now);
    }

    /// Starts a run if the input has settled and differs from the last run.
    pub fn poll(&mut self, now: Instant) -> Option<QueryRun> {
        let text = self.debouncer.poll(now)?;
        self.start(text)
    }

    /// Starts a run for the pending input right away.
    pub fn flush(&mut self) -> Option<QueryRun> {
        let text = self.debouncer.flush()?;
        self.start(text)
    }

    fn start(&mut self, text: String) -> Option<QueryRun> {
        let normalized = text.trim().to_lowercase();
        if self.last_text.as_deref() == Some(normalized.as_str()) {
            tracing::debug!(query = %normalized, "query unchanged, skipping run");
            return None;
        }
        self.last_text = Some(normalized.clone());
        let (positive, negative) = parse_query(&normalized);
        Some(QueryRun {
            id: self.runs.next_run(),
            text: normalized,
            positive,
            negative,
        })
    }

    /// Searches `tree` for `run`; `None` if the run was superseded meanwhile.
    pub fn execute(&self, run: &QueryRun, tree: &Tree) -> Option<SearchOutcome> {
        if !self.runs.is_current(run.id) {
            return None;
        }
        let outcome = search_tree(tree, &run.positive, &run.negative, &self.options);
        self.accept(run, outcome)
    }

    /// Keeps `outcome` only if `run` is still the latest.
    pub fn accept(&self, run: &QueryRun, outcome: SearchOutcome) -> Option<SearchOutcome> {
        if self.runs.is_current(run.id) {
            Some(outcome)
        } else {
            tracing::debug!(run = run.id, current = self.runs.current_run(), "discarding stale search results");
            None
        }
    }

    /// Forgets pending input and the last query, e.g. when the view closes.
    pub fn reset(&mut self) {
        self.debouncer.cancel();
        self.last_text = None;
        self.runs.next_run();
    }
}
