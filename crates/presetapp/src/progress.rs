//! Progress reporting and cooperative cancellation for long-running operations.
//!
//! Import, export and folder copy are loops of store calls. Each loop owns a
//! [`ProgressTracker`], reports one step per item, and checks
//! [`ProgressTracker::is_cancelled`] between items. Whoever displays progress
//! holds a [`CancelHandle`] to the same flag.
//!
//! Cancellation stops the loop at the next check. Work already done stays done.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A snapshot of an operation's progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub label: String,
    pub current: usize,
    pub total: usize,
}

impl Progress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.current as f64 / self.total as f64
        }
    }
}

/// Cancels the tracker it was taken from. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    active: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        !self.active.load(Ordering::SeqCst)
    }
}

type Listener = Box<dyn FnMut(&Progress)>;

pub struct ProgressTracker {
    label: String,
    current: usize,
    total: usize,
    active: Arc<AtomicBool>,
    listener: Option<Listener>,
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("label", &self.label)
            .field("current", &self.current)
            .field("total", &self.total)
            .field("active", &self.active.load(Ordering::SeqCst))
            .finish()
    }
}

impl ProgressTracker {
    pub fn new(label: impl Into<String>, total: usize) -> Self {
        Self {
            label: label.into(),
            current: 0,
            total,
            active: Arc::new(AtomicBool::new(true)),
            listener: None,
        }
    }

    /// Calls `listener` after every step.
    pub fn on_progress<F>(mut self, listener: F) -> Self
    where
        F: FnMut(&Progress) + 'static,
    {
        self.listener = Some(Box::new(listener));
        self
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            active: Arc::clone(&self.active),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        !self.active.load(Ordering::SeqCst)
    }

    pub fn set_total(&mut self, total: usize) {
        self.total = total;
    }

    /// Records one finished item.
    pub fn step(&mut self) {
        self.current += 1;
        let snapshot = self.snapshot();
        if let Some(listener) = self.listener.as_mut() {
            listener(&snapshot);
        }
    }

    pub fn snapshot(&self) -> Progress {
        Progress {
            label: self.label.clone(),
            current: self.current,
            total: self.total,
        }
    }

    /// Marks the operation finished; later checks report cancelled.
    pub fn finish(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        tracing::debug!(label = %self.label, done = self.current, total = self.total, "progress finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_steps_report_to_listener() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut tracker =
            ProgressTracker::new("export", 3).on_progress(move |p| sink.borrow_mut().push(p.current));
        tracker.step();
        tracker.step();
        assert_eq!(*seen.borrow(), vec![1, 2]);
        assert_eq!(tracker.snapshot().total, 3);
        assert!((tracker.snapshot().fraction() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_cancel_handle_stops_tracker() {
        let tracker = ProgressTracker::new("import", 10);
        let handle = tracker.cancel_handle();
        assert!(!tracker.is_cancelled());
        handle.clone().cancel();
        assert!(tracker.is_cancelled());
        assert!(handle.is_cancelled());
    }

    #[test]
    fn test_empty_progress_is_complete() {
        let tracker = ProgressTracker::new("copy", 0);
        assert_eq!(tracker.snapshot().fraction(), 1.0);
    }
}
