//! Process-global evaluation counters.
//!
//! Counters are bumped silently at the call site. Call [`Metrics::flush`] to
//! emit the current values as one `tracing::info!` event, typically when the
//! CLI exits.

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Atomic counters. No allocation, no locking.
pub struct Metrics {
    content_evaluations: AtomicU64,
    agent_evaluations: AtomicU64,
    axis_fallbacks: AtomicU64,
    reports_written: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            content_evaluations: AtomicU64::new(0),
            agent_evaluations: AtomicU64::new(0),
            axis_fallbacks: AtomicU64::new(0),
            reports_written: AtomicU64::new(0),
        }
    }

    pub fn inc_content_evaluations(&self) {
        self.content_evaluations.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "content_evaluations", "counter incremented");
    }

    pub fn inc_agent_evaluations(&self) {
        self.agent_evaluations.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "agent_evaluations", "counter incremented");
    }

    /// Count one content axis that fell back to its default score.
    pub fn inc_axis_fallbacks(&self) {
        self.axis_fallbacks.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "axis_fallbacks", "counter incremented");
    }

    pub fn inc_reports_written(&self) {
        self.reports_written.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "reports_written", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            content_evaluations = self.content_evaluations(),
            agent_evaluations = self.agent_evaluations(),
            axis_fallbacks = self.axis_fallbacks(),
            reports_written = self.reports_written(),
        );
    }

    pub fn content_evaluations(&self) -> u64 {
        self.content_evaluations.load(Ordering::Relaxed)
    }

    pub fn agent_evaluations(&self) -> u64 {
        self.agent_evaluations.load(Ordering::Relaxed)
    }

    pub fn axis_fallbacks(&self) -> u64 {
        self.axis_fallbacks.load(Ordering::Relaxed)
    }

    pub fn reports_written(&self) -> u64 {
        self.reports_written.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.content_evaluations.store(0, Ordering::Relaxed);
        self.agent_evaluations.store(0, Ordering::Relaxed);
        self.axis_fallbacks.store(0, Ordering::Relaxed);
        self.reports_written.store(0, Ordering::Relaxed);
    }
}
