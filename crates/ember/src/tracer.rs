//! Collector tracing infrastructure.
//!
//! [`GcTracer`] hooks the mark and sweep phases of [`Heap::collect_garbage_traced`]. Every
//! hook defaults to a no-op, and the heap takes the tracer as a type parameter, so
//! [`NoopTracer`] compiles away entirely through monomorphization, the same way
//! [`NoLimitTracker`](crate::resource::NoLimitTracker) removes resource checks.
//!
//! | Tracer | Purpose |
//! |--------|---------|
//! | [`NoopTracer`] | Zero-cost no-op (default) |
//! | [`StderrTracer`] | Human-readable collection log to stderr |
//! | [`RecordingTracer`] | Full event recording for tests and post-mortem analysis |
//!
//! [`Heap::collect_garbage_traced`]: crate::Heap::collect_garbage_traced

use crate::heap::HeapId;

/// Summary of one collection cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CollectStats {
    /// Objects marked reachable (permanent objects included).
    pub marked: usize,
    /// Objects freed by the sweep.
    pub swept: usize,
    /// Live objects remaining after the sweep.
    pub live: usize,
}

/// Event emitted during a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GcEvent {
    /// A collection started from `roots` explicit roots.
    Start { roots: usize },
    /// An object was marked for the first time this cycle.
    Mark { id: HeapId, kind: &'static str },
    /// An unreachable object was freed.
    Sweep { id: HeapId, kind: &'static str },
    /// The collection finished.
    End(CollectStats),
}

/// Hooks into the collector's phases.
///
/// Implementations only override the hooks they care about.
pub trait GcTracer: std::fmt::Debug {
    /// Called once before marking begins.
    #[inline(always)]
    fn on_collect_start(&mut self, _roots: usize) {}

    /// Called when an object is marked. Re-marks are not reported.
    ///
    /// This is the hottest hook: it runs once per reachable object.
    #[inline(always)]
    fn on_mark(&mut self, _id: HeapId, _kind: &'static str) {}

    /// Called for each object freed by the sweep.
    #[inline(always)]
    fn on_sweep(&mut self, _id: HeapId, _kind: &'static str) {}

    /// Called once after the sweep.
    #[inline(always)]
    fn on_collect_end(&mut self, _stats: &CollectStats) {}
}

// ============================================================================
// NoopTracer: zero-cost default
// ============================================================================

/// A tracer that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl GcTracer for NoopTracer {}

// ============================================================================
// StderrTracer: human-readable collection log
// ============================================================================

/// Tracer that prints a human-readable collection log to stderr.
///
/// Output format:
/// ```text
/// === GC start  roots=2
///   mark  #0    List
///   mark  #3    Function
///   sweep #1    Tuple
/// === GC end    marked=2 swept=1 live=2
/// ```
#[derive(Debug, Default)]
pub struct StderrTracer {
    /// Maximum number of mark/sweep lines to print per collection. None = unlimited.
    limit: Option<usize>,
    count: usize,
}

impl StderrTracer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tracer that prints at most `limit` mark/sweep lines per collection.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            count: 0,
        }
    }

    fn take_line(&mut self) -> bool {
        if self.limit.is_some_and(|limit| self.count >= limit) {
            return false;
        }
        self.count += 1;
        if self.limit == Some(self.count) {
            eprintln!("--- trace limit reached ({} lines) ---", self.count);
        }
        true
    }
}

impl GcTracer for StderrTracer {
    fn on_collect_start(&mut self, roots: usize) {
        self.count = 0;
        eprintln!("=== GC start  roots={roots}");
    }

    fn on_mark(&mut self, id: HeapId, kind: &'static str) {
        if self.take_line() {
            eprintln!("  mark  #{:<5} {kind}", id.index());
        }
    }

    fn on_sweep(&mut self, id: HeapId, kind: &'static str) {
        if self.take_line() {
            eprintln!("  sweep #{:<5} {kind}", id.index());
        }
    }

    fn on_collect_end(&mut self, stats: &CollectStats) {
        eprintln!(
            "=== GC end    marked={} swept={} live={}",
            stats.marked, stats.swept, stats.live
        );
    }
}

// ============================================================================
// RecordingTracer: full event recording
// ============================================================================

/// Tracer that records every event in order.
///
/// Allocates per event, so use it for tests and short debugging sessions.
#[derive(Debug, Default)]
pub struct RecordingTracer {
    events: Vec<GcEvent>,
    limit: Option<usize>,
}

impl RecordingTracer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a recording tracer that stops recording after `limit` events.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            events: Vec::with_capacity(limit.min(1024)),
            limit: Some(limit),
        }
    }

    #[must_use]
    pub fn events(&self) -> &[GcEvent] {
        &self.events
    }

    #[must_use]
    pub fn into_events(self) -> Vec<GcEvent> {
        self.events
    }

    /// Ids marked so far, in marking order.
    #[must_use]
    pub fn marked_ids(&self) -> Vec<HeapId> {
        self.events
            .iter()
            .filter_map(|e| match e {
                GcEvent::Mark { id, .. } => Some(*id),
                _ => None,
            })
            .collect()
    }

    /// Ids swept so far.
    #[must_use]
    pub fn swept_ids(&self) -> Vec<HeapId> {
        self.events
            .iter()
            .filter_map(|e| match e {
                GcEvent::Sweep { id, .. } => Some(*id),
                _ => None,
            })
            .collect()
    }

    fn record(&mut self, event: GcEvent) {
        if self.limit.is_some_and(|l| self.events.len() >= l) {
            return;
        }
        self.events.push(event);
    }
}

impl GcTracer for RecordingTracer {
    fn on_collect_start(&mut self, roots: usize) {
        self.record(GcEvent::Start { roots });
    }

    fn on_mark(&mut self, id: HeapId, kind: &'static str) {
        self.record(GcEvent::Mark { id, kind });
    }

    fn on_sweep(&mut self, id: HeapId, kind: &'static str) {
        self.record(GcEvent::Sweep { id, kind });
    }

    fn on_collect_end(&mut self, stats: &CollectStats) {
        self.record(GcEvent::End(*stats));
    }
}
