//! Advisory progress for a running search.
//!
//! Workers bump per-heuristic `done`/`total` counters; a UI thread polls [`PackProgress::fraction`].
//! The reported value is latched to the highest value ever computed, so phase changes that
//! re-estimate a total never make the bar jump backwards.

use crate::config::Heuristic;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[derive(Debug, Default)]
struct Counter {
    done: AtomicU64,
    total: AtomicU64,
}

impl Counter {
    fn ratio(&self) -> f64 {
        let total = self.total.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        let done = self.done.load(Ordering::Relaxed);
        (done as f64 / total as f64).min(1.0)
    }
}

#[derive(Debug, Default)]
pub struct PackProgress {
    counters: [Counter; Heuristic::ALL.len()],
    // f64 bits; for non-negative floats the bit pattern orders like the value
    latched: AtomicU64,
    all_done: AtomicBool,
}

impl PackProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts (or restarts) a heuristic with `total` units of work.
    pub fn begin(&self, heuristic: Heuristic, total: u64) {
        let c = &self.counters[heuristic.index()];
        c.done.store(0, Ordering::Relaxed);
        c.total.store(total.max(1), Ordering::Relaxed);
    }

    /// Re-estimates the amount of work without touching what has been done.
    pub fn set_total(&self, heuristic: Heuristic, total: u64) {
        self.counters[heuristic.index()]
            .total
            .store(total.max(1), Ordering::Relaxed);
    }

    pub fn advance(&self, heuristic: Heuristic, units: u64) {
        self.counters[heuristic.index()]
            .done
            .fetch_add(units, Ordering::Relaxed);
    }

    pub fn set_done(&self, heuristic: Heuristic, done: u64) {
        self.counters[heuristic.index()]
            .done
            .store(done, Ordering::Relaxed);
    }

    /// Marks one heuristic complete.
    pub fn finish(&self, heuristic: Heuristic) {
        let c = &self.counters[heuristic.index()];
        let total = c.total.load(Ordering::Relaxed).max(1);
        c.total.store(total, Ordering::Relaxed);
        c.done.store(total, Ordering::Relaxed);
    }

    /// Marks every heuristic complete and latches the done flag.
    pub fn force_all_done(&self) {
        for h in Heuristic::ALL {
            self.finish(h);
        }
        self.latched.fetch_max(1.0f64.to_bits(), Ordering::Relaxed);
        self.all_done.store(true, Ordering::Release);
    }

    /// Overall progress in `[0, 1]`; never smaller than a previously returned value.
    pub fn fraction(&self) -> f64 {
        let sum: f64 = self.counters.iter().map(Counter::ratio).sum();
        let raw = (sum / self.counters.len() as f64).clamp(0.0, 1.0);
        let prev = self.latched.fetch_max(raw.to_bits(), Ordering::Relaxed);
        f64::from_bits(prev).max(raw)
    }

    pub fn is_done(&self) -> bool {
        self.all_done.load(Ordering::Acquire)
    }

    /// Clears counters and latches for reuse across searches.
    pub fn reset(&self) {
        for c in &self.counters {
            c.done.store(0, Ordering::Relaxed);
            c.total.store(0, Ordering::Relaxed);
        }
        self.latched.store(0, Ordering::Relaxed);
        self.all_done.store(false, Ordering::Release);
    }
}
