// Polling statistics: lookups, tick outcomes, failures, detected changes.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollStatsSnapshot {
    pub lookups: u64,
    pub sessions_started: u64,
    pub ticks_issued: u64,
    pub ticks_applied: u64,
    pub ticks_discarded: u64,
    pub ticks_skipped: u64,
    pub failures: u64,
    pub changes_emitted: u64,
    pub last_fetch_ms: u64,
}

#[derive(Debug, Default)]
pub struct PollStats {
    lookups: AtomicU64,
    sessions_started: AtomicU64,
    ticks_issued: AtomicU64,
    ticks_applied: AtomicU64,
    ticks_discarded: AtomicU64,
    ticks_skipped: AtomicU64,
    failures: AtomicU64,
    changes_emitted: AtomicU64,
    last_fetch_ms: AtomicU64,
}

impl PollStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_lookup(&self) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_session_started(&self) {
        self.sessions_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tick_issued(&self) {
        self.ticks_issued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tick_applied(&self) {
        self.ticks_applied.fetch_add(1, Ordering::Relaxed);
    }

    /// A response arrived for a session that is no longer current.
    pub fn record_tick_discarded(&self) {
        self.ticks_discarded.fetch_add(1, Ordering::Relaxed);
    }

    /// A tick fired while the previous fetch was still in flight and was dropped.
    pub fn record_tick_skipped(&self) {
        self.ticks_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_change(&self) {
        self.changes_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch_latency(&self, millis: u64) {
        self.last_fetch_ms.store(millis, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> PollStatsSnapshot {
        PollStatsSnapshot {
            lookups: self.lookups.load(Ordering::Relaxed),
            sessions_started: self.sessions_started.load(Ordering::Relaxed),
            ticks_issued: self.ticks_issued.load(Ordering::Relaxed),
            ticks_applied: self.ticks_applied.load(Ordering::Relaxed),
            ticks_discarded: self.ticks_discarded.load(Ordering::Relaxed),
            ticks_skipped: self.ticks_skipped.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            changes_emitted: self.changes_emitted.load(Ordering::Relaxed),
            last_fetch_ms: self.last_fetch_ms.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_basic() {
        let stats = PollStats::new();
        stats.record_lookup();
        stats.record_session_started();
        stats.record_tick_issued();
        stats.record_tick_issued();
        stats.record_tick_applied();
        stats.record_tick_discarded();
        stats.record_change();
        stats.record_fetch_latency(42);
        stats.record_fetch_latency(17);

        let snap = stats.snapshot();
        assert_eq!(snap.lookups, 1);
        assert_eq!(snap.sessions_started, 1);
        assert_eq!(snap.ticks_issued, 2);
        assert_eq!(snap.ticks_applied, 1);
        assert_eq!(snap.ticks_discarded, 1);
        assert_eq!(snap.ticks_skipped, 0);
        assert_eq!(snap.failures, 0);
        assert_eq!(snap.changes_emitted, 1);
        assert_eq!(snap.last_fetch_ms, 17);
    }
}
