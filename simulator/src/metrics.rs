//! Session metrics.

use std::collections::VecDeque;

use ammsim_sync::ControllerStats;

/// Session metrics.
#[derive(Debug, Clone)]
pub struct SessionMetrics {
    /// Field edits issued.
    pub edits: u64,
    /// Side swaps issued.
    pub swaps: u64,
    /// Token selections issued.
    pub selections: u64,
    /// Confirmed submissions.
    pub submissions: u64,
    /// Rejected steps (unknown token, form not ready).
    pub rejected_steps: u64,
    /// Controller counters at the end of the session.
    pub controller: ControllerStats,
    /// Time from a settle request until the form settled (ms).
    settle_samples: VecDeque<u64>,
    /// Maximum samples to keep.
    max_samples: usize,
}

impl SessionMetrics {
    /// Create new metrics.
    pub fn new() -> Self {
        Self {
            edits: 0,
            swaps: 0,
            selections: 0,
            submissions: 0,
            rejected_steps: 0,
            controller: ControllerStats::default(),
            settle_samples: VecDeque::with_capacity(1024),
            max_samples: 1024,
        }
    }

    /// Record how long the form took to settle.
    pub fn record_settle(&mut self, elapsed_ms: u64) {
        if self.settle_samples.len() >= self.max_samples {
            self.settle_samples.pop_front();
        }
        self.settle_samples.push_back(elapsed_ms);
    }

    /// Get average settle latency in ms.
    pub fn average_settle_ms(&self) -> u64 {
        if self.settle_samples.is_empty() {
            return 0;
        }

        let sum: u64 = self.settle_samples.iter().sum();
        sum / self.settle_samples.len() as u64
    }

    /// Get p99 settle latency in ms.
    pub fn p99_settle_ms(&self) -> u64 {
        if self.settle_samples.is_empty() {
            return 0;
        }

        let mut sorted: Vec<_> = self.settle_samples.iter().copied().collect();
        sorted.sort_unstable();

        let idx = (sorted.len() * 99 / 100).min(sorted.len() - 1);
        sorted[idx]
    }

    /// Share of issued quotes that were dropped as superseded.
    pub fn discard_rate(&self) -> f64 {
        if self.controller.issued == 0 {
            return 0.0;
        }

        self.controller.discarded as f64 / self.controller.issued as f64
    }
}

impl Default for SessionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics() {
        let mut metrics = SessionMetrics::new();

        metrics.record_settle(100);
        metrics.record_settle(200);
        metrics.record_settle(150);
        metrics.controller = ControllerStats {
            issued: 4,
            applied: 3,
            discarded: 1,
        };

        assert_eq!(metrics.average_settle_ms(), 150);
        assert_eq!(metrics.p99_settle_ms(), 200);
        assert_eq!(metrics.discard_rate(), 0.25);
    }
}
