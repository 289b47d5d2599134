//! Best-effort progress and ETA tracking for a checking run.

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

/// Number of most recent call latencies used for the moving average.
const LATENCY_WINDOW: usize = 50;

#[derive(Debug)]
pub struct ProgressTracker {
    total: usize,
    completed: usize,
    workers: usize,
    report_every: usize,
    started: Instant,
    window: VecDeque<Duration>,
    window_sum: Duration,
}

/// Point-in-time view of a run's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub completed: usize,
    pub total: usize,
    pub elapsed: Duration,
    pub eta: Option<Duration>,
}

impl ProgressTracker {
    pub fn new(total: usize, workers: usize, report_every: usize) -> Self {
        Self {
            total,
            completed: 0,
            workers: workers.max(1),
            report_every: report_every.max(1),
            started: Instant::now(),
            window: VecDeque::with_capacity(LATENCY_WINDOW),
            window_sum: Duration::ZERO,
        }
    }

    /// Record one finished check and return the updated snapshot.
    pub fn record(&mut self, latency: Duration) -> ProgressSnapshot {
        self.completed += 1;
        if self.window.len() == LATENCY_WINDOW {
            if let Some(oldest) = self.window.pop_front() {
                self.window_sum -= oldest;
            }
        }
        self.window.push_back(latency);
        self.window_sum += latency;
        self.snapshot()
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    /// True when the latest record lands on a reporting boundary or
    /// finishes the run.
    pub fn should_report(&self) -> bool {
        self.completed > 0
            && (self.completed % self.report_every == 0 || self.completed == self.total)
    }

    pub fn average_latency(&self) -> Option<Duration> {
        if self.window.is_empty() {
            return None;
        }
        Some(self.window_sum / self.window.len() as u32)
    }

    /// Remaining work divided across the worker pool at the average latency.
    pub fn eta(&self) -> Option<Duration> {
        let average = self.average_latency()?;
        let remaining = self.total.saturating_sub(self.completed);
        let batches = remaining.div_ceil(self.workers);
        Some(average * batches as u32)
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            completed: self.completed,
            total: self.total,
            elapsed: self.started.elapsed(),
            eta: self.eta(),
        }
    }
}

impl fmt::Display for ProgressSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pct = if self.total == 0 {
            100.0
        } else {
            self.completed as f64 * 100.0 / self.total as f64
        };
        write!(
            f,
            "Checking NFT ownership: {}/{} ({:.1}%), elapsed {:.1}s",
            self.completed,
            self.total,
            pct,
            self.elapsed.as_secs_f64()
        )?;
        match self.eta {
            Some(eta) => write!(f, ", ~{:.1}s remaining", eta.as_secs_f64()),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eta_spreads_remaining_across_workers() {
        let mut tracker = ProgressTracker::new(10, 2, 5);
        tracker.record(Duration::from_millis(100));
        tracker.record(Duration::from_millis(300));
        assert_eq!(tracker.average_latency(), Some(Duration::from_millis(200)));
        // 8 remaining over 2 workers -> 4 rounds of 200ms
        assert_eq!(tracker.eta(), Some(Duration::from_millis(800)));
    }

    #[test]
    fn test_moving_average_forgets_old_samples() {
        let mut tracker = ProgressTracker::new(1000, 1, 10);
        for _ in 0..LATENCY_WINDOW {
            tracker.record(Duration::from_secs(10));
        }
        for _ in 0..LATENCY_WINDOW {
            tracker.record(Duration::from_millis(10));
        }
        assert_eq!(tracker.average_latency(), Some(Duration::from_millis(10)));
    }

    #[test]
    fn test_completed_is_monotonic_and_reports_on_boundaries() {
        let mut tracker = ProgressTracker::new(7, 3, 3);
        let mut reports = Vec::new();
        for i in 1..=7 {
            let snap = tracker.record(Duration::from_millis(1));
            assert_eq!(snap.completed, i);
            if tracker.should_report() {
                reports.push(i);
            }
        }
        assert_eq!(reports, vec![3, 6, 7]);
        assert_eq!(tracker.eta(), Some(Duration::ZERO));
    }

    #[test]
    fn test_no_eta_before_first_sample() {
        let tracker = ProgressTracker::new(5, 1, 1);
        assert_eq!(tracker.eta(), None);
        assert!(!tracker.should_report());
    }
}
