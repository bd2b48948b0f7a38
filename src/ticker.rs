//! Periodic re-evaluation of derived status.
//!
//! The ticker never touches task data. When it fires the caller re-samples
//! `now` and redraws, so overdue transitions show up without user action.

use std::time::{Duration, Instant};

/// Default interval between refreshes.
pub const DEFAULT_REFRESH: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct RefreshTicker {
    interval: Duration,
    last: Instant,
}

impl RefreshTicker {
    pub fn new(interval: Duration, start: Instant) -> Self {
        RefreshTicker {
            // A zero interval would fire on every poll.
            interval: interval.max(Duration::from_secs(1)),
            last: start,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns true once per elapsed interval.
    pub fn poll(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last) >= self.interval {
            self.last = now;
            true
        } else {
            false
        }
    }

    /// Time left before the next firing, for sizing event poll timeouts.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.interval
            .saturating_sub(now.saturating_duration_since(self.last))
    }
}

impl Default for RefreshTicker {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH, Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_per_interval() {
        let start = Instant::now();
        let mut ticker = RefreshTicker::new(Duration::from_secs(60), start);
        assert!(!ticker.poll(start + Duration::from_secs(59)));
        assert!(ticker.poll(start + Duration::from_secs(60)));
        assert!(!ticker.poll(start + Duration::from_secs(61)));
        assert!(ticker.poll(start + Duration::from_secs(125)));
    }

    #[test]
    fn remaining_counts_down() {
        let start = Instant::now();
        let ticker = RefreshTicker::new(Duration::from_secs(10), start);
        assert_eq!(ticker.remaining(start + Duration::from_secs(4)), Duration::from_secs(6));
        assert_eq!(ticker.remaining(start + Duration::from_secs(40)), Duration::ZERO);
    }

    #[test]
    fn zero_interval_is_clamped() {
        let ticker = RefreshTicker::new(Duration::ZERO, Instant::now());
        assert_eq!(ticker.interval(), Duration::from_secs(1));
    }
}
