//! Round-trip latency probe

use crate::game::constants::{PING_INTERVAL_MS, PING_SMOOTHING};

/// Fixed-interval ping scheduler with an exponentially smoothed result
#[derive(Debug, Clone, Default)]
pub struct LatencyTracker {
    last_probe_at: Option<f64>,
    ping: Option<f64>,
}

impl LatencyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nonce to send if a probe is due. The nonce is the local send time.
    pub fn poll_probe(&mut self, local_now: f64) -> Option<f64> {
        let due = self
            .last_probe_at
            .map_or(true, |last| local_now - last >= PING_INTERVAL_MS);
        if !due {
            return None;
        }
        self.last_probe_at = Some(local_now);
        Some(local_now)
    }

    /// Fold in an echoed nonce
    pub fn record_response(&mut self, nonce: f64, local_now: f64) {
        let sample = (local_now - nonce).max(0.0);
        let current = self.ping.unwrap_or(sample);
        self.ping = Some(current + (sample - current) * PING_SMOOTHING);
    }

    /// Smoothed round trip in milliseconds, zero until measured
    pub fn ping(&self) -> f64 {
        self.ping.unwrap_or(0.0)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn probes_follow_the_interval() {
        let mut tracker = LatencyTracker::new();
        assert_eq!(tracker.poll_probe(100.0), Some(100.0));
        assert_eq!(tracker.poll_probe(1_500.0), None);
        assert_eq!(tracker.poll_probe(2_100.0), Some(2_100.0));
    }

    #[test]
    fn ping_is_smoothed_after_first_sample() {
        let mut tracker = LatencyTracker::new();
        assert_eq!(tracker.ping(), 0.0);

        tracker.record_response(1_000.0, 1_080.0);
        assert_approx_eq!(tracker.ping(), 80.0);

        tracker.record_response(3_000.0, 3_180.0);
        // 80 + (180 - 80) * 0.2
        assert_approx_eq!(tracker.ping(), 100.0);
    }
}
