//! Server clock estimate

use crate::game::constants::SERVER_CLOCK_SMOOTHING;

/// Smoothed offset between the local clock and the server clock.
///
/// `offset = local - server`. The first sample is taken as-is; later samples
/// move the estimate by `SERVER_CLOCK_SMOOTHING` of the difference so jitter
/// never causes a visible jump.
#[derive(Debug, Clone, Default)]
pub struct ServerClock {
    offset: Option<f64>,
}

impl ServerClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one snapshot timestamp observed at `local_now`
    pub fn observe(&mut self, local_now: f64, server_timestamp: f64) {
        let sample = local_now - server_timestamp;
        self.offset = Some(match self.offset {
            None => sample,
            Some(current) => current + (sample - current) * SERVER_CLOCK_SMOOTHING,
        });
    }

    pub fn is_synced(&self) -> bool {
        self.offset.is_some()
    }

    /// Estimated server time, or `None` before the first snapshot
    pub fn server_now(&self, local_now: f64) -> Option<f64> {
        self.offset.map(|offset| local_now - offset)
    }

    pub fn reset(&mut self) {
        self.offset = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn first_sample_sets_offset_outright() {
        let mut clock = ServerClock::new();
        assert!(clock.server_now(10.0).is_none());

        clock.observe(1_000.0, 50_000.0);
        assert_approx_eq!(clock.server_now(1_000.0).unwrap(), 50_000.0);
        assert_approx_eq!(clock.server_now(1_250.0).unwrap(), 50_250.0);
    }

    #[test]
    fn later_samples_are_smoothed() {
        let mut clock = ServerClock::new();
        clock.observe(1_000.0, 50_000.0); // offset -49000
        clock.observe(2_000.0, 51_100.0); // sample -49100

        // -49000 + (-100 * 0.1) = -49010
        assert_approx_eq!(clock.server_now(2_000.0).unwrap(), 51_010.0);

        clock.reset();
        assert!(!clock.is_synced());
    }
}
