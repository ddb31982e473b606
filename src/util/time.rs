//! Time utilities for game simulation

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Get current Unix timestamp in milliseconds
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// Server start time for uptime tracking
static SERVER_START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize server start time (call once at startup)
pub fn init_server_time() {
    SERVER_START.get_or_init(Instant::now);
}

/// Get server uptime in seconds
pub fn uptime_secs() -> u64 {
    SERVER_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// Tick rate configuration
pub const SIMULATION_TPS: u32 = 60; // 60 ticks per second
pub const SNAPSHOT_TPS: u32 = 20; // 20 snapshots per second
pub const SNAPSHOT_INTERVAL_MS: u64 = 1000 / SNAPSHOT_TPS as u64;

/// Wall-clock length of one tick at the given rate
pub fn tick_duration(tick_rate: u32) -> Duration {
    Duration::from_micros(1_000_000 / tick_rate.max(1) as u64)
}

/// Fixed simulation step in milliseconds
pub fn tick_interval_ms(tick_rate: u32) -> f32 {
    1000.0 / tick_rate.max(1) as f32
}
