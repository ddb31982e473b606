//! Remote entity interpolation

use std::collections::{BTreeMap, VecDeque};

use crate::game::constants::{INTERPOLATION_DELAY_MS, REMOTE_BUFFER_CAPACITY};
use crate::game::kinematics::{angle_lerp, lerp};
use crate::game::PlayerId;
use crate::ws::protocol::{PlayerSnapshot, Snapshot};

#[derive(Debug, Clone)]
struct Sample {
    /// Server timestamp of the snapshot this came from
    timestamp: f64,
    state: PlayerSnapshot,
}

/// Per-remote-player history rendered a fixed delay behind the server
#[derive(Debug, Clone)]
pub struct Interpolator {
    buffers: BTreeMap<PlayerId, VecDeque<Sample>>,
    delay_ms: f64,
    capacity: usize,
}

impl Default for Interpolator {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpolator {
    pub fn new() -> Self {
        Self {
            buffers: BTreeMap::new(),
            delay_ms: INTERPOLATION_DELAY_MS,
            capacity: REMOTE_BUFFER_CAPACITY,
        }
    }

    /// Number of remote players being tracked
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    pub fn buffered(&self, id: PlayerId) -> usize {
        self.buffers.get(&id).map_or(0, VecDeque::len)
    }

    /// Record every remote player in the snapshot and forget the ones that
    /// are gone. The local player is never buffered.
    pub fn push_snapshot(&mut self, snapshot: &Snapshot, local_id: Option<PlayerId>) {
        let timestamp = snapshot.timestamp as f64;

        for player in snapshot.players.iter().filter(|p| Some(p.id) != local_id) {
            let buffer = self.buffers.entry(player.id).or_default();
            buffer.push_back(Sample {
                timestamp,
                state: player.clone(),
            });
            while buffer.len() > self.capacity {
                buffer.pop_front();
            }
        }

        self.buffers
            .retain(|id, _| Some(*id) != local_id && snapshot.player(*id).is_some());
    }

    /// Render state for every remote player at `server_now - delay`.
    ///
    /// Without a server clock estimate the latest sample is shown as-is.
    pub fn sample(&mut self, server_now: Option<f64>) -> Vec<PlayerSnapshot> {
        let Some(server_now) = server_now else {
            return self
                .buffers
                .values()
                .filter_map(|buffer| buffer.back().map(|s| s.state.clone()))
                .collect();
        };

        let target = server_now - self.delay_ms;
        let mut out = Vec::with_capacity(self.buffers.len());

        for buffer in self.buffers.values_mut() {
            // Skip samples whose successor is already in the past
            while buffer.len() >= 2 && buffer[1].timestamp <= target {
                buffer.pop_front();
            }

            match (buffer.front(), buffer.get(1)) {
                (Some(a), Some(b)) => {
                    let span = b.timestamp - a.timestamp;
                    let span = if span == 0.0 { 1.0 } else { span };
                    let t = ((target - a.timestamp) / span).clamp(0.0, 1.0);
                    out.push(interpolate(&a.state, &b.state, t as f32));
                }
                (Some(a), None) => out.push(a.state.clone()),
                _ => {}
            }
        }

        out
    }

    pub fn clear(&mut self) {
        self.buffers.clear();
    }
}

/// Blend two samples of the same player. Discrete fields switch at the midpoint.
pub fn interpolate(a: &PlayerSnapshot, b: &PlayerSnapshot, t: f32) -> PlayerSnapshot {
    let mut out = a.clone();
    out.pose.x = lerp(a.pose.x, b.pose.x, t);
    out.pose.y = lerp(a.pose.y, b.pose.y, t);
    out.pose.angle = angle_lerp(a.pose.angle, b.pose.angle, t);
    out.pose.turret_angle = angle_lerp(a.pose.turret_angle, b.pose.turret_angle, t);
    out.health = lerp(a.health, b.health, t);
    out.score = lerp(a.score as f32, b.score as f32, t).round() as u32;
    out.respawn_in = lerp(a.respawn_in, b.respawn_in, t);
    out.is_alive = if t < 0.5 { a.is_alive } else { b.is_alive };
    out
}
