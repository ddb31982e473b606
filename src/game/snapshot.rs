//! Snapshot building for network transmission

use std::collections::BTreeMap;

use crate::ws::protocol::{BulletSnapshot, PlayerSnapshot, PowerupSnapshot, Snapshot};

use super::combat::Bullet;
use super::player::PlayerState;
use super::powerups::Powerup;
use super::PlayerId;

/// Decides when to publish and projects room state into a `Snapshot`
#[derive(Debug)]
pub struct SnapshotBuilder {
    /// Snapshot cadence in wall-clock milliseconds
    interval_ms: u64,
    /// When the last snapshot went out
    last_sent_at: Option<u64>,
}

impl SnapshotBuilder {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_sent_at: None,
        }
    }

    /// Check if it's time to send a snapshot; resets the timer when it is
    pub fn should_send(&mut self, now: u64) -> bool {
        let due = self
            .last_sent_at
            .map_or(true, |last| now.saturating_sub(last) >= self.interval_ms);
        if due {
            self.last_sent_at = Some(now);
        }
        due
    }

    /// Force snapshot on next check
    pub fn force_next(&mut self) {
        self.last_sent_at = None;
    }

    /// Build a snapshot of the public fields only
    pub fn build(
        &self,
        room_code: &str,
        tick: u64,
        now: u64,
        match_start: u64,
        players: &BTreeMap<PlayerId, PlayerState>,
        bullets: &[Bullet],
        powerups: &[Powerup],
    ) -> Snapshot {
        let players = players
            .values()
            .map(|p| PlayerSnapshot {
                id: p.id,
                name: p.name.clone(),
                pose: p.pose,
                health: p.health,
                max_health: p.max_health,
                score: p.score,
                is_alive: p.alive,
                respawn_in: p.respawn_in(now) as f32,
                speed_multiplier: p.speed_multiplier,
                rapid_fire_multiplier: p.rapid_fire_multiplier,
                last_processed_input: p.last_processed_input,
                active_powerups: p.active_powerups.clone(),
            })
            .collect();

        let bullets = bullets
            .iter()
            .map(|b| BulletSnapshot {
                id: b.id,
                owner_id: b.owner_id,
                x: b.x,
                y: b.y,
            })
            .collect();

        let powerups = powerups
            .iter()
            .map(|p| PowerupSnapshot {
                id: p.id,
                kind: p.kind,
                x: p.x,
                y: p.y,
            })
            .collect();

        Snapshot {
            room_code: room_code.to_string(),
            tick,
            timestamp: now,
            match_time: now.saturating_sub(match_start),
            players,
            bullets,
            powerups,
        }
    }
}
