//! Powerup spawning and pickup

use rand::Rng;
use uuid::Uuid;

use super::constants::{
    ARENA_HEIGHT, ARENA_WIDTH, MAX_POWERUPS, PLAYER_RADIUS, POWERUP_PICKUP_RADIUS,
    POWERUP_RESPAWN_INTERVAL_MS, POWERUP_TTL_MS,
};
use super::kinematics::Kinematics;
use crate::ws::protocol::PowerupKind;

/// Relative spawn weights, must sum to 1
const KIND_WEIGHTS: [(PowerupKind, f64); 3] = [
    (PowerupKind::Health, 0.34),
    (PowerupKind::Speed, 0.33),
    (PowerupKind::RapidFire, 0.33),
];

/// Powerup lying in the arena
#[derive(Debug, Clone)]
pub struct Powerup {
    pub id: Uuid,
    pub kind: PowerupKind,
    pub x: f32,
    pub y: f32,
    pub ttl_ms: f32,
}

impl Powerup {
    pub fn new(kind: PowerupKind, x: f32, y: f32) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            x,
            y,
            ttl_ms: POWERUP_TTL_MS,
        }
    }

    /// Count down one tick, returns false once expired
    pub fn age(&mut self, tick_ms: f32) -> bool {
        self.ttl_ms -= tick_ms;
        self.ttl_ms > 0.0
    }

    pub fn in_pickup_range(&self, x: f32, y: f32) -> bool {
        Kinematics::within_radius(self.x, self.y, x, y, POWERUP_PICKUP_RADIUS)
    }
}

/// Spawn timing and placement
pub struct PowerupSystem;

impl PowerupSystem {
    /// A spawn is due when the timer elapsed and the room is below the cap
    pub fn spawn_due(now: u64, last_spawn: u64, live: usize) -> bool {
        now.saturating_sub(last_spawn) >= POWERUP_RESPAWN_INTERVAL_MS && live < MAX_POWERUPS
    }

    pub fn roll_kind<R: Rng + ?Sized>(rng: &mut R) -> PowerupKind {
        let roll: f64 = rng.gen();
        let mut acc = 0.0;
        for (kind, weight) in KIND_WEIGHTS {
            acc += weight;
            if roll < acc {
                return kind;
            }
        }
        PowerupKind::RapidFire
    }

    pub fn spawn<R: Rng + ?Sized>(rng: &mut R) -> Powerup {
        let margin = PLAYER_RADIUS * 2.0;
        let kind = Self::roll_kind(rng);
        let x = rng.gen_range(margin..ARENA_WIDTH - margin);
        let y = rng.gen_range(margin..ARENA_HEIGHT - margin);
        Powerup::new(kind, x, y)
    }
}
