//! Combat system - shooting, bullets, damage

use uuid::Uuid;

use super::constants::{
    ARENA_HEIGHT, ARENA_WIDTH, BULLET_DAMAGE, BULLET_SPAWN_OFFSET, BULLET_SPEED, BULLET_TTL_MS,
    PLAYER_RADIUS,
};
use super::kinematics::{Kinematics, Pose};
use super::PlayerId;

/// Active bullet in a room
#[derive(Debug, Clone)]
pub struct Bullet {
    pub id: Uuid,
    /// Looked up by id only; the owner may have left already
    pub owner_id: PlayerId,
    pub x: f32,
    pub y: f32,
    pub vel_x: f32,
    pub vel_y: f32,
    pub ttl_ms: f32,
}

impl Bullet {
    /// Spawn a bullet just outside the tank along the turret direction
    pub fn fire(owner_id: PlayerId, pose: &Pose) -> Self {
        let (sin, cos) = pose.turret_angle.sin_cos();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            x: pose.x + cos * BULLET_SPAWN_OFFSET,
            y: pose.y + sin * BULLET_SPAWN_OFFSET,
            vel_x: cos * BULLET_SPEED,
            vel_y: sin * BULLET_SPEED,
            ttl_ms: BULLET_TTL_MS,
        }
    }

    /// Advance by one tick, returns false if expired or out of the arena
    pub fn advance(&mut self, tick_ms: f32) -> bool {
        let dt = tick_ms / 1000.0;
        self.x += self.vel_x * dt;
        self.y += self.vel_y * dt;
        self.ttl_ms -= tick_ms;
        self.ttl_ms > 0.0
            && (0.0..=ARENA_WIDTH).contains(&self.x)
            && (0.0..=ARENA_HEIGHT).contains(&self.y)
    }

    /// Check collision with a tank centred at (x, y)
    pub fn hits(&self, x: f32, y: f32) -> bool {
        Kinematics::within_radius(self.x, self.y, x, y, PLAYER_RADIUS)
    }
}

/// Combat rules for managing fire rate and damage
pub struct CombatSystem;

impl CombatSystem {
    /// Minimum milliseconds between shots
    pub fn fire_cooldown_ms(fire_rate: f32, rapid_fire_multiplier: f32) -> f32 {
        1000.0 / (fire_rate * rapid_fire_multiplier)
    }

    /// Check if a player can fire at `now` (cooldown check)
    pub fn can_fire(now: u64, last_shot_at: u64, cooldown_ms: f32) -> bool {
        now.saturating_sub(last_shot_at) as f32 >= cooldown_ms
    }

    /// Apply damage to health, returns (new_health, is_dead)
    pub fn apply_damage(current_health: f32, damage: f32) -> (f32, bool) {
        let new_health = (current_health - damage).max(0.0);
        (new_health, new_health <= 0.0)
    }

    pub fn bullet_damage() -> f32 {
        BULLET_DAMAGE
    }
}

/// Hit result from bullet resolution
#[derive(Debug, Clone, PartialEq)]
pub struct HitResult {
    pub bullet_id: Uuid,
    pub shooter_id: PlayerId,
    pub target_id: PlayerId,
    pub target_killed: bool,
}
