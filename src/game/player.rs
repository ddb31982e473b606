//! Authoritative player state

use tracing::debug;

use super::combat::CombatSystem;
use super::constants::{
    PENDING_INPUT_CAPACITY, PLAYER_FIRE_RATE, PLAYER_MAX_HEALTH, PLAYER_RESPAWN_MS,
    POWERUP_DURATION_MS, POWERUP_HEAL_FRACTION, POWERUP_RAPID_FIRE_MULTIPLIER,
    POWERUP_SPEED_MULTIPLIER,
};
use super::input::InputChannel;
use super::kinematics::Pose;
use super::PlayerId;
use crate::ws::protocol::{ActivePowerup, PowerupKind};

/// Player state in a room (authoritative)
#[derive(Debug, Clone)]
pub struct PlayerState {
    pub id: PlayerId,
    pub name: String,

    // Position and movement
    pub pose: Pose,
    pub vel_x: f32,
    pub vel_y: f32,

    // Combat
    pub health: f32,
    pub max_health: f32,
    pub score: u32,
    pub alive: bool,
    /// Unix millis at which a dead player comes back
    pub respawn_at: Option<u64>,
    pub fire_rate: f32,
    pub last_shot_at: u64,

    // Powerups (multipliers are derived every tick)
    pub speed_multiplier: f32,
    pub rapid_fire_multiplier: f32,
    pub active_powerups: Vec<ActivePowerup>,

    // Input tracking
    pub last_processed_input: u32,
    pub pending_inputs: InputChannel,
}

impl PlayerState {
    pub fn new(id: PlayerId, name: String, pose: Pose) -> Self {
        Self {
            id,
            name,
            pose,
            vel_x: 0.0,
            vel_y: 0.0,
            health: PLAYER_MAX_HEALTH,
            max_health: PLAYER_MAX_HEALTH,
            score: 0,
            alive: true,
            respawn_at: None,
            fire_rate: PLAYER_FIRE_RATE,
            last_shot_at: 0,
            speed_multiplier: 1.0,
            rapid_fire_multiplier: 1.0,
            active_powerups: Vec::new(),
            last_processed_input: 0,
            pending_inputs: InputChannel::new(PENDING_INPUT_CAPACITY),
        }
    }

    /// Drop expired effects and derive the current multipliers.
    /// Effect types contribute independently of each other.
    pub fn refresh_effects(&mut self, now: u64) {
        self.active_powerups.retain(|effect| effect.expires_at > now);

        self.speed_multiplier = 1.0;
        self.rapid_fire_multiplier = 1.0;
        for effect in &self.active_powerups {
            match effect.kind {
                PowerupKind::Speed => self.speed_multiplier = POWERUP_SPEED_MULTIPLIER,
                PowerupKind::RapidFire => {
                    self.rapid_fire_multiplier = POWERUP_RAPID_FIRE_MULTIPLIER
                }
                PowerupKind::Health => {}
            }
        }
    }

    /// Heal instantly or install/refresh a timed effect
    pub fn apply_powerup(&mut self, kind: PowerupKind, now: u64) {
        if kind == PowerupKind::Health {
            let heal = PLAYER_MAX_HEALTH * POWERUP_HEAL_FRACTION;
            self.health = (self.health + heal).min(self.max_health);
            return;
        }

        self.active_powerups.retain(|effect| effect.kind != kind);
        self.active_powerups.push(ActivePowerup {
            kind,
            expires_at: now + POWERUP_DURATION_MS,
        });
    }

    /// Apply bullet damage. Returns true if this hit was lethal.
    pub fn take_damage(&mut self, damage: f32, now: u64) -> bool {
        if !self.alive {
            return false;
        }

        let (new_health, killed) = CombatSystem::apply_damage(self.health, damage);
        self.health = new_health;
        if killed {
            self.alive = false;
            self.respawn_at = Some(now + PLAYER_RESPAWN_MS);
            self.vel_x = 0.0;
            self.vel_y = 0.0;
            self.pending_inputs.clear();
        }
        killed
    }

    pub fn respawn_due(&self, now: u64) -> bool {
        !self.alive && self.respawn_at.is_some_and(|at| now >= at)
    }

    /// Bring a dead player back at a fresh spawn point
    pub fn respawn(&mut self, x: f32, y: f32) {
        self.pose.x = x;
        self.pose.y = y;
        self.health = self.max_health;
        self.alive = true;
        self.respawn_at = None;
        self.active_powerups.clear();
        self.speed_multiplier = 1.0;
        self.rapid_fire_multiplier = 1.0;
        self.last_shot_at = 0;
        debug!(player_id = %self.id, x, y, "Player respawned");
    }

    /// Milliseconds until respawn, clamped at zero
    pub fn respawn_in(&self, now: u64) -> u64 {
        self.respawn_at
            .map(|at| at.saturating_sub(now))
            .unwrap_or(0)
    }
}
