//! Static arena and gameplay constants

pub const ARENA_WIDTH: f32 = 1600.0;
pub const ARENA_HEIGHT: f32 = 900.0;
pub const ARENA_PADDING: f32 = 60.0;

pub const PLAYER_RADIUS: f32 = 24.0;
/// Units per second
pub const PLAYER_BASE_SPEED: f32 = 240.0;
pub const PLAYER_MAX_HEALTH: f32 = 100.0;
/// Shots per second
pub const PLAYER_FIRE_RATE: f32 = 4.0;
pub const PLAYER_RESPAWN_MS: u64 = 3000;
pub const MAX_NAME_LEN: usize = 16;

pub const BULLET_SPEED: f32 = 560.0;
pub const BULLET_TTL_MS: f32 = 1200.0;
pub const BULLET_DAMAGE: f32 = 25.0;
/// Distance from the tank centre at which a bullet appears
pub const BULLET_SPAWN_OFFSET: f32 = PLAYER_RADIUS + 8.0;

pub const POWERUP_RESPAWN_INTERVAL_MS: u64 = 15_000;
pub const POWERUP_TTL_MS: f32 = 20_000.0;
pub const POWERUP_DURATION_MS: u64 = 10_000;
pub const POWERUP_SPEED_MULTIPLIER: f32 = 1.4;
pub const POWERUP_RAPID_FIRE_MULTIPLIER: f32 = 2.0;
pub const POWERUP_PICKUP_RADIUS: f32 = PLAYER_RADIUS + 10.0;
pub const POWERUP_HEAL_FRACTION: f32 = 0.5;
pub const MAX_POWERUPS: usize = 3;

pub const MAX_PLAYERS_PER_ROOM: usize = 8;
pub const DEFAULT_ROOM_CODE: &str = "arena";

/// Upper bound on the elapsed time a single input may claim
pub const MAX_INPUT_DT_MS: f32 = 100.0;
pub const PENDING_INPUT_CAPACITY: usize = 32;

/// Client render delay behind estimated server time
pub const INTERPOLATION_DELAY_MS: f64 = 100.0;
pub const REMOTE_BUFFER_CAPACITY: usize = 20;
pub const SERVER_CLOCK_SMOOTHING: f64 = 0.1;
pub const PING_SMOOTHING: f64 = 0.2;
pub const PING_INTERVAL_MS: f64 = 2000.0;
