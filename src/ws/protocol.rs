//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::kinematics::Pose;
use crate::game::PlayerId;

/// Powerup variants that can appear in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PowerupKind {
    /// Instant heal
    Health,
    /// Timed movement speed boost
    Speed,
    /// Timed fire rate boost
    RapidFire,
}

/// A timed powerup effect carried by a player
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivePowerup {
    #[serde(rename = "type")]
    pub kind: PowerupKind,
    /// Server wall-clock expiry (unix millis)
    pub expires_at: u64,
}

/// Request to join (or create) a room
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JoinRequest {
    pub room_code: Option<String>,
    pub name: Option<String>,
}

/// One sampled frame of player input
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputCommand {
    /// Sequence number for client-side prediction reconciliation
    pub seq: u32,
    /// Milliseconds since the previous input
    pub dt: f32,
    #[serde(default)]
    pub up: bool,
    #[serde(default)]
    pub down: bool,
    #[serde(default)]
    pub left: bool,
    #[serde(default)]
    pub right: bool,
    #[serde(default)]
    pub shoot: bool,
    /// Aim point in world coordinates
    pub aim_x: f32,
    pub aim_y: f32,
}

impl InputCommand {
    /// Every numeric field is finite
    pub fn is_well_formed(&self) -> bool {
        self.dt.is_finite() && self.aim_x.is_finite() && self.aim_y.is_finite()
    }
}

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMsg {
    #[serde(rename = "join")]
    Join(JoinRequest),

    #[serde(rename = "input")]
    Input(InputCommand),

    /// Ping for latency measurement, echoed back verbatim
    #[serde(rename = "latency:ping")]
    LatencyPing { nonce: f64 },
}

impl ClientMsg {
    /// Parse a text frame, rejecting inputs with non-finite numbers
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let msg: ClientMsg = serde_json::from_str(text)?;
        if let ClientMsg::Input(input) = &msg {
            if !input.is_well_formed() {
                return Err(ProtocolError::MalformedInput { seq: input.seq });
            }
        }
        Ok(msg)
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMsg {
    /// Sent once the join is accepted
    #[serde(rename = "welcome", rename_all = "camelCase")]
    Welcome { player_id: PlayerId, room_code: String },

    /// Room state snapshot (sent at regular intervals)
    #[serde(rename = "snapshot")]
    Snapshot(Snapshot),

    #[serde(rename = "latency:response")]
    LatencyResponse { nonce: f64 },

    /// One-way error notification
    #[serde(rename = "error")]
    Error { message: String },
}

impl ServerMsg {
    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Read-only projection of a room at one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub room_code: String,
    /// Monotonic per-room tick counter
    pub tick: u64,
    /// Server wall-clock time (unix millis)
    pub timestamp: u64,
    /// Milliseconds since the room was created
    pub match_time: u64,
    pub players: Vec<PlayerSnapshot>,
    pub bullets: Vec<BulletSnapshot>,
    pub powerups: Vec<PowerupSnapshot>,
}

impl Snapshot {
    pub fn player(&self, id: PlayerId) -> Option<&PlayerSnapshot> {
        self.players.iter().find(|p| p.id == id)
    }
}

/// Player state in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub name: String,
    #[serde(flatten)]
    pub pose: Pose,
    pub health: f32,
    pub max_health: f32,
    pub score: u32,
    pub is_alive: bool,
    /// Milliseconds until respawn, 0 when alive
    pub respawn_in: f32,
    pub speed_multiplier: f32,
    pub rapid_fire_multiplier: f32,
    /// Last input sequence applied by the server
    pub last_processed_input: u32,
    pub active_powerups: Vec<ActivePowerup>,
}

/// Bullet state in a snapshot (position only)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulletSnapshot {
    pub id: Uuid,
    pub owner_id: PlayerId,
    pub x: f32,
    pub y: f32,
}

/// Powerup state in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerupSnapshot {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: PowerupKind,
    pub x: f32,
    pub y: f32,
}

/// Wire encoding errors
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("invalid JSON message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("input {seq} carries non-finite values")]
    MalformedInput { seq: u32 },
}
