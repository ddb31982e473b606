//! Tank movement and arena constraints
//!
//! Everything here is pure: the server tick and the client predictor call the
//! same functions with the same inputs, so a replayed input lands on exactly
//! the position the server computed for it.

use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

use super::constants::{
    ARENA_HEIGHT, ARENA_PADDING, ARENA_WIDTH, MAX_INPUT_DT_MS, PLAYER_RADIUS,
};
use crate::ws::protocol::InputCommand;

/// Position and facing of a tank
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pose {
    pub x: f32,
    pub y: f32,
    /// Hull facing in radians
    pub angle: f32,
    /// Turret facing in radians
    pub turret_angle: f32,
}

impl Pose {
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            ..Default::default()
        }
    }
}

/// Movement parameters for one input application
#[derive(Debug, Clone, Copy)]
pub struct MoveParams {
    /// Elapsed time in seconds
    pub dt: f32,
    /// Base speed in units per second
    pub speed: f32,
    pub speed_multiplier: f32,
}

/// Playable rectangle for a tank centre
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArenaBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl ArenaBounds {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_y..=self.max_y).contains(&y)
    }
}

/// Kinematics shared by simulation and prediction
pub struct Kinematics;

impl Kinematics {
    /// Arena rectangle minus padding and tank radius
    pub fn bounds() -> ArenaBounds {
        ArenaBounds {
            min_x: ARENA_PADDING + PLAYER_RADIUS,
            max_x: ARENA_WIDTH - ARENA_PADDING - PLAYER_RADIUS,
            min_y: ARENA_PADDING + PLAYER_RADIUS,
            max_y: ARENA_HEIGHT - ARENA_PADDING - PLAYER_RADIUS,
        }
    }

    /// Unit movement direction from the four direction keys.
    /// Diagonals are normalized so they are not faster than straight moves.
    pub fn movement_vector(input: &InputCommand) -> (f32, f32) {
        let x = (input.right as i8 - input.left as i8) as f32;
        let y = (input.down as i8 - input.up as i8) as f32;
        if x == 0.0 && y == 0.0 {
            return (0.0, 0.0);
        }
        let length = x.hypot(y);
        (x / length, y / length)
    }

    /// Convert an input's claimed milliseconds into clamped seconds
    pub fn input_dt_secs(dt_ms: f32) -> f32 {
        dt_ms.clamp(0.0, MAX_INPUT_DT_MS) / 1000.0
    }

    /// Apply one input to a pose: move, re-aim, then clamp into the arena
    pub fn apply_input(pose: &mut Pose, input: &InputCommand, params: MoveParams) {
        let (vx, vy) = Self::movement_vector(input);
        pose.x += vx * params.speed * params.speed_multiplier * params.dt;
        pose.y += vy * params.speed * params.speed_multiplier * params.dt;

        let dx = input.aim_x - pose.x;
        let dy = input.aim_y - pose.y;
        if dx != 0.0 || dy != 0.0 {
            pose.turret_angle = dy.atan2(dx);
        }
        // Hull keeps its last facing while idle
        if vx != 0.0 || vy != 0.0 {
            pose.angle = vy.atan2(vx);
        }

        Self::clamp_to_arena(pose);
    }

    pub fn clamp_to_arena(pose: &mut Pose) {
        let bounds = Self::bounds();
        pose.x = pose.x.clamp(bounds.min_x, bounds.max_x);
        pose.y = pose.y.clamp(bounds.min_y, bounds.max_y);
    }

    /// Check overlap of a point against a circle without a square root
    pub fn within_radius(x1: f32, y1: f32, x2: f32, y2: f32, radius: f32) -> bool {
        let dx = x2 - x1;
        let dy = y2 - y1;
        dx * dx + dy * dy <= radius * radius
    }
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Interpolate between two angles along the shortest arc
pub fn angle_lerp(a: f32, b: f32, t: f32) -> f32 {
    let diff = (b - a + PI).rem_euclid(TAU) - PI;
    a + diff * t
}
