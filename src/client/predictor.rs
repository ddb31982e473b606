//! Client-side prediction and server reconciliation

use crate::game::constants::{ARENA_HEIGHT, ARENA_WIDTH, MAX_INPUT_DT_MS, PLAYER_BASE_SPEED};
use crate::game::kinematics::{Kinematics, MoveParams};
use crate::ws::protocol::{InputCommand, PlayerSnapshot};

/// Input device state sampled once per frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputSample {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub shoot: bool,
    /// World-space aim point
    pub aim_x: f32,
    pub aim_y: f32,
}

/// Predicted state of the local player
#[derive(Debug, Clone, Default)]
pub struct Predictor {
    /// Last authoritative state from the server
    local: Option<PlayerSnapshot>,
    /// `local` with every unacknowledged input replayed on top
    predicted: Option<PlayerSnapshot>,
    /// Sent but not yet acknowledged, ascending by seq
    pending: Vec<InputCommand>,
    next_seq: u32,
}

impl Predictor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn local(&self) -> Option<&PlayerSnapshot> {
        self.local.as_ref()
    }

    pub fn predicted(&self) -> Option<&PlayerSnapshot> {
        self.predicted.as_ref()
    }

    pub fn pending(&self) -> &[InputCommand] {
        &self.pending
    }

    /// Accept authoritative state, drop acknowledged inputs, replay the rest
    pub fn reconcile(&mut self, authoritative: PlayerSnapshot) {
        let acked = authoritative.last_processed_input;
        self.pending.retain(|input| input.seq > acked);
        self.local = Some(authoritative);
        self.predict();
    }

    /// Turn a frame's input sample into a sequenced command.
    ///
    /// Nothing is produced before the first snapshot or while dead.
    pub fn record_input(&mut self, sample: &InputSample, dt_ms: f32) -> Option<InputCommand> {
        if !self.predicted.as_ref()?.is_alive {
            return None;
        }

        self.next_seq += 1;
        let input = InputCommand {
            seq: self.next_seq,
            dt: dt_ms.clamp(0.0, MAX_INPUT_DT_MS),
            up: sample.up,
            down: sample.down,
            left: sample.left,
            right: sample.right,
            shoot: sample.shoot,
            aim_x: sample.aim_x.clamp(0.0, ARENA_WIDTH),
            aim_y: sample.aim_y.clamp(0.0, ARENA_HEIGHT),
        };
        self.pending.push(input);
        Some(input)
    }

    /// Rebuild the predicted state from the authoritative one
    pub fn predict(&mut self) -> Option<&PlayerSnapshot> {
        let local = self.local.as_ref()?;
        let mut state = local.clone();

        // Dead players are shown exactly as the server has them
        if local.is_alive {
            let params = |input: &InputCommand| MoveParams {
                dt: Kinematics::input_dt_secs(input.dt),
                speed: PLAYER_BASE_SPEED,
                speed_multiplier: local.speed_multiplier,
            };
            for input in &self.pending {
                Kinematics::apply_input(&mut state.pose, input, params(input));
            }
        }

        self.predicted = Some(state);
        self.predicted.as_ref()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
