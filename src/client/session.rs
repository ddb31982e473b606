//! Per-connection client state driven by a render loop
//!
//! Network events (`on_*`) may arrive at any time between frames; they only
//! update buffers. `frame` reads those buffers once per rendered frame.

use tracing::{debug, warn};

use crate::game::constants::MAX_INPUT_DT_MS;
use crate::game::PlayerId;
use crate::ws::protocol::{
    BulletSnapshot, ClientMsg, InputCommand, JoinRequest, PlayerSnapshot, PowerupSnapshot,
    ServerMsg, Snapshot,
};

use super::clock::ServerClock;
use super::interpolator::Interpolator;
use super::latency::LatencyTracker;
use super::predictor::{InputSample, Predictor};

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, Default)]
pub struct Frame {
    /// Input to send to the server this frame, if any
    pub outgoing: Option<InputCommand>,
    /// Predicted local player
    pub local: Option<PlayerSnapshot>,
    /// Interpolated remote players
    pub remotes: Vec<PlayerSnapshot>,
    pub bullets: Vec<BulletSnapshot>,
    pub powerups: Vec<PowerupSnapshot>,
    /// Match elapsed milliseconds
    pub match_time: f64,
    /// Smoothed round trip in milliseconds
    pub ping: f64,
}

#[derive(Debug, Default)]
pub struct ClientSession {
    player_id: Option<PlayerId>,
    room_code: Option<String>,
    predictor: Predictor,
    interpolator: Interpolator,
    clock: ServerClock,
    latency: LatencyTracker,
    /// Tick of the newest snapshot applied
    last_tick: Option<u64>,
    /// `server_now - matchTime`, captured on the first synced snapshot
    match_offset: Option<f64>,
    match_time: f64,
    bullets: Vec<BulletSnapshot>,
    powerups: Vec<PowerupSnapshot>,
}

impl ClientSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Message asking to join a room
    pub fn join_request(room_code: Option<&str>, name: Option<&str>) -> ClientMsg {
        ClientMsg::Join(JoinRequest {
            room_code: room_code.map(str::to_string),
            name: name.map(str::to_string),
        })
    }

    pub fn player_id(&self) -> Option<PlayerId> {
        self.player_id
    }

    pub fn room_code(&self) -> Option<&str> {
        self.room_code.as_deref()
    }

    pub fn pending_inputs(&self) -> usize {
        self.predictor.pending().len()
    }

    /// Dispatch any server message
    pub fn on_server_msg(&mut self, msg: &ServerMsg, local_now: f64) {
        match msg {
            ServerMsg::Welcome {
                player_id,
                room_code,
            } => self.on_welcome(*player_id, room_code.clone()),
            ServerMsg::Snapshot(snapshot) => self.on_snapshot(snapshot, local_now),
            ServerMsg::LatencyResponse { nonce } => self.on_latency_response(*nonce, local_now),
            ServerMsg::Error { message } => warn!(%message, "Server error"),
        }
    }

    pub fn on_welcome(&mut self, player_id: PlayerId, room_code: String) {
        debug!(player_id = %player_id, room = %room_code, "Joined room");
        self.player_id = Some(player_id);
        self.room_code = Some(room_code);
        // A different room counts ticks from zero
        self.last_tick = None;
    }

    /// Apply a snapshot. Snapshots no newer than the last one applied are
    /// dropped.
    pub fn on_snapshot(&mut self, snapshot: &Snapshot, local_now: f64) {
        if self.last_tick.is_some_and(|last| snapshot.tick <= last) {
            debug!(tick = snapshot.tick, last_tick = ?self.last_tick, "Dropped out-of-order snapshot");
            return;
        }
        self.last_tick = Some(snapshot.tick);

        self.clock.observe(local_now, snapshot.timestamp as f64);

        if let Some(server_now) = self.clock.server_now(local_now) {
            let offset = *self
                .match_offset
                .get_or_insert(server_now - snapshot.match_time as f64);
            self.match_time = server_now - offset;
        } else {
            self.match_time = snapshot.match_time as f64;
        }

        self.bullets = snapshot.bullets.clone();
        self.powerups = snapshot.powerups.clone();

        if let Some(me) = self.player_id.and_then(|id| snapshot.player(id)) {
            self.predictor.reconcile(me.clone());
        }
        self.interpolator.push_snapshot(snapshot, self.player_id);
    }

    pub fn on_latency_response(&mut self, nonce: f64, local_now: f64) {
        self.latency.record_response(nonce, local_now);
    }

    /// Latency probe to send, if one is due
    pub fn next_ping(&mut self, local_now: f64) -> Option<ClientMsg> {
        self.latency
            .poll_probe(local_now)
            .map(|nonce| ClientMsg::LatencyPing { nonce })
    }

    /// Sample input, predict, and build render state for one frame
    pub fn frame(&mut self, sample: &InputSample, dt_ms: f32, local_now: f64) -> Frame {
        let dt_ms = dt_ms.min(MAX_INPUT_DT_MS);

        if let (Some(offset), Some(server_now)) =
            (self.match_offset, self.clock.server_now(local_now))
        {
            self.match_time = server_now - offset;
        }

        let outgoing = match self.player_id {
            Some(_) => self.predictor.record_input(sample, dt_ms),
            None => None,
        };
        let local = self.predictor.predict().cloned();
        let remotes = self.interpolator.sample(self.clock.server_now(local_now));

        Frame {
            outgoing,
            local,
            remotes,
            bullets: self.bullets.clone(),
            powerups: self.powerups.clone(),
            match_time: self.match_time,
            ping: self.latency.ping(),
        }
    }

    /// Drop every per-session buffer. A reconnect starts from scratch.
    pub fn on_disconnect(&mut self) {
        debug!(player_id = ?self.player_id, "Session cleared");
        *self = Self::default();
    }
}
