//! Room state and the authoritative tick

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use tracing::{debug, info, trace};
use uuid::Uuid;

use crate::util::time::SNAPSHOT_INTERVAL_MS;
use crate::ws::protocol::{InputCommand, Snapshot};

use super::combat::{Bullet, CombatSystem, HitResult};
use super::constants::{MAX_NAME_LEN, PLAYER_BASE_SPEED};
use super::kinematics::{Kinematics, MoveParams, Pose};
use super::player::PlayerState;
use super::powerups::{Powerup, PowerupSystem};
use super::snapshot::SnapshotBuilder;
use super::PlayerId;

/// Join refusals
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JoinError {
    #[error("Room is full")]
    RoomFull,

    #[error("Already joined this room")]
    AlreadyJoined,

    #[error("Room is unavailable")]
    RoomClosed,
}

/// Faults that end a room
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimulationError {
    #[error("non-finite {entity} state for {id}")]
    NonFinite { entity: &'static str, id: Uuid },
}

/// Entity store of one room (owned by the room task)
pub struct RoomState {
    pub code: String,
    pub tick: u64,
    /// Ordered by id so collision resolution is deterministic
    pub players: BTreeMap<PlayerId, PlayerState>,
    /// Insertion order is collision order
    pub bullets: Vec<Bullet>,
    pub powerups: Vec<Powerup>,
    pub rng: ChaCha8Rng,
    pub match_start: u64,
    pub last_powerup_spawn: u64,
    pub max_players: usize,
    tick_interval_ms: f32,
    snapshots: SnapshotBuilder,
}

impl RoomState {
    pub fn new(code: String, seed: u64, now: u64, tick_interval_ms: f32, max_players: usize) -> Self {
        Self {
            code,
            tick: 0,
            players: BTreeMap::new(),
            bullets: Vec::new(),
            powerups: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            match_start: now,
            last_powerup_spawn: now,
            max_players,
            tick_interval_ms,
            snapshots: SnapshotBuilder::new(SNAPSHOT_INTERVAL_MS),
        }
    }

    pub fn player(&self, id: PlayerId) -> Option<&PlayerState> {
        self.players.get(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Admit a player at a random spawn point
    pub fn add_player(&mut self, id: PlayerId, name: Option<&str>) -> Result<&PlayerState, JoinError> {
        if self.players.contains_key(&id) {
            return Err(JoinError::AlreadyJoined);
        }
        if self.players.len() >= self.max_players {
            return Err(JoinError::RoomFull);
        }

        let (x, y) = spawn_point(&mut self.rng);
        let player = PlayerState::new(id, sanitize_name(name, id), Pose::at(x, y));
        info!(room = %self.code, player_id = %id, name = %player.name, "Player joined");

        // New joiners should see the world right away
        self.snapshots.force_next();
        Ok(self.players.entry(id).or_insert(player))
    }

    /// Returns true if the player was present
    pub fn remove_player(&mut self, id: PlayerId) -> bool {
        let removed = self.players.remove(&id).is_some();
        if removed {
            info!(room = %self.code, player_id = %id, "Player left");
        }
        removed
    }

    /// Buffer an input for the next tick. Stale, duplicate, malformed and
    /// dead-player inputs are dropped.
    pub fn enqueue_input(&mut self, id: PlayerId, input: InputCommand) -> bool {
        let Some(player) = self.players.get_mut(&id) else {
            trace!(player_id = %id, seq = input.seq, "Dropped input for unknown player");
            return false;
        };
        if !input.is_well_formed() {
            trace!(player_id = %id, seq = input.seq, "Dropped malformed input");
            return false;
        }
        if !player.alive || input.seq <= player.last_processed_input {
            trace!(player_id = %id, seq = input.seq, "Dropped stale input");
            return false;
        }
        player.pending_inputs.push(input)
    }

    /// Advance the room by one tick. Returns a snapshot when one is due.
    pub fn step(&mut self, now: u64) -> Result<Option<Snapshot>, SimulationError> {
        self.tick += 1;

        for player in self.players.values_mut() {
            update_player(player, &mut self.bullets, &mut self.rng, now);
        }
        self.update_bullets(now);
        self.update_powerups(now);

        self.validate()?;

        if self.snapshots.should_send(now) {
            Ok(Some(self.snapshot(now)))
        } else {
            Ok(None)
        }
    }

    pub fn snapshot(&self, now: u64) -> Snapshot {
        self.snapshots.build(
            &self.code,
            self.tick,
            now,
            self.match_start,
            &self.players,
            &self.bullets,
            &self.powerups,
        )
    }

    /// Move bullets, expire them, and resolve first-hit-wins collisions
    fn update_bullets(&mut self, now: u64) {
        let tick_ms = self.tick_interval_ms;
        let players = &mut self.players;
        let mut hits: Vec<HitResult> = Vec::new();

        self.bullets.retain_mut(|bullet| {
            if !bullet.advance(tick_ms) {
                return false;
            }

            let target_id = players
                .values()
                .find(|p| p.alive && p.id != bullet.owner_id && bullet.hits(p.pose.x, p.pose.y))
                .map(|p| p.id);
            let Some(target_id) = target_id else {
                return true;
            };

            let killed = players
                .get_mut(&target_id)
                .is_some_and(|target| target.take_damage(CombatSystem::bullet_damage(), now));

            if killed && bullet.owner_id != target_id {
                // Owner may have disconnected; then nobody scores
                if let Some(shooter) = players.get_mut(&bullet.owner_id) {
                    shooter.score += 1;
                }
            }

            hits.push(HitResult {
                bullet_id: bullet.id,
                shooter_id: bullet.owner_id,
                target_id,
                target_killed: killed,
            });
            false
        });

        for hit in hits {
            if hit.target_killed {
                info!(
                    room = %self.code,
                    shooter_id = %hit.shooter_id,
                    target_id = %hit.target_id,
                    "Player destroyed"
                );
            } else {
                debug!(room = %self.code, bullet_id = %hit.bullet_id, target_id = %hit.target_id, "Hit");
            }
        }
    }

    /// Spawn on timer, expire, and hand out pickups
    fn update_powerups(&mut self, now: u64) {
        if PowerupSystem::spawn_due(now, self.last_powerup_spawn, self.powerups.len()) {
            let powerup = PowerupSystem::spawn(&mut self.rng);
            debug!(room = %self.code, kind = ?powerup.kind, x = powerup.x, y = powerup.y, "Powerup spawned");
            self.powerups.push(powerup);
            self.last_powerup_spawn = now;
        }

        let tick_ms = self.tick_interval_ms;
        let players = &mut self.players;
        self.powerups.retain_mut(|powerup| {
            if !powerup.age(tick_ms) {
                return false;
            }
            match players
                .values_mut()
                .find(|p| p.alive && powerup.in_pickup_range(p.pose.x, p.pose.y))
            {
                Some(player) => {
                    player.apply_powerup(powerup.kind, now);
                    false
                }
                None => true,
            }
        });
    }

    /// Refuse to publish a world containing NaN or infinite values
    fn validate(&self) -> Result<(), SimulationError> {
        for p in self.players.values() {
            let finite = [p.pose.x, p.pose.y, p.pose.angle, p.pose.turret_angle, p.health]
                .iter()
                .all(|v| v.is_finite());
            if !finite {
                return Err(SimulationError::NonFinite {
                    entity: "player",
                    id: p.id,
                });
            }
        }
        if let Some(b) = self.bullets.iter().find(|b| !(b.x.is_finite() && b.y.is_finite())) {
            return Err(SimulationError::NonFinite {
                entity: "bullet",
                id: b.id,
            });
        }
        if let Some(p) = self.powerups.iter().find(|p| !(p.x.is_finite() && p.y.is_finite())) {
            return Err(SimulationError::NonFinite {
                entity: "powerup",
                id: p.id,
            });
        }
        Ok(())
    }
}

/// Respawn, then apply buffered inputs in sequence order
fn update_player(player: &mut PlayerState, bullets: &mut Vec<Bullet>, rng: &mut ChaCha8Rng, now: u64) {
    player.refresh_effects(now);

    if !player.alive {
        if player.respawn_due(now) {
            let (x, y) = spawn_point(rng);
            player.respawn(x, y);
        }
        // No backlog carries across death
        player.pending_inputs.clear();
        return;
    }

    let inputs = player.pending_inputs.drain_after(player.last_processed_input);
    if inputs.is_empty() {
        player.vel_x = 0.0;
        player.vel_y = 0.0;
        return;
    }

    for input in inputs {
        if input.seq <= player.last_processed_input {
            continue;
        }

        let (dir_x, dir_y) = Kinematics::movement_vector(&input);
        player.vel_x = dir_x * PLAYER_BASE_SPEED * player.speed_multiplier;
        player.vel_y = dir_y * PLAYER_BASE_SPEED * player.speed_multiplier;

        Kinematics::apply_input(
            &mut player.pose,
            &input,
            MoveParams {
                dt: Kinematics::input_dt_secs(input.dt),
                speed: PLAYER_BASE_SPEED,
                speed_multiplier: player.speed_multiplier,
            },
        );
        player.last_processed_input = input.seq;

        if input.shoot {
            try_shoot(player, bullets, now);
        }
    }
}

/// Fire if the cooldown has elapsed; otherwise the shot is dropped
fn try_shoot(player: &mut PlayerState, bullets: &mut Vec<Bullet>, now: u64) {
    let cooldown = CombatSystem::fire_cooldown_ms(player.fire_rate, player.rapid_fire_multiplier);
    if !CombatSystem::can_fire(now, player.last_shot_at, cooldown) {
        return;
    }
    player.last_shot_at = now;
    bullets.push(Bullet::fire(player.id, &player.pose));
}

/// Random point inside the clamped arena rectangle
pub fn spawn_point<R: Rng + ?Sized>(rng: &mut R) -> (f32, f32) {
    let bounds = Kinematics::bounds();
    (
        rng.gen_range(bounds.min_x..=bounds.max_x),
        rng.gen_range(bounds.min_y..=bounds.max_y),
    )
}

/// Trimmed, length-capped display name with an id-based fallback
pub fn sanitize_name(name: Option<&str>, id: PlayerId) -> String {
    let trimmed: String = name
        .map(str::trim)
        .unwrap_or_default()
        .chars()
        .take(MAX_NAME_LEN)
        .collect();
    if trimmed.is_empty() {
        format!("Tank-{}", &id.simple().to_string()[..4])
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::constants::{
        BULLET_DAMAGE, MAX_POWERUPS, PLAYER_RESPAWN_MS, POWERUP_RESPAWN_INTERVAL_MS,
    };
    use crate::ws::protocol::PowerupKind;
    use assert_approx_eq::assert_approx_eq;

    const TICK_MS: f32 = 1000.0 / 60.0;

    fn room() -> RoomState {
        RoomState::new("test".to_string(), 1, 0, TICK_MS, 8)
    }

    fn join_at(room: &mut RoomState, x: f32, y: f32) -> PlayerId {
        let id = Uuid::new_v4();
        room.add_player(id, None).unwrap();
        let player = room.players.get_mut(&id).unwrap();
        player.pose = Pose::at(x, y);
        id
    }

    fn input(seq: u32) -> InputCommand {
        InputCommand {
            seq,
            dt: 16.0,
            ..Default::default()
        }
    }

    #[test]
    fn up_input_moves_player_and_acks() {
        let mut room = room();
        let id = join_at(&mut room, 800.0, 450.0);
        let mut cmd = input(1);
        cmd.up = true;
        cmd.aim_x = 800.0;
        cmd.aim_y = 0.0;

        assert!(room.enqueue_input(id, cmd));
        room.step(1_000).unwrap();

        let p = room.player(id).unwrap();
        assert_approx_eq!(p.pose.y, 446.16, 1e-3);
        assert_eq!(p.last_processed_input, 1);
        assert_approx_eq!(p.vel_y, -PLAYER_BASE_SPEED);
        assert!(p.pending_inputs.is_empty());
    }

    #[test]
    fn stale_and_duplicate_inputs_never_mutate_state() {
        let mut room = room();
        let id = join_at(&mut room, 800.0, 450.0);
        let mut cmd = input(5);
        cmd.right = true;
        assert!(room.enqueue_input(id, cmd));
        room.step(1_000).unwrap();
        let after_first = room.player(id).unwrap().pose;

        assert!(!room.enqueue_input(id, cmd));
        let mut older = input(3);
        older.left = true;
        assert!(!room.enqueue_input(id, older));
        room.step(1_016).unwrap();

        let p = room.player(id).unwrap();
        assert_eq!(p.pose, after_first);
        assert_eq!(p.last_processed_input, 5);
    }

    #[test]
    fn malformed_inputs_are_dropped_without_faulting() {
        let mut room = room();
        let a = join_at(&mut room, 800.0, 450.0);
        let b = join_at(&mut room, 200.0, 200.0);

        let mut bad_aim = input(1);
        bad_aim.aim_x = f32::NAN;
        assert!(!room.enqueue_input(a, bad_aim));
        let mut bad_dt = input(1);
        bad_dt.dt = f32::INFINITY;
        assert!(!room.enqueue_input(a, bad_dt));

        assert!(room.step(1_000).is_ok());
        let p = room.player(a).unwrap();
        assert_eq!(p.last_processed_input, 0);
        assert!(p.pose.turret_angle.is_finite());
        assert!(room.player(b).is_some());

        // The sequence number is still free for a well-formed input
        assert!(room.enqueue_input(a, input(1)));
        room.step(1_016).unwrap();
        assert_eq!(room.player(a).unwrap().last_processed_input, 1);
    }

    #[test]
    fn inputs_for_unknown_players_are_refused() {
        let mut room = room();
        join_at(&mut room, 800.0, 450.0);
        let stranger = Uuid::new_v4();

        assert!(!room.enqueue_input(stranger, input(1)));
        room.step(1_000).unwrap();
        assert!(room.player(stranger).is_none());
        assert_eq!(room.players.len(), 1);
    }

    #[test]
    fn reordered_inputs_apply_in_sequence_order() {
        let mut room = room();
        let a = join_at(&mut room, 400.0, 400.0);
        let b = join_at(&mut room, 400.0, 600.0);

        let mut first = input(1);
        first.right = true;
        first.dt = 50.0;
        let mut second = input(2);
        second.down = true;
        second.dt = 30.0;

        room.enqueue_input(a, second);
        room.enqueue_input(a, first);
        room.enqueue_input(b, first);
        room.enqueue_input(b, second);
        room.step(1_000).unwrap();

        let pa = room.player(a).unwrap();
        let pb = room.player(b).unwrap();
        assert_eq!(pa.last_processed_input, 2);
        assert_approx_eq!(pa.pose.x, pb.pose.x);
        assert_approx_eq!(pa.pose.y - 400.0, pb.pose.y - 600.0, 1e-3);
        assert_approx_eq!(pa.pose.angle, pb.pose.angle);
    }

    #[test]
    fn acknowledgement_is_monotonic() {
        let mut room = room();
        let id = join_at(&mut room, 800.0, 450.0);
        let mut last = 0;
        let mut now = 1_000;
        for seq in [3, 1, 2, 7, 4, 9, 8, 12] {
            room.enqueue_input(id, input(seq));
            room.step(now).unwrap();
            now += 16;
            let ack = room.player(id).unwrap().last_processed_input;
            assert!(ack >= last);
            last = ack;
        }
        assert_eq!(last, 12);
    }

    #[test]
    fn players_stay_inside_the_arena() {
        let mut room = room();
        let ids: Vec<PlayerId> = (0..4).map(|_| join_at(&mut room, 800.0, 450.0)).collect();
        let bounds = Kinematics::bounds();
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let mut now = 1_000;
        for seq in 1..=400u32 {
            for id in &ids {
                let cmd = InputCommand {
                    seq,
                    dt: rng.gen_range(-50.0..500.0),
                    up: rng.gen(),
                    down: rng.gen(),
                    left: rng.gen(),
                    right: rng.gen(),
                    shoot: false,
                    aim_x: rng.gen_range(0.0..1600.0),
                    aim_y: rng.gen_range(0.0..900.0),
                };
                room.enqueue_input(*id, cmd);
            }
            room.step(now).unwrap();
            now += 16;
            for p in room.players.values() {
                assert!(bounds.contains(p.pose.x, p.pose.y), "{:?}", p.pose);
            }
        }
    }

    #[test]
    fn spawn_points_are_inside_the_arena() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let bounds = Kinematics::bounds();
        for _ in 0..500 {
            let (x, y) = spawn_point(&mut rng);
            assert!(bounds.contains(x, y));
        }
    }

    fn shoot_at(seq: u32, x: f32, y: f32) -> InputCommand {
        InputCommand {
            seq,
            dt: 0.0,
            shoot: true,
            aim_x: x,
            aim_y: y,
            ..Default::default()
        }
    }

    #[test]
    fn bullet_damages_target_in_the_tick_of_impact() {
        let mut room = room();
        let a = join_at(&mut room, 400.0, 450.0);
        let b = join_at(&mut room, 440.0, 450.0);

        room.enqueue_input(a, shoot_at(1, 440.0, 450.0));
        room.step(10_000).unwrap();

        assert_eq!(room.player(b).unwrap().health, 100.0 - BULLET_DAMAGE);
        assert!(room.bullets.is_empty());
        assert_eq!(room.player(a).unwrap().health, 100.0);
    }

    #[test]
    fn kill_scores_and_respawns_with_full_health() {
        let mut room = room();
        let a = join_at(&mut room, 400.0, 450.0);
        let b = join_at(&mut room, 440.0, 450.0);
        room.players.get_mut(&b).unwrap().health = BULLET_DAMAGE;
        room.players
            .get_mut(&b)
            .unwrap()
            .apply_powerup(PowerupKind::Speed, 9_000);

        room.enqueue_input(a, shoot_at(1, 440.0, 450.0));
        room.step(10_000).unwrap();

        let victim = room.player(b).unwrap();
        assert!(!victim.alive);
        assert_eq!(victim.health, 0.0);
        assert_eq!(victim.respawn_at, Some(10_000 + PLAYER_RESPAWN_MS));
        assert_eq!(room.player(a).unwrap().score, 1);

        // Inputs while dead are refused
        assert!(!room.enqueue_input(b, input(1)));

        room.step(10_000 + PLAYER_RESPAWN_MS - 1).unwrap();
        assert!(!room.player(b).unwrap().alive);

        room.step(10_000 + PLAYER_RESPAWN_MS).unwrap();
        let respawned = room.player(b).unwrap();
        assert!(respawned.alive);
        assert_eq!(respawned.health, respawned.max_health);
        assert!(respawned.active_powerups.is_empty());
        assert_eq!(respawned.speed_multiplier, 1.0);
        assert!(Kinematics::bounds().contains(respawned.pose.x, respawned.pose.y));
    }

    #[test]
    fn bullets_never_hit_their_owner() {
        let mut room = room();
        let a = join_at(&mut room, 400.0, 450.0);
        let mut bullet = Bullet::fire(a, &Pose::at(400.0, 450.0));
        bullet.x = 400.0;
        bullet.vel_x = 0.0;
        bullet.vel_y = 0.0;
        room.bullets.push(bullet);

        room.step(10_000).unwrap();

        let p = room.player(a).unwrap();
        assert_eq!(p.health, 100.0);
        assert_eq!(p.score, 0);
        assert_eq!(room.bullets.len(), 1);
    }

    #[test]
    fn kill_by_departed_owner_scores_nobody() {
        let mut room = room();
        let b = join_at(&mut room, 700.0, 450.0);
        room.players.get_mut(&b).unwrap().health = 10.0;
        let ghost = Uuid::new_v4();
        let mut bullet = Bullet::fire(ghost, &Pose::at(700.0, 450.0));
        bullet.x = 700.0;
        bullet.vel_x = 0.0;
        bullet.vel_y = 0.0;
        room.bullets.push(bullet);

        room.step(10_000).unwrap();

        let victim = room.player(b).unwrap();
        assert!(!victim.alive);
        assert!(room.players.values().all(|p| p.score == 0));
    }

    #[test]
    fn first_hit_wins_when_targets_overlap() {
        let mut room = room();
        let b = join_at(&mut room, 700.0, 450.0);
        let c = join_at(&mut room, 700.0, 450.0);
        let mut bullet = Bullet::fire(Uuid::new_v4(), &Pose::at(700.0, 450.0));
        bullet.x = 700.0;
        bullet.vel_x = 0.0;
        bullet.vel_y = 0.0;
        room.bullets.push(bullet);

        room.step(10_000).unwrap();

        let damaged = [b, c]
            .iter()
            .filter(|id| room.player(**id).unwrap().health < 100.0)
            .count();
        assert_eq!(damaged, 1);
        // Ascending id order decides the target
        let first = b.min(c);
        assert_eq!(room.player(first).unwrap().health, 100.0 - BULLET_DAMAGE);
    }

    #[test]
    fn fire_rate_cooldown_drops_extra_shots() {
        let mut room = room();
        let a = join_at(&mut room, 400.0, 450.0);

        room.enqueue_input(a, shoot_at(1, 400.0, 100.0));
        room.enqueue_input(a, shoot_at(2, 400.0, 100.0));
        room.step(10_000).unwrap();
        assert_eq!(room.bullets.len(), 1);

        room.enqueue_input(a, shoot_at(3, 400.0, 100.0));
        room.step(10_100).unwrap();
        assert_eq!(room.bullets.len(), 1);

        room.enqueue_input(a, shoot_at(4, 400.0, 100.0));
        room.step(10_250).unwrap();
        assert_eq!(room.bullets.len(), 2);
    }

    #[test]
    fn rapid_fire_halves_the_cooldown() {
        let mut room = room();
        let a = join_at(&mut room, 400.0, 450.0);
        room.players
            .get_mut(&a)
            .unwrap()
            .apply_powerup(PowerupKind::RapidFire, 9_000);

        room.enqueue_input(a, shoot_at(1, 400.0, 100.0));
        room.step(10_000).unwrap();
        room.enqueue_input(a, shoot_at(2, 400.0, 100.0));
        room.step(10_125).unwrap();
        assert_eq!(room.bullets.len(), 2);
    }

    #[test]
    fn health_pickup_caps_at_max_and_consumes_powerup() {
        let mut room = room();
        let a = join_at(&mut room, 500.0, 500.0);
        room.players.get_mut(&a).unwrap().health = 60.0;
        room.powerups.push(Powerup::new(PowerupKind::Health, 510.0, 500.0));

        room.step(1_000).unwrap();

        assert_eq!(room.player(a).unwrap().health, 100.0);
        assert!(room.powerups.is_empty());
    }

    #[test]
    fn dead_players_cannot_pick_up() {
        let mut room = room();
        let a = join_at(&mut room, 500.0, 500.0);
        room.players.get_mut(&a).unwrap().take_damage(1_000.0, 900);
        room.powerups.push(Powerup::new(PowerupKind::Speed, 500.0, 500.0));

        room.step(1_000).unwrap();

        assert_eq!(room.powerups.len(), 1);
        assert!(room.player(a).unwrap().active_powerups.is_empty());
    }

    #[test]
    fn powerups_spawn_on_timer_up_to_cap() {
        let mut room = room();
        let mut now = POWERUP_RESPAWN_INTERVAL_MS;
        for _ in 0..(MAX_POWERUPS + 2) {
            room.step(now).unwrap();
            now += POWERUP_RESPAWN_INTERVAL_MS;
        }
        assert_eq!(room.powerups.len(), MAX_POWERUPS);
    }

    #[test]
    fn snapshots_follow_their_own_cadence() {
        let mut room = room();
        join_at(&mut room, 500.0, 500.0);

        let first = room.step(1_000).unwrap().expect("first tick publishes");
        assert!(room.step(1_016).unwrap().is_none());
        assert!(room.step(1_033).unwrap().is_none());
        let second = room.step(1_050).unwrap().expect("cadence elapsed");

        assert!(second.tick > first.tick);
        assert_eq!(second.tick, 4);
        assert_eq!(second.match_time, 1_050);
        assert_eq!(second.players.len(), 1);
    }

    #[test]
    fn room_capacity_is_enforced() {
        let mut room = room();
        for _ in 0..8 {
            room.add_player(Uuid::new_v4(), Some("p")).unwrap();
        }
        assert_eq!(
            room.add_player(Uuid::new_v4(), None).unwrap_err(),
            JoinError::RoomFull
        );
        assert_eq!(room.players.len(), 8);
    }

    #[test]
    fn non_finite_state_is_a_fault() {
        let mut room = room();
        let a = join_at(&mut room, 500.0, 500.0);
        room.players.get_mut(&a).unwrap().health = f32::NAN;
        let err = room.step(1_000).unwrap_err();
        assert_eq!(
            err,
            SimulationError::NonFinite {
                entity: "player",
                id: a
            }
        );
    }

    #[test]
    fn names_are_trimmed_and_capped() {
        let id = Uuid::parse_str("abcd1234-0000-0000-0000-000000000000").unwrap();
        assert_eq!(sanitize_name(Some("  Rommel  "), id), "Rommel");
        assert_eq!(sanitize_name(Some("abcdefghijklmnopqrstuvwxyz"), id), "abcdefghijklmnop");
        assert_eq!(sanitize_name(Some("   "), id), "Tank-abcd");
        assert_eq!(sanitize_name(None, id), "Tank-abcd");
    }
}
