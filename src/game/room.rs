//! Room tasks and the room registry

use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::util::time::{tick_duration, tick_interval_ms, unix_millis};
use crate::ws::protocol::{InputCommand, ServerMsg};

use super::constants::{DEFAULT_ROOM_CODE, MAX_PLAYERS_PER_ROOM};
use super::world::{JoinError, RoomState, SimulationError};
use super::PlayerId;

/// How often a join retries when the room shut down underneath it
const JOIN_ATTEMPTS: usize = 3;

/// Messages from connections to a room task
#[derive(Debug)]
pub enum RoomCommand {
    Join {
        player_id: PlayerId,
        name: Option<String>,
        reply: oneshot::Sender<Result<(), JoinError>>,
    },
    Input {
        player_id: PlayerId,
        input: InputCommand,
    },
    Leave {
        player_id: PlayerId,
    },
    /// Poison a player's state so the next tick faults
    #[cfg(test)]
    Corrupt {
        player_id: PlayerId,
    },
}

/// Handle to a running room
#[derive(Clone)]
pub struct RoomHandle {
    /// Distinguishes a room from a later room with the same code
    pub id: Uuid,
    pub code: String,
    pub command_tx: mpsc::Sender<RoomCommand>,
    pub snapshot_tx: broadcast::Sender<ServerMsg>,
    pub player_count: Arc<AtomicUsize>,
}

impl RoomHandle {
    pub fn player_count(&self) -> usize {
        self.player_count.load(Ordering::Relaxed)
    }
}

/// The authoritative room task
pub struct GameRoom {
    id: Uuid,
    state: RoomState,
    tick_rate: u32,
    command_rx: mpsc::Receiver<RoomCommand>,
    snapshot_tx: broadcast::Sender<ServerMsg>,
    player_count: Arc<AtomicUsize>,
}

impl GameRoom {
    pub fn new(code: String, seed: u64, tick_rate: u32, now: u64) -> (Self, RoomHandle) {
        let (command_tx, command_rx) = mpsc::channel(256);
        let (snapshot_tx, _) = broadcast::channel(64);
        let player_count = Arc::new(AtomicUsize::new(0));
        let id = Uuid::new_v4();

        let handle = RoomHandle {
            id,
            code: code.clone(),
            command_tx,
            snapshot_tx: snapshot_tx.clone(),
            player_count: player_count.clone(),
        };

        let room = Self {
            id,
            state: RoomState::new(code, seed, now, tick_interval_ms(tick_rate), MAX_PLAYERS_PER_ROOM),
            tick_rate,
            command_rx,
            snapshot_tx,
            player_count,
        };

        (room, handle)
    }

    /// Run the tick loop until the room empties or faults
    pub async fn run(mut self) -> Result<(), SimulationError> {
        info!(room = %self.state.code, room_id = %self.id, tick_rate = self.tick_rate, "Room opened");

        let mut ticker = interval(tick_duration(self.tick_rate));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            if !self.process_commands() {
                break;
            }

            match self.state.step(unix_millis()) {
                Ok(Some(snapshot)) => {
                    // No subscribers is fine
                    let _ = self.snapshot_tx.send(ServerMsg::Snapshot(snapshot));
                }
                Ok(None) => {}
                Err(err) => {
                    let _ = self.snapshot_tx.send(ServerMsg::Error {
                        message: "Room closed after a simulation fault".to_string(),
                    });
                    return Err(err);
                }
            }
        }

        info!(room = %self.state.code, room_id = %self.id, ticks = self.state.tick, "Room closed");
        Ok(())
    }

    /// Drain queued commands. Returns false once the room should close.
    fn process_commands(&mut self) -> bool {
        let mut emptied = false;
        loop {
            match self.command_rx.try_recv() {
                Ok(RoomCommand::Join {
                    player_id,
                    name,
                    reply,
                }) => {
                    let result = self
                        .state
                        .add_player(player_id, name.as_deref())
                        .map(|_| ());
                    if let Err(err) = &result {
                        warn!(room = %self.state.code, player_id = %player_id, error = %err, "Join refused");
                    }
                    self.sync_player_count();
                    // Joiner may have hung up already
                    let _ = reply.send(result);
                }
                Ok(RoomCommand::Input { player_id, input }) => {
                    self.state.enqueue_input(player_id, input);
                }
                Ok(RoomCommand::Leave { player_id }) => {
                    self.state.remove_player(player_id);
                    self.sync_player_count();
                    emptied = self.state.is_empty();
                }
                #[cfg(test)]
                Ok(RoomCommand::Corrupt { player_id }) => {
                    if let Some(player) = self.state.players.get_mut(&player_id) {
                        player.health = f32::NAN;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return false,
            }
        }

        // A join later in the same drain keeps the room alive
        let close = emptied && self.state.is_empty() && self.state.code != DEFAULT_ROOM_CODE;
        if close {
            debug!(room = %self.state.code, "Last player left");
        }
        !close
    }

    fn sync_player_count(&self) {
        self.player_count
            .store(self.state.players.len(), Ordering::Relaxed);
    }
}

/// A player's membership in a room
#[derive(Debug)]
pub struct RoomSession {
    pub player_id: PlayerId,
    pub room_code: String,
    command_tx: mpsc::Sender<RoomCommand>,
}

impl RoomSession {
    /// Forward an input to the room. Returns false if the room is gone.
    pub async fn send_input(&self, input: InputCommand) -> bool {
        self.command_tx
            .send(RoomCommand::Input {
                player_id: self.player_id,
                input,
            })
            .await
            .is_ok()
    }

    pub async fn leave(self) {
        let _ = self
            .command_tx
            .send(RoomCommand::Leave {
                player_id: self.player_id,
            })
            .await;
    }
}

/// Registry of all active rooms, keyed by room code
pub struct RoomRegistry {
    rooms: Arc<DashMap<String, RoomHandle>>,
    tick_rate: u32,
}

impl RoomRegistry {
    pub fn new(tick_rate: u32) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            tick_rate,
        }
    }

    pub fn get(&self, code: &str) -> Option<RoomHandle> {
        self.rooms.get(code).map(|r| r.value().clone())
    }

    pub fn active_rooms(&self) -> usize {
        self.rooms.len()
    }

    pub fn total_players(&self) -> usize {
        self.rooms.iter().map(|r| r.value().player_count()).sum()
    }

    /// Join (creating on demand) the room named by `room_code`.
    ///
    /// The snapshot receiver is subscribed before the join is sent, so the
    /// first snapshot that includes the new player is never missed.
    pub async fn join(
        &self,
        player_id: PlayerId,
        room_code: Option<&str>,
        name: Option<String>,
    ) -> Result<(RoomSession, broadcast::Receiver<ServerMsg>), JoinError> {
        let code = sanitize_room_code(room_code);

        for _ in 0..JOIN_ATTEMPTS {
            let handle = self.get_or_spawn(&code);
            let snapshots = handle.snapshot_tx.subscribe();
            let (reply_tx, reply_rx) = oneshot::channel();

            let sent = handle
                .command_tx
                .send(RoomCommand::Join {
                    player_id,
                    name: name.clone(),
                    reply: reply_tx,
                })
                .await;

            if sent.is_ok() {
                if let Ok(result) = reply_rx.await {
                    result?;
                    let session = RoomSession {
                        player_id,
                        room_code: code,
                        command_tx: handle.command_tx.clone(),
                    };
                    return Ok((session, snapshots));
                }
            }

            // The room closed between lookup and join
            debug!(room = %code, room_id = %handle.id, "Stale room handle, retrying join");
            self.rooms.remove_if(&code, |_, h| h.id == handle.id);
        }

        Err(JoinError::RoomClosed)
    }

    fn get_or_spawn(&self, code: &str) -> RoomHandle {
        self.rooms
            .entry(code.to_string())
            .or_insert_with(|| self.spawn_room(code))
            .value()
            .clone()
    }

    /// Start a room task plus a supervisor that unregisters it when it ends
    fn spawn_room(&self, code: &str) -> RoomHandle {
        let seed: u64 = rand::random();
        let (room, handle) = GameRoom::new(code.to_string(), seed, self.tick_rate, unix_millis());

        let rooms = self.rooms.clone();
        let room_code = code.to_string();
        let room_id = handle.id;
        tokio::spawn(async move {
            match tokio::spawn(room.run()).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    error!(room = %room_code, room_id = %room_id, error = %err, "Room stopped on simulation fault");
                }
                Err(err) => {
                    error!(room = %room_code, room_id = %room_id, error = %err, "Room task aborted");
                }
            }
            // Only remove our own entry, a newer room may own the code now
            rooms.remove_if(&room_code, |_, h| h.id == room_id);
            info!(room = %room_code, room_id = %room_id, "Room removed from registry");
        });

        info!(room = %code, room_id = %handle.id, "Room created");
        handle
    }
}

/// Lowercase, keep `[a-z0-9-]`, and fall back to the default room
pub fn sanitize_room_code(raw: Option<&str>) -> String {
    let code: String = raw
        .unwrap_or_default()
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect();
    if code.is_empty() {
        DEFAULT_ROOM_CODE.to_string()
    } else {
        code
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[test]
    fn room_codes_are_sanitized() {
        assert_eq!(sanitize_room_code(Some("  Lobby-7 ")), "lobby-7");
        assert_eq!(sanitize_room_code(Some("My Room!")), "myroom");
        assert_eq!(sanitize_room_code(Some("???")), DEFAULT_ROOM_CODE);
        assert_eq!(sanitize_room_code(Some("")), DEFAULT_ROOM_CODE);
        assert_eq!(sanitize_room_code(None), DEFAULT_ROOM_CODE);
        assert_eq!(sanitize_room_code(Some("ÄRENA")), "rena");
    }

    #[tokio::test]
    async fn join_creates_room_on_demand() {
        let registry = RoomRegistry::new(60);
        assert_eq!(registry.active_rooms(), 0);

        let (session, _rx) = registry
            .join(Uuid::new_v4(), Some("Duel"), Some("ace".to_string()))
            .await
            .unwrap();

        assert_eq!(session.room_code, "duel");
        assert_eq!(registry.active_rooms(), 1);
        assert_eq!(registry.get("duel").unwrap().player_count(), 1);
        assert_eq!(registry.total_players(), 1);
    }

    #[tokio::test]
    async fn second_join_with_same_id_is_refused() {
        let registry = RoomRegistry::new(60);
        let id = Uuid::new_v4();
        registry.join(id, None, None).await.unwrap();
        let err = registry.join(id, None, None).await.unwrap_err();
        assert_eq!(err, JoinError::AlreadyJoined);
    }

    #[tokio::test]
    async fn players_in_the_same_room_share_snapshots() {
        let registry = RoomRegistry::new(60);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let (_sa, mut rx) = registry.join(a, Some("pair"), None).await.unwrap();
        registry.join(b, Some("pair"), None).await.unwrap();

        let snapshot = loop {
            match rx.recv().await.unwrap() {
                ServerMsg::Snapshot(s) if s.players.len() == 2 => break s,
                _ => continue,
            }
        };
        assert_eq!(snapshot.room_code, "pair");
        assert!(snapshot.player(a).is_some());
        assert!(snapshot.player(b).is_some());
    }

    #[tokio::test]
    async fn faulted_room_reports_error_and_unregisters() {
        let registry = RoomRegistry::new(60);
        let id = Uuid::new_v4();
        let (session, mut rx) = registry.join(id, Some("faulty"), None).await.unwrap();

        session
            .command_tx
            .send(RoomCommand::Corrupt { player_id: id })
            .await
            .unwrap();

        let message = timeout(Duration::from_secs(3), async {
            loop {
                match rx.recv().await {
                    Ok(ServerMsg::Error { message }) => break message,
                    Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => panic!("closed before error"),
                }
            }
        })
        .await
        .expect("no error broadcast");
        assert!(message.contains("fault"));

        // The supervisor drops the last sender along with the registry entry
        let closed = timeout(Duration::from_secs(3), async {
            loop {
                match rx.recv().await {
                    Err(broadcast::error::RecvError::Closed) => break,
                    _ => continue,
                }
            }
        })
        .await;
        assert!(closed.is_ok());
        assert!(registry.get("faulty").is_none());
        assert_eq!(registry.active_rooms(), 0);

        // The room is gone, so inputs can no longer be delivered
        assert!(!session.send_input(InputCommand::default()).await);
    }
}
