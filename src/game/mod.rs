//! Game simulation modules

pub mod combat;
pub mod constants;
pub mod input;
pub mod kinematics;
pub mod player;
pub mod powerups;
pub mod room;
pub mod snapshot;
pub mod world;

pub use room::{GameRoom, RoomCommand, RoomHandle, RoomRegistry, RoomSession};
pub use world::{JoinError, RoomState, SimulationError};

/// Server-assigned player identity
pub type PlayerId = uuid::Uuid;
