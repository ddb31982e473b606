//! Tank arena - authoritative multiplayer tank shooter
//!
//! The server side runs one fixed-rate simulation task per room and streams
//! snapshots over WebSocket. The `client` module holds the matching
//! prediction, reconciliation and interpolation core.

pub mod app;
pub mod client;
pub mod config;
pub mod game;
pub mod http;
pub mod util;
pub mod ws;
