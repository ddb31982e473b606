//! Client-side netcode: prediction, reconciliation and interpolation
//!
//! Transport and rendering are left to the embedding application.

pub mod clock;
pub mod interpolator;
pub mod latency;
pub mod predictor;
pub mod session;

pub use clock::ServerClock;
pub use interpolator::Interpolator;
pub use latency::LatencyTracker;
pub use predictor::{InputSample, Predictor};
pub use session::{ClientSession, Frame};
