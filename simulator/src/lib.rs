//! Offline drivers for the settlement engine.
//!
//! [`scenario`] replays a hand-written series of rounds from JSON. [`draw`] generates players,
//! tickets and draws from a seed and settles them round after round.

pub mod draw;
pub mod scenario;

pub use draw::{run_draws, DrawConfig, DrawConfigError, DrawReport};
pub use scenario::{RoundSpec, Scenario};
