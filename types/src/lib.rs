//! Common lotto settlement types.
//!
//! Defines prize tiers, round inputs/outputs, tier-keyed amount maps and tickets used by the
//! execution layer and the simulator.
//!
//! Tier-keyed maps are `BTreeMap`-backed so every encoding (JSON objects keyed by the stable
//! [`Rank`] identifiers, or the binary codec) is independent of insertion order.

mod rank;
mod round;
mod ticket;

pub use rank::*;
pub use round::*;
pub use ticket::*;
