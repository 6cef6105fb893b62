//! Lotto settlement execution layer.
//!
//! This crate contains the deterministic round distribution engine plus the helpers that feed it
//! (winner tally) and consume it (series runner, reward distribution).
//!
//! ## Determinism requirements
//! - Settlement is integer-only; every division floors.
//! - Do not let iteration order of hash-based collections influence outputs (all tier maps are
//!   `BTreeMap`-backed).
//! - Sharded tallies must merge to exactly the sequential result.
//!
//! ## Carry invariants
//! The engine never owns carry. Each round reports `carry_out`; the caller (usually
//! [`Series`]) copies it into the next round's `carry_in`.
//!
//! ## Minimal settlement pipeline (example)
//! ```rust
//! use lotto_execution::{calculate, count_winners};
//! use lotto_types::{Draw, Mode, RoundInput, Ticket, TierAmounts};
//!
//! let draw = Draw::new([1, 2, 3, 4, 5, 6], 7).unwrap();
//! let tickets = vec![Ticket::new([1, 2, 3, 4, 5, 6]).unwrap()];
//! let winners = count_winners(&tickets, &draw);
//!
//! let input = RoundInput::standard(Mode::Parimutuel, 1_000_000, winners, TierAmounts::new());
//! let output = calculate(&input).unwrap();
//! assert_eq!(output.paid_total.get(lotto_types::Rank::Tier1), 750_000);
//! ```

pub mod rewards;
pub mod round;
pub mod series;
pub mod shard;
pub mod tally;

pub use lotto_types::RoundError;
pub use rewards::{
    distribute_rewards, distribute_rewards_parallel, distribute_rewards_sharded, return_rate,
    total_prize, Rewards,
};
pub use round::{calculate, split_overflow};
pub use series::{simulate_series, Series, SeriesError};
pub use tally::{
    count_winners, count_winners_from_players, count_winners_parallel, count_winners_sharded,
    with_winners, DEFAULT_WORKERS, PARALLEL_THRESHOLD,
};
