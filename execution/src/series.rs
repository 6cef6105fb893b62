//! Multi-round settlement.
//!
//! A series applies one [`SeriesConfig`] to consecutive rounds and threads each round's
//! `carry_out` into the next round's `carry_in`. The carry is replaced wholesale after every
//! round and every round gets its own copy, so outputs already handed back never change.

use lotto_types::{RoundError, RoundOutput, SeriesConfig, TierAmounts, TierCounts};
use thiserror::Error;
use tracing::{debug, warn};

use crate::round;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SeriesError {
    #[error("per-round inputs differ in length (sales={sales}, winners={winners})")]
    LengthMismatch { sales: usize, winners: usize },
    #[error(transparent)]
    Round(#[from] RoundError),
}

/// Stepwise series driver that owns the carry between rounds.
#[derive(Clone, Debug)]
pub struct Series<'a> {
    config: &'a SeriesConfig,
    carry: TierAmounts,
    rounds_played: u64,
}

impl<'a> Series<'a> {
    /// Start with no carry.
    pub fn new(config: &'a SeriesConfig) -> Self {
        Self::seeded(config, TierAmounts::new())
    }

    /// Start from an externally supplied carry (e.g. a jackpot seed).
    pub fn seeded(config: &'a SeriesConfig, carry: TierAmounts) -> Self {
        Self {
            config,
            carry,
            rounds_played: 0,
        }
    }

    pub fn config(&self) -> &SeriesConfig {
        self.config
    }

    /// Carry that the next round will start from.
    pub fn carry(&self) -> &TierAmounts {
        &self.carry
    }

    pub fn rounds_played(&self) -> u64 {
        self.rounds_played
    }

    /// Settle the next round.
    ///
    /// On error the carry is left untouched and the round is not counted.
    pub fn play_round(
        &mut self,
        sales: i64,
        winners: &TierCounts,
    ) -> Result<RoundOutput, RoundError> {
        let input = self
            .config
            .round_input(sales, winners.clone(), self.carry.clone());
        let output = round::calculate(&input)?;

        self.carry = output.carry_out.clone();
        self.rounds_played += 1;
        debug!(
            round = self.rounds_played,
            sales,
            paid = output.total_paid(),
            carry = self.carry.total(),
            "round settled"
        );
        Ok(output)
    }
}

/// Settle `sales.len()` rounds in order.
///
/// Returns every round's output, or the first error with no partial results.
pub fn simulate_series(
    config: &SeriesConfig,
    sales: &[i64],
    winners: &[TierCounts],
    carry_in: Option<&TierAmounts>,
) -> Result<Vec<RoundOutput>, SeriesError> {
    if sales.len() != winners.len() {
        return Err(SeriesError::LengthMismatch {
            sales: sales.len(),
            winners: winners.len(),
        });
    }

    let mut series = Series::seeded(config, carry_in.cloned().unwrap_or_default());
    let mut outputs = Vec::with_capacity(sales.len());
    for (index, (sales, winners)) in sales.iter().zip(winners).enumerate() {
        let output = series.play_round(*sales, winners).inspect_err(|err| {
            warn!(round = index + 1, %err, "aborting series");
        })?;
        outputs.push(output);
    }
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lotto_types::{Allocation, Mode, Rank};

    fn tier1_only() -> SeriesConfig {
        SeriesConfig {
            allocations: vec![Allocation::new(Rank::Tier1, 10_000)],
            ..SeriesConfig::new(Mode::Parimutuel)
        }
    }

    #[test]
    fn carry_flows_between_rounds() {
        let config = tier1_only();
        let sales = [1_000_000, 1_000_000];
        let winners = [TierCounts::new(), TierCounts::from([(Rank::Tier1, 1)])];

        let results = simulate_series(&config, &sales, &winners, None).unwrap();
        assert_eq!(results.len(), 2);

        let first = &results[0];
        assert_eq!(first.pool_before.get(Rank::Tier1), 1_000_000);
        assert_eq!(first.paid_per_winner.get(Rank::Tier1), 0);
        assert_eq!(first.carry_out.get(Rank::Tier1), 1_000_000);

        let second = &results[1];
        assert_eq!(second.pool_before.get(Rank::Tier1), 2_000_000);
        assert_eq!(second.paid_per_winner.get(Rank::Tier1), 2_000_000);
        assert_eq!(second.carry_out.get(Rank::Tier1), 0);
    }

    #[test]
    fn initial_carry_seeds_first_round() {
        let config = tier1_only();
        let seed = TierAmounts::from([(Rank::Tier1, 250)]);
        let results =
            simulate_series(&config, &[1_000], &[TierCounts::new()], Some(&seed)).unwrap();
        assert_eq!(results[0].pool_before.get(Rank::Tier1), 1_250);
        // The caller's seed is copied, not consumed.
        assert_eq!(seed.get(Rank::Tier1), 250);
    }

    #[test]
    fn length_mismatch_fails_without_results() {
        let config = tier1_only();
        let err = simulate_series(
            &config,
            &[1_000_000],
            &[TierCounts::new(), TierCounts::new()],
            None,
        )
        .unwrap_err();
        assert_eq!(err, SeriesError::LengthMismatch { sales: 1, winners: 2 });
    }

    #[test]
    fn engine_error_aborts_whole_series() {
        let config = tier1_only();
        let err = simulate_series(
            &config,
            &[1_000, -5, 1_000],
            &[TierCounts::new(), TierCounts::new(), TierCounts::new()],
            None,
        )
        .unwrap_err();
        assert_eq!(err, SeriesError::Round(RoundError::NegativeSales { sales: -5 }));
    }

    #[test]
    fn failed_round_leaves_carry_untouched() {
        let config = tier1_only();
        let mut series = Series::new(&config);
        series.play_round(1_000, &TierCounts::new()).unwrap();
        assert_eq!(series.carry().get(Rank::Tier1), 1_000);

        assert!(series.play_round(-1, &TierCounts::new()).is_err());
        assert_eq!(series.carry().get(Rank::Tier1), 1_000);
        assert_eq!(series.rounds_played(), 1);
    }

    #[test]
    fn recorded_outputs_do_not_alias_later_carry() {
        let config = tier1_only();
        let mut series = Series::new(&config);
        let first = series.play_round(1_000, &TierCounts::new()).unwrap();
        let second = series.play_round(1_000, &TierCounts::new()).unwrap();

        assert_eq!(first.carry_out.get(Rank::Tier1), 1_000);
        assert_eq!(second.pool_before.get(Rank::Tier1), 2_000);
        assert_eq!(second.carry_out.get(Rank::Tier1), 2_000);
    }

    #[test]
    fn empty_series_is_ok() {
        let config = tier1_only();
        assert!(simulate_series(&config, &[], &[], None).unwrap().is_empty());
    }
}
