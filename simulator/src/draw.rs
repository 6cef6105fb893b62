//! Seeded random draws for the `draw` command.
//!
//! Every round each player buys quick-pick tickets, a draw is made, winners are tallied, the
//! round is settled with the standard rules for the chosen mode (carry threaded from the
//! previous round) and payouts are distributed. The same seed always reproduces the same report.

use anyhow::Result;
use lotto_execution::{count_winners_parallel, distribute_rewards_parallel, Rewards, Series};
use lotto_types::{purchase, Draw, Mode, Player, RoundOutput, SeriesConfig, Ticket, TierCounts};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DrawConfigError {
    #[error("players must be greater than zero")]
    NoPlayers,
    #[error("rounds must be greater than zero")]
    NoRounds,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawConfig {
    pub players: usize,
    /// Amount each player spends per round.
    pub spend: i64,
    pub seed: u64,
    pub mode: Mode,
    pub rounds: usize,
}

impl DrawConfig {
    pub fn validate(&self) -> Result<(), DrawConfigError> {
        if self.players == 0 {
            return Err(DrawConfigError::NoPlayers);
        }
        if self.rounds == 0 {
            return Err(DrawConfigError::NoRounds);
        }
        Ok(())
    }
}

/// Outcome of one simulated draw.
#[derive(Clone, Debug, Serialize)]
pub struct DrawReport {
    pub round: usize,
    pub draw: Draw,
    pub winners: TierCounts,
    pub settlement: RoundOutput,
    pub rewards: Rewards,
    pub total_spent: i64,
    /// Paid out as a percentage of sales.
    pub return_rate: f64,
}

pub fn run_draws(config: &DrawConfig) -> Result<Vec<DrawReport>> {
    config.validate()?;

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let rules = SeriesConfig::standard(config.mode);
    let mut series = Series::new(&rules);
    let mut reports = Vec::with_capacity(config.rounds);

    for round in 1..=config.rounds {
        let mut players = Vec::with_capacity(config.players);
        for index in 0..config.players {
            let tickets = purchase(config.spend, &mut rng)?;
            players.push(Player::new(format!("player-{}", index + 1), tickets));
        }
        let draw = Draw::random(&mut rng);

        let tickets: Vec<Ticket> = players
            .iter()
            .flat_map(|player| player.tickets.iter().copied())
            .collect();
        let winners = count_winners_parallel(&tickets, &draw);
        let total_spent: i64 = players.iter().map(Player::spent).sum();

        let settlement = series.play_round(total_spent, &winners)?;
        let rewards = distribute_rewards_parallel(&players, &draw, &settlement);
        let return_rate = lotto_execution::return_rate(settlement.total_paid(), total_spent);
        info!(
            round,
            tickets = tickets.len(),
            sales = total_spent,
            paid = settlement.total_paid(),
            carry = series.carry().total(),
            "draw settled"
        );

        reports.push(DrawReport {
            round,
            draw,
            winners,
            settlement,
            rewards,
            total_spent,
            return_rate,
        });
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lotto_types::{PurchaseError, Rank};

    fn config(mode: Mode) -> DrawConfig {
        DrawConfig {
            players: 5,
            spend: 40_000,
            seed: 7,
            mode,
            rounds: 3,
        }
    }

    #[test]
    fn same_seed_reproduces_reports() {
        let first = run_draws(&config(Mode::Parimutuel)).unwrap();
        let second = run_draws(&config(Mode::Parimutuel)).unwrap();
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn carry_threads_between_draws() {
        let reports = run_draws(&config(Mode::Parimutuel)).unwrap();
        assert_eq!(reports.len(), 3);
        for pair in reports.windows(2) {
            let carried = pair[0].settlement.carry_out.clone();
            let next = &pair[1].settlement;
            for rank in Rank::PAYOUT_ORDER {
                assert!(next.pool_before.get(rank) >= carried.get(rank));
            }
        }
    }

    #[test]
    fn rewards_match_paid_totals() {
        for mode in [Mode::Fixed, Mode::Parimutuel] {
            for report in run_draws(&config(mode)).unwrap() {
                let rewarded: i64 = report.rewards.values().sum();
                assert_eq!(rewarded, report.settlement.total_paid());
                assert_eq!(report.rewards.len(), 5);
                assert_eq!(report.total_spent, 200_000);
            }
        }
    }

    #[test]
    fn rejects_empty_configs() {
        let mut bad = config(Mode::Fixed);
        bad.players = 0;
        let err = run_draws(&bad).unwrap_err();
        assert_eq!(err.downcast_ref::<DrawConfigError>(), Some(&DrawConfigError::NoPlayers));

        let mut bad = config(Mode::Fixed);
        bad.rounds = 0;
        assert_eq!(bad.validate(), Err(DrawConfigError::NoRounds));
    }

    #[test]
    fn rejects_spend_that_is_not_whole_tickets() {
        let mut bad = config(Mode::Fixed);
        bad.spend = 1_500;
        let err = run_draws(&bad).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PurchaseError>(),
            Some(PurchaseError::NotMultiple { .. })
        ));
    }
}
