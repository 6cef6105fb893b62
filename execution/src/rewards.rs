//! Reward distribution: turn a settled round into per-player payouts.

use std::collections::BTreeMap;

use lotto_types::{Draw, Player, Rank, RoundOutput, TierCounts};
use tracing::debug;

use crate::shard;
use crate::tally::{DEFAULT_WORKERS, PARALLEL_THRESHOLD};

/// Total payout per player name.
pub type Rewards = BTreeMap<String, i64>;

fn player_reward(player: &Player, draw: &Draw, output: &RoundOutput) -> i64 {
    player
        .tickets
        .iter()
        .map(|ticket| draw.rank_of(ticket))
        .filter(|rank| rank.is_winning())
        .fold(0i64, |total, rank| {
            total.saturating_add(output.paid_per_winner.get(rank))
        })
}

fn rewards_for(players: &[Player], draw: &Draw, output: &RoundOutput) -> Rewards {
    let mut rewards = Rewards::new();
    for player in players {
        let entry = rewards.entry(player.name.clone()).or_insert(0);
        *entry = entry.saturating_add(player_reward(player, draw, output));
    }
    rewards
}

/// Sum, per player, the per-winner payout of every winning ticket they hold.
///
/// Every player appears in the result (with zero if nothing won). Players sharing a name are
/// summed together.
pub fn distribute_rewards(players: &[Player], draw: &Draw, output: &RoundOutput) -> Rewards {
    rewards_for(players, draw, output)
}

/// Same as [`distribute_rewards`], with players split into `shards` contiguous partitions.
pub fn distribute_rewards_sharded(
    players: &[Player],
    draw: &Draw,
    output: &RoundOutput,
    shards: usize,
) -> Rewards {
    shard::fan_out(players, shards, |slice| rewards_for(slice, draw, output))
}

/// Shard across [`DEFAULT_WORKERS`] once the players hold enough tickets to be worth it.
pub fn distribute_rewards_parallel(
    players: &[Player],
    draw: &Draw,
    output: &RoundOutput,
) -> Rewards {
    let tickets: usize = players.iter().map(|player| player.tickets.len()).sum();
    if tickets < PARALLEL_THRESHOLD {
        return distribute_rewards(players, draw, output);
    }
    debug!(players = players.len(), tickets, "sharded reward distribution");
    distribute_rewards_sharded(players, draw, output, DEFAULT_WORKERS)
}

/// Fixed-table prize for a tally (sum of [`Rank::prize`] times winners).
pub fn total_prize(counts: &TierCounts) -> i64 {
    counts.iter().fold(0i64, |total, (rank, count)| {
        let count = i64::try_from(*count).unwrap_or(i64::MAX);
        total.saturating_add(rank.prize().saturating_mul(count))
    })
}

/// Prize as a percentage of the amount spent; zero when nothing was spent.
pub fn return_rate(total_prize: i64, spent: i64) -> f64 {
    if spent == 0 {
        return 0.0;
    }
    total_prize as f64 / spent as f64 * 100.0
}
