//! Winner tally: resolve every ticket against a draw and count winners per tier.

use std::collections::BTreeMap;

use lotto_types::{Draw, Player, Rank, RoundInput, Ticket, TierCounts};
use tracing::debug;

use crate::shard;

/// Worker count used by the `*_parallel` helpers.
pub const DEFAULT_WORKERS: usize = 4;

/// Below this many tickets the `*_parallel` helpers stay sequential.
pub const PARALLEL_THRESHOLD: usize = 100;

fn tally(tickets: &[Ticket], draw: &Draw) -> BTreeMap<Rank, u64> {
    let mut counts = BTreeMap::new();
    for ticket in tickets {
        *counts.entry(draw.rank_of(ticket)).or_insert(0) += 1;
    }
    counts
}

/// Count tickets per tier (including [`Rank::None`]).
pub fn count_winners(tickets: &[Ticket], draw: &Draw) -> TierCounts {
    tally(tickets, draw)
}

/// Same as [`count_winners`], split into `shards` contiguous partitions.
pub fn count_winners_sharded(tickets: &[Ticket], draw: &Draw, shards: usize) -> TierCounts {
    shard::fan_out(tickets, shards, |slice| tally(slice, draw))
}

/// Tally with [`DEFAULT_WORKERS`] shards once there are enough tickets to be worth it.
pub fn count_winners_parallel(tickets: &[Ticket], draw: &Draw) -> TierCounts {
    if tickets.len() < PARALLEL_THRESHOLD {
        return count_winners(tickets, draw);
    }
    debug!(tickets = tickets.len(), workers = DEFAULT_WORKERS, "sharded tally");
    count_winners_sharded(tickets, draw, DEFAULT_WORKERS)
}

/// Count winners across every ticket held by `players`.
pub fn count_winners_from_players(players: &[Player], draw: &Draw) -> TierCounts {
    let mut counts = TierCounts::new();
    for player in players {
        for (rank, count) in tally(&player.tickets, draw) {
            *counts.entry(rank).or_insert(0) += count;
        }
    }
    counts
}

/// `base` with its winners replaced by the tally of `players` against `draw`.
pub fn with_winners(mut base: RoundInput, players: &[Player], draw: &Draw) -> RoundInput {
    base.winners = count_winners_from_players(players, draw);
    base
}

#[cfg(test)]
mod tests {
    use super::*;
    use lotto_types::{Mode, TierAmounts};
    use proptest::prelude::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn ticket(numbers: [u8; 6]) -> Ticket {
        Ticket::new(numbers).unwrap()
    }

    fn draw() -> Draw {
        Draw::new([1, 2, 3, 4, 5, 6], 7).unwrap()
    }

    fn sample_players() -> Vec<Player> {
        vec![
            Player::new(
                "a",
                vec![ticket([1, 2, 3, 4, 5, 6]), ticket([1, 2, 3, 4, 5, 7])],
            ),
            Player::new(
                "b",
                vec![
                    ticket([1, 2, 3, 4, 5, 8]),
                    ticket([1, 2, 3, 4, 9, 10]),
                    ticket([1, 2, 3, 11, 12, 13]),
                ],
            ),
        ]
    }

    #[test]
    fn counts_one_winner_per_tier() {
        let counts = count_winners_from_players(&sample_players(), &draw());
        for rank in Rank::PAYOUT_ORDER {
            assert_eq!(counts.get(&rank), Some(&1), "unexpected count for {rank}");
        }
        assert_eq!(counts.get(&Rank::None), None);
    }

    #[test]
    fn losing_tickets_are_counted_under_none() {
        let tickets = vec![ticket([10, 11, 12, 13, 14, 15]), ticket([1, 2, 40, 41, 42, 43])];
        let counts = count_winners(&tickets, &draw());
        assert_eq!(counts, TierCounts::from([(Rank::None, 2)]));
    }

    #[test]
    fn with_winners_replaces_counts() {
        let base = RoundInput::standard(
            Mode::Parimutuel,
            5_000,
            TierCounts::from([(Rank::Tier1, 99)]),
            TierAmounts::new(),
        );
        let input = with_winners(base, &sample_players(), &draw());
        assert_eq!(input.winners.get(&Rank::Tier1), Some(&1));
        assert_eq!(input.sales, 5_000);
    }

    #[test]
    fn parallel_matches_sequential_on_large_input() {
        let mut rng = StdRng::seed_from_u64(99);
        let tickets: Vec<Ticket> = (0..5_000).map(|_| Ticket::random(&mut rng)).collect();
        let draw = Draw::random(&mut rng);

        let expected = count_winners(&tickets, &draw);
        assert_eq!(count_winners_parallel(&tickets, &draw), expected);
        assert_eq!(expected.values().sum::<u64>(), 5_000);
    }

    proptest! {
        /// Shard count never changes the tally.
        #[test]
        fn prop_sharding_is_invisible(
            seed in any::<u64>(),
            len in 0usize..400,
            shards in 0usize..16,
        ) {
            let mut rng = StdRng::seed_from_u64(seed);
            let tickets: Vec<Ticket> = (0..len).map(|_| Ticket::random(&mut rng)).collect();
            let draw = Draw::random(&mut rng);

            prop_assert_eq!(
                count_winners_sharded(&tickets, &draw, shards),
                count_winners(&tickets, &draw)
            );
        }
    }
}
