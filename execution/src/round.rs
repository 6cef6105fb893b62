//! Round distribution engine.
//!
//! [`calculate`] settles a single round. It is a pure function of its input: it never mutates
//! carry state, it only reports `carry_out` for the caller to feed into the next round.
//!
//! ## Parimutuel settlement
//!
//! Tiers are processed in [`Rank::PAYOUT_ORDER`]:
//! 1. **Base pools** - `floor(sales * bp / 10_000)` per tier, plus carry-in.
//! 2. **Remainder** - sales not absorbed by any base pool.
//! 3. **Caps** - one top-down sweep; each tier is checked once, after any overflow from above has
//!    landed on it. Overflow only moves to strictly lower tiers and is discarded at the lowest.
//! 4. **Payout** - per-winner share floored to the rounding unit; anything unpaid carries out.
//!
//! For every tier `pool_after_cap == paid_total + carry_out`.
//!
//! ## Fixed settlement
//!
//! Each winner receives the configured prize for their tier. No pools, caps or carry.

use std::collections::BTreeMap;

use lotto_types::{
    Allocation, Mode, Rank, RolldownMethod, RoundError, RoundInput, RoundOutput, TierAmounts,
    BASIS_POINTS,
};
use tracing::{debug, trace, warn};

/// Settle one round.
///
/// Fails only when `sales` is negative. Every other anomaly (allocations that do not add up to
/// 10,000 bp, caps that cannot be absorbed) is handled by the fallback policies above.
pub fn calculate(input: &RoundInput) -> Result<RoundOutput, RoundError> {
    if input.sales < 0 {
        return Err(RoundError::NegativeSales { sales: input.sales });
    }

    let mut output = RoundOutput::new(input.sales);
    match input.mode {
        Mode::Parimutuel => settle_parimutuel(&mut output, input),
        Mode::Fixed => settle_fixed(&mut output, input),
    }
    Ok(output)
}

fn settle_parimutuel(output: &mut RoundOutput, input: &RoundInput) {
    let weights = allocation_weights(&input.allocations);
    let total_bp: u64 = weights.values().map(|bp| u64::from(*bp)).sum();
    if total_bp > u64::from(BASIS_POINTS) {
        warn!(total_bp, "allocations exceed 10000 basis points");
    }

    let allocated = fill_base_pools(output, input, &weights);
    output.round_remainder = clamp_i64((i128::from(input.sales) - allocated).max(0));

    apply_caps(
        &mut output.pool_after_cap,
        &mut output.rolldown,
        &input.caps,
        &weights,
        input.rolldown,
    );
    pay_winners(output, input);
}

/// Later entries win when a tier is listed twice.
fn allocation_weights(allocations: &[Allocation]) -> BTreeMap<Rank, u32> {
    allocations
        .iter()
        .map(|allocation| (allocation.rank, allocation.basis_points))
        .collect()
}

fn clamp_i64(value: i128) -> i64 {
    i64::try_from(value).unwrap_or(if value < 0 { i64::MIN } else { i64::MAX })
}

/// Fills `pool_before` and `pool_after_cap`; returns the amount taken from sales.
fn fill_base_pools(
    output: &mut RoundOutput,
    input: &RoundInput,
    weights: &BTreeMap<Rank, u32>,
) -> i128 {
    let mut allocated: i128 = 0;
    for rank in Rank::PAYOUT_ORDER {
        let bp = weights.get(&rank).copied().unwrap_or(0);
        let base = i128::from(input.sales) * i128::from(bp) / i128::from(BASIS_POINTS);
        allocated += base;

        let pool = clamp_i64(base).saturating_add(input.carry_in.get(rank));
        output.pool_before.set(rank, pool);
        output.pool_after_cap.set(rank, pool);
    }
    allocated
}

/// Caps below zero act as zero.
fn apply_caps(
    pools: &mut TierAmounts,
    rolldown: &mut TierAmounts,
    caps: &TierAmounts,
    weights: &BTreeMap<Rank, u32>,
    method: RolldownMethod,
) {
    for (index, rank) in Rank::PAYOUT_ORDER.iter().copied().enumerate() {
        let Some(cap) = caps.entry(rank) else {
            continue;
        };
        let cap = cap.max(0);
        let pool = pools.get(rank);
        if pool <= cap {
            continue;
        }

        let overflow = pool.saturating_sub(cap);
        pools.set(rank, cap);
        rolldown.add(rank, overflow);

        let lower = &Rank::PAYOUT_ORDER[index + 1..];
        if lower.is_empty() {
            debug!(%rank, overflow, "capped lowest tier; overflow discarded");
            continue;
        }

        debug!(%rank, cap, overflow, ?method, "rolling overflow down");
        for (recipient, share) in split_overflow(overflow, lower, weights, method) {
            pools.add(recipient, share);
        }
    }
}

/// Divide `overflow` among `lower` tiers.
///
/// The shares always add up to `overflow`: the last tier in `lower` absorbs any rounding
/// remainder. With [`RolldownMethod::Proportional`] and no weight on any lower tier, the whole
/// overflow goes to the last tier. Returns nothing if `lower` is empty.
pub fn split_overflow(
    overflow: i64,
    lower: &[Rank],
    weights: &BTreeMap<Rank, u32>,
    method: RolldownMethod,
) -> Vec<(Rank, i64)> {
    let Some((&last, head)) = lower.split_last() else {
        return Vec::new();
    };

    let mut shares = Vec::with_capacity(lower.len());
    let mut distributed: i64 = 0;
    match method {
        RolldownMethod::Proportional => {
            let weight = |rank: &Rank| i128::from(weights.get(rank).copied().unwrap_or(0));
            let total: i128 = lower.iter().map(weight).sum();
            if total == 0 {
                return vec![(last, overflow)];
            }
            for rank in head {
                let share = clamp_i64(i128::from(overflow) * weight(rank) / total);
                distributed += share;
                shares.push((*rank, share));
            }
        }
        RolldownMethod::Equal => {
            let share = overflow / lower.len() as i64;
            for rank in head {
                distributed += share;
                shares.push((*rank, share));
            }
        }
    }
    shares.push((last, overflow - distributed));
    shares
}

fn pay_winners(output: &mut RoundOutput, input: &RoundInput) {
    let unit = input.effective_rounding_unit();
    for rank in Rank::PAYOUT_ORDER {
        let pool = output.pool_after_cap.get(rank);
        let winners = input.winners.get(&rank).copied().unwrap_or(0);
        if winners == 0 {
            output.carry_out.set(rank, pool);
            continue;
        }

        let winners = i64::try_from(winners).unwrap_or(i64::MAX);
        let per_winner = pool.div_euclid(winners);
        let rounded = per_winner.div_euclid(unit) * unit;
        let paid = rounded * winners;
        trace!(%rank, pool, winners, per_winner = rounded, paid, "tier paid");

        output.paid_per_winner.set(rank, rounded);
        output.paid_total.set(rank, paid);
        let remainder = pool - paid;
        if remainder > 0 {
            output.carry_out.set(rank, remainder);
        }
    }
}

fn settle_fixed(output: &mut RoundOutput, input: &RoundInput) {
    let mut total_paid: i64 = 0;
    for (&rank, &winners) in &input.winners {
        if winners == 0 {
            continue;
        }
        let prize = input.fixed_payout.get(rank);
        if prize <= 0 {
            continue;
        }

        let paid = prize.saturating_mul(i64::try_from(winners).unwrap_or(i64::MAX));
        output.paid_per_winner.set(rank, prize);
        output.paid_total.set(rank, paid);
        total_paid = total_paid.saturating_add(paid);
    }
    output.round_remainder = input.sales.saturating_sub(total_paid).max(0);
}
