use std::collections::BTreeMap;

use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, FixedSize, Read, ReadExt, Write};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

use super::Rank;

/// Denominator for allocation shares (10,000 basis points = 100%).
pub const BASIS_POINTS: u32 = 10_000;

/// Allocation used by the standard parimutuel preset.
pub const STANDARD_ALLOCATIONS: [Allocation; 5] = [
    Allocation::new(Rank::Tier1, 7_500),
    Allocation::new(Rank::Tier2, 1_250),
    Allocation::new(Rank::Tier3, 1_250),
    Allocation::new(Rank::Tier4, 0),
    Allocation::new(Rank::Tier5, 0),
];

/// First-tier pool cap used by the standard parimutuel preset.
pub const STANDARD_TIER1_CAP: i64 = 2_000_000_000;

/// Per-winner rounding unit used by the standard parimutuel preset.
pub const STANDARD_ROUNDING_UNIT: i64 = 100;

/// Structural errors raised while settling a round.
#[derive(Debug, ThisError, Clone, PartialEq, Eq)]
pub enum RoundError {
    #[error("sales must not be negative (got={sales})")]
    NegativeSales { sales: i64 },
    #[error("invalid settlement mode: {0}")]
    InvalidMode(String),
}

/// How a round turns sales into prizes.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Mode {
    /// Every winner receives the configured fixed prize for their tier.
    Fixed = 0,
    /// Sales are split into tier pools that winners share.
    Parimutuel = 1,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Fixed => "fixed",
            Mode::Parimutuel => "parimutuel",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Mode {
    type Err = RoundError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fixed" => Ok(Mode::Fixed),
            "parimutuel" => Ok(Mode::Parimutuel),
            other => Err(RoundError::InvalidMode(other.to_string())),
        }
    }
}

impl TryFrom<String> for Mode {
    type Error = RoundError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<u8> for Mode {
    type Error = RoundError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Mode::Fixed),
            1 => Ok(Mode::Parimutuel),
            other => Err(RoundError::InvalidMode(format!("tag {other}"))),
        }
    }
}

impl From<Mode> for &'static str {
    fn from(mode: Mode) -> Self {
        mode.as_str()
    }
}

impl Write for Mode {
    fn write(&self, writer: &mut impl BufMut) {
        (*self as u8).write(writer);
    }
}

impl Read for Mode {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = u8::read(reader)?;
        Mode::try_from(value).map_err(|_| Error::InvalidEnum(value))
    }
}

impl FixedSize for Mode {
    const SIZE: usize = 1;
}

/// Policy for spreading a capped tier's overflow over the tiers below it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RolldownMethod {
    /// Weighted by each lower tier's allocation basis points.
    #[default]
    Proportional,
    /// Split evenly, with the integer remainder going to the lowest tier.
    Equal,
}

/// Share of sales routed to a tier's base pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub rank: Rank,
    pub basis_points: u32,
}

impl Allocation {
    pub const fn new(rank: Rank, basis_points: u32) -> Self {
        Self { rank, basis_points }
    }
}

/// Winner counts per tier.
pub type TierCounts = BTreeMap<Rank, u64>;

/// Amounts keyed by tier. A tier without an entry reads as zero.
///
/// Backed by a `BTreeMap` so iteration, JSON objects and the binary encoding are all in
/// ascending tier order regardless of insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TierAmounts(BTreeMap<Rank, i64>);

impl TierAmounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Amount recorded for `rank`, or zero.
    pub fn get(&self, rank: Rank) -> i64 {
        self.0.get(&rank).copied().unwrap_or(0)
    }

    /// Amount recorded for `rank`, distinguishing "absent" from zero (used for caps).
    pub fn entry(&self, rank: Rank) -> Option<i64> {
        self.0.get(&rank).copied()
    }

    pub fn contains(&self, rank: Rank) -> bool {
        self.0.contains_key(&rank)
    }

    pub fn set(&mut self, rank: Rank, amount: i64) {
        self.0.insert(rank, amount);
    }

    pub fn add(&mut self, rank: Rank, amount: i64) {
        let entry = self.0.entry(rank).or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Rank, i64)> + '_ {
        self.0.iter().map(|(rank, amount)| (*rank, *amount))
    }

    pub fn total(&self) -> i64 {
        self.0.values().fold(0i64, |acc, amount| acc.saturating_add(*amount))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Rank, i64)> for TierAmounts {
    fn from_iter<I: IntoIterator<Item = (Rank, i64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[(Rank, i64); N]> for TierAmounts {
    fn from(entries: [(Rank, i64); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl From<BTreeMap<Rank, i64>> for TierAmounts {
    fn from(map: BTreeMap<Rank, i64>) -> Self {
        Self(map)
    }
}

impl Write for TierAmounts {
    fn write(&self, writer: &mut impl BufMut) {
        (self.0.len() as u8).write(writer);
        for (rank, amount) in &self.0 {
            rank.write(writer);
            amount.write(writer);
        }
    }
}

impl Read for TierAmounts {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let len = u8::read(reader)? as usize;
        if len > Rank::ALL.len() {
            return Err(Error::Invalid("TierAmounts", "too many ranks"));
        }
        let mut amounts = BTreeMap::new();
        let mut previous: Option<Rank> = None;
        for _ in 0..len {
            let rank = Rank::read(reader)?;
            if previous.is_some_and(|prev| prev >= rank) {
                return Err(Error::Invalid("TierAmounts", "ranks not ascending"));
            }
            let amount = i64::read(reader)?;
            amounts.insert(rank, amount);
            previous = Some(rank);
        }
        Ok(Self(amounts))
    }
}

impl EncodeSize for TierAmounts {
    fn encode_size(&self) -> usize {
        u8::SIZE + self.0.len() * (Rank::SIZE + i64::SIZE)
    }
}

fn default_rounding_unit() -> i64 {
    1
}

/// Everything the engine needs to settle one round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundInput {
    pub mode: Mode,
    pub sales: i64,
    #[serde(default)]
    pub winners: TierCounts,
    #[serde(default)]
    pub carry_in: TierAmounts,
    #[serde(default)]
    pub allocations: Vec<Allocation>,
    /// Pool cap per tier; tiers without an entry are uncapped.
    #[serde(default)]
    pub caps: TierAmounts,
    /// Per-winner payouts are floored to a multiple of this. Values <= 0 behave as 1.
    #[serde(default = "default_rounding_unit")]
    pub rounding_unit: i64,
    #[serde(default)]
    pub rolldown: RolldownMethod,
    /// Prize per winner in fixed mode.
    #[serde(default)]
    pub fixed_payout: TierAmounts,
}

impl RoundInput {
    /// Round settled with the standard preset for `mode` (see [`SeriesConfig::standard`]).
    pub fn standard(mode: Mode, sales: i64, winners: TierCounts, carry_in: TierAmounts) -> Self {
        SeriesConfig::standard(mode).round_input(sales, winners, carry_in)
    }

    /// Rounding unit with non-positive values normalized to 1.
    pub fn effective_rounding_unit(&self) -> i64 {
        if self.rounding_unit <= 0 {
            1
        } else {
            self.rounding_unit
        }
    }
}

/// Result of settling one round.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundOutput {
    pub sales: i64,
    /// Base pool plus carry-in, before caps.
    pub pool_before: TierAmounts,
    /// Pool after caps and rolldown; what winners are paid from.
    pub pool_after_cap: TierAmounts,
    pub paid_per_winner: TierAmounts,
    pub paid_total: TierAmounts,
    /// Overflow removed from a tier by its cap.
    pub rolldown: TierAmounts,
    /// Unpaid amount to feed into the next round's carry-in.
    pub carry_out: TierAmounts,
    /// Sales not absorbed by any tier pool (parimutuel) or not paid out (fixed).
    pub round_remainder: i64,
}

impl RoundOutput {
    pub fn new(sales: i64) -> Self {
        Self {
            sales,
            ..Self::default()
        }
    }

    /// Sum paid to winners across all tiers.
    pub fn total_paid(&self) -> i64 {
        self.paid_total.total()
    }
}

impl Write for RoundOutput {
    fn write(&self, writer: &mut impl BufMut) {
        self.sales.write(writer);
        self.pool_before.write(writer);
        self.pool_after_cap.write(writer);
        self.paid_per_winner.write(writer);
        self.paid_total.write(writer);
        self.rolldown.write(writer);
        self.carry_out.write(writer);
        self.round_remainder.write(writer);
    }
}

impl Read for RoundOutput {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            sales: i64::read(reader)?,
            pool_before: TierAmounts::read(reader)?,
            pool_after_cap: TierAmounts::read(reader)?,
            paid_per_winner: TierAmounts::read(reader)?,
            paid_total: TierAmounts::read(reader)?,
            rolldown: TierAmounts::read(reader)?,
            carry_out: TierAmounts::read(reader)?,
            round_remainder: i64::read(reader)?,
        })
    }
}

impl EncodeSize for RoundOutput {
    fn encode_size(&self) -> usize {
        i64::SIZE
            + self.pool_before.encode_size()
            + self.pool_after_cap.encode_size()
            + self.paid_per_winner.encode_size()
            + self.paid_total.encode_size()
            + self.rolldown.encode_size()
            + self.carry_out.encode_size()
            + i64::SIZE
    }
}

/// Rules shared by every round of a series. Only sales, winners and carry vary per round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesConfig {
    pub mode: Mode,
    #[serde(default)]
    pub allocations: Vec<Allocation>,
    #[serde(default)]
    pub caps: TierAmounts,
    #[serde(default = "default_rounding_unit")]
    pub rounding_unit: i64,
    #[serde(default)]
    pub rolldown: RolldownMethod,
    #[serde(default)]
    pub fixed_payout: TierAmounts,
}

impl SeriesConfig {
    /// Bare configuration: no allocations, caps or fixed prizes, unit rounding.
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            allocations: Vec::new(),
            caps: TierAmounts::new(),
            rounding_unit: 1,
            rolldown: RolldownMethod::Proportional,
            fixed_payout: TierAmounts::new(),
        }
    }

    /// Standard lottery rules.
    ///
    /// Fixed mode pays the [`Rank::prize`] table. Parimutuel mode routes 75% / 12.5% / 12.5% of
    /// sales to the top three tiers, caps the first tier at [`STANDARD_TIER1_CAP`], rounds
    /// payouts down to [`STANDARD_ROUNDING_UNIT`] and rolls overflow down proportionally.
    pub fn standard(mode: Mode) -> Self {
        match mode {
            Mode::Fixed => Self {
                fixed_payout: standard_fixed_payouts(),
                ..Self::new(mode)
            },
            Mode::Parimutuel => Self {
                allocations: STANDARD_ALLOCATIONS.to_vec(),
                caps: TierAmounts::from([(Rank::Tier1, STANDARD_TIER1_CAP)]),
                rounding_unit: STANDARD_ROUNDING_UNIT,
                ..Self::new(mode)
            },
        }
    }

    pub fn round_input(
        &self,
        sales: i64,
        winners: TierCounts,
        carry_in: TierAmounts,
    ) -> RoundInput {
        RoundInput {
            mode: self.mode,
            sales,
            winners,
            carry_in,
            allocations: self.allocations.clone(),
            caps: self.caps.clone(),
            rounding_unit: self.rounding_unit,
            rolldown: self.rolldown,
            fixed_payout: self.fixed_payout.clone(),
        }
    }
}

/// The [`Rank::prize`] table for every prize-bearing tier.
pub fn standard_fixed_payouts() -> TierAmounts {
    Rank::PAYOUT_ORDER
        .iter()
        .map(|rank| (*rank, rank.prize()))
        .collect()
}
