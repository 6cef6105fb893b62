use bytes::{Buf, BufMut};
use commonware_codec::{Error, FixedSize, Read, ReadExt, Write};
use serde::{Deserialize, Serialize};

/// Fixed-mode prize for a first-tier win.
pub const PRIZE_TIER1: i64 = 2_000_000_000;
/// Fixed-mode prize for a second-tier win.
pub const PRIZE_TIER2: i64 = 30_000_000;
/// Fixed-mode prize for a third-tier win.
pub const PRIZE_TIER3: i64 = 1_500_000;
/// Fixed-mode prize for a fourth-tier win.
pub const PRIZE_TIER4: i64 = 50_000;
/// Fixed-mode prize for a fifth-tier win.
pub const PRIZE_TIER5: i64 = 5_000;

/// Prize tier of a ticket.
///
/// The discriminant is the stable wire tag. `Ord` follows the tag, so `Tier1` is the greatest
/// rank and `None` the least. Settlement walks tiers in [`Rank::PAYOUT_ORDER`] and overflow from
/// a capped tier only ever moves to tiers that come after it in that order.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rank {
    None = 0,
    Tier5 = 1,
    Tier4 = 2,
    Tier3 = 3,
    Tier2 = 4,
    Tier1 = 5,
}

impl Rank {
    /// Every rank, in ascending tag order.
    pub const ALL: [Rank; 6] = [
        Rank::None,
        Rank::Tier5,
        Rank::Tier4,
        Rank::Tier3,
        Rank::Tier2,
        Rank::Tier1,
    ];

    /// Prize-bearing tiers from most to least exclusive.
    pub const PAYOUT_ORDER: [Rank; 5] = [
        Rank::Tier1,
        Rank::Tier2,
        Rank::Tier3,
        Rank::Tier4,
        Rank::Tier5,
    ];

    /// Resolve a tier from the number of matched winning numbers and whether the bonus matched.
    ///
    /// The bonus only matters for five matches (it separates `Tier2` from `Tier3`).
    pub fn from_matches(match_count: usize, bonus: bool) -> Self {
        match (match_count, bonus) {
            (6, _) => Rank::Tier1,
            (5, true) => Rank::Tier2,
            (5, false) => Rank::Tier3,
            (4, _) => Rank::Tier4,
            (3, _) => Rank::Tier5,
            _ => Rank::None,
        }
    }

    /// Prize paid per winner in fixed-payout mode.
    pub fn prize(self) -> i64 {
        match self {
            Rank::None => 0,
            Rank::Tier5 => PRIZE_TIER5,
            Rank::Tier4 => PRIZE_TIER4,
            Rank::Tier3 => PRIZE_TIER3,
            Rank::Tier2 => PRIZE_TIER2,
            Rank::Tier1 => PRIZE_TIER1,
        }
    }

    pub fn is_winning(self) -> bool {
        self != Rank::None
    }

    /// Stable identifier used over serialization boundaries.
    pub fn as_str(self) -> &'static str {
        match self {
            Rank::None => "none",
            Rank::Tier5 => "tier5",
            Rank::Tier4 => "tier4",
            Rank::Tier3 => "tier3",
            Rank::Tier2 => "tier2",
            Rank::Tier1 => "tier1",
        }
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<u8> for Rank {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Rank::None),
            1 => Ok(Rank::Tier5),
            2 => Ok(Rank::Tier4),
            3 => Ok(Rank::Tier3),
            4 => Ok(Rank::Tier2),
            5 => Ok(Rank::Tier1),
            _ => Err(()),
        }
    }
}

impl Write for Rank {
    fn write(&self, writer: &mut impl BufMut) {
        (*self as u8).write(writer);
    }
}

impl Read for Rank {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = u8::read(reader)?;
        Rank::try_from(value).map_err(|_| Error::InvalidEnum(value))
    }
}

impl FixedSize for Rank {
    const SIZE: usize = 1;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_matches_follows_lookup_table() {
        assert_eq!(Rank::from_matches(6, false), Rank::Tier1);
        assert_eq!(Rank::from_matches(6, true), Rank::Tier1);
        assert_eq!(Rank::from_matches(5, true), Rank::Tier2);
        assert_eq!(Rank::from_matches(5, false), Rank::Tier3);
        assert_eq!(Rank::from_matches(4, true), Rank::Tier4);
        assert_eq!(Rank::from_matches(3, false), Rank::Tier5);
        assert_eq!(Rank::from_matches(2, true), Rank::None);
        assert_eq!(Rank::from_matches(0, false), Rank::None);
    }

    #[test]
    fn payout_order_runs_from_most_to_least_exclusive() {
        for pair in Rank::PAYOUT_ORDER.windows(2) {
            assert!(pair[0] > pair[1]);
        }
        assert!(Rank::PAYOUT_ORDER.iter().all(|rank| rank.is_winning()));
    }

    #[test]
    fn prize_table_is_monotonic() {
        assert_eq!(Rank::None.prize(), 0);
        for pair in Rank::PAYOUT_ORDER.windows(2) {
            assert!(pair[0].prize() > pair[1].prize());
        }
    }

    #[test]
    fn tags_map_back_to_ranks() {
        for rank in Rank::ALL {
            assert_eq!(Rank::try_from(rank as u8), Ok(rank));
        }
        assert!(Rank::try_from(6).is_err());
    }
}
