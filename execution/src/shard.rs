//! Fan-out/fan-in over contiguous index ranges.
//!
//! Each shard builds its own partial map from a disjoint slice of the input; the partials are
//! merged by summation on the calling thread once every shard has finished. Shards never share
//! mutable state, so the merged result does not depend on how the input was partitioned.
//!
//! With the `parallel` feature the shards run on the rayon pool; without it they run one after
//! another.

use std::collections::BTreeMap;
use std::ops::Range;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Split `len` items into `shards` contiguous ranges. The last range takes the remainder.
///
/// `shards` is clamped to `1..=len` (or to one empty range when `len == 0`).
pub fn partition(len: usize, shards: usize) -> Vec<Range<usize>> {
    let shards = shards.clamp(1, len.max(1));
    let per_shard = len / shards;
    (0..shards)
        .map(|index| {
            let start = index * per_shard;
            let end = if index == shards - 1 {
                len
            } else {
                start + per_shard
            };
            start..end
        })
        .collect()
}

/// Values that merge across shards without overflowing.
pub(crate) trait Merge: Copy + Default {
    fn merge(self, other: Self) -> Self;
}

impl Merge for i64 {
    fn merge(self, other: Self) -> Self {
        self.saturating_add(other)
    }
}

impl Merge for u64 {
    fn merge(self, other: Self) -> Self {
        self.saturating_add(other)
    }
}

/// Run `local` over each shard of `items` and sum the partial maps (saturating).
pub(crate) fn fan_out<T, K, V, F>(items: &[T], shards: usize, local: F) -> BTreeMap<K, V>
where
    T: Sync,
    K: Ord + Send,
    V: Merge + Send,
    F: Fn(&[T]) -> BTreeMap<K, V> + Sync + Send,
{
    let ranges = partition(items.len(), shards);

    #[cfg(feature = "parallel")]
    let partials: Vec<BTreeMap<K, V>> = ranges
        .into_par_iter()
        .map(|range| local(&items[range]))
        .collect();
    #[cfg(not(feature = "parallel"))]
    let partials: Vec<BTreeMap<K, V>> = ranges
        .into_iter()
        .map(|range| local(&items[range]))
        .collect();

    let mut merged = BTreeMap::new();
    for partial in partials {
        for (key, value) in partial {
            let total = merged.entry(key).or_insert_with(V::default);
            *total = Merge::merge(*total, value);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_covers_input_contiguously() {
        for len in [0usize, 1, 3, 4, 10, 101] {
            for shards in [0usize, 1, 2, 4, 7, 200] {
                let ranges = partition(len, shards);
                assert!(!ranges.is_empty());
                assert_eq!(ranges.first().unwrap().start, 0);
                assert_eq!(ranges.last().unwrap().end, len);
                for pair in ranges.windows(2) {
                    assert_eq!(pair[0].end, pair[1].start);
                }
            }
        }
    }

    #[test]
    fn partition_gives_remainder_to_last_shard() {
        assert_eq!(partition(10, 4), vec![0..2, 2..4, 4..6, 6..10]);
        assert_eq!(partition(3, 8), vec![0..1, 1..2, 2..3]);
        assert_eq!(partition(0, 4), vec![0..0]);
    }

    #[test]
    fn fan_out_sums_partials() {
        let items: Vec<u32> = (0..100).collect();
        let count_parity = |slice: &[u32]| {
            let mut map = BTreeMap::new();
            for item in slice {
                *map.entry(item % 2).or_insert(0u64) += 1;
            }
            map
        };
        for shards in [1, 3, 4, 100] {
            let merged = fan_out(&items, shards, count_parity);
            assert_eq!(merged, BTreeMap::from([(0, 50), (1, 50)]));
        }
    }

    #[test]
    fn fan_out_saturates_instead_of_overflowing() {
        let items = [i64::MAX / 2 + 10, i64::MAX / 2 + 10];
        let sum_all = |slice: &[i64]| {
            let total = slice.iter().fold(0i64, |acc, value| acc.saturating_add(*value));
            BTreeMap::from([("a", total)])
        };
        assert_eq!(fan_out(&items, 1, sum_all), BTreeMap::from([("a", i64::MAX)]));
        assert_eq!(fan_out(&items, 2, sum_all), BTreeMap::from([("a", i64::MAX)]));
    }
}
