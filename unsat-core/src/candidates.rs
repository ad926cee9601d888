// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Enumeration of the non-empty subsets of a weight group, largest first.

use bitvec::prelude::*;

use ltl::{hashmap::HashSet, syntax::Formula};

/// The largest group whose subsets can be enumerated.
pub const MAX_GROUP: usize = 63;

/// Iterator over all `2^m - 1` non-empty selections of `m` elements.
///
/// Selections come in decreasing order of cardinality. Within one
/// cardinality they follow a binary counter whose least significant bit is
/// element 0. The counter jumps straight from one value of the current
/// cardinality to the next, so each selection costs constant work and nothing
/// is materialized up front.
#[derive(Debug, Clone)]
pub struct Candidates {
    m: usize,
    popcount: usize,
    /// The last selection yielded at `popcount`, 0 before the first
    counter: u64,
}

/// The smallest integer above `x` with as many bits set.
fn next_same_popcount(x: u64) -> u64 {
    let lowest = x & x.wrapping_neg();
    let ripple = x + lowest;
    (((ripple ^ x) >> 2) / lowest) | ripple
}

impl Candidates {
    /// The selections of a group of `m` elements. Panics for groups larger
    /// than [`MAX_GROUP`].
    pub fn new(m: usize) -> Self {
        assert!(
            m <= MAX_GROUP,
            "cannot enumerate the subsets of a group of {m} formulas"
        );
        Candidates {
            m,
            popcount: m,
            counter: 0,
        }
    }

    /// Total number of selections, `2^m - 1`.
    pub fn total(&self) -> u64 {
        (1u64 << self.m) - 1
    }
}

impl Iterator for Candidates {
    type Item = BitVec;

    fn next(&mut self) -> Option<BitVec> {
        while self.popcount > 0 {
            self.counter = match self.counter {
                0 => (1 << self.popcount) - 1,
                c => next_same_popcount(c),
            };
            if self.counter >> self.m == 0 {
                let mut selection = bitvec![0; self.m];
                for i in 0..self.m {
                    selection.set(i, (self.counter >> i) & 1 == 1);
                }
                return Some(selection);
            }
            self.popcount -= 1;
            self.counter = 0;
        }
        None
    }
}

/// The members of `group` picked by `selection`.
pub fn subset(group: &[Formula], selection: &BitSlice) -> HashSet<Formula> {
    assert_eq!(group.len(), selection.len());
    selection.iter_ones().map(|i| group[i].clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ltl::{parser::formula, syntax::Sigma};

    fn show(selection: &BitSlice) -> String {
        selection.iter().map(|b| if *b { '1' } else { '0' }).collect()
    }

    #[test]
    fn test_small_orders() {
        assert_eq!(Candidates::new(0).count(), 0);
        assert_eq!(Candidates::new(1).map(|s| show(&s)).collect::<Vec<_>>(), ["1"]);
        assert_eq!(
            Candidates::new(2).map(|s| show(&s)).collect::<Vec<_>>(),
            ["11", "10", "01"]
        );
        assert_eq!(
            Candidates::new(3).map(|s| show(&s)).collect::<Vec<_>>(),
            ["111", "110", "101", "011", "100", "010", "001"]
        );
    }

    #[test]
    fn test_ties_follow_the_counter() {
        let pairs: Vec<String> = Candidates::new(4)
            .filter(|s| s.count_ones() == 2)
            .map(|s| show(&s))
            .collect();
        assert_eq!(pairs, ["1100", "1010", "0110", "1001", "0101", "0011"]);
    }

    #[test]
    fn test_largest_group_starts_immediately() {
        let mut all = Candidates::new(MAX_GROUP);
        assert!(all.next().unwrap().all());
        // the 63 selections dropping one member, last drops member 0
        let dropping_first = all.nth(MAX_GROUP - 1).unwrap();
        assert_eq!(dropping_first.count_ones(), MAX_GROUP - 1);
        assert!(!dropping_first[0]);
        assert_eq!(all.next().unwrap().count_ones(), MAX_GROUP - 2);
    }

    #[test]
    fn test_count_uniqueness_and_order() {
        for m in 0..=8 {
            let all: Vec<BitVec> = Candidates::new(m).collect();
            assert_eq!(all.len() as u64, Candidates::new(m).total());
            assert_eq!(all.len(), (1 << m) - 1);

            let distinct: std::collections::HashSet<_> = all.iter().map(|s| show(s)).collect();
            assert_eq!(distinct.len(), all.len());

            assert!(all.iter().all(|s| s.len() == m && s.any()));
            assert!(all
                .windows(2)
                .all(|w| w[0].count_ones() >= w[1].count_ones()));
        }
    }

    #[test]
    fn test_subset() {
        let sigma = Sigma::new();
        let group = vec![
            formula(&sigma, "a & b"),
            formula(&sigma, "X c"),
            formula(&sigma, "d | e"),
        ];
        let picked = subset(&group, bits![1, 0, 1]);
        assert_eq!(picked.len(), 2);
        assert!(picked.contains(&group[0]));
        assert!(!picked.contains(&group[1]));
        assert!(picked.contains(&group[2]));
    }

    #[test]
    #[should_panic(expected = "cannot enumerate")]
    fn test_oversized_group() {
        Candidates::new(MAX_GROUP + 1);
    }
}
