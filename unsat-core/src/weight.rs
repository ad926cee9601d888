// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Sharing-aware weight analysis of a formula DAG, and the partition of its
//! subformulas into weight groups.

use std::collections::BTreeMap;

use ltl::{hashmap::HashMap, syntax::Formula};
use serde::Serialize;

/// Size and sharing of one distinct subformula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Weight {
    /// 1 for a leaf, otherwise 1 plus the sizes of the children
    pub size: usize,
    /// Number of parent slots referring to this node (1 for the root)
    pub occurrences: usize,
}

impl Weight {
    /// How much structure disappears if every occurrence of the node is
    /// abstracted away.
    pub fn weight(&self) -> usize {
        self.size * self.occurrences
    }
}

/// Subformulas with the same weight, in the order the analysis visited them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// The shared weight
    pub weight: usize,
    /// The subformulas of that weight
    pub members: Vec<Formula>,
}

/// The result of analyzing one formula.
#[derive(Debug, Clone)]
pub struct WeightMap {
    weights: HashMap<Formula, Weight>,
    next_index: usize,
}

impl WeightMap {
    /// Compute the weight of every distinct subformula of `f`, and the first
    /// placeholder index not already used in `f`.
    ///
    /// Every distinct node is expanded once. Occurrences are counted per
    /// parent slot of an expanded parent, so `a & a` gives `a` two
    /// occurrences, while the children of a shared parent count it once.
    pub fn analyze(f: &Formula) -> Self {
        let mut weights: HashMap<Formula, Weight> = HashMap::default();
        let mut next_index = 0;
        // children come first, so their sizes are known when the parent is
        // reached; occurrences are only final once the walk is over
        for g in f.postorder() {
            if let Some(p) = g.as_placeholder() {
                next_index = next_index.max(p.index + 1);
            }
            let size = 1 + g.children().map(|c| weights[c].size).sum::<usize>();
            for c in g.children() {
                weights[c].occurrences += 1;
            }
            weights.insert(
                g,
                Weight {
                    size,
                    occurrences: 0,
                },
            );
        }
        weights[f].occurrences = 1;
        WeightMap {
            weights,
            next_index,
        }
    }

    /// The first placeholder index that is safe to mint.
    pub fn next_index(&self) -> usize {
        self.next_index
    }

    /// The weight record of a subformula.
    pub fn get(&self, f: &Formula) -> Option<&Weight> {
        self.weights.get(f)
    }

    /// Number of distinct subformulas.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Whether the map is empty (never the case for an analyzed formula).
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// All records, children before parents.
    pub fn iter(&self) -> impl Iterator<Item = (&Formula, &Weight)> {
        self.weights.iter()
    }

    /// Partition the operator subformulas by weight, heaviest group first.
    ///
    /// Leaves are left out: turning a leaf into a placeholder leaf never
    /// makes the formula smaller.
    pub fn groups(&self) -> Vec<Group> {
        let mut by_weight: BTreeMap<usize, Vec<Formula>> = BTreeMap::new();
        for (f, w) in &self.weights {
            if !f.is_leaf() {
                by_weight.entry(w.weight()).or_default().push(f.clone());
            }
        }
        by_weight
            .into_iter()
            .rev()
            .map(|(weight, members)| Group { weight, members })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ltl::{
        parser::formula,
        syntax::{Placeholder, Sigma},
    };

    #[test]
    fn test_distinct_subformulas() {
        let sigma = Sigma::new();
        let f = formula(&sigma, "(a & b) | (a & b)");
        let w = WeightMap::analyze(&f);
        assert_eq!(w.len(), 4);
        assert_eq!(w.len(), f.postorder().len());
        for g in f.postorder() {
            let size = 1 + g.children().map(|c| w.get(c).unwrap().size).sum::<usize>();
            assert_eq!(w.get(&g).unwrap().size, size, "size of {g}");
        }

        let ab = formula(&sigma, "a & b");
        assert_eq!(w.get(&f).unwrap(), &Weight { size: 7, occurrences: 1 });
        assert_eq!(w.get(&ab).unwrap(), &Weight { size: 3, occurrences: 2 });
        // the shared parent is expanded once
        assert_eq!(w.get(&sigma.proposition("a")).unwrap().occurrences, 1);
        assert_eq!(w.next_index(), 0);
    }

    #[test]
    fn test_occurrences_per_slot() {
        let sigma = Sigma::new();
        let a = sigma.proposition("a");
        let f = sigma.and(&a, &a);
        let g = sigma.or(&f, &sigma.not(&a));
        let w = WeightMap::analyze(&g);
        assert_eq!(w.get(&a).unwrap(), &Weight { size: 1, occurrences: 3 });
        assert_eq!(w.get(&f).unwrap().size, 3);
        assert_eq!(w.get(&g).unwrap().size, 6);
    }

    #[test]
    fn test_next_index() {
        let sigma = Sigma::new();
        let placeholder = |index| {
            sigma.proposition(Placeholder {
                index,
                original: sigma.proposition("x"),
            })
        };
        let f = sigma.until(&placeholder(3), &sigma.and(&placeholder(7), &placeholder(0)));
        assert_eq!(WeightMap::analyze(&f).next_index(), 8);
    }

    #[test]
    fn test_groups() {
        let sigma = Sigma::new();
        let f = formula(&sigma, "(a & !a) & (b | !c)");
        let groups = WeightMap::analyze(&f).groups();
        let shown = groups
            .iter()
            .map(|g| {
                let members: Vec<String> = g.members.iter().map(|m| m.to_string()).collect();
                (g.weight, members)
            })
            .collect::<Vec<_>>();
        assert_eq!(
            shown,
            vec![
                (9, vec!["a & !a & (b | !c)".to_string()]),
                (4, vec!["a & !a".to_string(), "b | !c".to_string()]),
                (2, vec!["!a".to_string(), "!c".to_string()]),
            ]
        );
    }

    #[test]
    fn test_leaf_formula_has_no_groups() {
        let sigma = Sigma::new();
        let w = WeightMap::analyze(&sigma.proposition("a"));
        assert_eq!(w.len(), 1);
        assert!(w.groups().is_empty());
    }
}
