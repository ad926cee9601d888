// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Replacing subformulas by placeholder propositions.

use std::collections::BTreeMap;

use ltl::{
    hashmap::{HashMap, HashSet},
    syntax::{Formula, FormulaKind, Placeholder, Sigma},
};

enum Visit {
    Enter(Formula),
    Exit(Formula),
}

/// Replace every occurrence of every member of `dontcares` in `f` by a
/// placeholder proposition remembering the subformula it replaced.
///
/// A member gets the same placeholder at all of its occurrences. Indices are
/// handed out from `next_index` upwards in the order members are first met by
/// a top-down, left-to-right descent. Parts of `f` without any member are
/// shared with `f`.
pub fn substitute(
    sigma: &Sigma,
    f: &Formula,
    dontcares: &HashSet<Formula>,
    next_index: usize,
) -> Formula {
    let mut next_index = next_index;
    let mut done: HashMap<Formula, Formula> = HashMap::default();
    let mut stack = vec![Visit::Enter(f.clone())];
    while let Some(visit) = stack.pop() {
        match visit {
            Visit::Enter(g) => {
                if done.contains_key(&g) {
                    continue;
                }
                if dontcares.contains(&g) {
                    let p = sigma.proposition(Placeholder {
                        index: next_index,
                        original: g.clone(),
                    });
                    next_index += 1;
                    done.insert(g, p);
                } else if g.is_leaf() {
                    done.insert(g.clone(), g);
                } else {
                    stack.push(Visit::Exit(g.clone()));
                    let children: Vec<Formula> = g.children().cloned().collect();
                    stack.extend(children.into_iter().rev().map(Visit::Enter));
                }
            }
            Visit::Exit(g) => {
                let rebuilt = match g.kind() {
                    FormulaKind::Unary(op, arg) => sigma.unary(*op, &done[arg]),
                    FormulaKind::Binary(op, l, r) => sigma.binary(*op, &done[l], &done[r]),
                    FormulaKind::Boolean(_) | FormulaKind::Proposition(_) => {
                        unreachable!("leaves are never expanded")
                    }
                };
                done.insert(g, rebuilt);
            }
        }
    }
    done[f].clone()
}

/// The placeholders occurring in `f`, and in the subformulas they replaced,
/// by index. Fails with the first index found standing for two different
/// subformulas.
pub fn placeholders(f: &Formula) -> Result<BTreeMap<usize, Formula>, usize> {
    let mut originals: BTreeMap<usize, Formula> = BTreeMap::new();
    let mut pending = vec![f.clone()];
    while let Some(h) = pending.pop() {
        for g in h.postorder() {
            let Some(Placeholder { index, original }) = g.as_placeholder() else {
                continue;
            };
            match originals.get(index) {
                Some(other) if other != original => return Err(*index),
                Some(_) => {}
                None => {
                    originals.insert(*index, original.clone());
                    pending.push(original.clone());
                }
            }
        }
    }
    Ok(originals)
}

/// Whether every placeholder index in `f` stands for a single subformula.
pub fn check_replacements(f: &Formula) -> bool {
    placeholders(f).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ltl::parser::formula;

    fn set(fs: &[&Formula]) -> HashSet<Formula> {
        fs.iter().map(|f| (*f).clone()).collect()
    }

    #[test]
    fn test_empty_dontcares() {
        let sigma = Sigma::new();
        let f = formula(&sigma, "G (a -> F b) & (c U d)");
        assert_eq!(substitute(&sigma, &f, &HashSet::default(), 0), f);
    }

    #[test]
    fn test_whole_formula() {
        let sigma = Sigma::new();
        let f = formula(&sigma, "a & !a");
        let g = substitute(&sigma, &f, &set(&[&f]), 5);
        let p = g.as_placeholder().expect("should be a placeholder");
        assert_eq!(p.index, 5);
        assert_eq!(p.original, f);
    }

    #[test]
    fn test_left_to_right_indices() {
        let sigma = Sigma::new();
        let f = formula(&sigma, "(a & !a) & (b | !c)");
        let left = formula(&sigma, "a & !a");
        let right = formula(&sigma, "b | !c");
        let g = substitute(&sigma, &f, &set(&[&right, &left]), 0);
        assert_eq!(g.to_string(), "{0} & {1}");
        let ps = placeholders(&g).unwrap();
        assert_eq!(ps[&0], left);
        assert_eq!(ps[&1], right);

        let g = substitute(&sigma, &f, &set(&[&right]), 3);
        assert_eq!(g.to_string(), "a & !a & {3}");
    }

    #[test]
    fn test_shared_subformula_same_index() {
        let sigma = Sigma::new();
        let f = formula(&sigma, "G (x & y) -> (F (x & y) | (x & y))");
        let shared = formula(&sigma, "x & y");
        let g = substitute(&sigma, &f, &set(&[&shared]), 2);
        assert_eq!(g.to_string(), "G {2} -> F {2} | {2}");
        assert!(check_replacements(&g));
        assert_eq!(placeholders(&g).unwrap().len(), 1);
    }

    #[test]
    fn test_nested_dontcares() {
        let sigma = Sigma::new();
        // the inner member disappears with its replaced ancestor
        let f = formula(&sigma, "X (a & b) & (a & b)");
        let outer = formula(&sigma, "X (a & b)");
        let inner = formula(&sigma, "a & b");
        let g = substitute(&sigma, &f, &set(&[&outer, &inner]), 0);
        assert_eq!(g.to_string(), "{0} & {1}");
        assert_eq!(placeholders(&g).unwrap()[&1], inner);
    }

    #[test]
    fn test_reuses_untouched_subtrees() {
        let sigma = Sigma::new();
        let f = formula(&sigma, "(p U q) & r");
        let r = formula(&sigma, "r");
        let g = substitute(&sigma, &f, &set(&[&r]), 0);
        let (FormulaKind::Binary(_, fl, _), FormulaKind::Binary(_, gl, _)) = (f.kind(), g.kind())
        else {
            panic!("expected conjunctions");
        };
        assert_eq!(fl, gl);
    }

    #[test]
    fn test_conflicting_placeholders() {
        let sigma = Sigma::new();
        let p = |original: &str| {
            sigma.proposition(Placeholder {
                index: 0,
                original: sigma.proposition(original),
            })
        };
        let f = sigma.and(&p("a"), &p("b"));
        assert!(!check_replacements(&f));
        assert_eq!(placeholders(&f), Err(0));
        assert!(check_replacements(&sigma.and(&p("a"), &p("a"))));
    }

    #[test]
    fn test_placeholders_inside_originals() {
        let sigma = Sigma::new();
        let f = formula(&sigma, "(a & !a) & (b | c)");
        let g = substitute(&sigma, &f, &set(&[&formula(&sigma, "b | c")]), 0);
        let h = substitute(&sigma, &g, &set(&[&g]), 1);
        let ps = placeholders(&h).unwrap();
        assert_eq!(ps.keys().copied().collect::<Vec<_>>(), [0, 1]);
        assert_eq!(ps[&1], g);

        // index 0 again, standing for something else than inside {1}
        let clash = sigma.and(&h, &substitute(&sigma, &f, &set(&[&f]), 0));
        assert_eq!(placeholders(&clash), Err(0));
    }
}
