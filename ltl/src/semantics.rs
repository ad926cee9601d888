// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Traces and the evaluation of formulas over them.
//!
//! A [`Trace`] is either a finite word (finite semantics) or a lasso: a prefix
//! followed by a loop that repeats forever (infinite semantics).

use std::fmt;

use itertools::Itertools;

use crate::hashmap::{HashMap, HashSet};
use crate::syntax::{BinaryOp, Formula, FormulaKind, Identifier, UnaryOp};

/// The propositions that hold at one position of a trace.
pub type State = HashSet<Identifier>;

/// A finite trace, or a lasso when `loop_start` is set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Trace {
    /// The positions of the trace
    pub states: Vec<State>,
    /// For a lasso, the position the last state loops back to
    pub loop_start: Option<usize>,
}

impl Trace {
    /// Number of explicit positions (the loop is counted once).
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether the trace has no positions.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Evaluate `f` at the first position.
    ///
    /// Finite semantics requires a trace without a loop and infinite semantics
    /// a lasso; anything else is a caller error and panics.
    pub fn satisfies(&self, f: &Formula, finite: bool) -> bool {
        assert!(!self.is_empty(), "cannot evaluate over an empty trace");
        assert_eq!(
            finite,
            self.loop_start.is_none(),
            "finite semantics needs a finite trace, infinite semantics a lasso"
        );
        if let Some(l) = self.loop_start {
            assert!(l < self.len(), "loop start {l} out of bounds");
        }

        let order = f.postorder();
        let unrolled = self.unroll(past_depth(&order));
        unrolled.evaluate(&order)[f][0]
    }

    /// Repeat the loop of a lasso `times` extra times. Past subformulas of
    /// nesting depth `d` take the same values on every copy of the loop after
    /// the `d`-th, so unrolling by the past depth lets each position of the
    /// last copy stand for all of its future repetitions.
    fn unroll(&self, times: usize) -> Trace {
        let Some(l) = self.loop_start else {
            return self.clone();
        };
        let lasso = &self.states[l..];
        let mut states = self.states.clone();
        for _ in 0..times {
            states.extend(lasso.iter().cloned());
        }
        Trace {
            loop_start: Some(states.len() - lasso.len()),
            states,
        }
    }

    fn succ(&self, i: usize) -> Option<usize> {
        if i + 1 < self.len() {
            Some(i + 1)
        } else {
            self.loop_start
        }
    }

    /// Value of every subformula at every position, computed children first.
    fn evaluate(&self, order: &[Formula]) -> HashMap<Formula, Vec<bool>> {
        let n = self.len();
        let mut vals: HashMap<Formula, Vec<bool>> = HashMap::default();
        for f in order {
            let v = match f.kind() {
                FormulaKind::Boolean(b) => vec![*b; n],
                FormulaKind::Proposition(id) => self.states.iter().map(|s| s.contains(id)).collect(),
                FormulaKind::Unary(op, arg) => {
                    let a = &vals[arg];
                    match op {
                        UnaryOp::Not => a.iter().map(|x| !x).collect(),
                        UnaryOp::Next => (0..n).map(|i| self.succ(i).is_some_and(|j| a[j])).collect(),
                        UnaryOp::WeakNext => (0..n).map(|i| self.succ(i).map_or(true, |j| a[j])).collect(),
                        UnaryOp::Yesterday => (0..n).map(|i| i > 0 && a[i - 1]).collect(),
                        UnaryOp::WeakYesterday => (0..n).map(|i| i == 0 || a[i - 1]).collect(),
                        UnaryOp::Eventually => self.future(false, |i, next| a[i] || next.unwrap_or(false)),
                        UnaryOp::Always => self.future(true, |i, next| a[i] && next.unwrap_or(true)),
                        UnaryOp::Once => past(n, |i, prev| a[i] || prev.unwrap_or(false)),
                        UnaryOp::Historically => past(n, |i, prev| a[i] && prev.unwrap_or(true)),
                    }
                }
                FormulaKind::Binary(op, l, r) => {
                    let (a, b) = (&vals[l], &vals[r]);
                    match op {
                        BinaryOp::And => (0..n).map(|i| a[i] && b[i]).collect(),
                        BinaryOp::Or => (0..n).map(|i| a[i] || b[i]).collect(),
                        BinaryOp::Implies => (0..n).map(|i| !a[i] || b[i]).collect(),
                        BinaryOp::Iff => (0..n).map(|i| a[i] == b[i]).collect(),
                        BinaryOp::Until => {
                            self.future(false, |i, next| b[i] || (a[i] && next.unwrap_or(false)))
                        }
                        BinaryOp::Release => {
                            self.future(true, |i, next| b[i] && (a[i] || next.unwrap_or(true)))
                        }
                        BinaryOp::Since => past(n, |i, prev| b[i] || (a[i] && prev.unwrap_or(false))),
                        BinaryOp::Triggered => past(n, |i, prev| b[i] && (a[i] || prev.unwrap_or(true))),
                    }
                }
            };
            vals.insert(f.clone(), v);
        }
        vals
    }

    /// Solve the fixpoint equation `v[i] = step(i, v[succ(i)])`, starting from
    /// `init` everywhere: `false` gives the least fixpoint (eventualities),
    /// `true` the greatest (invariants). On a finite trace a single backward
    /// pass is already stable.
    fn future(&self, init: bool, step: impl Fn(usize, Option<bool>) -> bool) -> Vec<bool> {
        let mut v = vec![init; self.len()];
        loop {
            let mut changed = false;
            for i in (0..self.len()).rev() {
                let x = step(i, self.succ(i).map(|j| v[j]));
                if x != v[i] {
                    v[i] = x;
                    changed = true;
                }
            }
            if !changed {
                return v;
            }
        }
    }
}

/// Past operators are defined by a forward pass from the first position.
fn past(n: usize, step: impl Fn(usize, Option<bool>) -> bool) -> Vec<bool> {
    let mut v: Vec<bool> = Vec::with_capacity(n);
    for i in 0..n {
        let prev = i.checked_sub(1).map(|j| v[j]);
        v.push(step(i, prev));
    }
    v
}

/// The maximal nesting depth of past operators in the formula whose
/// subformulas are listed (children first) in `order`.
fn past_depth(order: &[Formula]) -> usize {
    let mut depth: HashMap<Formula, usize> = HashMap::default();
    for f in order {
        let below = f.children().map(|c| depth[c]).max().unwrap_or(0);
        let here = match f.kind() {
            FormulaKind::Unary(op, _) if op.is_past() => 1,
            FormulaKind::Binary(op, _, _) if op.is_past() => 1,
            _ => 0,
        };
        depth.insert(f.clone(), below + here);
    }
    order.last().map_or(0, |f| depth[f])
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, state) in self.states.iter().enumerate() {
            let marker = if self.loop_start == Some(i) { "->" } else { "  " };
            writeln!(f, "{marker} state {i}: {{{}}}", state.iter().join(", "))?;
        }
        if let Some(l) = self.loop_start {
            writeln!(f, "   loop back to state {l}")?;
        }
        Ok(())
    }
}
