// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! An explicit-state tableau deciding satisfiability of LTL with past, under
//! both finite-trace and infinite-trace semantics.
//!
//! The closure of the formula is reduced to a set of elementary variables: one
//! per atomic proposition, one per next-obligation (the value some subformula
//! must have at the next position), and one per yesterday-obligation (the
//! value some subformula had at the previous position). Every other
//! subformula is a function of these through the usual expansion laws, e.g.
//! `a U b = b | (a & X (a U b))`. A state is a valuation of the elementary
//! variables, and `s -> t` is a transition when the obligations of `s` agree
//! with `t`.
//!
//! - Finite semantics: satisfiable iff a final state (no pending strong
//!   next-obligation) is reachable from an initial state.
//! - Infinite semantics: satisfiable iff a reachable non-trivial strongly
//!   connected component fulfils every eventuality. Formulas are not put in
//!   negation normal form, so a false `R` or `G` is an eventuality too:
//!   `!(a R b)` is `!a U !b`.

use std::collections::VecDeque;

use ltl::{
    hashmap::{HashMap, HashSet},
    scope::Scope,
    semantics::{State, Trace},
    syntax::{BinaryOp, Formula, FormulaKind, Identifier, UnaryOp},
};
use petgraph::{algo::tarjan_scc, graph::DiGraph};

use crate::basics::{check_scope, Oracle, SolveResult, SolverError};
use crate::timing::{self, TimeType};

/// Above this many elementary variables the state space is not materialized,
/// whatever the configuration says.
pub const HARD_LIMIT: usize = 32;

/// How the value of one closure element follows from a state and the values
/// of earlier closure elements (referred to by position).
#[derive(Debug, Clone, Copy)]
enum Rule {
    Const(bool),
    Var(usize),
    Not(usize),
    And(usize, usize),
    Or(usize, usize),
    Implies(usize, usize),
    Iff(usize, usize),
    /// `goal | (hold & var)`; a missing `hold` is true. Covers U, F, S and O.
    Until {
        hold: Option<usize>,
        goal: usize,
        var: usize,
    },
    /// `goal & (hold | var)`; a missing `hold` is false. Covers R, G, T and H.
    Release {
        hold: Option<usize>,
        goal: usize,
        var: usize,
    },
}

/// An elementary variable standing for the value of `target` at a
/// neighbouring position. A strong obligation is false where that position
/// does not exist, a weak one is true.
#[derive(Debug, Clone, Copy)]
struct Obligation {
    var: usize,
    target: usize,
    strong: bool,
}

#[derive(Default)]
struct Obligations {
    index: HashMap<(usize, bool), usize>,
    list: Vec<Obligation>,
}

impl Obligations {
    fn var(&mut self, vars: &mut usize, target: usize, strong: bool) -> usize {
        if let Some(&var) = self.index.get(&(target, strong)) {
            return var;
        }
        let var = *vars;
        *vars += 1;
        self.index.insert((target, strong), var);
        self.list.push(Obligation {
            var,
            target,
            strong,
        });
        var
    }
}

/// A closure element whose value `polarity` is only justified once `goal`
/// takes the same value: a true `U`/`F` waits for its goal to hold, a false
/// `R`/`G` for its goal to fail.
#[derive(Debug, Clone, Copy)]
struct Eventuality {
    element: usize,
    goal: usize,
    polarity: bool,
}

impl Eventuality {
    fn until(element: usize, goal: usize) -> Self {
        Self {
            element,
            goal,
            polarity: true,
        }
    }

    fn release(element: usize, goal: usize) -> Self {
        Self {
            element,
            goal,
            polarity: false,
        }
    }

    fn fulfilled(&self, v: &[bool]) -> bool {
        v[self.element] != self.polarity || v[self.goal] == self.polarity
    }
}

fn bit(state: usize, i: usize) -> bool {
    (state >> i) & 1 == 1
}

struct Tableau {
    rules: Vec<Rule>,
    root: usize,
    atoms: Vec<Identifier>,
    next: Vec<Obligation>,
    prev: Vec<Obligation>,
    /// Future eventualities, in both polarities
    eventualities: Vec<Eventuality>,
    vars: usize,
}

/// What the search needs to know about one state.
#[derive(Debug, Clone, Copy)]
struct StateInfo {
    /// The obligations this state places on its successor, matched against
    /// the arrival key of every candidate successor
    departure: usize,
    initial: bool,
    accepting: bool,
    /// Bitmask of the eventualities fulfilled here
    fulfils: u64,
}

struct Explored {
    states: Vec<StateInfo>,
    by_arrival: HashMap<usize, Vec<usize>>,
}

impl Explored {
    fn successors(&self, s: usize) -> &[usize] {
        self.by_arrival
            .get(&self.states[s].departure)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Breadth-first search from the initial states, returning the parent of
    /// every reachable state (`None` for initial ones) in discovery order.
    fn reachable(&self) -> HashMap<usize, Option<usize>> {
        let mut parent = HashMap::default();
        let mut queue = VecDeque::new();
        for (s, info) in self.states.iter().enumerate() {
            if info.initial {
                parent.insert(s, None);
                queue.push_back(s);
            }
        }
        while let Some(s) = queue.pop_front() {
            for &t in self.successors(s) {
                if !parent.contains_key(&t) {
                    parent.insert(t, Some(s));
                    queue.push_back(t);
                }
            }
        }
        parent
    }

    /// A path of at least one transition from `from` to a state satisfying
    /// `target`, staying inside `allowed`. The path excludes `from` and
    /// includes the target.
    fn path_within(
        &self,
        from: usize,
        allowed: &HashSet<usize>,
        target: impl Fn(usize) -> bool,
    ) -> Option<Vec<usize>> {
        let mut parent: HashMap<usize, usize> = HashMap::default();
        let mut queue = VecDeque::from([from]);
        while let Some(s) = queue.pop_front() {
            for &t in self.successors(s) {
                if !allowed.contains(&t) || parent.contains_key(&t) {
                    continue;
                }
                parent.insert(t, s);
                if target(t) {
                    let mut path = vec![t];
                    let mut cur = parent[&t];
                    while cur != from {
                        path.push(cur);
                        cur = parent[&cur];
                    }
                    path.reverse();
                    return Some(path);
                }
                queue.push_back(t);
            }
        }
        None
    }
}

fn path_to(s: usize, parent: &HashMap<usize, Option<usize>>) -> Vec<usize> {
    let mut path = vec![s];
    let mut cur = s;
    while let Some(&Some(p)) = parent.get(&cur) {
        path.push(p);
        cur = p;
    }
    path.reverse();
    path
}

impl Tableau {
    fn new(formula: &Formula, finite: bool) -> Self {
        let order = formula.postorder();
        let pos: HashMap<Formula, usize> = order
            .iter()
            .enumerate()
            .map(|(i, f)| (f.clone(), i))
            .collect();

        // atoms take the lowest variables, so a state's atom valuation is its
        // low bits
        let mut atoms: HashMap<Identifier, usize> = HashMap::default();
        for id in order.iter().filter_map(Formula::as_proposition) {
            let n = atoms.len();
            atoms.entry(id.clone()).or_insert(n);
        }

        let mut vars = atoms.len();
        let mut next = Obligations::default();
        let mut prev = Obligations::default();
        let mut eventualities = vec![];
        // without a last position, weak and strong next coincide
        let weak_next = !finite;

        let mut rules = Vec::with_capacity(order.len());
        for (i, f) in order.iter().enumerate() {
            let rule = match f.kind() {
                FormulaKind::Boolean(b) => Rule::Const(*b),
                FormulaKind::Proposition(id) => Rule::Var(atoms[id]),
                FormulaKind::Unary(op, arg) => {
                    let a = pos[arg];
                    match op {
                        UnaryOp::Not => Rule::Not(a),
                        UnaryOp::Next => Rule::Var(next.var(&mut vars, a, true)),
                        UnaryOp::WeakNext => Rule::Var(next.var(&mut vars, a, weak_next)),
                        UnaryOp::Yesterday => Rule::Var(prev.var(&mut vars, a, true)),
                        UnaryOp::WeakYesterday => Rule::Var(prev.var(&mut vars, a, false)),
                        UnaryOp::Eventually => {
                            eventualities.push(Eventuality::until(i, a));
                            Rule::Until {
                                hold: None,
                                goal: a,
                                var: next.var(&mut vars, i, true),
                            }
                        }
                        UnaryOp::Always => {
                            eventualities.push(Eventuality::release(i, a));
                            Rule::Release {
                                hold: None,
                                goal: a,
                                var: next.var(&mut vars, i, weak_next),
                            }
                        }
                        UnaryOp::Once => Rule::Until {
                            hold: None,
                            goal: a,
                            var: prev.var(&mut vars, i, true),
                        },
                        UnaryOp::Historically => Rule::Release {
                            hold: None,
                            goal: a,
                            var: prev.var(&mut vars, i, false),
                        },
                    }
                }
                FormulaKind::Binary(op, l, r) => {
                    let (a, b) = (pos[l], pos[r]);
                    match op {
                        BinaryOp::And => Rule::And(a, b),
                        BinaryOp::Or => Rule::Or(a, b),
                        BinaryOp::Implies => Rule::Implies(a, b),
                        BinaryOp::Iff => Rule::Iff(a, b),
                        BinaryOp::Until => {
                            eventualities.push(Eventuality::until(i, b));
                            Rule::Until {
                                hold: Some(a),
                                goal: b,
                                var: next.var(&mut vars, i, true),
                            }
                        }
                        BinaryOp::Release => {
                            eventualities.push(Eventuality::release(i, b));
                            Rule::Release {
                                hold: Some(a),
                                goal: b,
                                var: next.var(&mut vars, i, weak_next),
                            }
                        }
                        BinaryOp::Since => Rule::Until {
                            hold: Some(a),
                            goal: b,
                            var: prev.var(&mut vars, i, true),
                        },
                        BinaryOp::Triggered => Rule::Release {
                            hold: Some(a),
                            goal: b,
                            var: prev.var(&mut vars, i, false),
                        },
                    }
                }
            };
            rules.push(rule);
        }

        Tableau {
            rules,
            root: order.len() - 1,
            atoms: atoms.into_keys().collect(),
            next: next.list,
            prev: prev.list,
            eventualities,
            vars,
        }
    }

    fn eval(&self, state: usize, v: &mut Vec<bool>) {
        v.clear();
        for rule in &self.rules {
            let x = match *rule {
                Rule::Const(b) => b,
                Rule::Var(x) => bit(state, x),
                Rule::Not(a) => !v[a],
                Rule::And(a, b) => v[a] && v[b],
                Rule::Or(a, b) => v[a] || v[b],
                Rule::Implies(a, b) => !v[a] || v[b],
                Rule::Iff(a, b) => v[a] == v[b],
                Rule::Until { hold, goal, var } => {
                    v[goal] || (hold.map_or(true, |h| v[h]) && bit(state, var))
                }
                Rule::Release { hold, goal, var } => {
                    v[goal] && (hold.map_or(false, |h| v[h]) || bit(state, var))
                }
            };
            v.push(x);
        }
    }

    /// Materialize every state and index them by arrival key.
    fn explore(&self) -> Explored {
        let offset = self.next.len();
        let mut states = Vec::with_capacity(1 << self.vars);
        let mut by_arrival: HashMap<usize, Vec<usize>> = HashMap::default();
        let mut v = Vec::with_capacity(self.rules.len());
        for s in 0..(1usize << self.vars) {
            self.eval(s, &mut v);
            let mut departure = 0;
            let mut arrival = 0;
            for (k, o) in self.next.iter().enumerate() {
                departure |= (bit(s, o.var) as usize) << k;
                arrival |= (v[o.target] as usize) << k;
            }
            for (k, o) in self.prev.iter().enumerate() {
                departure |= (v[o.target] as usize) << (offset + k);
                arrival |= (bit(s, o.var) as usize) << (offset + k);
            }
            let initial = v[self.root] && self.prev.iter().all(|o| bit(s, o.var) != o.strong);
            let accepting = self.next.iter().all(|o| bit(s, o.var) != o.strong);
            let fulfils = self
                .eventualities
                .iter()
                .enumerate()
                .filter(|(_, e)| e.fulfilled(&v))
                .fold(0u64, |m, (e, _)| m | (1 << e));
            states.push(StateInfo {
                departure,
                initial,
                accepting,
                fulfils,
            });
            by_arrival.entry(arrival).or_default().push(s);
        }
        Explored { states, by_arrival }
    }

    /// The shortest path from an initial state to a final one.
    fn finite_model(&self, ex: &Explored) -> Option<Trace> {
        let parent = ex.reachable();
        let last = parent.keys().copied().find(|&s| ex.states[s].accepting)?;
        Some(Trace {
            states: self.project(&path_to(last, &parent)),
            loop_start: None,
        })
    }

    /// A lasso through a fair strongly connected component.
    fn infinite_model(&self, ex: &Explored) -> Option<Trace> {
        let parent = ex.reachable();
        let mut graph = DiGraph::<usize, ()>::new();
        let nodes: HashMap<usize, _> = parent
            .keys()
            .map(|&s| (s, graph.add_node(s)))
            .collect();
        for (&s, &n) in &nodes {
            for t in ex.successors(s) {
                graph.add_edge(n, nodes[t], ());
            }
        }

        let all = match self.eventualities.len() {
            0 => 0,
            n => u64::MAX >> (64 - n),
        };
        for scc in tarjan_scc(&graph) {
            let nontrivial = scc.len() > 1 || graph.contains_edge(scc[0], scc[0]);
            let covered = scc
                .iter()
                .fold(0, |m, &n| m | ex.states[graph[n]].fulfils);
            if !nontrivial || covered != all {
                continue;
            }
            log::trace!("fair component of {} states", scc.len());

            let members: HashSet<usize> = scc.iter().map(|&n| graph[n]).collect();
            let entry = graph[scc[0]];
            let mut prefix = path_to(entry, &parent);
            prefix.pop();

            let mut cycle = vec![entry];
            let mut current = entry;
            let mut pending = all & !ex.states[entry].fulfils;
            while pending != 0 {
                let path = ex
                    .path_within(current, &members, |s| ex.states[s].fulfils & pending != 0)
                    .expect("eventuality fulfilled inside the component must be reachable");
                for &s in &path {
                    pending &= !ex.states[s].fulfils;
                }
                current = path[path.len() - 1];
                cycle.extend(path);
            }
            let back = ex
                .path_within(current, &members, |s| s == entry)
                .expect("a non-trivial component has a cycle through every state");
            cycle.extend(&back[..back.len() - 1]);

            let loop_start = prefix.len();
            prefix.extend(cycle);
            return Some(Trace {
                states: self.project(&prefix),
                loop_start: Some(loop_start),
            });
        }
        None
    }

    fn project(&self, path: &[usize]) -> Vec<State> {
        path.iter()
            .map(|&s| {
                self.atoms
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| bit(s, *i))
                    .map(|(_, id)| id.clone())
                    .collect()
            })
            .collect()
    }
}

/// The tableau decision procedure as an [`Oracle`].
#[derive(Debug, Clone)]
pub struct TableauOracle {
    max_elementary: usize,
}

impl TableauOracle {
    /// A tableau that answers unknown when a formula needs more than
    /// `max_elementary` elementary variables (capped at [`HARD_LIMIT`]).
    pub fn new(max_elementary: usize) -> Self {
        Self {
            max_elementary: max_elementary.min(HARD_LIMIT),
        }
    }

    fn decide(&self, formula: &Formula, finite: bool) -> SolveResult {
        let tableau = Tableau::new(formula, finite);
        if tableau.vars > self.max_elementary {
            return SolveResult::Unknown(format!(
                "{} elementary formulas exceed the limit of {}",
                tableau.vars, self.max_elementary
            ));
        }
        let explored = tableau.explore();
        let model = if finite {
            tableau.finite_model(&explored)
        } else {
            tableau.infinite_model(&explored)
        };
        match model {
            Some(trace) => {
                debug_assert!(
                    trace.satisfies(formula, finite),
                    "tableau witness does not satisfy {formula}:\n{trace}"
                );
                SolveResult::Sat(trace)
            }
            None => SolveResult::Unsat,
        }
    }
}

impl Oracle for TableauOracle {
    fn solve(
        &self,
        scope: &Scope,
        formula: &Formula,
        finite: bool,
    ) -> Result<SolveResult, SolverError> {
        check_scope(scope, formula)?;
        let start = timing::start();
        let res = self.decide(formula, finite);
        timing::elapsed(TimeType::from(&res), start);
        log::debug!(
            "            tableau({}) returned {} after {}ms",
            if finite { "finite" } else { "infinite" },
            match &res {
                SolveResult::Sat(trace) => format!("SAT({} states)", trace.len()),
                SolveResult::Unsat => "UNSAT".to_string(),
                SolveResult::Unknown(reason) => format!("unknown: {reason}"),
            },
            start.elapsed().as_millis(),
        );
        Ok(res)
    }
}
