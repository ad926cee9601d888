// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! The greedy search for an unsatisfiable core.
//!
//! Starting from a formula the oracle found unsatisfiable, repeatedly abstract
//! away the heaviest set of subformulas whose replacement by placeholders
//! keeps the formula unsatisfiable, until no candidate survives.

use itertools::Itertools;
use serde::Serialize;

use ltl::{scope::Scope, syntax::Formula};
use solver::{Oracle, SolveResult, SolverError};

use crate::{
    candidates::{subset, Candidates, MAX_GROUP},
    replace::{check_replacements, substitute},
    weight::WeightMap,
};

/// Tuning of the core search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CoreConf {
    /// Split weight groups into consecutive chunks of at most this many
    /// members before enumerating subsets. Without a bound, a group of `m`
    /// members costs up to `2^m - 1` oracle calls. Chunks never exceed
    /// [`MAX_GROUP`] members, whatever the bound.
    pub max_group_size: Option<usize>,
}

/// What a search did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CoreStats {
    /// Number of accepted reductions
    pub levels: usize,
    /// Number of candidates submitted to the oracle
    pub oracle_calls: usize,
    /// Candidates rejected because the oracle found them satisfiable
    pub rejected_sat: usize,
    /// Candidates rejected because the oracle could not decide
    pub rejected_unknown: usize,
}

/// The outcome of a search.
#[derive(Debug, Clone)]
pub struct CoreResult {
    /// The reduced formula
    pub core: Formula,
    /// How the core was found
    pub stats: CoreStats,
}

/// A configured core search over one oracle and scope.
pub struct CoreSearch<'a, O> {
    oracle: O,
    scope: &'a Scope,
    finite: bool,
    conf: CoreConf,
}

impl<'a, O: Oracle> CoreSearch<'a, O> {
    /// A search asking `oracle` under `scope` with the given semantics.
    pub fn new(oracle: O, scope: &'a Scope, finite: bool) -> Self {
        CoreSearch {
            oracle,
            scope,
            finite,
            conf: CoreConf::default(),
        }
    }

    /// Replace the default configuration.
    pub fn with_conf(self, conf: CoreConf) -> Self {
        CoreSearch { conf, ..self }
    }

    /// Reduce `f` until no candidate is accepted. Oracle errors abort the
    /// search and are returned as is.
    pub fn run(&self, f: &Formula) -> Result<CoreResult, SolverError> {
        if !self.scope.sigma().owns(f) {
            return Err(SolverError::ForeignFormula(f.to_string()));
        }
        let mut stats = CoreStats::default();
        let mut core = f.clone();
        while let Some(reduced) = self.reduce(&core, &mut stats)? {
            stats.levels += 1;
            log::info!("level {}: reduced to {reduced}", stats.levels);
            core = reduced;
        }
        debug_assert!(
            check_replacements(&core),
            "placeholder reused for different subformulas in {core}"
        );
        log::info!(
            "core found after {} levels and {} oracle calls",
            stats.levels,
            stats.oracle_calls
        );
        Ok(CoreResult { core, stats })
    }

    /// One level of the search: the first candidate in priority order that
    /// the oracle confirms unsatisfiable, if any.
    fn reduce(
        &self,
        f: &Formula,
        stats: &mut CoreStats,
    ) -> Result<Option<Formula>, SolverError> {
        let weights = WeightMap::analyze(f);
        let next_index = weights.next_index();
        for group in weights.groups() {
            log::trace!(
                "weight {}: {}",
                group.weight,
                group.members.iter().map(|g| format!("[{g}]")).join(" ")
            );
            let chunk_size = self
                .conf
                .max_group_size
                .unwrap_or(group.members.len())
                .clamp(1, MAX_GROUP);
            for chunk in group.members.chunks(chunk_size) {
                for selection in Candidates::new(chunk.len()) {
                    let dontcares = subset(chunk, &selection);
                    let candidate = substitute(self.scope.sigma(), f, &dontcares, next_index);
                    stats.oracle_calls += 1;
                    match self.oracle.solve(self.scope, &candidate, self.finite)? {
                        SolveResult::Unsat => {
                            log::debug!("    accepted {candidate}");
                            return Ok(Some(candidate));
                        }
                        SolveResult::Sat(_) => {
                            stats.rejected_sat += 1;
                            log::debug!("    rejected {candidate} (sat)");
                        }
                        SolveResult::Unknown(reason) => {
                            stats.rejected_unknown += 1;
                            log::debug!("    rejected {candidate} (unknown: {reason})");
                        }
                    }
                }
            }
        }
        Ok(None)
    }
}

/// Find an unsatisfiable core of `f`, which the caller knows to be
/// unsatisfiable under `scope`, with the default configuration.
///
/// For a satisfiable `f` the result is `f` itself.
pub fn unsat_core<O: Oracle>(
    oracle: O,
    scope: &Scope,
    f: &Formula,
    finite: bool,
) -> Result<Formula, SolverError> {
    Ok(CoreSearch::new(oracle, scope, finite).run(f)?.core)
}
