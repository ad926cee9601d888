// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! What the binary prints, as text or JSON.

use std::fmt;

use itertools::Itertools;
use serde::Serialize;

use ltl::{semantics::Trace, syntax::Identifier};
use solver::SolveResult;
use unsat_core::{replace::placeholders, CoreResult, CoreStats};

/// A placeholder of a core and the subformula it abstracts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Abstracted {
    /// Index of the placeholder
    pub index: usize,
    /// The abstracted subformula, printed
    pub original: String,
}

/// The answer for one input formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum Report {
    /// The formula is satisfiable
    Sat {
        /// The propositions true at each position of the witness
        states: Vec<Vec<String>>,
        /// Where the witness loops back to, under infinite semantics
        loop_start: Option<usize>,
    },
    /// The oracle could not decide
    Unknown {
        /// Why the oracle gave up
        reason: String,
    },
    /// The formula is unsatisfiable, with a core
    Unsat {
        /// The core, printed
        core: String,
        /// Every placeholder reachable from the core, by index
        placeholders: Vec<Abstracted>,
        /// How the core was found
        stats: CoreStats,
    },
}

impl Report {
    /// Report a witness.
    pub fn sat(trace: &Trace) -> Self {
        Report::Sat {
            states: trace
                .states
                .iter()
                .map(|s| s.iter().map(|id| id.to_string()).sorted().collect())
                .collect(),
            loop_start: trace.loop_start,
        }
    }

    /// Report a core.
    pub fn unsat(res: &CoreResult) -> Self {
        let legend = match placeholders(&res.core) {
            Ok(legend) => legend,
            Err(index) => panic!("placeholder {index} stands for two subformulas"),
        };
        Report::Unsat {
            core: res.core.to_string(),
            placeholders: legend
                .into_iter()
                .map(|(index, original)| Abstracted {
                    index,
                    original: original.to_string(),
                })
                .collect(),
            stats: res.stats.clone(),
        }
    }

    /// Report an oracle answer that needs no core.
    pub fn answer(res: &SolveResult) -> Option<Self> {
        match res {
            SolveResult::Sat(trace) => Some(Report::sat(trace)),
            SolveResult::Unknown(reason) => Some(Report::Unknown {
                reason: reason.clone(),
            }),
            SolveResult::Unsat => None,
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Report::Sat { states, loop_start } => {
                let witness = Trace {
                    states: states
                        .iter()
                        .map(|s| s.iter().map(|name| Identifier::from(name.as_str())).collect())
                        .collect(),
                    loop_start: *loop_start,
                };
                write!(f, "SAT\n{witness}")
            }
            Report::Unknown { reason } => writeln!(f, "UNKNOWN: {reason}"),
            Report::Unsat {
                core,
                placeholders,
                stats,
            } => {
                writeln!(f, "UNSAT")?;
                writeln!(f, "core: {core}")?;
                for p in placeholders {
                    writeln!(f, "  {{{}}} := {}", p.index, p.original)?;
                }
                writeln!(
                    f,
                    "{} reductions, {} oracle calls ({} sat, {} unknown)",
                    stats.levels, stats.oracle_calls, stats.rejected_sat, stats.rejected_unknown
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ltl::{parser::formula, scope::Scope, syntax::Sigma};
    use solver::{tableau::TableauOracle, Oracle};
    use unsat_core::CoreSearch;

    #[test]
    fn test_unsat_report() {
        let sigma = Sigma::new();
        let scope = Scope::new(&sigma);
        let f = formula(&sigma, "(a & !a) & (b | !c)");
        let res = CoreSearch::new(TableauOracle::new(16), &scope, true)
            .run(&f)
            .unwrap();
        let report = Report::unsat(&res);
        assert_eq!(
            report.to_string(),
            "UNSAT\n\
             core: a & !a & {0}\n  \
             {0} := b | !c\n\
             1 reductions, 7 oracle calls (6 sat, 0 unknown)\n"
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["result"], "unsat");
        assert_eq!(json["placeholders"][0]["original"], "b | !c");
        assert_eq!(json["stats"]["oracle_calls"], 7);
    }

    #[test]
    fn test_sat_report() {
        let sigma = Sigma::new();
        let scope = Scope::new(&sigma);
        let f = formula(&sigma, "a & X !a");
        let res = TableauOracle::new(16).solve(&scope, &f, true).unwrap();
        let report = Report::answer(&res).unwrap();
        assert_eq!(
            report,
            Report::Sat {
                states: vec![vec!["a".to_string()], vec![]],
                loop_start: None,
            }
        );
        assert_eq!(report.to_string(), "SAT\n   state 0: {a}\n   state 1: {}\n");
    }

    #[test]
    fn test_lasso_report_matches_trace() {
        let report = Report::Sat {
            states: vec![vec!["a".to_string(), "b".to_string()], vec![]],
            loop_start: Some(1),
        };
        let trace = Trace {
            states: vec![
                ["a", "b"].into_iter().map(Identifier::from).collect(),
                Default::default(),
            ],
            loop_start: Some(1),
        };
        assert_eq!(report.to_string(), format!("SAT\n{trace}"));
        assert_eq!(
            report.to_string(),
            "SAT\n   state 0: {a, b}\n-> state 1: {}\n   loop back to state 1\n"
        );
    }

    #[test]
    fn test_unknown_report() {
        let report = Report::answer(&SolveResult::Unknown("too big".to_string())).unwrap();
        assert_eq!(report.to_string(), "UNKNOWN: too big\n");
        assert_eq!(
            serde_json::to_string(&report).unwrap(),
            r#"{"result":"unknown","reason":"too big"}"#
        );
    }
}
