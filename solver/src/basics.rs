// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! The interface between satisfiability backends and their clients.

use ltl::{scope::Scope, semantics::Trace, syntax::Formula};
use thiserror::Error;

/// The answer of a satisfiability check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveResult {
    /// The formula is satisfiable, together with a satisfying trace
    Sat(Trace),
    /// The formula is unsatisfiable
    Unsat,
    /// The backend could not decide, together with a reason
    Unknown(String),
}

impl SolveResult {
    /// Whether this is a definite unsatisfiable answer.
    pub fn is_unsat(&self) -> bool {
        matches!(self, SolveResult::Unsat)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
/// An error from trying to call the solver
pub enum SolverError {
    /// The scope is closed and does not declare a proposition of the formula
    #[error("proposition {0} is not declared in the scope")]
    Undeclared(String),
    /// The formula was built in a different universe than the scope's
    #[error("formula {0} does not belong to the universe of the scope")]
    ForeignFormula(String),
}

/// A satisfiability oracle.
///
/// Each call is an independent query: implementations must not let the
/// answer to one formula depend on earlier calls.
pub trait Oracle {
    /// Decide whether `formula` is satisfiable under `scope`, with finite-trace
    /// semantics if `finite` is set and infinite-trace semantics otherwise.
    fn solve(
        &self,
        scope: &Scope,
        formula: &Formula,
        finite: bool,
    ) -> Result<SolveResult, SolverError>;
}

impl<O: Oracle + ?Sized> Oracle for &O {
    fn solve(
        &self,
        scope: &Scope,
        formula: &Formula,
        finite: bool,
    ) -> Result<SolveResult, SolverError> {
        (**self).solve(scope, formula, finite)
    }
}

impl<O: Oracle + ?Sized> Oracle for Box<O> {
    fn solve(
        &self,
        scope: &Scope,
        formula: &Formula,
        finite: bool,
    ) -> Result<SolveResult, SolverError> {
        (**self).solve(scope, formula, finite)
    }
}

/// Check the parts of a query every backend relies on: the formula lives in
/// the scope's universe and only uses declared propositions.
pub fn check_scope(scope: &Scope, formula: &Formula) -> Result<(), SolverError> {
    if !scope.sigma().owns(formula) {
        return Err(SolverError::ForeignFormula(formula.to_string()));
    }
    match formula
        .propositions()
        .into_iter()
        .find(|id| !scope.is_declared(id))
    {
        Some(id) => Err(SolverError::Undeclared(id.to_string())),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ltl::{parser::formula, syntax::Sigma};

    #[test]
    fn test_check_scope() {
        let sigma = Sigma::new();
        let f = formula(&sigma, "a & b");
        let mut scope = Scope::new(&sigma);
        assert_eq!(check_scope(&scope, &f), Ok(()));

        scope.declare("a");
        assert_eq!(
            check_scope(&scope, &f),
            Err(SolverError::Undeclared("b".to_string()))
        );
        scope.declare("b");
        assert_eq!(check_scope(&scope, &f), Ok(()));

        let other = Sigma::new();
        let g = formula(&other, "a");
        assert!(matches!(
            check_scope(&scope, &g),
            Err(SolverError::ForeignFormula(_))
        ));
    }
}
