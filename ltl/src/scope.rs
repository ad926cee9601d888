// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! The typing context under which a formula is solved.

use std::sync::Arc;

use crate::hashmap::HashSet;
use crate::syntax::{Identifier, Sigma};

/// A scope ties formulas to the universe they were built in and optionally
/// restricts which proposition names are well-typed.
///
/// A scope without declarations is open: every name is allowed. After the
/// first [`Scope::declare`], only declared names are. Placeholders are always
/// allowed, since they are minted after the scope was set up.
#[derive(Clone, Debug)]
pub struct Scope {
    sigma: Sigma,
    declared: Option<HashSet<Arc<str>>>,
}

impl Scope {
    /// An open scope over `sigma`.
    pub fn new(sigma: &Sigma) -> Self {
        Scope {
            sigma: sigma.clone(),
            declared: None,
        }
    }

    /// The formula universe of this scope.
    pub fn sigma(&self) -> &Sigma {
        &self.sigma
    }

    /// Declare a proposition name, closing the scope if it was open.
    pub fn declare(&mut self, name: &str) {
        self.declared
            .get_or_insert_with(HashSet::default)
            .insert(name.into());
    }

    /// Whether no declaration has been made.
    pub fn is_open(&self) -> bool {
        self.declared.is_none()
    }

    /// Whether a proposition with this identifier is well-typed here.
    pub fn is_declared(&self, id: &Identifier) -> bool {
        match (id, &self.declared) {
            (Identifier::Placeholder(_), _) | (_, None) => true,
            (Identifier::Name(name), Some(declared)) => declared.contains(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::Placeholder;

    #[test]
    fn test_declarations() {
        let sigma = Sigma::new();
        let mut scope = Scope::new(&sigma);
        assert!(scope.is_open());
        assert!(scope.is_declared(&"anything".into()));

        scope.declare("a");
        assert!(!scope.is_open());
        assert!(scope.is_declared(&"a".into()));
        assert!(!scope.is_declared(&"b".into()));

        let placeholder = Identifier::Placeholder(Placeholder {
            index: 0,
            original: sigma.proposition("b"),
        });
        assert!(scope.is_declared(&placeholder));
    }
}
