// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Holds the configuration needed to build an oracle.

use crate::tableau::TableauOracle;

/// The default bound on elementary formulas a tableau may materialize.
pub const DEFAULT_MAX_ELEMENTARY: usize = 20;

/// Wrapper around the configuration of the satisfiability oracle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleConf {
    /// Beyond this many elementary formulas the oracle answers unknown
    /// instead of exploring `2^n` states.
    pub max_elementary: usize,
}

impl Default for OracleConf {
    fn default() -> Self {
        Self {
            max_elementary: DEFAULT_MAX_ELEMENTARY,
        }
    }
}

impl OracleConf {
    /// Build an oracle with this configuration.
    pub fn oracle(&self) -> TableauOracle {
        TableauOracle::new(self.max_elementary)
    }
}
