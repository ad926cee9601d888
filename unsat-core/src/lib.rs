// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Unsatisfiable cores of temporal formulas
//!
//! Given a formula an [`Oracle`](solver::Oracle) reports unsatisfiable, the
//! search in [`search`] abstracts subformulas away behind placeholder
//! propositions for as long as the oracle keeps confirming
//! unsatisfiability. The result is a (not necessarily minimal) core.

// configure clippy
#![allow(clippy::needless_return)]
#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::type_complexity)]
#![deny(clippy::uninlined_format_args)]
// documentation-related lints (only checked when running rustdoc)
#![warn(missing_docs)]
#![allow(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod candidates;
pub mod replace;
pub mod search;
pub mod weight;

pub use search::{unsat_core, CoreConf, CoreResult, CoreSearch, CoreStats};
