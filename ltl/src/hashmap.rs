// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Aliases for HashMap and HashSet with deterministic iteration order.
//!
//! Iteration order is insertion order, so anything derived from walking a
//! formula (weight groups, tableau states, printed witnesses) is reproducible
//! from run to run.

use fxhash::FxBuildHasher;

/// HashMap with deterministic iteration order
pub type HashMap<K, V> = indexmap::IndexMap<K, V, FxBuildHasher>;
/// HashSet with deterministic iteration order
pub type HashSet<K> = indexmap::IndexSet<K, FxBuildHasher>;
