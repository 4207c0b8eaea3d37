// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rule-driven tree traversals.
//!
//! A traversal walks a tree and asks a rules object what to do: `base_case`
//! handles one (query, reference) point pair, `score` decides whether a
//! subtree is worth visiting and in which order, and `rescore` re-checks a
//! score just before descent, since earlier visits may have tightened the
//! rules' pruning bound. Returning `None` from either prunes the subtree.
//!
//! - [`SingleTreeTraverser`]: one query point against a reference tree.
//! - [`DualTreeTraverser`]: a query tree against a reference tree.

mod dual;
mod single;

pub use dual::{DualTreeRules, DualTreeTraverser};
pub use single::{SingleTreeRules, SingleTreeTraverser};

/// Counters kept by a traverser.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TraversalStats {
    /// Subtrees skipped because a score was rejected.
    pub num_prunes: usize,
    /// Nodes (or node pairs) visited.
    pub num_visited: usize,
    /// Calls to `base_case`.
    pub num_base_cases: usize,
}
