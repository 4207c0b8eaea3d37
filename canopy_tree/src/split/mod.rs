// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Split strategies for overfull nodes.
//!
//! A split strategy is a pure function from the bounds of an overfull node's
//! entries to a two-way partition. Entries are points (as degenerate
//! rectangles) for leaves and child bounds for internal nodes, so one
//! algorithm serves both levels. The tree applies the partition: the first
//! group stays in the overfull node and the second moves into a new sibling.
//!
//! - [`QuadraticSplit`]: Guttman's quadratic-cost split.
//! - [`RStarSplit`]: the R*-tree topological split, combined with forced
//!   reinsertion of a leaf's outermost points before the first split of an
//!   insertion.

use canopy_bound::HRectBound;

mod quadratic;
mod rstar;

pub use quadratic::QuadraticSplit;
pub use rstar::RStarSplit;

/// Two groups of entry indices produced by a split.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Partition {
    /// Entries kept by the node being split.
    pub first: Vec<usize>,
    /// Entries moved into the new sibling.
    pub second: Vec<usize>,
}

/// Algorithm dividing the entries of an overfull node into two groups.
pub trait SplitStrategy {
    /// Number of points evicted from an overfull non-root leaf and inserted
    /// again from the root before the leaf is split. Zero disables forced
    /// reinsertion.
    fn reinsert_count(_max_leaf_size: usize) -> usize {
        0
    }

    /// Partition `entries` into two groups of at least `min_fill` entries.
    ///
    /// Callers guarantee `entries.len() >= 2 * min_fill` and `min_fill >= 1`.
    /// Every entry index appears in exactly one group. The result depends only
    /// on the entries and their order.
    fn partition(entries: &[HRectBound], min_fill: usize) -> Partition;
}
