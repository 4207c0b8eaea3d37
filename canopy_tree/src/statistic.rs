// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::fmt::Debug;

use crate::NodeRef;

/// Per-node data computed from the node's contents.
///
/// After every mutation the tree recomputes the statistic of each touched node
/// and its ancestors, children before parents, so `from_node` may read the
/// statistics of the node's children.
pub trait Statistic: Default + Clone + Debug {
    /// Compute the statistic for `node`.
    fn from_node(node: NodeRef<'_, Self>) -> Self;
}

/// A statistic that stores nothing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EmptyStatistic;

impl Statistic for EmptyStatistic {
    fn from_node(_node: NodeRef<'_, Self>) -> Self {
        Self
    }
}
