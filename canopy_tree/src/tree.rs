// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The dynamic rectangle tree.

use core::fmt;
use core::marker::PhantomData;

use canopy_bound::{Bound, EuclideanDistance, HRectBound, Metric};
use tracing::{debug, debug_span, trace};

use crate::descent::{DescentHeuristic, OverlapDescent, VolumeDescent};
use crate::node::{Arena, Node, NodeId, NodeKind, NodeRef};
use crate::split::{Partition, QuadraticSplit, RStarSplit, SplitStrategy};
use crate::{Dataset, EmptyStatistic, Statistic, TreeError, TreeParams};

/// A height-balanced tree of hyper-rectangles over the columns of a [`Dataset`].
///
/// Points are inserted one at a time. The descent heuristic `De` picks the
/// child that receives each point; the split strategy `Sp` divides nodes that
/// overflow their fill limits. Every node carries a statistic `S` that is
/// recomputed whenever the node changes.
///
/// After every public operation:
/// - all leaves sit at the same depth,
/// - every non-root node respects the fill limits in [`TreeParams`],
/// - a leaf's bound is exactly the bounding box of its points and an internal
///   node's bound is exactly the union of its children's bounds.
///
/// Sibling bounds may overlap.
pub struct RectangleTree<Sp = QuadraticSplit, De = VolumeDescent, S = EmptyStatistic> {
    pub(crate) arena: Arena<S>,
    pub(crate) root: NodeId,
    pub(crate) dataset: Dataset,
    pub(crate) params: TreeParams,
    /// Nodes whose statistic must be recomputed, along with their ancestors.
    pub(crate) dirty: Vec<NodeId>,
    pub(crate) _strategy: PhantomData<fn() -> (Sp, De)>,
}

/// Guttman's R-tree: quadratic split, least volume enlargement descent.
pub type RTree<S = EmptyStatistic> = RectangleTree<QuadraticSplit, VolumeDescent, S>;

/// R*-tree: topological split with forced reinsertion, overlap-aware descent.
pub type RStarTree<S = EmptyStatistic> = RectangleTree<RStarSplit, OverlapDescent, S>;

impl<Sp, De, S: Clone> Clone for RectangleTree<Sp, De, S> {
    fn clone(&self) -> Self {
        Self {
            arena: self.arena.clone(),
            root: self.root,
            dataset: self.dataset.clone(),
            params: self.params,
            dirty: self.dirty.clone(),
            _strategy: PhantomData,
        }
    }
}

impl<Sp, De, S> fmt::Debug for RectangleTree<Sp, De, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RectangleTree")
            .field("points", &self.arena[self.root].descendants)
            .field("dim", &self.dataset.dim())
            .field("nodes", &self.arena.live())
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl<Sp: SplitStrategy, De: DescentHeuristic, S: Statistic> RectangleTree<Sp, De, S> {
    /// Nodes may have overlapping children.
    pub const HAS_OVERLAPPING_CHILDREN: bool = true;
    /// A point is never stored in both a node and one of its descendants.
    pub const HAS_SELF_CHILDREN: bool = false;

    /// Build a tree holding every column of `dataset`.
    pub fn new(dataset: Dataset, params: TreeParams) -> Result<Self, TreeError> {
        Self::with_first_index(dataset, params, 0)
    }

    /// Build a tree holding the columns of `dataset` from `first_index` on.
    ///
    /// Columns before `first_index` stay in the dataset but are not indexed;
    /// they can be inserted later with [`RectangleTree::insert_point`].
    pub fn with_first_index(
        dataset: Dataset,
        params: TreeParams,
        first_index: usize,
    ) -> Result<Self, TreeError> {
        dataset.validate()?;
        params.validate()?;
        let len = dataset.len();
        if first_index > len {
            return Err(TreeError::FirstIndexOutOfRange {
                first: first_index,
                len,
            });
        }

        let mut arena = Arena::default();
        let root = arena.alloc(Node::new(dataset.dim(), None, NodeKind::Leaf(Vec::new())));
        let mut tree = Self {
            arena,
            root,
            dataset,
            params,
            dirty: vec![root],
            _strategy: PhantomData,
        };

        let _span = debug_span!("build", points = len - first_index).entered();
        for index in first_index..len {
            tree.insert_unchecked(index);
        }
        tree.refresh_statistics();
        debug!(
            depth = tree.tree_depth(),
            nodes = tree.arena.live(),
            "built rectangle tree"
        );
        Ok(tree)
    }

    /// A tree over `dataset` that indexes none of its columns yet.
    pub fn empty(dataset: Dataset, params: TreeParams) -> Result<Self, TreeError> {
        let len = dataset.len();
        Self::with_first_index(dataset, params, len)
    }

    /// The root node.
    pub fn root(&self) -> NodeRef<'_, S> {
        NodeRef::new(&self.arena, &self.dataset, self.root)
    }

    /// The node with the given id, if it is live.
    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_, S>> {
        self.arena
            .get(id)
            .map(|_| NodeRef::new(&self.arena, &self.dataset, id))
    }

    /// The dataset the tree indexes.
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Give up the tree and return its dataset.
    pub fn into_dataset(self) -> Dataset {
        self.dataset
    }

    /// Fill limits the tree was built with.
    pub fn params(&self) -> TreeParams {
        self.params
    }

    /// Number of coordinates per point.
    pub fn dim(&self) -> usize {
        self.dataset.dim()
    }

    /// Number of points stored in the tree.
    pub fn len(&self) -> usize {
        self.arena[self.root].descendants
    }

    /// Returns true if the tree stores no points.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of points stored in the tree.
    pub fn num_descendants(&self) -> usize {
        self.len()
    }

    /// Number of levels, counting the root and the leaves.
    pub fn tree_depth(&self) -> usize {
        self.root().tree_depth()
    }

    /// Bound of the whole tree.
    pub fn bound(&self) -> &HRectBound {
        &self.arena[self.root].bound
    }

    /// Returns true if dataset column `index` is stored in the tree.
    pub fn contains_point(&self, index: usize) -> bool {
        self.find_leaf(index).is_some()
    }

    /// Insert dataset column `index`.
    pub fn insert_point(&mut self, index: usize) -> Result<(), TreeError> {
        let len = self.dataset.len();
        if index >= len {
            return Err(TreeError::IndexOutOfBounds { index, len });
        }
        if self.contains_point(index) {
            return Err(TreeError::DuplicatePoint(index));
        }
        self.insert_unchecked(index);
        self.refresh_statistics();
        Ok(())
    }

    /// Append `coords` to the dataset without inserting it and return its index.
    ///
    /// This is the only way to grow a tree's dataset, which keeps every index
    /// stored in the tree valid.
    pub fn push_column(&mut self, coords: &[f64]) -> Result<usize, TreeError> {
        self.dataset.push(coords)
    }

    /// Append `coords` to the dataset, insert it, and return its index.
    pub fn push_point(&mut self, coords: &[f64]) -> Result<usize, TreeError> {
        let index = self.dataset.push(coords)?;
        self.insert_unchecked(index);
        self.refresh_statistics();
        Ok(index)
    }

    /// Remove dataset column `index` from the tree.
    ///
    /// Nodes left below their minimum fill are dissolved and their points are
    /// inserted again from the root. The dataset itself is not modified.
    pub fn delete_point(&mut self, index: usize) -> Result<(), TreeError> {
        let (leaf, pos) = self
            .find_leaf(index)
            .ok_or(TreeError::PointNotFound(index))?;
        if let NodeKind::Leaf(points) = &mut self.arena[leaf].kind {
            points.swap_remove(pos);
        }
        trace!(index, leaf = leaf.index(), "removed point");

        let orphans = self.condense(leaf);
        if !orphans.is_empty() {
            debug!(orphans = orphans.len(), "reinserting orphaned points");
        }
        for orphan in orphans {
            self.insert_unchecked(orphan);
        }
        self.refresh_statistics();
        Ok(())
    }

    /// Leaf storing `index` and its position there.
    ///
    /// Only subtrees whose bound contains the point are searched.
    fn find_leaf(&self, index: usize) -> Option<(NodeId, usize)> {
        let point = self.dataset.get(index)?;
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            match &self.arena[id].kind {
                NodeKind::Leaf(points) => {
                    if let Some(pos) = points.iter().position(|&p| p == index) {
                        return Some((id, pos));
                    }
                }
                NodeKind::Internal(children) => stack.extend(
                    children
                        .iter()
                        .rev()
                        .filter(|&&c| self.arena[c].bound.contains(point)),
                ),
            }
        }
        None
    }

    fn insert_unchecked(&mut self, index: usize) {
        let mut may_reinsert = true;
        self.insert_entry(index, &mut may_reinsert);
    }

    /// Store `index` in a leaf and resolve any overflow it causes.
    ///
    /// `may_reinsert` is shared by every insertion triggered from one
    /// top-level insertion, so forced reinsertion happens at most once.
    fn insert_entry(&mut self, index: usize, may_reinsert: &mut bool) {
        let leaf = self.descend_and_store(index);
        let mut id = leaf;
        while self.is_overfull(id) {
            let node = &self.arena[id];
            if node.is_leaf() && node.parent.is_some() && *may_reinsert {
                *may_reinsert = false;
                let count = Sp::reinsert_count(self.params.max_leaf_size);
                if count > 0 {
                    self.force_reinsert(id, count, may_reinsert);
                    continue;
                }
            }
            id = self.split(id);
        }
    }

    /// Walk from the root to a leaf, growing every bound on the path, and
    /// append `index` to that leaf.
    fn descend_and_store(&mut self, index: usize) -> NodeId {
        let point = self.dataset.col(index);
        let mut id = self.root;
        loop {
            let node = &mut self.arena[id];
            node.bound.expand(point);
            node.descendants += 1;
            if let NodeKind::Leaf(points) = &mut node.kind {
                points.push(index);
                self.dirty.push(id);
                trace!(index, leaf = id.index(), "stored point");
                return id;
            }

            let children = self.arena[id].children();
            let bounds: Vec<&HRectBound> =
                children.iter().map(|&c| &self.arena[c].bound).collect();
            let leaves = self.arena[children[0]].is_leaf();
            id = children[De::choose_descent_node(&bounds, point, leaves)];
        }
    }

    fn is_overfull(&self, id: NodeId) -> bool {
        let node = &self.arena[id];
        match &node.kind {
            NodeKind::Leaf(points) => points.len() > self.params.max_leaf_size,
            NodeKind::Internal(children) => children.len() > self.params.max_num_children,
        }
    }

    fn is_underfull(&self, id: NodeId) -> bool {
        let node = &self.arena[id];
        match &node.kind {
            NodeKind::Leaf(points) => points.len() < self.params.min_leaf_size,
            NodeKind::Internal(children) => children.len() < self.params.min_num_children,
        }
    }

    /// Evict the `count` points of leaf `id` farthest from its center and
    /// insert them again from the root, nearest first.
    fn force_reinsert(&mut self, id: NodeId, count: usize, may_reinsert: &mut bool) {
        let node = &self.arena[id];
        let center = node.bound.center();
        let metric = EuclideanDistance::default();
        let mut ranked: Vec<(f64, usize)> = node
            .points()
            .iter()
            .map(|&p| (metric.evaluate(&center, self.dataset.col(p)), p))
            .collect();
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0));
        let evicted: Vec<usize> = ranked[ranked.len() - count..]
            .iter()
            .map(|&(_, p)| p)
            .collect();

        if let NodeKind::Leaf(points) = &mut self.arena[id].kind {
            points.retain(|p| !evicted.contains(p));
        }
        self.refresh_upward(id);
        debug!(leaf = id.index(), evicted = count, "forced reinsertion");

        for p in evicted {
            self.insert_entry(p, may_reinsert);
        }
    }

    /// Split overfull node `id` in two and return the node that gained a child.
    fn split(&mut self, id: NodeId) -> NodeId {
        let dim = self.dataset.dim();
        let node = &self.arena[id];
        let is_leaf = node.is_leaf();
        let (entries, min_fill): (Vec<HRectBound>, usize) = match &node.kind {
            NodeKind::Leaf(points) => (
                points
                    .iter()
                    .map(|&p| HRectBound::from_point(self.dataset.col(p)))
                    .collect(),
                self.params.min_leaf_size,
            ),
            NodeKind::Internal(children) => (
                children
                    .iter()
                    .map(|&c| self.arena[c].bound.clone())
                    .collect(),
                self.params.min_num_children,
            ),
        };

        let Partition { first, second } = Sp::partition(&entries, min_fill);
        debug_assert!(
            first.len() >= min_fill
                && second.len() >= min_fill
                && first.len() + second.len() == entries.len(),
            "split produced an invalid partition"
        );

        let kind = core::mem::replace(&mut self.arena[id].kind, NodeKind::Leaf(Vec::new()));
        let (kept, moved) = match kind {
            NodeKind::Leaf(points) => (
                NodeKind::Leaf(select(&points, &first)),
                NodeKind::Leaf(select(&points, &second)),
            ),
            NodeKind::Internal(children) => (
                NodeKind::Internal(select(&children, &first)),
                NodeKind::Internal(select(&children, &second)),
            ),
        };
        let parent = self.arena[id].parent;
        self.arena[id].kind = kept;
        let sibling = self.arena.alloc(Node::new(dim, parent, moved));
        let adopted = self.arena[sibling].children().to_vec();
        for child in adopted {
            self.arena[child].parent = Some(sibling);
        }
        self.recompute(id);
        self.recompute(sibling);
        debug!(
            node = id.index(),
            sibling = sibling.index(),
            is_leaf,
            kept = first.len(),
            moved = second.len(),
            "split node"
        );

        match parent {
            Some(parent) => {
                if let NodeKind::Internal(children) = &mut self.arena[parent].kind {
                    children.push(sibling);
                }
                parent
            }
            None => {
                let root = self
                    .arena
                    .alloc(Node::new(dim, None, NodeKind::Internal(vec![id, sibling])));
                self.arena[id].parent = Some(root);
                self.arena[sibling].parent = Some(root);
                self.root = root;
                self.recompute(root);
                debug!(root = root.index(), depth = self.tree_depth(), "grew new root");
                root
            }
        }
    }

    /// Repair the path from `leaf` to the root after a removal.
    ///
    /// Under-full non-root nodes are detached and released; the points they
    /// held are returned for reinsertion. Surviving nodes get exact bounds.
    fn condense(&mut self, leaf: NodeId) -> Vec<usize> {
        let mut orphans = Vec::new();
        let mut id = leaf;
        while let Some(parent) = self.arena[id].parent {
            if self.is_underfull(id) {
                if let NodeKind::Internal(children) = &mut self.arena[parent].kind
                    && let Some(pos) = children.iter().position(|&c| c == id)
                {
                    children.swap_remove(pos);
                }
                let before = orphans.len();
                self.release_subtree(id, &mut orphans);
                debug!(
                    node = id.index(),
                    points = orphans.len() - before,
                    "dissolved under-full node"
                );
            } else {
                self.recompute(id);
            }
            id = parent;
        }
        self.recompute(id);
        self.collapse_root();
        orphans
    }

    /// Free `id` and everything below it, collecting the stored points.
    fn release_subtree(&mut self, id: NodeId, points: &mut Vec<usize>) {
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.arena.free(next) {
                match node.kind {
                    NodeKind::Leaf(stored) => points.extend(stored),
                    NodeKind::Internal(children) => stack.extend(children),
                }
            }
        }
    }

    /// Shrink the tree while the root is an internal node with a single child;
    /// an internal root with no children becomes an empty leaf.
    fn collapse_root(&mut self) {
        loop {
            let root = self.root;
            if self.arena[root].is_leaf() {
                return;
            }
            let only = match *self.arena[root].children() {
                [only] => Some(only),
                [] => None,
                _ => return,
            };
            let Some(only) = only else {
                self.arena[root].kind = NodeKind::Leaf(Vec::new());
                self.recompute(root);
                return;
            };
            let old = root;
            self.arena.free(old);
            self.arena[only].parent = None;
            self.root = only;
            debug!(root = only.index(), "collapsed single-child root");
        }
    }

    /// Recompute the bound and descendant count of `id` from its contents.
    fn recompute(&mut self, id: NodeId) {
        let mut bound = HRectBound::new(self.dataset.dim());
        let descendants = match &self.arena[id].kind {
            NodeKind::Leaf(points) => {
                bound.expand_all(points.iter().map(|&p| self.dataset.col(p)));
                points.len()
            }
            NodeKind::Internal(children) => children
                .iter()
                .map(|&c| {
                    let child = &self.arena[c];
                    bound.union_with(&child.bound);
                    child.descendants
                })
                .sum(),
        };
        let node = &mut self.arena[id];
        node.bound = bound;
        node.descendants = descendants;
        self.dirty.push(id);
    }

    /// Recompute `id` and every ancestor.
    fn refresh_upward(&mut self, id: NodeId) {
        let mut next = Some(id);
        while let Some(id) = next {
            self.recompute(id);
            next = self.arena[id].parent;
        }
    }

    /// Recompute statistics of every dirty node and its ancestors, children
    /// before parents.
    pub(crate) fn refresh_statistics(&mut self) {
        let mut dirty = core::mem::take(&mut self.dirty);
        dirty.sort_unstable();
        dirty.dedup();

        let mut affected = Vec::with_capacity(dirty.len());
        for id in dirty {
            let mut next = Some(id);
            while let Some(id) = next {
                let Some(node) = self.arena.get(id) else {
                    break;
                };
                affected.push(id);
                next = node.parent;
            }
        }
        affected.sort_unstable();
        affected.dedup();

        let mut order: Vec<(usize, NodeId)> = affected
            .into_iter()
            .map(|id| (NodeRef::new(&self.arena, &self.dataset, id).tree_depth(), id))
            .collect();
        order.sort_unstable();
        for (_, id) in order {
            let stat = S::from_node(NodeRef::new(&self.arena, &self.dataset, id));
            self.arena[id].stat = stat;
        }
    }
}

fn select<T: Copy>(items: &[T], picks: &[usize]) -> Vec<T> {
    picks.iter().map(|&i| items[i]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_dataset() -> Dataset {
        Dataset::from_points(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]]).unwrap()
    }

    #[test]
    fn empty_tree_is_a_single_leaf() {
        let tree = RTree::<EmptyStatistic>::empty(square_dataset(), TreeParams::default()).unwrap();
        assert!(tree.is_empty());
        assert_eq!(tree.tree_depth(), 1);
        assert!(tree.root().is_leaf());
        assert!(tree.bound().is_empty());
        assert_eq!(tree.dataset().len(), 4);
    }

    #[test]
    fn small_build_stays_in_root_leaf() {
        let tree: RTree = RTree::new(square_dataset(), TreeParams::default()).unwrap();
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.root().count(), 4);
        assert_eq!(tree.bound()[0].width(), 1.0);
        for i in 0..4 {
            assert!(tree.contains_point(i));
        }
        assert!(!tree.contains_point(4));
    }

    #[test]
    fn rejects_bad_inputs_without_mutation() {
        let params = TreeParams::default().with_leaf_limits(2, 5).with_child_limits(1, 2);
        let mut tree: RTree = RTree::with_first_index(square_dataset(), params, 2).unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(
            tree.insert_point(9),
            Err(TreeError::IndexOutOfBounds { index: 9, len: 4 })
        );
        assert_eq!(tree.insert_point(3), Err(TreeError::DuplicatePoint(3)));
        assert_eq!(tree.delete_point(0), Err(TreeError::PointNotFound(0)));
        assert_eq!(
            tree.push_point(&[1.0]),
            Err(TreeError::DimensionMismatch {
                expected: 2,
                found: 1
            })
        );
        assert_eq!(
            tree.push_point(&[f64::NAN, 0.5]),
            Err(TreeError::NonFiniteCoordinate { index: 4, axis: 0 })
        );
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.dataset().len(), 4);

        tree.insert_point(0).unwrap();
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn rejects_bad_configuration() {
        let bad = TreeParams::default().with_leaf_limits(5, 4);
        assert_eq!(
            RTree::<EmptyStatistic>::new(square_dataset(), bad).unwrap_err(),
            TreeError::InvalidLeafLimits { min: 5, max: 4 }
        );
        assert_eq!(
            RTree::<EmptyStatistic>::with_first_index(square_dataset(), TreeParams::default(), 5)
                .unwrap_err(),
            TreeError::FirstIndexOutOfRange { first: 5, len: 4 }
        );
    }

    #[test]
    fn push_column_grows_dataset_only() {
        let mut tree: RTree = RTree::new(square_dataset(), TreeParams::default()).unwrap();
        let index = tree.push_column(&[2.0, 2.0]).unwrap();
        assert_eq!(index, 4);
        assert!(!tree.contains_point(4));
        tree.insert_point(index).unwrap();
        assert_eq!(tree.bound()[0].hi, 2.0);
        let pushed = tree.push_point(&[-1.0, 0.5]).unwrap();
        assert_eq!(pushed, 5);
        assert_eq!(tree.len(), 6);
        assert_eq!(tree.bound()[0].lo, -1.0);
    }

    #[test]
    fn deleting_last_point_leaves_empty_root() {
        let mut tree: RTree = RTree::new(square_dataset(), TreeParams::default()).unwrap();
        for i in 0..4 {
            tree.delete_point(i).unwrap();
        }
        assert!(tree.is_empty());
        assert!(tree.root().is_leaf());
        assert!(tree.bound().is_empty());
        assert_eq!(tree.delete_point(0), Err(TreeError::PointNotFound(0)));
    }

    #[test]
    fn debug_output_is_compact() {
        let tree: RTree = RTree::new(square_dataset(), TreeParams::default()).unwrap();
        let s = format!("{tree:?}");
        assert!(s.starts_with("RectangleTree"), "{s}");
        assert!(s.contains("points: 4"), "{s}");
    }
}
