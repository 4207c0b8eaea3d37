// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree nodes: arena storage and the borrowed [`NodeRef`] view.

use core::fmt;
use core::ops::{Index, IndexMut};

use canopy_bound::{Bound, HRectBound};

use crate::Dataset;

/// Identifier of a node inside one tree.
///
/// Ids are only meaningful for the tree that produced them and may be reused
/// after that tree is mutated.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) const fn new(i: usize) -> Self {
        Self(i)
    }

    /// Slot index of the node in its tree's arena.
    pub const fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Debug)]
pub(crate) enum NodeKind {
    Leaf(Vec<usize>),
    Internal(Vec<NodeId>),
}

#[derive(Clone, Debug)]
pub(crate) struct Node<S> {
    pub(crate) bound: HRectBound,
    pub(crate) parent: Option<NodeId>,
    pub(crate) kind: NodeKind,
    pub(crate) descendants: usize,
    pub(crate) stat: S,
}

impl<S: Default> Node<S> {
    pub(crate) fn new(dim: usize, parent: Option<NodeId>, kind: NodeKind) -> Self {
        Self {
            bound: HRectBound::new(dim),
            parent,
            kind,
            descendants: 0,
            stat: S::default(),
        }
    }
}

impl<S> Node<S> {
    pub(crate) fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }

    pub(crate) fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Internal(children) => children,
            NodeKind::Leaf(_) => &[],
        }
    }

    pub(crate) fn points(&self) -> &[usize] {
        match &self.kind {
            NodeKind::Leaf(points) => points,
            NodeKind::Internal(_) => &[],
        }
    }
}

/// Slot storage for nodes with a free list.
#[derive(Clone, Debug)]
pub(crate) struct Arena<S> {
    slots: Vec<Option<Node<S>>>,
    free_list: Vec<usize>,
}

impl<S> Default for Arena<S> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
        }
    }
}

impl<S> Arena<S> {
    pub(crate) fn alloc(&mut self, node: Node<S>) -> NodeId {
        if let Some(idx) = self.free_list.pop() {
            self.slots[idx] = Some(node);
            NodeId::new(idx)
        } else {
            self.slots.push(Some(node));
            NodeId::new(self.slots.len() - 1)
        }
    }

    pub(crate) fn free(&mut self, id: NodeId) -> Option<Node<S>> {
        let node = self.slots.get_mut(id.0)?.take();
        if node.is_some() {
            self.free_list.push(id.0);
        }
        node
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&Node<S>> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn live(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }
}

impl<S> Index<NodeId> for Arena<S> {
    type Output = Node<S>;

    fn index(&self, id: NodeId) -> &Node<S> {
        match self.slots.get(id.0) {
            Some(Some(node)) => node,
            _ => panic!("node {} is not live", id.0),
        }
    }
}

impl<S> IndexMut<NodeId> for Arena<S> {
    fn index_mut(&mut self, id: NodeId) -> &mut Node<S> {
        match self.slots.get_mut(id.0) {
            Some(Some(node)) => node,
            _ => panic!("node {} is not live", id.0),
        }
    }
}

/// A borrowed, read-only view of one tree node.
///
/// This is what traversal rules and statistics see. A leaf stores point
/// indices into the tree's [`Dataset`]; an internal node stores children.
pub struct NodeRef<'a, S> {
    arena: &'a Arena<S>,
    dataset: &'a Dataset,
    id: NodeId,
}

impl<S> Clone for NodeRef<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for NodeRef<'_, S> {}

impl<S> PartialEq for NodeRef<'_, S> {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self.arena, other.arena) && self.id == other.id
    }
}

impl<S> fmt::Debug for NodeRef<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("is_leaf", &self.is_leaf())
            .field("count", &self.count())
            .field("num_children", &self.num_children())
            .finish_non_exhaustive()
    }
}

impl<'a, S> NodeRef<'a, S> {
    pub(crate) fn new(arena: &'a Arena<S>, dataset: &'a Dataset, id: NodeId) -> Self {
        Self { arena, dataset, id }
    }

    fn node(&self) -> &'a Node<S> {
        &self.arena[self.id]
    }

    fn with_id(self, id: NodeId) -> Self {
        Self { id, ..self }
    }

    /// Id of this node.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Bounding rectangle of every point below this node.
    pub fn bound(&self) -> &'a HRectBound {
        &self.node().bound
    }

    /// Statistic computed for this node.
    pub fn stat(&self) -> &'a S {
        &self.node().stat
    }

    /// Returns true if the node stores points rather than children.
    pub fn is_leaf(&self) -> bool {
        self.node().is_leaf()
    }

    /// Returns true if the node has no parent.
    pub fn is_root(&self) -> bool {
        self.node().parent.is_none()
    }

    /// The parent node, if any.
    pub fn parent(&self) -> Option<Self> {
        self.node().parent.map(|p| self.with_id(p))
    }

    /// Number of children; zero for a leaf.
    pub fn num_children(&self) -> usize {
        self.node().children().len()
    }

    /// Child `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.num_children()`.
    pub fn child(&self, i: usize) -> Self {
        self.with_id(self.node().children()[i])
    }

    /// Iterate over the children in order.
    pub fn children(self) -> impl ExactSizeIterator<Item = NodeRef<'a, S>> + 'a {
        self.node().children().iter().map(move |&c| self.with_id(c))
    }

    /// Number of points stored directly in this node; zero for internal nodes.
    pub fn count(&self) -> usize {
        self.node().points().len()
    }

    /// Point indices stored directly in this node.
    pub fn points(&self) -> &'a [usize] {
        self.node().points()
    }

    /// The `i`-th point index stored in this leaf.
    pub fn point(&self, i: usize) -> usize {
        self.points()[i]
    }

    /// Coordinates of the `i`-th point stored in this leaf.
    pub fn local_point(&self, i: usize) -> &'a [f64] {
        self.dataset.col(self.point(i))
    }

    /// Coordinates of every point stored in this leaf, in storage order.
    pub fn local_dataset(self) -> impl ExactSizeIterator<Item = &'a [f64]> + 'a {
        let dataset = self.dataset;
        self.points().iter().map(move |&p| dataset.col(p))
    }

    /// The dataset shared by the whole tree.
    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    /// Number of points stored anywhere below this node.
    pub fn num_descendants(&self) -> usize {
        self.node().descendants
    }

    /// Iterate over every point index below this node, depth first.
    pub fn descendants(self) -> DescendantPoints<'a, S> {
        DescendantPoints {
            arena: self.arena,
            stack: vec![self.id],
            current: [].iter(),
        }
    }

    /// Number of levels from this node down to its leaves, counting both.
    pub fn tree_depth(&self) -> usize {
        let mut depth = 1;
        let mut node = self.node();
        while let Some(&first) = node.children().first() {
            node = &self.arena[first];
            depth += 1;
        }
        depth
    }

    /// Upper bound on the distance from the bound center to any descendant.
    pub fn furthest_descendant_distance(&self) -> f64 {
        0.5 * self.bound().diameter()
    }
}

/// Depth-first iterator over the point indices below a node.
pub struct DescendantPoints<'a, S> {
    arena: &'a Arena<S>,
    stack: Vec<NodeId>,
    current: core::slice::Iter<'a, usize>,
}

impl<S> fmt::Debug for DescendantPoints<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescendantPoints")
            .field("pending_nodes", &self.stack.len())
            .field("pending_points", &self.current.len())
            .finish()
    }
}

impl<'a, S> Iterator for DescendantPoints<'a, S> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        loop {
            if let Some(&p) = self.current.next() {
                return Some(p);
            }
            let arena: &'a Arena<S> = self.arena;
            match &arena[self.stack.pop()?].kind {
                NodeKind::Leaf(points) => self.current = points.iter(),
                NodeKind::Internal(children) => self.stack.extend(children.iter().rev()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EmptyStatistic, RTree, TreeParams};

    #[test]
    fn freed_slots_are_reused() {
        let mut arena: Arena<EmptyStatistic> = Arena::default();
        let a = arena.alloc(Node::new(2, None, NodeKind::Leaf(vec![0])));
        let b = arena.alloc(Node::new(2, Some(a), NodeKind::Leaf(vec![1])));
        assert_eq!(arena.live(), 2);
        assert!(arena.free(a).is_some());
        assert!(arena.free(a).is_none());
        assert!(arena.get(a).is_none());
        let c = arena.alloc(Node::new(2, None, NodeKind::Internal(vec![b])));
        assert_eq!(c, a);
        assert_eq!(arena.capacity(), 2);
        assert_eq!(arena[c].children(), &[b]);
    }

    #[test]
    fn node_views_describe_the_tree() {
        let points: Vec<[f64; 2]> = (0..12_u32).map(|i| [f64::from(i), 0.0]).collect();
        let params = TreeParams::default()
            .with_leaf_limits(2, 4)
            .with_child_limits(2, 3);
        let tree: RTree = RTree::new(Dataset::from_points(&points).unwrap(), params).unwrap();

        let root = tree.root();
        assert!(root.is_root());
        assert!(!root.is_leaf());
        assert_eq!(root.count(), 0);
        assert_eq!(root.num_descendants(), 12);
        assert_eq!(root.descendants().count(), 12);
        assert_eq!(root.furthest_descendant_distance(), 5.5);
        assert_eq!(tree.node(root.id()), Some(root));

        let leaf = {
            let mut node = root;
            while !node.is_leaf() {
                node = node.child(0);
            }
            node
        };
        assert_eq!(leaf.tree_depth(), 1);
        assert_eq!(leaf.num_children(), 0);
        assert_eq!(leaf.children().len(), 0);
        assert_eq!(leaf.local_dataset().len(), leaf.count());
        let mut descendants: Vec<usize> = leaf.descendants().collect();
        descendants.sort_unstable();
        let mut points = leaf.points().to_vec();
        points.sort_unstable();
        assert_eq!(descendants, points);
        assert!(leaf.parent().is_some());
    }
}
