// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Serializable snapshots of a tree's structure.
//!
//! A [`TreeSnapshot`] records the dataset, the fill limits and every node's
//! bound and contents. Loading one checks that it describes a valid tree
//! before anything is built; statistics are recomputed rather than stored.

use core::marker::PhantomData;

use canopy_bound::{Bound, HRectBound};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use crate::descent::DescentHeuristic;
use crate::node::{Arena, Node, NodeId, NodeKind};
use crate::split::SplitStrategy;
use crate::{Dataset, RectangleTree, Statistic, TreeError, TreeParams};

/// Owned description of a whole tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TreeSnapshot {
    /// Fill limits of the tree.
    pub params: TreeParams,
    /// Every column the tree may refer to.
    pub dataset: Dataset,
    /// The root node.
    pub root: NodeSnapshot,
}

/// One node of a [`TreeSnapshot`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    /// Exact bound of the node's contents.
    pub bound: HRectBound,
    /// Stored points or child nodes.
    pub contents: NodeContents,
}

/// Contents of a [`NodeSnapshot`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeContents {
    /// Dataset column indices stored in a leaf.
    Points(Vec<usize>),
    /// Children of an internal node, in order.
    Children(Vec<NodeSnapshot>),
}

fn corrupt(reason: impl Into<String>) -> TreeError {
    TreeError::CorruptSnapshot(reason.into())
}

impl<Sp, De, S> RectangleTree<Sp, De, S> {
    /// Capture the structure of the tree.
    pub fn snapshot(&self) -> TreeSnapshot {
        TreeSnapshot {
            params: self.params,
            dataset: self.dataset.clone(),
            root: self.snapshot_node(self.root),
        }
    }

    fn snapshot_node(&self, id: NodeId) -> NodeSnapshot {
        let node = &self.arena[id];
        let contents = match &node.kind {
            NodeKind::Leaf(points) => NodeContents::Points(points.clone()),
            NodeKind::Internal(children) => NodeContents::Children(
                children.iter().map(|&c| self.snapshot_node(c)).collect(),
            ),
        };
        NodeSnapshot {
            bound: node.bound.clone(),
            contents,
        }
    }
}

impl<Sp: SplitStrategy, De: DescentHeuristic, S: Statistic> RectangleTree<Sp, De, S> {
    /// Rebuild a tree from a snapshot.
    ///
    /// The snapshot is rejected with [`TreeError::CorruptSnapshot`] unless
    /// every index names a dataset column at most once, all leaves sit at the
    /// same depth, every non-root node respects the fill limits and every
    /// bound exactly covers its contents.
    pub fn from_snapshot(snapshot: TreeSnapshot) -> Result<Self, TreeError> {
        let TreeSnapshot {
            params,
            dataset,
            root,
        } = snapshot;
        dataset.validate().map_err(|e| corrupt(e.to_string()))?;
        params.validate().map_err(|e| corrupt(e.to_string()))?;

        let mut loader = Loader {
            arena: Arena::default(),
            dataset: &dataset,
            params,
            stored: vec![false; dataset.len()],
            leaf_depth: None,
        };
        let root = loader.load(root, None, 0)?;
        let arena = loader.arena;

        let dirty = (0..arena.capacity()).map(NodeId::new).collect();
        let mut tree = Self {
            arena,
            root,
            dataset,
            params,
            dirty,
            _strategy: PhantomData,
        };
        tree.refresh_statistics();
        debug!(
            points = tree.len(),
            nodes = tree.arena.live(),
            depth = tree.tree_depth(),
            "loaded tree snapshot"
        );
        Ok(tree)
    }
}

struct Loader<'a, S> {
    arena: Arena<S>,
    dataset: &'a Dataset,
    params: TreeParams,
    stored: Vec<bool>,
    leaf_depth: Option<usize>,
}

impl<S: Default> Loader<'_, S> {
    fn load(
        &mut self,
        snapshot: NodeSnapshot,
        parent: Option<NodeId>,
        depth: usize,
    ) -> Result<NodeId, TreeError> {
        let dim = self.dataset.dim();
        if snapshot.bound.dim() != dim {
            return Err(corrupt(format!(
                "bound has {} dimensions, dataset has {dim}",
                snapshot.bound.dim()
            )));
        }
        let is_root = parent.is_none();

        match snapshot.contents {
            NodeContents::Points(points) => {
                let (min, max) = (self.params.min_leaf_size, self.params.max_leaf_size);
                if points.len() > max || (!is_root && points.len() < min) {
                    return Err(corrupt(format!(
                        "leaf holds {} points, limits are {min}..={max}",
                        points.len()
                    )));
                }
                match self.leaf_depth {
                    Some(expected) if expected != depth => {
                        return Err(corrupt(format!(
                            "leaf at depth {depth}, expected {expected}"
                        )));
                    }
                    _ => self.leaf_depth = Some(depth),
                }
                let mut exact = HRectBound::new(dim);
                for &p in &points {
                    let Some(seen) = self.stored.get_mut(p) else {
                        return Err(corrupt(format!(
                            "point {p} is out of bounds for a dataset of {} points",
                            self.dataset.len()
                        )));
                    };
                    if *seen {
                        return Err(corrupt(format!("point {p} is stored twice")));
                    }
                    *seen = true;
                    exact.expand(self.dataset.col(p));
                }
                if exact != snapshot.bound {
                    return Err(corrupt("leaf bound does not match its points"));
                }
                let mut node = Node::new(dim, parent, NodeKind::Leaf(Vec::new()));
                node.descendants = points.len();
                node.bound = snapshot.bound;
                node.kind = NodeKind::Leaf(points);
                Ok(self.arena.alloc(node))
            }
            NodeContents::Children(children) => {
                let (min, max) = (self.params.min_num_children, self.params.max_num_children);
                if children.is_empty()
                    || children.len() > max
                    || (!is_root && children.len() < min)
                {
                    return Err(corrupt(format!(
                        "internal node has {} children, limits are {min}..={max}",
                        children.len()
                    )));
                }
                let id = self
                    .arena
                    .alloc(Node::new(dim, parent, NodeKind::Internal(Vec::new())));
                let mut ids = Vec::with_capacity(children.len());
                let mut exact = HRectBound::new(dim);
                let mut descendants = 0;
                for child in children {
                    let child = self.load(child, Some(id), depth + 1)?;
                    exact.union_with(&self.arena[child].bound);
                    descendants += self.arena[child].descendants;
                    ids.push(child);
                }
                if exact != snapshot.bound {
                    return Err(corrupt("internal bound is not the union of its children"));
                }
                let node = &mut self.arena[id];
                node.bound = snapshot.bound;
                node.descendants = descendants;
                node.kind = NodeKind::Internal(ids);
                Ok(id)
            }
        }
    }
}

impl<Sp, De, S> Serialize for RectangleTree<Sp, De, S> {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        self.snapshot().serialize(serializer)
    }
}

impl<'de, Sp, De, S> Deserialize<'de> for RectangleTree<Sp, De, S>
where
    Sp: SplitStrategy,
    De: DescentHeuristic,
    S: Statistic,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let snapshot = TreeSnapshot::deserialize(deserializer)?;
        Self::from_snapshot(snapshot).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RStarTree, RTree};

    fn tree() -> RTree {
        let points: Vec<[f64; 2]> = (0..30_u32)
            .map(|i| [f64::from(i % 6), f64::from(i / 6) * 0.5])
            .collect();
        let params = TreeParams::default()
            .with_leaf_limits(2, 4)
            .with_child_limits(2, 3);
        RTree::new(Dataset::from_points(&points).unwrap(), params).unwrap()
    }

    #[test]
    fn json_round_trip_preserves_structure() {
        let tree = tree();
        let json = serde_json::to_string(&tree).unwrap();
        let loaded: RTree = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.snapshot(), tree.snapshot());
        assert_eq!(loaded.len(), 30);
        assert_eq!(loaded.tree_depth(), tree.tree_depth());
    }

    #[test]
    fn snapshot_loads_into_another_variant() {
        let snapshot = tree().snapshot();
        let mut loaded = RStarTree::<crate::EmptyStatistic>::from_snapshot(snapshot).unwrap();
        loaded.delete_point(7).unwrap();
        assert_eq!(loaded.len(), 29);
    }

    #[test]
    fn rejects_out_of_range_and_duplicate_points() {
        let mut snapshot = tree().snapshot();
        snapshot.dataset = Dataset::from_points(&[[0.0, 0.0]]).unwrap();
        assert!(matches!(
            RTree::<crate::EmptyStatistic>::from_snapshot(snapshot),
            Err(TreeError::CorruptSnapshot(_))
        ));

        let dataset = Dataset::from_points(&[[0.0, 0.0], [1.0, 1.0]]).unwrap();
        let root = NodeSnapshot {
            bound: HRectBound::from_point(&[0.0, 0.0]),
            contents: NodeContents::Points(vec![0, 0]),
        };
        let snapshot = TreeSnapshot {
            params: TreeParams::default(),
            dataset,
            root,
        };
        let err = RTree::<crate::EmptyStatistic>::from_snapshot(snapshot).unwrap_err();
        assert_eq!(err, TreeError::CorruptSnapshot("point 0 is stored twice".into()));
    }

    #[test]
    fn rejects_loose_bounds() {
        let mut snapshot = tree().snapshot();
        snapshot.root.bound.expand(&[100.0, 100.0]);
        let err = RTree::<crate::EmptyStatistic>::from_snapshot(snapshot).unwrap_err();
        assert!(matches!(err, TreeError::CorruptSnapshot(_)), "{err}");
    }

    #[test]
    fn rejects_unbalanced_trees() {
        let dataset = Dataset::from_points(&[[0.0], [1.0], [2.0], [3.0], [4.0], [5.0]]).unwrap();
        let col = |i: usize| dataset.col(i).to_vec();
        let leaf = |points: Vec<usize>| {
            let mut bound = HRectBound::new(1);
            for &p in &points {
                bound.expand(&col(p));
            }
            NodeSnapshot {
                bound,
                contents: NodeContents::Points(points),
            }
        };
        let deep = NodeSnapshot {
            bound: leaf(vec![2, 3]).bound.union(&leaf(vec![4, 5]).bound),
            contents: NodeContents::Children(vec![leaf(vec![2, 3]), leaf(vec![4, 5])]),
        };
        let shallow = leaf(vec![0, 1]);
        let root = NodeSnapshot {
            bound: shallow.bound.union(&deep.bound),
            contents: NodeContents::Children(vec![shallow, deep]),
        };
        let params = TreeParams::default()
            .with_leaf_limits(2, 4)
            .with_child_limits(2, 3);
        let snapshot = TreeSnapshot {
            params,
            dataset: dataset.clone(),
            root,
        };
        let err = RTree::<crate::EmptyStatistic>::from_snapshot(snapshot).unwrap_err();
        assert_eq!(
            err,
            TreeError::CorruptSnapshot("leaf at depth 2, expected 1".into())
        );
    }
}
