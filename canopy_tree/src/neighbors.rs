// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Exact k-nearest-neighbor search under the Euclidean metric.
//!
//! [`naive_knn`] scans every pair and serves as the reference answer; the
//! tree-based searches must return identical results. Neighbor lists are
//! ordered by distance, then by reference index.

use canopy_bound::{Bound, EuclideanDistance, Metric};

use crate::descent::DescentHeuristic;
use crate::split::SplitStrategy;
use crate::traverse::{DualTreeRules, DualTreeTraverser, SingleTreeRules, SingleTreeTraverser};
use crate::{Dataset, NodeRef, RectangleTree, Statistic, TreeError};

/// One search result.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    /// Column index of the neighbor in the reference dataset.
    pub index: usize,
    /// Distance from the query point.
    pub distance: f64,
}

/// The `k` best candidates seen so far, sorted by `(distance, index)`.
#[derive(Clone, Debug)]
struct Candidates {
    k: usize,
    best: Vec<Neighbor>,
}

impl Candidates {
    fn new(k: usize) -> Self {
        Self {
            k,
            best: Vec::with_capacity(k),
        }
    }

    /// Distance a new candidate must not exceed to be kept.
    fn bound(&self) -> f64 {
        if self.best.len() < self.k {
            f64::INFINITY
        } else {
            self.best.last().map_or(f64::INFINITY, |n| n.distance)
        }
    }

    fn offer(&mut self, index: usize, distance: f64) {
        if self.k == 0 || self.best.iter().any(|n| n.index == index) {
            return;
        }
        let before = |n: &Neighbor| (n.distance, n.index) < (distance, index);
        let pos = self.best.partition_point(before);
        if pos >= self.k {
            return;
        }
        self.best.insert(pos, Neighbor { index, distance });
        self.best.truncate(self.k);
    }
}

/// Shared k-NN rules for single- and dual-tree searches.
#[derive(Debug)]
struct KnnRules<'a> {
    reference: &'a Dataset,
    query: &'a Dataset,
    exclude_self: bool,
    candidates: Vec<Candidates>,
    /// Last computed pruning bound per query node, indexed by node id.
    ///
    /// Candidate bounds only shrink, so a stale entry is still an upper bound.
    query_bounds: Vec<f64>,
    metric: EuclideanDistance,
}

impl<'a> KnnRules<'a> {
    fn new(reference: &'a Dataset, query: &'a Dataset, k: usize, exclude_self: bool) -> Self {
        Self {
            reference,
            query,
            exclude_self,
            candidates: vec![Candidates::new(k); query.len()],
            query_bounds: Vec::new(),
            metric: EuclideanDistance::default(),
        }
    }

    fn into_results(self) -> Vec<Vec<Neighbor>> {
        self.candidates.into_iter().map(|c| c.best).collect()
    }

    /// Worst pruning bound over every query point below `node`.
    ///
    /// Leaves read their points; internal nodes combine the cached bounds of
    /// their children, where a child never scored counts as unbounded.
    fn node_bound<S>(&mut self, node: NodeRef<'_, S>) -> f64 {
        let bound = if node.is_leaf() {
            node.points()
                .iter()
                .map(|&q| self.candidates[q].bound())
                .fold(f64::MIN, f64::max)
        } else {
            node.children()
                .map(|c| self.cached_bound(c.id().index()))
                .fold(f64::MIN, f64::max)
        };
        let slot = node.id().index();
        if self.query_bounds.len() <= slot {
            self.query_bounds.resize(slot + 1, f64::INFINITY);
        }
        self.query_bounds[slot] = bound;
        bound
    }

    fn cached_bound(&self, slot: usize) -> f64 {
        self.query_bounds.get(slot).copied().unwrap_or(f64::INFINITY)
    }

    fn pair(&mut self, query: usize, reference: usize) -> f64 {
        if self.exclude_self && query == reference {
            return 0.0;
        }
        let distance = self
            .metric
            .evaluate(self.query.col(query), self.reference.col(reference));
        self.candidates[query].offer(reference, distance);
        distance
    }

    fn point_score<S>(&self, query: usize, node: NodeRef<'_, S>) -> Option<f64> {
        let distance = node.bound().min_distance(self.query.col(query));
        (distance <= self.candidates[query].bound()).then_some(distance)
    }
}

impl<S> SingleTreeRules<S> for KnnRules<'_> {
    fn base_case(&mut self, query: usize, reference: usize) -> f64 {
        self.pair(query, reference)
    }

    fn score(&mut self, query: usize, node: NodeRef<'_, S>) -> Option<f64> {
        self.point_score(query, node)
    }

    fn rescore(&mut self, query: usize, _node: NodeRef<'_, S>, old_score: f64) -> Option<f64> {
        (old_score <= self.candidates[query].bound()).then_some(old_score)
    }
}

impl<S> DualTreeRules<S> for KnnRules<'_> {
    fn base_case(&mut self, query: usize, reference: usize) -> f64 {
        self.pair(query, reference)
    }

    fn score_point(&mut self, query: usize, reference: NodeRef<'_, S>) -> Option<f64> {
        self.point_score(query, reference)
    }

    fn score(&mut self, query: NodeRef<'_, S>, reference: NodeRef<'_, S>) -> Option<f64> {
        let distance = query.bound().min_distance_to(reference.bound());
        (distance <= self.node_bound(query)).then_some(distance)
    }

    fn rescore(
        &mut self,
        query: NodeRef<'_, S>,
        _reference: NodeRef<'_, S>,
        old_score: f64,
    ) -> Option<f64> {
        (old_score <= self.node_bound(query)).then_some(old_score)
    }
}

fn check_dims(reference: &Dataset, query: &Dataset) -> Result<(), TreeError> {
    if reference.dim() == query.dim() {
        Ok(())
    } else {
        Err(TreeError::DimensionMismatch {
            expected: reference.dim(),
            found: query.dim(),
        })
    }
}

/// The `k` nearest columns of `reference` for every column of `query`, by
/// exhaustive scan.
///
/// With `exclude_self`, query `i` never reports reference `i`; use it when
/// both datasets are the same.
pub fn naive_knn(
    reference: &Dataset,
    query: &Dataset,
    k: usize,
    exclude_self: bool,
) -> Result<Vec<Vec<Neighbor>>, TreeError> {
    check_dims(reference, query)?;
    let mut rules = KnnRules::new(reference, query, k, exclude_self);
    for q in 0..query.len() {
        for r in 0..reference.len() {
            rules.pair(q, r);
        }
    }
    Ok(rules.into_results())
}

/// The `k` nearest points stored in `tree` for every column of `query`,
/// one single-tree traversal per query point.
pub fn single_tree_knn<Sp, De, S>(
    tree: &RectangleTree<Sp, De, S>,
    query: &Dataset,
    k: usize,
) -> Result<Vec<Vec<Neighbor>>, TreeError>
where
    Sp: SplitStrategy,
    De: DescentHeuristic,
    S: Statistic,
{
    check_dims(tree.dataset(), query)?;
    let mut traverser = SingleTreeTraverser::new(KnnRules::new(tree.dataset(), query, k, false));
    for q in 0..query.len() {
        traverser.traverse(q, tree.root());
    }
    tracing::trace!(stats = ?traverser.stats(), "single-tree k-NN finished");
    Ok(traverser.into_rules().into_results())
}

/// The `k` nearest neighbors of every dataset column among the other points
/// stored in `tree`.
///
/// Results are indexed by dataset column; columns that are not stored in the
/// tree are searched like any other query point.
pub fn single_tree_knn_self<Sp, De, S>(
    tree: &RectangleTree<Sp, De, S>,
    k: usize,
) -> Vec<Vec<Neighbor>>
where
    Sp: SplitStrategy,
    De: DescentHeuristic,
    S: Statistic,
{
    let dataset = tree.dataset();
    let mut traverser = SingleTreeTraverser::new(KnnRules::new(dataset, dataset, k, true));
    for q in 0..dataset.len() {
        traverser.traverse(q, tree.root());
    }
    traverser.into_rules().into_results()
}

/// The `k` nearest points stored in `reference_tree` for every point stored
/// in `query_tree`, found with one dual-tree traversal.
///
/// Results are indexed by the query tree's dataset columns; columns not
/// stored in the query tree get an empty list.
pub fn dual_tree_knn<Sp, De, S, QSp, QDe>(
    reference_tree: &RectangleTree<Sp, De, S>,
    query_tree: &RectangleTree<QSp, QDe, S>,
    k: usize,
) -> Result<Vec<Vec<Neighbor>>, TreeError>
where
    Sp: SplitStrategy,
    De: DescentHeuristic,
    QSp: SplitStrategy,
    QDe: DescentHeuristic,
    S: Statistic,
{
    check_dims(reference_tree.dataset(), query_tree.dataset())?;
    let rules = KnnRules::new(reference_tree.dataset(), query_tree.dataset(), k, false);
    let mut traverser = DualTreeTraverser::new(rules);
    if !query_tree.is_empty() {
        traverser.traverse(query_tree.root(), reference_tree.root());
    }
    tracing::trace!(stats = ?traverser.stats(), "dual-tree k-NN finished");
    Ok(traverser.into_rules().into_results())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RTree, TreeParams};

    fn dataset() -> Dataset {
        Dataset::from_points(&[[0.0, 0.0], [3.0, 0.0], [1.0, 0.0], [0.0, 2.0], [1.0, 1.0]])
            .unwrap()
    }

    #[test]
    fn naive_orders_by_distance_then_index() {
        let data = dataset();
        let query = Dataset::from_points(&[[0.0, 1.0]]).unwrap();
        let result = naive_knn(&data, &query, 3, false).unwrap();
        let indices: Vec<_> = result[0].iter().map(|n| n.index).collect();
        // Points 0, 3 and 4 are all at distance 1.
        assert_eq!(indices, vec![0, 3, 4]);
        assert!(result[0].iter().all(|n| n.distance == 1.0));
    }

    #[test]
    fn naive_self_search_skips_the_query() {
        let data = dataset();
        let result = naive_knn(&data, &data, 1, true).unwrap();
        assert_eq!(result[0][0].index, 2);
        assert_eq!(result[2][0].index, 0);
        assert!(result.iter().all(|r| r.len() == 1));
    }

    #[test]
    fn k_larger_than_dataset_returns_everything() {
        let data = dataset();
        let tree: RTree = RTree::new(data.clone(), TreeParams::default()).unwrap();
        let query = Dataset::from_points(&[[5.0, 5.0]]).unwrap();
        let result = single_tree_knn(&tree, &query, 10).unwrap();
        assert_eq!(result[0].len(), 5);
        assert_eq!(result, naive_knn(&data, &query, 10, false).unwrap());
    }

    #[test]
    fn zero_k_is_empty() {
        let data = dataset();
        let tree: RTree = RTree::new(data, TreeParams::default()).unwrap();
        assert!(single_tree_knn_self(&tree, 0).iter().all(Vec::is_empty));
    }

    #[test]
    fn cached_query_bounds_only_loosen_pruning() {
        let data = dataset();
        let tree: RTree = RTree::new(data.clone(), TreeParams::default()).unwrap();
        let mut rules = KnnRules::new(&data, &data, 1, false);
        let root = tree.root();
        assert_eq!(rules.node_bound(root), f64::INFINITY);
        for q in 0..data.len() {
            rules.pair(q, q);
        }
        assert_eq!(rules.node_bound(root), 0.0);
        assert_eq!(rules.cached_bound(root.id().index()), 0.0);
        assert_eq!(rules.cached_bound(root.id().index() + 1), f64::INFINITY);
    }

    #[test]
    fn internal_bounds_combine_child_bounds() {
        let points: Vec<[f64; 1]> = (0..12_u32).map(|i| [f64::from(i)]).collect();
        let data = Dataset::from_points(&points).unwrap();
        let params = TreeParams::default()
            .with_leaf_limits(2, 4)
            .with_child_limits(2, 4);
        let tree: RTree = RTree::new(data.clone(), params).unwrap();
        let root = tree.root();
        assert!(!root.is_leaf());

        let mut rules = KnnRules::new(&data, &data, 1, false);
        assert_eq!(rules.node_bound(root), f64::INFINITY);
        for q in 0..data.len() {
            rules.pair(q, (q + 1) % data.len());
        }
        let mut leaves = vec![root];
        while leaves.iter().any(|n| !n.is_leaf()) {
            leaves = leaves.into_iter().flat_map(|n| n.children()).collect();
        }
        let worst = leaves
            .iter()
            .map(|&leaf| rules.node_bound(leaf))
            .fold(f64::MIN, f64::max);
        assert_eq!(worst, 11.0);
        if root.child(0).is_leaf() {
            assert_eq!(rules.node_bound(root), 11.0);
        } else {
            for child in root.children() {
                rules.node_bound(child);
            }
            assert_eq!(rules.node_bound(root), 11.0);
        }
    }

    #[test]
    fn mismatched_query_dimension_is_rejected() {
        let tree: RTree = RTree::new(dataset(), TreeParams::default()).unwrap();
        let query = Dataset::from_points(&[[0.0, 0.0, 0.0]]).unwrap();
        assert_eq!(
            single_tree_knn(&tree, &query, 1),
            Err(TreeError::DimensionMismatch {
                expected: 2,
                found: 3
            })
        );
    }
}
