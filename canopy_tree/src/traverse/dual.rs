// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::NodeRef;

use super::TraversalStats;

/// Rules for a traversal of a query tree against a reference tree.
pub trait DualTreeRules<S> {
    /// Handle the pair (`query`, `reference`) and return their distance.
    fn base_case(&mut self, query: usize, reference: usize) -> f64;

    /// Score `reference` for the single query point `query`; `None` prunes.
    fn score_point(&mut self, query: usize, reference: NodeRef<'_, S>) -> Option<f64>;

    /// Score the node pair; lower is visited first, `None` prunes.
    fn score(&mut self, query: NodeRef<'_, S>, reference: NodeRef<'_, S>) -> Option<f64>;

    /// Re-check a score computed earlier; `None` prunes.
    fn rescore(
        &mut self,
        query: NodeRef<'_, S>,
        reference: NodeRef<'_, S>,
        old_score: f64,
    ) -> Option<f64>;
}

/// Simultaneous depth-first traversal of two trees.
#[derive(Debug)]
pub struct DualTreeTraverser<R> {
    rules: R,
    stats: TraversalStats,
}

impl<R> DualTreeTraverser<R> {
    /// A traverser driven by `rules`.
    pub fn new(rules: R) -> Self {
        Self {
            rules,
            stats: TraversalStats::default(),
        }
    }

    /// The rules object.
    pub fn rules(&self) -> &R {
        &self.rules
    }

    /// Give up the traverser and return its rules.
    pub fn into_rules(self) -> R {
        self.rules
    }

    /// Counters accumulated over every traversal so far.
    pub fn stats(&self) -> TraversalStats {
        self.stats
    }

    /// Visit the pair (`query`, `reference`) and every pair below it.
    ///
    /// - Two leaves: each query point is scored against the reference node
    ///   and, unless pruned, paired with every reference point.
    /// - Query leaf, internal reference: the reference children are visited
    ///   best-first with the query leaf.
    /// - Internal query, reference leaf: every query child that scores is
    ///   visited with the reference leaf.
    /// - Two internal nodes: for each query child in order, the reference
    ///   children are visited best-first.
    pub fn traverse<S>(&mut self, query: NodeRef<'_, S>, reference: NodeRef<'_, S>)
    where
        R: DualTreeRules<S>,
    {
        self.stats.num_visited += 1;
        match (query.is_leaf(), reference.is_leaf()) {
            (true, true) => {
                for &q in query.points() {
                    if self.rules.score_point(q, reference).is_none() {
                        self.stats.num_prunes += 1;
                        continue;
                    }
                    for &r in reference.points() {
                        self.rules.base_case(q, r);
                    }
                    self.stats.num_base_cases += reference.count();
                }
            }
            (true, false) => self.visit_best_first(query, reference),
            (false, true) => {
                for child in query.children() {
                    match self.rules.score(child, reference) {
                        Some(_) => self.traverse(child, reference),
                        None => self.stats.num_prunes += 1,
                    }
                }
            }
            (false, false) => {
                for child in query.children() {
                    self.visit_best_first(child, reference);
                }
            }
        }
    }

    /// Visit `query` with each child of `reference`, lowest score first.
    fn visit_best_first<S>(&mut self, query: NodeRef<'_, S>, reference: NodeRef<'_, S>)
    where
        R: DualTreeRules<S>,
    {
        let mut scored = Vec::with_capacity(reference.num_children());
        for child in reference.children() {
            match self.rules.score(query, child) {
                Some(score) => scored.push((score, child)),
                None => self.stats.num_prunes += 1,
            }
        }
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));

        for (i, &(score, child)) in scored.iter().enumerate() {
            if self.rules.rescore(query, child, score).is_none() {
                self.stats.num_prunes += scored.len() - i;
                break;
            }
            self.traverse(query, child);
        }
    }
}
