// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::NodeRef;

use super::TraversalStats;

/// Rules for a traversal of one query point against a reference tree.
pub trait SingleTreeRules<S> {
    /// Handle the pair (`query`, `reference`) and return their distance.
    fn base_case(&mut self, query: usize, reference: usize) -> f64;

    /// Score `node` for `query`; lower is visited first, `None` prunes.
    fn score(&mut self, query: usize, node: NodeRef<'_, S>) -> Option<f64>;

    /// Re-check a score computed earlier; `None` prunes.
    fn rescore(&mut self, query: usize, node: NodeRef<'_, S>, old_score: f64) -> Option<f64>;
}

/// Depth-first, best-first traversal for a single query point.
#[derive(Debug)]
pub struct SingleTreeTraverser<R> {
    rules: R,
    stats: TraversalStats,
}

impl<R> SingleTreeTraverser<R> {
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

    /// Visit `node` and its subtree on behalf of `query`.
    ///
    /// A leaf runs `base_case` on each stored point. An internal node scores
    /// every child, then visits them in ascending score order; each child is
    /// re-scored right before descent and the first rejection prunes it along
    /// with every worse-scored sibling.
    pub fn traverse<S>(&mut self, query: usize, node: NodeRef<'_, S>)
    where
        R: SingleTreeRules<S>,
    {
        self.stats.num_visited += 1;
        if node.is_leaf() {
            for &reference in node.points() {
                self.rules.base_case(query, reference);
            }
            self.stats.num_base_cases += node.count();
            return;
        }

        let mut scored = Vec::with_capacity(node.num_children());
        for child in node.children() {
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
