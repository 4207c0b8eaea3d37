// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! R*-tree topological split.

use canopy_bound::HRectBound;

use super::{Partition, SplitStrategy};

/// R*-tree split with forced reinsertion.
///
/// For every axis the entries are sorted by their lower then upper
/// coordinate, and each distribution leaving at least `min_fill` entries on
/// both sides is scored from prefix/suffix unions. The axis with the smallest
/// summed margin wins; on that axis the distribution with the least overlap
/// between the halves is used, then the least total volume.
///
/// Before a non-root leaf is split for the first time during an insertion,
/// the tree evicts 30% of its points (those farthest from the bound center)
/// and inserts them again from the root.
#[derive(Clone, Copy, Debug, Default)]
pub struct RStarSplit;

/// Fraction of a leaf's capacity evicted by forced reinsertion.
const REINSERT_FRACTION: f64 = 0.3;

struct AxisPlan {
    order: Vec<usize>,
    margin: f64,
    best_k: usize,
}

fn plan_axis(entries: &[HRectBound], axis: usize, min_fill: usize) -> AxisPlan {
    let n = entries.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        let (ra, rb) = (entries[a][axis], entries[b][axis]);
        ra.lo.total_cmp(&rb.lo).then(ra.hi.total_cmp(&rb.hi))
    });

    // Prefix and suffix unions make each distribution O(1) to score.
    let mut prefix: Vec<HRectBound> = Vec::with_capacity(n);
    for &e in &order {
        let next = match prefix.last() {
            Some(prev) => prev.union(&entries[e]),
            None => entries[e].clone(),
        };
        prefix.push(next);
    }
    let mut suffix: Vec<HRectBound> = Vec::with_capacity(n);
    for &e in order.iter().rev() {
        let next = match suffix.last() {
            Some(prev) => entries[e].union(prev),
            None => entries[e].clone(),
        };
        suffix.push(next);
    }
    suffix.reverse();

    let mut margin = 0.0;
    let mut best_k = min_fill;
    let mut best = (f64::MAX, f64::MAX);
    for k in min_fill..=n - min_fill {
        let (left, right) = (&prefix[k - 1], &suffix[k]);
        margin += left.margin() + right.margin();
        let overlap = left.overlap(right);
        let volume = left.volume() + right.volume();
        if overlap < best.0 || (overlap == best.0 && volume < best.1) {
            best = (overlap, volume);
            best_k = k;
        }
    }
    AxisPlan {
        order,
        margin,
        best_k,
    }
}

impl SplitStrategy for RStarSplit {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "a fraction of a node capacity always fits in usize"
    )]
    fn reinsert_count(max_leaf_size: usize) -> usize {
        (REINSERT_FRACTION * max_leaf_size as f64).floor() as usize
    }

    fn partition(entries: &[HRectBound], min_fill: usize) -> Partition {
        debug_assert!(
            entries.len() >= 2 && entries.len() >= 2 * min_fill,
            "too few entries to split"
        );
        let dim = entries.first().map_or(0, |e| e.ranges().len());
        let AxisPlan {
            mut order, best_k, ..
        } = (0..dim)
            .map(|axis| plan_axis(entries, axis, min_fill))
            .reduce(|best, plan| if plan.margin < best.margin { plan } else { best })
            .expect("split entries have at least one dimension");
        let second = order.split_off(best_k);
        Partition {
            first: order,
            second,
        }
    }
}
