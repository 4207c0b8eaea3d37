// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Descent heuristics: which child of an internal node receives a new point.

use canopy_bound::{Bound, HRectBound};

/// Rule choosing the child that a point is inserted into.
pub trait DescentHeuristic {
    /// Index into `children` of the child that should receive `point`.
    ///
    /// `children` is never empty. `children_are_leaves` is true when the
    /// chosen child will store the point directly.
    fn choose_descent_node(
        children: &[&HRectBound],
        point: &[f64],
        children_are_leaves: bool,
    ) -> usize;
}

/// Least volume enlargement (Guttman's R-tree).
///
/// Ties go to the child with the smaller volume, then to the lower index.
#[derive(Clone, Copy, Debug, Default)]
pub struct VolumeDescent;

/// Least margin (perimeter) enlargement.
///
/// Ties go to the child with the smaller volume, then to the lower index.
#[derive(Clone, Copy, Debug, Default)]
pub struct MarginDescent;

/// Least overlap enlargement at the leaf level, volume enlargement above it
/// (the R*-tree rule).
///
/// When several leaves tie on overlap, the volume rule decides between them.
#[derive(Clone, Copy, Debug, Default)]
pub struct OverlapDescent;

impl DescentHeuristic for VolumeDescent {
    fn choose_descent_node(children: &[&HRectBound], point: &[f64], _: bool) -> usize {
        least_cost(children, 0..children.len(), |b| {
            enlarged_volume(b, point) - b.volume()
        })
    }
}

impl DescentHeuristic for MarginDescent {
    fn choose_descent_node(children: &[&HRectBound], point: &[f64], _: bool) -> usize {
        least_cost(children, 0..children.len(), |b| {
            enlarged_margin(b, point) - b.margin()
        })
    }
}

impl DescentHeuristic for OverlapDescent {
    fn choose_descent_node(
        children: &[&HRectBound],
        point: &[f64],
        children_are_leaves: bool,
    ) -> usize {
        if !children_are_leaves || children.len() < 2 {
            return VolumeDescent::choose_descent_node(children, point, children_are_leaves);
        }
        let scores: Vec<f64> = children
            .iter()
            .enumerate()
            .map(|(i, b)| {
                let mut grown = (*b).clone();
                grown.expand(point);
                children
                    .iter()
                    .enumerate()
                    .filter(|&(j, _)| j != i)
                    .map(|(_, other)| grown.overlap(other) - b.overlap(other))
                    .sum()
            })
            .collect();
        let best = scores.iter().copied().fold(f64::MAX, f64::min);
        let tied: Vec<usize> = (0..children.len()).filter(|&i| scores[i] == best).collect();
        if let [only] = tied[..] {
            return only;
        }
        least_cost(children, tied, |b| enlarged_volume(b, point) - b.volume())
    }
}

/// Volume of `bound` grown to cover `point`.
fn enlarged_volume(bound: &HRectBound, point: &[f64]) -> f64 {
    bound
        .ranges()
        .iter()
        .zip(point)
        .map(|(r, &c)| {
            let mut r = *r;
            r.expand_to(c);
            r.width()
        })
        .product()
}

/// Margin of `bound` grown to cover `point`.
fn enlarged_margin(bound: &HRectBound, point: &[f64]) -> f64 {
    bound
        .ranges()
        .iter()
        .zip(point)
        .map(|(r, &c)| {
            let mut r = *r;
            r.expand_to(c);
            r.width()
        })
        .sum()
}

/// Candidate with the smallest `cost`; ties by smaller volume, then first seen.
fn least_cost<I, F>(children: &[&HRectBound], candidates: I, mut cost: F) -> usize
where
    I: IntoIterator<Item = usize>,
    F: FnMut(&HRectBound) -> f64,
{
    let mut best = 0;
    let mut best_cost = f64::MAX;
    let mut best_volume = f64::MAX;
    for i in candidates {
        let b = children[i];
        let c = cost(b);
        let v = b.volume();
        if c < best_cost || (c == best_cost && v < best_volume) {
            best = i;
            best_cost = c;
            best_volume = v;
        }
    }
    best
}
