// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Axis-aligned hyper-rectangle bounds.

use core::ops::Index;

use serde::{Deserialize, Serialize};

use crate::{Bound, EuclideanDistance, Metric, Range};

/// An axis-aligned hyper-rectangle: one [`Range`] per dimension.
///
/// Distances are measured under the metric `M` using per-axis gaps between the
/// rectangle faces and the other operand.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = "M: Default"))]
pub struct HRectBound<M: Metric = EuclideanDistance> {
    bounds: Vec<Range>,
    #[serde(skip)]
    metric: M,
}

impl<M: Metric> HRectBound<M> {
    /// An empty rectangle in `dim` dimensions.
    pub fn new(dim: usize) -> Self {
        Self {
            bounds: vec![Range::EMPTY; dim],
            metric: M::default(),
        }
    }

    /// The degenerate rectangle covering exactly `point`.
    pub fn from_point(point: &[f64]) -> Self {
        Self {
            bounds: point.iter().copied().map(Range::point).collect(),
            metric: M::default(),
        }
    }

    /// A rectangle with the given per-axis ranges.
    pub fn from_ranges(bounds: Vec<Range>) -> Self {
        Self {
            bounds,
            metric: M::default(),
        }
    }

    /// All per-axis ranges.
    pub fn ranges(&self) -> &[Range] {
        &self.bounds
    }

    /// The metric used for distance computations.
    pub fn metric(&self) -> M {
        self.metric
    }

    /// Reset to the empty rectangle, keeping the dimension.
    pub fn clear(&mut self) {
        self.bounds.fill(Range::EMPTY);
    }

    /// Product of the per-axis widths.
    pub fn volume(&self) -> f64 {
        self.bounds.iter().map(Range::width).product()
    }

    /// Sum of the per-axis widths, the half-perimeter in two dimensions.
    pub fn margin(&self) -> f64 {
        self.bounds.iter().map(Range::width).sum()
    }

    /// Volume of the intersection with `other`.
    pub fn overlap(&self, other: &Self) -> f64 {
        self.bounds
            .iter()
            .zip(&other.bounds)
            .map(|(a, b)| a.overlap(b))
            .product()
    }

    /// Grow this rectangle to cover `other`.
    pub fn union_with(&mut self, other: &Self) {
        debug_assert_eq!(self.dim(), other.dim(), "bounds must share a dimension");
        for (a, b) in self.bounds.iter_mut().zip(&other.bounds) {
            *a = a.union(b);
        }
    }

    /// Smallest rectangle covering both `self` and `other`.
    pub fn union(&self, other: &Self) -> Self {
        let mut out = self.clone();
        out.union_with(other);
        out
    }

    /// Returns true if `other` lies entirely inside this rectangle.
    pub fn contains_bound(&self, other: &Self) -> bool {
        self.bounds
            .iter()
            .zip(&other.bounds)
            .all(|(a, b)| a.contains_range(b))
    }
}

impl<M: Metric> Index<usize> for HRectBound<M> {
    type Output = Range;

    fn index(&self, axis: usize) -> &Range {
        &self.bounds[axis]
    }
}

impl<M: Metric> Bound for HRectBound<M> {
    fn dim(&self) -> usize {
        self.bounds.len()
    }

    fn range(&self, axis: usize) -> Range {
        self.bounds[axis]
    }

    fn is_empty(&self) -> bool {
        self.bounds.iter().any(Range::is_empty)
    }

    fn contains(&self, point: &[f64]) -> bool {
        debug_assert_eq!(point.len(), self.dim(), "point dimension mismatch");
        self.bounds.iter().zip(point).all(|(r, &c)| r.contains(c))
    }

    fn min_distance(&self, point: &[f64]) -> f64 {
        if self.is_empty() {
            return f64::MAX;
        }
        self.metric.combine(
            self.bounds
                .iter()
                .zip(point)
                .map(|(r, &c)| (r.lo - c).max(c - r.hi).max(0.0)),
        )
    }

    fn max_distance(&self, point: &[f64]) -> f64 {
        if self.is_empty() {
            return f64::MAX;
        }
        self.metric.combine(
            self.bounds
                .iter()
                .zip(point)
                .map(|(r, &c)| (c - r.lo).abs().max((r.hi - c).abs())),
        )
    }

    fn min_distance_to(&self, other: &Self) -> f64 {
        if self.is_empty() || other.is_empty() {
            return f64::MAX;
        }
        self.metric.combine(
            self.bounds
                .iter()
                .zip(&other.bounds)
                .map(|(a, b)| (b.lo - a.hi).max(a.lo - b.hi).max(0.0)),
        )
    }

    fn max_distance_to(&self, other: &Self) -> f64 {
        if self.is_empty() || other.is_empty() {
            return f64::MAX;
        }
        self.metric.combine(
            self.bounds
                .iter()
                .zip(&other.bounds)
                .map(|(a, b)| (b.hi - a.lo).abs().max((a.hi - b.lo).abs())),
        )
    }

    fn expand(&mut self, point: &[f64]) {
        debug_assert_eq!(point.len(), self.dim(), "point dimension mismatch");
        for (r, &c) in self.bounds.iter_mut().zip(point) {
            r.expand_to(c);
        }
    }

    fn diameter(&self) -> f64 {
        self.metric.combine(self.bounds.iter().map(Range::width))
    }

    fn center(&self) -> Vec<f64> {
        self.bounds.iter().map(Range::mid).collect()
    }
}
