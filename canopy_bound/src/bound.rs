// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The bound contract shared by rectangle and ball bounds.

use core::fmt::Debug;

use crate::Range;

/// A geometric region summarizing a set of points.
///
/// A freshly created bound is uninitialized: it contains nothing, every axis
/// range is empty, and all distances from it are `f64::MAX`. Distances are
/// never negative.
pub trait Bound: Clone + Debug {
    /// Number of dimensions.
    fn dim(&self) -> usize;

    /// Extent of the bound along `axis`; empty if the bound is uninitialized.
    fn range(&self, axis: usize) -> Range;

    /// Returns true if the bound has not yet been expanded to any point.
    fn is_empty(&self) -> bool;

    /// Returns true if `point` lies inside the bound.
    fn contains(&self, point: &[f64]) -> bool;

    /// Smallest distance from `point` to any location in the bound.
    fn min_distance(&self, point: &[f64]) -> f64;

    /// Largest distance from `point` to any location in the bound.
    fn max_distance(&self, point: &[f64]) -> f64;

    /// Both of [`Bound::min_distance`] and [`Bound::max_distance`] as a range.
    fn range_distance(&self, point: &[f64]) -> Range {
        Range::new(self.min_distance(point), self.max_distance(point))
    }

    /// Smallest distance between any two locations of `self` and `other`.
    fn min_distance_to(&self, other: &Self) -> f64;

    /// Largest distance between any two locations of `self` and `other`.
    fn max_distance_to(&self, other: &Self) -> f64;

    /// Both of [`Bound::min_distance_to`] and [`Bound::max_distance_to`] as a range.
    fn range_distance_to(&self, other: &Self) -> Range {
        Range::new(self.min_distance_to(other), self.max_distance_to(other))
    }

    /// Grow the bound to cover `point`.
    fn expand(&mut self, point: &[f64]);

    /// Grow the bound to cover every point in `points`.
    fn expand_all<'a, I>(&mut self, points: I)
    where
        I: IntoIterator<Item = &'a [f64]>,
    {
        for p in points {
            self.expand(p);
        }
    }

    /// Largest distance between two locations in the bound.
    fn diameter(&self) -> f64;

    /// Center of the bound.
    fn center(&self) -> Vec<f64>;
}
