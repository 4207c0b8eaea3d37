// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Metric ball bounds.

use serde::{Deserialize, Serialize};

use crate::{Bound, EuclideanDistance, Metric, Range};

/// A ball described by a center and a radius under the metric `M`.
///
/// A negative radius marks the ball as uninitialized. Expansion uses Ritter's
/// incremental bounding-sphere heuristic, so the ball is always a valid cover
/// but is not guaranteed to be the minimum enclosing ball.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = "M: Default"))]
pub struct BallBound<M: Metric = EuclideanDistance> {
    radius: f64,
    center: Vec<f64>,
    #[serde(skip)]
    metric: M,
}

impl<M: Metric> BallBound<M> {
    /// An uninitialized ball in `dim` dimensions.
    pub fn new(dim: usize) -> Self {
        Self {
            radius: -1.0,
            center: vec![0.0; dim],
            metric: M::default(),
        }
    }

    /// A ball with the given radius and center.
    pub fn with_radius(radius: f64, center: Vec<f64>) -> Self {
        Self {
            radius,
            center,
            metric: M::default(),
        }
    }

    /// Radius of the ball; negative while uninitialized.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Center of the ball.
    pub fn center_point(&self) -> &[f64] {
        &self.center
    }

    /// The metric used for distance computations.
    pub fn metric(&self) -> M {
        self.metric
    }

    fn center_distance(&self, point: &[f64]) -> f64 {
        self.metric.evaluate(&self.center, point)
    }
}

impl<M: Metric> Bound for BallBound<M> {
    fn dim(&self) -> usize {
        self.center.len()
    }

    fn range(&self, axis: usize) -> Range {
        if self.radius < 0.0 {
            Range::EMPTY
        } else {
            Range::new(self.center[axis] - self.radius, self.center[axis] + self.radius)
        }
    }

    fn is_empty(&self) -> bool {
        self.radius < 0.0
    }

    fn contains(&self, point: &[f64]) -> bool {
        !self.is_empty() && self.center_distance(point) <= self.radius
    }

    fn min_distance(&self, point: &[f64]) -> f64 {
        if self.is_empty() {
            return f64::MAX;
        }
        (self.center_distance(point) - self.radius).max(0.0)
    }

    fn max_distance(&self, point: &[f64]) -> f64 {
        if self.is_empty() {
            return f64::MAX;
        }
        self.center_distance(point) + self.radius
    }

    fn range_distance(&self, point: &[f64]) -> Range {
        if self.is_empty() {
            return Range::new(f64::MAX, f64::MAX);
        }
        let dist = self.center_distance(point);
        Range::new((dist - self.radius).max(0.0), dist + self.radius)
    }

    fn min_distance_to(&self, other: &Self) -> f64 {
        if self.is_empty() || other.is_empty() {
            return f64::MAX;
        }
        let dist = self.metric.evaluate(&self.center, &other.center);
        (dist - self.radius - other.radius).max(0.0)
    }

    fn max_distance_to(&self, other: &Self) -> f64 {
        if self.is_empty() || other.is_empty() {
            return f64::MAX;
        }
        self.metric.evaluate(&self.center, &other.center) + self.radius + other.radius
    }

    fn range_distance_to(&self, other: &Self) -> Range {
        if self.is_empty() || other.is_empty() {
            return Range::new(f64::MAX, f64::MAX);
        }
        let dist = self.metric.evaluate(&self.center, &other.center);
        let radii = self.radius + other.radius;
        Range::new((dist - radii).max(0.0), dist + radii)
    }

    fn expand(&mut self, point: &[f64]) {
        debug_assert_eq!(point.len(), self.dim(), "point dimension mismatch");
        if self.is_empty() {
            self.center.copy_from_slice(point);
            self.radius = 0.0;
            return;
        }
        let dist = self.center_distance(point);
        if dist > self.radius {
            // Slide the center toward the point so the far side of the old
            // ball stays on the new boundary.
            let shift = (dist - self.radius) / (2.0 * dist);
            for (c, &p) in self.center.iter_mut().zip(point) {
                *c += shift * (p - *c);
            }
            self.radius = (dist + self.radius) / 2.0;
        }
    }

    fn diameter(&self) -> f64 {
        if self.is_empty() { 0.0 } else { 2.0 * self.radius }
    }

    fn center(&self) -> Vec<f64> {
        self.center.clone()
    }
}
