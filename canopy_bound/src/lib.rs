// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canopy Bound: geometric bounds for space-partitioning trees.
//!
//! A bound summarizes a set of points in a fixed number of dimensions so that a
//! tree traversal can decide whether a whole subtree is worth visiting.
//!
//! - [`HRectBound`]: an axis-aligned hyper-rectangle, one [`Range`] per axis.
//! - [`BallBound`]: a center and radius, grown with Ritter's heuristic.
//! - [`Metric`]: a stateless distance policy. Bounds store their metric by
//!   value, so copies never share state.
//!
//! Both bounds implement [`Bound`], which exposes containment and the
//! minimum/maximum distance to a point or to another bound of the same kind.
//!
//! # Example
//!
//! ```rust
//! use canopy_bound::{Bound, HRectBound};
//!
//! let mut b: HRectBound = HRectBound::new(2);
//! b.expand(&[0.0, 0.0]);
//! b.expand(&[1.0, 2.0]);
//!
//! assert!(b.contains(&[0.5, 1.0]));
//! assert_eq!(b.min_distance(&[4.0, 6.0]), 5.0);
//! assert_eq!(b.volume(), 2.0);
//! ```
//!
//! An uninitialized bound contains nothing and reports `f64::MAX` for every
//! distance, which lets pruning rules treat it as infinitely far away.
//!
//! This crate assumes coordinates are never NaN.

mod ball;
mod bound;
mod hrect;
mod metric;
mod range;

pub use ball::BallBound;
pub use bound::Bound;
pub use hrect::HRectBound;
pub use metric::{
    ChebyshevDistance, EuclideanDistance, LMetric, ManhattanDistance, Metric,
    SquaredEuclideanDistance,
};
pub use range::Range;
