// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Distance metrics.
//!
//! Metrics are stateless policies. Each one knows how to fold a sequence of
//! per-axis absolute gaps into a distance, which lets rectangle bounds measure
//! face-to-point gaps under the same metric used between points.

use core::fmt::Debug;

/// A stateless distance policy over `f64` coordinates.
pub trait Metric: Copy + Default + Debug + Send + Sync + 'static {
    /// Fold per-axis absolute gaps into a distance.
    fn combine<I>(&self, gaps: I) -> f64
    where
        I: IntoIterator<Item = f64>;

    /// Distance between two points of equal dimension.
    fn evaluate(&self, a: &[f64], b: &[f64]) -> f64 {
        debug_assert_eq!(a.len(), b.len(), "points must share a dimension");
        self.combine(a.iter().zip(b).map(|(x, y)| (x - y).abs()))
    }
}

/// The L-p family of metrics.
///
/// `POWER` must be at least 1. With `TAKE_ROOT = false` the final root is
/// skipped, which preserves ordering while saving work.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LMetric<const POWER: u32, const TAKE_ROOT: bool>;

/// L1 distance.
pub type ManhattanDistance = LMetric<1, false>;
/// L2 distance without the square root.
pub type SquaredEuclideanDistance = LMetric<2, false>;
/// L2 distance.
pub type EuclideanDistance = LMetric<2, true>;

impl<const POWER: u32, const TAKE_ROOT: bool> Metric for LMetric<POWER, TAKE_ROOT> {
    fn combine<I>(&self, gaps: I) -> f64
    where
        I: IntoIterator<Item = f64>,
    {
        match POWER {
            1 => gaps.into_iter().sum(),
            2 => {
                let sum: f64 = gaps.into_iter().map(|g| g * g).sum();
                if TAKE_ROOT { sum.sqrt() } else { sum }
            }
            _ => {
                let p = f64::from(POWER);
                let sum: f64 = gaps.into_iter().map(|g| g.powf(p)).sum();
                if TAKE_ROOT { sum.powf(p.recip()) } else { sum }
            }
        }
    }
}

/// L-infinity distance: the largest per-axis gap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChebyshevDistance;

impl Metric for ChebyshevDistance {
    fn combine<I>(&self, gaps: I) -> f64
    where
        I: IntoIterator<Item = f64>,
    {
        gaps.into_iter().fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const A: [f64; 3] = [0.0, 0.0, 0.0];
    const B: [f64; 3] = [1.0, -2.0, 2.0];

    #[test]
    fn lp_family() {
        assert_eq!(ManhattanDistance::default().evaluate(&A, &B), 5.0);
        assert_eq!(SquaredEuclideanDistance::default().evaluate(&A, &B), 9.0);
        assert_eq!(EuclideanDistance::default().evaluate(&A, &B), 3.0);
        assert_relative_eq!(
            LMetric::<3, true>.evaluate(&A, &B),
            17.0_f64.cbrt(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn chebyshev_takes_largest_gap() {
        assert_eq!(ChebyshevDistance.evaluate(&A, &B), 2.0);
        assert_eq!(ChebyshevDistance.combine(core::iter::empty()), 0.0);
    }

    #[test]
    fn metric_is_symmetric() {
        let m = EuclideanDistance::default();
        assert_eq!(m.evaluate(&A, &B), m.evaluate(&B, &A));
        assert_eq!(m.evaluate(&B, &B), 0.0);
    }
}
