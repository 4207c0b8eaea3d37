// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Closed one-dimensional intervals.

use serde::{Deserialize, Serialize};

/// A closed interval `[lo, hi]` on a single axis.
///
/// The empty range has `lo = f64::MAX` and `hi = -f64::MAX`, so expanding it
/// with any value yields the degenerate interval at that value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Range {
    /// Lower end.
    pub lo: f64,
    /// Upper end.
    pub hi: f64,
}

impl Default for Range {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Range {
    /// The empty range.
    pub const EMPTY: Self = Self {
        lo: f64::MAX,
        hi: -f64::MAX,
    };

    /// Create a range from its two ends.
    pub const fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    /// The degenerate range holding a single value.
    pub const fn point(value: f64) -> Self {
        Self {
            lo: value,
            hi: value,
        }
    }

    /// Returns true if the range holds no value.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lo > self.hi
    }

    /// Length of the interval, or zero when the range is empty.
    #[inline]
    pub fn width(&self) -> f64 {
        if self.lo < self.hi {
            self.hi - self.lo
        } else {
            0.0
        }
    }

    /// Midpoint of the interval.
    #[inline]
    pub fn mid(&self) -> f64 {
        (self.hi + self.lo) / 2.0
    }

    /// Returns true if `value` lies in `[lo, hi]`.
    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        self.lo <= value && value <= self.hi
    }

    /// Returns true if `other` lies entirely inside this range.
    ///
    /// The empty range is contained in every range.
    #[inline]
    pub fn contains_range(&self, other: &Self) -> bool {
        other.is_empty() || (self.lo <= other.lo && other.hi <= self.hi)
    }

    /// Grow the range so it contains `value`.
    #[inline]
    pub fn expand_to(&mut self, value: f64) {
        if value < self.lo {
            self.lo = value;
        }
        if value > self.hi {
            self.hi = value;
        }
    }

    /// Smallest range containing both `self` and `other`.
    #[inline]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            lo: self.lo.min(other.lo),
            hi: self.hi.max(other.hi),
        }
    }

    /// Length of the intersection with `other`; zero when the ranges are disjoint.
    #[inline]
    pub fn overlap(&self, other: &Self) -> f64 {
        let lo = self.lo.max(other.lo);
        let hi = self.hi.min(other.hi);
        if lo < hi { hi - lo } else { 0.0 }
    }
}
