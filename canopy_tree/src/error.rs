// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use thiserror::Error;

/// Errors reported by datasets and trees.
///
/// Every fallible operation validates its input before touching the tree, so
/// an error always leaves the tree unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// A dataset was created with zero dimensions.
    #[error("dataset dimensionality must be positive")]
    ZeroDimension,

    /// Leaf fill limits cannot be satisfied by a split.
    #[error("invalid leaf size limits: min {min}, max {max}")]
    InvalidLeafLimits {
        /// Configured minimum points per leaf.
        min: usize,
        /// Configured maximum points per leaf.
        max: usize,
    },

    /// Child fill limits cannot be satisfied by a split.
    #[error("invalid child count limits: min {min}, max {max}")]
    InvalidChildLimits {
        /// Configured minimum children per internal node.
        min: usize,
        /// Configured maximum children per internal node.
        max: usize,
    },

    /// The first index to insert lies past the end of the dataset.
    #[error("first index {first} is past the end of a dataset of {len} points")]
    FirstIndexOutOfRange {
        /// Requested first index.
        first: usize,
        /// Number of dataset columns.
        len: usize,
    },

    /// A point had the wrong number of coordinates.
    #[error("expected {expected} coordinates, found {found}")]
    DimensionMismatch {
        /// Dataset dimensionality.
        expected: usize,
        /// Coordinates supplied.
        found: usize,
    },

    /// A coordinate was NaN or infinite.
    #[error("point {index} has a non-finite coordinate on axis {axis}")]
    NonFiniteCoordinate {
        /// Column the coordinate belongs to.
        index: usize,
        /// Axis of the offending coordinate.
        axis: usize,
    },

    /// A point index does not name a dataset column.
    #[error("point {index} is out of bounds for a dataset of {len} points")]
    IndexOutOfBounds {
        /// Offending index.
        index: usize,
        /// Number of dataset columns.
        len: usize,
    },

    /// The point is already stored in the tree.
    #[error("point {0} is already stored in the tree")]
    DuplicatePoint(usize),

    /// The point is not stored in the tree.
    #[error("point {0} is not stored in the tree")]
    PointNotFound(usize),

    /// A serialized tree failed structural validation.
    #[error("corrupt tree snapshot: {0}")]
    CorruptSnapshot(String),
}
