// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fill-factor configuration.

use serde::{Deserialize, Serialize};

use crate::TreeError;

/// Minimum and maximum fill of tree nodes.
///
/// The root is exempt from the minimums. Limits are validated when a tree is
/// built; a split of an overfull node must be able to give both halves at
/// least the minimum, so `2 * min <= max + 1` is required at both levels.
///
/// The struct deserializes with missing fields filled from [`Default`]:
///
/// ```rust
/// use canopy_tree::TreeParams;
///
/// let params: TreeParams = serde_json::from_str(r#"{ "max_leaf_size": 12 }"#).unwrap();
/// assert_eq!(params.max_leaf_size, 12);
/// assert_eq!(params.max_num_children, TreeParams::default().max_num_children);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeParams {
    /// Maximum points stored in a leaf.
    pub max_leaf_size: usize,
    /// Minimum points stored in a non-root leaf.
    pub min_leaf_size: usize,
    /// Maximum children of an internal node.
    pub max_num_children: usize,
    /// Minimum children of a non-root internal node.
    pub min_num_children: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_leaf_size: 20,
            min_leaf_size: 8,
            max_num_children: 5,
            min_num_children: 2,
        }
    }
}

impl TreeParams {
    /// Set the leaf fill limits.
    #[must_use]
    pub const fn with_leaf_limits(mut self, min: usize, max: usize) -> Self {
        self.min_leaf_size = min;
        self.max_leaf_size = max;
        self
    }

    /// Set the internal-node fill limits.
    #[must_use]
    pub const fn with_child_limits(mut self, min: usize, max: usize) -> Self {
        self.min_num_children = min;
        self.max_num_children = max;
        self
    }

    /// Check that both pairs of limits admit a valid split.
    pub fn validate(&self) -> Result<(), TreeError> {
        let (min, max) = (self.min_leaf_size, self.max_leaf_size);
        if min == 0 || min > max || 2 * min > max + 1 {
            return Err(TreeError::InvalidLeafLimits { min, max });
        }
        let (min, max) = (self.min_num_children, self.max_num_children);
        if min == 0 || max < 2 || min > max || 2 * min > max + 1 {
            return Err(TreeError::InvalidChildLimits { min, max });
        }
        Ok(())
    }
}
