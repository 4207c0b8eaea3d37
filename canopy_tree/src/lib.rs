// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canopy Tree: dynamic, height-balanced rectangle trees over point sets.
//!
//! A [`RectangleTree`] indexes the columns of a [`Dataset`] with a hierarchy of
//! axis-aligned bounding rectangles. Points are inserted and deleted one at a
//! time; after every operation all leaves sit at the same depth, every node
//! respects the configured fill limits and every bound tightly covers its
//! contents. Sibling rectangles may overlap.
//!
//! - [`RTree`]: Guttman's R-tree ([`QuadraticSplit`] and [`VolumeDescent`]).
//! - [`RStarTree`]: the R*-tree ([`RStarSplit`] with forced reinsertion and
//!   [`OverlapDescent`]).
//!
//! Other pairings are available through the generic parameters of
//! [`RectangleTree`], and every node can carry a user [`Statistic`] that is
//! kept up to date bottom-up.
//!
//! Queries are written as rules for the traversers in [`traverse`]. The
//! [`neighbors`] module implements exact k-nearest-neighbor search this way.
//!
//! # Example
//!
//! ```rust
//! use canopy_tree::neighbors::single_tree_knn;
//! use canopy_tree::{Dataset, RStarTree, TreeParams};
//!
//! let data = Dataset::from_points(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [5.0, 5.0]]).unwrap();
//! let params = TreeParams::default().with_leaf_limits(1, 2).with_child_limits(1, 2);
//! let mut tree: RStarTree = RStarTree::new(data, params).unwrap();
//! assert_eq!(tree.len(), 4);
//!
//! let far = tree.push_point(&[6.0, 5.0]).unwrap();
//! tree.delete_point(0).unwrap();
//!
//! let query = Dataset::from_points(&[[5.5, 5.5]]).unwrap();
//! let nearest = single_tree_knn(&tree, &query, 2).unwrap();
//! let indices: Vec<usize> = nearest[0].iter().map(|n| n.index).collect();
//! assert_eq!(indices, vec![3, far]);
//! ```
//!
//! Trees serialize through [`TreeSnapshot`], which is validated on load.
//!
//! This crate assumes coordinates are never NaN.

mod dataset;
mod error;
mod node;
mod params;
mod statistic;
mod tree;

pub mod descent;
pub mod neighbors;
pub mod snapshot;
pub mod split;
pub mod traverse;

pub use dataset::Dataset;
pub use descent::{DescentHeuristic, MarginDescent, OverlapDescent, VolumeDescent};
pub use error::TreeError;
pub use node::{DescendantPoints, NodeId, NodeRef};
pub use params::TreeParams;
pub use snapshot::{NodeContents, NodeSnapshot, TreeSnapshot};
pub use split::{Partition, QuadraticSplit, RStarSplit, SplitStrategy};
pub use statistic::{EmptyStatistic, Statistic};
pub use tree::{RStarTree, RTree, RectangleTree};
