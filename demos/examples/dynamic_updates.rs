// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dynamic updates and snapshots.
//!
//! Grow an R*-tree point by point, delete a region, inspect the node
//! hierarchy, then save the tree to JSON and load it back.
//!
//! Run:
//! - `RUST_LOG=canopy_tree=debug cargo run -p canopy_demos --example dynamic_updates`

use canopy_bound::Bound;
use canopy_tree::{Dataset, NodeRef, RStarTree, TreeParams};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::EnvFilter;

fn print_node<S>(node: NodeRef<'_, S>, level: usize) {
    let bound = node.bound();
    let extent: Vec<String> = (0..bound.dim())
        .map(|axis| format!("[{:.2}, {:.2}]", bound[axis].lo, bound[axis].hi))
        .collect();
    let kind = if node.is_leaf() {
        format!("leaf with {} points", node.count())
    } else {
        format!("{} children", node.num_children())
    };
    println!("{:indent$}{} {kind}", "", extent.join(" x "), indent = level * 2);
    if level < 1 {
        for child in node.children() {
            print_node(child, level + 1);
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let params = TreeParams::default()
        .with_leaf_limits(4, 10)
        .with_child_limits(2, 4);
    let mut tree: RStarTree = RStarTree::new(Dataset::new(2).unwrap(), params).unwrap();

    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..500 {
        let p = [rng.random_range(0.0..100.0), rng.random_range(0.0..100.0)];
        tree.push_point(&p).unwrap();
    }
    println!("after inserts: {} points, depth {}", tree.len(), tree.tree_depth());

    // Drop everything in the lower-left quadrant.
    let doomed: Vec<usize> = tree
        .dataset()
        .columns()
        .enumerate()
        .filter(|(_, p)| p[0] < 50.0 && p[1] < 50.0)
        .map(|(i, _)| i)
        .collect();
    for &i in &doomed {
        tree.delete_point(i).unwrap();
    }
    println!(
        "after deleting {} points: {} points, depth {}",
        doomed.len(),
        tree.len(),
        tree.tree_depth()
    );
    assert!(doomed.iter().all(|&i| !tree.contains_point(i)), "deleted points must be gone");

    print_node(tree.root(), 0);

    let json = serde_json::to_string(&tree).unwrap();
    let loaded: RStarTree = serde_json::from_str(&json).unwrap();
    assert_eq!(loaded.snapshot(), tree.snapshot(), "snapshot must round trip");
    println!("snapshot: {} bytes of JSON", json.len());
}
