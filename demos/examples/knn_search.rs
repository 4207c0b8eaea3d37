// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Nearest-neighbor search.
//!
//! Build an R-tree and an R*-tree over random points, answer k-NN queries with
//! single- and dual-tree traversals, and compare against a full scan.
//!
//! Run:
//! - `cargo run -p canopy_demos --example knn_search`
//! - `RUST_LOG=canopy_tree=debug cargo run -p canopy_demos --example knn_search`

use canopy_tree::neighbors::{dual_tree_knn, naive_knn, single_tree_knn};
use canopy_tree::{Dataset, RStarTree, RTree, TreeParams};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::EnvFilter;

fn random_points(rng: &mut StdRng, n: usize) -> Dataset {
    let points: Vec<[f64; 3]> = (0..n)
        .map(|_| [rng.random(), rng.random(), rng.random()])
        .collect();
    Dataset::from_points(&points).unwrap()
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut rng = StdRng::seed_from_u64(42);
    let reference = random_points(&mut rng, 5_000);
    let queries = random_points(&mut rng, 200);
    let params = TreeParams::default();

    let rtree: RTree = RTree::new(reference.clone(), params).unwrap();
    let rstar: RStarTree = RStarTree::new(reference.clone(), params).unwrap();
    println!("R-tree:  {rtree:?}, depth {}", rtree.tree_depth());
    println!("R*-tree: {rstar:?}, depth {}", rstar.tree_depth());

    let expected = naive_knn(&reference, &queries, 3, false).unwrap();
    let single = single_tree_knn(&rtree, &queries, 3).unwrap();
    let query_tree: RStarTree = RStarTree::new(queries.clone(), params).unwrap();
    let dual = dual_tree_knn(&rstar, &query_tree, 3).unwrap();
    assert_eq!(single, expected, "single-tree search must match the full scan");
    assert_eq!(dual, expected, "dual-tree search must match the full scan");

    for (q, neighbors) in expected.iter().enumerate().take(3) {
        println!("query {q} at {:?}", queries.col(q));
        for n in neighbors {
            println!("  #{:<5} distance {:.4}", n.index, n.distance);
        }
    }
}
