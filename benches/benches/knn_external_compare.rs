// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![cfg(feature = "compare_rstar")]

use canopy_tree::neighbors::single_tree_knn;
use canopy_tree::{Dataset, RStarTree, TreeParams};
use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use rstar::RTree;

fn gen_points(n: usize, seed: u64) -> Vec<[f64; 3]> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.random::<[f64; 3]>()).collect()
}

fn to_dataset(points: &[[f64; 3]]) -> Dataset {
    Dataset::from_points(points).unwrap()
}

fn bench_knn_external_compare(c: &mut Criterion) {
    let mut group = c.benchmark_group("knn_external_compare");
    for &n in &[5_000usize, 20_000] {
        let points = gen_points(n, 1);
        let queries = gen_points(1_000, 2);
        let query_set = to_dataset(&queries);
        group.throughput(Throughput::Elements(n as u64));

        group.bench_function(format!("canopy_rstar_build_n{n}"), |b| {
            b.iter_batched(
                || to_dataset(&points),
                |data| {
                    let tree: RStarTree = RStarTree::new(data, TreeParams::default()).unwrap();
                    black_box(tree.len());
                },
                BatchSize::LargeInput,
            );
        });

        group.bench_function(format!("rstar_insert_n{n}"), |b| {
            b.iter(|| {
                let mut tree = RTree::new();
                for p in &points {
                    tree.insert(*p);
                }
                black_box(tree.size());
            });
        });

        let canopy: RStarTree = RStarTree::new(to_dataset(&points), TreeParams::default()).unwrap();
        let external = RTree::bulk_load(points.clone());

        group.bench_function(format!("canopy_knn1_n{n}"), |b| {
            b.iter(|| black_box(single_tree_knn(&canopy, &query_set, 1).unwrap()));
        });

        group.bench_function(format!("rstar_knn1_n{n}"), |b| {
            b.iter(|| {
                let hits: usize = queries
                    .iter()
                    .filter_map(|q| external.nearest_neighbor(q))
                    .count();
                black_box(hits);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_knn_external_compare);
criterion_main!(benches);
