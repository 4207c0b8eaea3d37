// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use canopy_tree::neighbors::{dual_tree_knn, single_tree_knn};
use canopy_tree::{
    Dataset, DescentHeuristic, RStarTree, RTree, RectangleTree, SplitStrategy, TreeParams,
};
use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn gen_uniform(n: usize, dim: usize, seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let values = (0..n * dim).map(|_| rng.random::<f64>()).collect();
    Dataset::from_columns(dim, values).unwrap()
}

fn gen_clustered(n: usize, dim: usize, seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let centers: Vec<Vec<f64>> = (0..16)
        .map(|_| (0..dim).map(|_| rng.random_range(0.0..100.0)).collect())
        .collect();
    let mut values = Vec::with_capacity(n * dim);
    for i in 0..n {
        let c = &centers[i % centers.len()];
        values.extend(c.iter().map(|&x| x + rng.random_range(-1.0..1.0)));
    }
    Dataset::from_columns(dim, values).unwrap()
}

fn bench_build<Sp: SplitStrategy, De: DescentHeuristic>(
    c: &mut Criterion,
    name: &str,
    datasets: &[(&str, Dataset)],
) {
    let mut group = c.benchmark_group(format!("build_{name}"));
    for (label, data) in datasets {
        group.throughput(Throughput::Elements(data.len() as u64));
        group.bench_function(format!("{label}_n{}", data.len()), |b| {
            b.iter_batched(
                || data.clone(),
                |data| {
                    let tree: RectangleTree<Sp, De> =
                        RectangleTree::new(data, TreeParams::default()).unwrap();
                    black_box(tree.tree_depth());
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn bench_tree_build(c: &mut Criterion) {
    let datasets = [
        ("uniform3", gen_uniform(10_000, 3, 1)),
        ("clustered3", gen_clustered(10_000, 3, 2)),
    ];
    bench_build::<canopy_tree::QuadraticSplit, canopy_tree::VolumeDescent>(c, "rtree", &datasets);
    bench_build::<canopy_tree::RStarSplit, canopy_tree::OverlapDescent>(c, "rstar", &datasets);
}

fn bench_update_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("delete_reinsert");
    let data = gen_uniform(10_000, 3, 3);
    let rtree: RTree = RTree::new(data.clone(), TreeParams::default()).unwrap();
    let rstar: RStarTree = RStarTree::new(data, TreeParams::default()).unwrap();
    group.throughput(Throughput::Elements(1_000));

    group.bench_function("rtree_1000", |b| {
        b.iter_batched(
            || rtree.clone(),
            |mut tree| {
                for i in (0..10_000).step_by(10) {
                    tree.delete_point(i).unwrap();
                }
                for i in (0..10_000).step_by(10) {
                    tree.insert_point(i).unwrap();
                }
                black_box(tree.len());
            },
            BatchSize::LargeInput,
        );
    });
    group.bench_function("rstar_1000", |b| {
        b.iter_batched(
            || rstar.clone(),
            |mut tree| {
                for i in (0..10_000).step_by(10) {
                    tree.delete_point(i).unwrap();
                }
                for i in (0..10_000).step_by(10) {
                    tree.insert_point(i).unwrap();
                }
                black_box(tree.len());
            },
            BatchSize::LargeInput,
        );
    });
    group.finish();
}

fn bench_knn(c: &mut Criterion) {
    let mut group = c.benchmark_group("knn_k5");
    let reference = gen_uniform(20_000, 3, 4);
    let query = gen_uniform(2_000, 3, 5);
    let rtree: RTree = RTree::new(reference.clone(), TreeParams::default()).unwrap();
    let rstar: RStarTree = RStarTree::new(reference, TreeParams::default()).unwrap();
    let query_tree: RStarTree = RStarTree::new(query.clone(), TreeParams::default()).unwrap();
    group.throughput(Throughput::Elements(query.len() as u64));

    group.bench_function("single_rtree", |b| {
        b.iter(|| black_box(single_tree_knn(&rtree, &query, 5).unwrap()));
    });
    group.bench_function("single_rstar", |b| {
        b.iter(|| black_box(single_tree_knn(&rstar, &query, 5).unwrap()));
    });
    group.bench_function("dual_rstar", |b| {
        b.iter(|| black_box(dual_tree_knn(&rstar, &query_tree, 5).unwrap()));
    });
    group.finish();
}

criterion_group!(benches, bench_tree_build, bench_update_churn, bench_knn);
criterion_main!(benches);
