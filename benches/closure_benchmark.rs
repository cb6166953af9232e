//! Benchmarks for derived relations and subgraph extraction on large BOMs.
//!
//! Run with: cargo bench --bench closure_benchmark

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use bom_tools::derive::DerivedRelations;
use bom_tools::extract::{extract_subgraph, ExtractOptions};
use bom_tools::model::EdgeSet;
use std::hint::black_box;

/// Balanced tree with `fanout` children per assembly, plus a shared
/// fastener used by every leaf assembly.
fn generate_tree(depth: usize, fanout: usize) -> EdgeSet {
    let mut edges = EdgeSet::new();
    let mut level = vec!["P".to_string()];
    for _ in 0..depth {
        let mut next = Vec::with_capacity(level.len() * fanout);
        for parent in &level {
            for i in 0..fanout {
                let child = format!("{parent}.{i}");
                edges.insert(parent, &child);
                next.push(child);
            }
        }
        level = next;
    }
    for leaf in &level {
        edges.insert(leaf, "FASTENER");
    }
    edges
}

/// Tree with back edges from every leaf to the root, collapsing the whole
/// graph into one strongly connected component.
fn generate_cyclic(depth: usize, fanout: usize) -> EdgeSet {
    let mut edges = generate_tree(depth, fanout);
    edges.insert("FASTENER", "P");
    edges
}

fn bench_closure(c: &mut Criterion) {
    let mut group = c.benchmark_group("closure");
    group.sample_size(20);

    for (depth, fanout) in [(4, 4), (5, 4), (4, 8)] {
        let edges = generate_tree(depth, fanout);
        group.bench_with_input(
            BenchmarkId::new("tree", format!("{}edges", edges.len())),
            &edges,
            |b, edges| b.iter(|| DerivedRelations::build(black_box(edges))),
        );
    }

    let cyclic = generate_cyclic(4, 4);
    group.bench_with_input(
        BenchmarkId::new("cyclic", format!("{}edges", cyclic.len())),
        &cyclic,
        |b, edges| b.iter(|| DerivedRelations::build(black_box(edges))),
    );

    group.finish();
}

fn bench_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract");
    let edges = generate_tree(6, 4);

    for max_depth in [2, 4, 6] {
        let options = ExtractOptions {
            max_depth: Some(max_depth),
            max_children: None,
        };
        group.bench_with_input(BenchmarkId::new("depth", max_depth), &options, |b, options| {
            b.iter(|| extract_subgraph(black_box(&edges), "P", options));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_closure, bench_extract);
criterion_main!(benches);
