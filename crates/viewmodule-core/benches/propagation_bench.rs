//! Benchmarks for dependency propagation and validation.
//!
//! Run with: cargo bench -p viewmodule-core

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use viewmodule_core::{
    DependencyGraph, DependencyGraphBuilder, PropertyName, ViewModelBuilder, max_length,
    not_blank, not_equal,
};

/// `n` distinct names. Leaked: benchmarks build a handful of these per run.
fn names(n: usize) -> Vec<PropertyName> {
    (0..n)
        .map(|i| PropertyName::new(Box::leak(format!("p{i}").into_boxed_str())))
        .collect()
}

/// Layered lattice: every node depends on the two nodes of the previous layer
/// closest to it, so a change at the root fans out through many diamonds.
fn lattice(names: &[PropertyName], width: usize) -> DependencyGraphBuilder {
    let mut builder = DependencyGraphBuilder::new();
    for (i, &name) in names.iter().enumerate() {
        builder.declare(name);
        if i >= width {
            let prev = i - width;
            builder.add_dependency(name, names[prev]).unwrap();
            if (prev + 1) % width != 0 && prev + 1 < i {
                builder.add_dependency(name, names[prev + 1]).unwrap();
            }
        }
    }
    builder
}

fn bench_graph_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph/build");
    for n in [16, 64, 256] {
        let ns = names(n);
        group.bench_with_input(BenchmarkId::new("lattice", n), &ns, |b, ns| {
            b.iter(|| black_box(lattice(ns, 4).build()))
        });
    }
    group.finish();
}

fn bench_graph_notify(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph/notify");
    for n in [16, 64, 256] {
        let ns = names(n);
        let graph: DependencyGraph = lattice(&ns, 4).build();
        group.bench_with_input(BenchmarkId::new("from_root", n), &graph, |b, graph| {
            b.iter(|| {
                let mut count = 0usize;
                graph.notify(ns[0], |_| count += 1);
                black_box(count)
            })
        });
    }
    group.finish();
}

fn bench_viewmodel_set(c: &mut Criterion) {
    const FIRST: PropertyName = PropertyName::new("first");
    const LAST: PropertyName = PropertyName::new("last");
    const FULL: PropertyName = PropertyName::new("full");
    const LENGTH: PropertyName = PropertyName::new("length");

    let mut b = ViewModelBuilder::new();
    let first = b.backing_validated(
        FIRST,
        String::from("Anton"),
        not_blank().then(not_equal("Foo")).then(max_length(32)),
    );
    let _last = b.backing_validated(LAST, String::from("Tcholakov"), not_blank());
    b.property(FULL).property(LENGTH);
    b.depends_on(FULL, &[FIRST, LAST]).unwrap();
    b.depends_on(LENGTH, &[FULL]).unwrap();
    let vm = b.build().unwrap();
    let _sub = vm.subscribe_property_changed(|name| {
        black_box(name);
    });

    let mut flip = false;
    c.bench_function("viewmodel/set_first", |bench| {
        bench.iter(|| {
            flip = !flip;
            first.set(if flip { "Bob" } else { "Anton" }.to_string())
        })
    });
}

criterion_group!(
    benches,
    bench_graph_build,
    bench_graph_notify,
    bench_viewmodel_set
);
criterion_main!(benches);
