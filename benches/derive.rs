use criterion::{criterion_group, criterion_main, Criterion};
use quiver::{Graph, Orientation, RmatConfig};

/// An RMAT graph stripped back to its forward orientation, so each bench
/// iteration pays for exactly one derivation pass.
fn forward_only(scale: u32) -> Graph {
    let mut graph = Graph::new(false);
    graph
        .generate_rmat(&RmatConfig {
            scale,
            edge_factor: 0.02,
            seed: Some(7),
            ..Default::default()
        })
        .expect("generate");
    let mut edges = Vec::new();
    for v in 0..graph.vertex_count() as u32 {
        for &target in graph.neighbor_slice(v, Orientation::Forward).expect("vertex") {
            edges.push((v, target));
        }
    }
    Graph::from_edges(graph.vertex_count(), &edges, false).expect("edges")
}

fn bench_derivations(c: &mut Criterion) {
    let base = forward_only(10);

    c.bench_function("derive_reverse", |b| {
        b.iter(|| {
            let mut graph = base.clone();
            graph.materialize(Orientation::Reverse);
            graph
        })
    });

    c.bench_function("derive_intersection", |b| {
        b.iter(|| {
            let mut graph = base.clone();
            graph.materialize(Orientation::Intersection);
            graph
        })
    });

    c.bench_function("derive_union", |b| {
        b.iter(|| {
            let mut graph = base.clone();
            graph.materialize(Orientation::Reverse);
            graph.materialize(Orientation::Union);
            graph
        })
    });

    c.bench_function("rmat_scale_8", |b| {
        b.iter(|| {
            let mut graph = Graph::new(false);
            graph
                .generate_rmat(&RmatConfig {
                    scale: 8,
                    edge_factor: 0.02,
                    seed: Some(11),
                    ..Default::default()
                })
                .expect("generate");
            graph
        })
    });
}

criterion_group!(benches, bench_derivations);
criterion_main!(benches);
