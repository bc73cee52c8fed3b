// Copyright 2025 the Lineage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use lineage_graph::{ModelVertexId, SimpleModel, ViewGraph};
use lineage_layout::{ContextLayout, LayoutEngine};

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f64(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) / ((1u64 << 53) as f64)
    }
}

fn gen_chain(len: usize) -> SimpleModel {
    let mut model = SimpleModel::new();
    let mut prev = model.add_vertex("root", 0);
    for t in 1..len {
        let v = model.add_vertex(format!("v{t}"), t as i32);
        model.add_edge(prev, v);
        prev = v;
    }
    model
}

fn gen_binary(depth: u32) -> SimpleModel {
    let mut model = SimpleModel::new();
    let mut level = vec![model.add_vertex("root", 0)];
    for t in 1..=depth {
        let mut next = Vec::with_capacity(level.len() * 2);
        for &parent in &level {
            for _ in 0..2 {
                let v = model.add_vertex(format!("v{}", next.len()), t as i32);
                model.add_edge(parent, v);
                next.push(v);
            }
        }
        level = next;
    }
    model
}

/// Many tracks over `timepoints` frames: each alive track divides, ends or
/// continues at every step.
fn gen_tracks(roots: usize, timepoints: i32, seed: u64) -> SimpleModel {
    let mut rng = Rng::new(seed);
    let mut model = SimpleModel::new();
    let mut alive: Vec<ModelVertexId> = (0..roots)
        .map(|i| model.add_vertex(format!("track{i}"), 0))
        .collect();
    for t in 1..timepoints {
        let mut next = Vec::with_capacity(alive.len() + alive.len() / 8);
        for &parent in &alive {
            let r = rng.next_f64();
            let children = if r < 0.02 {
                0
            } else if r < 0.06 {
                2
            } else {
                1
            };
            for _ in 0..children {
                let v = model.add_vertex("", t);
                model.add_edge(parent, v);
                next.push(v);
            }
        }
        alive = next;
    }
    model
}

fn bench_full_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout_full");
    let cases = [
        ("chain_100k", gen_chain(100_000)),
        ("binary_d16", gen_binary(16)),
        ("tracks_200x500", gen_tracks(200, 500, 0x5eed)),
    ];
    for (name, model) in &cases {
        let graph = ViewGraph::from_model(model);
        group.throughput(Throughput::Elements(graph.vertex_count() as u64));
        group.bench_function(*name, |b| {
            let mut engine = LayoutEngine::new();
            b.iter(|| {
                engine.layout(&graph, model);
                black_box(engine.current_max_x());
            });
        });
    }
    group.finish();
}

fn bench_context_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout_context");
    let model = gen_tracks(200, 500, 0xc0ffee);
    let graph = ViewGraph::from_model(&model);
    let window = 200..=260;
    let context: Vec<_> = graph
        .vertices()
        .filter(|v| window.contains(&v.timepoint()) && v.model_id().0 % 3 == 0)
        .map(|v| v.id())
        .collect();
    group.throughput(Throughput::Elements(context.len() as u64));
    group.bench_function("tracks_window_60", |b| {
        b.iter_batched(
            || (LayoutEngine::new(), ContextLayout::new()),
            |(mut engine, mut ctx)| {
                ctx.build(
                    &mut engine,
                    &graph,
                    context.iter().copied(),
                    window.clone(),
                    true,
                );
                black_box(engine.table().len());
            },
            BatchSize::LargeInput,
        )
    });
    group.finish();
}

fn bench_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("view_graph");
    let model = gen_tracks(200, 500, 7);
    group.throughput(Throughput::Elements(model.vertex_count() as u64));
    group.bench_function("rebuild_tracks_200x500", |b| {
        let mut graph = ViewGraph::new();
        b.iter(|| {
            graph.rebuild(&model);
            black_box(graph.root_count());
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_full_layout,
    bench_context_layout,
    bench_rebuild
);
criterion_main!(benches);
