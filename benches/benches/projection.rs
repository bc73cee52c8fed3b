// Copyright 2025 the Lineage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::sync::Arc;

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::{Rect, Vec2};
use lineage_graph::{ModelVertexId, SimpleModel, ViewGraph};
use lineage_layout::LayoutEngine;
use lineage_view::{
    Interpolator, NoSelection, Projector, Scene, ScreenTransform, UniformColors, ViewOptions,
};

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

fn gen_tracks(roots: usize, timepoints: i32, seed: u64) -> SimpleModel {
    let mut rng = Rng::new(seed);
    let mut model = SimpleModel::new();
    let mut alive: Vec<ModelVertexId> = (0..roots)
        .map(|i| model.add_vertex(format!("track{i}"), 0))
        .collect();
    for t in 1..timepoints {
        let mut next = Vec::with_capacity(alive.len());
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

struct Fixture {
    model: SimpleModel,
    graph: ViewGraph,
    engine: LayoutEngine,
}

impl Fixture {
    fn new() -> Self {
        let model = gen_tracks(500, 400, 0x1234);
        let graph = ViewGraph::from_model(&model);
        let mut engine = LayoutEngine::new();
        engine.layout(&graph, &model);
        Self {
            model,
            graph,
            engine,
        }
    }

    fn scene(&self) -> Scene<'_> {
        Scene {
            graph: &self.graph,
            model: &self.model,
            layout: &self.engine,
            selection: &NoSelection,
            colors: &UniformColors::DEFAULT,
        }
    }

    fn overview(&self) -> ScreenTransform {
        let width = self.engine.current_max_x() + 1.0;
        ScreenTransform::new(Rect::new(-0.5, -0.5, width, 400.0), 1600, 1000)
    }

    fn close_up(&self) -> ScreenTransform {
        ScreenTransform::new(Rect::new(100.0, 180.0, 140.0, 210.0), 1600, 1000)
    }
}

fn bench_project(c: &mut Criterion) {
    let fx = Fixture::new();
    let mut group = c.benchmark_group("project");
    group.throughput(Throughput::Elements(fx.graph.vertex_count() as u64));
    for (name, transform) in [("overview", fx.overview()), ("close_up", fx.close_up())] {
        group.bench_function(name, |b| {
            let mut projector = Projector::new(&ViewOptions::default());
            let scene = fx.scene();
            b.iter(|| {
                let frame = projector.project(&scene, &transform, Vec2::ZERO);
                black_box(frame.vertices().len() + frame.ranges().len());
            });
        });
    }
    group.finish();
}

fn bench_interpolate(c: &mut Criterion) {
    let fx = Fixture::new();
    let mut projector = Projector::new(&ViewOptions::default());
    let scene = fx.scene();
    let start = Arc::new(projector.project(&scene, &fx.close_up(), Vec2::ZERO));
    let mut shifted = fx.close_up();
    shifted.shift_layout(Vec2::new(5.0, 3.0));
    let end = Arc::new(projector.project(&scene, &shifted, Vec2::ZERO));

    let mut group = c.benchmark_group("interpolate");
    group.throughput(Throughput::Elements(end.vertices().len() as u64));
    group.bench_function("close_up_pan", |b| {
        let ip = Interpolator::new(start.clone(), end.clone());
        let mut ratio = 0.0;
        b.iter(|| {
            ratio = (ratio + 0.01) % 1.0;
            black_box(ip.interpolate(ratio).vertices().len());
        });
    });
    group.finish();
}

criterion_group!(benches, bench_project, bench_interpolate);
criterion_main!(benches);
