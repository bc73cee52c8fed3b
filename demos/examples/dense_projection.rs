// Copyright 2025 the Lineage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dense projection.
//!
//! Project a wide lineage at several zoom levels and show how runs of
//! vertices too close to draw individually collapse into ranges.
//!
//! Run:
//! - `cargo run -p lineage_demos --example dense_projection`

use kurbo::{Rect, Vec2};
use lineage_graph::{SimpleModel, ViewGraph};
use lineage_layout::LayoutEngine;
use lineage_view::{NoSelection, Projector, Scene, ScreenTransform, UniformColors, ViewOptions};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // One root at t=0 with 20k children at t=1, each continuing to t=2.
    let mut model = SimpleModel::new();
    let root = model.add_vertex("root", 0);
    for i in 0..20_000 {
        let child = model.add_vertex(format!("c{i}"), 1);
        model.add_edge(root, child).unwrap();
        let grandchild = model.add_vertex(format!("g{i}"), 2);
        model.add_edge(child, grandchild).unwrap();
    }
    let graph = ViewGraph::from_model(&model);
    let mut engine = LayoutEngine::new();
    engine.layout(&graph, &model);

    let scene = Scene {
        graph: &graph,
        model: &model,
        layout: &engine,
        selection: &NoSelection,
        colors: &UniformColors::DEFAULT,
    };
    let mut projector = Projector::new(&ViewOptions::default());
    let right = engine.current_max_x();
    for visible in [right + 1.0, 2000.0, 200.0, 20.0] {
        let center = right / 2.0;
        let transform = ScreenTransform::new(
            Rect::new(center - visible / 2.0, -0.5, center + visible / 2.0, 2.5),
            1200,
            400,
        );
        let frame = projector.project(&scene, &transform, Vec2::ZERO);
        println!(
            "{visible:>8} units wide: {:>5} vertices, {:>5} edges, {:>3} ranges",
            frame.vertices().len(),
            frame.edges().len(),
            frame.ranges().len()
        );
    }
}
