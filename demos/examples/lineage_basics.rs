// Copyright 2025 the Lineage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lineage basics.
//!
//! Mirror a small model graph, lay it out, walk it with keyboard-style
//! navigation, then re-layout a context window and apply live edits.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p lineage_demos --example lineage_basics`

use kurbo::Point;
use lineage_graph::{ModelGraph, SimpleModel, ViewGraph};
use lineage_layout::{ContextLayout, LayoutEngine, LayoutPass};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // A0 divides into B1 and C1; B1 divides again; C1 continues.
    let mut model = SimpleModel::new();
    let a0 = model.add_vertex("A", 0);
    let b1 = model.add_vertex("A.1", 1);
    let c1 = model.add_vertex("A.2", 1);
    let b2 = model.add_vertex("A.1.1", 2);
    let b3 = model.add_vertex("A.1.2", 2);
    let c2 = model.add_vertex("A.2", 2);
    let z0 = model.add_vertex("Z", 0);
    for (s, t) in [(a0, b1), (a0, c1), (b1, b2), (b1, b3), (c1, c2)] {
        model.add_edge(s, t).unwrap();
    }

    let mut graph = ViewGraph::from_model(&model);
    // Drop the creation events: the graph was built from the model's current state.
    model.take_changes();

    let mut engine = LayoutEngine::new();
    engine.add_listener(|pass: &LayoutPass| {
        println!(
            "pass {}: {} vertices in {} columns, x in [{}, {}]",
            pass.timestamp, pass.vertices, pass.columns, pass.min_x, pass.max_x
        );
    });
    engine.layout(&graph, &model);

    for (t, row) in engine.table().rows() {
        let labels: Vec<String> = row
            .entries()
            .iter()
            .map(|e| {
                let label = graph
                    .vertex(e.key)
                    .and_then(|v| model.label(v.model_id()))
                    .unwrap_or("?");
                format!("{label}@{}", e.x)
            })
            .collect();
        println!("t={t}: {}", labels.join("  "));
    }
    for column in engine.columns() {
        println!("column [{}, {}) rooted at {:?}", column.left, column.right, column.root);
    }

    // Navigate from the root down the first branch.
    let mut at = graph.vertex_for_model(a0).unwrap();
    while let Some(next) = engine.first_active_child(&graph, at) {
        at = next;
    }
    let leaf = graph.vertex(at).unwrap().model_id();
    println!("first leaf below A: {}", model.label(leaf).unwrap_or("?"));
    assert_eq!(leaf, b2);
    let right = engine.right_sibling(&graph, at).unwrap();
    assert_eq!(graph.vertex(right).unwrap().model_id(), b3);

    // Nearest vertex to a point between the rows, timepoints weighted like X.
    let hit = engine.closest_active_vertex(Point::new(1.9, 1.6), 1.0).unwrap();
    println!("closest to (1.9, 1.6): {:?} at x={}", hit.key, hit.x);

    // Context layout: just the A.1 branch within timepoints 1..=2.
    let context = [b1, b2].map(|m| graph.vertex_for_model(m).unwrap());
    let mut ctx = ContextLayout::new();
    assert!(ctx.build(&mut engine, &graph, context, 1..=2, false));
    assert!(!ctx.build(&mut engine, &graph, context, 1..=2, false));
    for v in engine.table().rows().flat_map(|(_, r)| r.entries()) {
        let ghost = if engine.is_ghost(v.key) { " (ghost)" } else { "" };
        println!("context: {:?} x={}{ghost}", v.key, v.x);
    }

    // Live edits: Z gains a child, A.2 at t=2 is removed.
    let z1 = model.add_vertex("Z.1", 1);
    model.add_edge(z0, z1).unwrap();
    model.remove_vertex(c2);
    let changes = model.take_changes();
    graph.apply_all(&model, &changes);
    engine.layout(&graph, &model);
    println!(
        "after {} edits: {} vertices, {} roots, revision {}",
        changes.len(),
        graph.vertex_count(),
        graph.root_count(),
        graph.revision()
    );
    assert!(graph.vertex_for_model(c2).is_none());
}
