// Copyright 2025 the Lineage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Animated view.
//!
//! A producer thread grows a lineage while the view thread paints frames and
//! hands them to a painter thread through the snapshot exchange.
//!
//! Run:
//! - `RUST_LOG=lineage_view=trace cargo run -p lineage_demos --example animated_view`

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use kurbo::{Point, Vec2};
use lineage_graph::{ModelGraph, ModelVertexId, SimpleModel, ViewGraph};
use lineage_view::{Direction, LineageView, Selection, UniformColors, ViewOptions};
use parking_lot::RwLock;

const OPTIONS: &str = r#"{
    "animation_duration_ms": 120,
    "min_column_width": 20.0,
    "decoration_offset_y": 16.0
}"#;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let options: ViewOptions = serde_json::from_str(OPTIONS).expect("valid options");
    println!("options: {}", serde_json::to_string(&options).expect("serializable"));

    let model = Arc::new(RwLock::new(SimpleModel::new()));
    let root = model.write().add_vertex("root", 0);
    let graph = ViewGraph::from_model(&*model.read()).into_shared();
    model.write().take_changes();

    let mut view = LineageView::new(options, 800, 600, Instant::now()).expect("valid options");
    let exchange = view.exchange();
    let done = Arc::new(AtomicBool::new(false));

    // Grows every leaf by one timepoint, dividing every third one.
    let producer = {
        let (model, graph, done) = (model.clone(), graph.clone(), done.clone());
        thread::spawn(move || {
            let mut leaves: Vec<ModelVertexId> = vec![root];
            for t in 1..=12 {
                let changes = {
                    let mut model = model.write();
                    let mut next = Vec::new();
                    for (i, &leaf) in leaves.iter().enumerate() {
                        let kids = if i % 3 == 0 { 2 } else { 1 };
                        for k in 0..kids {
                            let label = format!("{}.{k}", model.label(leaf).unwrap_or_default());
                            let child = model.add_vertex(label, t);
                            model.add_edge(leaf, child);
                            next.push(child);
                        }
                    }
                    leaves = next;
                    model.take_changes()
                };
                let model = model.read();
                graph.write().apply_all(&*model, &changes);
                drop(model);
                thread::sleep(Duration::from_millis(40));
            }
            done.store(true, Ordering::Release);
        })
    };

    // Only ever sees complete frames.
    let painter = {
        let (exchange, done) = (exchange.clone(), done.clone());
        thread::spawn(move || {
            let mut frames = 0_usize;
            let mut last = None;
            while !done.load(Ordering::Acquire) || exchange.has_pending() {
                let frame = exchange.take_latest();
                if last.as_ref().is_none_or(|l| !Arc::ptr_eq(l, &frame)) {
                    frames += 1;
                }
                last = Some(frame);
                thread::sleep(Duration::from_millis(8));
            }
            frames
        })
    };

    let colors = UniformColors::default();
    let selection = Selection::new();
    let mut seen_revision = graph.read().revision();
    while !done.load(Ordering::Acquire) || view.is_animating() {
        let now = Instant::now();
        let graph = graph.read();
        if graph.revision() != seen_revision {
            seen_revision = graph.revision();
            view.graph_changed();
            view.fit_to_layout();
        }
        let model = model.read();
        let frame = view.paint(&graph, &*model, &selection, &colors, now);
        tracing::info!(
            vertices = frame.vertices().len(),
            ranges = frame.ranges().len(),
            columns = frame.columns().len(),
            animating = view.is_animating(),
            "frame"
        );
        drop((model, graph));
        thread::sleep(Duration::from_millis(16));
    }
    producer.join().expect("producer thread");

    // Zoom into the middle of the screen and walk down from there.
    view.zoom(0.25, Point::new(400.0, 300.0));
    view.pan(Vec2::new(0.0, -50.0));
    let graph = graph.read();
    let mut path = Vec::new();
    while let Some(v) = view.navigate(&graph, Direction::Child) {
        path.push(v);
        if path.len() > 16 {
            break;
        }
    }
    println!("walked {} steps down from the center", path.len());
    if let Some(&v) = path.last() {
        let model = model.read();
        let frame = view.paint(&graph, &*model, &selection, &colors, Instant::now());
        let drawn = frame
            .vertices()
            .iter()
            .find(|s| s.vertex == v)
            .map(|s| Point::new(s.x, s.y));
        println!("focused vertex drawn at {drawn:?}");
    }
    println!(
        "{} vertices, painter saw {} distinct frames",
        graph.vertex_count(),
        painter.join().expect("painter thread")
    );
}
