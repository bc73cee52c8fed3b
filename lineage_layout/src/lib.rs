// Copyright 2025 the Lineage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lineage Layout: tree layout and spatial indexing for lineage graphs.
//!
//! The [`LayoutEngine`] assigns every reachable vertex of a
//! [`ViewGraph`](lineage_graph::ViewGraph) a layout X coordinate; Y is the
//! vertex timepoint. The pass is an iterative depth-first traversal:
//!
//! - leaves are packed left to right at `0, 1, 2, …` in traversal order,
//! - a parent sits at the midpoint of its first and last laid-out child,
//! - a vertex reached a second time (a merge) is not traversed again,
//! - a partial pass with a mark ghosts and truncates vertices that were not
//!   pre-marked, which is how [`ContextLayout`] lays out a bounded window.
//!
//! Each pass fills a [`VertexTable`]: per-timepoint rows sorted by X that
//! answer predecessor, nearest-point, rectangle and density queries.
//!
//! # Example
//!
//! ```rust
//! use lineage_graph::{SimpleModel, ViewGraph};
//! use lineage_layout::LayoutEngine;
//!
//! let mut model = SimpleModel::new();
//! let a = model.add_vertex("A", 0);
//! let b = model.add_vertex("B", 1);
//! let c = model.add_vertex("C", 1);
//! model.add_edge(a, b).unwrap();
//! model.add_edge(a, c).unwrap();
//!
//! let graph = ViewGraph::from_model(&model);
//! let mut engine = LayoutEngine::new();
//! engine.layout(&graph, &model);
//!
//! let x = |id| engine.layout_x(graph.vertex_for_model(id).unwrap()).unwrap();
//! assert_eq!((x(b), x(c), x(a)), (0.0, 1.0, 0.5));
//! ```

mod context;
mod engine;
mod navigation;
mod table;

pub use context::ContextLayout;
pub use engine::{Column, LayoutEngine, LayoutListener, LayoutPass};
pub use table::{Closest, DenseRange, MIN_SUBDIVISION, RowEntry, TimepointRow, VertexTable};
