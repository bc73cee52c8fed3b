// Copyright 2025 the Lineage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lineage Graph: an arena-pooled mirror of a lineage model graph.
//!
//! A lineage graph records tracked objects (vertices, each at a timepoint) and
//! their parent → child relations (edges). The authoritative copy lives in an
//! external model; this crate keeps a compact, densely indexed [`ViewGraph`] in
//! sync with it so that layout and projection never touch model objects.
//!
//! - The model is read through the [`ModelGraph`] trait.
//! - Structural changes arrive as [`GraphChange`] events and are replayed with
//!   [`ViewGraph::apply`]. The view graph has no editing API of its own.
//! - Vertices and edges are addressed by generational [`VertexId`] / [`EdgeId`]
//!   handles; freed slots are recycled.
//! - The root set (vertices without incoming edges) is maintained incrementally.
//!
//! # Example
//!
//! ```rust
//! use lineage_graph::{SimpleModel, ViewGraph};
//!
//! let mut model = SimpleModel::new();
//! let a = model.add_vertex("A", 0);
//! let b = model.add_vertex("B", 1);
//! let ab = model.add_edge(a, b).unwrap();
//!
//! let mut graph = ViewGraph::new();
//! let changes = model.take_changes();
//! graph.apply_all(&model, &changes);
//! let vb = graph.vertex_for_model(b).unwrap();
//! assert!(!graph.is_root(vb));
//!
//! model.remove_edge(ab);
//! let changes = model.take_changes();
//! graph.apply_all(&model, &changes);
//! assert!(graph.is_root(vb));
//! ```
//!
//! For cross-thread use wrap the graph with [`ViewGraph::into_shared`]: model
//! callbacks take the write lock, layout and projection take read locks.

mod arena;
mod graph;
mod model;
mod types;

pub use graph::{EdgeList, EdgeRef, SharedViewGraph, VertexRef, ViewGraph};
pub use model::{GraphChange, ModelEdge, ModelGraph, ModelVertex, SimpleModel};
pub use types::{EdgeId, ModelEdgeId, ModelVertexId, VertexId};
