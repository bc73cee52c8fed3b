// Copyright 2025 the Lineage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Partial layout of a vertex subset within a timepoint window.
//!
//! A context is the set of vertices some other view currently shows. The
//! builder pre-marks them with a reserved timestamp, marks their children just
//! outside the set as ghosts, and runs a partial pass from the context roots.
//! Everything else the traversal reaches becomes a truncated ghost leaf.

use core::ops::RangeInclusive;

use lineage_graph::{VertexId, ViewGraph};

use crate::engine::LayoutEngine;

#[derive(Clone, Debug, PartialEq, Eq)]
struct ContextKey {
    vertices: Vec<VertexId>,
    window: RangeInclusive<i32>,
    revision: u64,
}

/// Builds context layouts and skips rebuilding when nothing changed.
#[derive(Clone, Debug, Default)]
pub struct ContextLayout {
    previous: Option<ContextKey>,
}

impl ContextLayout {
    /// Create a builder with no previous context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the previous context so that the next build always runs.
    pub fn invalidate(&mut self) {
        self.previous = None;
    }

    /// Lay out `context` restricted to the timepoints in `window`.
    ///
    /// Roots are context vertices with no parent in the context, ordered by
    /// timepoint and then model id. Returns `false` without touching the engine
    /// if the context, the window and the graph revision are unchanged since
    /// the last build and `force` is not set.
    pub fn build(
        &mut self,
        engine: &mut LayoutEngine,
        graph: &ViewGraph,
        context: impl IntoIterator<Item = VertexId>,
        window: RangeInclusive<i32>,
        force: bool,
    ) -> bool {
        let mut vertices: Vec<VertexId> = context
            .into_iter()
            .filter(|&v| {
                graph
                    .vertex(v)
                    .is_some_and(|v| window.contains(&v.timepoint()))
            })
            .collect();
        vertices.sort_unstable();
        vertices.dedup();

        let key = ContextKey {
            vertices,
            window,
            revision: graph.revision(),
        };
        if !force && self.previous.as_ref() == Some(&key) {
            return false;
        }

        let ghost_mark = engine.reserve_timestamp();
        let mark = engine.reserve_timestamp();
        for &v in &key.vertices {
            engine.stamp(v, mark);
        }
        for &v in &key.vertices {
            let Some(vertex) = graph.vertex(v) else {
                continue;
            };
            for child in vertex.children() {
                if engine.stamp_of(child) != Some(mark) {
                    engine.stamp(child, ghost_mark);
                }
            }
        }

        let mut roots: Vec<(i32, _, VertexId)> = key
            .vertices
            .iter()
            .filter_map(|&v| {
                let vertex = graph.vertex(v)?;
                let has_context_parent = vertex
                    .parents()
                    .any(|p| engine.stamp_of(p) == Some(mark));
                (!has_context_parent).then(|| (vertex.timepoint(), vertex.model_id(), v))
            })
            .collect();
        roots.sort_unstable_by_key(|&(t, m, _)| (t, m));
        let roots: Vec<VertexId> = roots.into_iter().map(|(_, _, v)| v).collect();

        tracing::debug!(
            context = key.vertices.len(),
            roots = roots.len(),
            first = key.window.start(),
            last = key.window.end(),
            "context layout"
        );
        engine.layout_roots(graph, &roots, Some(mark));
        self.previous = Some(key);
        true
    }
}
