// Copyright 2025 the Lineage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Keyboard-style navigation and point queries over the current layout.
//!
//! Everything here only sees vertices laid out by the current pass; absence is
//! reported as `None`, since navigation routinely probes past graph boundaries.

use kurbo::{Point, Rect};
use lineage_graph::{VertexId, ViewGraph};

use crate::engine::LayoutEngine;
use crate::table::Closest;

impl LayoutEngine {
    /// Target of the first outgoing edge that leads to an active vertex.
    pub fn first_active_child(&self, graph: &ViewGraph, vertex: VertexId) -> Option<VertexId> {
        graph
            .vertex(vertex)?
            .children()
            .find(|&c| self.is_active(c))
    }

    /// Source of the first incoming edge that comes from an active vertex.
    pub fn first_active_parent(&self, graph: &ViewGraph, vertex: VertexId) -> Option<VertexId> {
        graph
            .vertex(vertex)?
            .parents()
            .find(|&p| self.is_active(p))
    }

    /// The active vertex immediately left of `vertex` in its timepoint row.
    pub fn left_sibling(&self, graph: &ViewGraph, vertex: VertexId) -> Option<VertexId> {
        let (row, index) = self.row_position(graph, vertex)?;
        let row = self.table().row(row)?;
        row.get(index.checked_sub(1)?).map(|e| e.key)
    }

    /// The active vertex immediately right of `vertex` in its timepoint row.
    pub fn right_sibling(&self, graph: &ViewGraph, vertex: VertexId) -> Option<VertexId> {
        let (row, index) = self.row_position(graph, vertex)?;
        let row = self.table().row(row)?;
        row.get(index + 1).map(|e| e.key)
    }

    fn row_position(&self, graph: &ViewGraph, vertex: VertexId) -> Option<(i32, usize)> {
        let x = self.layout_x(vertex)?;
        let timepoint = graph.vertex(vertex)?.timepoint();
        let index = self.table().row(timepoint)?.position_of(vertex, x)?;
        Some((timepoint, index))
    }

    /// Active vertex closest to a layout point; see [`VertexTable::closest`](crate::VertexTable::closest).
    pub fn closest_active_vertex(&self, point: Point, aspect: f64) -> Option<Closest<VertexId>> {
        self.table().closest(point, aspect)
    }

    /// Active vertex inside `rect` closest to a layout point.
    pub fn closest_active_vertex_within(
        &self,
        rect: Rect,
        point: Point,
        aspect: f64,
    ) -> Option<Closest<VertexId>> {
        self.table().closest_within(rect, point, aspect)
    }

    /// Active vertices inside a layout rectangle.
    pub fn active_vertices_within(&self, rect: Rect) -> Vec<VertexId> {
        self.table().vertices_within(rect)
    }
}
