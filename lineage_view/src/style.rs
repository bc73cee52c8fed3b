// Copyright 2025 the Lineage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Selection, highlight and color inputs of the projection.
//!
//! Which entities are selected or faded is decided elsewhere; projection only
//! reads that state through [`SelectionModel`] and colors through
//! [`ColorScheme`].

use std::collections::HashSet;

use lineage_graph::{ModelEdgeId, ModelVertexId};

/// Read-only view of the selection and highlight state.
pub trait SelectionModel {
    /// Returns true if the vertex is selected.
    fn is_vertex_selected(&self, id: ModelVertexId) -> bool;

    /// Returns true if the edge is selected.
    fn is_edge_selected(&self, id: ModelEdgeId) -> bool;

    /// Returns true if the vertex should be drawn de-emphasized.
    fn is_vertex_faded(&self, _id: ModelVertexId) -> bool {
        false
    }

    /// Returns true if the edge should be drawn de-emphasized.
    fn is_edge_faded(&self, _id: ModelEdgeId) -> bool {
        false
    }
}

/// Nothing selected, nothing faded.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoSelection;

impl SelectionModel for NoSelection {
    fn is_vertex_selected(&self, _id: ModelVertexId) -> bool {
        false
    }

    fn is_edge_selected(&self, _id: ModelEdgeId) -> bool {
        false
    }
}

/// A plain set-backed selection with an optional focus set.
///
/// When the focus set is non-empty, everything outside it is faded.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    vertices: HashSet<ModelVertexId>,
    edges: HashSet<ModelEdgeId>,
    focus: HashSet<ModelVertexId>,
}

impl Selection {
    /// Create an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Select or deselect a vertex. Returns true if the state changed.
    pub fn set_vertex(&mut self, id: ModelVertexId, selected: bool) -> bool {
        if selected {
            self.vertices.insert(id)
        } else {
            self.vertices.remove(&id)
        }
    }

    /// Select or deselect an edge. Returns true if the state changed.
    pub fn set_edge(&mut self, id: ModelEdgeId, selected: bool) -> bool {
        if selected {
            self.edges.insert(id)
        } else {
            self.edges.remove(&id)
        }
    }

    /// Replace the focus set.
    pub fn set_focus(&mut self, focus: impl IntoIterator<Item = ModelVertexId>) {
        self.focus = focus.into_iter().collect();
    }

    /// Deselect everything and drop the focus.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.edges.clear();
        self.focus.clear();
    }
}

impl SelectionModel for Selection {
    fn is_vertex_selected(&self, id: ModelVertexId) -> bool {
        self.vertices.contains(&id)
    }

    fn is_edge_selected(&self, id: ModelEdgeId) -> bool {
        self.edges.contains(&id)
    }

    fn is_vertex_faded(&self, id: ModelVertexId) -> bool {
        !self.focus.is_empty() && !self.focus.contains(&id)
    }
}

/// Per-entity colors, packed as `0xAARRGGBB`.
pub trait ColorScheme {
    /// Color of a vertex.
    fn vertex_color(&self, id: ModelVertexId) -> u32;

    /// Color of an edge between two vertices.
    fn edge_color(&self, id: ModelEdgeId, source: ModelVertexId, target: ModelVertexId) -> u32;
}

/// The same color for every vertex and every edge.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct UniformColors {
    /// Vertex color.
    pub vertex: u32,
    /// Edge color.
    pub edge: u32,
}

impl UniformColors {
    /// Black vertices, grey edges.
    pub const DEFAULT: Self = Self {
        vertex: 0xFF00_0000,
        edge: 0xFF80_8080,
    };
}

impl Default for UniformColors {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl ColorScheme for UniformColors {
    fn vertex_color(&self, _id: ModelVertexId) -> u32 {
        self.vertex
    }

    fn edge_color(&self, _id: ModelEdgeId, _source: ModelVertexId, _target: ModelVertexId) -> u32 {
        self.edge
    }
}
