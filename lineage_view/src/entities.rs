// Copyright 2025 the Lineage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Renderable per-frame entities and the snapshot bundling them.

use kurbo::{Rect, Vec2};
use lineage_graph::{EdgeId, ModelEdgeId, ModelVertexId, VertexId};

use crate::transform::ScreenTransform;

bitflags::bitflags! {
    /// Render state of a screen vertex or edge.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct EntityFlags: u8 {
        /// Part of the current selection.
        const SELECTED = 0b0000_0001;
        /// Placeholder from a partial layout.
        const GHOST    = 0b0000_0010;
        /// De-emphasized by the highlight state.
        const FADED    = 0b0000_0100;
    }
}

/// Animation state of an entity in an interpolated snapshot.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Transition {
    /// Present in both snapshots with unchanged selection.
    #[default]
    None,
    /// Only present in the end snapshot.
    Appear,
    /// Only present in the start snapshot.
    Disappear,
    /// Becoming selected.
    Selecting,
    /// Becoming unselected.
    Deselecting,
}

/// A vertex to draw.
#[derive(Clone, Debug, PartialEq)]
pub struct ScreenVertex {
    /// View vertex this was projected from. May be stale for disappearing vertices.
    pub vertex: VertexId,
    /// Model vertex, the identity used to match vertices across snapshots.
    pub model_id: ModelVertexId,
    /// Display label.
    pub label: String,
    /// Screen X, including the decoration offset.
    pub x: f64,
    /// Screen Y, including the decoration offset.
    pub y: f64,
    /// Distance in pixels to the nearest neighbour in the same row, used to size markers.
    pub vertex_dist: f64,
    /// Render state.
    pub flags: EntityFlags,
    /// Animation state.
    pub transition: Transition,
    /// Completion of the transition in `[0, 1]`.
    pub interpolation_ratio: f64,
    /// Packed `0xAARRGGBB` color.
    pub color: u32,
}

/// An edge to draw between two screen vertices of the same snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct ScreenEdge {
    /// View edge this was projected from.
    pub edge: EdgeId,
    /// Model edge.
    pub model_id: ModelEdgeId,
    /// Index of the source in the snapshot's vertex list.
    pub source: usize,
    /// Index of the target in the snapshot's vertex list.
    pub target: usize,
    /// Render state.
    pub flags: EntityFlags,
    /// Animation state.
    pub transition: Transition,
    /// Completion of the transition in `[0, 1]`.
    pub interpolation_ratio: f64,
    /// Packed `0xAARRGGBB` color.
    pub color: u32,
}

/// A run of vertices too dense to draw individually, as a screen rectangle.
///
/// The rectangle spans from the row above (`y0`) to the run's own row (`y1`),
/// covering the edges leading into the run.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScreenRange {
    /// Screen-space extent.
    pub rect: Rect,
}

/// Header of one layout column.
#[derive(Clone, Debug, PartialEq)]
pub struct ScreenColumn {
    /// Label of the column's root vertex.
    pub label: String,
    /// Left edge in screen X.
    pub left: f64,
    /// Width in pixels.
    pub width: f64,
}

/// Everything needed to draw one frame, plus the transform it was made with.
///
/// Snapshots are immutable once built. Vertex indices stored in
/// [`ScreenEdge`] are local to the snapshot and must not be compared across
/// snapshots; match vertices by [`ScreenVertex::model_id`] instead.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScreenEntities {
    pub(crate) vertices: Vec<ScreenVertex>,
    pub(crate) edges: Vec<ScreenEdge>,
    pub(crate) ranges: Vec<ScreenRange>,
    pub(crate) columns: Vec<ScreenColumn>,
    pub(crate) transform: ScreenTransform,
    pub(crate) offset: Vec2,
}

impl ScreenEntities {
    pub(crate) fn with_transform(transform: ScreenTransform, offset: Vec2) -> Self {
        Self {
            transform,
            offset,
            ..Self::default()
        }
    }

    /// Vertices to draw.
    pub fn vertices(&self) -> &[ScreenVertex] {
        &self.vertices
    }

    /// Edges to draw.
    pub fn edges(&self) -> &[ScreenEdge] {
        &self.edges
    }

    /// Dense ranges to draw.
    pub fn ranges(&self) -> &[ScreenRange] {
        &self.ranges
    }

    /// Column headers to draw.
    pub fn columns(&self) -> &[ScreenColumn] {
        &self.columns
    }

    /// Transform this snapshot was made with.
    pub fn transform(&self) -> &ScreenTransform {
        &self.transform
    }

    /// Decoration offset included in every coordinate.
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    /// Returns true if there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.ranges.is_empty() && self.columns.is_empty()
    }

    /// Screen vertex mirroring a model vertex, if it is part of this snapshot.
    ///
    /// Linear scan; meant for lookups of a few vertices, not per-frame loops.
    pub fn vertex_by_model(&self, id: ModelVertexId) -> Option<&ScreenVertex> {
        self.vertices.iter().find(|v| v.model_id == id)
    }
}
