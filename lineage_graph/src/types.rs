// Copyright 2025 the Lineage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Identifiers: model-side ids and view-side arena handles.

/// Unique id of a vertex in the model graph.
///
/// Assigned by the model; the view graph only ever uses it as a lookup key.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ModelVertexId(pub u64);

/// Unique id of an edge in the model graph.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ModelEdgeId(pub u64);

/// Handle to a vertex in a [`ViewGraph`](crate::ViewGraph).
///
/// A small, copyable handle made of a slot index and a generation counter.
///
/// ## Semantics
///
/// - On insert, a fresh slot is allocated with generation `1`.
/// - On remove, the slot is freed; any `VertexId` that pointed to it is now stale.
/// - On reuse of a freed slot, its generation is incremented, producing a new, distinct `VertexId`.
///
/// Handles must not be retained across removal of the vertex they refer to.
/// Stale handles never alias a different live vertex because the generation must match,
/// so [`ViewGraph::is_alive`](crate::ViewGraph::is_alive) and all accessors report them as absent.
///
/// The derived order (slot, then generation) is only used for deterministic iteration.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct VertexId(pub(crate) u32, pub(crate) u32);

impl VertexId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    /// Dense slot index, suitable for keying side tables sized by
    /// [`ViewGraph::slot_capacity`](crate::ViewGraph::slot_capacity).
    pub const fn slot(self) -> usize {
        self.0 as usize
    }

    /// Generation of the slot at the time this handle was issued.
    pub const fn generation(self) -> u32 {
        self.1
    }
}

/// Handle to an edge in a [`ViewGraph`](crate::ViewGraph).
///
/// Same slot/generation semantics as [`VertexId`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct EdgeId(pub(crate) u32, pub(crate) u32);

impl EdgeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    /// Dense slot index.
    pub const fn slot(self) -> usize {
        self.0 as usize
    }

    /// Generation of the slot at the time this handle was issued.
    pub const fn generation(self) -> u32 {
        self.1
    }
}
