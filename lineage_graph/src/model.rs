// Copyright 2025 the Lineage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Upstream model interface: the capability the view graph mirrors, plus change events.
//!
//! The model graph is the authoritative store of tracked objects and their relations.
//! This crate never mutates it; it only reads ids, timepoints and labels, and replays the
//! [`GraphChange`] events the model emits.
//!
//! [`SimpleModel`] is a small in-memory implementation that records its own change events,
//! handy for tests, benchmarks and demos.

use crate::types::{ModelEdgeId, ModelVertexId};

/// A model vertex as seen by the view graph.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ModelVertex {
    /// Unique id.
    pub id: ModelVertexId,
    /// Frame index this object was observed at.
    pub timepoint: i32,
}

/// A model edge (parent → child relation).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ModelEdge {
    /// Unique id.
    pub id: ModelEdgeId,
    /// Parent vertex.
    pub source: ModelVertexId,
    /// Child vertex.
    pub target: ModelVertexId,
}

/// A structural change of the model graph, replayed into the view graph.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GraphChange {
    /// A vertex was created.
    VertexAdded(ModelVertex),
    /// A vertex was deleted. Edges still attached to it are detached as well.
    VertexRemoved(ModelVertexId),
    /// An edge was created. Both endpoints must already exist.
    EdgeAdded(ModelEdge),
    /// An edge was deleted.
    EdgeRemoved(ModelEdgeId),
    /// A vertex moved to another timepoint.
    TimepointChanged {
        /// The vertex that moved.
        vertex: ModelVertexId,
        /// Its new timepoint.
        timepoint: i32,
    },
    /// The model changed wholesale; the mirror must be rebuilt from scratch.
    Rebuilt,
}

/// Read access to the model graph.
///
/// Iteration order of [`vertices`](Self::vertices) and [`edges`](Self::edges) is the
/// order a rebuild recreates entities in, so it should be stable for a given model state.
pub trait ModelGraph {
    /// Iterate all vertices.
    fn vertices<'a>(&'a self) -> Box<dyn Iterator<Item = ModelVertex> + 'a>;

    /// Iterate all edges.
    fn edges<'a>(&'a self) -> Box<dyn Iterator<Item = ModelEdge> + 'a>;

    /// Display label of a vertex, if it exists.
    fn label(&self, id: ModelVertexId) -> Option<&str>;
}

#[derive(Clone, Debug)]
struct VertexRecord {
    timepoint: i32,
    label: String,
}

/// In-memory model graph that logs every mutation as a [`GraphChange`].
///
/// Ids are allocated sequentially and never reused. Pending events are drained with
/// [`take_changes`](Self::take_changes) and replayed into a view graph.
#[derive(Clone, Debug, Default)]
pub struct SimpleModel {
    vertices: Vec<Option<VertexRecord>>,
    edges: Vec<Option<ModelEdge>>,
    changes: Vec<GraphChange>,
}

impl SimpleModel {
    /// Create an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vertex and return its id.
    pub fn add_vertex(&mut self, label: impl Into<String>, timepoint: i32) -> ModelVertexId {
        let id = ModelVertexId(self.vertices.len() as u64);
        self.vertices.push(Some(VertexRecord {
            timepoint,
            label: label.into(),
        }));
        self.changes
            .push(GraphChange::VertexAdded(ModelVertex { id, timepoint }));
        id
    }

    /// Add an edge from `source` to `target`.
    ///
    /// Returns `None` if either endpoint does not exist.
    pub fn add_edge(&mut self, source: ModelVertexId, target: ModelVertexId) -> Option<ModelEdgeId> {
        if !self.contains_vertex(source) || !self.contains_vertex(target) {
            return None;
        }
        let edge = ModelEdge {
            id: ModelEdgeId(self.edges.len() as u64),
            source,
            target,
        };
        self.edges.push(Some(edge));
        self.changes.push(GraphChange::EdgeAdded(edge));
        Some(edge.id)
    }

    /// Remove an edge. Returns `false` if it did not exist.
    pub fn remove_edge(&mut self, id: ModelEdgeId) -> bool {
        let Some(slot) = usize::try_from(id.0).ok().and_then(|i| self.edges.get_mut(i)) else {
            return false;
        };
        if slot.take().is_none() {
            return false;
        }
        self.changes.push(GraphChange::EdgeRemoved(id));
        true
    }

    /// Remove a vertex together with its incident edges.
    ///
    /// Edge removals are logged before the vertex removal.
    pub fn remove_vertex(&mut self, id: ModelVertexId) -> bool {
        if !self.contains_vertex(id) {
            return false;
        }
        let incident: Vec<ModelEdgeId> = self
            .edges()
            .filter(|e| e.source == id || e.target == id)
            .map(|e| e.id)
            .collect();
        for e in incident {
            self.remove_edge(e);
        }
        if let Some(slot) = self.vertex_slot_mut(id) {
            *slot = None;
        }
        self.changes.push(GraphChange::VertexRemoved(id));
        true
    }

    /// Move a vertex to another timepoint.
    pub fn set_timepoint(&mut self, id: ModelVertexId, timepoint: i32) -> bool {
        let Some(Some(record)) = self.vertex_slot_mut(id) else {
            return false;
        };
        record.timepoint = timepoint;
        self.changes.push(GraphChange::TimepointChanged {
            vertex: id,
            timepoint,
        });
        true
    }

    /// Change a vertex label. Labels are read at projection time, so no event is logged.
    pub fn set_label(&mut self, id: ModelVertexId, label: impl Into<String>) -> bool {
        let Some(Some(record)) = self.vertex_slot_mut(id) else {
            return false;
        };
        record.label = label.into();
        true
    }

    /// Drop all pending events and log a single [`GraphChange::Rebuilt`].
    pub fn mark_rebuilt(&mut self) {
        self.changes.clear();
        self.changes.push(GraphChange::Rebuilt);
    }

    /// Drain the pending change events in the order they happened.
    pub fn take_changes(&mut self) -> Vec<GraphChange> {
        core::mem::take(&mut self.changes)
    }

    /// Whether `id` refers to a live vertex.
    pub fn contains_vertex(&self, id: ModelVertexId) -> bool {
        matches!(
            usize::try_from(id.0).ok().and_then(|i| self.vertices.get(i)),
            Some(Some(_))
        )
    }

    /// Timepoint of a vertex.
    pub fn timepoint(&self, id: ModelVertexId) -> Option<i32> {
        let record = self.vertices.get(usize::try_from(id.0).ok()?)?.as_ref()?;
        Some(record.timepoint)
    }

    /// Number of live vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.iter().flatten().count()
    }

    /// Number of live edges.
    pub fn edge_count(&self) -> usize {
        self.edges.iter().flatten().count()
    }

    fn vertex_slot_mut(&mut self, id: ModelVertexId) -> Option<&mut Option<VertexRecord>> {
        self.vertices.get_mut(usize::try_from(id.0).ok()?)
    }
}

impl ModelGraph for SimpleModel {
    fn vertices<'a>(&'a self) -> Box<dyn Iterator<Item = ModelVertex> + 'a> {
        Box::new(self.vertices.iter().enumerate().filter_map(|(i, v)| {
            v.as_ref().map(|v| ModelVertex {
                id: ModelVertexId(i as u64),
                timepoint: v.timepoint,
            })
        }))
    }

    fn edges<'a>(&'a self) -> Box<dyn Iterator<Item = ModelEdge> + 'a> {
        Box::new(self.edges.iter().flatten().copied())
    }

    fn label(&self, id: ModelVertexId) -> Option<&str> {
        let record = self.vertices.get(usize::try_from(id.0).ok()?)?.as_ref()?;
        Some(&record.label)
    }
}
