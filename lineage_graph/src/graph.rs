// Copyright 2025 the Lineage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The view graph: structure, event replay, queries.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use smallvec::SmallVec;

use crate::arena::Slots;
use crate::model::{GraphChange, ModelEdge, ModelGraph, ModelVertex};
use crate::types::{EdgeId, ModelEdgeId, ModelVertexId, VertexId};

/// Per-vertex edge list. Lineage vertices have one parent and rarely more than two children.
pub type EdgeList = SmallVec<[EdgeId; 2]>;

/// A view graph shared between the model-change callbacks (writer) and
/// layout/projection (readers).
pub type SharedViewGraph = Arc<RwLock<ViewGraph>>;

#[derive(Clone, Debug)]
struct VertexNode {
    model_id: ModelVertexId,
    timepoint: i32,
    incoming: EdgeList,
    outgoing: EdgeList,
}

#[derive(Clone, Debug)]
struct EdgeNode {
    model_id: ModelEdgeId,
    source: VertexId,
    target: VertexId,
}

/// Arena-pooled mirror of a model graph.
///
/// Vertices and edges live in dense slot vectors and are addressed by
/// generational [`VertexId`] / [`EdgeId`] handles. The structure is only ever
/// changed by replaying model events through [`apply`](Self::apply); there is
/// no independent editing API.
///
/// The root set (vertices without incoming edges) is maintained incrementally.
#[derive(Clone, Default)]
pub struct ViewGraph {
    vertices: Slots<VertexNode>,
    edges: Slots<EdgeNode>,
    vertex_by_model: HashMap<ModelVertexId, VertexId>,
    edge_by_model: HashMap<ModelEdgeId, EdgeId>,
    roots: BTreeSet<VertexId>,
    revision: u64,
}

impl core::fmt::Debug for ViewGraph {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ViewGraph")
            .field("vertices", &self.vertices.len())
            .field("vertex_slots", &self.vertices.capacity())
            .field("vertex_free", &self.vertices.free_len())
            .field("edges", &self.edges.len())
            .field("edge_free", &self.edges.free_len())
            .field("roots", &self.roots.len())
            .field("revision", &self.revision)
            .finish_non_exhaustive()
    }
}

impl ViewGraph {
    /// Create an empty view graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a view graph mirroring the current state of `model`.
    pub fn from_model<M: ModelGraph + ?Sized>(model: &M) -> Self {
        let mut graph = Self::new();
        graph.rebuild(model);
        graph
    }

    /// Wrap this graph in the shared reader/writer lock.
    pub fn into_shared(self) -> SharedViewGraph {
        Arc::new(RwLock::new(self))
    }

    /// Replay one model change.
    ///
    /// `model` is only consulted for [`GraphChange::Rebuilt`].
    ///
    /// # Panics
    ///
    /// Panics when the event breaks the model's own invariants: a duplicate
    /// vertex or edge id, an edge naming an unknown endpoint, or a removal or
    /// timepoint change of an unknown vertex. Pooled indices have no safe
    /// recovery path from these.
    pub fn apply<M: ModelGraph + ?Sized>(&mut self, model: &M, change: &GraphChange) {
        tracing::trace!(?change, "view graph event");
        match *change {
            GraphChange::VertexAdded(v) => self.vertex_added(v),
            GraphChange::VertexRemoved(id) => self.vertex_removed(id),
            GraphChange::EdgeAdded(e) => self.edge_added(e),
            GraphChange::EdgeRemoved(id) => self.edge_removed(id),
            GraphChange::TimepointChanged { vertex, timepoint } => {
                self.timepoint_changed(vertex, timepoint);
            }
            GraphChange::Rebuilt => self.rebuild(model),
        }
    }

    /// Replay a batch of changes in order.
    pub fn apply_all<'a, M, I>(&mut self, model: &M, changes: I)
    where
        M: ModelGraph + ?Sized,
        I: IntoIterator<Item = &'a GraphChange>,
    {
        for change in changes {
            self.apply(model, change);
        }
    }

    /// Clear everything and recreate vertices, then edges, in model iteration order.
    pub fn rebuild<M: ModelGraph + ?Sized>(&mut self, model: &M) {
        self.vertices.clear();
        self.edges.clear();
        self.vertex_by_model.clear();
        self.edge_by_model.clear();
        self.roots.clear();
        for v in model.vertices() {
            self.vertex_added(v);
        }
        for e in model.edges() {
            self.edge_added(e);
        }
        self.revision += 1;
        tracing::debug!(
            vertices = self.vertices.len(),
            edges = self.edges.len(),
            roots = self.roots.len(),
            "view graph rebuilt"
        );
    }

    fn vertex_added(&mut self, v: ModelVertex) {
        assert!(
            !self.vertex_by_model.contains_key(&v.id),
            "duplicate model vertex id {:?}",
            v.id
        );
        let (idx, generation) = self.vertices.insert(VertexNode {
            model_id: v.id,
            timepoint: v.timepoint,
            incoming: EdgeList::new(),
            outgoing: EdgeList::new(),
        });
        let id = VertexId::new(idx, generation);
        self.vertex_by_model.insert(v.id, id);
        self.roots.insert(id);
        self.revision += 1;
    }

    fn vertex_removed(&mut self, model_id: ModelVertexId) {
        let Some(id) = self.vertex_by_model.remove(&model_id) else {
            panic!("removal of unknown model vertex {model_id:?}");
        };
        let node = self.vertex_node(id);
        let incident: Vec<EdgeId> = node.incoming.iter().chain(&node.outgoing).copied().collect();
        for e in incident {
            self.unlink_edge(e);
        }
        self.roots.remove(&id);
        self.vertices.remove(id.slot(), id.generation());
        self.revision += 1;
    }

    fn edge_added(&mut self, e: ModelEdge) {
        assert!(
            !self.edge_by_model.contains_key(&e.id),
            "duplicate model edge id {:?}",
            e.id
        );
        let source = self.resolve_endpoint(e.source, e.id);
        let target = self.resolve_endpoint(e.target, e.id);
        let (idx, generation) = self.edges.insert(EdgeNode {
            model_id: e.id,
            source,
            target,
        });
        let id = EdgeId::new(idx, generation);
        self.edge_by_model.insert(e.id, id);
        self.vertex_node_mut(source).outgoing.push(id);
        let target_node = self.vertex_node_mut(target);
        let was_root = target_node.incoming.is_empty();
        target_node.incoming.push(id);
        if was_root {
            self.roots.remove(&target);
        }
        self.revision += 1;
    }

    fn resolve_endpoint(&self, vertex: ModelVertexId, edge: ModelEdgeId) -> VertexId {
        match self.vertex_by_model.get(&vertex) {
            Some(&v) => v,
            None => panic!("model edge {edge:?} references unknown vertex {vertex:?}"),
        }
    }

    fn edge_removed(&mut self, model_id: ModelEdgeId) {
        // Already detached if its endpoint was removed first.
        if let Some(&id) = self.edge_by_model.get(&model_id) {
            self.unlink_edge(id);
            self.revision += 1;
        }
    }

    fn unlink_edge(&mut self, id: EdgeId) {
        let Some(edge) = self.edges.remove(id.slot(), id.generation()) else {
            return;
        };
        self.edge_by_model.remove(&edge.model_id);
        let source = self.vertex_node_mut(edge.source);
        if let Some(pos) = source.outgoing.iter().position(|&e| e == id) {
            source.outgoing.remove(pos);
        }
        let target = self.vertex_node_mut(edge.target);
        if let Some(pos) = target.incoming.iter().position(|&e| e == id) {
            target.incoming.remove(pos);
        }
        let orphaned = target.incoming.is_empty();
        if orphaned {
            self.roots.insert(edge.target);
        }
    }

    fn timepoint_changed(&mut self, model_id: ModelVertexId, timepoint: i32) {
        let Some(&id) = self.vertex_by_model.get(&model_id) else {
            panic!("timepoint change of unknown model vertex {model_id:?}");
        };
        self.vertex_node_mut(id).timepoint = timepoint;
        self.revision += 1;
    }

    fn vertex_node(&self, id: VertexId) -> &VertexNode {
        self.vertices
            .get(id.slot(), id.generation())
            .expect("dangling VertexId")
    }

    fn vertex_node_mut(&mut self, id: VertexId) -> &mut VertexNode {
        self.vertices
            .get_mut(id.slot(), id.generation())
            .expect("dangling VertexId")
    }

    /// Counter bumped by every structural change. Equal revisions mean equal structure.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Resolve the view vertex mirroring a model vertex.
    pub fn vertex_for_model(&self, id: ModelVertexId) -> Option<VertexId> {
        self.vertex_by_model.get(&id).copied()
    }

    /// Resolve the view edge mirroring a model edge.
    pub fn edge_for_model(&self, id: ModelEdgeId) -> Option<EdgeId> {
        self.edge_by_model.get(&id).copied()
    }

    /// Returns true if `id` refers to a live vertex.
    pub fn is_alive(&self, id: VertexId) -> bool {
        self.vertices.get(id.slot(), id.generation()).is_some()
    }

    /// Borrow a vertex cursor, or `None` if the handle is stale.
    pub fn vertex(&self, id: VertexId) -> Option<VertexRef<'_>> {
        let node = self.vertices.get(id.slot(), id.generation())?;
        Some(VertexRef {
            graph: self,
            id,
            node,
        })
    }

    /// Borrow an edge cursor, or `None` if the handle is stale.
    pub fn edge(&self, id: EdgeId) -> Option<EdgeRef<'_>> {
        let node = self.edges.get(id.slot(), id.generation())?;
        Some(EdgeRef { id, node })
    }

    /// Iterate live vertices in slot order.
    pub fn vertices(&self) -> impl Iterator<Item = VertexRef<'_>> + '_ {
        self.vertices.iter().map(|(i, g, node)| VertexRef {
            graph: self,
            id: VertexId::new(i, g),
            node,
        })
    }

    /// Iterate live edges in slot order.
    pub fn edges(&self) -> impl Iterator<Item = EdgeRef<'_>> + '_ {
        self.edges.iter().map(|(i, g, node)| EdgeRef {
            id: EdgeId::new(i, g),
            node,
        })
    }

    /// Iterate the root set (vertices with no incoming edge) in handle order.
    pub fn roots(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.roots.iter().copied()
    }

    /// Returns true if `id` is a live root.
    pub fn is_root(&self, id: VertexId) -> bool {
        self.roots.contains(&id)
    }

    /// Number of roots.
    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    /// Number of live vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of live edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Upper bound (exclusive) on [`VertexId::slot`] for side tables indexed by slot.
    pub fn slot_capacity(&self) -> usize {
        self.vertices.capacity()
    }

    /// The root reached by repeatedly following the first incoming edge.
    ///
    /// Returns `None` for a stale handle. On a cyclic chain the walk stops after
    /// visiting every vertex once and returns the last vertex reached.
    pub fn component_root(&self, id: VertexId) -> Option<VertexId> {
        let mut current = self.vertex(id)?;
        for _ in 0..self.vertex_count() {
            match current.parents().next() {
                Some(parent) => current = self.vertex(parent)?,
                None => break,
            }
        }
        Some(current.id())
    }
}

/// Borrowed cursor over one live vertex.
#[derive(Copy, Clone)]
pub struct VertexRef<'a> {
    graph: &'a ViewGraph,
    id: VertexId,
    node: &'a VertexNode,
}

impl core::fmt::Debug for VertexRef<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("VertexRef")
            .field("id", &self.id)
            .field("model_id", &self.node.model_id)
            .field("timepoint", &self.node.timepoint)
            .field("in_degree", &self.node.incoming.len())
            .field("out_degree", &self.node.outgoing.len())
            .finish_non_exhaustive()
    }
}

impl<'a> VertexRef<'a> {
    /// Handle of this vertex.
    pub fn id(&self) -> VertexId {
        self.id
    }

    /// The model vertex this mirrors.
    pub fn model_id(&self) -> ModelVertexId {
        self.node.model_id
    }

    /// Timepoint (layout Y).
    pub fn timepoint(&self) -> i32 {
        self.node.timepoint
    }

    /// Incoming edges in insertion order. The first one is the layout parent edge.
    pub fn incoming(&self) -> &'a [EdgeId] {
        &self.node.incoming
    }

    /// Outgoing edges in insertion order, which is the layout child order.
    pub fn outgoing(&self) -> &'a [EdgeId] {
        &self.node.outgoing
    }

    /// Returns true if the vertex has no incoming edge.
    pub fn is_root(&self) -> bool {
        self.node.incoming.is_empty()
    }

    /// Source vertices of the incoming edges, in edge order.
    pub fn parents(&self) -> impl Iterator<Item = VertexId> + use<'a> {
        let graph = self.graph;
        self.node
            .incoming
            .iter()
            .filter_map(move |&e| graph.edge(e).map(|e| e.source()))
    }

    /// Target vertices of the outgoing edges, in edge order.
    pub fn children(&self) -> impl Iterator<Item = VertexId> + use<'a> {
        let graph = self.graph;
        self.node
            .outgoing
            .iter()
            .filter_map(move |&e| graph.edge(e).map(|e| e.target()))
    }
}

/// Borrowed cursor over one live edge.
#[derive(Copy, Clone, Debug)]
pub struct EdgeRef<'a> {
    id: EdgeId,
    node: &'a EdgeNode,
}

impl EdgeRef<'_> {
    /// Handle of this edge.
    pub fn id(&self) -> EdgeId {
        self.id
    }

    /// The model edge this mirrors.
    pub fn model_id(&self) -> ModelEdgeId {
        self.node.model_id
    }

    /// Parent endpoint.
    pub fn source(&self) -> VertexId {
        self.node.source
    }

    /// Child endpoint.
    pub fn target(&self) -> VertexId {
        self.node.target
    }
}
