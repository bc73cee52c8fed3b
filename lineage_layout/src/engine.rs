// Copyright 2025 the Lineage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The layout pass: iterative depth-first X assignment.

use lineage_graph::{ModelGraph, ModelVertexId, VertexId, ViewGraph};

use crate::table::VertexTable;

/// Per-slot layout state, keyed by [`VertexId::slot`].
#[derive(Copy, Clone, Debug, Default)]
struct LayoutSlot {
    generation: u32,
    timestamp: u32,
    x: f64,
    ghost: bool,
}

/// Summary of one finished layout pass, handed to listeners.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LayoutPass {
    /// Timestamp stamped on every vertex visited by the pass.
    pub timestamp: u32,
    /// Smallest layout X (always `0.0`).
    pub min_x: f64,
    /// Largest layout X (`leaves - 1`).
    pub max_x: f64,
    /// Number of vertices laid out.
    pub vertices: usize,
    /// Number of columns recorded.
    pub columns: usize,
}

/// Observer notified once per layout pass.
pub trait LayoutListener: Send {
    /// Called after the pass has finished and the table is sealed.
    fn layout_changed(&mut self, pass: &LayoutPass);
}

impl<F: FnMut(&LayoutPass) + Send> LayoutListener for F {
    fn layout_changed(&mut self, pass: &LayoutPass) {
        self(pass);
    }
}

/// The horizontal span of one connected component in layout X.
///
/// Spans are half-open leaf intervals: `left <= x < right` for every vertex of
/// the column.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Column {
    /// The layout root that opened the column.
    pub root: VertexId,
    /// First leaf slot of the column.
    pub left: f64,
    /// One past the last leaf slot of the column.
    pub right: f64,
}

#[derive(Copy, Clone, Debug)]
struct Frame {
    vertex: VertexId,
    next_edge: usize,
    first_child_x: Option<f64>,
    last_child_x: f64,
}

impl Frame {
    fn new(vertex: VertexId) -> Self {
        Self {
            vertex,
            next_edge: 0,
            first_child_x: None,
            last_child_x: 0.0,
        }
    }

    fn record_child(&mut self, x: f64) {
        if self.first_child_x.is_none() {
            self.first_child_x = Some(x);
        }
        self.last_child_x = x;
    }
}

/// What happened when the traversal reached a vertex.
enum Visit {
    /// Stamped earlier in this pass: the edge is a layout-inert merge edge.
    Merge,
    /// Truncated by a partial layout mark and placed as a leaf.
    Truncated(f64),
    /// First visit; children must be traversed.
    Open,
}

/// Assigns layout X to the vertices of a [`ViewGraph`].
///
/// Y is the timepoint. Leaves are packed left to right in traversal order at
/// `0, 1, 2, …`; every internal vertex sits at the midpoint of its first and
/// last laid-out child. Each call is one pass stamped with a fresh timestamp;
/// layout state of a vertex is only current when its stamp equals
/// [`timestamp`](Self::timestamp).
///
/// Layout state lives in side tables indexed by [`VertexId::slot`], so a pass
/// only needs shared access to the graph.
pub struct LayoutEngine {
    slots: Vec<LayoutSlot>,
    timestamp: u32,
    rightmost: f64,
    min_x: f64,
    max_x: f64,
    table: VertexTable,
    columns: Vec<Column>,
    stack: Vec<Frame>,
    listeners: Vec<Box<dyn LayoutListener>>,
}

impl core::fmt::Debug for LayoutEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LayoutEngine")
            .field("timestamp", &self.timestamp)
            .field("min_x", &self.min_x)
            .field("max_x", &self.max_x)
            .field("laid_out", &self.table.len())
            .field("columns", &self.columns.len())
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutEngine {
    /// Create an engine that has not laid anything out yet.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            timestamp: 0,
            rightmost: 0.0,
            min_x: 0.0,
            max_x: 0.0,
            table: VertexTable::new(),
            columns: Vec::new(),
            stack: Vec::new(),
            listeners: Vec::new(),
        }
    }

    /// Register a listener notified after every pass.
    pub fn add_listener(&mut self, listener: impl LayoutListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Timestamp of the most recent pass (or reservation).
    pub fn timestamp(&self) -> u32 {
        self.timestamp
    }

    /// Advance the timestamp counter and return the new value.
    ///
    /// Lets a collaborator pre-mark vertices with [`stamp`](Self::stamp)
    /// before calling [`layout_roots`](Self::layout_roots) with the reserved
    /// value as mark.
    pub fn reserve_timestamp(&mut self) -> u32 {
        self.timestamp += 1;
        self.timestamp
    }

    /// Overwrite the layout stamp of `vertex`.
    pub fn stamp(&mut self, vertex: VertexId, timestamp: u32) {
        let slot = self.slot_mut(vertex);
        slot.generation = vertex.generation();
        slot.timestamp = timestamp;
    }

    /// Stamp of `vertex` from the pass (or pre-mark) that last touched it.
    pub fn stamp_of(&self, vertex: VertexId) -> Option<u32> {
        self.slot(vertex).map(|s| s.timestamp)
    }

    /// Smallest X of the current layout.
    pub fn current_min_x(&self) -> f64 {
        self.min_x
    }

    /// Largest X of the current layout.
    pub fn current_max_x(&self) -> f64 {
        self.max_x
    }

    /// The spatial index filled by the current layout.
    pub fn table(&self) -> &VertexTable {
        &self.table
    }

    /// Columns of the current layout, left to right.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns true if `vertex` was laid out by the current pass.
    pub fn is_active(&self, vertex: VertexId) -> bool {
        self.slot(vertex)
            .is_some_and(|s| s.timestamp == self.timestamp && self.timestamp != 0)
    }

    /// Layout X of `vertex`, if it was laid out by the current pass.
    pub fn layout_x(&self, vertex: VertexId) -> Option<f64> {
        self.slot(vertex)
            .filter(|_| self.is_active(vertex))
            .map(|s| s.x)
    }

    /// Returns true if `vertex` was laid out as a ghost by the current pass.
    pub fn is_ghost(&self, vertex: VertexId) -> bool {
        self.is_active(vertex) && self.slot(vertex).is_some_and(|s| s.ghost)
    }

    /// Full layout: every root of `graph`, ordered by label, ties by model id.
    pub fn layout<M: ModelGraph + ?Sized>(&mut self, graph: &ViewGraph, model: &M) {
        let mut keyed: Vec<(&str, ModelVertexId, VertexId)> = graph
            .roots()
            .filter_map(|r| {
                let v = graph.vertex(r)?;
                Some((model.label(v.model_id()).unwrap_or(""), v.model_id(), r))
            })
            .collect();
        keyed.sort_unstable_by(|a, b| a.0.cmp(b.0).then(a.1.cmp(&b.1)));
        let roots: Vec<VertexId> = keyed.into_iter().map(|(_, _, r)| r).collect();
        self.layout_roots(graph, &roots, None);
    }

    /// Lay out the trees hanging off `roots`, in the given order.
    ///
    /// With `mark = Some(m)` the pass is partial: a vertex whose previous stamp
    /// is below `m` is a ghost, and below `m - 1` it is additionally truncated
    /// to a leaf without visiting its children.
    pub fn layout_roots(&mut self, graph: &ViewGraph, roots: &[VertexId], mark: Option<u32>) {
        self.timestamp += 1;
        self.rightmost = 0.0;
        self.table.clear();
        self.columns.clear();
        if self.slots.len() < graph.slot_capacity() {
            self.slots.resize(graph.slot_capacity(), LayoutSlot::default());
        }

        let mut previous_component = None;
        for &root in roots {
            if !graph.is_alive(root) {
                continue;
            }
            let before = self.rightmost;
            self.layout_tree(graph, root, mark);
            if self.rightmost == before {
                // Already visited through another root.
                continue;
            }
            let component = graph.component_root(root);
            match self.columns.last_mut() {
                Some(column) if component == previous_component => {
                    column.right = self.rightmost;
                }
                _ => self.columns.push(Column {
                    root,
                    left: before,
                    right: self.rightmost,
                }),
            }
            previous_component = component;
        }

        self.table.finish();
        self.min_x = 0.0;
        self.max_x = self.rightmost - 1.0;

        let pass = LayoutPass {
            timestamp: self.timestamp,
            min_x: self.min_x,
            max_x: self.max_x,
            vertices: self.table.len(),
            columns: self.columns.len(),
        };
        tracing::debug!(
            timestamp = pass.timestamp,
            roots = roots.len(),
            vertices = pass.vertices,
            columns = pass.columns,
            max_x = pass.max_x,
            partial = mark.is_some(),
            "layout pass"
        );
        for listener in &mut self.listeners {
            listener.layout_changed(&pass);
        }
    }

    fn layout_tree(&mut self, graph: &ViewGraph, root: VertexId, mark: Option<u32>) {
        match self.enter(graph, root, mark) {
            Visit::Merge | Visit::Truncated(_) => return,
            Visit::Open => self.stack.push(Frame::new(root)),
        }
        while let Some(top) = self.stack.last_mut() {
            let vertex = top.vertex;
            let edge_index = top.next_edge;
            top.next_edge += 1;
            let child = graph
                .vertex(vertex)
                .and_then(|v| v.outgoing().get(edge_index).copied())
                .and_then(|e| graph.edge(e))
                .map(|e| e.target());

            if let Some(child) = child {
                match self.enter(graph, child, mark) {
                    Visit::Merge => {}
                    Visit::Truncated(x) => self.record_child(x),
                    Visit::Open => self.stack.push(Frame::new(child)),
                }
                continue;
            }

            let Some(frame) = self.stack.pop() else {
                break;
            };
            let x = match frame.first_child_x {
                Some(first) => (first + frame.last_child_x) / 2.0,
                None => self.next_leaf(),
            };
            self.place(graph, frame.vertex, x);
            self.record_child(x);
        }
    }

    /// Stamp `vertex` for this pass and decide how to continue.
    fn enter(&mut self, graph: &ViewGraph, vertex: VertexId, mark: Option<u32>) -> Visit {
        let timestamp = self.timestamp;
        let slot = self.slot_mut(vertex);
        let previous = if slot.generation == vertex.generation() {
            slot.timestamp
        } else {
            0
        };
        if previous == timestamp {
            return Visit::Merge;
        }
        slot.generation = vertex.generation();
        slot.timestamp = timestamp;
        slot.ghost = mark.is_some_and(|m| previous < m);
        if mark.is_some_and(|m| previous.saturating_add(1) < m) {
            let x = self.next_leaf();
            self.place(graph, vertex, x);
            return Visit::Truncated(x);
        }
        Visit::Open
    }

    fn record_child(&mut self, x: f64) {
        if let Some(parent) = self.stack.last_mut() {
            parent.record_child(x);
        }
    }

    fn next_leaf(&mut self) -> f64 {
        let x = self.rightmost;
        self.rightmost += 1.0;
        x
    }

    fn place(&mut self, graph: &ViewGraph, vertex: VertexId, x: f64) {
        self.slot_mut(vertex).x = x;
        if let Some(v) = graph.vertex(vertex) {
            self.table.insert(v.timepoint(), vertex, x);
        }
    }

    fn slot(&self, vertex: VertexId) -> Option<&LayoutSlot> {
        self.slots
            .get(vertex.slot())
            .filter(|s| s.generation == vertex.generation())
    }

    fn slot_mut(&mut self, vertex: VertexId) -> &mut LayoutSlot {
        let idx = vertex.slot();
        if idx >= self.slots.len() {
            self.slots.resize(idx + 1, LayoutSlot::default());
        }
        &mut self.slots[idx]
    }
}
