// Copyright 2025 the Lineage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Viewport culling: turn the current layout into one frame of screen entities.
//!
//! Cost is bounded by what is visible: only rows intersecting the viewport are
//! visited, only the visible X slice of each row is touched, and runs of
//! vertices closer together than a couple of pixels collapse into a single
//! [`ScreenRange`].

use kurbo::{Rect, Vec2};
use lineage_graph::{ModelGraph, VertexId, ViewGraph};
use lineage_layout::LayoutEngine;

use crate::entities::{
    EntityFlags, ScreenColumn, ScreenEdge, ScreenEntities, ScreenRange, ScreenVertex, Transition,
};
use crate::options::ViewOptions;
use crate::style::{ColorScheme, SelectionModel};
use crate::transform::ScreenTransform;

/// Everything projection reads.
#[derive(Copy, Clone)]
pub struct Scene<'a> {
    /// Graph structure.
    pub graph: &'a ViewGraph,
    /// Labels.
    pub model: &'a dyn ModelGraph,
    /// Current layout and its spatial index.
    pub layout: &'a LayoutEngine,
    /// Selection and highlight state.
    pub selection: &'a dyn SelectionModel,
    /// Entity colors.
    pub colors: &'a dyn ColorScheme,
}

impl core::fmt::Debug for Scene<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Scene")
            .field("graph", self.graph)
            .field("layout", self.layout)
            .finish_non_exhaustive()
    }
}

const NO_INDEX: u32 = u32::MAX;

/// Builds [`ScreenEntities`] from a [`Scene`] and a viewport.
///
/// Holds a per-vertex scratch table mapping view vertices to their index in
/// the snapshot under construction; entries are validated against the
/// snapshot, so leftovers from earlier frames are harmless.
#[derive(Clone, Debug)]
pub struct Projector {
    screen_index: Vec<u32>,
    min_vertex_pixel_distance: f64,
    min_column_width: f64,
    min_subdivision: usize,
}

impl Default for Projector {
    fn default() -> Self {
        Self::new(&ViewOptions::default())
    }
}

impl Projector {
    /// Create a projector using the density and column settings of `options`.
    pub fn new(options: &ViewOptions) -> Self {
        Self {
            screen_index: Vec::new(),
            min_vertex_pixel_distance: options.min_vertex_pixel_distance,
            min_column_width: options.min_column_width,
            min_subdivision: options.min_subdivision,
        }
    }

    /// Project the scene through `transform`. Every emitted coordinate has
    /// `offset` added (room for headers and other decorations).
    pub fn project(
        &mut self,
        scene: &Scene<'_>,
        transform: &ScreenTransform,
        offset: Vec2,
    ) -> ScreenEntities {
        let mut out = ScreenEntities::with_transform(*transform, offset);
        if self.screen_index.len() < scene.graph.slot_capacity() {
            self.screen_index.resize(scene.graph.slot_capacity(), NO_INDEX);
        }

        let (sx, sy) = (transform.scale_x(), transform.scale_y());
        let (min_x, max_x) = (transform.min_x(), transform.max_x());
        let min_y = transform.min_y();
        let to_screen_x = |x: f64| (x - min_x) * sx + offset.x;
        let to_screen_y = |t: f64| (t - min_y) * sy + offset.y;
        let allowed = self.min_vertex_pixel_distance / sx;

        #[allow(
            clippy::cast_possible_truncation,
            reason = "Timepoints are i32; the saturating float cast is intended."
        )]
        let (first_row, last_row) = (
            (min_y - 1.0).ceil() as i32,
            (transform.max_y() + 1.0).floor() as i32,
        );
        let table = scene.layout.table();
        for (timepoint, row) in table.rows_between(first_row, last_row) {
            if row.is_empty() {
                continue;
            }
            let y = to_screen_y(f64::from(timepoint));
            let prev_y = to_screen_y(f64::from(timepoint) - 1.0);

            // One slot of slack on both sides keeps edges into the viewport.
            let min_index = row.predecessor(min_x).map_or(0, |i| i.saturating_sub(1));
            let max_index = match row.predecessor_in(max_x, min_index..row.len()) {
                Some(i) => (i + 1).min(row.len() - 1),
                None => min_index,
            };
            let dense = row.dense_ranges(min_index..max_index + 1, allowed, self.min_subdivision);

            let row_start = out.vertices.len();
            let mut min_dist = sy;
            let mut prev_x: Option<f64> = None;
            let mut dense = dense.into_iter().peekable();
            let mut i = min_index;
            while i <= max_index {
                if let Some(range) = dense.next_if(|r| r.first == i) {
                    let (Some(a), Some(b)) = (row.get(range.first), row.get(range.last)) else {
                        break;
                    };
                    out.ranges.push(ScreenRange {
                        rect: Rect::new(to_screen_x(a.x), prev_y, to_screen_x(b.x), y),
                    });
                    min_dist = 0.0;
                    prev_x = None;
                    i = range.last + 1;
                    continue;
                }
                let Some(entry) = row.get(i) else {
                    break;
                };
                let x = to_screen_x(entry.x);
                if let Some(px) = prev_x {
                    min_dist = min_dist.min(x - px);
                }
                prev_x = Some(x);
                if let Some(index) = self.emit_vertex(scene, &mut out, entry.key, x, y) {
                    self.emit_incoming_edges(
                        scene,
                        &mut out,
                        entry.key,
                        index,
                        &to_screen_x,
                        &to_screen_y,
                    );
                }
                i += 1;
            }
            for v in &mut out.vertices[row_start..] {
                v.vertex_dist = min_dist;
            }
        }

        self.emit_columns(scene, transform, offset, &mut out);
        tracing::debug!(
            vertices = out.vertices.len(),
            edges = out.edges.len(),
            ranges = out.ranges.len(),
            columns = out.columns.len(),
            "projected frame"
        );
        out
    }

    fn valid_index(&self, out: &ScreenEntities, vertex: VertexId) -> Option<usize> {
        let index = *self.screen_index.get(vertex.slot())?;
        if index == NO_INDEX {
            return None;
        }
        let index = index as usize;
        (out.vertices.get(index)?.vertex == vertex).then_some(index)
    }

    /// Add `vertex` at screen `(x, y)` unless it is already part of `out`.
    fn emit_vertex(
        &mut self,
        scene: &Scene<'_>,
        out: &mut ScreenEntities,
        vertex: VertexId,
        x: f64,
        y: f64,
    ) -> Option<usize> {
        if let Some(index) = self.valid_index(out, vertex) {
            return Some(index);
        }
        let model_id = scene.graph.vertex(vertex)?.model_id();
        let mut flags = EntityFlags::empty();
        flags.set(EntityFlags::SELECTED, scene.selection.is_vertex_selected(model_id));
        flags.set(EntityFlags::GHOST, scene.layout.is_ghost(vertex));
        flags.set(EntityFlags::FADED, scene.selection.is_vertex_faded(model_id));
        let index = out.vertices.len();
        out.vertices.push(ScreenVertex {
            vertex,
            model_id,
            label: scene.model.label(model_id).unwrap_or_default().to_owned(),
            x,
            y,
            vertex_dist: 0.0,
            flags,
            transition: Transition::None,
            interpolation_ratio: 0.0,
            color: scene.colors.vertex_color(model_id),
        });
        #[allow(
            clippy::cast_possible_truncation,
            reason = "A snapshot never holds more than u32::MAX vertices."
        )]
        let stored = index as u32;
        self.screen_index[vertex.slot()] = stored;
        Some(index)
    }

    /// Emit the incoming edges of a projected vertex whose source belongs to the
    /// current layout pass, adding off-row sources as needed.
    fn emit_incoming_edges(
        &mut self,
        scene: &Scene<'_>,
        out: &mut ScreenEntities,
        vertex: VertexId,
        target_index: usize,
        to_screen_x: &dyn Fn(f64) -> f64,
        to_screen_y: &dyn Fn(f64) -> f64,
    ) {
        let Some(v) = scene.graph.vertex(vertex) else {
            return;
        };
        let target_model = v.model_id();
        for &e in v.incoming() {
            let Some(edge) = scene.graph.edge(e) else {
                continue;
            };
            let source = edge.source();
            let Some(source_x) = scene.layout.layout_x(source) else {
                continue;
            };
            let source_index = match self.valid_index(out, source) {
                Some(index) => Some(index),
                None => scene.graph.vertex(source).and_then(|s| {
                    let sy = to_screen_y(f64::from(s.timepoint()));
                    self.emit_vertex(scene, out, source, to_screen_x(source_x), sy)
                }),
            };
            let Some(source_index) = source_index else {
                continue;
            };
            let model_id = edge.model_id();
            let source_model = out.vertices[source_index].model_id;
            let mut flags = EntityFlags::empty();
            flags.set(EntityFlags::SELECTED, scene.selection.is_edge_selected(model_id));
            flags.set(EntityFlags::FADED, scene.selection.is_edge_faded(model_id));
            out.edges.push(ScreenEdge {
                edge: e,
                model_id,
                source: source_index,
                target: target_index,
                flags,
                transition: Transition::None,
                interpolation_ratio: 0.0,
                color: scene.colors.edge_color(model_id, source_model, target_model),
            });
        }
    }

    fn emit_columns(
        &self,
        scene: &Scene<'_>,
        transform: &ScreenTransform,
        offset: Vec2,
        out: &mut ScreenEntities,
    ) {
        let sx = transform.scale_x();
        let (min_x, max_x) = (transform.min_x(), transform.max_x());
        let min_width = self.min_column_width / sx;
        let columns = scene.layout.columns();
        let first = columns.partition_point(|c| c.right < min_x);
        for column in columns[first..].iter().take_while(|c| c.left <= max_x + 1.0) {
            if column.right - column.left < min_width {
                continue;
            }
            let left = (column.left - min_x - 0.5) * sx + offset.x;
            let right = (column.right - min_x - 0.5) * sx + offset.x;
            let label = scene
                .graph
                .vertex(column.root)
                .and_then(|v| scene.model.label(v.model_id()))
                .unwrap_or_default()
                .to_owned();
            out.columns.push(ScreenColumn {
                label,
                left,
                width: right - left,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{NoSelection, Selection, UniformColors};
    use kurbo::Point;
    use lineage_graph::{ModelVertexId, SimpleModel};

    struct Fixture {
        model: SimpleModel,
        graph: ViewGraph,
        layout: LayoutEngine,
    }

    impl Fixture {
        fn new(model: SimpleModel) -> Self {
            let graph = ViewGraph::from_model(&model);
            let mut layout = LayoutEngine::new();
            layout.layout(&graph, &model);
            Self {
                model,
                graph,
                layout,
            }
        }

        fn project_with(
            &self,
            selection: &dyn SelectionModel,
            transform: &ScreenTransform,
        ) -> ScreenEntities {
            let scene = Scene {
                graph: &self.graph,
                model: &self.model,
                layout: &self.layout,
                selection,
                colors: &UniformColors::default(),
            };
            Projector::default().project(&scene, transform, Vec2::ZERO)
        }

        fn project(&self, transform: &ScreenTransform) -> ScreenEntities {
            self.project_with(&NoSelection, transform)
        }
    }

    fn scenario() -> (SimpleModel, [ModelVertexId; 4]) {
        let mut model = SimpleModel::new();
        let a = model.add_vertex("A", 0);
        let b = model.add_vertex("B", 1);
        let c = model.add_vertex("C", 1);
        let d = model.add_vertex("D", 2);
        model.add_edge(a, b).unwrap();
        model.add_edge(a, c).unwrap();
        model.add_edge(b, d).unwrap();
        (model, [a, b, c, d])
    }

    #[test]
    fn small_tree_projects_every_vertex_and_edge() {
        let (model, [a, _, c, d]) = scenario();
        let fx = Fixture::new(model);
        let t = ScreenTransform::new(Rect::new(-1.0, -1.0, 2.0, 3.0), 301, 401);
        let frame = fx.project(&t);
        assert_eq!(frame.vertices().len(), 4);
        assert_eq!(frame.edges().len(), 3);
        assert!(frame.ranges().is_empty());

        let sa = frame.vertex_by_model(a).unwrap();
        let expect = t.layout_to_screen(Point::new(0.5, 0.0));
        assert_eq!((sa.x, sa.y), (expect.x, expect.y));
        assert_eq!(sa.label, "A");
        let sd = frame.vertex_by_model(d).unwrap();
        assert_eq!(sd.y, t.layout_to_screen_y(2.0));

        for e in frame.edges() {
            let (s, tg) = (&frame.vertices()[e.source], &frame.vertices()[e.target]);
            assert!(s.y < tg.y, "edges point down the timeline");
        }
        let sc = frame.vertex_by_model(c).unwrap();
        assert_eq!(sc.vertex_dist, 100.0, "B and C are one unit (100 px) apart");
    }

    #[test]
    fn offscreen_source_is_added_for_edges() {
        let mut model = SimpleModel::new();
        let a = model.add_vertex("A", 0);
        let kids: Vec<_> = (0..4).map(|i| model.add_vertex(format!("k{i}"), 1)).collect();
        for &k in &kids {
            model.add_edge(a, k).unwrap();
        }
        model.add_vertex("Y", 0);
        model.add_vertex("Z", 0);
        // Row 0: A=1.5, Y=4, Z=5; row 1: k0..k3 = 0..3.
        let fx = Fixture::new(model);
        let t = ScreenTransform::new(Rect::new(5.5, -1.0, 10.0, 2.0), 101, 101);
        let frame = fx.project(&t);

        let sa = frame.vertex_by_model(a).expect("source pulled in for its edges");
        assert_eq!(sa.x, t.layout_to_screen_x(1.5));
        assert!(sa.x < 0.0, "source is left of the viewport");
        assert_eq!(frame.edges().len(), 2, "only the two visible children");
        for e in frame.edges() {
            assert_eq!(frame.vertices()[e.source].model_id, a);
        }
    }

    fn wide_row(n: u32) -> Fixture {
        let mut model = SimpleModel::new();
        for i in 0..n {
            model.add_vertex(format!("v{i:05}"), 0);
        }
        Fixture::new(model)
    }

    #[test]
    fn dense_row_collapses_at_low_zoom() {
        let fx = wide_row(10_000);
        let t = ScreenTransform::new(Rect::new(-1.0, -1.0, 10_000.0, 1.0), 500, 100);
        let frame = fx.project(&t);
        assert_eq!(frame.ranges().len(), 1);
        assert!(frame.vertices().is_empty());
        let r = frame.ranges()[0].rect;
        assert_eq!(r.x0, t.layout_to_screen_x(0.0));
        assert_eq!(r.x1, t.layout_to_screen_x(9_999.0));
    }

    #[test]
    fn dense_row_expands_at_ample_zoom() {
        let fx = wide_row(10_000);
        let t = ScreenTransform::new(Rect::new(-1.0, -1.0, 10_001.0, 1.0), 200_001, 100);
        let frame = fx.project(&t);
        assert!(frame.ranges().is_empty());
        assert_eq!(frame.vertices().len(), 10_000);
        assert!(frame.columns().is_empty(), "one-unit columns are below 30 px here");
    }

    #[test]
    fn selection_ghost_and_color_flags() {
        let (model, [a, b, ..]) = scenario();
        let fx = Fixture::new(model);
        let mut selection = Selection::new();
        selection.set_vertex(b, true);
        selection.set_focus([b]);
        let t = ScreenTransform::new(Rect::new(-1.0, -1.0, 2.0, 3.0), 301, 401);
        let frame = fx.project_with(&selection, &t);
        let sb = frame.vertex_by_model(b).unwrap();
        assert!(sb.flags.contains(EntityFlags::SELECTED));
        assert!(!sb.flags.contains(EntityFlags::FADED));
        let sa = frame.vertex_by_model(a).unwrap();
        assert!(sa.flags.contains(EntityFlags::FADED), "outside the focus");
        assert_eq!(sa.color, UniformColors::default().vertex);
        assert!(!sa.flags.contains(EntityFlags::GHOST));
    }

    #[test]
    fn columns_are_emitted_when_wide_enough() {
        let mut model = SimpleModel::new();
        model.add_vertex("left", 0);
        model.add_vertex("right", 0);
        let fx = Fixture::new(model);
        let t = ScreenTransform::new(Rect::new(-1.0, -1.0, 3.0, 1.0), 401, 101);
        let frame = fx.project(&t);
        let cols = frame.columns();
        assert_eq!(cols.len(), 2);
        assert_eq!(cols[0].label, "left");
        assert_eq!(cols[0].left, 50.0);
        assert_eq!(cols[0].width, 100.0);
        assert_eq!(cols[1].left, 150.0);
    }

    #[test]
    fn rows_outside_the_viewport_are_skipped() {
        let mut model = SimpleModel::new();
        let mut prev = model.add_vertex("t0", 0);
        for t in 1..10 {
            let v = model.add_vertex(format!("t{t}"), t);
            model.add_edge(prev, v).unwrap();
            prev = v;
        }
        let fx = Fixture::new(model);
        let t = ScreenTransform::new(Rect::new(-1.0, 4.0, 1.0, 5.0), 101, 101);
        let frame = fx.project(&t);
        let mut tps: Vec<f64> = frame
            .vertices()
            .iter()
            .map(|v| t.screen_to_layout(Point::new(v.x, v.y)).y.round())
            .collect();
        tps.sort_by(f64::total_cmp);
        // One row of slack each side, plus the parent pulled in for the first edge.
        assert_eq!(tps, vec![2.0, 3.0, 4.0, 5.0, 6.0]);
    }
}
