// Copyright 2025 the Lineage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-view driver tying layout, projection and animation together.

use core::ops::RangeInclusive;
use core::time::Duration;
use std::sync::Arc;
use std::time::Instant;

use kurbo::{Point, Rect, Vec2};
use lineage_graph::{ModelGraph, VertexId, ViewGraph};
use lineage_layout::{ContextLayout, LayoutEngine};

use crate::animate::EntityAnimator;
use crate::constrain::ViewportConstraints;
use crate::entities::ScreenEntities;
use crate::exchange::SnapshotExchange;
use crate::options::{OptionsError, ViewOptions};
use crate::project::{Projector, Scene};
use crate::style::{ColorScheme, SelectionModel};
use crate::transform::ScreenTransform;

bitflags::bitflags! {
    /// What changed since the last [`LineageView::paint`].
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct DirtyFlags: u8 {
        /// Vertices or edges were added, removed or moved in time.
        const GRAPH      = 0b0000_0001;
        /// The viewport was panned, zoomed or resized.
        const TRANSFORM  = 0b0000_0010;
        /// Selection or highlight state changed.
        const SELECTION  = 0b0000_0100;
        /// The context set or its timepoint window changed.
        const CONTEXT    = 0b0000_1000;
        /// Labels or colors changed.
        const ATTRIBUTES = 0b0001_0000;
    }
}

impl DirtyFlags {
    /// Changes that require a new layout.
    const RELAYOUT: Self = Self::GRAPH.union(Self::CONTEXT);
    /// Changes that are shown as an animated transition.
    const ANIMATED: Self = Self::RELAYOUT.union(Self::SELECTION);
}

/// Keyboard navigation step.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// First active parent.
    Parent,
    /// First active child.
    Child,
    /// Previous vertex in the same timepoint row.
    Left,
    /// Next vertex in the same timepoint row.
    Right,
}

#[derive(Clone, Debug)]
struct Context {
    vertices: Vec<VertexId>,
    window: RangeInclusive<i32>,
}

/// Owns everything one lineage view needs between frames.
///
/// Callers report changes through the `*_changed` methods and viewport
/// operations, then call [`paint`](Self::paint) once per frame. `paint` does
/// only the work the accumulated [`DirtyFlags`] demand: a new layout after
/// graph or context changes, a new projection after any change, and an
/// interpolation step while a transition runs. Each frame is also published
/// to a [`SnapshotExchange`] for a painter on another thread.
#[derive(Debug)]
pub struct LineageView {
    options: ViewOptions,
    engine: LayoutEngine,
    context_layout: ContextLayout,
    context: Option<Context>,
    projector: Projector,
    animator: EntityAnimator,
    transform: ScreenTransform,
    constraints: ViewportConstraints,
    exchange: Arc<SnapshotExchange>,
    dirty: DirtyFlags,
    fit_pending: bool,
    focus: Option<VertexId>,
}

impl LineageView {
    /// Create a view drawing into a `width × height` surface.
    pub fn new(
        options: ViewOptions,
        width: u32,
        height: u32,
        now: Instant,
    ) -> Result<Self, OptionsError> {
        options.validate()?;
        let constraints = ViewportConstraints {
            min_size: Vec2::new(options.min_visible_width, options.min_visible_height),
            border_ratio: Vec2::new(options.border_ratio, options.border_ratio),
            ..ViewportConstraints::default()
        };
        Ok(Self {
            projector: Projector::new(&options),
            engine: LayoutEngine::new(),
            context_layout: ContextLayout::new(),
            context: None,
            animator: EntityAnimator::new(now),
            transform: ScreenTransform::new(Rect::new(-1.0, -1.0, 10.0, 10.0), width, height),
            constraints,
            exchange: Arc::new(SnapshotExchange::new()),
            dirty: DirtyFlags::all(),
            fit_pending: true,
            focus: None,
            options,
        })
    }

    /// Settings this view was created with.
    pub fn options(&self) -> &ViewOptions {
        &self.options
    }

    /// Current layout.
    pub fn layout(&self) -> &LayoutEngine {
        &self.engine
    }

    /// Target viewport; the drawn one lags behind it while animating.
    pub fn transform(&self) -> &ScreenTransform {
        &self.transform
    }

    /// Current zoom limits and pan bounds.
    pub fn constraints(&self) -> &ViewportConstraints {
        &self.constraints
    }

    /// Handoff slot receiving every painted frame.
    pub fn exchange(&self) -> Arc<SnapshotExchange> {
        self.exchange.clone()
    }

    /// Pending changes.
    pub fn dirty(&self) -> DirtyFlags {
        self.dirty
    }

    /// Returns true while a transition runs; keep calling [`paint`](Self::paint).
    pub fn is_animating(&self) -> bool {
        self.animator.is_animating()
    }

    /// The graph was edited.
    pub fn graph_changed(&mut self) {
        self.dirty |= DirtyFlags::GRAPH;
    }

    /// Selection or highlight state changed.
    pub fn selection_changed(&mut self) {
        self.dirty |= DirtyFlags::SELECTION;
    }

    /// Labels or colors changed.
    pub fn attributes_changed(&mut self) {
        self.dirty |= DirtyFlags::ATTRIBUTES;
    }

    /// Lay out only `vertices` (and ghosts of their neighbours) within `window`.
    pub fn set_context(
        &mut self,
        vertices: impl IntoIterator<Item = VertexId>,
        window: RangeInclusive<i32>,
    ) {
        self.context = Some(Context {
            vertices: vertices.into_iter().collect(),
            window,
        });
        self.dirty |= DirtyFlags::CONTEXT;
    }

    /// Go back to laying out the whole graph.
    pub fn clear_context(&mut self) {
        if self.context.take().is_some() {
            self.context_layout.invalidate();
            self.dirty |= DirtyFlags::CONTEXT;
        }
    }

    /// Resize the drawing surface, keeping the zoom level.
    pub fn set_screen_size(&mut self, width: u32, height: u32) {
        self.transform.set_screen_size(width, height);
        self.update_transform();
    }

    /// Replace the visible layout rectangle (clamped to the constraints).
    pub fn set_layout_rect(&mut self, rect: Rect) {
        self.transform.set_layout_rect(rect);
        self.fit_pending = false;
        self.update_transform();
    }

    /// Pan by a screen-space offset.
    pub fn pan(&mut self, delta: Vec2) {
        self.transform.shift(delta);
        self.fit_pending = false;
        self.update_transform();
    }

    /// Zoom both axes by `factor` (> 1 zooms out) about a screen point.
    pub fn zoom(&mut self, factor: f64, pivot: Point) {
        self.transform.zoom(factor, pivot - self.options.decoration_offset());
        self.fit_pending = false;
        self.update_transform();
    }

    /// Zoom X only.
    pub fn zoom_x(&mut self, factor: f64, pivot: f64) {
        self.transform
            .zoom_x(factor, pivot - self.options.decoration_offset_x);
        self.fit_pending = false;
        self.update_transform();
    }

    /// Zoom Y only.
    pub fn zoom_y(&mut self, factor: f64, pivot: f64) {
        self.transform
            .zoom_y(factor, pivot - self.options.decoration_offset_y);
        self.fit_pending = false;
        self.update_transform();
    }

    /// Show the largest allowed extent on both axes.
    pub fn zoom_out_fully(&mut self) {
        self.constraints.zoom_out_fully_x(&mut self.transform);
        self.constraints.zoom_out_fully_y(&mut self.transform);
        self.fit_pending = false;
        self.update_transform();
    }

    /// Show the whole layout with half a unit of margin.
    pub fn fit_to_layout(&mut self) {
        self.transform.set_layout_rect(self.constraints.bounds.inflate(0.5, 0.5));
        self.fit_pending = false;
        self.update_transform();
    }

    fn update_transform(&mut self) {
        let before = self.transform;
        self.constraints.constrain(&mut self.transform);
        ViewportConstraints::remove_jitter(&mut self.transform, &before);
        self.dirty |= DirtyFlags::TRANSFORM;
    }

    /// Vertex with keyboard focus.
    pub fn focus(&self) -> Option<VertexId> {
        self.focus
    }

    /// Move keyboard focus, without scrolling.
    pub fn set_focus(&mut self, vertex: Option<VertexId>) {
        self.focus = vertex;
    }

    /// Move keyboard focus one step and scroll it into view.
    ///
    /// Without a focus, the active vertex closest to the viewport center is
    /// focused first. Returns the new focus, or `None` if the step leads
    /// nowhere (the focus is then unchanged).
    pub fn navigate(&mut self, graph: &ViewGraph, direction: Direction) -> Option<VertexId> {
        let current = match self.focus.filter(|&v| self.engine.is_active(v)) {
            Some(v) => v,
            None => {
                let center = self.transform.layout_rect().center();
                let v = self
                    .engine
                    .closest_active_vertex(center, self.transform.x_to_y_ratio())?
                    .key;
                self.focus = Some(v);
                self.scroll_into_view(graph, v);
                return Some(v);
            }
        };
        let next = match direction {
            Direction::Parent => self.engine.first_active_parent(graph, current),
            Direction::Child => self.engine.first_active_child(graph, current),
            Direction::Left => self.engine.left_sibling(graph, current),
            Direction::Right => self.engine.right_sibling(graph, current),
        }?;
        self.focus = Some(next);
        self.scroll_into_view(graph, next);
        Some(next)
    }

    /// Pan the smallest amount that puts `vertex` inside the viewport.
    pub fn scroll_into_view(&mut self, graph: &ViewGraph, vertex: VertexId) {
        let Some(p) = self.layout_position(graph, vertex) else {
            return;
        };
        let r = self.transform.layout_rect();
        let dx = if p.x < r.x0 {
            p.x - r.x0
        } else if p.x > r.x1 {
            p.x - r.x1
        } else {
            0.0
        };
        let dy = if p.y < r.y0 {
            p.y - r.y0
        } else if p.y > r.y1 {
            p.y - r.y1
        } else {
            0.0
        };
        if dx != 0.0 || dy != 0.0 {
            self.transform.shift_layout(Vec2::new(dx, dy));
            self.fit_pending = false;
            self.update_transform();
        }
    }

    /// Pan so that `vertex` is drawn at the center of the surface.
    pub fn center_on(&mut self, graph: &ViewGraph, vertex: VertexId) {
        let Some(p) = self.layout_position(graph, vertex) else {
            return;
        };
        let pivot = Point::new(
            (f64::from(self.transform.width()) - 1.0) / 2.0,
            (f64::from(self.transform.height()) - 1.0) / 2.0,
        );
        self.transform.align(p, pivot);
        self.fit_pending = false;
        self.update_transform();
    }

    fn layout_position(&self, graph: &ViewGraph, vertex: VertexId) -> Option<Point> {
        let x = self.engine.layout_x(vertex)?;
        let t = graph.vertex(vertex)?.timepoint();
        Some(Point::new(x, f64::from(t)))
    }

    /// Active vertex drawn closest to screen point `point`, if within
    /// `max_distance` pixels (measured along X, with timepoints scaled to match).
    pub fn hit_test(&self, point: Point, max_distance: f64) -> Option<VertexId> {
        let layout = self
            .transform
            .screen_to_layout(point - self.options.decoration_offset());
        let closest = self
            .engine
            .closest_active_vertex(layout, self.transform.x_to_y_ratio())?;
        (closest.distance * self.transform.scale_x() <= max_distance).then_some(closest.key)
    }

    /// Active vertices drawn inside a screen rectangle.
    pub fn vertices_in(&self, rect: Rect) -> Vec<VertexId> {
        let offset = self.options.decoration_offset();
        let p0 = self.transform.screen_to_layout(rect.origin() - offset);
        let p1 = self
            .transform
            .screen_to_layout(Point::new(rect.x1, rect.y1) - offset);
        self.engine
            .active_vertices_within(Rect::from_points(p0, p1))
    }

    /// Produce the frame to draw at `now`.
    ///
    /// Reads the graph once; hold the graph's read lock across the call when
    /// it is shared.
    pub fn paint(
        &mut self,
        graph: &ViewGraph,
        model: &dyn ModelGraph,
        selection: &dyn SelectionModel,
        colors: &dyn ColorScheme,
        now: Instant,
    ) -> Arc<ScreenEntities> {
        let dirty = core::mem::take(&mut self.dirty);
        if dirty.is_empty() {
            if !self.animator.is_animating() {
                return self.animator.last_computed().clone();
            }
        } else {
            if dirty.intersects(DirtyFlags::RELAYOUT) {
                self.relayout(graph, model);
            }
            let scene = Scene {
                graph,
                model,
                layout: &self.engine,
                selection,
                colors,
            };
            let end = self.projector.project(
                &scene,
                &self.transform,
                self.options.decoration_offset(),
            );
            if dirty.intersects(DirtyFlags::ANIMATED) {
                self.animator
                    .start_animation(end, self.options.animation_duration(), now);
            } else {
                self.animator.continue_animation(end, Duration::ZERO, now);
            }
            tracing::trace!(?dirty, animating = self.animator.is_animating(), "painted");
        }
        let frame = self.animator.set_time(now);
        self.exchange.publish(frame.clone());
        frame
    }

    fn relayout(&mut self, graph: &ViewGraph, model: &dyn ModelGraph) {
        match &self.context {
            Some(ctx) => {
                self.context_layout.build(
                    &mut self.engine,
                    graph,
                    ctx.vertices.iter().copied(),
                    ctx.window.clone(),
                    false,
                );
            }
            None => self.engine.layout(graph, model),
        }

        let bounds = match self.engine.table().timepoint_bounds() {
            Some((first, last)) => Rect::new(
                self.engine.current_min_x(),
                f64::from(first),
                self.engine.current_max_x(),
                f64::from(last),
            ),
            None => Rect::ZERO,
        };
        let min_size = self.constraints.min_size;
        self.constraints.bounds = bounds;
        self.constraints.max_size = Vec2::new(
            (bounds.width() * self.options.overview_margin).max(min_size.x),
            (bounds.height() * self.options.overview_margin).max(min_size.y),
        );
        if self.fit_pending && !self.engine.table().is_empty() {
            self.transform.set_layout_rect(bounds.inflate(0.5, 0.5));
            self.fit_pending = false;
        }
        self.constraints.constrain(&mut self.transform);
    }
}

#[cfg(test)]
mod tests {
    use lineage_graph::{ModelVertexId, SimpleModel};

    use super::*;
    use crate::style::{NoSelection, Selection, UniformColors};

    // a(0) -> b(1) -> d(2)
    //      -> c(1) -> e(2)
    fn sample() -> (SimpleModel, ViewGraph, [ModelVertexId; 5]) {
        let mut model = SimpleModel::new();
        let a = model.add_vertex("a", 0);
        let b = model.add_vertex("b", 1);
        let c = model.add_vertex("c", 1);
        let d = model.add_vertex("d", 2);
        let e = model.add_vertex("e", 2);
        model.add_edge(a, b).unwrap();
        model.add_edge(a, c).unwrap();
        model.add_edge(b, d).unwrap();
        model.add_edge(c, e).unwrap();
        let graph = ViewGraph::from_model(&model);
        (model, graph, [a, b, c, d, e])
    }

    fn instant_options() -> ViewOptions {
        ViewOptions {
            animation_duration_ms: 0,
            ..ViewOptions::default()
        }
    }

    #[test]
    fn invalid_options_are_rejected() {
        let options = ViewOptions {
            min_visible_width: 0.0,
            ..ViewOptions::default()
        };
        assert!(LineageView::new(options, 100, 100, Instant::now()).is_err());
    }

    #[test]
    fn first_paint_shows_everything() {
        let (model, graph, ids) = sample();
        let now = Instant::now();
        let mut view = LineageView::new(instant_options(), 400, 300, now).unwrap();
        let frame = view.paint(&graph, &model, &NoSelection, &UniformColors::default(), now);
        assert_eq!(frame.vertices().len(), 5);
        assert_eq!(frame.edges().len(), 4);
        for id in ids {
            assert!(frame.vertex_by_model(id).is_some());
        }
        assert!(view.dirty().is_empty());
        assert!(Arc::ptr_eq(&frame, &view.exchange().take_latest()));
    }

    #[test]
    fn hit_test_finds_drawn_vertices() {
        let (model, graph, _) = sample();
        let now = Instant::now();
        let mut view = LineageView::new(instant_options(), 400, 300, now).unwrap();
        let frame = view.paint(&graph, &model, &NoSelection, &UniformColors::default(), now);
        for v in frame.vertices() {
            let hit = view.hit_test(Point::new(v.x + 1.0, v.y), 5.0);
            assert_eq!(hit, Some(v.vertex));
        }
        assert_eq!(view.hit_test(Point::new(-1000.0, -1000.0), 5.0), None);
    }

    #[test]
    fn decoration_offset_is_honored() {
        let (model, graph, _) = sample();
        let now = Instant::now();
        let options = ViewOptions {
            decoration_offset_x: 40.0,
            decoration_offset_y: 20.0,
            ..instant_options()
        };
        let mut view = LineageView::new(options, 400, 300, now).unwrap();
        let frame = view.paint(&graph, &model, &NoSelection, &UniformColors::default(), now);
        for v in frame.vertices() {
            assert!(v.x >= 40.0 && v.y >= 20.0);
            assert_eq!(view.hit_test(Point::new(v.x, v.y), 1.0), Some(v.vertex));
        }
    }

    #[test]
    fn panning_is_clamped_to_the_layout() {
        let (model, graph, _) = sample();
        let now = Instant::now();
        let mut view = LineageView::new(instant_options(), 400, 300, now).unwrap();
        view.paint(&graph, &model, &NoSelection, &UniformColors::default(), now);
        view.pan(Vec2::new(1.0e6, 1.0e6));
        let bounds = view.constraints().bounds;
        assert!(view.transform().min_x() < bounds.x1);
        assert!(view.transform().min_y() < bounds.y1);
        assert!(view.dirty().contains(DirtyFlags::TRANSFORM));
        let frame = view.paint(&graph, &model, &NoSelection, &UniformColors::default(), now);
        assert!(!frame.vertices().is_empty());
    }

    #[test]
    fn keyboard_navigation_walks_the_tree() {
        let (model, graph, [a, b, _, d, _]) = sample();
        let now = Instant::now();
        let mut view = LineageView::new(instant_options(), 400, 300, now).unwrap();
        view.paint(&graph, &model, &NoSelection, &UniformColors::default(), now);
        let [a, b, d] = [a, b, d].map(|m| graph.vertex_for_model(m).unwrap());

        view.set_focus(Some(a));
        assert_eq!(view.navigate(&graph, Direction::Child), Some(b));
        assert_eq!(view.navigate(&graph, Direction::Child), Some(d));
        assert_eq!(view.navigate(&graph, Direction::Left), None);
        assert_eq!(view.focus(), Some(d));
        assert_eq!(view.navigate(&graph, Direction::Parent), Some(b));
        assert_eq!(view.navigate(&graph, Direction::Parent), Some(a));
        assert_eq!(view.navigate(&graph, Direction::Parent), None);
    }

    #[test]
    fn graph_changes_animate() {
        let (mut model, mut graph, [_, _, _, d, _]) = sample();
        let t0 = Instant::now();
        let mut view = LineageView::new(ViewOptions::default(), 400, 300, t0).unwrap();
        let colors = UniformColors::default();
        // The first transition starts from an empty snapshot.
        view.paint(&graph, &model, &NoSelection, &colors, t0);
        assert!(view.is_animating());
        let t1 = t0 + Duration::from_secs(1);
        let settled = view.paint(&graph, &model, &NoSelection, &colors, t1);
        assert!(!view.is_animating());
        assert_eq!(settled.vertices().len(), 5);

        let f = model.add_vertex("f", 3);
        model.add_edge(d, f).unwrap();
        let changes = model.take_changes();
        graph.apply_all(&model, &changes);
        view.graph_changed();

        let mid = view.paint(&graph, &model, &NoSelection, &colors, t1);
        assert!(view.is_animating());
        let new = mid.vertex_by_model(f).unwrap();
        assert_eq!(new.transition, crate::entities::Transition::Appear);

        let done = view.paint(&graph, &model, &NoSelection, &colors, t1 + Duration::from_secs(1));
        assert!(!view.is_animating());
        assert_eq!(done.vertices().len(), 6);
    }

    #[test]
    fn selection_changes_are_tagged() {
        let (model, graph, [a, ..]) = sample();
        let t0 = Instant::now();
        let mut view = LineageView::new(ViewOptions::default(), 400, 300, t0).unwrap();
        let colors = UniformColors::default();
        let mut selection = Selection::new();
        view.paint(&graph, &model, &selection, &colors, t0);
        let t1 = t0 + Duration::from_secs(1);
        view.paint(&graph, &model, &selection, &colors, t1);

        selection.set_vertex(a, true);
        view.selection_changed();
        let mid = view.paint(&graph, &model, &selection, &colors, t1);
        assert_eq!(
            mid.vertex_by_model(a).unwrap().transition,
            crate::entities::Transition::Selecting
        );
    }

    #[test]
    fn context_restricts_the_layout() {
        let (model, graph, [a, b, c, d, _]) = sample();
        let now = Instant::now();
        let mut view = LineageView::new(instant_options(), 400, 300, now).unwrap();
        let ctx = [a, b, d].map(|m| graph.vertex_for_model(m).unwrap());
        view.set_context(ctx, 0..=2);
        let frame = view.paint(&graph, &model, &NoSelection, &UniformColors::default(), now);
        assert!(frame.vertex_by_model(b).is_some());
        assert!(frame.vertex_by_model(d).is_some());
        // `c` is a child of `a` outside the context: drawn as a ghost.
        let ghost = frame.vertex_by_model(c).unwrap();
        assert!(ghost.flags.contains(crate::entities::EntityFlags::GHOST));

        view.clear_context();
        let frame = view.paint(&graph, &model, &NoSelection, &UniformColors::default(), now);
        assert_eq!(frame.vertices().len(), 5);
        assert!(frame.vertices().iter().all(|v| v.flags.is_empty()));
    }
}
