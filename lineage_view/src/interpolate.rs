// Copyright 2025 the Lineage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-between frames for animated transitions.

use std::collections::HashMap;
use std::sync::Arc;

use kurbo::Point;
use lineage_graph::{ModelEdgeId, ModelVertexId};

use crate::entities::{EntityFlags, ScreenEdge, ScreenEntities, ScreenVertex, Transition};
use crate::transform::ScreenTransform;

/// Ease-out curve applied to the linear animation ratio.
///
/// Maps `0 → 0` and `1 → 1`, arriving with zero slope.
pub fn accel(ratio: f64) -> f64 {
    use core::f64::consts::FRAC_PI_2;
    (FRAC_PI_2 * (FRAC_PI_2 * ratio).sin()).sin()
}

/// Blends two snapshots.
///
/// Vertices are matched by model id. A vertex in both snapshots moves from
/// its start to its end position; one only in the start snapshot stays put
/// and is tagged [`Transition::Disappear`]; one only in the end snapshot sits
/// at its end position tagged [`Transition::Appear`]. Edges come from the end
/// snapshot. Dense ranges and column headers are copied from the end snapshot
/// unchanged.
#[derive(Clone, Debug)]
pub struct Interpolator {
    start: Arc<ScreenEntities>,
    end: Arc<ScreenEntities>,
    start_transform: ScreenTransform,
    incremental: Option<ScreenTransform>,
    start_vertices: HashMap<ModelVertexId, usize>,
    start_edges: HashMap<ModelEdgeId, usize>,
    end_vertices: HashMap<ModelVertexId, usize>,
}

impl Interpolator {
    /// Interpolate from `start` to `end`.
    pub fn new(start: Arc<ScreenEntities>, end: Arc<ScreenEntities>) -> Self {
        Self::with_incremental(start, end, None)
    }

    /// Interpolate from `start` to `end`, first moving start positions by
    /// `incremental` (a screen → screen transform, see
    /// [`ScreenTransform::incremental`]).
    pub fn with_incremental(
        start: Arc<ScreenEntities>,
        end: Arc<ScreenEntities>,
        incremental: Option<ScreenTransform>,
    ) -> Self {
        let start_vertices = start
            .vertices
            .iter()
            .enumerate()
            .map(|(i, v)| (v.model_id, i))
            .collect();
        let end_vertices = end
            .vertices
            .iter()
            .enumerate()
            .map(|(i, v)| (v.model_id, i))
            .collect();
        let start_edges = start
            .edges
            .iter()
            .enumerate()
            .map(|(i, e)| (e.model_id, i))
            .collect();
        let start_transform = match &incremental {
            Some(inc) => inc.concatenate(&start.transform),
            None => start.transform,
        };
        Self {
            start,
            end,
            start_transform,
            incremental,
            start_vertices,
            start_edges,
            end_vertices,
        }
    }

    /// Start snapshot.
    pub fn start(&self) -> &Arc<ScreenEntities> {
        &self.start
    }

    /// End snapshot.
    pub fn end(&self) -> &Arc<ScreenEntities> {
        &self.end
    }

    fn start_position(&self, v: &ScreenVertex) -> Point {
        let p = Point::new(v.x, v.y);
        match &self.incremental {
            Some(inc) => {
                let offset = self.start.offset;
                inc.layout_to_screen(p - offset) + self.end.offset
            }
            None => p,
        }
    }

    /// Build the snapshot at linear completion `ratio` in `[0, 1]`.
    pub fn interpolate(&self, ratio: f64) -> ScreenEntities {
        let r = accel(ratio.clamp(0.0, 1.0));
        let transform = ScreenTransform::interpolate(&self.start_transform, &self.end.transform, r);
        let mut out = ScreenEntities::with_transform(transform, self.end.offset);
        out.vertices
            .reserve(self.start.vertices.len().max(self.end.vertices.len()));

        // Index in `out` of each end vertex.
        let mut resolved = vec![usize::MAX; self.end.vertices.len()];

        for v in &self.start.vertices {
            let from = self.start_position(v);
            let index = out.vertices.len();
            match self.end_vertices.get(&v.model_id) {
                Some(&end_index) => {
                    let e = &self.end.vertices[end_index];
                    let was = v.flags.contains(EntityFlags::SELECTED);
                    let is = e.flags.contains(EntityFlags::SELECTED);
                    let transition = match (was, is) {
                        (false, true) => Transition::Selecting,
                        (true, false) => Transition::Deselecting,
                        _ => Transition::None,
                    };
                    out.vertices.push(ScreenVertex {
                        x: from.x * (1.0 - r) + e.x * r,
                        y: from.y * (1.0 - r) + e.y * r,
                        transition,
                        interpolation_ratio: r,
                        ..e.clone()
                    });
                    resolved[end_index] = index;
                }
                None => out.vertices.push(ScreenVertex {
                    x: from.x,
                    y: from.y,
                    transition: Transition::Disappear,
                    interpolation_ratio: r,
                    ..v.clone()
                }),
            }
        }
        for (end_index, e) in self.end.vertices.iter().enumerate() {
            if self.start_vertices.contains_key(&e.model_id) {
                continue;
            }
            resolved[end_index] = out.vertices.len();
            out.vertices.push(ScreenVertex {
                transition: Transition::Appear,
                interpolation_ratio: r,
                ..e.clone()
            });
        }

        for e in &self.end.edges {
            let (Some(&source), Some(&target)) = (resolved.get(e.source), resolved.get(e.target))
            else {
                continue;
            };
            if source == usize::MAX || target == usize::MAX {
                continue;
            }
            let is = e.flags.contains(EntityFlags::SELECTED);
            let transition = match self.start_edges.get(&e.model_id) {
                Some(&i) if self.start.edges[i].flags.contains(EntityFlags::SELECTED) != is => {
                    if is {
                        Transition::Selecting
                    } else {
                        Transition::Deselecting
                    }
                }
                _ => Transition::None,
            };
            out.edges.push(ScreenEdge {
                source,
                target,
                transition,
                interpolation_ratio: r,
                ..e.clone()
            });
        }

        out.ranges.extend_from_slice(&self.end.ranges);
        out.columns.extend_from_slice(&self.end.columns);
        out
    }
}

#[cfg(test)]
mod tests {
    use kurbo::{Rect, Vec2};
    use lineage_graph::{EdgeId, SimpleModel, VertexId, ViewGraph};

    use super::*;
    use crate::entities::{ScreenColumn, ScreenRange};

    // Interpolation never looks at view handles; any live pair will do.
    fn handles() -> (VertexId, EdgeId) {
        let mut model = SimpleModel::new();
        let a = model.add_vertex("a", 0);
        let b = model.add_vertex("b", 1);
        let e = model.add_edge(a, b).unwrap();
        let graph = ViewGraph::from_model(&model);
        (
            graph.vertex_for_model(a).unwrap(),
            graph.edge_for_model(e).unwrap(),
        )
    }

    fn vertex(model: u64, x: f64, y: f64, selected: bool) -> ScreenVertex {
        let mut flags = EntityFlags::empty();
        flags.set(EntityFlags::SELECTED, selected);
        ScreenVertex {
            vertex: handles().0,
            model_id: ModelVertexId(model),
            label: format!("v{model}"),
            x,
            y,
            vertex_dist: 10.0,
            flags,
            transition: Transition::None,
            interpolation_ratio: 0.0,
            color: 0xFF00_0000,
        }
    }

    fn edge(model: u64, source: usize, target: usize, selected: bool) -> ScreenEdge {
        let mut flags = EntityFlags::empty();
        flags.set(EntityFlags::SELECTED, selected);
        ScreenEdge {
            edge: handles().1,
            model_id: ModelEdgeId(model),
            source,
            target,
            flags,
            transition: Transition::None,
            interpolation_ratio: 0.0,
            color: 0xFF80_8080,
        }
    }

    fn snapshots() -> (Arc<ScreenEntities>, Arc<ScreenEntities>) {
        let t = ScreenTransform::new(Rect::new(0.0, 0.0, 10.0, 10.0), 101, 101);
        let mut start = ScreenEntities::with_transform(t, Vec2::ZERO);
        start.vertices = vec![
            vertex(1, 0.0, 0.0, false),
            vertex(2, 10.0, 10.0, false),
            vertex(3, 20.0, 10.0, true),
        ];
        start.edges = vec![edge(10, 0, 1, false), edge(11, 0, 2, false)];

        let t2 = ScreenTransform::new(Rect::new(0.0, 0.0, 20.0, 20.0), 101, 101);
        let mut end = ScreenEntities::with_transform(t2, Vec2::ZERO);
        // Order differs from the start snapshot on purpose.
        end.vertices = vec![
            vertex(4, 50.0, 50.0, false),
            vertex(2, 30.0, 20.0, true),
            vertex(1, 10.0, 0.0, false),
        ];
        end.edges = vec![edge(10, 2, 1, true), edge(12, 1, 0, false)];
        end.ranges = vec![ScreenRange {
            rect: Rect::new(0.0, 0.0, 5.0, 5.0),
        }];
        end.columns = vec![ScreenColumn {
            label: "a".into(),
            left: 0.0,
            width: 40.0,
        }];
        (Arc::new(start), Arc::new(end))
    }

    fn by_model(s: &ScreenEntities, id: u64) -> &ScreenVertex {
        s.vertex_by_model(ModelVertexId(id)).unwrap()
    }

    #[test]
    fn accel_is_eased() {
        assert_eq!(accel(0.0), 0.0);
        assert!((accel(1.0) - 1.0).abs() < 1e-12);
        assert!(accel(0.5) > 0.5);
        assert!(accel(0.25) < accel(0.5) && accel(0.5) < accel(0.75));
        assert!(1.0 - accel(0.99) < 0.01);
    }

    #[test]
    fn ratio_zero_reproduces_start_positions() {
        let (start, end) = snapshots();
        let ip = Interpolator::new(start.clone(), end);
        let frame = ip.interpolate(0.0);
        for v in start.vertices() {
            let got = by_model(&frame, v.model_id.0);
            assert_eq!((got.x, got.y), (v.x, v.y));
        }
        assert_eq!(frame.transform(), start.transform());
    }

    #[test]
    fn ratio_one_reproduces_end_positions() {
        let (start, end) = snapshots();
        let ip = Interpolator::new(start, end.clone());
        let frame = ip.interpolate(1.0);
        for v in end.vertices() {
            let got = by_model(&frame, v.model_id.0);
            assert!((got.x - v.x).abs() < 1e-9 && (got.y - v.y).abs() < 1e-9);
        }
        assert_eq!(frame.ranges(), end.ranges());
        assert_eq!(frame.columns(), end.columns());
    }

    #[test]
    fn moving_vertices_take_the_end_color() {
        let t = ScreenTransform::new(Rect::new(0.0, 0.0, 10.0, 10.0), 101, 101);
        let mut start = ScreenEntities::with_transform(t, Vec2::ZERO);
        start.vertices = vec![vertex(1, 0.0, 0.0, false)];
        let mut end = ScreenEntities::with_transform(t, Vec2::ZERO);
        end.vertices = vec![ScreenVertex {
            color: 0xFFFF_0000,
            ..vertex(1, 50.0, 0.0, false)
        }];
        let ip = Interpolator::new(Arc::new(start), Arc::new(end));
        for ratio in [0.5, 0.99] {
            let frame = ip.interpolate(ratio);
            let v = by_model(&frame, 1);
            assert_eq!(v.color, 0xFFFF_0000);
            assert!(v.x > 0.0 && v.x < 50.0, "position is still eased");
        }
    }

    #[test]
    fn transitions_are_classified() {
        let (start, end) = snapshots();
        let frame = Interpolator::new(start, end).interpolate(0.5);
        assert_eq!(by_model(&frame, 1).transition, Transition::None);
        assert_eq!(by_model(&frame, 2).transition, Transition::Selecting);
        assert_eq!(by_model(&frame, 3).transition, Transition::Disappear);
        assert_eq!(by_model(&frame, 4).transition, Transition::Appear);
        assert_eq!((by_model(&frame, 3).x, by_model(&frame, 3).y), (20.0, 10.0));
        assert_eq!((by_model(&frame, 4).x, by_model(&frame, 4).y), (50.0, 50.0));
        assert_eq!(frame.vertices().len(), 4);
    }

    #[test]
    fn edges_are_remapped_into_the_blended_snapshot() {
        let (start, end) = snapshots();
        let frame = Interpolator::new(start, end).interpolate(0.5);
        assert_eq!(frame.edges().len(), 2);
        for e in frame.edges() {
            let source = &frame.vertices()[e.source];
            let target = &frame.vertices()[e.target];
            match e.model_id.0 {
                10 => {
                    assert_eq!((source.model_id.0, target.model_id.0), (1, 2));
                    assert_eq!(e.transition, Transition::Selecting);
                }
                12 => {
                    assert_eq!((source.model_id.0, target.model_id.0), (2, 4));
                    assert_eq!(e.transition, Transition::None);
                }
                other => panic!("unexpected edge {other}"),
            }
        }
    }

    #[test]
    fn incremental_transform_moves_start_positions() {
        let (start, end) = snapshots();
        let inc = ScreenTransform::incremental(start.transform(), end.transform());
        let ip = Interpolator::with_incremental(start.clone(), end.clone(), Some(inc));
        let frame = ip.interpolate(0.0);
        // Vertex 3 only exists in the start snapshot; under the end transform
        // the same layout point is drawn at half the pixel coordinates.
        let v = by_model(&frame, 3);
        assert!((v.x - 10.0).abs() < 1e-9 && (v.y - 5.0).abs() < 1e-9);
        let t = frame.transform();
        assert!((t.min_x() - start.transform().min_x()).abs() < 1e-9);
        assert!((t.max_x() - end.transform().max_x()).abs() < 1e-9);
    }
}
