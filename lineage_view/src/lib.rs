// Copyright 2025 the Lineage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lineage View: from a laid-out lineage tree to animated screen frames.
//!
//! - [`ScreenTransform`] maps the visible layout rectangle onto pixels, with
//!   pan and zoom primitives that keep a layout point under a screen pivot.
//!   [`ViewportConstraints`] clamps it to zoom limits and pan bounds.
//! - [`Projector`] culls a [`LayoutEngine`](lineage_layout::LayoutEngine)
//!   to the viewport, producing [`ScreenEntities`]. Work is proportional to
//!   what fits on screen: runs of vertices closer than a couple of pixels are
//!   collapsed into [`ScreenRange`]s.
//! - [`Interpolator`] blends two snapshots for animated transitions, matching
//!   vertices by model id. [`EntityAnimator`] drives it from a wall clock.
//! - [`SnapshotExchange`] hands finished frames to a painter thread.
//! - [`LineageView`] ties it all together behind dirty flags.
//!
//! # Example
//!
//! ```rust
//! use std::time::Instant;
//!
//! use lineage_graph::{SimpleModel, ViewGraph};
//! use lineage_view::{LineageView, NoSelection, UniformColors, ViewOptions};
//!
//! let mut model = SimpleModel::new();
//! let a = model.add_vertex("A", 0);
//! let b = model.add_vertex("B", 1);
//! model.add_edge(a, b).unwrap();
//! let graph = ViewGraph::from_model(&model);
//!
//! let options = ViewOptions {
//!     animation_duration_ms: 0,
//!     ..ViewOptions::default()
//! };
//! let now = Instant::now();
//! let mut view = LineageView::new(options, 640, 480, now).unwrap();
//! let frame = view.paint(&graph, &model, &NoSelection, &UniformColors::default(), now);
//! assert_eq!(frame.vertices().len(), 2);
//! assert_eq!(frame.edges().len(), 1);
//! ```

mod animate;
mod constrain;
mod entities;
mod exchange;
mod interpolate;
mod options;
mod project;
mod style;
mod transform;
mod view;

pub use animate::{Animator, EntityAnimator};
pub use constrain::ViewportConstraints;
pub use entities::{
    EntityFlags, ScreenColumn, ScreenEdge, ScreenEntities, ScreenRange, ScreenVertex, Transition,
};
pub use exchange::SnapshotExchange;
pub use interpolate::{Interpolator, accel};
pub use options::{OptionsError, ViewOptions};
pub use project::{Projector, Scene};
pub use style::{ColorScheme, NoSelection, Selection, SelectionModel, UniformColors};
pub use transform::ScreenTransform;
pub use view::{Direction, DirtyFlags, LineageView};
