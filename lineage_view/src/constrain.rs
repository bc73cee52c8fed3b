// Copyright 2025 the Lineage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Zoom limits and pan bounds for a [`ScreenTransform`].

use kurbo::{Rect, Vec2};

use crate::transform::ScreenTransform;

/// Differences below this are treated as float noise by [`ViewportConstraints::remove_jitter`].
const JITTER_EPSILON: f64 = 1e-10;

/// Limits applied to the visible layout rectangle.
///
/// Requests outside the limits are clamped, never rejected. Sizes are
/// enforced first (about the window center), then the window is shifted,
/// keeping its size, until the layout bounds are no further out of view than
/// the border allows.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ViewportConstraints {
    /// Smallest visible extent in layout units (X) and timepoints (Y).
    pub min_size: Vec2,
    /// Largest visible extent.
    pub max_size: Vec2,
    /// Extent of the laid-out graph.
    pub bounds: Rect,
    /// Fraction of the screen that may lie beyond the bounds on each side.
    pub border_ratio: Vec2,
}

impl Default for ViewportConstraints {
    fn default() -> Self {
        Self {
            min_size: Vec2::new(2.0, 4.0),
            max_size: Vec2::new(f64::INFINITY, f64::INFINITY),
            bounds: Rect::ZERO,
            border_ratio: Vec2::new(0.5, 0.5),
        }
    }
}

impl ViewportConstraints {
    /// Clamp `transform` to the size limits and pan bounds.
    pub fn constrain(&self, transform: &mut ScreenTransform) {
        let bounds = self.bounds.abs();
        let (min_x, max_x) = constrain_axis(
            transform.min_x(),
            transform.max_x(),
            transform.width(),
            self.min_size.x,
            self.max_size.x,
            bounds.x0,
            bounds.x1,
            self.border_ratio.x,
        );
        let (min_y, max_y) = constrain_axis(
            transform.min_y(),
            transform.max_y(),
            transform.height(),
            self.min_size.y,
            self.max_size.y,
            bounds.y0,
            bounds.y1,
            self.border_ratio.y,
        );
        transform.set_layout_rect(Rect::new(min_x, min_y, max_x, max_y));
    }

    /// Show the maximal allowed X extent centered on the bounds.
    pub fn zoom_out_fully_x(&self, transform: &mut ScreenTransform) {
        let (min_x, max_x) = fully_zoomed_out(
            transform.width(),
            self.max_size.x,
            self.bounds.x0,
            self.bounds.x1,
            self.border_ratio.x,
        );
        let r = transform.layout_rect();
        transform.set_layout_rect(Rect::new(min_x, r.y0, max_x, r.y1));
    }

    /// Show the maximal allowed Y extent centered on the bounds.
    pub fn zoom_out_fully_y(&self, transform: &mut ScreenTransform) {
        let (min_y, max_y) = fully_zoomed_out(
            transform.height(),
            self.max_size.y,
            self.bounds.y0,
            self.bounds.y1,
            self.border_ratio.y,
        );
        let r = transform.layout_rect();
        transform.set_layout_rect(Rect::new(r.x0, min_y, r.x1, max_y));
    }

    /// Returns true if the visible X extent is at or below the minimum.
    pub fn has_min_size_x(&self, transform: &ScreenTransform) -> bool {
        transform.max_x() - transform.min_x() <= self.min_size.x
    }

    /// Returns true if the visible Y extent is at or below the minimum.
    pub fn has_min_size_y(&self, transform: &ScreenTransform) -> bool {
        transform.max_y() - transform.min_y() <= self.min_size.y
    }

    /// Returns true if the visible X extent is at or above the maximum.
    pub fn has_max_size_x(&self, transform: &ScreenTransform) -> bool {
        transform.max_x() - transform.min_x() >= self.max_size.x
    }

    /// Returns true if the visible Y extent is at or above the maximum.
    pub fn has_max_size_y(&self, transform: &ScreenTransform) -> bool {
        transform.max_y() - transform.min_y() >= self.max_size.y
    }

    /// Snap `transform` to `reference` if they differ only by float noise.
    ///
    /// Returns true if it snapped.
    pub fn remove_jitter(transform: &mut ScreenTransform, reference: &ScreenTransform) -> bool {
        let (a, b) = (transform.layout_rect(), reference.layout_rect());
        let same = (a.x0 - b.x0).abs() < JITTER_EPSILON
            && (a.x1 - b.x1).abs() < JITTER_EPSILON
            && (a.y0 - b.y0).abs() < JITTER_EPSILON
            && (a.y1 - b.y1).abs() < JITTER_EPSILON
            && transform.width() == reference.width()
            && transform.height() == reference.height();
        if same {
            *transform = *reference;
        }
        same
    }
}

/// Allowed overhang beyond the bounds for a window of size `w`.
fn overhang(w: f64, pixels: u32, bound_min: f64, bound_max: f64, border_ratio: f64) -> f64 {
    let layout_per_pixel = w / (f64::from(pixels.max(2)) - 1.0);
    let border = layout_per_pixel * f64::from(pixels) * border_ratio;
    border.max(w - (bound_max - bound_min) - border)
}

fn constrain_axis(
    mut min: f64,
    mut max: f64,
    pixels: u32,
    min_size: f64,
    max_size: f64,
    bound_min: f64,
    bound_max: f64,
    border_ratio: f64,
) -> (f64, f64) {
    if max - min < min_size {
        let c = (min + max) / 2.0;
        min = c - min_size / 2.0;
        max = c + min_size / 2.0;
    }
    if max - min > max_size {
        let c = (min + max) / 2.0;
        min = c - max_size / 2.0;
        max = c + max_size / 2.0;
    }
    let w = max - min;
    let add = overhang(w, pixels, bound_min, bound_max, border_ratio);
    if min < bound_min - add {
        min = bound_min - add;
        max = min + w;
    } else if max > bound_max + add {
        max = bound_max + add;
        min = max - w;
    }
    (min, max)
}

fn fully_zoomed_out(
    pixels: u32,
    max_size: f64,
    bound_min: f64,
    bound_max: f64,
    border_ratio: f64,
) -> (f64, f64) {
    let add = overhang(max_size, pixels, bound_min, bound_max, border_ratio);
    (bound_min - add, bound_max + add)
}
