// Copyright 2025 the Lineage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layout ↔ screen coordinate mapping.
//!
//! A [`ScreenTransform`] maps the visible layout rectangle
//! `[min_x, max_x] × [min_y, max_y]` onto a `width × height` pixel grid, with
//! `min` landing on pixel `0` and `max` on pixel `size - 1` for each axis.
//! Timepoints grow downwards, so there is no Y flip.

use kurbo::{Point, Rect, Vec2};

/// Visible layout rectangle plus the pixel size it is drawn into.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScreenTransform {
    min_x: f64,
    max_x: f64,
    min_y: f64,
    max_y: f64,
    width: u32,
    height: u32,
    scale_x: f64,
    scale_y: f64,
}

impl Default for ScreenTransform {
    fn default() -> Self {
        Self::new(Rect::new(-10.0, -10.0, 10.0, 10.0), 800, 600)
    }
}

impl ScreenTransform {
    /// Show `layout` (X by timepoint) on a `width × height` pixel surface.
    pub fn new(layout: Rect, width: u32, height: u32) -> Self {
        let layout = layout.abs();
        let mut t = Self {
            min_x: layout.x0,
            max_x: layout.x1,
            min_y: layout.y0,
            max_y: layout.y1,
            width,
            height,
            scale_x: 1.0,
            scale_y: 1.0,
        };
        t.update();
        t
    }

    fn update(&mut self) {
        self.scale_x = pixel_span(self.width) / layout_span(self.min_x, self.max_x);
        self.scale_y = pixel_span(self.height) / layout_span(self.min_y, self.max_y);
    }

    /// Replace the visible layout rectangle, keeping the pixel size.
    pub fn set_layout_rect(&mut self, layout: Rect) {
        *self = Self::new(layout, self.width, self.height);
    }

    /// Resize the pixel surface, keeping scale and the top-left layout corner.
    pub fn set_screen_size(&mut self, width: u32, height: u32) {
        let (sx, sy) = (self.scale_x, self.scale_y);
        self.width = width;
        self.height = height;
        self.max_x = self.min_x + pixel_span(width) / sx;
        self.max_y = self.min_y + pixel_span(height) / sy;
        self.update();
    }

    /// Visible layout rectangle.
    pub fn layout_rect(&self) -> Rect {
        Rect::new(self.min_x, self.min_y, self.max_x, self.max_y)
    }

    /// Left edge in layout X.
    pub fn min_x(&self) -> f64 {
        self.min_x
    }

    /// Right edge in layout X.
    pub fn max_x(&self) -> f64 {
        self.max_x
    }

    /// Top edge in timepoints.
    pub fn min_y(&self) -> f64 {
        self.min_y
    }

    /// Bottom edge in timepoints.
    pub fn max_y(&self) -> f64 {
        self.max_y
    }

    /// Surface width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Surface height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixels per layout X unit.
    pub fn scale_x(&self) -> f64 {
        self.scale_x
    }

    /// Pixels per timepoint.
    pub fn scale_y(&self) -> f64 {
        self.scale_y
    }

    /// Converts timepoint differences into layout X units of equal on-screen length.
    pub fn x_to_y_ratio(&self) -> f64 {
        self.scale_y / self.scale_x
    }

    /// Map a layout X to a screen X.
    pub fn layout_to_screen_x(&self, x: f64) -> f64 {
        (x - self.min_x) * self.scale_x
    }

    /// Map a layout Y (timepoint) to a screen Y.
    pub fn layout_to_screen_y(&self, y: f64) -> f64 {
        (y - self.min_y) * self.scale_y
    }

    /// Map a layout point to screen space.
    pub fn layout_to_screen(&self, p: Point) -> Point {
        Point::new(self.layout_to_screen_x(p.x), self.layout_to_screen_y(p.y))
    }

    /// Map a screen point to layout space.
    pub fn screen_to_layout(&self, p: Point) -> Point {
        Point::new(
            self.min_x + p.x / self.scale_x,
            self.min_y + p.y / self.scale_y,
        )
    }

    /// Scale the visible X extent by `factor` (> 1 zooms out) keeping the layout
    /// point under screen X `pivot` fixed.
    pub fn zoom_x(&mut self, factor: f64, pivot: f64) {
        let anchor = self.min_x + pivot / self.scale_x;
        let size = (self.max_x - self.min_x) * factor;
        let scale = pixel_span(self.width) / layout_span(0.0, size);
        self.min_x = anchor - pivot / scale;
        self.max_x = self.min_x + size;
        self.update();
    }

    /// Y counterpart of [`zoom_x`](Self::zoom_x).
    pub fn zoom_y(&mut self, factor: f64, pivot: f64) {
        let anchor = self.min_y + pivot / self.scale_y;
        let size = (self.max_y - self.min_y) * factor;
        let scale = pixel_span(self.height) / layout_span(0.0, size);
        self.min_y = anchor - pivot / scale;
        self.max_y = self.min_y + size;
        self.update();
    }

    /// Zoom both axes about a screen pivot.
    pub fn zoom(&mut self, factor: f64, pivot: Point) {
        self.zoom_x(factor, pivot.x);
        self.zoom_y(factor, pivot.y);
    }

    /// Pan by a screen-space offset.
    pub fn shift(&mut self, delta: Vec2) {
        self.shift_layout(Vec2::new(delta.x / self.scale_x, delta.y / self.scale_y));
    }

    /// Pan by a layout-space offset.
    pub fn shift_layout(&mut self, delta: Vec2) {
        self.min_x += delta.x;
        self.max_x += delta.x;
        self.min_y += delta.y;
        self.max_y += delta.y;
    }

    /// Pan so that `layout` is drawn at screen point `pivot`.
    pub fn align(&mut self, layout: Point, pivot: Point) {
        let current = self.layout_to_screen(layout);
        self.shift(current - pivot);
    }

    /// Linear blend of every field; the pixel size is rounded.
    pub fn interpolate(from: &Self, to: &Self, ratio: f64) -> Self {
        let lerp = |a: f64, b: f64| a * (1.0 - ratio) + b * ratio;
        let lerp_px = |a: u32, b: u32| {
            let v = lerp(f64::from(a), f64::from(b)).round().max(0.0);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "Blend of two u32 sizes stays in range."
            )]
            let v = v as u32;
            v
        };
        Self::new(
            Rect::new(
                lerp(from.min_x, to.min_x),
                lerp(from.min_y, to.min_y),
                lerp(from.max_x, to.max_x),
                lerp(from.max_y, to.max_y),
            ),
            lerp_px(from.width, to.width),
            lerp_px(from.height, to.height),
        )
    }

    /// The transform equal to applying `inner` first and then `self`,
    /// where `self` treats `inner`'s screen coordinates as its layout space.
    pub fn concatenate(&self, inner: &Self) -> Self {
        let min_x = inner.min_x + self.min_x / inner.scale_x;
        let min_y = inner.min_y + self.min_y / inner.scale_y;
        let max_x = min_x + pixel_span(self.width) / (inner.scale_x * self.scale_x);
        let max_y = min_y + pixel_span(self.height) / (inner.scale_y * self.scale_y);
        Self::new(Rect::new(min_x, min_y, max_x, max_y), self.width, self.height)
    }

    /// The screen → screen change from `start` to `end`: maps where a layout
    /// point was drawn under `start` to where it is drawn under `end`.
    pub fn incremental(start: &Self, end: &Self) -> Self {
        let min_x = (end.min_x - start.min_x) * start.scale_x;
        let min_y = (end.min_y - start.min_y) * start.scale_y;
        let max_x = min_x + pixel_span(end.width) * start.scale_x / end.scale_x;
        let max_y = min_y + pixel_span(end.height) * start.scale_y / end.scale_y;
        Self::new(Rect::new(min_x, min_y, max_x, max_y), end.width, end.height)
    }

    /// Like [`incremental`](Self::incremental) but with X left untouched.
    pub fn incremental_y(start: &Self, end: &Self) -> Self {
        let mut t = Self::incremental(start, end);
        t.min_x = 0.0;
        t.max_x = pixel_span(end.width);
        t.update();
        t
    }
}

fn pixel_span(size: u32) -> f64 {
    f64::from(size.max(2)) - 1.0
}

fn layout_span(min: f64, max: f64) -> f64 {
    (max - min).max(f64::MIN_POSITIVE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point, b: Point) -> bool {
        (a - b).hypot() < 1e-9
    }

    #[test]
    fn corners_map_to_pixel_edges() {
        let t = ScreenTransform::new(Rect::new(0.0, 0.0, 10.0, 5.0), 101, 51);
        assert_eq!(t.scale_x(), 10.0);
        assert_eq!(t.scale_y(), 10.0);
        assert!(close(t.layout_to_screen(Point::new(0.0, 0.0)), Point::ZERO));
        assert!(close(
            t.layout_to_screen(Point::new(10.0, 5.0)),
            Point::new(100.0, 50.0)
        ));
        let p = Point::new(3.3, 1.7);
        assert!(close(t.screen_to_layout(t.layout_to_screen(p)), p), "round trip");
    }

    #[test]
    fn zoom_keeps_pivot_fixed() {
        let mut t = ScreenTransform::new(Rect::new(0.0, 0.0, 10.0, 10.0), 201, 201);
        let pivot = Point::new(50.0, 120.0);
        let before = t.screen_to_layout(pivot);
        t.zoom(0.5, pivot);
        assert!(close(t.screen_to_layout(pivot), before), "layout under pivot is stable");
        assert!((t.max_x() - t.min_x() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn align_pins_layout_point() {
        let mut t = ScreenTransform::new(Rect::new(0.0, 0.0, 10.0, 10.0), 101, 101);
        let target = Point::new(7.0, 2.0);
        t.align(target, Point::new(10.0, 90.0));
        assert!(close(t.layout_to_screen(target), Point::new(10.0, 90.0)));
    }

    #[test]
    fn resize_keeps_scale() {
        let mut t = ScreenTransform::new(Rect::new(0.0, 0.0, 10.0, 10.0), 101, 101);
        t.set_screen_size(201, 51);
        assert_eq!(t.scale_x(), 10.0);
        assert_eq!(t.max_x(), 20.0);
        assert_eq!(t.max_y(), 5.0);
    }

    #[test]
    fn incremental_maps_start_screen_to_end_screen() {
        let start = ScreenTransform::new(Rect::new(0.0, 0.0, 10.0, 10.0), 101, 101);
        let mut end = start;
        end.zoom(0.5, Point::new(30.0, 70.0));
        end.shift(Vec2::new(4.0, -9.0));
        let inc = ScreenTransform::incremental(&start, &end);
        let p = Point::new(6.5, 3.25);
        let via_start = inc.layout_to_screen(start.layout_to_screen(p));
        assert!(close(via_start, end.layout_to_screen(p)));
        assert!(close(
            inc.concatenate(&start).layout_to_screen(p),
            end.layout_to_screen(p)
        ));
    }

    #[test]
    fn incremental_y_leaves_x_alone() {
        let start = ScreenTransform::new(Rect::new(0.0, 0.0, 10.0, 10.0), 101, 101);
        let mut end = start;
        end.shift_layout(Vec2::new(3.0, 2.0));
        let inc = ScreenTransform::incremental_y(&start, &end);
        let s = Point::new(40.0, 40.0);
        let moved = inc.layout_to_screen(s);
        assert!((moved.x - 40.0).abs() < 1e-9, "x unchanged");
        assert!((moved.y - 20.0).abs() < 1e-9, "y follows the 2-timepoint pan");
    }

    #[test]
    fn interpolate_endpoints() {
        let a = ScreenTransform::new(Rect::new(0.0, 0.0, 10.0, 10.0), 100, 100);
        let b = ScreenTransform::new(Rect::new(5.0, 2.0, 7.0, 4.0), 200, 50);
        assert_eq!(ScreenTransform::interpolate(&a, &b, 0.0), a);
        assert_eq!(ScreenTransform::interpolate(&a, &b, 1.0), b);
        let mid = ScreenTransform::interpolate(&a, &b, 0.5);
        assert_eq!(mid.min_x(), 2.5);
        assert_eq!(mid.width(), 150);
    }
}
