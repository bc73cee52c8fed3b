// Copyright 2025 the Lineage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-timepoint spatial index over laid-out vertices.
//!
//! Each timepoint owns a [`TimepointRow`] sorted by layout X. Rows answer
//! predecessor searches and density questions; the [`VertexTable`] combines
//! rows for nearest-point and rectangle queries.
//!
//! Layout Y is the timepoint itself, so "layout space" is X by timepoint.
//! Distances mix the two axes through an aspect ratio that converts a
//! timepoint difference into layout X units (screen scales differ per axis).

use std::collections::BTreeMap;
use std::ops::Range;

use kurbo::{Point, Rect};
use lineage_graph::VertexId;

/// Smallest run length [`TimepointRow::dense_ranges`] still bisects.
pub const MIN_SUBDIVISION: usize = 3;

/// One laid-out vertex in a row.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RowEntry<K> {
    /// Payload, normally a [`VertexId`].
    pub key: K,
    /// Layout X.
    pub x: f64,
}

/// An inclusive run of row indices collapsed into a single dense marker.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DenseRange {
    /// First index in the run.
    pub first: usize,
    /// Last index in the run (inclusive).
    pub last: usize,
}

/// The vertices of one timepoint, sorted by layout X.
#[derive(Clone, Debug)]
pub struct TimepointRow<K> {
    entries: Vec<RowEntry<K>>,
    min_spacing: f64,
}

impl<K> Default for TimepointRow<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            min_spacing: f64::INFINITY,
        }
    }
}

impl<K: Copy> TimepointRow<K> {
    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the row has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in increasing X order.
    pub fn entries(&self) -> &[RowEntry<K>] {
        &self.entries
    }

    /// Entry at `index`.
    pub fn get(&self, index: usize) -> Option<RowEntry<K>> {
        self.entries.get(index).copied()
    }

    /// Smallest distance between neighbouring entries, or infinity for fewer than two.
    pub fn min_spacing(&self) -> f64 {
        self.min_spacing
    }

    /// Largest index whose X is `<= x`, or `None` if `x` is below the first entry.
    pub fn predecessor(&self, x: f64) -> Option<usize> {
        self.predecessor_in(x, 0..self.entries.len())
    }

    /// Like [`predecessor`](Self::predecessor) but restricted to `range`.
    ///
    /// Returns `None` if no entry in `range` has X `<= x`.
    pub fn predecessor_in(&self, x: f64, range: Range<usize>) -> Option<usize> {
        let start = range.start;
        let end = range.end.min(self.entries.len());
        if start >= end {
            return None;
        }
        let n = self.entries[start..end].partition_point(|e| e.x <= x);
        (n > 0).then(|| start + n - 1)
    }

    /// Index range of entries with `x0 <= X <= x1`.
    pub fn span(&self, x0: f64, x1: f64) -> Range<usize> {
        let left = self.entries.partition_point(|e| e.x < x0);
        let right = left + self.entries[left..].partition_point(|e| e.x <= x1);
        left..right
    }

    /// Index of the entry nearest to `x` within `range`.
    fn nearest_in(&self, x: f64, range: Range<usize>) -> Option<usize> {
        if range.is_empty() {
            return None;
        }
        let below = self.predecessor_in(x, range.clone());
        let above = match below {
            Some(i) if i + 1 < range.end => Some(i + 1),
            Some(_) => None,
            None => Some(range.start),
        };
        match (below, above) {
            (Some(b), Some(a)) => {
                if (x - self.entries[b].x) <= (self.entries[a].x - x) {
                    Some(b)
                } else {
                    Some(a)
                }
            }
            (b, a) => b.or(a),
        }
    }

    /// Split `range` into runs too dense to draw individually.
    ///
    /// A run `i..=j` is dense when its X span, after subtracting the row's
    /// minimum spacing for every interior gap, is below `allowed`. Otherwise
    /// the run is bisected (the halves share the middle entry) until it holds
    /// fewer than `min_subdivision` entries, and touching dense halves are
    /// merged again. Entries not covered by a returned run are sparse.
    ///
    /// `min_subdivision` is raised to [`MIN_SUBDIVISION`] when smaller, since
    /// bisecting a two-entry run reproduces it.
    pub fn dense_ranges(
        &self,
        range: Range<usize>,
        allowed: f64,
        min_subdivision: usize,
    ) -> Vec<DenseRange> {
        let end = range.end.min(self.entries.len());
        if self.entries.len() < 2 || end < range.start + 2 {
            return Vec::new();
        }
        self.dense_ranges_rec(range.start, end, allowed, min_subdivision.max(MIN_SUBDIVISION))
    }

    fn dense_ranges_rec(
        &self,
        from: usize,
        to: usize,
        allowed: f64,
        min_subdivision: usize,
    ) -> Vec<DenseRange> {
        let (i, j) = (from, to - 1);
        let gaps = (j - i) as f64 - 1.0;
        let span = (self.entries[j].x - self.entries[i].x) - self.min_spacing * gaps;
        if span < allowed {
            return vec![DenseRange { first: i, last: j }];
        }
        if to - from < min_subdivision {
            return Vec::new();
        }
        let k = (i + j) / 2;
        let mut left = self.dense_ranges_rec(i, k + 1, allowed, min_subdivision);
        let right = self.dense_ranges_rec(k, j + 1, allowed, min_subdivision);
        match (left.last_mut(), right.first()) {
            (Some(l), Some(r)) if l.last == r.first => {
                l.last = r.last;
                left.extend_from_slice(&right[1..]);
            }
            _ => left.extend_from_slice(&right),
        }
        left
    }

    fn finish(&mut self) {
        // Already sorted when filled by a layout pass; a stable sort is linear then.
        self.entries.sort_by(|a, b| a.x.total_cmp(&b.x));
        self.min_spacing = self
            .entries
            .windows(2)
            .map(|w| w[1].x - w[0].x)
            .fold(f64::INFINITY, f64::min);
    }
}

impl<K: Copy + PartialEq> TimepointRow<K> {
    /// Index of `key` in this row.
    pub fn position_of(&self, key: K, x: f64) -> Option<usize> {
        let range = self.span(x, x);
        range.clone().find(|&i| self.entries[i].key == key).or_else(|| {
            // Fall back to a scan if the caller's X is out of date.
            self.entries.iter().position(|e| e.key == key)
        })
    }
}

/// Result of a nearest-vertex query.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Closest<K> {
    /// The vertex found.
    pub key: K,
    /// Its layout X.
    pub x: f64,
    /// Its timepoint.
    pub timepoint: i32,
    /// Aspect-corrected distance to the query point, in layout X units.
    pub distance: f64,
}

/// Laid-out vertices grouped by timepoint, each row sorted by X.
///
/// Filled by [`insert`](Self::insert) and sealed by [`finish`](Self::finish);
/// queries are only meaningful after `finish`.
#[derive(Clone, Debug)]
pub struct VertexTable<K = VertexId> {
    rows: BTreeMap<i32, TimepointRow<K>>,
    len: usize,
}

impl<K> Default for VertexTable<K> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            len: 0,
        }
    }
}

impl<K: Copy> VertexTable<K> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove all entries.
    pub fn clear(&mut self) {
        self.rows.clear();
        self.len = 0;
    }

    /// Add an entry to the row of `timepoint`.
    pub fn insert(&mut self, timepoint: i32, key: K, x: f64) {
        self.rows
            .entry(timepoint)
            .or_default()
            .entries
            .push(RowEntry { key, x });
        self.len += 1;
    }

    /// Sort every row by X and refresh cached spacing.
    pub fn finish(&mut self) {
        for row in self.rows.values_mut() {
            row.finish();
        }
    }

    /// Total number of entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Row of a timepoint.
    pub fn row(&self, timepoint: i32) -> Option<&TimepointRow<K>> {
        self.rows.get(&timepoint)
    }

    /// All rows in increasing timepoint order.
    pub fn rows(&self) -> impl DoubleEndedIterator<Item = (i32, &TimepointRow<K>)> + '_ {
        self.rows.iter().map(|(&t, r)| (t, r))
    }

    /// Rows with `first <= timepoint <= last`.
    pub fn rows_between(
        &self,
        first: i32,
        last: i32,
    ) -> impl DoubleEndedIterator<Item = (i32, &TimepointRow<K>)> + '_ {
        (first <= last)
            .then(|| self.rows.range(first..=last))
            .into_iter()
            .flatten()
            .map(|(&t, r)| (t, r))
    }

    /// Smallest and largest occupied timepoint.
    pub fn timepoint_bounds(&self) -> Option<(i32, i32)> {
        let first = *self.rows.keys().next()?;
        let last = *self.rows.keys().next_back()?;
        Some((first, last))
    }

    /// Entries whose layout position lies inside `rect` (inclusive bounds).
    ///
    /// `rect` is in layout space: X is layout X, Y is timepoint.
    pub fn vertices_within(&self, rect: Rect) -> Vec<K> {
        let mut out = Vec::new();
        let (first, last) = timepoint_span(rect);
        for (_, row) in self.rows_between(first, last) {
            let span = row.span(rect.x0, rect.x1);
            out.extend(row.entries[span].iter().map(|e| e.key));
        }
        out
    }

    /// The entry closest to `point`.
    ///
    /// `aspect` scales timepoint differences into layout X units
    /// (screen pixels per timepoint divided by screen pixels per X unit).
    /// Rows are visited outward from the query row in order of vertical
    /// distance; the walk stops once that distance alone exceeds the best hit.
    pub fn closest(&self, point: Point, aspect: f64) -> Option<Closest<K>> {
        let pivot = point.y.floor();
        #[allow(
            clippy::cast_possible_truncation,
            reason = "Timepoints are i32; the saturating float cast is intended."
        )]
        let pivot = pivot as i32;
        let mut below = self.rows.range(..=pivot).rev().peekable();
        let mut above = self.rows.range(pivot.saturating_add(1)..).peekable();
        let dy = |t: i32| (point.y - f64::from(t)).abs() * aspect;

        let mut best: Option<Closest<K>> = None;
        loop {
            let next = match (below.peek(), above.peek()) {
                (Some(&(&b, _)), Some(&(&a, _))) => {
                    if dy(b) <= dy(a) {
                        below.next()
                    } else {
                        above.next()
                    }
                }
                (Some(_), None) => below.next(),
                (None, Some(_)) => above.next(),
                (None, None) => None,
            };
            let Some((&t, row)) = next else {
                break;
            };
            let ddy = dy(t);
            if best.is_some_and(|b| ddy >= b.distance) {
                break;
            }
            if let Some(i) = row.nearest_in(point.x, 0..row.len()) {
                let e = row.entries[i];
                let distance = (point.x - e.x).hypot(ddy);
                if best.is_none_or(|b| distance < b.distance) {
                    best = Some(Closest {
                        key: e.key,
                        x: e.x,
                        timepoint: t,
                        distance,
                    });
                }
            }
        }
        best
    }

    /// The entry inside `rect` closest to `point`.
    pub fn closest_within(&self, rect: Rect, point: Point, aspect: f64) -> Option<Closest<K>> {
        let (first, last) = timepoint_span(rect);
        let mut best: Option<Closest<K>> = None;
        for (t, row) in self.rows_between(first, last) {
            let ddy = (point.y - f64::from(t)).abs() * aspect;
            if best.is_some_and(|b| ddy >= b.distance) {
                continue;
            }
            let span = row.span(rect.x0, rect.x1);
            if let Some(i) = row.nearest_in(point.x, span) {
                let e = row.entries[i];
                let distance = (point.x - e.x).hypot(ddy);
                if best.is_none_or(|b| distance < b.distance) {
                    best = Some(Closest {
                        key: e.key,
                        x: e.x,
                        timepoint: t,
                        distance,
                    });
                }
            }
        }
        best
    }
}

/// Integer timepoints covered by the Y extent of `rect`.
fn timepoint_span(rect: Rect) -> (i32, i32) {
    let r = rect.abs();
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Timepoints are i32; the saturating float cast is intended."
    )]
    (r.y0.ceil() as i32, r.y1.floor() as i32)
}
