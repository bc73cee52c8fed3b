// Copyright 2025 the Lineage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tunable parameters of projection, animation and viewport limits.

use core::time::Duration;

use kurbo::Vec2;
use lineage_layout::MIN_SUBDIVISION;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Invalid [`ViewOptions`] value.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OptionsError {
    /// A value that must be strictly positive was not.
    #[error("`{field}` must be positive, got {value}")]
    NonPositive {
        /// Offending field.
        field: &'static str,
        /// Its value.
        value: f64,
    },
    /// A value fell outside its closed range.
    #[error("`{field}` must be within {min}..={max}, got {value}")]
    OutOfRange {
        /// Offending field.
        field: &'static str,
        /// Its value.
        value: f64,
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },
    /// Dense-range bisection needs at least three entries to split.
    #[error("`min_subdivision` must be at least 3, got {0}")]
    Subdivision(usize),
}

/// Scalar settings for a [`LineageView`](crate::LineageView).
///
/// Missing fields take their defaults when deserialized.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewOptions {
    /// Vertices closer than this many pixels collapse into dense ranges.
    pub min_vertex_pixel_distance: f64,
    /// Columns narrower than this many pixels get no header.
    pub min_column_width: f64,
    /// Smallest run the density bisection still splits.
    pub min_subdivision: usize,
    /// Length of animated transitions, in milliseconds. Zero disables animation.
    pub animation_duration_ms: u64,
    /// Smallest visible width, in layout X units.
    pub min_visible_width: f64,
    /// Smallest visible height, in timepoints.
    pub min_visible_height: f64,
    /// Largest visible extent as a multiple of the laid-out extent.
    pub overview_margin: f64,
    /// Fraction of the screen allowed beyond the layout bounds on each side.
    pub border_ratio: f64,
    /// Pixels reserved on the left for decorations, added to every screen X.
    pub decoration_offset_x: f64,
    /// Pixels reserved on top for decorations, added to every screen Y.
    pub decoration_offset_y: f64,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            min_vertex_pixel_distance: 2.0,
            min_column_width: 30.0,
            min_subdivision: 3,
            animation_duration_ms: 250,
            min_visible_width: 2.0,
            min_visible_height: 4.0,
            overview_margin: 1.1,
            border_ratio: 0.5,
            decoration_offset_x: 0.0,
            decoration_offset_y: 0.0,
        }
    }
}

impl ViewOptions {
    /// Check every field.
    pub fn validate(&self) -> Result<(), OptionsError> {
        positive("min_vertex_pixel_distance", self.min_vertex_pixel_distance)?;
        positive("min_visible_width", self.min_visible_width)?;
        positive("min_visible_height", self.min_visible_height)?;
        positive("overview_margin", self.overview_margin)?;
        in_range("min_column_width", self.min_column_width, 0.0, f64::MAX)?;
        in_range("border_ratio", self.border_ratio, 0.0, 1.0)?;
        if self.min_subdivision < MIN_SUBDIVISION {
            return Err(OptionsError::Subdivision(self.min_subdivision));
        }
        Ok(())
    }

    /// Replace invalid fields with their defaults, logging each replacement.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        while let Err(err) = self.validate() {
            tracing::warn!(%err, "invalid view option replaced by its default");
            match err {
                OptionsError::NonPositive { field, .. } | OptionsError::OutOfRange { field, .. } => {
                    match field {
                        "min_vertex_pixel_distance" => {
                            self.min_vertex_pixel_distance = defaults.min_vertex_pixel_distance;
                        }
                        "min_visible_width" => self.min_visible_width = defaults.min_visible_width,
                        "min_visible_height" => {
                            self.min_visible_height = defaults.min_visible_height;
                        }
                        "overview_margin" => self.overview_margin = defaults.overview_margin,
                        "min_column_width" => self.min_column_width = defaults.min_column_width,
                        _ => self.border_ratio = defaults.border_ratio,
                    }
                }
                OptionsError::Subdivision(_) => self.min_subdivision = defaults.min_subdivision,
            }
        }
        self
    }

    /// Animation length.
    pub fn animation_duration(&self) -> Duration {
        Duration::from_millis(self.animation_duration_ms)
    }

    /// Decoration offset as a vector.
    pub fn decoration_offset(&self) -> Vec2 {
        Vec2::new(self.decoration_offset_x, self.decoration_offset_y)
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), OptionsError> {
    // `!(value > 0.0)` also rejects NaN.
    if !(value > 0.0) {
        return Err(OptionsError::NonPositive { field, value });
    }
    Ok(())
}

fn in_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), OptionsError> {
    if !(min..=max).contains(&value) {
        return Err(OptionsError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}
