// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Stage pan and zoom.
//!
//! The viewport is the stage transform: every content point `p` lands on
//! screen at `position + p * scale`. Wheel zoom keeps the point under the
//! cursor fixed; pinch zoom does the same around the finger midpoint.

use crate::config::MarkConfig;
use crate::util::geometry::{distance, midpoint};
use egui::{Pos2, Vec2};

/// Baseline recorded when a two-finger gesture starts.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Pinch {
    initial_distance: f32,
    initial_scale: f32,
    last_scale: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    pub scale: f32,
    pub position: Vec2,
    min_scale: f32,
    max_scale: f32,
    scale_by: f32,
    pinch: Option<Pinch>,
}

impl Viewport {
    pub fn new(config: &MarkConfig) -> Self {
        Self {
            scale: 1.0,
            position: Vec2::ZERO,
            min_scale: config.min_scale,
            max_scale: config.max_scale,
            scale_by: config.scale_by,
            pinch: None,
        }
    }

    fn clamp(&self, scale: f32) -> f32 {
        scale.max(self.min_scale).min(self.max_scale)
    }

    /// Apply one wheel event at `pointer` (stage coordinates).
    ///
    /// Negative `delta_y` zooms in, positive zooms out, zero is ignored.
    pub fn zoom_wheel(&mut self, pointer: Pos2, delta_y: f32) {
        if delta_y == 0.0 {
            return;
        }
        let old_scale = self.scale;
        let mouse_point_to = (pointer.to_vec2() - self.position) / old_scale;
        let new_scale = if delta_y < 0.0 {
            old_scale * self.scale_by
        } else {
            old_scale / self.scale_by
        };
        let new_scale = self.clamp(new_scale);

        self.scale = new_scale;
        self.position = pointer.to_vec2() - mouse_point_to * new_scale;
        // Shrink back to the original position
        if new_scale <= 1.0 {
            self.position = Vec2::ZERO;
        }
        log::trace!("Wheel zoom to {:.3}", self.scale);
    }

    /// Record the pinch baseline for two touch points.
    pub fn pinch_begin(&mut self, a: Pos2, b: Pos2) {
        self.pinch = Some(Pinch {
            initial_distance: distance(a, b),
            initial_scale: self.scale,
            last_scale: self.scale,
        });
    }

    /// Rescale for the current finger positions.
    ///
    /// Re-anchoring is incremental: the pan is corrected by the ratio to
    /// the previous frame's scale, not to the baseline.
    pub fn pinch_update(&mut self, a: Pos2, b: Pos2) {
        let Some(pinch) = self.pinch.as_mut() else {
            return;
        };
        if pinch.initial_distance <= f32::EPSILON {
            return;
        }
        let scale_change = distance(a, b) / pinch.initial_distance;
        let scale = (pinch.initial_scale * scale_change)
            .max(self.min_scale)
            .min(self.max_scale);
        let center = midpoint(a, b).to_vec2();

        self.position = center - (center - self.position) * (scale / pinch.last_scale);
        self.scale = scale;
        pinch.last_scale = scale;
    }

    /// Finish the pinch. Returns whether one was in progress.
    pub fn pinch_end(&mut self) -> bool {
        self.pinch.take().is_some()
    }

    pub fn is_pinching(&self) -> bool {
        self.pinch.is_some()
    }

    /// Shift the view by a stage-pixel offset.
    pub fn pan_by(&mut self, delta: Vec2) {
        self.position += delta;
    }
}
