// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation tools built on a [`Surface`].

pub mod animation;
pub mod frame_mark;
pub mod segment_mark;

use crate::error::Result;
use crate::models::scene::Node;
use crate::surface::gesture::Gesture;
use crate::surface::Surface;
use std::time::Instant;

/// Pointer travel (stage pixels) below which a press/release is a click.
pub const CLICK_DISTANCE: f32 = 3.0;

/// What the canvas needs from a tool.
pub trait MarkTool {
    fn surface(&self) -> &Surface;

    fn surface_mut(&mut self) -> &mut Surface;

    /// Dispatch one gesture through the tool's interaction state machine.
    fn handle_gesture(&mut self, gesture: &Gesture);

    /// Advance timers and animations. Returns true while another frame is
    /// needed.
    fn tick(&mut self, now: Instant) -> bool;

    /// Paint the tool's regions over the background. `origin` is the screen
    /// position of the stage's top-left corner.
    fn paint(&self, painter: &egui::Painter, origin: egui::Pos2, now: Instant);

    /// Snapshot nodes for the tool's regions, in draw order.
    fn scene_nodes(&self) -> Vec<Node>;

    /// Snapshot of the whole rendering tree.
    fn snapshot(&self) -> Node {
        self.surface().snapshot(self.scene_nodes())
    }

    fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.snapshot())?)
    }
}
