// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Drawing surface shared by the annotation tools.
//!
//! A [`Surface`] owns the rendering tree: the stage (with its pan/zoom
//! [`Viewport`]), the layer that collects redraw requests, the pannable
//! content group and the background image inside it. Tools own a surface
//! and drive it through the methods below.

pub mod gesture;
pub mod viewport;

use crate::config::MarkConfig;
use crate::error::{MarkError, Result};
use crate::io::media::LoadedImage;
use crate::models::scene::{Attrs, Node};
use crate::util::geometry::{auto_pan_step, nearest_edge, pointer_to_image_space};
use egui::{Pos2, Vec2};
use gesture::{Gesture, GestureSet};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use viewport::Viewport;

/// Identifier of the outer host container.
pub const MARK_CONTAINER_ID: &str = "mark-container";
/// Identifier of the canvas container nested in the outer one.
pub const CANVAS_CONTAINER_ID: &str = "mark-canvas-container";
/// Identifier given to the background image node.
pub const BACKGROUND_IMAGE_ID: &str = "background-image";

/// Class of device the surface runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    Desktop,
    Mobile,
}

impl DeviceClass {
    pub fn detect() -> Self {
        if cfg!(any(target_os = "android", target_os = "ios")) {
            DeviceClass::Mobile
        } else {
            DeviceClass::Desktop
        }
    }

    pub fn gesture_set(&self) -> GestureSet {
        match self {
            DeviceClass::Desktop => GestureSet::Mouse,
            DeviceClass::Mobile => GestureSet::Touch,
        }
    }
}

/// An element of the host layout the surface mounts into.
#[derive(Debug, Clone, PartialEq)]
pub struct HostElement {
    pub id: String,
    pub size: Vec2,
    pub children: Vec<HostElement>,
}

impl HostElement {
    pub fn new(id: &str, size: Vec2) -> Self {
        Self {
            id: id.to_string(),
            size,
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: HostElement) -> Self {
        self.children.push(child);
        self
    }

    /// The standard two-level layout for a canvas of `size`.
    pub fn mark_layout(size: Vec2) -> Vec<HostElement> {
        vec![HostElement::new(MARK_CONTAINER_ID, size)
            .with_child(HostElement::new(CANVAS_CONTAINER_ID, size))]
    }
}

/// Top of the tree; carries the viewport transform.
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub size: Vec2,
    pub viewport: Viewport,
}

/// Collects redraw requests until the host repaints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layer {
    redraw: bool,
}

impl Layer {
    pub fn batch_draw(&mut self) {
        self.redraw = true;
    }

    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw)
    }
}

/// Pannable group holding the background and all regions.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentGroup {
    /// Offset in stage-local units (scaled by the viewport)
    pub position: Vec2,
    pub size: Vec2,
    pub draggable: bool,
}

/// The background image node.
pub struct BackgroundImage {
    pub source: String,
    pub size: Vec2,
    pixels: Option<egui::ColorImage>,
    texture: Option<egui::TextureHandle>,
}

impl std::fmt::Debug for BackgroundImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundImage")
            .field("source", &self.source)
            .field("size", &self.size)
            .finish()
    }
}

impl BackgroundImage {
    /// Upload the pixels on first use and return the texture.
    pub fn texture(&mut self, ctx: &egui::Context) -> Option<&egui::TextureHandle> {
        if self.texture.is_none() {
            if let Some(pixels) = self.pixels.take() {
                self.texture = Some(ctx.load_texture(
                    BACKGROUND_IMAGE_ID,
                    pixels,
                    egui::TextureOptions::LINEAR,
                ));
            }
        }
        self.texture.as_ref()
    }
}

pub struct Surface {
    pub stage: Stage,
    pub layer: Layer,
    pub content: ContentGroup,
    background: Option<BackgroundImage>,
    device: DeviceClass,
    config: MarkConfig,
    content_drag: Option<Pos2>,
    draggable_before_pinch: Option<bool>,
    drag_restore_at: Option<Instant>,
}

impl Surface {
    /// Mount a surface into the host layout.
    ///
    /// Fails when the mark container or its canvas container is missing.
    pub fn new(host: &[HostElement], config: MarkConfig) -> Result<Self> {
        let container = host
            .iter()
            .find(|e| e.id == MARK_CONTAINER_ID)
            .ok_or_else(|| MarkError::ContainerNotFound {
                id: MARK_CONTAINER_ID.to_string(),
            })?;
        let canvas = container
            .children
            .iter()
            .find(|e| e.id == CANVAS_CONTAINER_ID)
            .ok_or_else(|| MarkError::ContainerNotFound {
                id: CANVAS_CONTAINER_ID.to_string(),
            })?;

        let device = config.device.unwrap_or_else(DeviceClass::detect);
        log::debug!("Mounted surface {:?} on {:?}", canvas.size, device);

        Ok(Self {
            stage: Stage {
                size: canvas.size,
                viewport: Viewport::new(&config),
            },
            layer: Layer::default(),
            content: ContentGroup {
                position: Vec2::ZERO,
                size: Vec2::ZERO,
                draggable: true,
            },
            background: None,
            device,
            config,
            content_drag: None,
            draggable_before_pinch: None,
            drag_restore_at: None,
        })
    }

    pub fn config(&self) -> &MarkConfig {
        &self.config
    }

    pub fn device(&self) -> DeviceClass {
        self.device
    }

    pub fn gesture_set(&self) -> GestureSet {
        self.device.gesture_set()
    }

    /// Install a decoded image as the background node.
    ///
    /// The content group takes the image's natural size.
    pub fn draw_background_image(&mut self, image: LoadedImage) {
        let size = image.size();
        let pixels = egui::ColorImage::from_rgba_unmultiplied(
            [image.width as usize, image.height as usize],
            &image.pixels,
        );
        self.content.size = size;
        self.background = Some(BackgroundImage {
            source: image.source,
            size,
            pixels: Some(pixels),
            texture: None,
        });
        self.layer.batch_draw();
        log::info!("Background image installed ({}x{})", size.x, size.y);
    }

    pub fn background(&self) -> Option<&BackgroundImage> {
        self.background.as_ref()
    }

    pub fn background_mut(&mut self) -> Option<&mut BackgroundImage> {
        self.background.as_mut()
    }

    pub fn is_ready(&self) -> bool {
        self.background.is_some()
    }

    pub fn image_size(&self) -> Option<Vec2> {
        self.background.as_ref().map(|b| b.size)
    }

    pub fn scale(&self) -> f32 {
        self.stage.viewport.scale
    }

    /// Absolute (stage) position of the content group's origin.
    pub fn content_absolute_position(&self) -> Pos2 {
        (self.stage.viewport.position + self.content.position * self.scale()).to_pos2()
    }

    pub fn to_content(&self, stage_pos: Pos2) -> Pos2 {
        pointer_to_image_space(stage_pos, self.content_absolute_position(), self.scale())
    }

    pub fn to_stage(&self, content_pos: Pos2) -> Pos2 {
        self.content_absolute_position() + content_pos.to_vec2() * self.scale()
    }

    /// Whether a stage point lies on the background image.
    pub fn hits_background(&self, stage_pos: Pos2) -> bool {
        let Some(size) = self.image_size() else {
            return false;
        };
        let p = self.to_content(stage_pos);
        p.x >= 0.0 && p.y >= 0.0 && p.x <= size.x && p.y <= size.y
    }

    pub fn set_stage_size(&mut self, size: Vec2) {
        self.stage.size = size;
    }

    /// Handle wheel and pinch gestures for this surface's gesture set.
    ///
    /// Returns true when the gesture changed the viewport.
    pub fn handle_navigation(&mut self, gesture: &Gesture) -> bool {
        match (self.gesture_set(), gesture) {
            (GestureSet::Mouse, Gesture::Wheel { pos, delta_y }) => {
                self.stage.viewport.zoom_wheel(*pos, *delta_y);
                self.layer.batch_draw();
                true
            }
            (GestureSet::Touch, Gesture::TouchStart { points }) if points.len() == 2 => {
                if self.draggable_before_pinch.is_none() {
                    self.draggable_before_pinch = Some(self.content.draggable);
                }
                self.content.draggable = false;
                self.content_drag = None;
                self.stage.viewport.pinch_begin(points[0], points[1]);
                true
            }
            (GestureSet::Touch, Gesture::TouchMove { points }) if points.len() == 2 => {
                if !self.stage.viewport.is_pinching() {
                    return false;
                }
                self.stage.viewport.pinch_update(points[0], points[1]);
                self.layer.batch_draw();
                true
            }
            (GestureSet::Touch, Gesture::TouchEnd { .. }) => {
                self.stage.viewport.pinch_end();
                if let Some(draggable) = self.draggable_before_pinch.take() {
                    self.content.draggable = draggable;
                }
                false
            }
            _ => false,
        }
    }

    /// Start dragging the content group if it is draggable.
    pub fn begin_content_drag(&mut self, pos: Pos2) -> bool {
        if self.content.draggable && self.is_ready() {
            self.content_drag = Some(pos);
            true
        } else {
            false
        }
    }

    pub fn drag_content(&mut self, pos: Pos2) {
        if !self.content.draggable {
            self.content_drag = None;
            return;
        }
        if let Some(last) = self.content_drag.replace(pos) {
            self.content.position += (pos - last) / self.scale();
            self.layer.batch_draw();
        }
    }

    pub fn end_content_drag(&mut self) {
        self.content_drag = None;
    }

    pub fn is_dragging_content(&self) -> bool {
        self.content_drag.is_some()
    }

    /// Enable or disable content dragging, cancelling any pending restore.
    pub fn set_draggable(&mut self, draggable: bool) {
        self.drag_restore_at = None;
        self.content.draggable = draggable;
        if !draggable {
            self.content_drag = None;
        }
    }

    /// Re-enable content dragging after the configured delay.
    pub fn schedule_drag_restore(&mut self) {
        self.drag_restore_at =
            Some(Instant::now() + Duration::from_millis(self.config.drag_restore_delay_ms));
    }

    /// Scroll the view when the pointer is near a stage edge.
    pub fn auto_pan(&mut self, pointer: Pos2) {
        if let Some(edge) = nearest_edge(pointer, self.stage.size, self.config.edge_threshold) {
            self.stage
                .viewport
                .pan_by(auto_pan_step(edge, self.config.pan_step));
        }
        self.layer.batch_draw();
    }

    /// Apply due timers. Returns true while a timer is still pending.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.drag_restore_at {
            Some(at) if now >= at => {
                self.drag_restore_at = None;
                self.content.draggable = true;
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    /// Snapshot of stage, layer, content group and background, with
    /// `regions` appended after the background node.
    pub fn snapshot(&self, regions: Vec<Node>) -> Node {
        let viewport = &self.stage.viewport;
        let mut content_children = Vec::new();
        if let Some(bg) = &self.background {
            content_children.push(Node::new(
                "Image",
                Attrs {
                    id: Some(BACKGROUND_IMAGE_ID.to_string()),
                    width: Some(bg.size.x),
                    height: Some(bg.size.y),
                    ..Default::default()
                },
            ));
        }
        content_children.extend(regions);

        let content = Node::new(
            "Group",
            Attrs {
                x: Some(self.content.position.x),
                y: Some(self.content.position.y),
                width: Some(self.content.size.x),
                height: Some(self.content.size.y),
                draggable: Some(self.content.draggable),
                ..Default::default()
            },
        )
        .with_children(content_children);

        Node::new(
            "Stage",
            Attrs {
                x: Some(viewport.position.x),
                y: Some(viewport.position.y),
                width: Some(self.stage.size.x),
                height: Some(self.stage.size.y),
                scale: Some(viewport.scale),
                ..Default::default()
            },
        )
        .with_children(vec![Node::new("Layer", Attrs::default()).with_children(vec![content])])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::{pos2, vec2};

    fn surface(device: DeviceClass) -> Surface {
        let config = MarkConfig {
            device: Some(device),
            ..Default::default()
        };
        let mut surface = Surface::new(&HostElement::mark_layout(vec2(800.0, 600.0)), config).unwrap();
        surface.draw_background_image(LoadedImage::blank("mem", 400, 300));
        surface
    }

    #[test]
    fn test_missing_container_is_fatal() {
        let err = Surface::new(&[], MarkConfig::default()).err().unwrap();
        assert!(matches!(err, MarkError::ContainerNotFound { ref id } if id == MARK_CONTAINER_ID));

        let host = vec![HostElement::new(MARK_CONTAINER_ID, vec2(10.0, 10.0))];
        let err = Surface::new(&host, MarkConfig::default()).err().unwrap();
        assert!(matches!(err, MarkError::ContainerNotFound { ref id } if id == CANVAS_CONTAINER_ID));
    }

    #[test]
    fn test_background_sizes_content_group() {
        let s = surface(DeviceClass::Desktop);
        assert_eq!(s.content.size, vec2(400.0, 300.0));
        assert_eq!(s.image_size(), Some(vec2(400.0, 300.0)));
        assert!(s.hits_background(pos2(399.0, 299.0)));
        assert!(!s.hits_background(pos2(401.0, 10.0)));
    }

    #[test]
    fn test_content_space_round_trip() {
        let mut s = surface(DeviceClass::Desktop);
        s.stage.viewport.scale = 2.0;
        s.stage.viewport.position = vec2(10.0, 20.0);
        s.content.position = vec2(5.0, 5.0);
        let stage = pos2(120.0, 90.0);
        let back = s.to_stage(s.to_content(stage));
        assert!((back - stage).length() < 1e-4);
    }

    #[test]
    fn test_content_drag_scales_delta() {
        let mut s = surface(DeviceClass::Desktop);
        s.stage.viewport.scale = 2.0;
        assert!(s.begin_content_drag(pos2(100.0, 100.0)));
        s.drag_content(pos2(120.0, 110.0));
        assert_eq!(s.content.position, vec2(10.0, 5.0));
        s.end_content_drag();
        assert!(!s.is_dragging_content());
    }

    #[test]
    fn test_pinch_disables_and_restores_dragging() {
        let mut s = surface(DeviceClass::Mobile);
        let points = vec![pos2(100.0, 100.0), pos2(200.0, 100.0)];
        assert!(s.handle_navigation(&Gesture::TouchStart { points }));
        assert!(!s.content.draggable);
        s.handle_navigation(&Gesture::TouchMove {
            points: vec![pos2(50.0, 100.0), pos2(250.0, 100.0)],
        });
        assert!((s.scale() - 2.0).abs() < 1e-5);
        s.handle_navigation(&Gesture::TouchEnd { points: vec![] });
        assert!(s.content.draggable);
    }

    #[test]
    fn test_mouse_set_ignores_pinch() {
        let mut s = surface(DeviceClass::Desktop);
        let points = vec![pos2(100.0, 100.0), pos2(200.0, 100.0)];
        assert!(!s.handle_navigation(&Gesture::TouchStart { points }));
        assert!(s.content.draggable);
    }

    #[test]
    fn test_auto_pan_near_right_edge() {
        let mut s = surface(DeviceClass::Desktop);
        s.auto_pan(pos2(790.0, 300.0));
        assert_eq!(s.stage.viewport.position, vec2(-5.0, 0.0));
        s.auto_pan(pos2(400.0, 300.0));
        assert_eq!(s.stage.viewport.position, vec2(-5.0, 0.0));
    }

    #[test]
    fn test_drag_restore_waits_for_delay() {
        let mut s = surface(DeviceClass::Desktop);
        s.set_draggable(false);
        s.schedule_drag_restore();
        assert!(!s.content.draggable);
        assert!(!s.tick(Instant::now() + Duration::from_millis(1_000)));
        assert!(s.content.draggable);
    }

    #[test]
    fn test_snapshot_tree_shape() {
        let s = surface(DeviceClass::Desktop);
        let root = s.snapshot(vec![Node::new("Group", Attrs::default())]);
        assert_eq!(root.class_name, "Stage");
        let content = &root.children[0].children[0];
        assert_eq!(content.class_name, "Group");
        assert_eq!(content.children[0].attrs.id.as_deref(), Some(BACKGROUND_IMAGE_ID));
        assert_eq!(content.children.len(), 2);
    }
}
