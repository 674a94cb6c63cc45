// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Bounding-box annotation tool.
//!
//! In rectangle mode a press on the background image starts a new box that
//! follows the pointer until release. Boxes can be clicked to select them,
//! dragged to move them, and resized through the eight anchors of the
//! selected box. Every move and resize is kept inside the image.

use super::{MarkTool, CLICK_DISTANCE};
use crate::config::MarkConfig;
use crate::error::Result;
use crate::io::media::LoadedImage;
use crate::models::annotation::{Anchor, BoundingBox, Color, RectRegion, RegionId};
use crate::models::scene::{Attrs, MarkData, Node};
use crate::surface::gesture::Gesture;
use crate::surface::{HostElement, Surface};
use crate::ui::canvas;
use crate::util::geometry::{bound_box, clamp_drag_position, normalize_box};
use egui::{Pos2, Vec2};
use std::time::Instant;

/// Hit radius of a transformer anchor, in stage pixels.
const ANCHOR_RADIUS: f32 = 6.0;

/// Which drawing handlers are attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameType {
    #[default]
    None,
    Rectangle,
}

/// In-progress pointer interaction.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Interaction {
    Idle,
    /// Pressed on a region; becomes a move once the pointer travels
    Pressing { id: RegionId, origin: Pos2, grab: Vec2 },
    Drawing { id: RegionId, start: Pos2 },
    MovingRegion { id: RegionId, grab: Vec2 },
    Resizing { id: RegionId, anchor: Anchor },
    Panning,
}

pub struct FrameMark {
    surface: Surface,
    frame_type: FrameType,
    regions: Vec<RectRegion>,
    selected: Option<RegionId>,
    interaction: Interaction,
    next_id: u64,
}

impl FrameMark {
    pub fn new(host: &[HostElement], config: MarkConfig) -> Result<Self> {
        Ok(Self {
            surface: Surface::new(host, config)?,
            frame_type: FrameType::None,
            regions: Vec::new(),
            selected: None,
            interaction: Interaction::Idle,
            next_id: 0,
        })
    }

    /// Install the decoded background and restore any saved regions.
    ///
    /// Starts in pointer mode with content dragging enabled.
    pub fn begin_draw(&mut self, image: LoadedImage, mark_data: Option<MarkData>) {
        self.surface.draw_background_image(image);
        self.regions.clear();
        self.selected = None;
        self.interaction = Interaction::Idle;
        if let Some(data) = mark_data {
            for saved in data.regions {
                let id = self.allocate_id();
                self.regions.push(RectRegion::new(id, saved.rect, saved.color));
            }
            log::info!("Restored {} regions", self.regions.len());
        }
        self.switch_frame_type(FrameType::None);
    }

    pub fn frame_type(&self) -> FrameType {
        self.frame_type
    }

    /// Swap the active handler set.
    ///
    /// Any selection is cleared and an unfinished box is dropped.
    pub fn switch_frame_type(&mut self, frame_type: FrameType) {
        if let Interaction::Drawing { id, .. } = self.interaction {
            self.regions.retain(|r| r.id != id);
        }
        self.interaction = Interaction::Idle;
        self.surface.end_content_drag();
        self.clear_selection();
        self.frame_type = frame_type;
        self.surface.set_draggable(frame_type == FrameType::None);
        self.surface.layer.batch_draw();
        log::info!("Frame type: {:?}", frame_type);
    }

    pub fn regions(&self) -> &[RectRegion] {
        &self.regions
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    pub fn selected(&self) -> Option<&RectRegion> {
        self.selected.and_then(|id| self.region(id))
    }

    /// Handle to the selected region, if any.
    pub fn selected_group(&mut self) -> Option<SelectedGroup<'_>> {
        let id = self.selected?;
        Some(SelectedGroup { mark: self, id })
    }

    fn region(&self, id: RegionId) -> Option<&RectRegion> {
        self.regions.iter().find(|r| r.id == id)
    }

    fn region_mut(&mut self, id: RegionId) -> Option<&mut RectRegion> {
        self.regions.iter_mut().find(|r| r.id == id)
    }

    fn allocate_id(&mut self) -> RegionId {
        self.next_id += 1;
        RegionId(self.next_id)
    }

    fn clear_selection(&mut self) {
        for region in &mut self.regions {
            region.transformer.resize_enabled = false;
        }
        self.selected = None;
    }

    /// Show `id`'s handles, hide all others and raise it to the top.
    fn select(&mut self, id: RegionId) {
        self.clear_selection();
        let Some(index) = self.regions.iter().position(|r| r.id == id) else {
            return;
        };
        let mut region = self.regions.remove(index);
        region.transformer.resize_enabled = true;
        self.regions.push(region);
        self.selected = Some(id);
        self.surface.layer.batch_draw();
        log::debug!("Selected region {:?}", id);
    }

    /// Delete a region by id, selected or not.
    pub fn remove_region(&mut self, id: RegionId) {
        self.regions.retain(|r| r.id != id);
        if self.selected == Some(id) {
            self.selected = None;
        }
        if matches!(
            self.interaction,
            Interaction::Pressing { id: i, .. }
                | Interaction::Drawing { id: i, .. }
                | Interaction::MovingRegion { id: i, .. }
                | Interaction::Resizing { id: i, .. } if i == id
        ) {
            self.interaction = Interaction::Idle;
        }
        self.surface.layer.batch_draw();
    }

    /// Stage-space rectangle of a region.
    fn stage_rect(&self, rect: &BoundingBox) -> egui::Rect {
        egui::Rect::from_min_max(self.surface.to_stage(rect.min()), self.surface.to_stage(rect.max()))
    }

    fn hit_anchor(&self, pos: Pos2) -> Option<(RegionId, Anchor)> {
        let region = self.selected()?;
        let rect = self.stage_rect(&region.rect);
        let stage_box = BoundingBox::new(rect.min.x, rect.min.y, rect.width(), rect.height());
        Anchor::ALL
            .into_iter()
            .find(|a| (a.position(&stage_box) - pos).length() <= ANCHOR_RADIUS)
            .map(|a| (region.id, a))
    }

    fn hit_region(&self, pos: Pos2) -> Option<RegionId> {
        let p = self.surface.to_content(pos);
        self.regions.iter().rev().find(|r| r.rect.contains(p)).map(|r| r.id)
    }

    fn on_press(&mut self, pos: Pos2, touches: usize) {
        if touches >= 2 || !self.surface.is_ready() {
            return;
        }
        if let Some((id, anchor)) = self.hit_anchor(pos) {
            self.interaction = Interaction::Resizing { id, anchor };
            return;
        }
        if let Some(id) = self.hit_region(pos) {
            let corner = self.region(id).map(|r| r.rect.min()).unwrap_or(Pos2::ZERO);
            let grab = pos - self.surface.to_stage(corner);
            self.interaction = Interaction::Pressing { id, origin: pos, grab };
            return;
        }

        self.clear_selection();
        if !self.surface.hits_background(pos) {
            return;
        }
        match self.frame_type {
            FrameType::Rectangle => self.start_drawing(pos),
            FrameType::None => {
                if self.surface.begin_content_drag(pos) {
                    self.interaction = Interaction::Panning;
                }
            }
        }
    }

    fn start_drawing(&mut self, pos: Pos2) {
        let start = self.surface.to_content(pos);
        let id = self.allocate_id();
        let rect = BoundingBox::new(start.x, start.y, 0.0, 0.0);
        self.regions.push(RectRegion::new(id, rect, Color::random()));
        self.surface.set_draggable(false);
        self.interaction = Interaction::Drawing { id, start };
        log::debug!("Drawing region {:?} from ({:.1}, {:.1})", id, start.x, start.y);
    }

    fn on_move(&mut self, pos: Pos2, touches: usize) {
        if touches >= 2 {
            return;
        }
        match self.interaction {
            Interaction::Idle => {}
            Interaction::Pressing { id, origin, grab } => {
                if (pos - origin).length() > CLICK_DISTANCE {
                    self.interaction = Interaction::MovingRegion { id, grab };
                    self.move_region(id, pos, grab);
                }
            }
            Interaction::Drawing { id, start } => {
                let p = self.surface.to_content(pos);
                let rect = normalize_box(start, p.x, p.y);
                if let Some(region) = self.region_mut(id) {
                    region.rect = rect;
                }
                self.surface.auto_pan(pos);
            }
            Interaction::MovingRegion { id, grab } => self.move_region(id, pos, grab),
            Interaction::Resizing { id, anchor } => self.resize_region(id, anchor, pos),
            Interaction::Panning => self.surface.drag_content(pos),
        }
    }

    fn move_region(&mut self, id: RegionId, pos: Pos2, grab: Vec2) {
        let Some(image_size) = self.surface.image_size() else {
            return;
        };
        let Some(size) = self.region(id).map(|r| r.rect.size()) else {
            return;
        };
        let clamped = clamp_drag_position(
            pos - grab,
            self.surface.content_absolute_position(),
            self.surface.scale(),
            image_size,
            size,
        );
        let corner = self.surface.to_content(clamped);
        if let Some(region) = self.region_mut(id) {
            region.rect.x = corner.x;
            region.rect.y = corner.y;
        }
        self.surface.auto_pan(pos);
    }

    fn resize_region(&mut self, id: RegionId, anchor: Anchor, pos: Pos2) {
        let Some(image_size) = self.surface.image_size() else {
            return;
        };
        let p = self.surface.to_content(pos);
        if let Some(region) = self.region_mut(id) {
            let proposed = anchor.resize(&region.rect, p);
            region.rect = bound_box(&region.rect, &proposed, image_size);
        }
        self.surface.auto_pan(pos);
    }

    fn on_release(&mut self, pos: Pos2) {
        match std::mem::replace(&mut self.interaction, Interaction::Idle) {
            Interaction::Pressing { id, .. } => self.select(id),
            Interaction::Drawing { id, start } => {
                let end = self.surface.to_content(pos);
                if end == start {
                    self.remove_region(id);
                    log::debug!("Discarded empty region {:?}", id);
                } else {
                    self.select(id);
                    log::info!("Added region, total: {}", self.regions.len());
                }
                self.surface.schedule_drag_restore();
            }
            Interaction::Panning => self.surface.end_content_drag(),
            Interaction::Idle | Interaction::MovingRegion { .. } | Interaction::Resizing { .. } => {}
        }
    }
}

/// The currently selected region.
pub struct SelectedGroup<'a> {
    mark: &'a mut FrameMark,
    id: RegionId,
}

impl SelectedGroup<'_> {
    pub fn region(&self) -> Option<&RectRegion> {
        self.mark.region(self.id)
    }

    /// Delete the region from the tree.
    pub fn remove(self) {
        self.mark.remove_region(self.id);
        log::info!("Removed region {:?}, total: {}", self.id, self.mark.regions.len());
    }
}

impl MarkTool for FrameMark {
    fn surface(&self) -> &Surface {
        &self.surface
    }

    fn surface_mut(&mut self) -> &mut Surface {
        &mut self.surface
    }

    fn handle_gesture(&mut self, gesture: &Gesture) {
        if self.surface.handle_navigation(gesture) {
            return;
        }
        match gesture {
            Gesture::Press { pos, touches } => self.on_press(*pos, *touches),
            Gesture::Move { pos, touches } => self.on_move(*pos, *touches),
            Gesture::Release { pos } => self.on_release(*pos),
            _ => {}
        }
    }

    fn tick(&mut self, now: Instant) -> bool {
        self.surface.tick(now)
    }

    fn paint(&self, painter: &egui::Painter, origin: Pos2, _now: Instant) {
        let alpha = self.surface.config().fill_alpha;
        for region in &self.regions {
            let rect = self.stage_rect(&region.rect).translate(origin.to_vec2());
            canvas::draw_region_box(painter, rect, region.color, alpha, region.is_selected());
        }
    }

    fn scene_nodes(&self) -> Vec<Node> {
        let alpha = self.surface.config().fill_alpha;
        self.regions
            .iter()
            .map(|region| {
                let rect = Node::new(
                    "Rect",
                    Attrs {
                        x: Some(region.rect.x),
                        y: Some(region.rect.y),
                        width: Some(region.rect.width),
                        height: Some(region.rect.height),
                        fill: Some(region.color.to_hex_alpha(alpha)),
                        stroke_enabled: Some(true),
                        draggable: Some(true),
                        ..Default::default()
                    },
                );
                let transformer = Node::new(
                    "Transformer",
                    Attrs {
                        stroke: Some(region.color.to_hex()),
                        resize_enabled: Some(region.transformer.resize_enabled),
                        ..Default::default()
                    },
                );
                Node::new("Group", Attrs::default()).with_children(vec![rect, transformer])
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::DeviceClass;
    use egui::{pos2, vec2};
    use std::time::Duration;

    fn frame_mark() -> FrameMark {
        let config = MarkConfig {
            device: Some(DeviceClass::Desktop),
            ..Default::default()
        };
        let mut mark = FrameMark::new(&HostElement::mark_layout(vec2(800.0, 600.0)), config).unwrap();
        mark.begin_draw(LoadedImage::blank("mem", 400, 300), None);
        mark
    }

    fn drag(mark: &mut FrameMark, from: Pos2, to: Pos2) {
        mark.handle_gesture(&Gesture::Press { pos: from, touches: 0 });
        mark.handle_gesture(&Gesture::Move { pos: to, touches: 0 });
        mark.handle_gesture(&Gesture::Release { pos: to });
    }

    fn click(mark: &mut FrameMark, at: Pos2) {
        mark.handle_gesture(&Gesture::Press { pos: at, touches: 0 });
        mark.handle_gesture(&Gesture::Release { pos: at });
    }

    #[test]
    fn test_begin_draw_starts_in_pointer_mode() {
        let mark = frame_mark();
        assert_eq!(mark.frame_type(), FrameType::None);
        assert!(mark.surface().content.draggable);
        assert_eq!(mark.region_count(), 0);
    }

    #[test]
    fn test_draw_commit_matches_normalized_box() {
        let mut mark = frame_mark();
        mark.switch_frame_type(FrameType::Rectangle);
        drag(&mut mark, pos2(150.0, 120.0), pos2(100.0, 200.0));

        assert_eq!(mark.region_count(), 1);
        let expected = normalize_box(pos2(150.0, 120.0), 100.0, 200.0);
        assert_eq!(mark.regions()[0].rect, expected);
        assert!(mark.regions()[0].is_selected());
    }

    #[test]
    fn test_draw_discard_on_zero_displacement() {
        let mut mark = frame_mark();
        mark.switch_frame_type(FrameType::Rectangle);
        drag(&mut mark, pos2(150.0, 120.0), pos2(200.0, 200.0));
        let before = mark.region_count();

        click(&mut mark, pos2(300.0, 50.0));
        assert_eq!(mark.region_count(), before);
    }

    #[test]
    fn test_draw_uses_content_space_under_zoom() {
        let mut mark = frame_mark();
        mark.switch_frame_type(FrameType::Rectangle);
        mark.surface_mut().stage.viewport.scale = 2.0;
        mark.surface_mut().stage.viewport.position = vec2(100.0, 100.0);
        drag(&mut mark, pos2(200.0, 200.0), pos2(300.0, 260.0));
        assert_eq!(mark.regions()[0].rect, BoundingBox::new(50.0, 50.0, 50.0, 30.0));
    }

    #[test]
    fn test_drawing_disables_then_restores_content_drag() {
        let mut mark = frame_mark();
        mark.switch_frame_type(FrameType::Rectangle);
        mark.handle_gesture(&Gesture::Press { pos: pos2(100.0, 100.0), touches: 0 });
        assert!(!mark.surface().content.draggable);
        mark.handle_gesture(&Gesture::Move { pos: pos2(150.0, 150.0), touches: 0 });
        mark.handle_gesture(&Gesture::Release { pos: pos2(150.0, 150.0) });
        assert!(!mark.surface().content.draggable);
        mark.tick(Instant::now() + Duration::from_millis(100));
        assert!(mark.surface().content.draggable);
    }

    #[test]
    fn test_second_touch_does_not_start_drawing() {
        let mut mark = frame_mark();
        mark.switch_frame_type(FrameType::Rectangle);
        mark.handle_gesture(&Gesture::Press { pos: pos2(100.0, 100.0), touches: 2 });
        assert_eq!(mark.region_count(), 0);
    }

    #[test]
    fn test_selection_is_exclusive() {
        let mut mark = frame_mark();
        mark.switch_frame_type(FrameType::Rectangle);
        drag(&mut mark, pos2(60.0, 60.0), pos2(100.0, 100.0));
        drag(&mut mark, pos2(200.0, 60.0), pos2(260.0, 100.0));
        let a = mark.regions()[0].id;
        let b = mark.regions()[1].id;

        click(&mut mark, pos2(80.0, 80.0));
        assert_eq!(mark.selected().map(|r| r.id), Some(a));

        click(&mut mark, pos2(230.0, 80.0));
        let visible: Vec<_> = mark.regions().iter().filter(|r| r.is_selected()).map(|r| r.id).collect();
        assert_eq!(visible, vec![b]);
        // Raised to the top of the draw order.
        assert_eq!(mark.regions().last().map(|r| r.id), Some(b));
    }

    #[test]
    fn test_click_background_deselects() {
        let mut mark = frame_mark();
        mark.switch_frame_type(FrameType::Rectangle);
        drag(&mut mark, pos2(60.0, 60.0), pos2(100.0, 100.0));
        assert!(mark.selected().is_some());
        mark.switch_frame_type(FrameType::None);
        click(&mut mark, pos2(80.0, 80.0));
        assert!(mark.selected().is_some());
        click(&mut mark, pos2(300.0, 250.0));
        assert!(mark.selected().is_none());
    }

    #[test]
    fn test_move_region_clamped_to_image() {
        let mut mark = frame_mark();
        mark.switch_frame_type(FrameType::Rectangle);
        drag(&mut mark, pos2(100.0, 100.0), pos2(140.0, 120.0));
        mark.handle_gesture(&Gesture::Press { pos: pos2(110.0, 110.0), touches: 0 });
        mark.handle_gesture(&Gesture::Move { pos: pos2(700.0, 500.0), touches: 0 });
        mark.handle_gesture(&Gesture::Release { pos: pos2(700.0, 500.0) });

        let rect = mark.regions()[0].rect;
        assert!(rect.x + rect.width <= 400.0 + 1e-3);
        assert!(rect.y + rect.height <= 300.0 + 1e-3);
        assert_eq!(rect.size(), vec2(40.0, 20.0));
    }

    #[test]
    fn test_resize_through_anchor_bounded_by_image() {
        let mut mark = frame_mark();
        mark.switch_frame_type(FrameType::Rectangle);
        drag(&mut mark, pos2(100.0, 100.0), pos2(140.0, 120.0));

        mark.handle_gesture(&Gesture::Press { pos: pos2(140.0, 120.0), touches: 0 });
        mark.handle_gesture(&Gesture::Move { pos: pos2(160.0, 150.0), touches: 0 });
        assert_eq!(mark.regions()[0].rect, BoundingBox::new(100.0, 100.0, 60.0, 50.0));

        mark.handle_gesture(&Gesture::Move { pos: pos2(500.0, 170.0), touches: 0 });
        mark.handle_gesture(&Gesture::Release { pos: pos2(500.0, 170.0) });
        let rect = mark.regions()[0].rect;
        assert_eq!(rect.width, 60.0);
        assert_eq!(rect.height, 70.0);
    }

    #[test]
    fn test_resize_past_left_edge_keeps_right_edge() {
        let mut mark = frame_mark();
        mark.switch_frame_type(FrameType::Rectangle);
        drag(&mut mark, pos2(100.0, 100.0), pos2(200.0, 150.0));

        // Middle-left anchor
        mark.handle_gesture(&Gesture::Press { pos: pos2(100.0, 125.0), touches: 0 });
        mark.handle_gesture(&Gesture::Move { pos: pos2(60.0, 125.0), touches: 0 });
        assert_eq!(mark.regions()[0].rect, BoundingBox::new(60.0, 100.0, 140.0, 50.0));

        mark.handle_gesture(&Gesture::Move { pos: pos2(-60.0, 125.0), touches: 0 });
        let rect = mark.regions()[0].rect;
        assert_eq!(rect, BoundingBox::new(60.0, 100.0, 140.0, 50.0));
        assert_eq!(rect.x + rect.width, 200.0);
        mark.handle_gesture(&Gesture::Release { pos: pos2(-60.0, 125.0) });
    }

    #[test]
    fn test_resize_past_top_edge_keeps_bottom_edge() {
        let mut mark = frame_mark();
        mark.switch_frame_type(FrameType::Rectangle);
        drag(&mut mark, pos2(100.0, 100.0), pos2(200.0, 150.0));

        // Top-center anchor
        mark.handle_gesture(&Gesture::Press { pos: pos2(150.0, 100.0), touches: 0 });
        mark.handle_gesture(&Gesture::Move { pos: pos2(150.0, -40.0), touches: 0 });
        let rect = mark.regions()[0].rect;
        assert_eq!(rect, BoundingBox::new(100.0, 100.0, 100.0, 50.0));
        assert_eq!(rect.y + rect.height, 150.0);
    }

    #[test]
    fn test_switch_frame_type_clears_selection() {
        let mut mark = frame_mark();
        mark.switch_frame_type(FrameType::Rectangle);
        assert!(!mark.surface().content.draggable);
        drag(&mut mark, pos2(60.0, 60.0), pos2(100.0, 100.0));
        mark.switch_frame_type(FrameType::None);
        assert!(mark.selected().is_none());
        assert!(mark.regions().iter().all(|r| !r.is_selected()));
        assert!(mark.surface().content.draggable);

        // Pointer mode pans instead of drawing.
        drag(&mut mark, pos2(300.0, 200.0), pos2(320.0, 210.0));
        assert_eq!(mark.region_count(), 1);
        assert_eq!(mark.surface().content.position, vec2(20.0, 10.0));
    }

    #[test]
    fn test_selected_group_remove() {
        let mut mark = frame_mark();
        mark.switch_frame_type(FrameType::Rectangle);
        drag(&mut mark, pos2(60.0, 60.0), pos2(100.0, 100.0));
        assert!(mark.selected_group().is_some());
        if let Some(group) = mark.selected_group() {
            group.remove();
        }
        assert_eq!(mark.region_count(), 0);
        assert!(mark.selected_group().is_none());
    }

    #[test]
    fn test_snapshot_round_trip_restores_regions() {
        let mut mark = frame_mark();
        mark.switch_frame_type(FrameType::Rectangle);
        drag(&mut mark, pos2(60.0, 60.0), pos2(100.0, 90.0));
        let json = mark.to_json().unwrap();

        let data = MarkData::from_json(&json).unwrap();
        let mut restored = frame_mark();
        restored.begin_draw(LoadedImage::blank("mem", 400, 300), Some(data));
        assert_eq!(restored.region_count(), 1);
        assert_eq!(restored.regions()[0].rect, mark.regions()[0].rect);
        assert_eq!(restored.regions()[0].color, mark.regions()[0].color);
    }
}
