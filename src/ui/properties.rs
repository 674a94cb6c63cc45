// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation properties panel.
//!
//! This module provides the side panel listing the bounding boxes of the
//! frame tool, or the categories of the segment tool with how many of
//! their regions are checked.

use crate::models::annotation::{Color, RegionId};
use crate::models::segment::{HandledSegment, ImageData};
use crate::tools::frame_mark::FrameMark;
use crate::tools::segment_mark::{FillPolygon, SegmentMark};

/// Summary of the last region toggled in the segment tool.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionEvent {
    pub checked: bool,
    pub vertices: usize,
    pub fill: Color,
    /// Checked regions across the whole record after the toggle
    pub checked_total: usize,
}

impl SelectionEvent {
    pub fn new(segment: &HandledSegment, shape: &FillPolygon, data: &ImageData) -> Self {
        Self {
            checked: segment.is_checked,
            vertices: shape.points.len(),
            fill: shape.fill,
            checked_total: checked_count(data),
        }
    }

    /// One-line description shown under the category list.
    pub fn summary(&self) -> String {
        format!(
            "Last: {} ({} vertices), {} checked",
            if self.checked { "checked" } else { "unchecked" },
            self.vertices,
            self.checked_total
        )
    }
}

/// Action requested from the properties panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertiesAction {
    None,
    RemoveRegion(RegionId),
}

fn checked_count(data: &ImageData) -> usize {
    data.categories
        .iter()
        .flat_map(|c| &c.handled_segmentation)
        .filter(|s| s.is_checked)
        .count()
}

fn color_swatch(ui: &mut egui::Ui, color: Color) {
    let (rect, _) = ui.allocate_exact_size(egui::vec2(12.0, 12.0), egui::Sense::hover());
    ui.painter().rect_filled(rect, 2.0, color.to_egui());
}

/// Display the bounding boxes of the frame tool.
pub fn show_frames(ui: &mut egui::Ui, tool: &FrameMark) -> PropertiesAction {
    let mut action = PropertiesAction::None;

    ui.heading("Frames");
    ui.separator();

    if tool.region_count() == 0 {
        ui.label(egui::RichText::new("No bounding boxes yet").weak());
        return action;
    }

    ui.label(format!("{} bounding boxes", tool.region_count()));
    egui::ScrollArea::vertical().show(ui, |ui| {
        for region in tool.regions() {
            ui.horizontal(|ui| {
                color_swatch(ui, region.color);
                let text = format!(
                    "#{}  {:.0},{:.0}  {:.0}x{:.0}",
                    region.id.0, region.rect.x, region.rect.y, region.rect.width, region.rect.height
                );
                if region.is_selected() {
                    ui.label(egui::RichText::new(text).strong());
                } else {
                    ui.label(text);
                }
                if ui.small_button("✖").on_hover_text("Remove").clicked() {
                    action = PropertiesAction::RemoveRegion(region.id);
                }
            });
        }
    });

    action
}

/// Display the categories of the segment tool and the last toggle.
pub fn show_segments(ui: &mut egui::Ui, tool: &SegmentMark, last: Option<&SelectionEvent>) {
    ui.heading("Segments");
    ui.separator();

    let Some(data) = tool.image_data() else {
        ui.label(egui::RichText::new("No segmentation loaded").weak());
        return;
    };

    ui.label(format!("{} of {} regions checked", checked_count(data), data.region_count()));
    ui.add_space(4.0);

    egui::ScrollArea::vertical().show(ui, |ui| {
        for (index, category) in data.categories.iter().enumerate() {
            ui.horizontal(|ui| {
                if let Some(color) = category.fill_color {
                    color_swatch(ui, color);
                }
                let name = if category.name.is_empty() {
                    format!("category {}", index + 1)
                } else {
                    category.name.clone()
                };
                let checked = category.handled_segmentation.iter().filter(|s| s.is_checked).count();
                ui.label(format!("{}  {}/{}", name, checked, category.handled_segmentation.len()));
            });
        }
    });

    if let Some(event) = last {
        ui.separator();
        ui.horizontal(|ui| {
            color_swatch(ui, event.fill);
            ui.label(event.summary());
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    #[test]
    fn test_selection_event_counts_checked_regions() {
        let mut data: ImageData = serde_json::from_str(
            r#"{"url": "a.png", "categorys": [{"segmentation": [[0,0,4,0,4,4,0,0,8,0,8,8]]}]}"#,
        )
        .unwrap();
        data.handle_segmentation();
        data.categories[0].handled_segmentation[1].is_checked = true;

        let segment = data.categories[0].handled_segmentation[1].clone();
        let shape = FillPolygon {
            points: vec![pos2(0.0, 0.0), pos2(8.0, 0.0), pos2(8.0, 8.0)],
            fill: Color { r: 1, g: 2, b: 3 },
        };
        let event = SelectionEvent::new(&segment, &shape, &data);
        assert!(event.checked);
        assert_eq!(event.vertices, 3);
        assert_eq!(event.checked_total, 1);
        assert_eq!(event.summary(), "Last: checked (3 vertices), 1 checked");
    }
}
