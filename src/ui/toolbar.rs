// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Toolbar and tool selection UI.
//!
//! This module provides the toolbar interface for switching between the
//! frame and segment tools, choosing the frame drawing mode, and removing
//! the selected bounding box.

use crate::tools::frame_mark::FrameType;

/// Which annotation tool drives the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Frames,
    Segments,
}

/// Action requested from the toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarAction {
    None,
    SelectTool(ToolKind),
    SwitchFrameType(FrameType),
    RemoveSelected,
}

/// Display the toolbar and return the action the user picked, if any.
pub fn show(
    ui: &mut egui::Ui,
    tool: ToolKind,
    frame_type: FrameType,
    has_selection: bool,
) -> ToolbarAction {
    let mut action = ToolbarAction::None;

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        ui.label("Tool:");

        if ui.selectable_label(tool == ToolKind::Frames, "▭ Frames").clicked() && tool != ToolKind::Frames {
            action = ToolbarAction::SelectTool(ToolKind::Frames);
        }
        if ui.selectable_label(tool == ToolKind::Segments, "▱ Segments").clicked() && tool != ToolKind::Segments {
            action = ToolbarAction::SelectTool(ToolKind::Segments);
        }

        ui.separator();

        let tool_text = match tool {
            ToolKind::Frames => {
                if ui.selectable_label(frame_type == FrameType::None, "⬆ Pointer").clicked() {
                    action = ToolbarAction::SwitchFrameType(FrameType::None);
                }
                if ui.selectable_label(frame_type == FrameType::Rectangle, "▭ Rectangle").clicked() {
                    action = ToolbarAction::SwitchFrameType(FrameType::Rectangle);
                }

                ui.separator();

                if ui.add_enabled(has_selection, egui::Button::new("🗑 Remove")).clicked() {
                    action = ToolbarAction::RemoveSelected;
                }

                ui.separator();

                match frame_type {
                    FrameType::None => "Drag the image to pan, click a box to select, move or resize it",
                    FrameType::Rectangle => "Drag on the image to draw a bounding box",
                }
            }
            ToolKind::Segments => "Click a region to toggle it, drag to pan, scroll or pinch to zoom",
        };

        ui.label(egui::RichText::new(tool_text).italics().weak());
    });

    action
}
