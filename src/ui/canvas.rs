// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Drawing canvas for image display and annotation.
//!
//! This module provides the main canvas area: it sizes the stage to the
//! available space, feeds this frame's gestures to the active tool, and
//! paints the background image and the tool's regions.

use crate::surface::gesture::GestureReader;
use crate::tools::MarkTool;
use egui::{Color32, Pos2, Rect, Stroke};
use std::time::Instant;

/// Side length of a transformer anchor square.
const ANCHOR_SIZE: f32 = 10.0;

/// Display the canvas and run one interaction step of `tool`.
pub fn show(ui: &mut egui::Ui, tool: &mut dyn MarkTool, reader: &mut GestureReader) {
    let available_size = ui.available_size() - egui::vec2(0.0, 24.0);
    let (response, painter) = ui.allocate_painter(available_size.max(egui::Vec2::ZERO), egui::Sense::click_and_drag());
    let stage = response.rect;
    painter.rect_filled(stage, 0.0, Color32::from_gray(40));
    tool.surface_mut().set_stage_size(stage.size());

    if !tool.surface().is_ready() {
        show_welcome(&painter, stage);
    } else {
        // Input landing on a popup or window above the canvas belongs to it.
        let input = ui.input(|i| i.clone());
        let ctx = ui.ctx().clone();
        let layer = ui.layer_id();
        let on_canvas = move |pos: Pos2| match ctx.layer_id_at(pos) {
            Some(top) => top == layer,
            None => true,
        };
        let gestures = reader.read(&input, stage, &on_canvas);
        for gesture in &gestures {
            tool.handle_gesture(gesture);
        }

        let now = Instant::now();
        let animating = tool.tick(now);
        if animating || tool.surface_mut().layer.take_redraw() {
            ui.ctx().request_repaint();
        }

        draw_background(ui.ctx(), &painter, tool, stage.min);
        tool.paint(&painter, stage.min, now);
    }

    // Display viewport info at the bottom
    ui.separator();
    ui.horizontal(|ui| {
        let surface = tool.surface();
        ui.label(format!("Zoom: {:.0}%", surface.scale() * 100.0));
        ui.separator();
        match surface.background() {
            Some(bg) => ui.label(format!("Image: {} ({}x{})", bg.source, bg.size.x, bg.size.y)),
            None => ui.label("No image loaded"),
        };
    });
}

fn show_welcome(painter: &egui::Painter, stage: Rect) {
    painter.text(
        stage.center() - egui::vec2(0.0, 20.0),
        egui::Align2::CENTER_CENTER,
        "FrameMark",
        egui::FontId::proportional(32.0),
        Color32::from_gray(200),
    );
    painter.text(
        stage.center() + egui::vec2(0.0, 20.0),
        egui::Align2::CENTER_CENTER,
        "Open an image or segmentation file to begin annotating",
        egui::FontId::proportional(14.0),
        Color32::from_gray(150),
    );
}

fn draw_background(ctx: &egui::Context, painter: &egui::Painter, tool: &mut dyn MarkTool, origin: Pos2) {
    let surface = tool.surface();
    let Some(size) = surface.image_size() else {
        return;
    };
    let image_rect = Rect::from_min_max(
        surface.to_stage(Pos2::ZERO) + origin.to_vec2(),
        surface.to_stage(size.to_pos2()) + origin.to_vec2(),
    );
    let Some(texture) = tool.surface_mut().background_mut().and_then(|bg| bg.texture(ctx)) else {
        return;
    };
    painter.image(
        texture.id(),
        image_rect,
        Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
        Color32::WHITE,
    );
}

/// Draw a bounding box with its transformer border, and its anchors when
/// selected.
pub fn draw_region_box(
    painter: &egui::Painter,
    rect: Rect,
    color: crate::models::annotation::Color,
    alpha: u8,
    selected: bool,
) {
    painter.rect_filled(rect, 0.0, color.with_alpha(alpha));
    painter.rect_stroke(rect, 0.0, Stroke::new(2.0, color.to_egui()));

    if selected {
        let bounds = crate::models::annotation::BoundingBox::new(rect.min.x, rect.min.y, rect.width(), rect.height());
        for anchor in crate::models::annotation::Anchor::ALL {
            let handle = Rect::from_center_size(anchor.position(&bounds), egui::vec2(ANCHOR_SIZE, ANCHOR_SIZE));
            painter.rect_filled(handle, 0.0, Color32::WHITE);
            painter.rect_stroke(handle, 0.0, Stroke::new(1.0, color.to_egui()));
        }
    }
}

/// Fill a simple (possibly concave) polygon from its triangulation.
///
/// `triangles` index into `points`, as produced by
/// [`crate::util::geometry::triangulate`].
pub fn draw_polygon_fill(painter: &egui::Painter, points: &[Pos2], triangles: &[[u32; 3]], fill: Color32) {
    if triangles.is_empty() {
        return;
    }
    let mut mesh = egui::Mesh::default();
    for p in points {
        mesh.colored_vertex(*p, fill);
    }
    for &[a, b, c] in triangles {
        mesh.add_triangle(a, b, c);
    }
    painter.add(egui::Shape::mesh(mesh));
}

/// Draw a closed dashed outline starting `offset` pixels into the pattern.
pub fn draw_dashed_outline(
    painter: &egui::Painter,
    points: &[Pos2],
    dash: f32,
    gap: f32,
    offset: f32,
    stroke: Stroke,
) {
    for segment in dash_segments(points, dash, gap, offset) {
        painter.line_segment(segment, stroke);
    }
}

/// Visible dash pieces along a closed path.
///
/// The pattern runs continuously across vertices so the dashes march
/// evenly around corners.
fn dash_segments(points: &[Pos2], dash: f32, gap: f32, offset: f32) -> Vec<[Pos2; 2]> {
    let pattern = dash + gap;
    let mut segments = Vec::new();
    if points.len() < 2 || dash <= 0.0 || pattern <= 0.0 {
        return segments;
    }
    let mut phase = offset.rem_euclid(pattern);
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        let len = (b - a).length();
        if len <= f32::EPSILON {
            continue;
        }
        let dir = (b - a) / len;
        let mut t = 0.0;
        while t < len {
            let in_dash = phase < dash;
            let span = if in_dash { dash - phase } else { pattern - phase };
            let end = (t + span).min(len);
            if in_dash {
                segments.push([a + dir * t, a + dir * end]);
            }
            phase = (phase + end - t) % pattern;
            t = end;
        }
    }
    segments
}
