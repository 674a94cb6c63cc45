// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! This module contains the main application structure that implements
//! the egui::App trait. It owns the active annotation tool, runs the
//! background image loads, and wires menus, toolbar, keyboard and the
//! properties panel to the tool.

use crate::config::MarkConfig;
use crate::io::media::ImageLoad;
use crate::io::serialization;
use crate::models::scene::MarkData;
use crate::models::segment::{HandledSegment, ImageData};
use crate::surface::gesture::GestureReader;
use crate::surface::HostElement;
use crate::tools::frame_mark::{FrameMark, FrameType};
use crate::tools::segment_mark::{FillPolygon, SegmentMark};
use crate::tools::MarkTool;
use crate::ui::canvas;
use crate::ui::properties::{self, PropertiesAction, SelectionEvent};
use crate::ui::toolbar::{self, ToolKind, ToolbarAction};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};

/// Host size the tools are mounted with before the first layout pass.
const INITIAL_STAGE_SIZE: egui::Vec2 = egui::vec2(1280.0, 720.0);

/// The tool driving the canvas.
pub enum ActiveTool {
    Frames(FrameMark),
    Segments(SegmentMark),
}

impl ActiveTool {
    fn kind(&self) -> ToolKind {
        match self {
            ActiveTool::Frames(_) => ToolKind::Frames,
            ActiveTool::Segments(_) => ToolKind::Segments,
        }
    }

    fn as_mark_tool(&mut self) -> &mut dyn MarkTool {
        match self {
            ActiveTool::Frames(tool) => tool,
            ActiveTool::Segments(tool) => tool,
        }
    }

    fn as_mark_tool_ref(&self) -> &dyn MarkTool {
        match self {
            ActiveTool::Frames(tool) => tool,
            ActiveTool::Segments(tool) => tool,
        }
    }
}

/// What to do with an image once its decode finishes.
enum PendingDraw {
    Frames { mark_data: Option<MarkData> },
    Segments { data: ImageData },
}

/// A background image decode and the session waiting on it.
struct PendingLoad {
    load: ImageLoad,
    path: PathBuf,
    draw: PendingDraw,
}

/// Main application state.
pub struct MarkApp {
    config: MarkConfig,

    /// Currently active annotation tool
    tool: ActiveTool,

    /// Converts raw input into gestures for the active tool
    reader: GestureReader,

    /// Image decode in flight
    pending: Option<PendingLoad>,

    /// Background image of the frame session, reloaded with saved frames
    image_path: Option<PathBuf>,

    /// Loading state message
    loading_message: Option<String>,

    /// Last failure shown to the user
    error_message: Option<String>,

    /// Toggle notifications from the segment tool
    selections: Receiver<SelectionEvent>,
    selection_sender: Sender<SelectionEvent>,
    last_selection: Option<SelectionEvent>,
}

impl MarkApp {
    /// Create a new application with the frame tool active.
    pub fn new(config: MarkConfig) -> crate::error::Result<Self> {
        let (selection_sender, selections) = channel();
        let tool = ActiveTool::Frames(FrameMark::new(
            &HostElement::mark_layout(INITIAL_STAGE_SIZE),
            config.clone(),
        )?);
        let reader = GestureReader::new(tool.as_mark_tool_ref().surface().gesture_set());
        log::info!("Device class: {:?}", tool.as_mark_tool_ref().surface().device());

        Ok(Self {
            config,
            tool,
            reader,
            pending: None,
            image_path: None,
            loading_message: None,
            error_message: None,
            selections,
            selection_sender,
            last_selection: None,
        })
    }

    fn make_tool(&self, kind: ToolKind) -> crate::error::Result<ActiveTool> {
        let host = HostElement::mark_layout(INITIAL_STAGE_SIZE);
        Ok(match kind {
            ToolKind::Frames => ActiveTool::Frames(FrameMark::new(&host, self.config.clone())?),
            ToolKind::Segments => {
                let mut tool = SegmentMark::new(&host, self.config.clone())?;
                let sender = self.selection_sender.clone();
                tool.on_select = Some(Box::new(move |segment: &HandledSegment, shape: &FillPolygon, data: &ImageData| {
                    let _ = sender.send(SelectionEvent::new(segment, shape, data));
                }));
                ActiveTool::Segments(tool)
            }
        })
    }

    /// Replace the active tool with a fresh one, dropping any pending load.
    fn switch_tool(&mut self, kind: ToolKind) -> bool {
        match self.make_tool(kind) {
            Ok(tool) => {
                if let ActiveTool::Segments(old) = &mut self.tool {
                    old.clear();
                }
                self.reader = GestureReader::new(tool.as_mark_tool_ref().surface().gesture_set());
                self.tool = tool;
                self.pending = None;
                self.loading_message = None;
                self.image_path = None;
                self.last_selection = None;
                log::info!("Switched to {:?} tool", kind);
                true
            }
            Err(e) => {
                log::error!("Failed to create {:?} tool: {}", kind, e);
                self.error_message = Some(e.to_string());
                false
            }
        }
    }

    fn start_load(&mut self, path: PathBuf, draw: PendingDraw, message: &str) {
        self.loading_message = Some(message.to_string());
        self.error_message = None;
        self.pending = Some(PendingLoad {
            load: ImageLoad::spawn(path.clone()),
            path,
            draw,
        });
    }

    /// Open an image in a new frame session.
    fn open_image(&mut self, path: PathBuf) {
        if !self.switch_tool(ToolKind::Frames) {
            return;
        }
        self.start_load(path, PendingDraw::Frames { mark_data: None }, "Loading image...");
    }

    /// Open a segmentation record and its image in a new segment session.
    fn load_segmentation(&mut self, path: &Path) {
        let data = match serialization::import_image_data(path) {
            Ok(data) => data,
            Err(e) => {
                log::error!("Failed to import segmentation: {:#}", e);
                self.error_message = Some(format!("{:#}", e));
                return;
            }
        };
        log::info!("Imported {} categories from {}", data.categories.len(), path.display());
        if !self.switch_tool(ToolKind::Segments) {
            return;
        }
        let image_path = PathBuf::from(&data.url);
        self.start_load(image_path, PendingDraw::Segments { data }, "Loading segmentation and image...");
    }

    /// Restart the frame session over the current image with saved frames.
    fn load_frames(&mut self, path: &Path) {
        let Some(image_path) = self.image_path.clone() else {
            self.error_message = Some("Open an image before loading frames".to_string());
            return;
        };
        match serialization::import_mark_data(path) {
            Ok(mark_data) => {
                log::info!("Imported {} frames from {}", mark_data.regions.len(), path.display());
                self.start_load(
                    image_path,
                    PendingDraw::Frames { mark_data: Some(mark_data) },
                    "Loading frames...",
                );
            }
            Err(e) => {
                log::error!("Failed to import frames: {:#}", e);
                self.error_message = Some(format!("{:#}", e));
            }
        }
    }

    /// Export the active tool's rendering tree.
    fn export_snapshot(&mut self, path: &Path) {
        let root = self.tool.as_mark_tool_ref().snapshot();
        let extension = path.extension().and_then(|s| s.to_str());
        let result = match extension {
            Some("yaml") | Some("yml") => serialization::export_yaml(&root, path),
            Some("json") => serialization::export_json(&root, path),
            _ => {
                log::error!("Unsupported file extension: {:?}", extension);
                return;
            }
        };

        match result {
            Ok(_) => log::info!("Exported snapshot to {}", path.display()),
            Err(e) => {
                log::error!("Failed to export snapshot: {:#}", e);
                self.error_message = Some(format!("{:#}", e));
            }
        }
    }

    fn remove_selected(&mut self) {
        if let ActiveTool::Frames(tool) = &mut self.tool {
            if let Some(group) = tool.selected_group() {
                if let Some(region) = group.region() {
                    log::debug!("Removing region at {:?}", region.rect);
                }
                group.remove();
            }
        }
    }

    fn switch_frame_type(&mut self, frame_type: FrameType) {
        if let ActiveTool::Frames(tool) = &mut self.tool {
            tool.switch_frame_type(frame_type);
        }
    }

    /// Hand a finished decode to the session that requested it.
    fn poll_pending(&mut self) {
        let Some(result) = self.pending.as_ref().and_then(|p| p.load.poll()) else {
            return;
        };
        let Some(pending) = self.pending.take() else {
            return;
        };
        self.loading_message = None;

        let image = match result {
            Ok(image) => image,
            Err(e) => {
                log::error!("Failed to load image: {}", e);
                self.error_message = Some(e.to_string());
                return;
            }
        };

        match (pending.draw, &mut self.tool) {
            (PendingDraw::Frames { mark_data }, ActiveTool::Frames(tool)) => {
                tool.begin_draw(image, mark_data);
                self.image_path = Some(pending.path);
            }
            (PendingDraw::Segments { data }, ActiveTool::Segments(tool)) => {
                tool.begin_draw(&data, image);
            }
            _ => log::warn!("Tool changed while loading {}", pending.path.display()),
        }
    }

    fn handle_keyboard(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        if ctx.input(|i| i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace)) {
            self.remove_selected();
        }
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.switch_frame_type(FrameType::None);
        }
    }
}

impl eframe::App for MarkApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_pending();
        while let Ok(event) = self.selections.try_recv() {
            self.last_selection = Some(event);
        }

        // Request repaint if still loading (to update spinner)
        if self.loading_message.is_some() {
            ctx.request_repaint();
        }

        // Top menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open Image...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("Images", &["jpg", "jpeg", "png", "bmp", "tiff", "tif"])
                            .pick_file()
                        {
                            self.open_image(path);
                        }
                        ui.close_menu();
                    }
                    if ui.button("Load Segmentation...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("Segmentation", &["json", "yaml", "yml"])
                            .pick_file()
                        {
                            self.load_segmentation(&path);
                        }
                        ui.close_menu();
                    }
                    let can_load_frames = self.image_path.is_some();
                    if ui.add_enabled(can_load_frames, egui::Button::new("Load Frames...")).clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("Snapshot", &["json", "yaml", "yml"])
                            .pick_file()
                        {
                            self.load_frames(&path);
                        }
                        ui.close_menu();
                    }
                    ui.separator();
                    let can_export = self.tool.as_mark_tool_ref().surface().is_ready();
                    ui.add_enabled_ui(can_export, |ui| {
                        ui.menu_button("Export Snapshot", |ui| {
                            if ui.button("Export as JSON...").clicked() {
                                if let Some(path) = rfd::FileDialog::new()
                                    .add_filter("JSON", &["json"])
                                    .set_file_name("snapshot.json")
                                    .save_file()
                                {
                                    self.export_snapshot(&path);
                                }
                                ui.close_menu();
                            }
                            if ui.button("Export as YAML...").clicked() {
                                if let Some(path) = rfd::FileDialog::new()
                                    .add_filter("YAML", &["yaml", "yml"])
                                    .set_file_name("snapshot.yaml")
                                    .save_file()
                                {
                                    self.export_snapshot(&path);
                                }
                                ui.close_menu();
                            }
                        });
                    });
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("Edit", |ui| {
                    let has_selection = matches!(&self.tool, ActiveTool::Frames(t) if t.selected().is_some());
                    if ui.add_enabled(has_selection, egui::Button::new("Remove Selected (Del)")).clicked() {
                        self.remove_selected();
                        ui.close_menu();
                    }
                });
            });
        });

        // Toolbar
        let (frame_type, has_selection) = match &self.tool {
            ActiveTool::Frames(tool) => (tool.frame_type(), tool.selected().is_some()),
            ActiveTool::Segments(_) => (FrameType::None, false),
        };
        let toolbar_action = egui::TopBottomPanel::top("toolbar")
            .show(ctx, |ui| toolbar::show(ui, self.tool.kind(), frame_type, has_selection))
            .inner;

        match toolbar_action {
            ToolbarAction::SelectTool(kind) => {
                self.switch_tool(kind);
            }
            ToolbarAction::SwitchFrameType(frame_type) => self.switch_frame_type(frame_type),
            ToolbarAction::RemoveSelected => self.remove_selected(),
            ToolbarAction::None => {}
        }

        // Properties panel (right side)
        let properties_action = egui::SidePanel::right("properties")
            .default_width(250.0)
            .show(ctx, |ui| {
                let action = match &self.tool {
                    ActiveTool::Frames(tool) => properties::show_frames(ui, tool),
                    ActiveTool::Segments(tool) => {
                        properties::show_segments(ui, tool, self.last_selection.as_ref());
                        PropertiesAction::None
                    }
                };
                if let Some(message) = &self.error_message {
                    ui.separator();
                    ui.colored_label(egui::Color32::from_rgb(230, 90, 90), message);
                }
                action
            })
            .inner;

        if let PropertiesAction::RemoveRegion(id) = properties_action {
            if let ActiveTool::Frames(tool) = &mut self.tool {
                tool.remove_region(id);
                log::info!("Removed region {:?} from panel, total: {}", id, tool.region_count());
            }
        }

        self.handle_keyboard(ctx);

        // Main canvas (center)
        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(ref message) = self.loading_message {
                ui.centered_and_justified(|ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(20.0);
                        ui.spinner();
                        ui.add_space(10.0);
                        ui.label(
                            egui::RichText::new(message)
                                .size(16.0)
                                .color(egui::Color32::from_gray(200)),
                        );
                    });
                });
            } else {
                canvas::show(ui, self.tool.as_mark_tool(), &mut self.reader);
            }
        });
    }
}
