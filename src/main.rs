// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! FrameMark - image annotation with bounding boxes and segmentation
//!
//! A cross-platform desktop application for drawing rectangle frames over
//! an image and toggling the polygons of a segmentation record, with
//! wheel/pinch zoom and drag panning.

mod app;
mod config;
mod error;
mod io;
mod models;
mod surface;
mod tools;
mod ui;
mod util;

use anyhow::{Context, Result};
use app::MarkApp;
use config::MarkConfig;

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let config = MarkConfig::load_or_default();
    let app = MarkApp::new(config).context("Failed to mount the annotation surface")?;

    // Configure egui options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("FrameMark"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native("FrameMark", options, Box::new(move |_cc| Ok(Box::new(app))))
        .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
