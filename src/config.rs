// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Tunable interaction settings.
//!
//! Defaults match the behaviour users expect from the mark surface; a
//! `framemark.yaml` next to the executable's working directory overrides
//! any subset of them.

use crate::error::Result;
use crate::surface::DeviceClass;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File name looked up in the working directory at startup.
pub const CONFIG_FILE: &str = "framemark.yaml";

/// Interaction and rendering settings shared by both tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkConfig {
    /// Smallest allowed viewport scale
    pub min_scale: f32,
    /// Largest allowed viewport scale
    pub max_scale: f32,
    /// Multiplicative zoom step per wheel event
    pub scale_by: f32,
    /// Distance in pixels from the viewport edge that triggers auto-pan
    pub edge_threshold: f32,
    /// Auto-pan nudge in pixels per interaction frame
    pub pan_step: f32,
    /// Alpha applied to region fill colours
    pub fill_alpha: u8,
    /// Delay before content dragging is re-enabled after drawing a box
    pub drag_restore_delay_ms: u64,
    /// Milliseconds per pixel of marching-ants dash offset
    pub ants_speed: f32,
    /// Forces the gesture set instead of detecting it
    pub device: Option<DeviceClass>,
}

impl Default for MarkConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.8,
            max_scale: 10.0,
            scale_by: 1.02,
            edge_threshold: 50.0,
            pan_step: 5.0,
            fill_alpha: 0xB2,
            drag_restore_delay_ms: 10,
            ants_speed: 50.0,
            device: None,
        }
    }
}

impl MarkConfig {
    /// Read a config from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&yaml)?)
    }

    /// Load `framemark.yaml` from the working directory, falling back to
    /// defaults when it is absent or unreadable.
    pub fn load_or_default() -> Self {
        let path = Path::new(CONFIG_FILE);
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => {
                log::info!("Loaded settings from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Ignoring {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}
