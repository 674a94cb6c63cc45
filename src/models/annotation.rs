// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Rectangle annotation data structures.
//!
//! This module defines the bounding boxes drawn in frame mode, their
//! colours, and the transform handle overlay attached to each region.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// An RGB colour serialized as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Pick a random colour.
    pub fn random() -> Self {
        let mut rng = rand::thread_rng();
        Self::rgb(rng.gen(), rng.gen(), rng.gen())
    }

    /// Hex notation, e.g. `#1f8ad2`.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Hex notation with an alpha suffix, e.g. `#1f8ad2b2`.
    pub fn to_hex_alpha(&self, alpha: u8) -> String {
        format!("{}{:02x}", self.to_hex(), alpha)
    }

    pub fn to_egui(&self) -> egui::Color32 {
        egui::Color32::from_rgb(self.r, self.g, self.b)
    }

    /// Translucent variant used for region fills.
    pub fn with_alpha(&self, alpha: u8) -> egui::Color32 {
        egui::Color32::from_rgba_unmultiplied(self.r, self.g, self.b, alpha)
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let hex = value.trim_start_matches('#');
        if !hex.is_ascii() || (hex.len() != 6 && hex.len() != 8) {
            return Err(format!("invalid colour: {value}"));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| format!("invalid colour: {value}"))
        };
        Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

/// An axis-aligned box in content space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn min(&self) -> egui::Pos2 {
        egui::pos2(self.x, self.y)
    }

    pub fn max(&self) -> egui::Pos2 {
        egui::pos2(self.x + self.width, self.y + self.height)
    }

    pub fn size(&self) -> egui::Vec2 {
        egui::vec2(self.width, self.height)
    }

    pub fn contains(&self, p: egui::Pos2) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }
}

/// Stable identifier of a rectangle region within one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionId(pub u64);

/// One of the eight resize anchors of a transformer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    TopLeft,
    TopCenter,
    TopRight,
    MiddleLeft,
    MiddleRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl Anchor {
    pub const ALL: [Anchor; 8] = [
        Anchor::TopLeft,
        Anchor::TopCenter,
        Anchor::TopRight,
        Anchor::MiddleLeft,
        Anchor::MiddleRight,
        Anchor::BottomLeft,
        Anchor::BottomCenter,
        Anchor::BottomRight,
    ];

    /// Position of the anchor on a box, in the box's coordinate space.
    pub fn position(&self, rect: &BoundingBox) -> egui::Pos2 {
        let (fx, fy) = self.factors();
        egui::pos2(rect.x + rect.width * fx, rect.y + rect.height * fy)
    }

    fn factors(&self) -> (f32, f32) {
        match self {
            Anchor::TopLeft => (0.0, 0.0),
            Anchor::TopCenter => (0.5, 0.0),
            Anchor::TopRight => (1.0, 0.0),
            Anchor::MiddleLeft => (0.0, 0.5),
            Anchor::MiddleRight => (1.0, 0.5),
            Anchor::BottomLeft => (0.0, 1.0),
            Anchor::BottomCenter => (0.5, 1.0),
            Anchor::BottomRight => (1.0, 1.0),
        }
    }

    /// Box proposed when this anchor is dragged to `p`.
    ///
    /// The opposite edges stay fixed; dragging past them flips the box
    /// rather than producing a negative size.
    pub fn resize(&self, rect: &BoundingBox, p: egui::Pos2) -> BoundingBox {
        let (mut x0, mut y0) = (rect.x, rect.y);
        let (mut x1, mut y1) = (rect.x + rect.width, rect.y + rect.height);
        match self {
            Anchor::TopLeft | Anchor::MiddleLeft | Anchor::BottomLeft => x0 = p.x,
            Anchor::TopRight | Anchor::MiddleRight | Anchor::BottomRight => x1 = p.x,
            Anchor::TopCenter | Anchor::BottomCenter => {}
        }
        match self {
            Anchor::TopLeft | Anchor::TopCenter | Anchor::TopRight => y0 = p.y,
            Anchor::BottomLeft | Anchor::BottomCenter | Anchor::BottomRight => y1 = p.y,
            Anchor::MiddleLeft | Anchor::MiddleRight => {}
        }
        BoundingBox::new(x0.min(x1), y0.min(y1), (x1 - x0).abs(), (y1 - y0).abs())
    }
}

/// Resize handle overlay of a region. Hidden unless the region is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Transformer {
    pub resize_enabled: bool,
}

/// A user-drawn bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct RectRegion {
    pub id: RegionId,
    pub rect: BoundingBox,
    pub color: Color,
    pub transformer: Transformer,
}

impl RectRegion {
    pub fn new(id: RegionId, rect: BoundingBox, color: Color) -> Self {
        Self {
            id,
            rect,
            color,
            transformer: Transformer::default(),
        }
    }

    pub fn is_selected(&self) -> bool {
        self.transformer.resize_enabled
    }
}
