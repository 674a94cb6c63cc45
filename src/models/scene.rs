// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Serializable snapshot of the rendering tree.
//!
//! The layout mirrors the classic stage / layer / group node tree: every
//! node has a class name, a bag of attributes and ordered children.

use super::annotation::{BoundingBox, Color};
use serde::{Deserialize, Serialize};

/// Attributes of a snapshot node. Unset attributes are omitted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attrs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draggable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resize_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub points: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dash: Vec<f32>,
}

/// One node of the snapshot tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub class_name: String,
    #[serde(default)]
    pub attrs: Attrs,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(class_name: &str, attrs: Attrs) -> Self {
        Self {
            class_name: class_name.to_string(),
            attrs,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    /// Depth-first walk over this node and its descendants.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Node)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

/// A rectangle restored from a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkRegion {
    pub rect: BoundingBox,
    pub color: Color,
}

/// Previously drawn rectangles to restore when a frame session begins.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MarkData {
    pub regions: Vec<MarkRegion>,
}

impl MarkData {
    /// Collect every `Rect` node of a snapshot tree.
    ///
    /// Rect nodes without a usable fill colour get a fresh random one.
    pub fn from_snapshot(root: &Node) -> Self {
        let mut regions = Vec::new();
        root.walk(&mut |node| {
            if node.class_name != "Rect" {
                return;
            }
            let a = &node.attrs;
            let rect = BoundingBox::new(
                a.x.unwrap_or(0.0),
                a.y.unwrap_or(0.0),
                a.width.unwrap_or(0.0),
                a.height.unwrap_or(0.0),
            );
            let color = a
                .fill
                .clone()
                .and_then(|fill| Color::try_from(fill).ok())
                .unwrap_or_else(Color::random);
            regions.push(MarkRegion { rect, color });
        });
        Self { regions }
    }

    /// Parse a JSON snapshot produced by `to_json`.
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        let root: Node = serde_json::from_str(json)?;
        Ok(Self::from_snapshot(&root))
    }
}
