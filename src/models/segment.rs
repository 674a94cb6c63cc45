// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Segmentation input data.
//!
//! An [`ImageData`] record names a background image and a list of
//! categories, each carrying raw polygon coordinate lists. Processing a
//! record splits every list into closed loops and attaches a fill colour
//! and a checked flag to each loop.

use super::annotation::Color;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Segmentation record for one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageData {
    /// Location of the background image
    pub url: String,
    #[serde(alias = "categorys", default)]
    pub categories: Vec<Category>,
    /// Fields this tool does not interpret, kept for the caller
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// One labelled category and its polygons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(default)]
    pub name: String,
    /// Raw coordinate lists, `[x0, y0, x1, y1, ...]`
    #[serde(default)]
    pub segmentation: Vec<Vec<f64>>,
    /// Assigned when the record is processed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<Color>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub handled_segmentation: Vec<HandledSegment>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// A closed loop cut out of a category's segmentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandledSegment {
    pub splited_segmentation: Vec<f64>,
    pub is_checked: bool,
}

impl HandledSegment {
    pub fn new(points: Vec<f64>) -> Self {
        Self {
            splited_segmentation: points,
            is_checked: false,
        }
    }

    /// Loop vertices as screen-ready points.
    pub fn points(&self) -> Vec<egui::Pos2> {
        self.splited_segmentation
            .chunks_exact(2)
            .map(|xy| egui::pos2(xy[0] as f32, xy[1] as f32))
            .collect()
    }
}

impl ImageData {
    /// Split every category into loops, assign colours, reset checked state.
    pub fn handle_segmentation(&mut self) {
        for category in &mut self.categories {
            category.fill_color = Some(Color::random());
            category.handled_segmentation = split_segmentation(&category.segmentation)
                .into_iter()
                .map(HandledSegment::new)
                .collect();
        }
    }

    /// Total number of handled loops across all categories.
    pub fn region_count(&self) -> usize {
        self.categories
            .iter()
            .map(|c| c.handled_segmentation.len())
            .sum()
    }
}

/// Split raw coordinate lists into disjoint closed loops.
///
/// A loop ends where a vertex repeats the loop's first vertex; the
/// repeated vertex is dropped. Whatever remains after the last closure
/// forms a final loop. Degenerate input passes through unchecked.
pub fn split_segmentation(segmentation: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let mut loops = Vec::new();
    for coords in segmentation {
        let mut current: Vec<f64> = Vec::new();
        for xy in coords.chunks_exact(2) {
            let closes = current.len() >= 6 && current[0] == xy[0] && current[1] == xy[1];
            if closes {
                loops.push(std::mem::take(&mut current));
            } else {
                current.extend_from_slice(xy);
            }
        }
        if !current.is_empty() {
            loops.push(current);
        }
    }
    loops
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_single_open_list() {
        let loops = split_segmentation(&[vec![0.0, 0.0, 10.0, 0.0, 10.0, 10.0]]);
        assert_eq!(loops, vec![vec![0.0, 0.0, 10.0, 0.0, 10.0, 10.0]]);
    }

    #[test]
    fn test_split_two_closed_loops() {
        let coords = vec![
            0.0, 0.0, 10.0, 0.0, 10.0, 10.0, 0.0, 0.0, // first loop, closed
            20.0, 20.0, 30.0, 20.0, 30.0, 30.0, 20.0, 20.0, // second loop
        ];
        let loops = split_segmentation(&[coords]);
        assert_eq!(loops.len(), 2);
        assert_eq!(loops[0], vec![0.0, 0.0, 10.0, 0.0, 10.0, 10.0]);
        assert_eq!(loops[1], vec![20.0, 20.0, 30.0, 20.0, 30.0, 30.0]);
    }

    #[test]
    fn test_handle_segmentation_shares_category_colour() {
        let json = r#"{
            "url": "cat.jpg",
            "categorys": [
                { "name": "cat", "segmentation": [[0,0, 4,0, 4,4, 0,0, 5,5, 9,5, 9,9]] }
            ],
            "id": 7
        }"#;
        let mut data: ImageData = serde_json::from_str(json).unwrap();
        data.handle_segmentation();

        let category = &data.categories[0];
        assert_eq!(category.handled_segmentation.len(), 2);
        assert!(category.fill_color.is_some());
        assert!(category.handled_segmentation.iter().all(|s| !s.is_checked));
        assert_eq!(data.extra.get("id"), Some(&serde_json::json!(7)));
    }
}
