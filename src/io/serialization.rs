// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Snapshot and segmentation data serialization.
//!
//! This module handles exporting rendering-tree snapshots and importing
//! segmentation records and saved frames, in YAML and JSON formats.

use crate::models::scene::{MarkData, Node};
use crate::models::segment::ImageData;
use anyhow::{bail, Context, Result};
use std::path::Path;

/// Export a snapshot tree to YAML format.
pub fn export_yaml(root: &Node, path: &Path) -> Result<()> {
    let yaml = serde_yaml::to_string(root)?;
    std::fs::write(path, yaml)?;
    Ok(())
}

/// Export a snapshot tree to JSON format.
pub fn export_json(root: &Node, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(root)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Import a snapshot tree, choosing the format from the file extension.
pub fn import_snapshot(path: &Path) -> Result<Node> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let root = match extension(path) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&text)?,
        Some("json") => serde_json::from_str(&text)?,
        other => bail!("Unsupported file extension: {:?}", other),
    };
    Ok(root)
}

/// Saved rectangles from a snapshot file.
pub fn import_mark_data(path: &Path) -> Result<MarkData> {
    Ok(MarkData::from_snapshot(&import_snapshot(path)?))
}

/// Import a segmentation record.
///
/// A relative image `url` is resolved against the record's directory.
pub fn import_image_data(path: &Path) -> Result<ImageData> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mut data: ImageData = match extension(path) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&text)?,
        Some("json") => serde_json::from_str(&text)?,
        other => bail!("Unsupported file extension: {:?}", other),
    };
    let url = Path::new(&data.url);
    if url.is_relative() {
        if let Some(dir) = path.parent() {
            data.url = dir.join(url).to_string_lossy().to_string();
        }
    }
    Ok(data)
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|s| s.to_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::scene::Attrs;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("framemark-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_snapshot_json_and_yaml_reimport() {
        let root = Node::new("Stage", Attrs::default()).with_children(vec![Node::new(
            "Rect",
            Attrs {
                x: Some(1.0),
                y: Some(2.0),
                width: Some(3.0),
                height: Some(4.0),
                fill: Some("#aabbccb2".to_string()),
                ..Default::default()
            },
        )]);

        for name in ["snap.json", "snap.yaml"] {
            let path = temp_path(name);
            if name.ends_with("json") {
                export_json(&root, &path).unwrap();
            } else {
                export_yaml(&root, &path).unwrap();
            }
            assert_eq!(import_snapshot(&path).unwrap(), root);
            assert_eq!(import_mark_data(&path).unwrap().regions.len(), 1);
            let _ = std::fs::remove_file(&path);
        }
    }

    #[test]
    fn test_image_data_url_resolved_against_file() {
        let path = temp_path("data.yaml");
        std::fs::write(&path, "url: street.jpg\ncategorys:\n  - segmentation: [[0, 0, 1, 0, 1, 1]]\n").unwrap();
        let data = import_image_data(&path).unwrap();
        assert_eq!(data.categories.len(), 1);
        assert!(Path::new(&data.url).is_absolute());
        assert!(data.url.ends_with("street.jpg"));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_unsupported_extension() {
        let path = temp_path("data.txt");
        std::fs::write(&path, "{}").unwrap();
        assert!(import_image_data(&path).is_err());
        let _ = std::fs::remove_file(&path);
    }
}
