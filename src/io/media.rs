// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Background image loading.
//!
//! Decoding runs on a worker thread; [`ImageLoad`] is the handle the UI
//! polls each frame until the decoded pixels (or the failure) arrive.

use crate::error::{MarkError, Result};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, TryRecvError};

/// A decoded RGBA image.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedImage {
    /// Where the image came from
    pub source: String,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl LoadedImage {
    /// Blank image of the given size, used when no pixels are needed.
    pub fn blank(source: &str, width: u32, height: u32) -> Self {
        Self {
            source: source.to_string(),
            width,
            height,
            pixels: vec![0; (width * height * 4) as usize],
        }
    }

    pub fn size(&self) -> egui::Vec2 {
        egui::vec2(self.width as f32, self.height as f32)
    }
}

/// Decode an image file into RGBA pixels.
pub fn load_image(path: &Path) -> Result<LoadedImage> {
    let decoded = image::open(path).map_err(|source| MarkError::ImageDecode {
        path: path.to_path_buf(),
        source,
    })?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(LoadedImage {
        source: path.to_string_lossy().to_string(),
        width,
        height,
        pixels: rgba.into_raw(),
    })
}

/// An image decode in flight.
pub struct ImageLoad {
    receiver: Receiver<Result<LoadedImage>>,
}

impl ImageLoad {
    /// Start decoding `path` on a background thread.
    pub fn spawn(path: PathBuf) -> Self {
        let (sender, receiver) = channel();
        std::thread::spawn(move || {
            let result = load_image(&path);
            match &result {
                Ok(img) => log::info!("Loaded image: {} ({}x{})", path.display(), img.width, img.height),
                Err(e) => log::error!("{}", e),
            }
            let _ = sender.send(result);
        });
        Self { receiver }
    }

    /// The decode result once it is available.
    pub fn poll(&self) -> Option<Result<LoadedImage>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(MarkError::LoaderDisconnected)),
        }
    }
}
