// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O operations for images, snapshots and segmentation files.

pub mod media;
pub mod serialization;
