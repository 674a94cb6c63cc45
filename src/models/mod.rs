// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Data model for regions, segmentation input and tree snapshots.

pub mod annotation;
pub mod scene;
pub mod segment;
