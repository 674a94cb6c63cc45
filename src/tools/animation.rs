// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Marching-ants outline animation.

use std::time::Instant;

/// Per-region animation task driving a dashed outline's offset.
///
/// A running task asks the host for a new frame every tick; a stopped one
/// asks for nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct MarchingAnts {
    started_at: Option<Instant>,
    /// Milliseconds per pixel of offset
    speed: f32,
}

impl MarchingAnts {
    pub fn new(speed: f32) -> Self {
        Self {
            started_at: None,
            speed,
        }
    }

    pub fn start(&mut self, now: Instant) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
    }

    pub fn stop(&mut self) {
        self.started_at = None;
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Dash offset at `now`; zero while stopped.
    pub fn dash_offset(&self, now: Instant) -> f32 {
        match self.started_at {
            Some(start) => now.saturating_duration_since(start).as_millis() as f32 / self.speed,
            None => 0.0,
        }
    }
}
