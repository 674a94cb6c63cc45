// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Device-independent gestures.
//!
//! [`GestureReader`] turns raw egui input into [`Gesture`] values in stage
//! coordinates. Which raw events are honoured depends on the gesture set
//! chosen when the surface was built: the mouse set reads buttons, motion
//! and the wheel, the touch set reads touch points only.

use egui::{Pos2, Rect};

/// Input family wired to a surface for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureSet {
    Mouse,
    Touch,
}

/// One interaction step, in stage coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    /// Primary button or finger down. `touches` is 0 for a mouse.
    Press { pos: Pos2, touches: usize },
    Move { pos: Pos2, touches: usize },
    Release { pos: Pos2 },
    /// Browser convention: negative `delta_y` scrolls up.
    Wheel { pos: Pos2, delta_y: f32 },
    TouchStart { points: Vec<Pos2> },
    TouchMove { points: Vec<Pos2> },
    /// Points still down after a finger lifted.
    TouchEnd { points: Vec<Pos2> },
}

/// Converts egui input events into gestures.
#[derive(Debug)]
pub struct GestureReader {
    set: GestureSet,
    touches: Vec<(egui::TouchId, Pos2)>,
    /// Last pointer position seen in a move event
    hover: Option<Pos2>,
}

impl GestureReader {
    pub fn new(set: GestureSet) -> Self {
        Self {
            set,
            touches: Vec::new(),
            hover: None,
        }
    }

    /// Collect this frame's gestures for a stage occupying `stage`.
    ///
    /// Presses, touches and wheel steps only start on the stage when
    /// `accepts` agrees, so input aimed at a popup or window drawn over the
    /// canvas never reaches the tool. Moves and releases always pass so an
    /// interaction already in progress can finish.
    pub fn read(&mut self, input: &egui::InputState, stage: Rect, accepts: &dyn Fn(Pos2) -> bool) -> Vec<Gesture> {
        let origin = stage.min.to_vec2();
        let starts_here = |pos: Pos2| stage.contains(pos) && accepts(pos);
        let mut gestures = Vec::new();

        for event in &input.events {
            match (self.set, event) {
                (
                    GestureSet::Mouse,
                    egui::Event::PointerButton {
                        pos,
                        button: egui::PointerButton::Primary,
                        pressed,
                        ..
                    },
                ) => {
                    if *pressed {
                        if starts_here(*pos) {
                            gestures.push(Gesture::Press { pos: *pos - origin, touches: 0 });
                        }
                    } else {
                        gestures.push(Gesture::Release { pos: *pos - origin });
                    }
                }
                (GestureSet::Mouse, egui::Event::PointerMoved(pos)) => {
                    self.hover = Some(*pos);
                    gestures.push(Gesture::Move { pos: *pos - origin, touches: 0 });
                }
                (GestureSet::Mouse, egui::Event::MouseWheel { delta, .. }) if delta.y != 0.0 => {
                    // One zoom step per wheel event
                    let hover = input.pointer.hover_pos().or(self.hover);
                    if let Some(pos) = hover.filter(|p| starts_here(*p)) {
                        gestures.push(Gesture::Wheel {
                            pos: pos - origin,
                            delta_y: -delta.y,
                        });
                    }
                }
                (GestureSet::Touch, egui::Event::Touch { id, phase, pos, .. }) => {
                    let accepted = starts_here(*pos);
                    self.read_touch(*id, *phase, *pos, origin, accepted, &mut gestures);
                }
                _ => {}
            }
        }

        gestures
    }

    fn read_touch(
        &mut self,
        id: egui::TouchId,
        phase: egui::TouchPhase,
        pos: Pos2,
        origin: egui::Vec2,
        accepted: bool,
        out: &mut Vec<Gesture>,
    ) {
        let pos = pos - origin;
        match phase {
            egui::TouchPhase::Start => {
                if !accepted {
                    return;
                }
                self.touches.push((id, pos));
                out.push(Gesture::TouchStart { points: self.points() });
                out.push(Gesture::Press { pos, touches: self.touches.len() });
            }
            egui::TouchPhase::Move => {
                let Some(entry) = self.touches.iter_mut().find(|(t, _)| *t == id) else {
                    return;
                };
                entry.1 = pos;
                out.push(Gesture::TouchMove { points: self.points() });
                out.push(Gesture::Move { pos, touches: self.touches.len() });
            }
            egui::TouchPhase::End | egui::TouchPhase::Cancel => {
                let before = self.touches.len();
                self.touches.retain(|(t, _)| *t != id);
                if self.touches.len() == before {
                    return;
                }
                out.push(Gesture::Release { pos });
                out.push(Gesture::TouchEnd { points: self.points() });
            }
        }
    }

    fn points(&self) -> Vec<Pos2> {
        self.touches.iter().map(|(_, p)| *p).collect()
    }
}
