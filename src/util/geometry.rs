// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! This module provides the coordinate transformations between stage
//! (screen) space and content space, box normalisation, and the edge
//! checks that drive auto-panning while dragging.

use crate::models::annotation::BoundingBox;
use egui::{Pos2, Vec2};

/// A viewport boundary the pointer is close to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

/// Convert a stage pointer position to content space.
pub fn pointer_to_image_space(pointer: Pos2, group_position: Pos2, scale: f32) -> Pos2 {
    Pos2 {
        x: (pointer.x - group_position.x) / scale,
        y: (pointer.y - group_position.y) / scale,
    }
}

/// Box spanned by a drag from `start` to `(x, y)`, with non-negative size.
pub fn normalize_box(start: Pos2, x: f32, y: f32) -> BoundingBox {
    BoundingBox {
        x: x.min(start.x),
        y: y.min(start.y),
        width: (x - start.x).abs(),
        height: (y - start.y).abs(),
    }
}

/// First viewport edge within `threshold` pixels of the pointer.
///
/// Checked in the order left, right, top, bottom.
pub fn nearest_edge(pointer: Pos2, viewport: Vec2, threshold: f32) -> Option<Edge> {
    if pointer.x - threshold <= 0.0 {
        Some(Edge::Left)
    } else if pointer.x + threshold >= viewport.x {
        Some(Edge::Right)
    } else if pointer.y - threshold <= 0.0 {
        Some(Edge::Top)
    } else if pointer.y + threshold >= viewport.y {
        Some(Edge::Bottom)
    } else {
        None
    }
}

/// Pan offset that scrolls the view away from `edge`.
pub fn auto_pan_step(edge: Edge, step: f32) -> Vec2 {
    match edge {
        Edge::Left => Vec2::new(step, 0.0),
        Edge::Right => Vec2::new(-step, 0.0),
        Edge::Top => Vec2::new(0.0, step),
        Edge::Bottom => Vec2::new(0.0, -step),
    }
}

/// Keep a dragged box inside the image.
///
/// `pos` is the proposed absolute (stage) position of the box's top-left
/// corner and `group_position` the absolute position of the content group.
pub fn clamp_drag_position(
    pos: Pos2,
    group_position: Pos2,
    scale: f32,
    image_size: Vec2,
    box_size: Vec2,
) -> Pos2 {
    let max_x = (image_size.x - box_size.x) * scale + group_position.x;
    let max_y = (image_size.y - box_size.y) * scale + group_position.y;
    Pos2 {
        x: pos.x.min(max_x).max(group_position.x),
        y: pos.y.min(max_y).max(group_position.y),
    }
}

/// Limit a transformer's proposed box to the image extent.
///
/// An axis on which the proposed box leaves the image keeps the old
/// position and size, so the anchor opposite the dragged one stays put.
pub fn bound_box(old: &BoundingBox, new: &BoundingBox, image_size: Vec2) -> BoundingBox {
    let (x, width) = if new.x < 0.0 || new.x + new.width > image_size.x {
        (old.x, old.width)
    } else {
        (new.x, new.width)
    };
    let (y, height) = if new.y < 0.0 || new.y + new.height > image_size.y {
        (old.y, old.height)
    } else {
        (new.y, new.height)
    };
    BoundingBox { x, y, width, height }
}

pub fn distance(a: Pos2, b: Pos2) -> f32 {
    (b - a).length()
}

pub fn midpoint(a: Pos2, b: Pos2) -> Pos2 {
    Pos2::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

/// Even-odd point-in-polygon test.
pub fn point_in_polygon(p: Pos2, polygon: &[Pos2]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (a, b) = (polygon[i], polygon[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn signed_area(polygon: &[Pos2]) -> f32 {
    let n = polygon.len();
    (0..n)
        .map(|i| {
            let (a, b) = (polygon[i], polygon[(i + 1) % n]);
            a.x * b.y - b.x * a.y
        })
        .sum::<f32>()
        / 2.0
}

fn cross(o: Pos2, a: Pos2, b: Pos2) -> f32 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Ear-clipping triangulation of a simple polygon.
///
/// Returns vertex index triples. Self-intersecting input falls back to a
/// fan over whatever vertices are left, so every vertex is still covered.
pub fn triangulate(polygon: &[Pos2]) -> Vec<[u32; 3]> {
    let n = polygon.len();
    if n < 3 {
        return Vec::new();
    }
    let ccw = signed_area(polygon) > 0.0;
    let mut remaining: Vec<usize> = (0..n).collect();
    let mut triangles = Vec::with_capacity(n - 2);

    while remaining.len() > 3 {
        let m = remaining.len();
        let ear = (0..m).find(|&i| {
            let (ia, ib, ic) = (remaining[(i + m - 1) % m], remaining[i], remaining[(i + 1) % m]);
            let (a, b, c) = (polygon[ia], polygon[ib], polygon[ic]);
            let turn = cross(a, b, c);
            if (turn > 0.0) != ccw || turn == 0.0 {
                return false;
            }
            remaining.iter().all(|&j| {
                if j == ia || j == ib || j == ic {
                    return true;
                }
                let p = polygon[j];
                let (d1, d2, d3) = (cross(a, b, p), cross(b, c, p), cross(c, a, p));
                let inside = if ccw {
                    d1 >= 0.0 && d2 >= 0.0 && d3 >= 0.0
                } else {
                    d1 <= 0.0 && d2 <= 0.0 && d3 <= 0.0
                };
                !inside
            })
        });
        let Some(i) = ear else {
            break;
        };
        let m = remaining.len();
        triangles.push([
            remaining[(i + m - 1) % m] as u32,
            remaining[i] as u32,
            remaining[(i + 1) % m] as u32,
        ]);
        remaining.remove(i);
    }

    for k in 1..remaining.len().saturating_sub(1) {
        triangles.push([remaining[0] as u32, remaining[k] as u32, remaining[k + 1] as u32]);
    }
    triangles
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::{pos2, vec2};

    #[test]
    fn test_pointer_to_image_space() {
        let p = pointer_to_image_space(pos2(110.0, 60.0), pos2(10.0, 20.0), 2.0);
        assert_eq!(p, pos2(50.0, 20.0));
    }

    #[test]
    fn test_normalize_box_scenario() {
        let b = normalize_box(pos2(10.0, 10.0), 5.0, 20.0);
        assert_eq!(b, BoundingBox::new(5.0, 10.0, 5.0, 10.0));
    }

    #[test]
    fn test_normalize_box_zero_and_direction() {
        let start = pos2(42.0, 17.0);
        let zero = normalize_box(start, start.x, start.y);
        assert_eq!(zero.width, 0.0);
        assert_eq!(zero.height, 0.0);

        for (x, y) in [(0.0, 0.0), (100.0, 0.0), (0.0, 100.0), (100.0, 100.0)] {
            let b = normalize_box(start, x, y);
            assert!(b.width >= 0.0 && b.height >= 0.0);
            assert_eq!(b.x, x.min(start.x));
            assert_eq!(b.y, y.min(start.y));
        }
    }

    #[test]
    fn test_nearest_edge_priority() {
        let viewport = vec2(800.0, 600.0);
        assert_eq!(nearest_edge(pos2(400.0, 300.0), viewport, 50.0), None);
        assert_eq!(nearest_edge(pos2(10.0, 10.0), viewport, 50.0), Some(Edge::Left));
        assert_eq!(nearest_edge(pos2(790.0, 590.0), viewport, 50.0), Some(Edge::Right));
        assert_eq!(nearest_edge(pos2(400.0, 20.0), viewport, 50.0), Some(Edge::Top));
        assert_eq!(nearest_edge(pos2(400.0, 560.0), viewport, 50.0), Some(Edge::Bottom));
    }

    #[test]
    fn test_auto_pan_step_moves_away_from_edge() {
        assert_eq!(auto_pan_step(Edge::Left, 5.0), vec2(5.0, 0.0));
        assert_eq!(auto_pan_step(Edge::Right, 5.0), vec2(-5.0, 0.0));
        assert_eq!(auto_pan_step(Edge::Top, 5.0), vec2(0.0, 5.0));
        assert_eq!(auto_pan_step(Edge::Bottom, 5.0), vec2(0.0, -5.0));
    }

    #[test]
    fn test_clamp_drag_position() {
        let group = pos2(10.0, 10.0);
        let image = vec2(100.0, 50.0);
        let size = vec2(20.0, 10.0);
        assert_eq!(clamp_drag_position(pos2(0.0, 0.0), group, 2.0, image, size), group);
        assert_eq!(
            clamp_drag_position(pos2(500.0, 500.0), group, 2.0, image, size),
            pos2(170.0, 90.0)
        );
        assert_eq!(
            clamp_drag_position(pos2(50.0, 40.0), group, 2.0, image, size),
            pos2(50.0, 40.0)
        );
    }

    #[test]
    fn test_bound_box_keeps_old_size_on_violated_axis() {
        let image = vec2(100.0, 100.0);
        let old = BoundingBox::new(60.0, 10.0, 30.0, 30.0);
        let new = BoundingBox::new(60.0, 10.0, 50.0, 40.0);
        let bounded = bound_box(&old, &new, image);
        assert_eq!(bounded, BoundingBox::new(60.0, 10.0, 30.0, 40.0));

        // Dragging the left/top edges past the origin leaves the far edges fixed.
        let past_origin = BoundingBox::new(-5.0, -8.0, 95.0, 48.0);
        let bounded = bound_box(&old, &past_origin, image);
        assert_eq!(bounded, old);
        assert_eq!(bounded.x + bounded.width, 90.0);
        assert_eq!(bounded.y + bounded.height, 40.0);

        let top_only = BoundingBox::new(60.0, -2.0, 30.0, 42.0);
        let bounded = bound_box(&old, &top_only, image);
        assert_eq!(bounded, BoundingBox::new(60.0, 10.0, 30.0, 30.0));
    }

    #[test]
    fn test_point_in_polygon() {
        let square = [pos2(0.0, 0.0), pos2(10.0, 0.0), pos2(10.0, 10.0), pos2(0.0, 10.0)];
        assert!(point_in_polygon(pos2(5.0, 5.0), &square));
        assert!(!point_in_polygon(pos2(15.0, 5.0), &square));
        assert!(!point_in_polygon(pos2(5.0, 5.0), &square[..2]));
    }

    #[test]
    fn test_triangulate_concave() {
        // L-shape, clockwise in screen space
        let l = [
            pos2(0.0, 0.0),
            pos2(20.0, 0.0),
            pos2(20.0, 10.0),
            pos2(10.0, 10.0),
            pos2(10.0, 20.0),
            pos2(0.0, 20.0),
        ];
        let triangles = triangulate(&l);
        assert_eq!(triangles.len(), 4);
        let area: f32 = triangles
            .iter()
            .map(|t| cross(l[t[0] as usize], l[t[1] as usize], l[t[2] as usize]).abs() / 2.0)
            .sum();
        assert!((area - 300.0).abs() < 1e-3);
        assert!(triangulate(&l[..2]).is_empty());
    }

    #[test]
    fn test_distance_and_midpoint() {
        assert_eq!(distance(pos2(0.0, 0.0), pos2(3.0, 4.0)), 5.0);
        assert_eq!(midpoint(pos2(0.0, 0.0), pos2(4.0, 2.0)), pos2(2.0, 1.0));
    }
}
