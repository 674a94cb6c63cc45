// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Polygon segmentation tool.
//!
//! Renders the polygons of a pre-computed segmentation over the image and
//! lets the user check or uncheck them with a click or tap. Checked
//! polygons get an animated dashed outline.

use super::animation::MarchingAnts;
use super::{MarkTool, CLICK_DISTANCE};
use crate::config::MarkConfig;
use crate::error::Result;
use crate::io::media::LoadedImage;
use crate::models::annotation::Color;
use crate::models::scene::{Attrs, Node};
use crate::models::segment::{HandledSegment, ImageData};
use crate::surface::gesture::Gesture;
use crate::surface::{HostElement, Surface};
use crate::ui::canvas;
use crate::util::geometry::{point_in_polygon, triangulate};
use egui::Pos2;
use std::time::Instant;

/// Outline colour of a checked polygon.
const OUTLINE_COLOR: egui::Color32 = egui::Color32::from_rgba_premultiplied(179, 179, 179, 179);
/// Dash and gap length of the outline, in stage pixels.
const OUTLINE_DASH: f32 = 5.0;

/// The filled shape of a rendered polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct FillPolygon {
    /// Vertices in content space
    pub points: Vec<Pos2>,
    pub fill: Color,
}

/// Called on every toggle with the toggled loop, its fill shape and the
/// full current image data.
pub type SelectCallback = Box<dyn FnMut(&HandledSegment, &FillPolygon, &ImageData)>;

/// One rendered loop: a fill polygon plus a dashed outline.
struct SegmentRegion {
    category: usize,
    segment: usize,
    shape: FillPolygon,
    /// Fill triangulation, fixed under pan and zoom
    triangles: Vec<[u32; 3]>,
    outline_visible: bool,
    ants: MarchingAnts,
}

pub struct SegmentMark {
    surface: Surface,
    image_data: Option<ImageData>,
    regions: Vec<SegmentRegion>,
    press: Option<Pos2>,
    pub on_select: Option<SelectCallback>,
}

impl SegmentMark {
    pub fn new(host: &[HostElement], config: MarkConfig) -> Result<Self> {
        Ok(Self {
            surface: Surface::new(host, config)?,
            image_data: None,
            regions: Vec::new(),
            press: None,
            on_select: None,
        })
    }

    /// Start a session for `data` over its decoded background image.
    ///
    /// The record is copied, so later changes to the caller's value do not
    /// reach the session.
    pub fn begin_draw(&mut self, data: &ImageData, image: LoadedImage) {
        self.clear();
        let mut data = data.clone();
        data.handle_segmentation();
        self.surface.draw_background_image(image);
        self.draw_image_polygons(&data);
        log::info!(
            "Segmentation ready: {} categories, {} regions",
            data.categories.len(),
            self.regions.len()
        );
        self.image_data = Some(data);
    }

    fn draw_image_polygons(&mut self, data: &ImageData) {
        let speed = self.surface.config().ants_speed;
        for (ci, category) in data.categories.iter().enumerate() {
            let fill = category.fill_color.unwrap_or_else(Color::random);
            for (si, segment) in category.handled_segmentation.iter().enumerate() {
                let points = segment.points();
                self.regions.push(SegmentRegion {
                    category: ci,
                    segment: si,
                    triangles: triangulate(&points),
                    shape: FillPolygon { points, fill },
                    outline_visible: false,
                    ants: MarchingAnts::new(speed),
                });
            }
        }
        self.surface.layer.batch_draw();
    }

    /// Remove every region, stopping its animation first.
    pub fn clear(&mut self) {
        for region in &mut self.regions {
            region.ants.stop();
        }
        self.regions.clear();
        self.image_data = None;
    }

    pub fn image_data(&self) -> Option<&ImageData> {
        self.image_data.as_ref()
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// Whether any outline animation is running.
    pub fn is_animating(&self) -> bool {
        self.regions.iter().any(|r| r.ants.is_running())
    }

    fn segment(&self, index: usize) -> Option<&HandledSegment> {
        let region = self.regions.get(index)?;
        self.image_data
            .as_ref()?
            .categories
            .get(region.category)?
            .handled_segmentation
            .get(region.segment)
    }

    /// Checked state of the `index`-th rendered region.
    pub fn is_checked(&self, index: usize) -> Option<bool> {
        self.segment(index).map(|s| s.is_checked)
    }

    /// Flip a region's checked state and notify `on_select`.
    pub fn toggle(&mut self, index: usize, now: Instant) {
        let Some(region) = self.regions.get_mut(index) else {
            return;
        };
        let Some(data) = self.image_data.as_mut() else {
            return;
        };
        let Some(segment) = data
            .categories
            .get_mut(region.category)
            .and_then(|c| c.handled_segmentation.get_mut(region.segment))
        else {
            return;
        };

        segment.is_checked = !segment.is_checked;
        region.outline_visible = segment.is_checked;
        if segment.is_checked {
            region.ants.start(now);
        } else {
            region.ants.stop();
        }
        log::debug!(
            "Region {} of category {} {}",
            region.segment,
            region.category,
            if segment.is_checked { "checked" } else { "unchecked" }
        );

        let segment = segment.clone();
        self.surface.layer.batch_draw();
        if let (Some(callback), Some(data)) = (self.on_select.as_mut(), self.image_data.as_ref()) {
            callback(&segment, &self.regions[index].shape, data);
        }
    }

    /// Topmost region under a stage point.
    fn hit_region(&self, pos: Pos2) -> Option<usize> {
        let p = self.surface.to_content(pos);
        self.regions
            .iter()
            .rposition(|r| point_in_polygon(p, &r.shape.points))
    }
}

impl MarkTool for SegmentMark {
    fn surface(&self) -> &Surface {
        &self.surface
    }

    fn surface_mut(&mut self) -> &mut Surface {
        &mut self.surface
    }

    fn handle_gesture(&mut self, gesture: &Gesture) {
        if self.surface.handle_navigation(gesture) {
            self.press = None;
            return;
        }
        match gesture {
            Gesture::Press { pos, touches } if *touches < 2 => {
                self.press = Some(*pos);
                if self.surface.hits_background(*pos) {
                    self.surface.begin_content_drag(*pos);
                }
            }
            Gesture::Press { .. } => self.press = None,
            Gesture::Move { pos, .. } => {
                if self.surface.is_dragging_content() {
                    self.surface.drag_content(*pos);
                }
            }
            Gesture::Release { pos } => {
                self.surface.end_content_drag();
                let Some(origin) = self.press.take() else {
                    return;
                };
                if (*pos - origin).length() > CLICK_DISTANCE {
                    return;
                }
                if let Some(index) = self.hit_region(*pos) {
                    self.toggle(index, Instant::now());
                }
            }
            _ => {}
        }
    }

    fn tick(&mut self, now: Instant) -> bool {
        let timers = self.surface.tick(now);
        timers || self.is_animating()
    }

    fn paint(&self, painter: &egui::Painter, origin: Pos2, now: Instant) {
        let alpha = self.surface.config().fill_alpha;
        for region in &self.regions {
            let screen: Vec<Pos2> = region
                .shape
                .points
                .iter()
                .map(|p| self.surface.to_stage(*p) + origin.to_vec2())
                .collect();
            canvas::draw_polygon_fill(painter, &screen, &region.triangles, region.shape.fill.with_alpha(alpha));
            if region.outline_visible {
                canvas::draw_dashed_outline(
                    painter,
                    &screen,
                    OUTLINE_DASH,
                    OUTLINE_DASH,
                    region.ants.dash_offset(now),
                    egui::Stroke::new(1.0, OUTLINE_COLOR),
                );
            }
        }
    }

    fn scene_nodes(&self) -> Vec<Node> {
        let alpha = self.surface.config().fill_alpha;
        self.regions
            .iter()
            .map(|region| {
                let points: Vec<f64> = region
                    .shape
                    .points
                    .iter()
                    .flat_map(|p| [p.x as f64, p.y as f64])
                    .collect();
                let fill = Node::new(
                    "Line",
                    Attrs {
                        points: points.clone(),
                        fill: Some(region.shape.fill.to_hex_alpha(alpha)),
                        closed: Some(true),
                        ..Default::default()
                    },
                );
                let outline = Node::new(
                    "Line",
                    Attrs {
                        points,
                        stroke: Some("rgba(255, 255, 255, 0.7)".to_string()),
                        stroke_enabled: Some(region.outline_visible),
                        closed: Some(true),
                        dash: vec![OUTLINE_DASH, OUTLINE_DASH],
                        ..Default::default()
                    },
                );
                Node::new("Group", Attrs::default()).with_children(vec![fill, outline])
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::DeviceClass;
    use egui::{pos2, vec2};
    use std::sync::mpsc::channel;

    fn segment_mark() -> SegmentMark {
        let config = MarkConfig {
            device: Some(DeviceClass::Desktop),
            ..Default::default()
        };
        SegmentMark::new(&HostElement::mark_layout(vec2(800.0, 600.0)), config).unwrap()
    }

    fn two_categories() -> ImageData {
        serde_json::from_str(
            r#"{
                "url": "street.jpg",
                "categories": [
                    { "name": "car", "segmentation": [[10,10, 60,10, 60,60, 10,60]] },
                    { "name": "road", "segmentation": [[100,100, 200,100, 200,150, 100,150]] }
                ]
            }"#,
        )
        .unwrap()
    }

    fn tap(mark: &mut SegmentMark, at: Pos2) {
        mark.handle_gesture(&Gesture::Press { pos: at, touches: 0 });
        mark.handle_gesture(&Gesture::Release { pos: at });
    }

    #[test]
    fn test_begin_draw_two_categories() {
        let mut mark = segment_mark();
        let data = two_categories();
        mark.begin_draw(&data, LoadedImage::blank("mem", 400, 300));

        assert_eq!(mark.region_count(), 2);
        assert_eq!(mark.is_checked(0), Some(false));
        assert_eq!(mark.is_checked(1), Some(false));
        assert!(!mark.is_animating());

        let session = mark.image_data().unwrap();
        assert!(session.categories.iter().all(|c| c.fill_color.is_some()));
        for region in &mark.regions {
            assert_eq!(Some(region.shape.fill), session.categories[region.category].fill_color);
            assert_eq!(region.triangles.len(), 2);
        }
        assert_ne!(mark.regions[0].shape.fill, mark.regions[1].shape.fill);
        // The caller's record is untouched.
        assert!(data.categories.iter().all(|c| c.fill_color.is_none()));
    }

    #[test]
    fn test_category_colour_shared_by_its_loops() {
        let mut mark = segment_mark();
        let data: ImageData = serde_json::from_str(
            r#"{ "url": "x", "categorys": [
                { "segmentation": [[0,0, 10,0, 10,10, 0,0, 20,20, 30,20, 30,30]] }
            ] }"#,
        )
        .unwrap();
        mark.begin_draw(&data, LoadedImage::blank("mem", 100, 100));
        assert_eq!(mark.region_count(), 2);
        assert_eq!(mark.regions[0].shape.fill, mark.regions[1].shape.fill);
    }

    #[test]
    fn test_tap_toggles_and_animates() {
        let mut mark = segment_mark();
        mark.begin_draw(&two_categories(), LoadedImage::blank("mem", 400, 300));

        tap(&mut mark, pos2(30.0, 30.0));
        assert_eq!(mark.is_checked(0), Some(true));
        assert!(mark.is_animating());
        assert!(mark.tick(Instant::now()));

        tap(&mut mark, pos2(30.0, 30.0));
        assert_eq!(mark.is_checked(0), Some(false));
        assert!(!mark.is_animating());
        assert!(!mark.tick(Instant::now()));
    }

    #[test]
    fn test_drag_is_not_a_tap() {
        let mut mark = segment_mark();
        mark.begin_draw(&two_categories(), LoadedImage::blank("mem", 400, 300));
        mark.handle_gesture(&Gesture::Press { pos: pos2(30.0, 30.0), touches: 0 });
        mark.handle_gesture(&Gesture::Move { pos: pos2(80.0, 30.0), touches: 0 });
        mark.handle_gesture(&Gesture::Release { pos: pos2(80.0, 30.0) });
        assert_eq!(mark.is_checked(0), Some(false));
        assert_eq!(mark.surface().content.position, vec2(50.0, 0.0));
    }

    #[test]
    fn test_on_select_reports_every_toggle() {
        let mut mark = segment_mark();
        let (sender, receiver) = channel();
        mark.on_select = Some(Box::new(move |segment, shape, data| {
            let _ = sender.send((segment.is_checked, shape.points.len(), data.region_count()));
        }));
        mark.begin_draw(&two_categories(), LoadedImage::blank("mem", 400, 300));

        tap(&mut mark, pos2(150.0, 120.0));
        tap(&mut mark, pos2(150.0, 120.0));
        let events: Vec<_> = receiver.try_iter().collect();
        assert_eq!(events, vec![(true, 4, 2), (false, 4, 2)]);
    }

    #[test]
    fn test_clear_stops_animations() {
        let mut mark = segment_mark();
        mark.begin_draw(&two_categories(), LoadedImage::blank("mem", 400, 300));
        mark.toggle(1, Instant::now());
        assert!(mark.is_animating());
        mark.clear();
        assert_eq!(mark.region_count(), 0);
        assert!(!mark.tick(Instant::now()));
    }

    #[test]
    fn test_snapshot_has_fill_and_outline() {
        let mut mark = segment_mark();
        mark.begin_draw(&two_categories(), LoadedImage::blank("mem", 400, 300));
        let root = mark.snapshot();
        let content = &root.children[0].children[0];
        // background + two polygon groups
        assert_eq!(content.children.len(), 3);
        let group = &content.children[1];
        assert_eq!(group.children[1].attrs.dash, vec![5.0, 5.0]);
        assert_eq!(group.children[1].attrs.stroke_enabled, Some(false));
    }
}
