//! Facial-geometry overlay renderer.
//!
//! Rendering is split in two steps. [`plan`] turns a snapshot and a view mode
//! into the exact list of primitives to draw, dropping anything that refers
//! to landmarks the snapshot does not have. [`rasterize`] composites such a
//! list onto a frame. [`render`] runs both against a copy of the input frame.
//!
//! Nothing here keeps state between calls: the same input frame, snapshot,
//! mode and style always produce the same output pixels.

mod raster;

use api::{Frame, GeometrySnapshot};
use glam::Vec2;
use log::trace;
use serde::{Deserialize, Serialize};

use crate::ViewMode;

/// Twice-area below which a face counts as degenerate.
const DEGENERATE_AREA: f32 = 1e-6;

/// Colors and sizes used when compositing the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    /// Half-width of the square drawn for each landmark, in pixels.
    pub point_size: u32,
    pub point_color: [u8; 4],
    pub line_color: [u8; 4],
    /// Alpha below 255 lets the camera image show through the mesh.
    pub mesh_color: [u8; 4],
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            point_size: 2,
            point_color: [0, 255, 0, 255],
            line_color: [0, 200, 255, 255],
            mesh_color: [255, 64, 160, 128],
        }
    }
}

/// A single thing to draw, in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Point(Vec2),
    Line(Vec2, Vec2),
    Triangle([Vec2; 3]),
}

/// Primitives planned for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawList {
    pub primitives: Vec<Primitive>,
    /// Edges or faces dropped because they referenced missing landmarks or
    /// were degenerate.
    pub skipped: usize,
}

impl DrawList {
    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    pub fn point_count(&self) -> usize {
        self.count(|p| matches!(p, Primitive::Point(_)))
    }

    pub fn line_count(&self) -> usize {
        self.count(|p| matches!(p, Primitive::Line(..)))
    }

    pub fn triangle_count(&self) -> usize {
        self.count(|p| matches!(p, Primitive::Triangle(_)))
    }

    fn count(&self, pred: impl Fn(&Primitive) -> bool) -> usize {
        self.primitives.iter().filter(|p| pred(p)).count()
    }
}

/// What a [`render`] call drew.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderReport {
    pub mode: ViewMode,
    pub points: usize,
    pub lines: usize,
    pub triangles: usize,
    pub skipped: usize,
    /// Nothing was drawn; the output is an exact copy of the input.
    pub passthrough: bool,
}

/// Lists the primitives `mode` draws for `geometry`.
pub fn plan(geometry: Option<&GeometrySnapshot>, mode: ViewMode) -> DrawList {
    let mut list = DrawList::default();
    let Some(geometry) = geometry.filter(|g| !g.is_empty()) else {
        return list;
    };

    match mode {
        ViewMode::FeaturePoints => {
            for index in 0..geometry.landmarks().len() as u32 {
                match position(geometry, index) {
                    Some(p) => list.primitives.push(Primitive::Point(p)),
                    None => list.skipped += 1,
                }
            }
        }
        ViewMode::Wireframe => {
            for &[a, b] in &geometry.topology().edges {
                match (position(geometry, a), position(geometry, b)) {
                    (Some(pa), Some(pb)) => list.primitives.push(Primitive::Line(pa, pb)),
                    _ => {
                        trace!("Skipping edge ({}, {}) outside landmark set", a, b);
                        list.skipped += 1;
                    }
                }
            }
        }
        ViewMode::Mesh => {
            for &[a, b, c] in &geometry.topology().faces {
                let corners = (position(geometry, a), position(geometry, b), position(geometry, c));
                match corners {
                    (Some(pa), Some(pb), Some(pc)) if !is_degenerate(pa, pb, pc) => {
                        list.primitives.push(Primitive::Triangle([pa, pb, pc]))
                    }
                    _ => {
                        trace!("Skipping face ({}, {}, {})", a, b, c);
                        list.skipped += 1;
                    }
                }
            }
        }
    }

    list
}

/// Composites `list` onto `frame` in order.
pub fn rasterize(list: &DrawList, style: &OverlayStyle, frame: &mut Frame) {
    for primitive in &list.primitives {
        match *primitive {
            Primitive::Point(p) => raster::fill_square(frame, p, style.point_size, style.point_color),
            Primitive::Line(a, b) => raster::draw_line(frame, a, b, style.line_color),
            Primitive::Triangle(corners) => raster::fill_triangle(frame, corners, style.mesh_color),
        }
    }
}

/// Writes `input` with the overlay for (`geometry`, `mode`) into `output`.
///
/// `output` is resized to the input's dimensions. `input` is never modified.
pub fn render(
    input: &Frame,
    geometry: Option<&GeometrySnapshot>,
    mode: ViewMode,
    style: &OverlayStyle,
    output: &mut Frame,
) -> RenderReport {
    output.copy_from(input);

    let list = plan(geometry, mode);
    rasterize(&list, style, output);

    RenderReport {
        mode,
        points: list.point_count(),
        lines: list.line_count(),
        triangles: list.triangle_count(),
        skipped: list.skipped,
        passthrough: list.is_empty(),
    }
}

fn position(geometry: &GeometrySnapshot, index: u32) -> Option<Vec2> {
    geometry
        .landmark(index)
        .map(|p| p.truncate())
        .filter(|p| p.is_finite())
}

fn is_degenerate(a: Vec2, b: Vec2, c: Vec2) -> bool {
    (b - a).perp_dot(c - a).abs() < DEGENERATE_AREA
}
