//! Wireframe drawing of frames onto a surface.

use bevy::prelude::Resource;

use crate::{
    frame::Frame,
    mapper::{CoordinateMapper, ScreenPoint},
};

/// Stroke and text defaults for a surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawStyle {
    /// Line color as sRGB components in `0.0..=1.0`.
    pub stroke: [f32; 3],
    /// Status text size in pixels.
    pub font_size: f32,
}

impl Default for DrawStyle {
    fn default() -> Self {
        // Black lines, 18px text.
        DrawStyle {
            stroke: [0.0, 0.0, 0.0],
            font_size: 18.0,
        }
    }
}

/// Something the renderer can draw on.
///
/// The status line is its own area: clearing the surface leaves it alone.
pub trait Surface {
    /// Width and height in pixels.
    fn size(&self) -> (f64, f64);

    /// Wipe all geometry.
    fn clear(&mut self);

    fn move_to(&mut self, at: ScreenPoint);

    /// Stroke one straight segment as its own path.
    fn stroke_segment(&mut self, from: ScreenPoint, to: ScreenPoint);

    fn set_status(&mut self, text: &str);

    fn configure(&mut self, style: DrawStyle);
}

/// One stroked segment in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: ScreenPoint,
    pub to: ScreenPoint,
}

/// A retained drawing surface.
///
/// Holds every segment stroked since the last clear, in stroke order. The
/// display app redraws this list each frame.
#[derive(Resource, Debug, Clone)]
pub struct Canvas {
    width: f64,
    height: f64,
    segments: Vec<Segment>,
    pen: Option<ScreenPoint>,
    status: String,
    style: DrawStyle,
}

impl Canvas {
    pub fn new(width: f64, height: f64) -> Self {
        Canvas {
            width,
            height,
            segments: Vec::new(),
            pen: None,
            status: String::new(),
            style: DrawStyle::default(),
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn pen(&self) -> Option<ScreenPoint> {
        self.pen
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn style(&self) -> DrawStyle {
        self.style
    }
}

impl Surface for Canvas {
    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        self.segments.clear();
        self.pen = None;
    }

    fn move_to(&mut self, at: ScreenPoint) {
        self.pen = Some(at);
    }

    fn stroke_segment(&mut self, from: ScreenPoint, to: ScreenPoint) {
        self.segments.push(Segment { from, to });
        self.pen = Some(to);
    }

    fn set_status(&mut self, text: &str) {
        self.status.clear();
        self.status.push_str(text);
    }

    fn configure(&mut self, style: DrawStyle) {
        self.style = style;
    }
}

/// Draws each face of a frame as a closed outline.
///
/// Faces go down in the order given. There is no depth sort and no culling,
/// so overlapping faces overdraw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolygonRenderer {
    mapper: CoordinateMapper,
}

impl PolygonRenderer {
    pub fn new(mapper: CoordinateMapper) -> Self {
        PolygonRenderer { mapper }
    }

    /// Renderer sized for `surface`, with an optional scale override.
    pub fn for_surface<S: Surface + ?Sized>(surface: &S, scale: Option<f64>) -> Self {
        let (width, height) = surface.size();
        let mapper = match scale {
            Some(scale) => CoordinateMapper::new(width, height, scale),
            None => CoordinateMapper::for_surface(width, height),
        };
        PolygonRenderer { mapper }
    }

    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    /// Clear the surface, then outline every face.
    pub fn render<S: Surface + ?Sized>(&self, surface: &mut S, frame: &Frame) {
        surface.clear();
        for face in frame.faces() {
            let Some(first) = face.points().first() else {
                continue;
            };
            surface.move_to(self.mapper.map_point(first));
            for (from, to) in face.edges() {
                surface.stroke_segment(self.mapper.map_point(from), self.mapper.map_point(to));
            }
        }
    }
}
