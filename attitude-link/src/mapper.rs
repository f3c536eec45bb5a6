//! Object space to screen space.

use crate::frame::Point2D;

/// A point in surface pixels: origin top-left, Y down.
pub type ScreenPoint = na::Point2<f64>;

/// Object units per surface width, inverted: `scale = width / 100`.
pub const SCALE_DIVISOR: f64 = 100.0;

/// Maps origin-centered, Y-up object coordinates onto a drawing surface.
///
/// The scale is one number for both axes and every face. Nothing is clipped;
/// points off the surface are simply not visible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    center: ScreenPoint,
    scale: f64,
}

impl CoordinateMapper {
    /// Mapper for a `width` x `height` surface with the default scale.
    pub fn for_surface(width: f64, height: f64) -> Self {
        CoordinateMapper::new(width, height, width / SCALE_DIVISOR)
    }

    pub fn new(width: f64, height: f64, scale: f64) -> Self {
        CoordinateMapper {
            center: ScreenPoint::new(width / 2.0, height / 2.0),
            scale,
        }
    }

    pub fn center(&self) -> ScreenPoint {
        self.center
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn map(&self, object_x: f64, object_y: f64) -> ScreenPoint {
        ScreenPoint::new(
            self.center.x + self.scale * object_x,
            self.center.y - self.scale * object_y,
        )
    }

    pub fn map_point(&self, p: &Point2D) -> ScreenPoint {
        self.map(p.x, p.y)
    }
}
