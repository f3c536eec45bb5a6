//! Projected spacecraft geometry as returned by `/init` and `/step`.

use serde::Deserialize;

/// A point in object space: origin centered, Y up, unscaled.
pub type Point2D = na::Point2<f64>;

/// A closed polygon outline. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    points: Vec<Point2D>,
}

impl Face {
    /// Returns `None` for an empty point list.
    pub fn new(points: Vec<Point2D>) -> Option<Self> {
        if points.is_empty() {
            None
        } else {
            Some(Face { points })
        }
    }

    pub fn points(&self) -> &[Point2D] {
        &self.points
    }

    /// The edges of the loop in drawing order, closing edge last.
    ///
    /// A single point has no edges.
    pub fn edges(&self) -> impl Iterator<Item = (&Point2D, &Point2D)> + '_ {
        let closing = if self.points.len() > 1 {
            self.points.last().zip(self.points.first())
        } else {
            None
        };
        self.points
            .iter()
            .zip(self.points.iter().skip(1))
            .chain(closing)
    }
}

/// One rendered instant of the spacecraft. Replaced wholesale, never edited.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(try_from = "Vec<Vec<Vec<f64>>>")]
pub struct Frame {
    faces: Vec<Face>,
}

impl Frame {
    pub fn new(faces: Vec<Face>) -> Self {
        Frame { faces }
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn from_json(text: &str) -> Result<Self, FrameError> {
        let raw: Vec<Vec<Vec<f64>>> =
            serde_json::from_str(text).map_err(|e| FrameError::Json(e.to_string()))?;
        Frame::try_from(raw)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FrameError {
    #[error("face {face} has no points")]
    EmptyFace { face: usize },
    #[error("face {face} point {point} has {len} coordinates, need at least 2")]
    ShortPoint { face: usize, point: usize, len: usize },
    #[error("malformed frame: {0}")]
    Json(String),
}

impl TryFrom<Vec<Vec<Vec<f64>>>> for Frame {
    type Error = FrameError;

    /// Points may carry extra coordinates (the service sends the projected
    /// depth as a third one); only x and y are kept.
    fn try_from(raw: Vec<Vec<Vec<f64>>>) -> Result<Self, Self::Error> {
        let mut faces = Vec::with_capacity(raw.len());
        for (face_idx, raw_face) in raw.into_iter().enumerate() {
            let mut points = Vec::with_capacity(raw_face.len());
            for (point_idx, coords) in raw_face.into_iter().enumerate() {
                match coords[..] {
                    [x, y, ..] => points.push(Point2D::new(x, y)),
                    _ => {
                        return Err(FrameError::ShortPoint {
                            face: face_idx,
                            point: point_idx,
                            len: coords.len(),
                        });
                    }
                }
            }
            let face = Face::new(points).ok_or(FrameError::EmptyFace { face: face_idx })?;
            faces.push(face);
        }
        Ok(Frame { faces })
    }
}
