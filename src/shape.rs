//! Overlay shapes in normalized and pixel form.
//!
//! A [`Shape`] is value data stored as fractions of the surface it was drawn
//! on, so it survives the surface being resized. A [`PixelShape`] is the same
//! geometry resolved against a concrete surface size, which is what hosts
//! render and what capture produces before normalization.

#[cfg(test)]
#[path = "shape_test.rs"]
mod shape_test;

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_STROKE_COLOR, DEFAULT_STROKE_WIDTH};
use crate::error::InvariantError;
use crate::geom::{Point, Rect, Size};

/// Normalized bounding box of a rectangle or ellipse.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A finalized shape in normalized coordinates (fractions of surface size).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    Rectangle(Bounds),
    /// Ellipse inscribed in its bounds.
    Ellipse(Bounds),
    /// Free-hand polyline.
    Drawing { points: Vec<Point> },
}

/// A shape in surface-local pixels.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelShape {
    Rectangle(Rect),
    Ellipse(Rect),
    Drawing(Vec<Point>),
}

/// Stroke styling applied to rendered and scratch shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: String,
    pub width: f64,
}

impl Default for Stroke {
    fn default() -> Self {
        Self { color: DEFAULT_STROKE_COLOR.to_string(), width: DEFAULT_STROKE_WIDTH }
    }
}

/// Divide a surface-local point by the surface size.
#[must_use]
pub fn normalize_point(p: Point, surface: Size) -> Point {
    Point::new(p.x / surface.width, p.y / surface.height)
}

/// Multiply a normalized point by the surface size.
#[must_use]
pub fn denormalize_point(p: Point, surface: Size) -> Point {
    Point::new(p.x * surface.width, p.y * surface.height)
}

impl PixelShape {
    /// Convert to normalized form against `surface`.
    ///
    /// # Errors
    ///
    /// `EmptySurface` when the surface has no area.
    pub fn normalize(&self, surface: Size) -> Result<Shape, InvariantError> {
        if surface.is_empty() {
            return Err(InvariantError::EmptySurface);
        }
        let bounds = |r: &Rect| Bounds {
            x: r.left / surface.width,
            y: r.top / surface.height,
            width: r.width / surface.width,
            height: r.height / surface.height,
        };
        Ok(match self {
            Self::Rectangle(r) => Shape::Rectangle(bounds(r)),
            Self::Ellipse(r) => Shape::Ellipse(bounds(r)),
            Self::Drawing(points) => Shape::Drawing {
                points: points.iter().map(|p| normalize_point(*p, surface)).collect(),
            },
        })
    }

    /// SVG path data for a free-hand polyline (`M x y L x y ...`).
    #[must_use]
    pub fn path_data(points: &[Point]) -> String {
        let mut d = String::new();
        for (i, p) in points.iter().enumerate() {
            let cmd = if i == 0 { 'M' } else { 'L' };
            if i > 0 {
                d.push(' ');
            }
            // Writing into a String cannot fail.
            if write!(d, "{cmd}{} {}", p.x, p.y).is_err() {
                break;
            }
        }
        d
    }
}

impl Shape {
    /// Resolve against the surface's current size.
    #[must_use]
    pub fn to_pixels(&self, surface: Size) -> PixelShape {
        let rect = |b: &Bounds| {
            Rect::new(b.x * surface.width, b.y * surface.height, b.width * surface.width, b.height * surface.height)
        };
        match self {
            Self::Rectangle(b) => PixelShape::Rectangle(rect(b)),
            Self::Ellipse(b) => PixelShape::Ellipse(rect(b)),
            Self::Drawing { points } => {
                PixelShape::Drawing(points.iter().map(|p| denormalize_point(*p, surface)).collect())
            }
        }
    }
}
