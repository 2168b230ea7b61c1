//! Input model: pointer events, pan gestures, and the drag state machine.
//!
//! A pan gesture is tracked between a primary pointer-down on the element and
//! the next pointer-up anywhere in the document. Each move is reported as a
//! [`PanGesture`] carrying the current point and the previous one, so deltas
//! can be recomputed by anyone who receives it.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use serde::{Deserialize, Serialize};

use crate::geom::Point;

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

impl Button {
    /// Map a DOM `MouseEvent.button` code. Back/forward buttons count as secondary.
    #[must_use]
    pub fn from_dom(code: i16) -> Self {
        match code {
            0 => Self::Primary,
            1 => Self::Middle,
            _ => Self::Secondary,
        }
    }
}

/// A pointer event as forwarded by the host, in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub position: Point,
    pub button: Button,
}

impl PointerEvent {
    #[must_use]
    pub fn primary(x: f64, y: f64) -> Self {
        Self { position: Point::new(x, y), button: Button::Primary }
    }

    #[must_use]
    pub fn is_primary(&self) -> bool {
        self.button == Button::Primary
    }
}

/// One step of a pan gesture.
///
/// `last_x` / `last_y` are `None` on the first step of a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanGesture {
    pub x: f64,
    pub y: f64,
    pub last_x: Option<f64>,
    pub last_y: Option<f64>,
}

impl PanGesture {
    /// First step of a gesture: no previous point.
    #[must_use]
    pub fn start(at: Point) -> Self {
        Self { x: at.x, y: at.y, last_x: None, last_y: None }
    }

    #[must_use]
    pub fn step(at: Point, last: Option<Point>) -> Self {
        Self { x: at.x, y: at.y, last_x: last.map(|p| p.x), last_y: last.map(|p| p.y) }
    }

    /// Movement since the previous point; zero on an axis with no previous value.
    #[must_use]
    pub fn delta(&self) -> Point {
        Point::new(
            self.last_x.map_or(0.0, |last| self.x - last),
            self.last_y.map_or(0.0, |last| self.y - last),
        )
    }

    #[must_use]
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Drag state of one viewport.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// Primary button held since a pointer-down on the element.
    Dragging {
        /// Page position of the previous move, `None` until the first move.
        last: Option<Point>,
    },
}

impl DragState {
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self, Self::Dragging { .. })
    }
}
