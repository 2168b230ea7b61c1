//! The host boundary: what the engine needs from the page it runs in.
//!
//! The engine never touches the DOM directly. A host implements [`Element`]
//! for the target element handle and [`Layer`] for positioned children it
//! creates inside the target's parent container. The `web` feature provides
//! browser implementations; tests use an in-memory fake.
//!
//! Layout reads must reflect style writes made earlier in the same call, the
//! way a browser forces a synchronous reflow on `clientWidth` reads.

use crate::geom::{Length, Point, Rect, Size};
use crate::shape::{PixelShape, Stroke};

/// What kind of content an element holds. Decides how natural size is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// `<img>`: intrinsic pixel size, known after load.
    Image,
    /// `<video>`: intrinsic frame size, known after metadata load.
    Video,
    /// Any other element: its current layout box.
    Block,
}

impl ElementKind {
    #[must_use]
    pub fn is_media(self) -> bool {
        matches!(self, Self::Image | Self::Video)
    }
}

/// Length-valued inline style properties the engine writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleProp {
    Width,
    Height,
    Left,
    Top,
}

impl StyleProp {
    #[must_use]
    pub fn css_name(self) -> &'static str {
        match self {
            Self::Width => "width",
            Self::Height => "height",
            Self::Left => "left",
            Self::Top => "top",
        }
    }
}

/// Pointer cursor affordances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    Grab,
    Grabbing,
    Crosshair,
}

impl Cursor {
    #[must_use]
    pub fn css_name(self) -> &'static str {
        match self {
            Self::Grab => "grab",
            Self::Grabbing => "grabbing",
            Self::Crosshair => "crosshair",
        }
    }
}

/// Kind of scratch element used while a shape is being captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScratchKind {
    /// A path extended point by point (free-hand).
    Path,
    /// A rectangle stretched from the anchor (rectangle and ellipse capture).
    Rect,
}

/// Handle to the element a viewport engine controls.
///
/// The engine exclusively owns this element's inline geometry and cursor.
pub trait Element {
    /// Positioned child type created in the parent container.
    type Layer: Layer;

    fn kind(&self) -> ElementKind;

    /// Client size of the parent element, or `None` when not attached under one.
    fn parent_size(&self) -> Option<Size>;

    /// Intrinsic media size; zero until the media has loaded.
    fn intrinsic_size(&self) -> Size;

    /// Rendered size (`clientWidth` / `clientHeight`).
    fn client_size(&self) -> Size;

    /// Position relative to the parent (`offsetLeft` / `offsetTop`).
    fn offset(&self) -> Point;

    /// Switch to absolute positioning and hint geometry changes.
    fn prepare_positioning(&self);

    fn set_length(&self, prop: StyleProp, value: Length);

    fn set_cursor(&self, cursor: Cursor);

    /// Create an absolutely positioned layer as the last child of the parent.
    fn append_layer(&self) -> Option<Self::Layer>;
}

/// A positioned child of the viewport's parent container.
///
/// The creator exclusively owns the layer; its geometry is only ever copied
/// from the viewport it tracks.
pub trait Layer {
    fn set_geometry(&self, rect: Rect);

    /// Rendered size of the layer.
    fn client_size(&self) -> Size;

    /// Top-left corner of the layer in page coordinates.
    fn screen_origin(&self) -> Point;

    fn set_cursor(&self, cursor: Cursor);

    /// Let pointer events reach the layer (`true`) or fall through it.
    fn set_pointer_events(&self, enabled: bool);

    /// Discard the scratch element and create a fresh one of `kind`, if any.
    fn reset_scratch(&self, kind: Option<ScratchKind>, stroke: &Stroke);

    /// Redraw the scratch element with in-progress geometry.
    fn draw_scratch(&self, shape: &PixelShape);

    /// Empty the scratch element without removing it.
    fn clear_scratch(&self);

    /// Remove every finalized shape element, leaving the scratch element.
    fn clear_shapes(&self);

    fn draw_shape(&self, shape: &PixelShape, stroke: &Stroke);

    /// Detach the layer from the document.
    fn remove(&self);
}
