//! Drawing overlay: a surface kept on top of a viewport for capturing shapes.
//!
//! DESIGN
//! ======
//! The overlay appends one [`Layer`] to the viewport's parent and never lays
//! it out itself: size-change and pan-move from the bound viewport copy the
//! viewport's offset and size onto the layer (see [`crate::tracking`]).
//!
//! In `Pan` mode the layer lets pointer events through to the viewport. In the
//! capture modes the host forwards the layer's pointer events here; positions
//! are page coordinates and are made surface-local by subtracting the layer's
//! screen origin. A finished capture is normalized against the layer's client
//! size and handed to `on_shape_created` subscribers.
//!
//! Stored shapes come only from [`DrawingOverlay::add_drawings`] and are
//! re-rendered at the layer's current size whenever the viewport resizes.

#[cfg(test)]
#[path = "overlay_test.rs"]
mod overlay_test;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::consts::{DEFAULT_STROKE_COLOR, DEFAULT_STROKE_WIDTH};
use crate::error::{ConfigError, InvariantError, ViewportError};
use crate::events::{Listeners, SubscriptionId};
use crate::geom::{Point, Rect};
use crate::host::{Cursor, Element, Layer, ScratchKind};
use crate::input::PointerEvent;
use crate::shape::{PixelShape, Shape, Stroke};
use crate::tracking::{Follows, Tracking};
use crate::viewport::Viewport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayMode {
    #[default]
    Pan,
    Rectangle,
    Ellipse,
    Drawing,
}

impl OverlayMode {
    /// Scratch element used while capturing in this mode.
    #[must_use]
    pub fn scratch_kind(self) -> Option<ScratchKind> {
        match self {
            Self::Pan => None,
            Self::Rectangle | Self::Ellipse => Some(ScratchKind::Rect),
            Self::Drawing => Some(ScratchKind::Path),
        }
    }

    #[must_use]
    pub fn cursor(self, pressed: bool) -> Cursor {
        match self {
            Self::Pan if pressed => Cursor::Grabbing,
            Self::Pan => Cursor::Grab,
            _ => Cursor::Crosshair,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OverlayOptions {
    pub mode: OverlayMode,
    pub color: String,
    pub stroke_width: f64,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self { mode: OverlayMode::Pan, color: DEFAULT_STROKE_COLOR.to_string(), stroke_width: DEFAULT_STROKE_WIDTH }
    }
}

impl OverlayOptions {
    #[must_use]
    pub fn stroke(&self) -> Stroke {
        Stroke { color: self.color.clone(), width: self.stroke_width }
    }
}

/// Whether a pointer event was consumed by the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayResponse {
    /// Not ours; let the viewport handle it.
    PassThrough,
    Captured,
}

/// Reduces a captured point sequence before it is normalized.
pub type SimplifyFn = Box<dyn Fn(&[Point]) -> Vec<Point>>;

enum Capture {
    Idle,
    Path(Vec<Point>),
    Boxed { mode: OverlayMode, anchor: Point, current: Point },
}

struct Surface<L> {
    layer: L,
    scratch: Option<ScratchKind>,
}

struct OverlayState<L> {
    surface: Option<Surface<L>>,
    options: OverlayOptions,
    capture: Capture,
    pressed: bool,
    shapes: Vec<Shape>,
}

impl<L: Layer> OverlayState<L> {
    fn reset_scratch(&mut self) {
        self.capture = Capture::Idle;
        let mode = self.options.mode;
        let kind = mode.scratch_kind();
        let stroke = self.options.stroke();
        if let Some(surface) = &mut self.surface {
            surface.layer.reset_scratch(kind, &stroke);
            surface.scratch = kind;
            surface.layer.set_pointer_events(mode != OverlayMode::Pan);
            surface.layer.set_cursor(mode.cursor(self.pressed));
        }
    }

    fn update_cursor(&self) {
        if let Some(surface) = &self.surface {
            surface.layer.set_cursor(self.options.mode.cursor(self.pressed));
        }
    }

    fn draw_scratch(&self) {
        let Some(surface) = &self.surface else {
            return;
        };
        match &self.capture {
            Capture::Idle => {}
            Capture::Path(points) => surface.layer.draw_scratch(&PixelShape::Drawing(points.clone())),
            Capture::Boxed { anchor, current, .. } => {
                surface.layer.draw_scratch(&PixelShape::Rectangle(Rect::from_corners(*anchor, *current)));
            }
        }
    }

    fn render_shapes(&self) {
        let Some(surface) = &self.surface else {
            return;
        };
        surface.layer.clear_shapes();
        let size = surface.layer.client_size();
        let stroke = self.options.stroke();
        for shape in &self.shapes {
            surface.layer.draw_shape(&shape.to_pixels(size), &stroke);
        }
    }
}

impl<L: Layer> Follows for OverlayState<L> {
    fn follow_pan(&self, rect: Rect) {
        if let Some(surface) = &self.surface {
            surface.layer.set_geometry(rect);
        }
    }

    fn follow_resize(&self, rect: Rect) {
        self.follow_pan(rect);
        self.render_shapes();
    }
}

pub struct DrawingOverlay<L: Layer> {
    state: Rc<RefCell<OverlayState<L>>>,
    simplify: Option<SimplifyFn>,
    shape_created: Listeners<Shape>,
    tracking: Option<Tracking>,
    destroyed: bool,
}

impl<L: Layer + 'static> DrawingOverlay<L> {
    /// An overlay with no surface yet. See [`DrawingOverlay::attach`].
    #[must_use]
    pub fn new(options: OverlayOptions) -> Self {
        let state = OverlayState {
            surface: None,
            options,
            capture: Capture::Idle,
            pressed: false,
            shapes: Vec::new(),
        };
        Self {
            state: Rc::new(RefCell::new(state)),
            simplify: None,
            shape_created: Listeners::new(),
            tracking: None,
            destroyed: false,
        }
    }

    /// Create an overlay and attach it to `viewport` in one step.
    ///
    /// # Errors
    ///
    /// See [`DrawingOverlay::attach`].
    pub fn bind<E>(viewport: &mut Viewport<E>, options: OverlayOptions) -> Result<Self, ViewportError>
    where
        E: Element<Layer = L>,
    {
        let mut overlay = Self::new(options);
        overlay.attach(viewport)?;
        Ok(overlay)
    }

    /// Run captured point sequences through `simplify` before normalizing.
    #[must_use]
    pub fn with_simplify<F>(mut self, simplify: F) -> Self
    where
        F: Fn(&[Point]) -> Vec<Point> + 'static,
    {
        self.simplify = Some(Box::new(simplify));
        self
    }

    /// Create the drawing surface in the viewport's parent and start tracking
    /// the viewport.
    ///
    /// # Errors
    ///
    /// `SurfaceAlreadyAttached` on a second call, `Destroyed` when either side
    /// has been torn down, `MissingParent` when the host cannot create the
    /// surface.
    pub fn attach<E>(&mut self, viewport: &mut Viewport<E>) -> Result<(), ViewportError>
    where
        E: Element<Layer = L>,
    {
        if self.destroyed || viewport.is_destroyed() {
            return Err(InvariantError::Destroyed.into());
        }
        if self.state.borrow().surface.is_some() {
            return Err(InvariantError::SurfaceAlreadyAttached.into());
        }
        let layer = viewport.element().append_layer().ok_or(ConfigError::MissingParent)?;
        {
            let mut state = self.state.borrow_mut();
            state.surface = Some(Surface { layer, scratch: None });
            state.reset_scratch();
            state.follow_resize(viewport.geometry().rect);
        }

        self.tracking = Some(Tracking::follow(viewport, &self.state));
        debug!(viewport = %viewport.id(), "drawing overlay attached");
        Ok(())
    }

    /// Switch capture mode. Any in-progress capture is dropped and the scratch
    /// element is recreated; stored shapes are kept.
    pub fn set_mode(&mut self, mode: OverlayMode) {
        let mut state = self.state.borrow_mut();
        state.options.mode = mode;
        state.pressed = false;
        state.reset_scratch();
    }

    /// Change stroke styling for subsequent captures and renders.
    pub fn set_stroke(&mut self, stroke: Stroke) {
        let mut state = self.state.borrow_mut();
        state.options.color = stroke.color;
        state.options.stroke_width = stroke.width;
        state.reset_scratch();
        state.render_shapes();
    }

    #[must_use]
    pub fn options(&self) -> OverlayOptions {
        self.state.borrow().options.clone()
    }

    #[must_use]
    pub fn mode(&self) -> OverlayMode {
        self.state.borrow().options.mode
    }

    // --- Pointer input ---

    /// Primary press on the surface. Starts a capture in the drawing modes.
    ///
    /// # Errors
    ///
    /// `MissingScratch` when a capture mode is active but no scratch element
    /// exists for it (no surface attached).
    pub fn on_pointer_down(&mut self, event: PointerEvent) -> Result<OverlayResponse, ViewportError> {
        if self.destroyed || !event.is_primary() {
            return Ok(OverlayResponse::PassThrough);
        }
        let mut state = self.state.borrow_mut();
        let mode = state.options.mode;
        let Some(kind) = mode.scratch_kind() else {
            state.pressed = true;
            state.update_cursor();
            return Ok(OverlayResponse::PassThrough);
        };
        let origin = match &state.surface {
            Some(surface) if surface.scratch == Some(kind) => surface.layer.screen_origin(),
            _ => return Err(InvariantError::MissingScratch.into()),
        };
        let local = event.position - origin;
        state.pressed = true;
        state.capture = match mode {
            OverlayMode::Drawing => Capture::Path(vec![local]),
            _ => Capture::Boxed { mode, anchor: local, current: local },
        };
        state.draw_scratch();
        state.update_cursor();
        Ok(OverlayResponse::Captured)
    }

    /// Pointer move over the surface. Extends an in-progress capture.
    pub fn on_pointer_move(&mut self, position: Point) -> OverlayResponse {
        if self.destroyed {
            return OverlayResponse::PassThrough;
        }
        let mut state = self.state.borrow_mut();
        state.update_cursor();
        let Some(origin) = state.surface.as_ref().map(|s| s.layer.screen_origin()) else {
            return OverlayResponse::PassThrough;
        };
        let local = position - origin;
        match &mut state.capture {
            Capture::Idle => return OverlayResponse::PassThrough,
            Capture::Path(points) => points.push(local),
            Capture::Boxed { current, .. } => *current = local,
        }
        state.draw_scratch();
        OverlayResponse::Captured
    }

    /// Pointer release. Finishes an in-progress capture and returns the
    /// normalized shape, which has also been sent to `on_shape_created`
    /// subscribers. Zero-area boxes are discarded.
    ///
    /// # Errors
    ///
    /// `EmptySurface` when the surface has no area to normalize against.
    pub fn on_pointer_up(&mut self, position: Point) -> Result<Option<Shape>, ViewportError> {
        if self.destroyed {
            return Ok(None);
        }
        let shape = {
            let mut state = self.state.borrow_mut();
            state.pressed = false;
            state.update_cursor();
            let capture = std::mem::replace(&mut state.capture, Capture::Idle);
            let Some(surface) = &state.surface else {
                return Ok(None);
            };
            let local = position - surface.layer.screen_origin();
            let pixels = match capture {
                Capture::Idle => return Ok(None),
                Capture::Path(points) => match &self.simplify {
                    Some(simplify) => PixelShape::Drawing(simplify(&points)),
                    None => PixelShape::Drawing(points),
                },
                Capture::Boxed { mode, anchor, .. } => {
                    let rect = Rect::from_corners(anchor, local);
                    if rect.width <= 0.0 || rect.height <= 0.0 {
                        surface.layer.clear_scratch();
                        debug!(?mode, "zero-area capture discarded");
                        return Ok(None);
                    }
                    if mode == OverlayMode::Ellipse {
                        PixelShape::Ellipse(rect)
                    } else {
                        PixelShape::Rectangle(rect)
                    }
                }
            };
            surface.layer.clear_scratch();
            pixels.normalize(surface.layer.client_size())?
        };
        debug!(?shape, "shape captured");
        self.shape_created.emit(&shape);
        Ok(Some(shape))
    }

    // --- Shapes ---

    /// Append normalized shapes and re-render every stored shape at the
    /// surface's current size.
    pub fn add_drawings<I>(&mut self, shapes: I)
    where
        I: IntoIterator<Item = Shape>,
    {
        let mut state = self.state.borrow_mut();
        state.shapes.extend(shapes);
        state.render_shapes();
    }

    #[must_use]
    pub fn shapes(&self) -> Vec<Shape> {
        self.state.borrow().shapes.clone()
    }

    pub fn on_shape_created<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&Shape) + 'static,
    {
        self.shape_created.subscribe(callback)
    }

    pub fn unsubscribe_shape_created(&mut self, id: SubscriptionId) -> bool {
        self.shape_created.unsubscribe(id)
    }

    // --- Teardown ---

    /// Drop the viewport subscriptions, remove the surface, and forget all
    /// subscribers. Calling it again does nothing.
    pub fn destroy<E>(&mut self, viewport: &mut Viewport<E>)
    where
        E: Element<Layer = L>,
    {
        if self.destroyed {
            return;
        }
        if let Some(tracking) = self.tracking.take() {
            tracking.release(viewport);
        }
        {
            let mut state = self.state.borrow_mut();
            if let Some(surface) = state.surface.take() {
                surface.layer.remove();
            }
            state.capture = Capture::Idle;
            state.pressed = false;
        }
        self.shape_created.clear();
        self.destroyed = true;
        debug!("drawing overlay destroyed");
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.state.borrow().surface.is_some()
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

impl<L: Layer> fmt::Debug for DrawingOverlay<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("DrawingOverlay")
            .field("mode", &state.options.mode)
            .field("attached", &state.surface.is_some())
            .field("shapes", &state.shapes.len())
            .field("destroyed", &self.destroyed)
            .finish_non_exhaustive()
    }
}
