//! Annotation layer: renders stored annotations on a container that tracks a
//! viewport. It has no capture logic; shapes arrive already normalized.

#[cfg(test)]
#[path = "annotation_test.rs"]
mod annotation_test;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{ConfigError, InvariantError, ViewportError};
use crate::geom::Rect;
use crate::host::{Element, Layer};
use crate::shape::{Shape, Stroke};
use crate::tracking::{Follows, Tracking};
use crate::viewport::Viewport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Hidden,
    /// Drawn with a hairline stroke.
    Minimal,
    #[default]
    Full,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: Uuid,
    #[serde(default)]
    pub visibility: Visibility,
    pub shape: Shape,
}

impl Annotation {
    /// A fully visible annotation with a fresh id.
    #[must_use]
    pub fn new(shape: Shape) -> Self {
        Self { id: Uuid::new_v4(), visibility: Visibility::Full, shape }
    }

    #[must_use]
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }
}

const MINIMAL_STROKE_WIDTH: f64 = 1.0;

struct AnnotationState<L> {
    container: Option<L>,
    annotations: Vec<Annotation>,
    stroke: Stroke,
}

impl<L: Layer> AnnotationState<L> {
    fn render(&self) {
        let Some(container) = &self.container else {
            return;
        };
        container.clear_shapes();
        let size = container.client_size();
        let minimal = Stroke { width: MINIMAL_STROKE_WIDTH, ..self.stroke.clone() };
        for annotation in &self.annotations {
            let stroke = match annotation.visibility {
                Visibility::Hidden => continue,
                Visibility::Minimal => &minimal,
                Visibility::Full => &self.stroke,
            };
            container.draw_shape(&annotation.shape.to_pixels(size), stroke);
        }
    }
}

impl<L: Layer> Follows for AnnotationState<L> {
    fn follow_pan(&self, rect: Rect) {
        if let Some(container) = &self.container {
            container.set_geometry(rect);
        }
    }

    fn follow_resize(&self, rect: Rect) {
        self.follow_pan(rect);
        self.render();
    }
}

pub struct AnnotationLayer<L: Layer> {
    state: Rc<RefCell<AnnotationState<L>>>,
    tracking: Option<Tracking>,
    destroyed: bool,
}

impl<L: Layer + 'static> AnnotationLayer<L> {
    /// Create the container in the viewport's parent and render `annotations`.
    ///
    /// # Errors
    ///
    /// `Destroyed` for a torn-down viewport, `MissingParent` when the host
    /// cannot create the container.
    pub fn bind<E>(viewport: &mut Viewport<E>, annotations: Vec<Annotation>) -> Result<Self, ViewportError>
    where
        E: Element<Layer = L>,
    {
        if viewport.is_destroyed() {
            return Err(InvariantError::Destroyed.into());
        }
        let container = viewport.element().append_layer().ok_or(ConfigError::MissingParent)?;
        container.set_pointer_events(false);
        let state = AnnotationState { container: Some(container), annotations, stroke: Stroke::default() };
        state.follow_resize(viewport.geometry().rect);
        let state = Rc::new(RefCell::new(state));
        let tracking = Tracking::follow(viewport, &state);
        debug!(viewport = %viewport.id(), "annotation layer attached");
        Ok(Self { state, tracking: Some(tracking), destroyed: false })
    }

    /// Replace every annotation.
    pub fn set_annotations(&mut self, annotations: Vec<Annotation>) {
        let mut state = self.state.borrow_mut();
        state.annotations = annotations;
        state.render();
    }

    pub fn append_annotation(&mut self, annotation: Annotation) {
        let mut state = self.state.borrow_mut();
        state.annotations.push(annotation);
        state.render();
    }

    /// Change one annotation's visibility. Returns false for an unknown id.
    pub fn set_visibility(&mut self, id: Uuid, visibility: Visibility) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(annotation) = state.annotations.iter_mut().find(|a| a.id == id) else {
            return false;
        };
        annotation.visibility = visibility;
        state.render();
        true
    }

    pub fn set_stroke(&mut self, stroke: Stroke) {
        let mut state = self.state.borrow_mut();
        state.stroke = stroke;
        state.render();
    }

    #[must_use]
    pub fn annotations(&self) -> Vec<Annotation> {
        self.state.borrow().annotations.clone()
    }

    /// Stop tracking and remove the container. Calling it again does nothing.
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
        if let Some(container) = self.state.borrow_mut().container.take() {
            container.remove();
        }
        self.destroyed = true;
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

impl<L: Layer> fmt::Debug for AnnotationLayer<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnotationLayer")
            .field("annotations", &self.state.borrow().annotations.len())
            .field("destroyed", &self.destroyed)
            .finish_non_exhaustive()
    }
}
