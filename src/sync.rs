//! Synchronization coordinator: one pan gesture mirrored across several
//! independently fitted viewports.
//!
//! The group owns its children outright. Children are flagged as externally
//! controlled, so their own pointer path never moves them; the group routes
//! host pointer events, commits the drag on the source child, and forwards the
//! same gesture to every peer as a controlled pan. Children hold no reference
//! back to the group.

#[cfg(test)]
#[path = "sync_test.rs"]
mod sync_test;

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::config::ViewportConfig;
use crate::error::{ConfigError, InvariantError, ViewportError};
use crate::events::{Listeners, SubscriptionId};
use crate::geom::Point;
use crate::host::Element;
use crate::input::{PanGesture, PointerEvent};
use crate::viewport::{Viewport, ViewportEvents};

/// Scale-change from one child, tagged with its index in the group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupScale {
    pub scale: f64,
    pub index: usize,
}

type SharedScaleListeners = Rc<RefCell<Listeners<GroupScale>>>;

pub struct SyncGroup<E: Element> {
    children: Vec<Viewport<E>>,
    active: Option<usize>,
    scale_listeners: SharedScaleListeners,
    destroyed: bool,
}

impl<E: Element> SyncGroup<E> {
    /// Build one engine per element, in order.
    ///
    /// # Errors
    ///
    /// `EmptyGroup` for no elements. If any element fails to build, the
    /// children already built are destroyed and that error is returned.
    pub fn new(elements: Vec<E>, config: ViewportConfig) -> Result<Self, ViewportError> {
        Self::with_events(elements, config, Listeners::new())
    }

    /// Like [`SyncGroup::new`], with group scale subscribers in place before
    /// the children's first fit.
    ///
    /// # Errors
    ///
    /// Same as [`SyncGroup::new`].
    pub fn with_events(
        elements: Vec<E>,
        config: ViewportConfig,
        scale_listeners: Listeners<GroupScale>,
    ) -> Result<Self, ViewportError> {
        if elements.is_empty() {
            return Err(ConfigError::EmptyGroup.into());
        }
        let scale_listeners = Rc::new(RefCell::new(scale_listeners));
        let mut children: Vec<Viewport<E>> = Vec::with_capacity(elements.len());
        for (index, element) in elements.into_iter().enumerate() {
            let mut events = ViewportEvents::default();
            events.scale_change.subscribe(forward_scale(&scale_listeners, index));
            match Viewport::build(element, config, events, true) {
                Ok(child) => children.push(child),
                Err(err) => {
                    for child in &mut children {
                        child.destroy();
                    }
                    return Err(err);
                }
            }
        }
        debug!(children = children.len(), "sync group created");
        Ok(Self { children, active: None, scale_listeners, destroyed: false })
    }

    /// Adopt engines that were built elsewhere.
    ///
    /// # Errors
    ///
    /// `EmptyGroup` for no viewports.
    pub fn from_viewports(viewports: Vec<Viewport<E>>) -> Result<Self, ViewportError> {
        if viewports.is_empty() {
            return Err(ConfigError::EmptyGroup.into());
        }
        let scale_listeners: SharedScaleListeners = Rc::new(RefCell::new(Listeners::new()));
        let mut children = viewports;
        for (index, child) in children.iter_mut().enumerate() {
            child.set_externally_controlled(true);
            child.on_scale_change(forward_scale(&scale_listeners, index));
        }
        Ok(Self { children, active: None, scale_listeners, destroyed: false })
    }

    fn ensure_alive(&self) -> Result<(), ViewportError> {
        if self.destroyed { Err(InvariantError::Destroyed.into()) } else { Ok(()) }
    }

    fn out_of_range(&self, index: usize) -> ViewportError {
        InvariantError::IndexOutOfRange { index, len: self.children.len() }.into()
    }

    // --- Routing ---

    /// Pointer-down on child `index`. A primary press makes it the drag
    /// source; peers receive the start as a zero-delta controlled pan.
    ///
    /// # Errors
    ///
    /// `IndexOutOfRange` for an unknown index, `Destroyed` after teardown.
    pub fn on_pointer_down(&mut self, index: usize, event: PointerEvent) -> Result<(), ViewportError> {
        self.ensure_alive()?;
        if index >= self.children.len() {
            return Err(self.out_of_range(index));
        }
        if let Some(previous) = self.active.take() {
            if let Some(child) = self.children.get_mut(previous) {
                child.on_pointer_up(event.position);
            }
        }
        let Some(source) = self.children.get_mut(index) else {
            return Ok(());
        };
        source.on_pointer_down(event);
        if !source.is_dragging() {
            return Ok(());
        }
        self.active = Some(index);
        self.forward(index, &PanGesture::start(event.position));
        Ok(())
    }

    /// Document pointer-move. Moves the source once, then every peer once.
    pub fn on_pointer_move(&mut self, position: Point) {
        let Some(index) = self.active else {
            return;
        };
        let Some(source) = self.children.get_mut(index) else {
            return;
        };
        let Some(gesture) = source.track_pointer(position) else {
            return;
        };
        source.commit_drag(&gesture);
        self.forward(index, &gesture);
    }

    /// Document pointer-up. Ends the source's drag.
    pub fn on_pointer_up(&mut self, position: Point) {
        let Some(index) = self.active.take() else {
            return;
        };
        if let Some(source) = self.children.get_mut(index) {
            source.on_pointer_up(position);
        }
    }

    fn forward(&mut self, source: usize, gesture: &PanGesture) {
        for (index, peer) in self.children.iter_mut().enumerate() {
            if index != source {
                peer.controlled_pan(gesture);
            }
        }
    }

    /// Load signal for child `index`.
    ///
    /// # Errors
    ///
    /// `IndexOutOfRange` for an unknown index.
    pub fn on_load(&mut self, index: usize) -> Result<(), ViewportError> {
        let len = self.children.len();
        let child = self.children.get_mut(index).ok_or(InvariantError::IndexOutOfRange { index, len })?;
        child.on_load();
        Ok(())
    }

    pub fn on_window_resize(&mut self, now_ms: f64) {
        for child in &mut self.children {
            child.on_window_resize(now_ms);
        }
    }

    /// Run due re-fits. Returns how many children re-fitted.
    pub fn poll_timers(&mut self, now_ms: f64) -> usize {
        let mut fired = 0;
        for child in &mut self.children {
            if child.poll_timers(now_ms) {
                fired += 1;
            }
        }
        fired
    }

    // --- Zoom ---

    /// Fit every child to its own parent.
    ///
    /// # Errors
    ///
    /// `Destroyed` after teardown.
    pub fn zoom_fit(&mut self) -> Result<(), ViewportError> {
        self.ensure_alive()?;
        for child in &mut self.children {
            child.zoom_fit()?;
        }
        Ok(())
    }

    /// Apply the same zoom level to every child. An invalid level is rejected
    /// before any child changes.
    ///
    /// # Errors
    ///
    /// `InvalidZoomLevel`, or `Destroyed` after teardown.
    pub fn zoom_in_out(&mut self, level: f64) -> Result<(), ViewportError> {
        self.ensure_alive()?;
        if !(level.is_finite() && level > 0.0) {
            return Err(InvariantError::InvalidZoomLevel(level).into());
        }
        for child in &mut self.children {
            child.zoom_in_out(level)?;
        }
        Ok(())
    }

    // --- Subscriptions ---

    pub fn on_scale_change<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&GroupScale) + 'static,
    {
        self.scale_listeners.borrow_mut().subscribe(callback)
    }

    pub fn unsubscribe_scale(&mut self, id: SubscriptionId) -> bool {
        self.scale_listeners.borrow_mut().unsubscribe(id)
    }

    // --- Children ---

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Viewport<E>> {
        self.children.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Viewport<E>> {
        self.children.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Viewport<E>> {
        self.children.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Index of the child currently driving a drag.
    #[must_use]
    pub fn active_source(&self) -> Option<usize> {
        self.active
    }

    /// Destroy every child. Calling it again does nothing.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        for child in &mut self.children {
            child.destroy();
        }
        self.scale_listeners.borrow_mut().clear();
        self.active = None;
        self.destroyed = true;
        debug!(children = self.children.len(), "sync group destroyed");
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

fn forward_scale(listeners: &SharedScaleListeners, index: usize) -> impl FnMut(&f64) + 'static {
    let listeners = Rc::clone(listeners);
    move |scale: &f64| listeners.borrow_mut().emit(&GroupScale { scale: *scale, index })
}
