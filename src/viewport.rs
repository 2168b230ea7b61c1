//! The viewport engine: fit, zoom, and pan for one target element.
//!
//! DESIGN
//! ======
//! A `Viewport` owns the inline geometry of its element. Natural size is
//! measured through a [`NaturalSizeSource`] chosen once from the element kind;
//! media defers its first fit until the host reports a load. The current
//! sizing rule is either fit-to-parent or an explicit zoom level, never both.
//!
//! Listener registration is represented by [`Bindings`]. The host attaches DOM
//! listeners for whatever is bound and forwards events to the `on_*` entry
//! points; an entry point whose binding is gone ignores the event. After
//! `destroy()` nothing is bound, no timer is pending, and no subscriber runs.
//!
//! Pan events carry a [`ViewportGeometry`] snapshot instead of a reference to
//! the engine, so subscribers can read geometry while the engine is mid-call.

#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::{ConfigPatch, ViewportConfig};
use crate::consts::FIT_PERCENT;
use crate::error::{ConfigError, InvariantError, ViewportError};
use crate::events::{Listeners, SubscriptionId};
use crate::geom::{Length, Point, Rect, Size};
use crate::host::{Cursor, Element, StyleProp};
use crate::input::{DragState, PanGesture, PointerEvent};
use crate::natural::{NaturalSize, NaturalSizeSource, Orientation};

/// Unique identifier for a viewport engine.
pub type ViewportId = Uuid;

/// Which rule currently sizes the element.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SizingRule {
    /// Fill the parent along the orientation's axis, centered on the other.
    #[default]
    Fit,
    /// Explicit pixel size of `natural * level`.
    Zoom(f64),
}

/// Read-only geometry of a viewport at the moment an event was emitted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportGeometry {
    pub id: ViewportId,
    /// Offset within the parent plus rendered size.
    pub rect: Rect,
    /// Current scale, when natural size is known.
    pub scale: Option<f64>,
}

/// Payload of pan-start, pan-move, and pan-end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanEvent {
    pub gesture: PanGesture,
    pub viewport: ViewportGeometry,
}

/// Payload of size-change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeChange {
    pub width: f64,
    pub height: f64,
    pub viewport: ViewportGeometry,
}

/// Subscriber lists, one per event name.
#[derive(Debug, Default)]
pub struct ViewportEvents {
    pub pan_start: Listeners<PanEvent>,
    pub pan_move: Listeners<PanEvent>,
    pub pan_end: Listeners<PanEvent>,
    pub scale_change: Listeners<f64>,
    pub size_change: Listeners<SizeChange>,
}

impl ViewportEvents {
    fn clear(&mut self) {
        self.pan_start.clear();
        self.pan_move.clear();
        self.pan_end.clear();
        self.scale_change.clear();
        self.size_change.clear();
    }
}

/// DOM listeners the host must keep attached for this engine.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bindings {
    /// `load` on the element (media only).
    pub load: bool,
    /// `pointerdown` on the element.
    pub pointer_down: bool,
    /// `dragstart` on the element, to suppress native image drag.
    pub drag_start: bool,
    /// `pointermove` and `pointerup` on the document.
    pub document_pointer: bool,
    /// `resize` on the window.
    pub window_resize: bool,
}

impl Bindings {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Fit / zoom / pan controller for one element.
pub struct Viewport<E: Element> {
    id: ViewportId,
    element: E,
    config: ViewportConfig,
    source: NaturalSizeSource,
    natural: Option<NaturalSize>,
    sizing: SizingRule,
    drag: DragState,
    externally_controlled: bool,
    bindings: Bindings,
    pending_refit_at: Option<f64>,
    events: ViewportEvents,
    destroyed: bool,
}

impl<E: Element> Viewport<E> {
    /// Take control of `element` and fit it if its natural size is known.
    ///
    /// # Errors
    ///
    /// `MissingParent` when the element is not attached under a parent,
    /// `InvalidOptionValue` when `config` is out of range. No binding is
    /// registered in either case.
    pub fn new(element: E, config: ViewportConfig) -> Result<Self, ViewportError> {
        Self::with_events(element, config, ViewportEvents::default())
    }

    /// Like [`Viewport::new`], with subscribers in place before the first fit.
    ///
    /// # Errors
    ///
    /// `MissingParent` when the element is not attached under a parent.
    pub fn with_events(element: E, config: ViewportConfig, events: ViewportEvents) -> Result<Self, ViewportError> {
        Self::build(element, config, events, false)
    }

    pub(crate) fn build(
        element: E,
        config: ViewportConfig,
        events: ViewportEvents,
        externally_controlled: bool,
    ) -> Result<Self, ViewportError> {
        config.validate()?;
        if element.parent_size().is_none() {
            return Err(ConfigError::MissingParent.into());
        }
        let source = NaturalSizeSource::for_kind(element.kind());
        let natural = source.measure(&element).map(NaturalSize::new);
        let mut viewport = Self {
            id: Uuid::new_v4(),
            element,
            config,
            source,
            natural,
            sizing: SizingRule::Fit,
            drag: DragState::Idle,
            externally_controlled,
            bindings: Bindings::default(),
            pending_refit_at: None,
            events,
            destroyed: false,
        };
        viewport.attach();
        if viewport.natural.is_some() {
            viewport.fit();
        } else if viewport.source.needs_load_signal() {
            debug!(id = %viewport.id, "natural size unavailable; first fit deferred until load");
        } else {
            debug!(id = %viewport.id, "layout box empty; fit retried on next zoom or re-fit");
        }
        Ok(viewport)
    }

    // --- Lifecycle ---

    fn attach(&mut self) {
        self.element.prepare_positioning();
        if self.config.change_cursor_on_pan {
            self.update_cursor();
        }
        self.bindings = Bindings {
            load: self.source.needs_load_signal(),
            pointer_down: true,
            drag_start: true,
            document_pointer: true,
            window_resize: self.config.refit_on_resize,
        };
    }

    fn detach(&mut self) {
        self.bindings = Bindings::default();
        self.pending_refit_at = None;
    }

    /// Release every binding, cancel the pending re-fit, and drop all
    /// subscribers. Calling it again does nothing.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.detach();
        self.events.clear();
        self.drag = DragState::Idle;
        self.destroyed = true;
        debug!(id = %self.id, "viewport destroyed");
    }

    fn ensure_alive(&self) -> Result<(), ViewportError> {
        if self.destroyed { Err(InvariantError::Destroyed.into()) } else { Ok(()) }
    }

    // --- Configuration ---

    /// Apply a partial config update, optionally re-establishing all bindings.
    /// Turning `refitOnResize` off cancels a re-fit that is already pending.
    ///
    /// # Errors
    ///
    /// `InvalidOptionValue` for an out-of-range value (nothing is applied),
    /// `Destroyed` after teardown.
    pub fn update_config(&mut self, patch: &ConfigPatch, reinit: bool) -> Result<(), ViewportError> {
        self.ensure_alive()?;
        self.config.apply(patch)?;
        if !self.config.refit_on_resize && self.pending_refit_at.take().is_some() {
            debug!(id = %self.id, "pending re-fit cancelled; refit on resize turned off");
        }
        if reinit {
            self.detach();
            self.attach();
            debug!(id = %self.id, ?patch, "viewport re-initialized");
        }
        Ok(())
    }

    /// Set one option by its wire key.
    ///
    /// # Errors
    ///
    /// `UnknownOption` / `InvalidOptionValue` for bad input, `Destroyed` after
    /// teardown.
    pub fn set_option(&mut self, key: &str, value: &serde_json::Value, reinit: bool) -> Result<(), ViewportError> {
        let patch = ConfigPatch::from_option(key, value)?;
        self.update_config(&patch, reinit)
    }

    // --- Zoom ---

    /// Drop any explicit zoom and fit to the parent.
    ///
    /// # Errors
    ///
    /// `Destroyed` after teardown.
    pub fn zoom_fit(&mut self) -> Result<(), ViewportError> {
        self.ensure_alive()?;
        self.sizing = SizingRule::Fit;
        self.fit();
        Ok(())
    }

    /// Size the element to `natural * level` pixels, bypassing fit.
    ///
    /// # Errors
    ///
    /// `InvalidZoomLevel` unless `level` is positive and finite, `Destroyed`
    /// after teardown.
    pub fn zoom_in_out(&mut self, level: f64) -> Result<(), ViewportError> {
        self.ensure_alive()?;
        if !(level.is_finite() && level > 0.0) {
            return Err(InvariantError::InvalidZoomLevel(level).into());
        }
        self.sizing = SizingRule::Zoom(level);
        self.apply_zoom(level);
        Ok(())
    }

    fn apply_sizing(&mut self) {
        match self.sizing {
            SizingRule::Fit => self.fit(),
            SizingRule::Zoom(level) => self.apply_zoom(level),
        }
    }

    fn apply_zoom(&mut self, level: f64) {
        let Some(natural) = self.measured() else {
            debug!(id = %self.id, level, "zoom recorded; natural size not measured yet");
            return;
        };
        self.element.set_length(StyleProp::Height, Length::Px(natural.size.height * level));
        self.element.set_length(StyleProp::Width, Length::Px(natural.size.width * level));
        debug!(id = %self.id, level, "zoomed");
        self.notify_resized();
    }

    fn fit(&mut self) {
        let Some(natural) = self.measured() else {
            debug!(id = %self.id, "fit skipped; natural size not measured yet");
            return;
        };
        let Some(parent) = self.element.parent_size() else {
            return;
        };
        match natural.orientation {
            Orientation::Landscape => self.fit_landscape(parent),
            Orientation::Portrait => self.fit_portrait(parent),
        }
        self.adjust_if_overflown(parent);
        debug!(id = %self.id, orientation = ?natural.orientation, "fitted to parent");
        self.notify_resized();
    }

    /// Natural size, measuring a layout box that was empty so far. Media only
    /// measures on load.
    fn measured(&mut self) -> Option<NaturalSize> {
        if self.natural.is_none() && !self.source.needs_load_signal() {
            self.natural = self.source.measure(&self.element).map(NaturalSize::new);
            if self.natural.is_some() {
                debug!(id = %self.id, "layout box measured");
            }
        }
        self.natural
    }

    fn fit_landscape(&self, parent: Size) {
        self.element.set_length(StyleProp::Width, Length::Percent(FIT_PERCENT));
        self.element.set_length(StyleProp::Height, Length::Auto);
        self.element.set_length(StyleProp::Left, Length::Px(0.0));
        let rendered = self.element.client_size();
        self.element.set_length(StyleProp::Top, Length::Px((parent.height - rendered.height) / 2.0));
    }

    fn fit_portrait(&self, parent: Size) {
        self.element.set_length(StyleProp::Width, Length::Auto);
        self.element.set_length(StyleProp::Height, Length::Percent(FIT_PERCENT));
        let rendered = self.element.client_size();
        self.element.set_length(StyleProp::Left, Length::Px((parent.width - rendered.width) / 2.0));
        self.element.set_length(StyleProp::Top, Length::Px(0.0));
    }

    /// One corrective pass: height overflow wins over width overflow.
    fn adjust_if_overflown(&self, parent: Size) {
        let rendered = self.element.client_size();
        if rendered.height > parent.height {
            self.fit_portrait(parent);
        } else if rendered.width > parent.width {
            self.fit_landscape(parent);
        } else {
            return;
        }
        let corrected = self.element.client_size();
        if corrected.height > parent.height || corrected.width > parent.width {
            warn!(id = %self.id, ?corrected, ?parent, "content still overflows parent after corrective fit");
        }
    }

    fn notify_resized(&mut self) {
        let geometry = self.geometry();
        if let Some(scale) = geometry.scale {
            self.events.scale_change.emit(&scale);
        }
        let change = SizeChange { width: geometry.rect.width, height: geometry.rect.height, viewport: geometry };
        self.events.size_change.emit(&change);
    }

    // --- Media load ---

    /// The element's load signal fired. The first successful measurement fixes
    /// orientation; later ones only update natural size.
    pub fn on_load(&mut self) {
        if !self.bindings.load {
            return;
        }
        let Some(size) = self.source.measure(&self.element) else {
            debug!(id = %self.id, "load signalled but natural size still unavailable");
            return;
        };
        self.natural = Some(match self.natural {
            Some(previous) => previous.remeasured(size),
            None => NaturalSize::new(size),
        });
        self.apply_sizing();
    }

    // --- Pointer input ---

    /// Pointer-down on the element. Only the primary button starts a pan.
    pub fn on_pointer_down(&mut self, event: PointerEvent) {
        if !self.bindings.pointer_down || !event.is_primary() {
            return;
        }
        self.drag = DragState::Dragging { last: None };
        if self.config.change_cursor_on_pan {
            self.update_cursor();
        }
        let payload = self.pan_event(PanGesture::start(event.position));
        self.events.pan_start.emit(&payload);
    }

    /// Pointer-move anywhere in the document.
    ///
    /// While dragging, moves the element by the delta since the last move and
    /// emits pan-move. An externally controlled engine leaves its position to
    /// its controller but still emits.
    pub fn on_pointer_move(&mut self, position: Point) {
        let Some(gesture) = self.track_pointer(position) else {
            return;
        };
        if self.externally_controlled {
            let payload = self.pan_event(gesture);
            self.events.pan_move.emit(&payload);
        } else {
            self.commit_drag(&gesture);
        }
    }

    /// Pointer-up anywhere in the document. Ends a drag.
    pub fn on_pointer_up(&mut self, position: Point) {
        if !self.bindings.document_pointer {
            return;
        }
        let DragState::Dragging { last } = self.drag else {
            return;
        };
        let payload = self.pan_event(PanGesture::step(position, last));
        self.events.pan_end.emit(&payload);
        self.drag = DragState::Idle;
        if self.config.change_cursor_on_pan {
            self.update_cursor();
        }
    }

    /// Native `dragstart` on the element. Returns whether the host should
    /// prevent the browser default.
    #[must_use]
    pub fn on_drag_start(&self) -> bool {
        self.bindings.drag_start
    }

    /// Record a move of the active drag and return its gesture step.
    pub(crate) fn track_pointer(&mut self, position: Point) -> Option<PanGesture> {
        if !self.bindings.document_pointer {
            return None;
        }
        let DragState::Dragging { last } = self.drag else {
            return None;
        };
        self.drag = DragState::Dragging { last: Some(position) };
        Some(PanGesture::step(position, last))
    }

    /// Apply a drag step to this engine's own position and emit pan-move.
    pub(crate) fn commit_drag(&mut self, gesture: &PanGesture) {
        self.translate(gesture.delta());
        let payload = self.pan_event(*gesture);
        self.events.pan_move.emit(&payload);
    }

    pub(crate) fn set_externally_controlled(&mut self, flag: bool) {
        self.externally_controlled = flag;
    }

    /// Move by the gesture's delta on behalf of another engine's drag.
    /// Does not touch this engine's own drag state.
    pub fn controlled_pan(&mut self, gesture: &PanGesture) {
        if self.destroyed {
            return;
        }
        let delta = gesture.delta();
        self.translate(delta);
        debug!(id = %self.id, dx = delta.x, dy = delta.y, "controlled pan");
        let payload = self.pan_event(*gesture);
        self.events.pan_move.emit(&payload);
    }

    fn translate(&self, delta: Point) {
        let offset = self.element.offset();
        self.element.set_length(StyleProp::Top, Length::Px(offset.y + delta.y));
        self.element.set_length(StyleProp::Left, Length::Px(offset.x + delta.x));
    }

    fn update_cursor(&self) {
        let cursor = if self.drag.is_dragging() { Cursor::Grabbing } else { Cursor::Grab };
        self.element.set_cursor(cursor);
    }

    fn pan_event(&self, gesture: PanGesture) -> PanEvent {
        PanEvent { gesture, viewport: self.geometry() }
    }

    // --- Window resize ---

    /// Window resize at `now_ms`. Schedules a re-fit after the debounce
    /// period, replacing any re-fit already pending.
    pub fn on_window_resize(&mut self, now_ms: f64) {
        if !self.bindings.window_resize || !self.config.refit_on_resize {
            return;
        }
        if self.pending_refit_at.is_some() {
            debug!(id = %self.id, "pending re-fit replaced by newer resize");
        }
        self.pending_refit_at = Some(now_ms + self.config.resize_debounce_ms);
    }

    /// Run the pending re-fit if it is due at `now_ms`. Returns whether it ran.
    pub fn poll_timers(&mut self, now_ms: f64) -> bool {
        let Some(due) = self.pending_refit_at else {
            return false;
        };
        if now_ms < due {
            return false;
        }
        self.pending_refit_at = None;
        self.sizing = SizingRule::Fit;
        self.fit();
        true
    }

    /// Milliseconds from `now_ms` until the pending re-fit is due, never
    /// negative. Hosts use it to arm a one-shot timer.
    #[must_use]
    pub fn refit_due_in(&self, now_ms: f64) -> Option<f64> {
        self.pending_refit_at.map(|due| (due - now_ms).max(0.0))
    }

    /// When the pending re-fit is due, if any.
    #[must_use]
    pub fn pending_refit_at(&self) -> Option<f64> {
        self.pending_refit_at
    }

    // --- Subscriptions ---

    pub fn on_pan_start<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&PanEvent) + 'static,
    {
        self.events.pan_start.subscribe(callback)
    }

    pub fn on_pan_move<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&PanEvent) + 'static,
    {
        self.events.pan_move.subscribe(callback)
    }

    pub fn on_pan_end<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&PanEvent) + 'static,
    {
        self.events.pan_end.subscribe(callback)
    }

    pub fn on_scale_change<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&f64) + 'static,
    {
        self.events.scale_change.subscribe(callback)
    }

    pub fn on_size_change<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&SizeChange) + 'static,
    {
        self.events.size_change.subscribe(callback)
    }

    /// Direct access to the subscriber lists, e.g. to unsubscribe.
    pub fn events_mut(&mut self) -> &mut ViewportEvents {
        &mut self.events
    }

    // --- Queries ---

    #[must_use]
    pub fn id(&self) -> ViewportId {
        self.id
    }

    #[must_use]
    pub fn element(&self) -> &E {
        &self.element
    }

    /// Client size of the parent container, if still attached.
    #[must_use]
    pub fn parent_size(&self) -> Option<Size> {
        self.element.parent_size()
    }

    #[must_use]
    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    #[must_use]
    pub fn bindings(&self) -> Bindings {
        self.bindings
    }

    #[must_use]
    pub fn natural_size(&self) -> Option<Size> {
        self.natural.map(|n| n.size)
    }

    #[must_use]
    pub fn orientation(&self) -> Option<Orientation> {
        self.natural.map(|n| n.orientation)
    }

    #[must_use]
    pub fn sizing_rule(&self) -> SizingRule {
        self.sizing
    }

    /// Explicit zoom level, `None` while fitting.
    #[must_use]
    pub fn zoom_level(&self) -> Option<f64> {
        match self.sizing {
            SizingRule::Zoom(level) => Some(level),
            SizingRule::Fit => None,
        }
    }

    /// `min(rendered_h / natural_h, rendered_w / natural_w)`, derived on demand.
    #[must_use]
    pub fn scale(&self) -> Option<f64> {
        self.natural.map(|n| n.scale_of(self.element.client_size()))
    }

    #[must_use]
    pub fn geometry(&self) -> ViewportGeometry {
        let offset = self.element.offset();
        let size = self.element.client_size();
        ViewportGeometry {
            id: self.id,
            rect: Rect::new(offset.x, offset.y, size.width, size.height),
            scale: self.scale(),
        }
    }

    #[must_use]
    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    #[must_use]
    pub fn is_externally_controlled(&self) -> bool {
        self.externally_controlled
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}
