//! Browser binding for the `web` feature.
//!
//! This module is the only place that touches `web_sys`. [`WebElement`] wraps
//! the target `HtmlElement`; [`SvgLayer`] is the `<svg>` surface the overlay
//! and annotation layer draw into; [`ViewportHost`] registers the DOM
//! listeners a viewport's [`Bindings`] ask for and forwards browser events to
//! its `on_*` entry points.
//!
//! DOM calls that return `Err(JsValue)` are logged and otherwise ignored: a
//! failed style write leaves the previous value in place.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gloo_timers::callback::Timeout;
use js_sys::Date;
use tracing::{debug, warn};
use wasm_bindgen::{JsCast, JsValue, closure::Closure};
use web_sys::{Document, Event, EventTarget, HtmlElement, HtmlImageElement, HtmlVideoElement, MouseEvent, SvgElement};

use crate::config::ConfigPatch;
use crate::consts::{SCRATCH_ELEMENT_ID, SVG_NS};
use crate::error::{ConfigError, ViewportError};
use crate::geom::{Length, Point, Rect, Size};
use crate::host::{Cursor, Element, ElementKind, Layer, ScratchKind, StyleProp};
use crate::input::{Button, PointerEvent};
use crate::shape::{PixelShape, Stroke};
use crate::viewport::{Bindings, Viewport};

/// Attribute marking finalized shape elements inside an [`SvgLayer`].
const SHAPE_ATTR: &str = "data-viewfit-shape";

fn check(op: &'static str, result: Result<(), JsValue>) {
    if let Err(err) = result {
        warn!(op, error = ?err, "DOM call failed");
    }
}

fn logged<T>(op: &'static str, result: Result<T, JsValue>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(op, error = ?err, "DOM call failed");
            None
        }
    }
}

fn page_scroll() -> Point {
    let Some(window) = web_sys::window() else {
        return Point::default();
    };
    let x = logged("scrollX", window.scroll_x()).unwrap_or_default();
    let y = logged("scrollY", window.scroll_y()).unwrap_or_default();
    Point::new(x, y)
}

fn client_size(element: &web_sys::Element) -> Size {
    Size::new(f64::from(element.client_width()), f64::from(element.client_height()))
}

/// The element a viewport controls.
#[derive(Debug, Clone)]
pub struct WebElement {
    element: HtmlElement,
}

impl WebElement {
    #[must_use]
    pub fn new(element: HtmlElement) -> Self {
        Self { element }
    }

    /// Look up `id` in `document`.
    ///
    /// # Errors
    ///
    /// `MissingElement` when there is no such element or it is not an
    /// `HtmlElement`.
    pub fn by_id(document: &Document, id: &str) -> Result<Self, ViewportError> {
        let element = document.get_element_by_id(id).ok_or(ConfigError::MissingElement)?;
        let element = element.dyn_into::<HtmlElement>().map_err(|_| ConfigError::MissingElement)?;
        Ok(Self::new(element))
    }

    #[must_use]
    pub fn html(&self) -> &HtmlElement {
        &self.element
    }

    fn set_style(&self, property: &'static str, value: &str) {
        check(property, self.element.style().set_property(property, value));
    }
}

impl Element for WebElement {
    type Layer = SvgLayer;

    fn kind(&self) -> ElementKind {
        if self.element.is_instance_of::<HtmlImageElement>() {
            ElementKind::Image
        } else if self.element.is_instance_of::<HtmlVideoElement>() {
            ElementKind::Video
        } else {
            ElementKind::Block
        }
    }

    fn parent_size(&self) -> Option<Size> {
        self.element.parent_element().map(|parent| client_size(&parent))
    }

    fn intrinsic_size(&self) -> Size {
        if let Some(img) = self.element.dyn_ref::<HtmlImageElement>() {
            Size::new(f64::from(img.natural_width()), f64::from(img.natural_height()))
        } else if let Some(video) = self.element.dyn_ref::<HtmlVideoElement>() {
            Size::new(f64::from(video.video_width()), f64::from(video.video_height()))
        } else {
            Size::default()
        }
    }

    fn client_size(&self) -> Size {
        client_size(&self.element)
    }

    fn offset(&self) -> Point {
        Point::new(f64::from(self.element.offset_left()), f64::from(self.element.offset_top()))
    }

    fn prepare_positioning(&self) {
        self.set_style("position", "absolute");
        self.set_style("will-change", "top, left, width, height");
    }

    fn set_length(&self, prop: StyleProp, value: Length) {
        self.set_style(prop.css_name(), &value.to_string());
    }

    fn set_cursor(&self, cursor: Cursor) {
        self.set_style("cursor", cursor.css_name());
    }

    fn append_layer(&self) -> Option<SvgLayer> {
        let parent = self.element.parent_element()?;
        SvgLayer::create(&parent)
    }
}

/// An absolutely positioned `<svg>` in the viewport's parent.
#[derive(Debug, Clone)]
pub struct SvgLayer {
    svg: SvgElement,
    document: Document,
}

impl SvgLayer {
    fn create(parent: &web_sys::Element) -> Option<Self> {
        let document = parent.owner_document()?;
        let node = logged("createElementNS", document.create_element_ns(Some(SVG_NS), "svg"))?;
        let Ok(svg) = node.dyn_into::<SvgElement>() else {
            warn!("created <svg> is not an SVGElement");
            return None;
        };
        logged("appendChild", parent.append_child(&svg))?;
        let layer = Self { svg, document };
        layer.set_style("position", "absolute");
        layer.set_style("will-change", "top, left, width, height");
        Some(layer)
    }

    fn set_style(&self, property: &'static str, value: &str) {
        check(property, self.svg.style().set_property(property, value));
    }

    fn set_attr(element: &web_sys::Element, name: &'static str, value: &str) {
        check(name, element.set_attribute(name, value));
    }

    fn scratch(&self) -> Option<web_sys::Element> {
        logged("querySelector", self.svg.query_selector(&format!("#{SCRATCH_ELEMENT_ID}"))).flatten()
    }

    fn create_child(&self, tag: &str, stroke: &Stroke) -> Option<web_sys::Element> {
        let child = logged("createElementNS", self.document.create_element_ns(Some(SVG_NS), tag))?;
        Self::set_attr(&child, "stroke", &stroke.color);
        Self::set_attr(&child, "stroke-width", &stroke.width.to_string());
        Self::set_attr(&child, "fill", "none");
        logged("appendChild", self.svg.append_child(&child))?;
        Some(child)
    }

    fn write_geometry(element: &web_sys::Element, shape: &PixelShape) {
        match shape {
            PixelShape::Rectangle(r) => {
                Self::set_attr(element, "x", &r.left.to_string());
                Self::set_attr(element, "y", &r.top.to_string());
                Self::set_attr(element, "width", &r.width.to_string());
                Self::set_attr(element, "height", &r.height.to_string());
            }
            PixelShape::Ellipse(r) => {
                Self::set_attr(element, "cx", &(r.left + r.width / 2.0).to_string());
                Self::set_attr(element, "cy", &(r.top + r.height / 2.0).to_string());
                Self::set_attr(element, "rx", &(r.width / 2.0).to_string());
                Self::set_attr(element, "ry", &(r.height / 2.0).to_string());
            }
            PixelShape::Drawing(points) => Self::set_attr(element, "d", &PixelShape::path_data(points)),
        }
    }
}

impl Layer for SvgLayer {
    fn set_geometry(&self, rect: Rect) {
        self.set_style("top", &Length::Px(rect.top).to_string());
        self.set_style("left", &Length::Px(rect.left).to_string());
        Self::set_attr(&self.svg, "width", &rect.width.to_string());
        Self::set_attr(&self.svg, "height", &rect.height.to_string());
        let size = client_size(&self.svg);
        Self::set_attr(&self.svg, "viewBox", &format!("0 0 {} {}", size.width, size.height));
    }

    fn client_size(&self) -> Size {
        client_size(&self.svg)
    }

    fn screen_origin(&self) -> Point {
        let rect = self.svg.get_bounding_client_rect();
        let scroll = page_scroll();
        Point::new(rect.x() + scroll.x, rect.y() + scroll.y)
    }

    fn set_cursor(&self, cursor: Cursor) {
        self.set_style("cursor", cursor.css_name());
    }

    fn set_pointer_events(&self, enabled: bool) {
        self.set_style("pointer-events", if enabled { "auto" } else { "none" });
    }

    fn reset_scratch(&self, kind: Option<ScratchKind>, stroke: &Stroke) {
        if let Some(previous) = self.scratch() {
            previous.remove();
        }
        let tag = match kind {
            Some(ScratchKind::Path) => "path",
            Some(ScratchKind::Rect) => "rect",
            None => return,
        };
        if let Some(scratch) = self.create_child(tag, stroke) {
            scratch.set_id(SCRATCH_ELEMENT_ID);
        }
    }

    fn draw_scratch(&self, shape: &PixelShape) {
        match self.scratch() {
            Some(scratch) => Self::write_geometry(&scratch, shape),
            None => warn!("scratch element missing while drawing"),
        }
    }

    fn clear_scratch(&self) {
        let Some(scratch) = self.scratch() else {
            return;
        };
        for attr in ["d", "width", "height"] {
            check("removeAttribute", scratch.remove_attribute(attr));
        }
    }

    fn clear_shapes(&self) {
        let selector = format!("[{SHAPE_ATTR}]");
        while let Some(shape) = logged("querySelector", self.svg.query_selector(&selector)).flatten() {
            shape.remove();
        }
    }

    fn draw_shape(&self, shape: &PixelShape, stroke: &Stroke) {
        let tag = match shape {
            PixelShape::Rectangle(_) => "rect",
            PixelShape::Ellipse(_) => "ellipse",
            PixelShape::Drawing(_) => "path",
        };
        if let Some(element) = self.create_child(tag, stroke) {
            Self::set_attr(&element, SHAPE_ATTR, "");
            Self::write_geometry(&element, shape);
        }
    }

    fn remove(&self) {
        self.svg.remove();
    }
}

// =============================================================
// DOM listeners
// =============================================================

/// A viewport shared between its host and the DOM callbacks.
pub type SharedViewport = Rc<RefCell<Viewport<WebElement>>>;

/// One registered DOM listener. Dropping it removes the listener.
struct DomListener {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl DomListener {
    fn add<F>(target: &EventTarget, event: &'static str, handler: F) -> Option<Self>
    where
        F: FnMut(Event) + 'static,
    {
        let callback = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        logged(event, target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref()))?;
        Some(Self { target: target.clone(), event, callback })
    }
}

impl Drop for DomListener {
    fn drop(&mut self) {
        check(
            self.event,
            self.target.remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref()),
        );
    }
}

/// Run `handler` against the viewport if it is still alive and not already
/// borrowed by a caller further up the stack.
fn with_viewport<F>(viewport: &Weak<RefCell<Viewport<WebElement>>>, event: &str, handler: F)
where
    F: FnOnce(&mut Viewport<WebElement>),
{
    let Some(viewport) = viewport.upgrade() else {
        return;
    };
    let Ok(mut vp) = viewport.try_borrow_mut() else {
        warn!(event, "viewport busy; DOM event dropped");
        return;
    };
    handler(&mut vp);
}

fn pointer_event(event: &Event) -> Option<PointerEvent> {
    let mouse = event.dyn_ref::<MouseEvent>()?;
    Some(PointerEvent {
        position: Point::new(f64::from(mouse.page_x()), f64::from(mouse.page_y())),
        button: Button::from_dom(mouse.button()),
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn timeout_ms(ms: f64) -> u32 {
    ms.ceil().clamp(0.0, f64::from(u32::MAX)) as u32
}

/// Browser driver for one [`Viewport`].
///
/// Listeners follow the viewport's [`Bindings`]: they are registered on
/// mount, re-registered after a reinit through [`ViewportHost::update_config`],
/// and removed by [`ViewportHost::destroy`] or when the host is dropped. The
/// debounced re-fit runs on a `gloo_timers` timeout; a newer resize replaces
/// (and so cancels) the previous one.
pub struct ViewportHost {
    viewport: SharedViewport,
    listeners: Vec<DomListener>,
    refit: Rc<RefCell<Option<Timeout>>>,
}

impl ViewportHost {
    #[must_use]
    pub fn mount(viewport: Viewport<WebElement>) -> Self {
        let mut host = Self { viewport: Rc::new(RefCell::new(viewport)), listeners: Vec::new(), refit: Rc::default() };
        host.rebind();
        host
    }

    /// The driven viewport. Config changes that reinit should go through
    /// [`ViewportHost::update_config`] so the listeners follow.
    #[must_use]
    pub fn viewport(&self) -> &SharedViewport {
        &self.viewport
    }

    /// Number of DOM listeners currently registered.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Apply a config update and, on reinit, re-register listeners from the
    /// new bindings.
    ///
    /// # Errors
    ///
    /// Whatever [`Viewport::update_config`] returns.
    pub fn update_config(&mut self, patch: &ConfigPatch, reinit: bool) -> Result<(), ViewportError> {
        self.viewport.borrow_mut().update_config(patch, reinit)?;
        if self.viewport.borrow().pending_refit_at().is_none() {
            self.refit.borrow_mut().take();
        }
        if reinit {
            self.rebind();
        }
        Ok(())
    }

    /// Destroy the viewport, remove every listener, and cancel the re-fit timer.
    pub fn destroy(&mut self) {
        self.viewport.borrow_mut().destroy();
        self.listeners.clear();
        self.refit.borrow_mut().take();
    }

    fn rebind(&mut self) {
        self.listeners.clear();
        let bindings = self.viewport.borrow().bindings();
        let element: EventTarget = self.viewport.borrow().element().html().clone().into();
        let window = web_sys::window();
        let document = window.as_ref().and_then(web_sys::Window::document);
        self.bind_element(&element, bindings);
        if bindings.document_pointer {
            match &document {
                Some(document) => self.bind_document(&document.clone().into()),
                None => warn!("no document; pointer move and up are not forwarded"),
            }
        }
        if bindings.window_resize {
            match &window {
                Some(window) => self.bind_resize(&window.clone().into()),
                None => warn!("no window; resize is not forwarded"),
            }
        }
        debug!(id = %self.viewport.borrow().id(), listeners = self.listeners.len(), "DOM listeners bound");
    }

    fn push(&mut self, listener: Option<DomListener>) {
        if let Some(listener) = listener {
            self.listeners.push(listener);
        }
    }

    fn bind_element(&mut self, element: &EventTarget, bindings: Bindings) {
        if bindings.load {
            let vp = Rc::downgrade(&self.viewport);
            self.push(DomListener::add(element, "load", move |_| {
                with_viewport(&vp, "load", Viewport::on_load);
            }));
        }
        if bindings.pointer_down {
            let vp = Rc::downgrade(&self.viewport);
            self.push(DomListener::add(element, "pointerdown", move |event| {
                let Some(pointer) = pointer_event(&event) else {
                    return;
                };
                with_viewport(&vp, "pointerdown", |vp| vp.on_pointer_down(pointer));
            }));
        }
        if bindings.drag_start {
            let vp = Rc::downgrade(&self.viewport);
            self.push(DomListener::add(element, "dragstart", move |event| {
                with_viewport(&vp, "dragstart", |vp| {
                    if vp.on_drag_start() {
                        event.prevent_default();
                    }
                });
            }));
        }
    }

    fn bind_document(&mut self, document: &EventTarget) {
        let vp = Rc::downgrade(&self.viewport);
        self.push(DomListener::add(document, "pointermove", move |event| {
            let Some(pointer) = pointer_event(&event) else {
                return;
            };
            with_viewport(&vp, "pointermove", |vp| vp.on_pointer_move(pointer.position));
        }));
        let vp = Rc::downgrade(&self.viewport);
        self.push(DomListener::add(document, "pointerup", move |event| {
            let Some(pointer) = pointer_event(&event) else {
                return;
            };
            with_viewport(&vp, "pointerup", |vp| vp.on_pointer_up(pointer.position));
        }));
    }

    fn bind_resize(&mut self, window: &EventTarget) {
        let vp = Rc::downgrade(&self.viewport);
        let refit = Rc::clone(&self.refit);
        self.push(DomListener::add(window, "resize", move |_| {
            with_viewport(&vp, "resize", |viewport| {
                let now = Date::now();
                viewport.on_window_resize(now);
                let Some(delay) = viewport.refit_due_in(now) else {
                    return;
                };
                let due = now + delay;
                let vp = vp.clone();
                let timer = Timeout::new(timeout_ms(delay), move || {
                    with_viewport(&vp, "refit", |viewport| {
                        viewport.poll_timers(due.max(Date::now()));
                    });
                });
                *refit.borrow_mut() = Some(timer);
            });
        }));
    }
}

impl std::fmt::Debug for ViewportHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewportHost").field("listeners", &self.listeners.len()).finish_non_exhaustive()
    }
}
