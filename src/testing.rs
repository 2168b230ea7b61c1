//! In-memory host used by the unit tests.
//!
//! Emulates just enough CSS layout for the engine: an `auto` axis follows the
//! other axis through the content's aspect ratio, percentages resolve against
//! the parent, and `left` / `top` become the element's offset.

use std::cell::RefCell;
use std::rc::Rc;

use crate::geom::{Length, Point, Rect, Size};
use crate::host::{Cursor, Element, ElementKind, Layer, ScratchKind, StyleProp};
use crate::shape::{PixelShape, Stroke};

struct ParentNode {
    size: Size,
    origin: Point,
    layers: Vec<FakeLayer>,
}

/// A parent container that fake elements and layers live in.
#[derive(Clone)]
pub(crate) struct FakeDom {
    parent: Rc<RefCell<ParentNode>>,
}

impl FakeDom {
    pub(crate) fn new(size: Size) -> Self {
        Self { parent: Rc::new(RefCell::new(ParentNode { size, origin: Point::default(), layers: Vec::new() })) }
    }

    pub(crate) fn set_size(&self, size: Size) {
        self.parent.borrow_mut().size = size;
    }

    pub(crate) fn set_origin(&self, origin: Point) {
        self.parent.borrow_mut().origin = origin;
    }

    /// An `<img>`; `None` means not decoded yet.
    pub(crate) fn image(&self, intrinsic: Option<Size>) -> FakeElement {
        FakeElement::new(ElementKind::Image, intrinsic.unwrap_or_default(), Some(Rc::clone(&self.parent)))
    }

    pub(crate) fn video(&self, intrinsic: Option<Size>) -> FakeElement {
        FakeElement::new(ElementKind::Video, intrinsic.unwrap_or_default(), Some(Rc::clone(&self.parent)))
    }

    /// A generic element whose layout box starts at `size`.
    pub(crate) fn block(&self, size: Size) -> FakeElement {
        FakeElement::new(ElementKind::Block, size, Some(Rc::clone(&self.parent)))
    }

    pub(crate) fn layers(&self) -> Vec<FakeLayer> {
        self.parent.borrow().layers.clone()
    }
}

/// An element that is not attached under any parent.
pub(crate) fn detached_image(size: Size) -> FakeElement {
    FakeElement::new(ElementKind::Image, size, None)
}

struct ElementNode {
    kind: ElementKind,
    content: Size,
    width: Length,
    height: Length,
    left: f64,
    top: f64,
    cursor: Option<Cursor>,
    positioned: bool,
    length_writes: usize,
}

#[derive(Clone)]
pub(crate) struct FakeElement {
    node: Rc<RefCell<ElementNode>>,
    parent: Option<Rc<RefCell<ParentNode>>>,
}

impl FakeElement {
    fn new(kind: ElementKind, content: Size, parent: Option<Rc<RefCell<ParentNode>>>) -> Self {
        let node = ElementNode {
            kind,
            content,
            width: Length::Auto,
            height: Length::Auto,
            left: 0.0,
            top: 0.0,
            cursor: None,
            positioned: false,
            length_writes: 0,
        };
        Self { node: Rc::new(RefCell::new(node)), parent }
    }

    /// Simulate the media finishing loading with `size` intrinsic pixels.
    pub(crate) fn load(&self, size: Size) {
        self.node.borrow_mut().content = size;
    }

    pub(crate) fn style(&self, prop: StyleProp) -> Length {
        let node = self.node.borrow();
        match prop {
            StyleProp::Width => node.width,
            StyleProp::Height => node.height,
            StyleProp::Left => Length::Px(node.left),
            StyleProp::Top => Length::Px(node.top),
        }
    }

    pub(crate) fn cursor(&self) -> Option<Cursor> {
        self.node.borrow().cursor
    }

    pub(crate) fn is_positioned(&self) -> bool {
        self.node.borrow().positioned
    }

    pub(crate) fn length_writes(&self) -> usize {
        self.node.borrow().length_writes
    }

    fn parent_box(&self) -> (Size, Point) {
        self.parent.as_ref().map_or((Size::default(), Point::default()), |p| {
            let p = p.borrow();
            (p.size, p.origin)
        })
    }
}

fn resolve(len: Length, parent: f64) -> Option<f64> {
    match len {
        Length::Px(v) => Some(v),
        Length::Percent(p) => Some(parent * p / 100.0),
        Length::Auto => None,
    }
}

impl Element for FakeElement {
    type Layer = FakeLayer;

    fn kind(&self) -> ElementKind {
        self.node.borrow().kind
    }

    fn parent_size(&self) -> Option<Size> {
        self.parent.as_ref().map(|p| p.borrow().size)
    }

    fn intrinsic_size(&self) -> Size {
        let node = self.node.borrow();
        if node.kind.is_media() { node.content } else { Size::default() }
    }

    fn client_size(&self) -> Size {
        let (parent, _) = self.parent_box();
        let node = self.node.borrow();
        let content = node.content;
        let w = resolve(node.width, parent.width);
        let h = resolve(node.height, parent.height);
        let ratio_h = |w: f64| if content.width > 0.0 { w * content.height / content.width } else { 0.0 };
        let ratio_w = |h: f64| if content.height > 0.0 { h * content.width / content.height } else { 0.0 };
        match (w, h) {
            (Some(w), Some(h)) => Size::new(w, h),
            (Some(w), None) => Size::new(w, ratio_h(w)),
            (None, Some(h)) => Size::new(ratio_w(h), h),
            (None, None) => content,
        }
    }

    fn offset(&self) -> Point {
        let node = self.node.borrow();
        Point::new(node.left, node.top)
    }

    fn prepare_positioning(&self) {
        self.node.borrow_mut().positioned = true;
    }

    fn set_length(&self, prop: StyleProp, value: Length) {
        let (parent, _) = self.parent_box();
        let mut node = self.node.borrow_mut();
        node.length_writes += 1;
        match prop {
            StyleProp::Width => node.width = value,
            StyleProp::Height => node.height = value,
            StyleProp::Left => node.left = resolve(value, parent.width).unwrap_or(0.0),
            StyleProp::Top => node.top = resolve(value, parent.height).unwrap_or(0.0),
        }
    }

    fn set_cursor(&self, cursor: Cursor) {
        self.node.borrow_mut().cursor = Some(cursor);
    }

    fn append_layer(&self) -> Option<FakeLayer> {
        let parent = self.parent.as_ref()?;
        let layer = FakeLayer::new(Rc::clone(parent));
        parent.borrow_mut().layers.push(layer.clone());
        Some(layer)
    }
}

#[derive(Default)]
struct LayerNode {
    geometry: Rect,
    cursor: Option<Cursor>,
    pointer_events: bool,
    scratch: Option<ScratchKind>,
    scratch_shape: Option<PixelShape>,
    scratch_resets: usize,
    shapes: Vec<(PixelShape, Stroke)>,
    removed: bool,
}

#[derive(Clone)]
pub(crate) struct FakeLayer {
    node: Rc<RefCell<LayerNode>>,
    parent: Rc<RefCell<ParentNode>>,
}

impl FakeLayer {
    fn new(parent: Rc<RefCell<ParentNode>>) -> Self {
        let node = LayerNode { pointer_events: true, ..LayerNode::default() };
        Self { node: Rc::new(RefCell::new(node)), parent }
    }

    pub(crate) fn geometry(&self) -> Rect {
        self.node.borrow().geometry
    }

    pub(crate) fn cursor(&self) -> Option<Cursor> {
        self.node.borrow().cursor
    }

    pub(crate) fn pointer_events(&self) -> bool {
        self.node.borrow().pointer_events
    }

    pub(crate) fn scratch_kind(&self) -> Option<ScratchKind> {
        self.node.borrow().scratch
    }

    pub(crate) fn scratch_shape(&self) -> Option<PixelShape> {
        self.node.borrow().scratch_shape.clone()
    }

    pub(crate) fn scratch_resets(&self) -> usize {
        self.node.borrow().scratch_resets
    }

    pub(crate) fn shapes(&self) -> Vec<PixelShape> {
        self.node.borrow().shapes.iter().map(|(s, _)| s.clone()).collect()
    }

    pub(crate) fn strokes(&self) -> Vec<Stroke> {
        self.node.borrow().shapes.iter().map(|(_, s)| s.clone()).collect()
    }

    pub(crate) fn is_removed(&self) -> bool {
        self.node.borrow().removed
    }
}

impl Layer for FakeLayer {
    fn set_geometry(&self, rect: Rect) {
        self.node.borrow_mut().geometry = rect;
    }

    fn client_size(&self) -> Size {
        self.node.borrow().geometry.size()
    }

    fn screen_origin(&self) -> Point {
        let origin = self.parent.borrow().origin;
        let g = self.node.borrow().geometry;
        Point::new(origin.x + g.left, origin.y + g.top)
    }

    fn set_cursor(&self, cursor: Cursor) {
        self.node.borrow_mut().cursor = Some(cursor);
    }

    fn set_pointer_events(&self, enabled: bool) {
        self.node.borrow_mut().pointer_events = enabled;
    }

    fn reset_scratch(&self, kind: Option<ScratchKind>, _stroke: &Stroke) {
        let mut node = self.node.borrow_mut();
        node.scratch = kind;
        node.scratch_shape = None;
        node.scratch_resets += 1;
    }

    fn draw_scratch(&self, shape: &PixelShape) {
        self.node.borrow_mut().scratch_shape = Some(shape.clone());
    }

    fn clear_scratch(&self) {
        self.node.borrow_mut().scratch_shape = None;
    }

    fn clear_shapes(&self) {
        self.node.borrow_mut().shapes.clear();
    }

    fn draw_shape(&self, shape: &PixelShape, stroke: &Stroke) {
        self.node.borrow_mut().shapes.push((shape.clone(), stroke.clone()));
    }

    fn remove(&self) {
        self.node.borrow_mut().removed = true;
        let me = Rc::clone(&self.node);
        self.parent.borrow_mut().layers.retain(|l| !Rc::ptr_eq(&l.node, &me));
    }
}
