//! Keeps a layer's geometry slaved to a viewport.
//!
//! Both the drawing overlay and the annotation layer subscribe to the bound
//! viewport's size-change and pan-move through a weak reference to their own
//! state, and drop those subscriptions again on teardown.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::warn;

use crate::events::SubscriptionId;
use crate::geom::Rect;
use crate::host::Element;
use crate::viewport::{PanEvent, SizeChange, Viewport, ViewportId};

/// State that mirrors a viewport's offset and size.
pub(crate) trait Follows {
    /// The viewport moved; copy its offset.
    fn follow_pan(&self, rect: Rect);

    /// The viewport was resized; copy its box and redraw.
    fn follow_resize(&self, rect: Rect);
}

/// Live subscriptions on one viewport.
#[derive(Debug)]
pub(crate) struct Tracking {
    viewport: ViewportId,
    size_sub: SubscriptionId,
    pan_sub: SubscriptionId,
}

impl Tracking {
    pub(crate) fn follow<E, T>(viewport: &mut Viewport<E>, state: &Rc<RefCell<T>>) -> Self
    where
        E: Element,
        T: Follows + 'static,
    {
        let weak = Rc::downgrade(state);
        let size_sub = viewport.on_size_change(move |change: &SizeChange| {
            with_state(&weak, |s| s.follow_resize(change.viewport.rect));
        });
        let weak = Rc::downgrade(state);
        let pan_sub = viewport.on_pan_move(move |event: &PanEvent| {
            with_state(&weak, |s| s.follow_pan(event.viewport.rect));
        });
        Self { viewport: viewport.id(), size_sub, pan_sub }
    }

    /// Unsubscribe from `viewport`. Subscriptions on a different viewport are
    /// left in place; they go inert once the state is dropped.
    pub(crate) fn release<E: Element>(self, viewport: &mut Viewport<E>) {
        if viewport.id() != self.viewport {
            warn!(bound = %self.viewport, given = %viewport.id(), "released against a different viewport");
            return;
        }
        let events = viewport.events_mut();
        events.size_change.unsubscribe(self.size_sub);
        events.pan_move.unsubscribe(self.pan_sub);
    }
}

fn with_state<T: Follows>(weak: &Weak<RefCell<T>>, f: impl FnOnce(&T)) {
    if let Some(state) = weak.upgrade() {
        f(&state.borrow());
    }
}
