#![allow(clippy::float_cmp)]

use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::geom::Size;
use crate::testing::{FakeDom, FakeElement, detached_image};
use crate::viewport::PanEvent;

fn three_up(dom: &FakeDom) -> SyncGroup<FakeElement> {
    let elements = vec![
        dom.image(Some(Size::new(1600.0, 900.0))),
        dom.image(Some(Size::new(900.0, 1600.0))),
        dom.image(Some(Size::new(1200.0, 1000.0))),
    ];
    match SyncGroup::new(elements, ViewportConfig::default()) {
        Ok(group) => group,
        Err(e) => panic!("group construction failed: {e}"),
    }
}

fn offset(group: &SyncGroup<FakeElement>, index: usize) -> Point {
    group.get(index).map(|vp| vp.element().offset()).unwrap_or_default()
}

fn count_moves(group: &mut SyncGroup<FakeElement>, index: usize) -> Rc<RefCell<usize>> {
    let count = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&count);
    if let Some(vp) = group.get_mut(index) {
        vp.on_pan_move(move |_: &PanEvent| *sink.borrow_mut() += 1);
    }
    count
}

// =============================================================
// Construction
// =============================================================

#[test]
fn empty_group_is_a_configuration_error() {
    let result = SyncGroup::<FakeElement>::new(Vec::new(), ViewportConfig::default());
    assert!(matches!(result, Err(ViewportError::Config(ConfigError::EmptyGroup))));
    let result = SyncGroup::<FakeElement>::from_viewports(Vec::new());
    assert!(matches!(result, Err(ViewportError::Config(ConfigError::EmptyGroup))));
}

#[test]
fn failing_child_aborts_construction() {
    let dom = FakeDom::new(Size::new(800.0, 600.0));
    let elements = vec![dom.image(Some(Size::new(100.0, 50.0))), detached_image(Size::new(100.0, 50.0))];
    let result = SyncGroup::new(elements, ViewportConfig::default());
    assert!(matches!(result, Err(ViewportError::Config(ConfigError::MissingParent))));
}

#[test]
fn children_fit_independently_and_are_externally_controlled() {
    let dom = FakeDom::new(Size::new(800.0, 600.0));
    let group = three_up(&dom);
    assert_eq!(group.len(), 3);
    assert!(group.iter().all(Viewport::is_externally_controlled));
    assert_eq!(offset(&group, 0), Point::new(0.0, 75.0));
    assert_eq!(offset(&group, 1), Point::new(231.25, 0.0));
    assert_eq!(offset(&group, 2), Point::new(40.0, 0.0));
}

#[test]
fn adopted_viewports_become_externally_controlled() {
    let dom = FakeDom::new(Size::new(800.0, 600.0));
    let build = |natural| match Viewport::new(dom.image(Some(natural)), ViewportConfig::default()) {
        Ok(vp) => vp,
        Err(e) => panic!("{e}"),
    };
    let viewports = vec![build(Size::new(1600.0, 900.0)), build(Size::new(900.0, 1600.0))];
    let group = match SyncGroup::from_viewports(viewports) {
        Ok(group) => group,
        Err(e) => panic!("{e}"),
    };
    assert!(group.iter().all(Viewport::is_externally_controlled));
}

// =============================================================
// Pan mirroring
// =============================================================

#[test]
fn drag_moves_source_once_and_every_peer_once() {
    let dom = FakeDom::new(Size::new(800.0, 600.0));
    let mut group = three_up(&dom);
    let counts: Vec<_> = (0..3).map(|i| count_moves(&mut group, i)).collect();

    assert!(group.on_pointer_down(1, PointerEvent::primary(100.0, 100.0)).is_ok());
    assert_eq!(group.active_source(), Some(1));
    // The start reaches peers as a zero-delta controlled pan.
    assert_eq!(counts.iter().map(|c| *c.borrow()).collect::<Vec<_>>(), vec![1, 0, 1]);

    group.on_pointer_move(Point::new(110.0, 105.0));
    group.on_pointer_move(Point::new(120.0, 115.0));
    assert_eq!(counts.iter().map(|c| *c.borrow()).collect::<Vec<_>>(), vec![3, 2, 3]);

    assert_eq!(offset(&group, 0), Point::new(10.0, 85.0));
    assert_eq!(offset(&group, 1), Point::new(241.25, 10.0));
    assert_eq!(offset(&group, 2), Point::new(50.0, 10.0));
}

#[test]
fn release_ends_gesture_and_stops_forwarding() {
    let dom = FakeDom::new(Size::new(800.0, 600.0));
    let mut group = three_up(&dom);
    assert!(group.on_pointer_down(0, PointerEvent::primary(0.0, 0.0)).is_ok());
    group.on_pointer_move(Point::new(1.0, 1.0));
    group.on_pointer_up(Point::new(1.0, 1.0));
    assert_eq!(group.active_source(), None);
    assert!(group.iter().all(|vp| !vp.is_dragging()));

    group.on_pointer_move(Point::new(50.0, 50.0));
    assert_eq!(offset(&group, 1), Point::new(231.25, 0.0));
}

#[test]
fn secondary_press_does_not_start_a_gesture() {
    let dom = FakeDom::new(Size::new(800.0, 600.0));
    let mut group = three_up(&dom);
    let press = PointerEvent { position: Point::new(0.0, 0.0), button: crate::input::Button::Secondary };
    assert!(group.on_pointer_down(2, press).is_ok());
    assert_eq!(group.active_source(), None);
}

#[test]
fn press_on_unknown_index_is_rejected() {
    let dom = FakeDom::new(Size::new(800.0, 600.0));
    let mut group = three_up(&dom);
    let result = group.on_pointer_down(7, PointerEvent::primary(0.0, 0.0));
    assert_eq!(result, Err(ViewportError::Invariant(InvariantError::IndexOutOfRange { index: 7, len: 3 })));
}

// =============================================================
// Zoom and scale reporting
// =============================================================

#[test]
fn zoom_fans_out_and_reports_scale_per_index() {
    let dom = FakeDom::new(Size::new(800.0, 600.0));
    let mut group = three_up(&dom);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    group.on_scale_change(move |s: &GroupScale| sink.borrow_mut().push(*s));

    assert!(group.zoom_in_out(2.0).is_ok());
    let seen = seen.borrow();
    assert_eq!(
        *seen,
        vec![
            GroupScale { scale: 2.0, index: 0 },
            GroupScale { scale: 2.0, index: 1 },
            GroupScale { scale: 2.0, index: 2 },
        ]
    );
    assert_eq!(group.get(1).map(|vp| vp.element().client_size()), Some(Size::new(1800.0, 3200.0)));
}

#[test]
fn invalid_zoom_changes_no_child() {
    let dom = FakeDom::new(Size::new(800.0, 600.0));
    let mut group = three_up(&dom);
    assert!(group.zoom_in_out(-2.0).is_err());
    assert!(group.iter().all(|vp| vp.zoom_level().is_none()));
}

#[test]
fn scale_subscribers_registered_up_front_see_first_fit() {
    let dom = FakeDom::new(Size::new(800.0, 600.0));
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let mut listeners = Listeners::new();
    listeners.subscribe(move |s: &GroupScale| sink.borrow_mut().push(s.index));
    let elements = vec![dom.image(Some(Size::new(1600.0, 900.0))), dom.block(Size::new(400.0, 200.0))];
    assert!(SyncGroup::with_events(elements, ViewportConfig::default(), listeners).is_ok());
    assert_eq!(*seen.borrow(), vec![0, 1]);
}

#[test]
fn resize_refits_each_child_once() {
    let dom = FakeDom::new(Size::new(800.0, 600.0));
    let mut group = three_up(&dom);
    group.on_window_resize(0.0);
    group.on_window_resize(0.5);
    assert_eq!(group.poll_timers(0.5), 0);
    assert_eq!(group.poll_timers(1.5), 3);
    assert_eq!(group.poll_timers(3.0), 0);
}

#[test]
fn load_routes_to_the_indexed_child() {
    let dom = FakeDom::new(Size::new(800.0, 600.0));
    let pending = dom.image(None);
    let elements = vec![dom.image(Some(Size::new(1600.0, 900.0))), pending.clone()];
    let mut group = match SyncGroup::new(elements, ViewportConfig::default()) {
        Ok(group) => group,
        Err(e) => panic!("{e}"),
    };
    pending.load(Size::new(900.0, 1600.0));
    assert!(group.on_load(1).is_ok());
    assert_eq!(group.get(1).and_then(Viewport::orientation), Some(crate::natural::Orientation::Portrait));
    assert!(group.on_load(2).is_err());
}

// =============================================================
// Destroy
// =============================================================

#[test]
fn destroy_tears_down_every_child_once() {
    let dom = FakeDom::new(Size::new(800.0, 600.0));
    let mut group = three_up(&dom);
    group.destroy();
    group.destroy();
    assert!(group.is_destroyed());
    assert!(group.iter().all(Viewport::is_destroyed));
    assert_eq!(group.zoom_fit(), Err(ViewportError::Invariant(InvariantError::Destroyed)));
    assert!(group.on_pointer_down(0, PointerEvent::primary(0.0, 0.0)).is_err());
}
