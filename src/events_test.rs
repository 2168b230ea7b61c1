use std::cell::RefCell;
use std::rc::Rc;

use super::*;

fn recorder() -> (Rc<RefCell<Vec<String>>>, impl Fn(&'static str) -> Box<dyn FnMut(&u32)>) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let make = move |name: &'static str| {
        let sink = Rc::clone(&sink);
        Box::new(move |v: &u32| sink.borrow_mut().push(format!("{name}:{v}"))) as Box<dyn FnMut(&u32)>
    };
    (log, make)
}

#[test]
fn emit_runs_subscribers_in_order() {
    let (log, make) = recorder();
    let mut listeners = Listeners::new();
    listeners.subscribe(make("a"));
    listeners.subscribe(make("b"));
    listeners.subscribe(make("c"));
    listeners.emit(&7);
    assert_eq!(*log.borrow(), vec!["a:7", "b:7", "c:7"]);
}

#[test]
fn emit_with_no_subscribers_is_a_no_op() {
    let mut listeners: Listeners<u32> = Listeners::new();
    listeners.emit(&1);
    assert!(listeners.is_empty());
}

#[test]
fn unsubscribe_removes_only_that_subscriber() {
    let (log, make) = recorder();
    let mut listeners = Listeners::new();
    let a = listeners.subscribe(make("a"));
    listeners.subscribe(make("b"));
    assert!(listeners.unsubscribe(a));
    assert!(!listeners.unsubscribe(a));
    listeners.emit(&2);
    assert_eq!(*log.borrow(), vec!["b:2"]);
    assert_eq!(listeners.len(), 1);
}

#[test]
fn clear_silences_everything() {
    let (log, make) = recorder();
    let mut listeners = Listeners::new();
    listeners.subscribe(make("a"));
    listeners.clear();
    listeners.emit(&3);
    assert!(log.borrow().is_empty());
}

#[test]
fn subscription_ids_are_unique() {
    let mut listeners: Listeners<u32> = Listeners::new();
    let a = listeners.subscribe(|_| {});
    let b = listeners.subscribe(|_| {});
    assert_ne!(a, b);
}
