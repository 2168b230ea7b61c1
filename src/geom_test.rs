#![allow(clippy::float_cmp)]

use super::*;

// =============================================================
// Point
// =============================================================

#[test]
fn point_sub_gives_offset() {
    let p = Point::new(30.0, 45.0) - Point::new(10.0, 5.0);
    assert_eq!(p, Point::new(20.0, 40.0));
}

#[test]
fn point_serializes_as_xy_object() {
    let json = serde_json::to_value(Point::new(0.25, 0.5)).unwrap();
    assert_eq!(json, serde_json::json!({ "x": 0.25, "y": 0.5 }));
}

// =============================================================
// Size
// =============================================================

#[test]
fn size_empty_when_any_side_is_zero() {
    assert!(Size::new(0.0, 10.0).is_empty());
    assert!(Size::new(10.0, 0.0).is_empty());
    assert!(Size::new(f64::NAN, 10.0).is_empty());
    assert!(!Size::new(1.0, 1.0).is_empty());
}

// =============================================================
// Rect
// =============================================================

#[test]
fn rect_from_corners_is_order_independent() {
    let a = Point::new(50.0, 10.0);
    let b = Point::new(20.0, 40.0);
    let r = Rect::from_corners(a, b);
    assert_eq!(r, Rect::new(20.0, 10.0, 30.0, 30.0));
    assert_eq!(Rect::from_corners(b, a), r);
}

#[test]
fn rect_origin_and_size() {
    let r = Rect::new(1.0, 2.0, 3.0, 4.0);
    assert_eq!(r.origin(), Point::new(1.0, 2.0));
    assert_eq!(r.size(), Size::new(3.0, 4.0));
}

// =============================================================
// Length
// =============================================================

#[test]
fn length_formats_as_css() {
    assert_eq!(Length::Px(123.0).to_string(), "123px");
    assert_eq!(Length::Px(12.5).to_string(), "12.5px");
    assert_eq!(Length::Percent(100.0).to_string(), "100%");
    assert_eq!(Length::Auto.to_string(), "auto");
}
