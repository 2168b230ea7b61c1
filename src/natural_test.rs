#![allow(clippy::float_cmp)]

use super::*;
use crate::testing::FakeDom;

// =============================================================
// Orientation
// =============================================================

#[test]
fn wider_than_tall_is_landscape() {
    assert_eq!(Orientation::from_size(Size::new(400.0, 300.0)), Orientation::Landscape);
}

#[test]
fn taller_than_wide_is_portrait() {
    assert_eq!(Orientation::from_size(Size::new(300.0, 400.0)), Orientation::Portrait);
}

#[test]
fn square_breaks_tie_as_landscape() {
    assert_eq!(Orientation::from_size(Size::new(256.0, 256.0)), Orientation::Landscape);
}

// =============================================================
// NaturalSizeSource
// =============================================================

#[test]
fn media_kinds_use_intrinsic_source() {
    assert_eq!(NaturalSizeSource::for_kind(ElementKind::Image), NaturalSizeSource::Intrinsic);
    assert_eq!(NaturalSizeSource::for_kind(ElementKind::Video), NaturalSizeSource::Intrinsic);
    assert_eq!(NaturalSizeSource::for_kind(ElementKind::Block), NaturalSizeSource::LayoutBox);
    assert!(NaturalSizeSource::Intrinsic.needs_load_signal());
    assert!(!NaturalSizeSource::LayoutBox.needs_load_signal());
}

#[test]
fn intrinsic_measure_is_none_before_load() {
    let dom = FakeDom::new(Size::new(800.0, 600.0));
    let img = dom.image(None);
    assert_eq!(NaturalSizeSource::Intrinsic.measure(&img), None);
    img.load(Size::new(1200.0, 800.0));
    assert_eq!(NaturalSizeSource::Intrinsic.measure(&img), Some(Size::new(1200.0, 800.0)));
}

#[test]
fn layout_box_measure_reads_client_size() {
    let dom = FakeDom::new(Size::new(800.0, 600.0));
    let block = dom.block(Size::new(300.0, 500.0));
    assert_eq!(NaturalSizeSource::LayoutBox.measure(&block), Some(Size::new(300.0, 500.0)));
}

// =============================================================
// NaturalSize
// =============================================================

#[test]
fn remeasure_keeps_orientation() {
    let n = NaturalSize::new(Size::new(400.0, 200.0)).remeasured(Size::new(100.0, 900.0));
    assert_eq!(n.orientation, Orientation::Landscape);
    assert_eq!(n.size, Size::new(100.0, 900.0));
}

#[test]
fn scale_is_min_of_axis_ratios() {
    let n = NaturalSize::new(Size::new(400.0, 200.0));
    assert_eq!(n.scale_of(Size::new(800.0, 400.0)), 2.0);
    assert_eq!(n.scale_of(Size::new(200.0, 400.0)), 0.5);
}
