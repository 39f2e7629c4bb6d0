use super::*;
use crate::foundation::core::Rect;

#[test]
fn square_outline_grows_by_radius() {
    let sq = PathSpec::rect(Rect::new(0.0, 0.0, 10.0, 10.0));
    let band = stroke_outline(&sq, 5.0, 5.0, 0.05);
    let b = band.bounds();
    assert!((b.x0 + 5.0).abs() < 0.1);
    assert!((b.y1 - 15.0).abs() < 0.1);
}

#[test]
fn anisotropic_pen_scales_each_axis() {
    let sq = PathSpec::rect(Rect::new(0.0, 0.0, 10.0, 10.0));
    let b = stroke_outline(&sq, 2.0, 6.0, 0.05).bounds();
    assert!((b.width() - 14.0).abs() < 0.1);
    assert!((b.height() - 22.0).abs() < 0.1);
}

#[test]
fn zero_radius_outline_is_empty() {
    let sq = PathSpec::rect(Rect::new(0.0, 0.0, 10.0, 10.0));
    assert!(stroke_outline(&sq, 0.0, 3.0, 0.1).is_empty());
    assert!(stroke_outline(&PathSpec::empty(), 1.0, 1.0, 0.1).is_empty());
}

#[test]
fn subdivision_respects_step() {
    let sq = PathSpec::rect(Rect::new(0.0, 0.0, 10.0, 10.0));
    let contours = subdivide(&sq, 2.5, 0.1);
    assert_eq!(contours.len(), 1);
    assert_eq!(contours[0].len(), 16);
    assert_eq!(subdivided_vertex_count(&sq, 2.5, 0.1), 16);
    assert_eq!(subdivided_vertex_count(&sq, 0.0, 0.1), 4);
}
