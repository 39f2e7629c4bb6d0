use kurbo::Shape as _;

use super::*;
use crate::foundation::core::Rect;

fn square(x: f64, y: f64, s: f64) -> PathSpec {
    PathSpec::rect(Rect::new(x, y, x + s, y + s))
}

fn area(p: &PathSpec) -> f64 {
    p.path().area().abs()
}

#[test]
fn intersect_overlapping_squares() {
    let a = square(0.0, 0.0, 10.0);
    let b = square(5.0, 5.0, 10.0);
    let r = boolean(&[&a, &b], BoolOp::Intersect, 0.1);
    assert_eq!(r.bounds(), Rect::new(5.0, 5.0, 10.0, 10.0));
    assert!((area(&r) - 25.0).abs() < 1e-6);
    assert_eq!(r.fill_rule(), FillRule::NonZero);
}

#[test]
fn union_traces_a_single_outline() {
    let a = square(0.0, 0.0, 10.0);
    let b = square(5.0, 5.0, 10.0);
    let r = boolean(&[&a, &b], BoolOp::Union, 0.1);
    assert_eq!(r.bounds(), Rect::new(0.0, 0.0, 15.0, 15.0));
    assert!((area(&r) - 175.0).abs() < 1e-6);
    let moves = r
        .path()
        .elements()
        .iter()
        .filter(|el| matches!(el, kurbo::PathEl::MoveTo(_)))
        .count();
    assert_eq!(moves, 1);
}

#[test]
fn difference_punches_a_hole() {
    let outer = square(0.0, 0.0, 30.0);
    let inner = square(10.0, 10.0, 10.0);
    let r = boolean(&[&outer, &inner], BoolOp::Difference, 0.1);
    assert_eq!(r.bounds(), Rect::new(0.0, 0.0, 30.0, 30.0));
    assert!((area(&r) - 800.0).abs() < 1e-6);
}

#[test]
fn disjoint_intersection_is_empty() {
    let a = square(0.0, 0.0, 10.0);
    let b = square(20.0, 20.0, 5.0);
    assert!(boolean(&[&a, &b], BoolOp::Intersect, 0.1).is_empty());
}

#[test]
fn evenodd_operand_keeps_its_hole() {
    let d = "M0,0 L30,0 L30,30 L0,30 Z M10,10 L20,10 L20,20 L10,20 Z";
    let ring = PathSpec::from_svg(d, FillRule::EvenOdd).unwrap();
    let probe = square(12.0, 12.0, 6.0);
    assert!(boolean(&[&ring, &probe], BoolOp::Intersect, 0.1).is_empty());

    let nz = ring.with_fill_rule(FillRule::NonZero);
    let r = boolean(&[&nz, &probe], BoolOp::Intersect, 0.1);
    assert!((area(&r) - 36.0).abs() < 1e-6);
}

#[test]
fn crossing_bowtie_is_split_at_the_crossing() {
    let bowtie = PathSpec::from_svg("M0,0 L10,10 L10,0 L0,10 Z", FillRule::NonZero).unwrap();
    let r = boolean(&[&bowtie], BoolOp::Union, 0.1);
    assert!((area(&r) - 50.0).abs() < 1e-6);
}

#[test]
fn cancelling_winding_resolves_to_empty() {
    let cw = PathSpec::from_svg("M0,0 L10,0 L10,10 L0,10 Z", FillRule::NonZero).unwrap();
    let ccw = PathSpec::from_svg("M0,0 L0,10 L10,10 L10,0 Z", FillRule::NonZero).unwrap();
    let mut both = cw.path().clone();
    both.extend(ccw.path().iter());
    let combined = PathSpec::new(both, FillRule::NonZero);
    assert!(boolean(&[&combined], BoolOp::Union, 0.1).is_empty());
}

#[test]
fn degenerate_inputs_do_not_panic() {
    let line = PathSpec::from_svg("M0,0 L10,10", FillRule::NonZero).unwrap();
    let point = PathSpec::from_svg("M5,5 Z", FillRule::NonZero).unwrap();
    let nan = PathSpec::polygon(
        &[
            Point::new(f64::NAN, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ],
        FillRule::NonZero,
    );
    assert!(boolean(&[&line, &point], BoolOp::Union, 0.1).is_empty());
    assert!(boolean(&[&nan], BoolOp::Union, 0.1).is_empty());
}

#[test]
fn interval_subtraction() {
    assert_eq!(
        subtract_intervals(&[(0.0, 10.0)], &[(2.0, 4.0), (6.0, 12.0)]),
        vec![(0.0, 2.0), (4.0, 6.0)]
    );
    assert!(subtract_intervals(&[(0.0, 1.0)], &[(0.0, 1.0)]).is_empty());
}
