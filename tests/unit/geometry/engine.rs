use super::*;
use crate::foundation::core::Point;
use crate::geometry::path::FillRule;

fn engines() -> Vec<Box<dyn GeometryEngine>> {
    vec![
        create_engine(GeometryBackend::Flattening, 0.05),
        create_engine(GeometryBackend::CurvePreserving, 0.05),
    ]
}

fn within(inner: Rect, outer: Rect) -> bool {
    const E: f64 = 1e-6;
    inner.x0 >= outer.x0 - E
        && inner.y0 >= outer.y0 - E
        && inner.x1 <= outer.x1 + E
        && inner.y1 <= outer.y1 + E
}

#[test]
fn intersect_without_clips_is_identity() {
    let circle = PathSpec::circle(Point::new(5.0, 5.0), 5.0, 0.1);
    for e in engines() {
        assert_eq!(e.intersect(&circle, &[]), circle);
    }
}

#[test]
fn intersection_bounds_never_exceed_inputs() {
    let cases = [
        (
            PathSpec::circle(Point::new(0.0, 0.0), 10.0, 0.1),
            PathSpec::rect(Rect::new(-3.0, -20.0, 30.0, 4.0)),
        ),
        (
            PathSpec::rect(Rect::new(0.0, 0.0, 10.0, 10.0)),
            PathSpec::circle(Point::new(10.0, 10.0), 6.0, 0.1),
        ),
        (
            PathSpec::from_svg("M0,0 L40,5 L20,30 Z", FillRule::EvenOdd).unwrap(),
            PathSpec::ellipse(Rect::new(10.0, 2.0, 50.0, 12.0), 0.1),
        ),
    ];
    for e in engines() {
        for (a, b) in &cases {
            let r = e.intersect(a, std::slice::from_ref(b));
            assert!(!r.is_empty());
            assert!(within(r.bounds(), a.bounds()));
            assert!(within(r.bounds(), b.bounds()));
        }
    }
}

#[test]
fn curve_preserving_keeps_curves_inside_covering_rect() {
    let circle = PathSpec::circle(Point::new(5.0, 5.0), 4.0, 0.1);
    let cover = PathSpec::rect(Rect::new(0.0, 0.0, 10.0, 10.0));

    let exact = create_engine(GeometryBackend::CurvePreserving, 0.1);
    let r = exact.intersect(&circle, std::slice::from_ref(&cover));
    assert!(r.has_curves());
    assert_eq!(r, circle);

    let flat = create_engine(GeometryBackend::Flattening, 0.1);
    let r = flat.intersect(&circle, std::slice::from_ref(&cover));
    assert!(!r.has_curves());
    assert_eq!(r.fill_rule(), FillRule::NonZero);
}

#[test]
fn union_of_disjoint_paths_concatenates_when_preserving() {
    let a = PathSpec::circle(Point::new(0.0, 0.0), 1.0, 0.1);
    let b = PathSpec::circle(Point::new(10.0, 0.0), 1.0, 0.1);
    let exact = create_engine(GeometryBackend::CurvePreserving, 0.1);
    let u = exact.union(&[a.clone(), b.clone()]);
    assert!(u.has_curves());
    assert_eq!(u.bounds(), a.bounds().union(b.bounds()));
}

#[test]
fn difference_with_distant_clip_is_identity() {
    let a = PathSpec::rect(Rect::new(0.0, 0.0, 10.0, 10.0));
    let far = PathSpec::rect(Rect::new(50.0, 50.0, 60.0, 60.0));
    for e in engines() {
        let r = e.difference(&a, std::slice::from_ref(&far));
        assert_eq!(r.bounds(), a.bounds());
    }
}

#[test]
fn transform_rejects_non_finite_matrix() {
    let a = PathSpec::rect(Rect::new(0.0, 0.0, 1.0, 1.0));
    assert!(transform(&a, Affine::new([f64::NAN, 0.0, 0.0, 1.0, 0.0, 0.0])).is_empty());
    assert_eq!(
        bounds(&transform(&a, Affine::scale(3.0))),
        Rect::new(0.0, 0.0, 3.0, 3.0)
    );
}

#[test]
fn axis_rect_detection() {
    assert_eq!(
        axis_rect(&PathSpec::rect(Rect::new(1.0, 2.0, 3.0, 4.0))),
        Some(Rect::new(1.0, 2.0, 3.0, 4.0))
    );
    let tri = PathSpec::from_svg("M0,0 L10,0 L0,10 Z", FillRule::NonZero).unwrap();
    assert_eq!(axis_rect(&tri), None);
}

fn cancelling_square() -> PathSpec {
    PathSpec::from_svg(
        "M0 0 L10 0 L10 10 L0 10 Z M0 0 L0 10 L10 10 L10 0 Z",
        FillRule::NonZero,
    )
    .unwrap()
}

#[test]
fn encloses_area_follows_the_fill_rule() {
    assert!(encloses_area(&PathSpec::rect(Rect::new(0.0, 0.0, 2.0, 2.0)), 0.1));
    assert!(!encloses_area(&cancelling_square(), 0.1));
    assert!(!encloses_area(&PathSpec::empty(), 0.1));
    // Opposite lobes: zero net signed area, but both lobes are inside under non-zero.
    let bowtie = PathSpec::from_svg("M0 0 L10 10 L10 0 L0 10 Z", FillRule::NonZero).unwrap();
    assert!(encloses_area(&bowtie, 0.1));
    let doubled = PathSpec::from_svg(
        "M0 0 L10 0 L10 10 L0 10 Z M0 0 L10 0 L10 10 L0 10 Z",
        FillRule::EvenOdd,
    )
    .unwrap();
    assert!(!encloses_area(&doubled, 0.1));
}

#[test]
fn cancelling_windings_never_pass_through() {
    let subject = cancelling_square();
    let cover = PathSpec::rect(Rect::new(-5.0, -5.0, 20.0, 20.0));
    let far = PathSpec::rect(Rect::new(50.0, 50.0, 60.0, 60.0));
    for e in engines() {
        assert!(e.intersect(&subject, std::slice::from_ref(&cover)).is_empty());
        assert!(e.intersect(&cover, std::slice::from_ref(&subject)).is_empty());
        assert!(e.union(std::slice::from_ref(&subject)).is_empty());
        assert!(e.difference(&subject, std::slice::from_ref(&far)).is_empty());
    }
}
