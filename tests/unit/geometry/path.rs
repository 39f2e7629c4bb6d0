use super::*;

#[test]
fn rect_bounds_and_segments() {
    let p = PathSpec::rect(Rect::new(0.0, 0.0, 10.0, 5.0));
    assert_eq!(p.bounds(), Rect::new(0.0, 0.0, 10.0, 5.0));
    assert!(p.segment_count() >= 4);
    assert!(!p.is_empty());
    assert!(!p.has_curves());
}

#[test]
fn empty_path_has_zero_bounds() {
    let p = PathSpec::empty();
    assert!(p.is_empty());
    assert_eq!(p.bounds(), Rect::ZERO);

    let mut b = PathBuilder::new(FillRule::NonZero);
    b.move_to((3.0, 3.0));
    assert!(b.build().is_empty());
}

#[test]
fn svg_parse_keeps_fill_rule() {
    let p = PathSpec::from_svg("M0,0 L10,0 L10,10 Z", FillRule::EvenOdd).unwrap();
    assert_eq!(p.fill_rule(), FillRule::EvenOdd);
    assert!(PathSpec::from_svg("M0,0 Lx", FillRule::NonZero).is_err());
}

#[test]
fn arcs_lower_to_cubics() {
    let mut b = PathBuilder::new(FillRule::NonZero);
    b.move_to((0.0, 0.0))
        .arc_to(Vec2::new(5.0, 5.0), 0.0, false, true, (10.0, 0.0))
        .close();
    let p = b.build();
    assert!(p.has_curves());
    let bb = p.bounds();
    assert!((bb.width() - 10.0).abs() < 0.05);
    assert!((bb.height() - 5.0).abs() < 0.05);
}

#[test]
fn zero_radius_arc_becomes_line() {
    let mut b = PathBuilder::new(FillRule::NonZero);
    b.move_to((0.0, 0.0))
        .arc_to(Vec2::new(0.0, 0.0), 0.0, false, true, (10.0, 0.0));
    let p = b.build();
    assert!(!p.has_curves());
    assert_eq!(p.segment_count(), 1);
}

#[test]
fn flatten_closes_open_subpaths_and_drops_slivers() {
    let p = PathSpec::from_svg("M0,0 L10,0 L10,10 M20,20 L30,30", FillRule::NonZero).unwrap();
    let contours = p.flatten(0.1);
    assert_eq!(contours.len(), 1);
    assert_eq!(contours[0].len(), 3);
}

#[test]
fn transformed_maps_bounds() {
    let p = PathSpec::rect(Rect::new(0.0, 0.0, 1.0, 1.0))
        .transformed(Affine::translate((5.0, 5.0)) * Affine::scale(2.0));
    assert_eq!(p.bounds(), Rect::new(5.0, 5.0, 7.0, 7.0));
}

#[test]
fn evenodd_and_nonzero_disagree_on_even_winding() {
    assert!(FillRule::NonZero.is_inside(2));
    assert!(!FillRule::EvenOdd.is_inside(2));
    assert!(FillRule::EvenOdd.is_inside(-1));
}

#[test]
fn wire_form_is_svg_path_data() {
    let p: PathSpec =
        serde_json::from_str(r#"{ "d": "M0 0 L4 0 L4 4 Z", "fill_rule": "evenodd" }"#).unwrap();
    assert_eq!(p.fill_rule(), FillRule::EvenOdd);
    assert_eq!(p.bounds(), Rect::new(0.0, 0.0, 4.0, 4.0));

    let json = serde_json::to_value(&p).unwrap();
    assert!(json["d"].as_str().unwrap().starts_with('M'));
    assert!(serde_json::from_str::<PathSpec>(r#"{ "d": "M0 0 Q" }"#).is_err());
}
