use super::*;
use crate::foundation::core::Point;
use crate::geometry::{FlatteningEngine, GeometryBackend, create_engine};

fn square() -> PathSpec {
    PathSpec::rect(Rect::new(0.0, 0.0, 10.0, 10.0))
}

fn engine() -> Box<dyn GeometryEngine> {
    create_engine(GeometryBackend::CurvePreserving, 0.1)
}

fn assert_rect_near(a: Rect, b: Rect, eps: f64) {
    for (x, y) in [(a.x0, b.x0), (a.y0, b.y0), (a.x1, b.x1), (a.y1, b.y1)] {
        assert!((x - y).abs() < eps, "{a:?} vs {b:?}");
    }
}

#[test]
fn covering_children_keep_subject_bounds() {
    let clip = ClipDefinition::new(vec![
        PathSpec::rect(Rect::new(-5.0, -5.0, 6.0, 15.0)),
        PathSpec::rect(Rect::new(5.0, -5.0, 15.0, 15.0)),
    ]);
    let out = resolve(&square(), &clip, Affine::IDENTITY, engine().as_ref()).unwrap();
    assert_rect_near(out.bounds(), square().bounds(), 1e-6);
}

#[test]
fn disjoint_circle_removes_the_element() {
    let clip = ClipDefinition::new(vec![PathSpec::circle(Point::new(50.0, 50.0), 5.0, 0.1)]);
    assert!(resolve(&square(), &clip, Affine::IDENTITY, engine().as_ref()).is_none());
    let empty = ClipDefinition::new(Vec::new());
    assert!(resolve(&square(), &empty, Affine::IDENTITY, engine().as_ref()).is_none());
}

#[test]
fn bbox_units_map_the_unit_square_onto_the_element() {
    let subject = PathSpec::rect(Rect::new(10.0, 20.0, 30.0, 60.0));
    let clip = ClipDefinition::new(vec![PathSpec::rect(Rect::new(0.0, 0.0, 0.5, 0.5))])
        .with_units(UnitsMode::ObjectBoundingBox);
    let out = resolve(&subject, &clip, Affine::IDENTITY, &FlatteningEngine::new(0.1)).unwrap();
    assert_rect_near(out.bounds(), Rect::new(10.0, 20.0, 20.0, 40.0), 1e-6);
}

#[test]
fn user_space_clip_follows_the_cumulative_transform() {
    let xf = Affine::translate((100.0, 0.0));
    let doc_subject = square().transformed(xf);
    let clip = ClipDefinition::new(vec![PathSpec::rect(Rect::new(0.0, 0.0, 5.0, 10.0))]);
    let out = resolve(&doc_subject, &clip, xf, engine().as_ref()).unwrap();
    assert_rect_near(out.bounds(), Rect::new(100.0, 0.0, 105.0, 10.0), 1e-6);
}

#[test]
fn bbox_is_measured_in_user_space() {
    let xf = Affine::scale(2.0);
    let doc_subject = square().transformed(xf);
    let clip = ClipDefinition::new(vec![PathSpec::rect(Rect::new(0.0, 0.0, 1.0, 0.5))])
        .with_units(UnitsMode::ObjectBoundingBox);
    let out = resolve(&doc_subject, &clip, xf, engine().as_ref()).unwrap();
    assert_rect_near(out.bounds(), Rect::new(0.0, 0.0, 20.0, 10.0), 1e-6);
}

#[test]
fn singular_transform_is_fully_clipped() {
    let clip = ClipDefinition::new(vec![square()]);
    assert!(resolve(&square(), &clip, Affine::scale(0.0), engine().as_ref()).is_none());
}

#[test]
fn nested_references_intersect_every_level() {
    let mut lib = ClipLibrary::new();
    lib.insert(
        "outer",
        ClipDefinition::new(vec![PathSpec::rect(Rect::new(0.0, 0.0, 6.0, 10.0))])
            .with_clip_ref("inner"),
    );
    lib.insert(
        "inner",
        ClipDefinition::new(vec![PathSpec::rect(Rect::new(0.0, 0.0, 10.0, 4.0))]),
    );
    let (outcome, diags) =
        resolve_reference(&square(), "outer", &lib, Affine::IDENTITY, engine().as_ref());
    assert!(diags.is_empty());
    let ClipOutcome::Clipped(p) = outcome else {
        panic!("expected clipped geometry, got {outcome:?}");
    };
    assert_rect_near(p.bounds(), Rect::new(0.0, 0.0, 6.0, 4.0), 1e-6);
}

#[test]
fn dangling_reference_is_no_clipping() {
    let lib = ClipLibrary::new();
    let (outcome, diags) =
        resolve_reference(&square(), "missing", &lib, Affine::IDENTITY, engine().as_ref());
    assert_eq!(outcome, ClipOutcome::Unclipped);
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].kind, DiagnosticKind::DanglingReference);
}

#[test]
fn cycle_is_cut_at_the_repeated_reference() {
    let mut lib = ClipLibrary::new();
    lib.insert(
        "a",
        ClipDefinition::new(vec![PathSpec::rect(Rect::new(0.0, 0.0, 5.0, 10.0))])
            .with_clip_ref("b"),
    );
    lib.insert("b", ClipDefinition::new(vec![square()]).with_clip_ref("a"));
    let chain = follow_chain("a", &lib);
    assert_eq!(chain.levels.len(), 2);
    assert_eq!(chain.diagnostics[0].kind, DiagnosticKind::ReferenceCycle);

    let (outcome, _) = resolve_reference(&square(), "a", &lib, Affine::IDENTITY, engine().as_ref());
    let ClipOutcome::Clipped(p) = outcome else {
        panic!("expected clipped geometry, got {outcome:?}");
    };
    assert_rect_near(p.bounds(), Rect::new(0.0, 0.0, 5.0, 10.0), 1e-6);
}
