use super::*;

fn square() -> PathSpec {
    PathSpec::rect(Rect::new(0.0, 0.0, 10.0, 10.0))
}

fn assert_rect_near(a: Rect, b: Rect) {
    for (x, y) in [(a.x0, b.x0), (a.y0, b.y0), (a.x1, b.x1), (a.y1, b.y1)] {
        assert!((x - y).abs() < 1e-6, "{a:?} vs {b:?}");
    }
}

fn count(doc: &EmfDocument, f: impl Fn(&EmfRecord) -> bool) -> usize {
    doc.records().iter().filter(|r| f(r)).count()
}

#[test]
fn polygonal_fill_uses_a_poly_polygon() {
    let doc = emit_paths(&[square()], &ShapeStyle::filled(Rgba8::rgb(255, 0, 0)));
    assert_eq!(count(&doc, |r| matches!(r, EmfRecord::PolyPolygon { .. })), 1);
    assert_eq!(count(&doc, |r| matches!(r, EmfRecord::BeginPath)), 0);
    assert!(doc.records().contains(&EmfRecord::CreateBrushIndirect {
        handle: 1,
        style: BS_SOLID,
        color: 0x0000_00ff,
    }));
    assert!(doc.records().contains(&EmfRecord::DeleteObject(1)));
    assert_eq!(doc.bounds(), Rect::new(0.0, 0.0, 10.0, 10.0));
}

#[test]
fn curves_stay_bezier_inside_a_path_bracket() {
    let circle = PathSpec::circle(Point::new(5.0, 5.0), 5.0, 0.1);
    let style = ShapeStyle {
        stroke: Some(StrokeStyle::solid(Rgba8::BLACK, 1.0)),
        ..ShapeStyle::default()
    };
    let doc = emit_paths(&[circle], &style);
    assert!(count(&doc, |r| matches!(r, EmfRecord::PolyBezierTo { .. })) >= 1);
    assert_eq!(count(&doc, |r| matches!(r, EmfRecord::StrokeAndFillPath(_))), 1);
    assert_rect_near(doc.bounds(), Rect::new(-0.5, -0.5, 10.5, 10.5));
}

#[test]
fn dashed_stroke_is_emitted_as_dash_segments() {
    let style = ShapeStyle {
        fill: None,
        stroke: Some(StrokeStyle::dashed(Rgba8::BLACK, 1.0, vec![2.0, 2.0])),
        opacity: 1.0,
    };
    let doc = emit_paths(&[square()], &style);
    let moves = count(&doc, |r| matches!(r, EmfRecord::MoveToEx(..)));
    assert!(moves >= 5, "expected one subpath per dash, got {moves}");
    assert_eq!(count(&doc, |r| matches!(r, EmfRecord::StrokePath(_))), 1);
}

#[test]
fn identical_input_is_byte_identical() {
    let style = ShapeStyle::filled(Rgba8::rgb(1, 2, 3));
    let a = emit_paths(&[square()], &style).to_bytes();
    let b = emit_paths(&[square()], &style).to_bytes();
    assert_eq!(a, b);
}

#[test]
fn raster_block_swizzles_to_bgra() {
    let img = image::RgbaImage::from_raw(1, 1, vec![10, 20, 30, 255]).unwrap();
    let doc = emit_raster_block(&img, Rect::new(0.0, 0.0, 4.0, 4.0)).unwrap();
    assert!(doc.has_raster());
    let blend = doc
        .records()
        .iter()
        .find_map(|r| match r {
            EmfRecord::AlphaBlend { bgra, dest, .. } => Some((bgra.clone(), *dest)),
            _ => None,
        })
        .unwrap();
    assert_eq!(blend.0, vec![30, 20, 10, 255]);
    assert_eq!(blend.1, (0, 0, 64, 64));

    let empty = image::RgbaImage::new(0, 0);
    assert!(emit_raster_block(&empty, Rect::new(0.0, 0.0, 1.0, 1.0)).is_err());
    assert!(emit_raster_block(&img, Rect::ZERO).is_err());
}

#[test]
fn clipped_emission_selects_the_clip_path() {
    let clip = PathSpec::circle(Point::new(5.0, 5.0), 4.0, 0.1);
    let doc = emit_clipped(&[clip], &[], &[square()], &ShapeStyle::default()).unwrap();
    let recs = doc.records();
    let save = recs.iter().position(|r| *r == EmfRecord::SaveDc).unwrap();
    let select = recs
        .iter()
        .position(|r| *r == EmfRecord::SelectClipPath(RGN_COPY))
        .unwrap();
    let restore = recs.iter().position(|r| *r == EmfRecord::RestoreDc(-1)).unwrap();
    assert!(save < select && select < restore);
    assert_rect_near(doc.bounds(), Rect::new(1.0, 1.0, 9.0, 9.0));
}

#[test]
fn clip_children_are_ored_and_nested_regions_anded() {
    let a = PathSpec::rect(Rect::new(0.0, 0.0, 4.0, 10.0));
    let b = PathSpec::rect(Rect::new(6.0, 0.0, 10.0, 10.0));
    let nested = PathSpec::rect(Rect::new(0.0, 0.0, 10.0, 5.0));
    let doc = emit_clipped(&[a, b], &[nested], &[square()], &ShapeStyle::default()).unwrap();
    let modes: Vec<u32> = doc
        .records()
        .iter()
        .filter_map(|r| match r {
            EmfRecord::SelectClipPath(m) => Some(*m),
            _ => None,
        })
        .collect();
    assert_eq!(modes, vec![RGN_COPY, RGN_OR, RGN_AND]);
    assert_rect_near(doc.bounds(), Rect::new(0.0, 0.0, 10.0, 5.0));
}

#[test]
fn clip_outside_the_drawing_is_an_error() {
    let far = PathSpec::circle(Point::new(100.0, 100.0), 5.0, 0.1);
    assert!(emit_clipped(&[far], &[], &[square()], &ShapeStyle::default()).is_err());
    let inside = PathSpec::rect(Rect::new(2.0, 2.0, 8.0, 8.0));
    let away = PathSpec::rect(Rect::new(20.0, 0.0, 30.0, 10.0));
    assert!(emit_clipped(&[inside], &[away], &[square()], &ShapeStyle::default()).is_err());
}
