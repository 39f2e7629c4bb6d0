use super::*;

fn area(paths: &[PathSpec]) -> f64 {
    use kurbo::Shape as _;
    paths.iter().map(|p| p.path().area().abs()).sum()
}

#[test]
fn keys_quantize_scale_and_rotation() {
    let a = PatternParams::new(PatternKind::Dot, Density::Dense).with_rotation(370.0);
    let b = PatternParams::new(PatternKind::Dot, Density::Dense)
        .with_rotation(10.000_001)
        .with_scale(1.000_01);
    assert_eq!(a.key(), b.key());
    assert_eq!(a.key().rotation(), 10.0);
    let bad = PatternParams::new(PatternKind::Dot, Density::Dense).with_scale(f64::NAN);
    assert_eq!(bad.key().scale(), 1.0);
}

#[test]
fn tiny_scales_are_floored() {
    let tiny = PatternParams::new(PatternKind::Crosshatch, Density::Dense).with_scale(0.001);
    assert_eq!(tiny.key().scale(), MIN_PATTERN_SCALE);
    let entry = PatternCache::new().get_or_create_pattern(&tiny);
    assert!((entry.cell.width() - 4.0 * MIN_PATTERN_SCALE).abs() < 1e-9);
}

#[test]
fn cache_generates_each_key_once() {
    let cache = PatternCache::new();
    let p = PatternParams::new(PatternKind::Hatch, Density::Medium);
    assert!(cache.get(&p).is_none());
    let a = cache.get_or_create_pattern(&p);
    let b = cache.get_or_create_pattern(&p);
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(cache.generated(), 1);
    assert_eq!(cache.len(), 1);

    cache.clear();
    assert!(cache.is_empty());
    let c = cache.get_or_create_pattern(&p);
    assert!(!Arc::ptr_eq(&a, &c));
    assert_eq!(a.document.to_bytes(), c.document.to_bytes());
    assert_eq!(cache.generated(), 2);
}

#[test]
fn cells_scale_with_density() {
    let cache = PatternCache::new();
    let sparse = cache.get_or_create_pattern(&PatternParams::new(PatternKind::Hatch, Density::Sparse));
    let dense = cache.get_or_create_pattern(&PatternParams::new(PatternKind::Hatch, Density::Dense));
    assert_eq!(sparse.cell, Rect::new(0.0, 0.0, 16.0, 16.0));
    assert_eq!(dense.cell, Rect::new(0.0, 0.0, 4.0, 4.0));
    // band of width s/8 across the cell
    assert!((area(&sparse.geometry) - 32.0).abs() < 1e-6);
}

#[test]
fn every_kind_stays_inside_its_cell() {
    for kind in [
        PatternKind::Hatch,
        PatternKind::Crosshatch,
        PatternKind::Diagonal,
        PatternKind::Dot,
        PatternKind::Grid,
        PatternKind::Brick,
    ] {
        for rotation in [0.0, 30.0] {
            let geo = cell_geometry(kind, 8.0, rotation);
            assert!(!geo.is_empty(), "{kind:?}");
            for p in &geo {
                let b = p.bounds();
                assert!(b.x0 >= -1e-9 && b.y0 >= -1e-9, "{kind:?} {b:?}");
                assert!(b.x1 <= 8.0 + 1e-9 && b.y1 <= 8.0 + 1e-9, "{kind:?} {b:?}");
            }
        }
    }
}

#[test]
fn diagonal_band_has_the_expected_width() {
    let geo = cell_geometry(PatternKind::Diagonal, 8.0, 0.0);
    // band of width 1 along the cell diagonal, wrapped: length 8*sqrt(2)
    let expected = 8.0 * std::f64::consts::SQRT_2;
    assert!((area(&geo) - expected).abs() < 0.05, "{}", area(&geo));
}
