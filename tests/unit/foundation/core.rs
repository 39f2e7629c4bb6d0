use super::*;

#[test]
fn hex_colors_parse_with_and_without_alpha() {
    assert_eq!(Rgba8::from_hex("#ff8000").unwrap(), Rgba8::rgb(255, 128, 0));
    assert_eq!(
        Rgba8::from_hex("10203040").unwrap(),
        Rgba8::rgba(0x10, 0x20, 0x30, 0x40)
    );
    assert!(Rgba8::from_hex("#fff").is_err());
    assert!(Rgba8::from_hex("#zzzzzz").is_err());
}

#[test]
fn colorref_is_bgr_ordered() {
    assert_eq!(Rgba8::rgb(0x11, 0x22, 0x33).to_colorref(), 0x0033_2211);
}

#[test]
fn premul_scales_channels_by_alpha() {
    assert_eq!(Rgba8::rgba(255, 128, 0, 128).to_premul(), [128, 64, 0, 128]);
    assert_eq!(Rgba8::rgba(200, 200, 200, 0).to_premul(), [0, 0, 0, 0]);
}

#[test]
fn rect_overlap_requires_positive_area() {
    let a = Rect::new(0.0, 0.0, 10.0, 10.0);
    assert!(rects_overlap(a, Rect::new(5.0, 5.0, 15.0, 15.0)));
    assert!(!rects_overlap(a, Rect::new(10.0, 0.0, 20.0, 10.0)));
    assert!(rect_contains_rect(a, Rect::new(1.0, 1.0, 9.0, 9.0)));
    assert!(!rect_contains_rect(a, Rect::new(1.0, 1.0, 11.0, 9.0)));
}
