use super::*;
use crate::emf::emitter::EmfBuilder;

fn u32_at(b: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([b[at], b[at + 1], b[at + 2], b[at + 3]])
}

#[test]
fn header_describes_the_whole_file() {
    let doc = EmfBuilder::new(Rect::new(0.0, 0.0, 20.0, 10.0)).finish();
    let bytes = doc.to_bytes();
    assert_eq!(u32_at(&bytes, 0), 1);
    assert_eq!(u32_at(&bytes, 4), 108);
    assert_eq!(u32_at(&bytes, 40), 0x464D_4520);
    assert_eq!(u32_at(&bytes, 48) as usize, bytes.len());
    assert_eq!(u32_at(&bytes, 52) as usize, doc.record_count());
    // inclusive device bounds
    assert_eq!(u32_at(&bytes, 16), 19);
    assert_eq!(u32_at(&bytes, 20), 9);
    // last record is EOF
    assert_eq!(u32_at(&bytes, bytes.len() - 20), 14);
    assert!(!doc.has_raster());
}

#[test]
fn device_rect_is_inclusive_and_never_inverted() {
    assert_eq!(
        device_rect(Rect::new(0.5, 1.0, 10.2, 4.0)),
        RectL {
            left: 0,
            top: 1,
            right: 10,
            bottom: 3
        }
    );
    let empty = device_rect(Rect::ZERO);
    assert!(empty.right >= empty.left && empty.bottom >= empty.top);
    let nan = device_rect(Rect::new(f64::NAN, 0.0, 1.0, 1.0));
    assert_eq!(nan.left, 0);
}

#[test]
fn fingerprint_follows_content() {
    let a = EmfBuilder::new(Rect::new(0.0, 0.0, 4.0, 4.0)).finish();
    let b = EmfBuilder::new(Rect::new(0.0, 0.0, 4.0, 4.0)).finish();
    let c = EmfBuilder::new(Rect::new(0.0, 0.0, 5.0, 4.0)).finish();
    assert_eq!(a.fingerprint(), b.fingerprint());
    assert_ne!(a.fingerprint(), c.fingerprint());
}
