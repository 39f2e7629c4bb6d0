use super::*;

#[test]
fn fingerprint_is_stable_for_same_input() {
    let run = || {
        let mut h = StableHasher::new();
        h.write_str("hatch");
        h.write_u8(2);
        h.write_f64(1.5);
        h.finish()
    };
    assert_eq!(run(), run());
}

#[test]
fn length_prefix_separates_adjacent_strings() {
    let mut a = StableHasher::new();
    a.write_str("ab");
    a.write_str("c");
    let mut b = StableHasher::new();
    b.write_str("a");
    b.write_str("bc");
    assert_ne!(a.finish(), b.finish());
}

#[test]
fn display_is_32_hex_digits() {
    let fp = Fingerprint { hi: 1, lo: 2 };
    let s = fp.to_string();
    assert_eq!(s.len(), 32);
    assert!(s.ends_with('2'));
}
