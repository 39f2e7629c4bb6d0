use super::*;

fn encode(r: &EmfRecord) -> Vec<u8> {
    let mut out = Vec::new();
    r.write(&mut out);
    out
}

fn u32_at(b: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([b[at], b[at + 1], b[at + 2], b[at + 3]])
}

#[test]
fn every_record_encodes_its_declared_size() {
    let recs = vec![
        EmfRecord::SetMapMode(MM_ANISOTROPIC),
        EmfRecord::SetWindowExtEx(160, 160),
        EmfRecord::SetPolyFillMode(PolyFillMode::Alternate),
        EmfRecord::CreateBrushIndirect {
            handle: 1,
            style: BS_SOLID,
            color: 0x00ff_0000,
        },
        EmfRecord::CreatePen {
            handle: 2,
            style: PS_SOLID,
            width: 16,
            color: 0,
        },
        EmfRecord::SaveDc,
        EmfRecord::RestoreDc(-1),
        EmfRecord::MoveToEx(0, 0),
        EmfRecord::PolyBezierTo {
            bounds: RectL::default(),
            points: Points::from_logical(&[(1, 1), (2, 2), (3, 3)]),
        },
        EmfRecord::PolyPolygon {
            bounds: RectL::default(),
            counts: vec![3],
            points: Points::from_logical(&[(0, 0), (100_000, 0), (0, 100_000)]),
        },
        EmfRecord::AlphaBlend {
            bounds: RectL::default(),
            dest: (0, 0, 32, 32),
            width: 2,
            height: 2,
            bgra: vec![0; 16],
        },
        EmfRecord::Eof,
    ];
    for r in &recs {
        let bytes = encode(r);
        assert_eq!(bytes.len(), r.size() as usize, "{r:?}");
        assert_eq!(u32_at(&bytes, 0), r.record_type());
        assert_eq!(u32_at(&bytes, 4), r.size());
        assert_eq!(bytes.len() % 4, 0);
    }
}

#[test]
fn points_pick_16_bit_records_when_they_fit() {
    let short = EmfRecord::PolyPolygon {
        bounds: RectL::default(),
        counts: vec![3],
        points: Points::from_logical(&[(0, 0), (10, 0), (0, 10)]),
    };
    let long = EmfRecord::PolyPolygon {
        bounds: RectL::default(),
        counts: vec![3],
        points: Points::from_logical(&[(0, 0), (40_000, 0), (0, 10)]),
    };
    assert_eq!(short.record_type(), EMR_POLYPOLYGON16);
    assert_eq!(long.record_type(), EMR_POLYPOLYGON);
    assert_eq!(long.size() - short.size(), 3 * 4);
}

#[test]
fn alpha_blend_carries_a_top_down_32bpp_header() {
    let r = EmfRecord::AlphaBlend {
        bounds: RectL::default(),
        dest: (0, 0, 16, 16),
        width: 1,
        height: 1,
        bgra: vec![1, 2, 3, 4],
    };
    let b = encode(&r);
    // offBmiSrc / offBitsSrc
    assert_eq!(u32_at(&b, 84), 108);
    assert_eq!(u32_at(&b, 92), 148);
    assert_eq!(u32_at(&b, 108), 40);
    assert_eq!(i32::from_le_bytes([b[116], b[117], b[118], b[119]]), -1);
    assert_eq!(&b[148..152], &[1, 2, 3, 4]);
}
