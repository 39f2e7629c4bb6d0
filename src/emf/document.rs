use crate::emf::records::{EMR_HEADER, EmfRecord, RectL, put_i32, put_u32};
use crate::foundation::core::Rect;
use crate::foundation::hash::{Fingerprint, StableHasher};

/// Logical units per device pixel (user unit).
pub const LOGICAL_PER_PX: f64 = 16.0;

const HEADER_SIZE: u32 = 108;
const SIGNATURE: u32 = 0x464D_4520;
const VERSION: u32 = 0x0001_0000;
// Reference device: 1920x1080 px at 96 dpi.
const DEVICE_PX: (i32, i32) = (1920, 1080);
const DEVICE_MM: (i32, i32) = (508, 286);
const DEVICE_UM: (u32, u32) = (508_000, 285_750);

/// An encoded-on-demand enhanced metafile: header bounds plus ordered records.
///
/// Documents are immutable once built; [`to_bytes`](Self::to_bytes) is a pure function of the
/// record list, so identical drawing input yields byte-identical output.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EmfDocument {
    bounds: Rect,
    handles: u16,
    records: Vec<EmfRecord>,
}

impl EmfDocument {
    pub(crate) fn from_parts(bounds: Rect, handles: u16, records: Vec<EmfRecord>) -> Self {
        Self {
            bounds,
            handles,
            records,
        }
    }

    /// Device bounds in user units (1 unit = 1 px at 96 dpi).
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Records after the header, ending with EOF.
    pub fn records(&self) -> &[EmfRecord] {
        &self.records
    }

    /// Record count including header and EOF.
    pub fn record_count(&self) -> usize {
        self.records.len() + 1
    }

    /// `true` when the document contains an alpha-blended bitmap.
    pub fn has_raster(&self) -> bool {
        self.records
            .iter()
            .any(|r| matches!(r, EmfRecord::AlphaBlend { .. }))
    }

    /// Total encoded size.
    pub fn byte_len(&self) -> u32 {
        HEADER_SIZE + self.records.iter().map(EmfRecord::size).sum::<u32>()
    }

    /// Encode the complete metafile.
    pub fn to_bytes(&self) -> Vec<u8> {
        let total = self.byte_len();
        let mut out = Vec::with_capacity(total as usize);
        self.write_header(&mut out, total);
        for r in &self.records {
            r.write(&mut out);
        }
        out
    }

    /// Content fingerprint of the encoded bytes.
    pub fn fingerprint(&self) -> Fingerprint {
        let mut h = StableHasher::new();
        h.write_bytes(&self.to_bytes());
        h.finish()
    }

    fn write_header(&self, out: &mut Vec<u8>, total: u32) {
        let px = device_rect(self.bounds);
        // .01 mm per px at 96 dpi: 2540 / 96.
        let frame = RectL {
            left: (f64::from(px.left) * 2540.0 / 96.0).round() as i32,
            top: (f64::from(px.top) * 2540.0 / 96.0).round() as i32,
            right: (f64::from(px.right) * 2540.0 / 96.0).round() as i32,
            bottom: (f64::from(px.bottom) * 2540.0 / 96.0).round() as i32,
        };
        put_u32(out, EMR_HEADER);
        put_u32(out, HEADER_SIZE);
        for v in [px.left, px.top, px.right, px.bottom] {
            put_i32(out, v);
        }
        for v in [frame.left, frame.top, frame.right, frame.bottom] {
            put_i32(out, v);
        }
        put_u32(out, SIGNATURE);
        put_u32(out, VERSION);
        put_u32(out, total);
        put_u32(out, self.record_count() as u32);
        out.extend_from_slice(&self.handles.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        put_u32(out, 0); // description length
        put_u32(out, 0); // description offset
        put_u32(out, 0); // palette entries
        put_i32(out, DEVICE_PX.0);
        put_i32(out, DEVICE_PX.1);
        put_i32(out, DEVICE_MM.0);
        put_i32(out, DEVICE_MM.1);
        put_u32(out, 0); // pixel format size
        put_u32(out, 0); // pixel format offset
        put_u32(out, 0); // no OpenGL
        put_u32(out, DEVICE_UM.0);
        put_u32(out, DEVICE_UM.1);
    }
}

/// Inclusive integer pixel rectangle covering `r`.
pub(crate) fn device_rect(r: Rect) -> RectL {
    let clamp = |v: f64| {
        if v.is_finite() {
            v.clamp(i32::MIN as f64 / 32.0, i32::MAX as f64 / 32.0)
        } else {
            0.0
        }
    };
    let left = clamp(r.x0).floor() as i32;
    let top = clamp(r.y0).floor() as i32;
    let right = (clamp(r.x1).ceil() as i32 - 1).max(left);
    let bottom = (clamp(r.y1).ceil() as i32 - 1).max(top);
    RectL {
        left,
        top,
        right,
        bottom,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/emf/document.rs"]
mod tests;
