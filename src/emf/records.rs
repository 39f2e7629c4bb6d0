//! EMF record model and little-endian encoding.
//!
//! Only the subset needed for fallback drawing is modeled: mapping mode setup, solid pens and
//! brushes, poly-polygons, path brackets with Bezier segments, clip paths and alpha-blended
//! 32bpp bitmaps.

pub(crate) const EMR_HEADER: u32 = 1;
pub(crate) const EMR_POLYBEZIERTO: u32 = 5;
pub(crate) const EMR_POLYLINETO: u32 = 6;
pub(crate) const EMR_POLYPOLYGON: u32 = 8;
pub(crate) const EMR_SETWINDOWEXTEX: u32 = 9;
pub(crate) const EMR_SETWINDOWORGEX: u32 = 10;
pub(crate) const EMR_SETVIEWPORTEXTEX: u32 = 11;
pub(crate) const EMR_SETVIEWPORTORGEX: u32 = 12;
pub(crate) const EMR_EOF: u32 = 14;
pub(crate) const EMR_SETMAPMODE: u32 = 17;
pub(crate) const EMR_SETBKMODE: u32 = 18;
pub(crate) const EMR_SETPOLYFILLMODE: u32 = 19;
pub(crate) const EMR_MOVETOEX: u32 = 27;
pub(crate) const EMR_SAVEDC: u32 = 33;
pub(crate) const EMR_RESTOREDC: u32 = 34;
pub(crate) const EMR_SELECTOBJECT: u32 = 37;
pub(crate) const EMR_CREATEPEN: u32 = 38;
pub(crate) const EMR_CREATEBRUSHINDIRECT: u32 = 39;
pub(crate) const EMR_DELETEOBJECT: u32 = 40;
pub(crate) const EMR_BEGINPATH: u32 = 59;
pub(crate) const EMR_ENDPATH: u32 = 60;
pub(crate) const EMR_CLOSEFIGURE: u32 = 61;
pub(crate) const EMR_FILLPATH: u32 = 62;
pub(crate) const EMR_STROKEANDFILLPATH: u32 = 63;
pub(crate) const EMR_STROKEPATH: u32 = 64;
pub(crate) const EMR_SELECTCLIPPATH: u32 = 67;
pub(crate) const EMR_POLYBEZIERTO16: u32 = 88;
pub(crate) const EMR_POLYLINETO16: u32 = 89;
pub(crate) const EMR_POLYPOLYGON16: u32 = 91;
pub(crate) const EMR_ALPHABLEND: u32 = 114;

pub(crate) const MM_ANISOTROPIC: u32 = 8;
pub(crate) const BK_TRANSPARENT: u32 = 1;
pub(crate) const RGN_AND: u32 = 1;
pub(crate) const RGN_OR: u32 = 2;
pub(crate) const RGN_COPY: u32 = 5;
pub(crate) const BS_SOLID: u32 = 0;
pub(crate) const PS_SOLID: u32 = 0;
pub(crate) const NULL_BRUSH: u32 = 0x8000_0005;
pub(crate) const NULL_PEN: u32 = 0x8000_0008;

const ALPHABLEND_FIXED: u32 = 108;
const BITMAPINFOHEADER_SIZE: u32 = 40;

/// Polygon fill mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum PolyFillMode {
    /// Even-odd.
    Alternate = 1,
    /// Non-zero winding.
    Winding = 2,
}

/// Rectangle with inclusive integer edges.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct RectL {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl RectL {
    fn write(&self, out: &mut Vec<u8>) {
        for v in [self.left, self.top, self.right, self.bottom] {
            out.extend_from_slice(&v.to_le_bytes());
        }
    }
}

/// Point list in either 16-bit or 32-bit logical coordinates.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Points {
    Short(Vec<(i16, i16)>),
    Long(Vec<(i32, i32)>),
}

impl Points {
    /// Pick the compact encoding when every coordinate fits.
    pub fn from_logical(points: &[(i32, i32)]) -> Self {
        let fits = |v: i32| i16::try_from(v).is_ok();
        if points.iter().all(|&(x, y)| fits(x) && fits(y)) {
            Self::Short(
                points
                    .iter()
                    .map(|&(x, y)| (x as i16, y as i16))
                    .collect(),
            )
        } else {
            Self::Long(points.to_vec())
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Short(p) => p.len(),
            Self::Long(p) => p.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_short(&self) -> bool {
        matches!(self, Self::Short(_))
    }

    fn byte_len(&self) -> u32 {
        match self {
            Self::Short(p) => p.len() as u32 * 4,
            Self::Long(p) => p.len() as u32 * 8,
        }
    }

    fn write(&self, out: &mut Vec<u8>) {
        match self {
            Self::Short(p) => {
                for &(x, y) in p {
                    out.extend_from_slice(&x.to_le_bytes());
                    out.extend_from_slice(&y.to_le_bytes());
                }
            }
            Self::Long(p) => {
                for &(x, y) in p {
                    out.extend_from_slice(&x.to_le_bytes());
                    out.extend_from_slice(&y.to_le_bytes());
                }
            }
        }
    }
}

/// One drawing record following the header.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum EmfRecord {
    SetMapMode(u32),
    SetWindowOrgEx(i32, i32),
    SetWindowExtEx(i32, i32),
    SetViewportOrgEx(i32, i32),
    SetViewportExtEx(i32, i32),
    SetBkMode(u32),
    SetPolyFillMode(PolyFillMode),
    CreateBrushIndirect {
        handle: u32,
        style: u32,
        color: u32,
    },
    CreatePen {
        handle: u32,
        style: u32,
        width: i32,
        color: u32,
    },
    SelectObject(u32),
    DeleteObject(u32),
    SaveDc,
    RestoreDc(i32),
    BeginPath,
    EndPath,
    CloseFigure,
    MoveToEx(i32, i32),
    PolylineTo {
        bounds: RectL,
        points: Points,
    },
    PolyBezierTo {
        bounds: RectL,
        points: Points,
    },
    FillPath(RectL),
    StrokePath(RectL),
    StrokeAndFillPath(RectL),
    PolyPolygon {
        bounds: RectL,
        counts: Vec<u32>,
        points: Points,
    },
    SelectClipPath(u32),
    /// Top-down premultiplied BGRA bitmap blended into `dest` (x, y, cx, cy; logical units).
    AlphaBlend {
        bounds: RectL,
        dest: (i32, i32, i32, i32),
        width: u32,
        height: u32,
        bgra: Vec<u8>,
    },
    Eof,
}

impl EmfRecord {
    /// Record type number.
    pub fn record_type(&self) -> u32 {
        match self {
            Self::SetMapMode(_) => EMR_SETMAPMODE,
            Self::SetWindowOrgEx(..) => EMR_SETWINDOWORGEX,
            Self::SetWindowExtEx(..) => EMR_SETWINDOWEXTEX,
            Self::SetViewportOrgEx(..) => EMR_SETVIEWPORTORGEX,
            Self::SetViewportExtEx(..) => EMR_SETVIEWPORTEXTEX,
            Self::SetBkMode(_) => EMR_SETBKMODE,
            Self::SetPolyFillMode(_) => EMR_SETPOLYFILLMODE,
            Self::CreateBrushIndirect { .. } => EMR_CREATEBRUSHINDIRECT,
            Self::CreatePen { .. } => EMR_CREATEPEN,
            Self::SelectObject(_) => EMR_SELECTOBJECT,
            Self::DeleteObject(_) => EMR_DELETEOBJECT,
            Self::SaveDc => EMR_SAVEDC,
            Self::RestoreDc(_) => EMR_RESTOREDC,
            Self::BeginPath => EMR_BEGINPATH,
            Self::EndPath => EMR_ENDPATH,
            Self::CloseFigure => EMR_CLOSEFIGURE,
            Self::MoveToEx(..) => EMR_MOVETOEX,
            Self::PolylineTo { points, .. } => {
                if points.is_short() {
                    EMR_POLYLINETO16
                } else {
                    EMR_POLYLINETO
                }
            }
            Self::PolyBezierTo { points, .. } => {
                if points.is_short() {
                    EMR_POLYBEZIERTO16
                } else {
                    EMR_POLYBEZIERTO
                }
            }
            Self::FillPath(_) => EMR_FILLPATH,
            Self::StrokePath(_) => EMR_STROKEPATH,
            Self::StrokeAndFillPath(_) => EMR_STROKEANDFILLPATH,
            Self::PolyPolygon { points, .. } => {
                if points.is_short() {
                    EMR_POLYPOLYGON16
                } else {
                    EMR_POLYPOLYGON
                }
            }
            Self::SelectClipPath(_) => EMR_SELECTCLIPPATH,
            Self::AlphaBlend { .. } => EMR_ALPHABLEND,
            Self::Eof => EMR_EOF,
        }
    }

    /// Encoded size in bytes, including the type/size prefix.
    pub fn size(&self) -> u32 {
        match self {
            Self::SaveDc | Self::BeginPath | Self::EndPath | Self::CloseFigure => 8,
            Self::SetMapMode(_)
            | Self::SetBkMode(_)
            | Self::SetPolyFillMode(_)
            | Self::SelectObject(_)
            | Self::DeleteObject(_)
            | Self::RestoreDc(_)
            | Self::SelectClipPath(_) => 12,
            Self::SetWindowOrgEx(..)
            | Self::SetWindowExtEx(..)
            | Self::SetViewportOrgEx(..)
            | Self::SetViewportExtEx(..)
            | Self::MoveToEx(..) => 16,
            Self::Eof => 20,
            Self::CreateBrushIndirect { .. } | Self::FillPath(_) => 24,
            Self::StrokePath(_) | Self::StrokeAndFillPath(_) => 24,
            Self::CreatePen { .. } => 28,
            Self::PolylineTo { points, .. } | Self::PolyBezierTo { points, .. } => {
                28 + points.byte_len()
            }
            Self::PolyPolygon { counts, points, .. } => {
                32 + counts.len() as u32 * 4 + points.byte_len()
            }
            Self::AlphaBlend { bgra, .. } => {
                ALPHABLEND_FIXED + BITMAPINFOHEADER_SIZE + bgra.len() as u32
            }
        }
    }

    /// Append the little-endian encoding of this record.
    pub fn write(&self, out: &mut Vec<u8>) {
        let start = out.len();
        put_u32(out, self.record_type());
        put_u32(out, self.size());
        match self {
            Self::SetMapMode(v)
            | Self::SetBkMode(v)
            | Self::SelectObject(v)
            | Self::DeleteObject(v)
            | Self::SelectClipPath(v) => put_u32(out, *v),
            Self::SetPolyFillMode(m) => put_u32(out, *m as u32),
            Self::RestoreDc(v) => put_i32(out, *v),
            Self::SetWindowOrgEx(x, y)
            | Self::SetWindowExtEx(x, y)
            | Self::SetViewportOrgEx(x, y)
            | Self::SetViewportExtEx(x, y)
            | Self::MoveToEx(x, y) => {
                put_i32(out, *x);
                put_i32(out, *y);
            }
            Self::CreateBrushIndirect {
                handle,
                style,
                color,
            } => {
                put_u32(out, *handle);
                put_u32(out, *style);
                put_u32(out, *color);
                put_u32(out, 0);
            }
            Self::CreatePen {
                handle,
                style,
                width,
                color,
            } => {
                put_u32(out, *handle);
                put_u32(out, *style);
                put_i32(out, *width);
                put_i32(out, 0);
                put_u32(out, *color);
            }
            Self::SaveDc | Self::BeginPath | Self::EndPath | Self::CloseFigure => {}
            Self::PolylineTo { bounds, points } | Self::PolyBezierTo { bounds, points } => {
                bounds.write(out);
                put_u32(out, points.len() as u32);
                points.write(out);
            }
            Self::FillPath(b) | Self::StrokePath(b) | Self::StrokeAndFillPath(b) => b.write(out),
            Self::PolyPolygon {
                bounds,
                counts,
                points,
            } => {
                bounds.write(out);
                put_u32(out, counts.len() as u32);
                put_u32(out, points.len() as u32);
                for c in counts {
                    put_u32(out, *c);
                }
                points.write(out);
            }
            Self::AlphaBlend {
                bounds,
                dest,
                width,
                height,
                bgra,
            } => {
                bounds.write(out);
                put_i32(out, dest.0);
                put_i32(out, dest.1);
                put_i32(out, dest.2);
                put_i32(out, dest.3);
                // AC_SRC_OVER, no flags, constant alpha 255, AC_SRC_ALPHA.
                out.extend_from_slice(&[0, 0, 255, 1]);
                put_i32(out, 0);
                put_i32(out, 0);
                for v in [1.0f32, 0.0, 0.0, 1.0, 0.0, 0.0] {
                    out.extend_from_slice(&v.to_le_bytes());
                }
                put_u32(out, 0); // background color
                put_u32(out, 0); // DIB_RGB_COLORS
                put_u32(out, ALPHABLEND_FIXED);
                put_u32(out, BITMAPINFOHEADER_SIZE);
                put_u32(out, ALPHABLEND_FIXED + BITMAPINFOHEADER_SIZE);
                put_u32(out, bgra.len() as u32);
                put_i32(out, *width as i32);
                put_i32(out, *height as i32);

                put_u32(out, BITMAPINFOHEADER_SIZE);
                put_i32(out, *width as i32);
                put_i32(out, -(*height as i32)); // top-down
                out.extend_from_slice(&1u16.to_le_bytes());
                out.extend_from_slice(&32u16.to_le_bytes());
                put_u32(out, 0); // BI_RGB
                put_u32(out, bgra.len() as u32);
                put_i32(out, 0);
                put_i32(out, 0);
                put_u32(out, 0);
                put_u32(out, 0);
                out.extend_from_slice(bgra);
            }
            Self::Eof => {
                put_u32(out, 0);
                put_u32(out, 16);
                put_u32(out, 20);
            }
        }
        debug_assert_eq!(out.len() - start, self.size() as usize);
    }
}

pub(crate) fn put_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

pub(crate) fn put_i32(out: &mut Vec<u8>, v: i32) {
    out.extend_from_slice(&v.to_le_bytes());
}

#[cfg(test)]
#[path = "../../tests/unit/emf/records.rs"]
mod tests;
