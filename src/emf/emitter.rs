use kurbo::PathEl;

use crate::emf::document::{EmfDocument, LOGICAL_PER_PX, device_rect};
use crate::emf::records::{
    BK_TRANSPARENT, BS_SOLID, EmfRecord, MM_ANISOTROPIC, NULL_BRUSH, NULL_PEN, PS_SOLID, Points,
    PolyFillMode, RGN_AND, RGN_COPY, RGN_OR, RectL,
};
use crate::foundation::core::{BezPath, Point, Rect, Rgba8};
use crate::foundation::error::{DmlfxError, DmlfxResult};
use crate::geometry::{FillRule, PathSpec};
use crate::model::{ShapeStyle, StrokeStyle};

/// Record writer with object-handle bookkeeping and the 1/16 px logical mapping.
pub(crate) struct EmfBuilder {
    bounds: Rect,
    records: Vec<EmfRecord>,
    next_handle: u32,
    max_handle: u32,
}

impl EmfBuilder {
    pub(crate) fn new(bounds: Rect) -> Self {
        let bounds = if bounds.is_finite() {
            bounds.abs()
        } else {
            Rect::ZERO
        };
        let dev = device_rect(bounds);
        let w = (dev.right - dev.left + 1).max(1);
        let h = (dev.bottom - dev.top + 1).max(1);
        let scale = LOGICAL_PER_PX as i32;
        let records = vec![
            EmfRecord::SetMapMode(MM_ANISOTROPIC),
            EmfRecord::SetWindowOrgEx(dev.left * scale, dev.top * scale),
            EmfRecord::SetWindowExtEx(w * scale, h * scale),
            EmfRecord::SetViewportOrgEx(dev.left, dev.top),
            EmfRecord::SetViewportExtEx(w, h),
            EmfRecord::SetBkMode(BK_TRANSPARENT),
        ];
        Self {
            bounds,
            records,
            next_handle: 1,
            max_handle: 0,
        }
    }

    pub(crate) fn push(&mut self, r: EmfRecord) {
        self.records.push(r);
    }

    fn alloc(&mut self) -> u32 {
        let h = self.next_handle;
        self.next_handle += 1;
        self.max_handle = self.max_handle.max(h);
        h
    }

    /// Create and select a brush; `None` selects the stock null brush.
    pub(crate) fn select_brush(&mut self, color: Option<Rgba8>) -> Option<u32> {
        match color.filter(|c| c.a > 0) {
            Some(c) => {
                let handle = self.alloc();
                self.push(EmfRecord::CreateBrushIndirect {
                    handle,
                    style: BS_SOLID,
                    color: c.to_colorref(),
                });
                self.push(EmfRecord::SelectObject(handle));
                Some(handle)
            }
            None => {
                self.push(EmfRecord::SelectObject(NULL_BRUSH));
                None
            }
        }
    }

    /// Create and select a solid pen; `None` selects the stock null pen.
    pub(crate) fn select_pen(&mut self, stroke: Option<&StrokeStyle>) -> Option<u32> {
        match stroke.filter(|s| s.color.a > 0 && s.width.is_finite() && s.width > 0.0) {
            Some(s) => {
                let handle = self.alloc();
                self.push(EmfRecord::CreatePen {
                    handle,
                    style: PS_SOLID,
                    width: logical(s.width).max(1),
                    color: s.color.to_colorref(),
                });
                self.push(EmfRecord::SelectObject(handle));
                Some(handle)
            }
            None => {
                self.push(EmfRecord::SelectObject(NULL_PEN));
                None
            }
        }
    }

    /// Deselect and delete objects created by the `select_*` calls.
    pub(crate) fn release(&mut self, brush: Option<u32>, pen: Option<u32>) {
        if let Some(h) = brush {
            self.push(EmfRecord::SelectObject(NULL_BRUSH));
            self.push(EmfRecord::DeleteObject(h));
        }
        if let Some(h) = pen {
            self.push(EmfRecord::SelectObject(NULL_PEN));
            self.push(EmfRecord::DeleteObject(h));
        }
    }

    pub(crate) fn fill_mode(&mut self, rule: FillRule) {
        self.push(EmfRecord::SetPolyFillMode(match rule {
            FillRule::NonZero => PolyFillMode::Winding,
            FillRule::EvenOdd => PolyFillMode::Alternate,
        }));
    }

    /// Polygonal path as one poly-polygon record.
    pub(crate) fn poly_polygon(&mut self, contours: &[Vec<Point>]) {
        let mut counts = Vec::with_capacity(contours.len());
        let mut pts = Vec::new();
        for c in contours.iter().filter(|c| c.len() >= 3) {
            counts.push(c.len() as u32);
            pts.extend(c.iter().map(|p| logical_point(*p)));
        }
        if counts.is_empty() {
            return;
        }
        let bounds = logical_bounds(&pts);
        self.push(EmfRecord::PolyPolygon {
            bounds,
            counts,
            points: Points::from_logical(&pts),
        });
    }

    /// `BeginPath` .. `EndPath` bracket holding `path`, curves kept as Bezier records.
    pub(crate) fn path_bracket(&mut self, path: &BezPath) {
        self.push(EmfRecord::BeginPath);
        let mut run = Run::None;
        let mut current = Point::ZERO;
        let mut start = Point::ZERO;
        for el in path.elements() {
            match *el {
                PathEl::MoveTo(p) => {
                    self.flush(&mut run);
                    let (x, y) = logical_point(p);
                    self.push(EmfRecord::MoveToEx(x, y));
                    current = p;
                    start = p;
                }
                PathEl::LineTo(p) => {
                    if !matches!(run, Run::Lines(_)) {
                        self.flush(&mut run);
                        run = Run::Lines(Vec::new());
                    }
                    if let Run::Lines(v) = &mut run {
                        v.push(logical_point(p));
                    }
                    current = p;
                }
                PathEl::QuadTo(c, p) => {
                    let c1 = current + (c - current) * (2.0 / 3.0);
                    let c2 = p + (c - p) * (2.0 / 3.0);
                    self.bezier(&mut run, [c1, c2, p]);
                    current = p;
                }
                PathEl::CurveTo(c1, c2, p) => {
                    self.bezier(&mut run, [c1, c2, p]);
                    current = p;
                }
                PathEl::ClosePath => {
                    self.flush(&mut run);
                    self.push(EmfRecord::CloseFigure);
                    current = start;
                }
            }
        }
        self.flush(&mut run);
        self.push(EmfRecord::EndPath);
    }

    fn bezier(&mut self, run: &mut Run, pts: [Point; 3]) {
        if !matches!(run, Run::Curves(_)) {
            self.flush(run);
            *run = Run::Curves(Vec::new());
        }
        if let Run::Curves(v) = run {
            v.extend(pts.iter().map(|p| logical_point(*p)));
        }
    }

    fn flush(&mut self, run: &mut Run) {
        match std::mem::replace(run, Run::None) {
            Run::None => {}
            Run::Lines(v) if !v.is_empty() => self.push(EmfRecord::PolylineTo {
                bounds: logical_bounds(&v),
                points: Points::from_logical(&v),
            }),
            Run::Curves(v) if !v.is_empty() => self.push(EmfRecord::PolyBezierTo {
                bounds: logical_bounds(&v),
                points: Points::from_logical(&v),
            }),
            Run::Lines(_) | Run::Curves(_) => {}
        }
    }

    pub(crate) fn device_bounds(&self) -> RectL {
        device_rect(self.bounds)
    }

    pub(crate) fn finish(mut self) -> EmfDocument {
        self.push(EmfRecord::Eof);
        let handles = u16::try_from(self.max_handle + 1).unwrap_or(u16::MAX);
        EmfDocument::from_parts(self.bounds, handles, self.records)
    }
}

enum Run {
    None,
    Lines(Vec<(i32, i32)>),
    Curves(Vec<(i32, i32)>),
}

pub(crate) fn logical(v: f64) -> i32 {
    let l = v * LOGICAL_PER_PX;
    if l.is_finite() {
        l.round().clamp(i32::MIN as f64, i32::MAX as f64) as i32
    } else {
        0
    }
}

pub(crate) fn logical_point(p: Point) -> (i32, i32) {
    (logical(p.x), logical(p.y))
}

fn logical_bounds(pts: &[(i32, i32)]) -> RectL {
    let to_px = |v: i32| f64::from(v) / LOGICAL_PER_PX;
    let (mut x0, mut y0, mut x1, mut y1) = (i32::MAX, i32::MAX, i32::MIN, i32::MIN);
    for &(x, y) in pts {
        x0 = x0.min(x);
        y0 = y0.min(y);
        x1 = x1.max(x);
        y1 = y1.max(y);
    }
    if pts.is_empty() {
        return RectL::default();
    }
    device_rect(Rect::new(to_px(x0), to_px(y0), to_px(x1), to_px(y1)))
}

fn paths_bounds(paths: &[PathSpec]) -> Option<Rect> {
    paths
        .iter()
        .filter(|p| !p.is_empty())
        .map(PathSpec::bounds)
        .reduce(|a, b| a.union(b))
}

fn usable_dash(stroke: &StrokeStyle) -> Option<&[f64]> {
    let d = stroke.dash.as_slice();
    (!d.is_empty() && d.iter().all(|v| v.is_finite() && *v > 0.0)).then_some(d)
}

fn draw_paths(b: &mut EmfBuilder, paths: &[PathSpec], style: &ShapeStyle) {
    let fill = style.effective_fill();
    let stroke = style.effective_stroke();
    let dash = stroke.as_ref().and_then(usable_dash);
    let solid_stroke = stroke.as_ref().filter(|_| dash.is_none());

    let brush = b.select_brush(fill);
    let pen = b.select_pen(solid_stroke);
    let visible = brush.is_some() || pen.is_some();
    for p in paths.iter().filter(|p| visible && !p.is_empty()) {
        b.fill_mode(p.fill_rule());
        if !p.has_curves() && solid_stroke.is_none() {
            b.poly_polygon(&p.flatten(0.1));
            continue;
        }
        b.path_bracket(p.path());
        let bounds = device_rect(p.bounds());
        b.push(match (fill.is_some(), solid_stroke.is_some()) {
            (true, true) => EmfRecord::StrokeAndFillPath(bounds),
            (false, true) => EmfRecord::StrokePath(bounds),
            _ => EmfRecord::FillPath(bounds),
        });
    }
    b.release(brush, pen);

    if let (Some(s), Some(dashes)) = (stroke.as_ref(), dash) {
        let pen = b.select_pen(Some(s));
        for p in paths.iter().filter(|p| !p.is_empty()) {
            let dashed: BezPath = kurbo::dash(p.path().iter(), 0.0, dashes).collect();
            if dashed.elements().is_empty() {
                continue;
            }
            b.path_bracket(&dashed);
            b.push(EmfRecord::StrokePath(device_rect(p.bounds())));
        }
        b.release(None, pen);
    }
}

/// Vector drawing of `paths` with one shared style.
#[tracing::instrument(skip_all, fields(paths = paths.len()))]
pub fn emit_paths(paths: &[PathSpec], style: &ShapeStyle) -> EmfDocument {
    let mut bounds = paths_bounds(paths).unwrap_or(Rect::ZERO);
    if let Some(s) = &style.stroke {
        if s.width.is_finite() && s.width > 0.0 {
            bounds = bounds.inflate(s.width / 2.0, s.width / 2.0);
        }
    }
    emit_paths_in(paths, style, bounds)
}

/// [`emit_paths`] with explicit document bounds.
pub(crate) fn emit_paths_in(paths: &[PathSpec], style: &ShapeStyle, bounds: Rect) -> EmfDocument {
    let mut b = EmfBuilder::new(bounds);
    draw_paths(&mut b, paths, style);
    b.finish()
}

/// Premultiplied RGBA pixels stretched over `bounds` (user units).
#[tracing::instrument(skip(pixels), fields(w = pixels.width(), h = pixels.height()))]
pub fn emit_raster_block(pixels: &image::RgbaImage, bounds: Rect) -> DmlfxResult<EmfDocument> {
    let (w, h) = pixels.dimensions();
    if w == 0 || h == 0 {
        return Err(DmlfxError::emit("raster block must have non-zero dimensions"));
    }
    if !bounds.is_finite() || bounds.area() <= 0.0 {
        return Err(DmlfxError::emit(format!(
            "raster block bounds must be finite with positive area, got {bounds:?}"
        )));
    }
    let mut bgra = Vec::with_capacity(pixels.as_raw().len());
    for px in pixels.as_raw().chunks_exact(4) {
        bgra.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
    }
    let mut b = EmfBuilder::new(bounds);
    let (x, y) = logical_point(bounds.origin());
    let dest = (x, y, logical(bounds.width()), logical(bounds.height()));
    let dev = b.device_bounds();
    b.push(EmfRecord::AlphaBlend {
        bounds: dev,
        dest,
        width: w,
        height: h,
        bgra,
    });
    Ok(b.finish())
}

/// `paths` drawn through a clip path: the union of `children`, intersected with each of
/// `nested`.
///
/// Fails when the clip region's bounds leave no area of `paths` visible.
#[tracing::instrument(skip_all, fields(children = children.len(), nested = nested.len()))]
pub fn emit_clipped(
    children: &[PathSpec],
    nested: &[PathSpec],
    paths: &[PathSpec],
    style: &ShapeStyle,
) -> DmlfxResult<EmfDocument> {
    let subject = paths_bounds(paths).unwrap_or(Rect::ZERO);
    let mut bounds = paths_bounds(children).map_or(Rect::ZERO, |c| subject.intersect(c));
    for n in nested {
        bounds = bounds.intersect(n.bounds());
    }
    if !bounds.is_finite() || bounds.width() <= 0.0 || bounds.height() <= 0.0 {
        return Err(DmlfxError::emit(format!(
            "clip region leaves nothing visible, bounds {bounds:?}"
        )));
    }
    let mut b = EmfBuilder::new(bounds);
    b.push(EmfRecord::SaveDc);
    let mut mode = RGN_COPY;
    for c in children.iter().filter(|c| !c.is_empty()) {
        b.fill_mode(c.fill_rule());
        b.path_bracket(c.path());
        b.push(EmfRecord::SelectClipPath(mode));
        mode = RGN_OR;
    }
    for n in nested {
        b.fill_mode(n.fill_rule());
        b.path_bracket(n.path());
        b.push(EmfRecord::SelectClipPath(RGN_AND));
    }
    draw_paths(&mut b, paths, style);
    b.push(EmfRecord::RestoreDc(-1));
    Ok(b.finish())
}

#[cfg(test)]
#[path = "../../tests/unit/emf/emitter.rs"]
mod tests;
