use image::RgbaImage;
use kurbo::PathEl;
use resvg::tiny_skia;

use crate::config::RasterOptions;
use crate::foundation::core::{Affine, Point, Rect, Rgba8};
use crate::foundation::error::{DmlfxError, DmlfxResult};
use crate::geometry::{FillRule, PathSpec};
use crate::model::StrokeStyle;

/// Premultiplied RGBA8 canvas covering a user-space region.
#[derive(Clone, Debug)]
pub struct RasterSurface {
    image: RgbaImage,
    region: Rect,
    scale: f64,
}

impl RasterSurface {
    /// Transparent surface over `region` at the configured resolution, reduced to stay within
    /// `max_pixels`.
    pub fn new(region: Rect, opts: &RasterOptions) -> DmlfxResult<Self> {
        if !region.is_finite() || region.width() <= 0.0 || region.height() <= 0.0 {
            return Err(DmlfxError::validation(format!(
                "raster region must be finite with positive area, got {region:?}"
            )));
        }
        let mut scale = opts.pixels_per_unit;
        let area = region.width() * scale * region.height() * scale;
        if area > opts.max_pixels as f64 {
            scale *= (opts.max_pixels as f64 / area).sqrt();
        }
        let w = (region.width() * scale).ceil().max(1.0);
        let h = (region.height() * scale).ceil().max(1.0);
        if w > u32::MAX as f64 || h > u32::MAX as f64 {
            return Err(DmlfxError::validation("raster surface too large"));
        }
        Ok(Self {
            image: RgbaImage::new(w as u32, h as u32),
            region,
            scale,
        })
    }

    pub fn region(&self) -> Rect {
        self.region
    }

    /// Pixels per user unit.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Swap in a processed image of the same dimensions.
    pub fn replace(&mut self, image: RgbaImage) -> DmlfxResult<()> {
        if image.dimensions() != self.image.dimensions() {
            return Err(DmlfxError::invariant(format!(
                "raster kernel changed dimensions {:?} -> {:?}",
                self.image.dimensions(),
                image.dimensions()
            )));
        }
        self.image = image;
        Ok(())
    }

    /// User space to pixel space.
    pub fn to_pixel(&self) -> Affine {
        Affine::scale(self.scale) * Affine::translate(-self.region.origin().to_vec2())
    }

    /// Pixel center `(x, y)` in user space.
    pub fn to_user(&self, x: u32, y: u32) -> Point {
        Point::new(
            self.region.x0 + (f64::from(x) + 0.5) / self.scale,
            self.region.y0 + (f64::from(y) + 0.5) / self.scale,
        )
    }

    pub fn fill(&mut self, path: &PathSpec, color: Rgba8) {
        self.fill_all(std::slice::from_ref(path), color);
    }

    pub fn stroke(&mut self, path: &PathSpec, style: &StrokeStyle) {
        let Some(sk_path) = to_skia(path.path(), self.to_pixel()) else {
            return;
        };
        let mut paint = tiny_skia::Paint::default();
        paint.set_color_rgba8(style.color.r, style.color.g, style.color.b, style.color.a);
        paint.anti_alias = true;
        let mut stroke = tiny_skia::Stroke {
            width: (style.width * self.scale) as f32,
            ..tiny_skia::Stroke::default()
        };
        if !style.dash.is_empty() {
            let dashes = style
                .dash
                .iter()
                .map(|d| (*d * self.scale) as f32)
                .collect();
            stroke.dash = tiny_skia::StrokeDash::new(dashes, 0.0);
        }
        self.with_pixmap(|pm| {
            pm.stroke_path(
                &sk_path,
                &paint,
                &stroke,
                tiny_skia::Transform::identity(),
                None,
            );
        });
    }

    /// Repeat the tile `geometry` (one `cell`, anchored at the origin) over the surface, then
    /// keep it only where the current image has coverage.
    ///
    /// The cell is painted once and spread with a repeating shader, so the cost does not grow
    /// with the number of tiles.
    pub fn fill_tiled_masked(&mut self, geometry: &[PathSpec], cell: Rect, color: Rgba8) {
        let (cw, ch) = (cell.width(), cell.height());
        if !(cw > 0.0 && ch > 0.0 && cw.is_finite() && ch.is_finite()) || geometry.is_empty() {
            return;
        }
        let cell_px = |side: f64| (side * self.scale).ceil().clamp(1.0, MAX_CELL_PX);
        let (pw, ph) = (cell_px(cw), cell_px(ch));
        let Some(mut tile) = tiny_skia::Pixmap::new(pw as u32, ph as u32) else {
            return;
        };
        let to_tile =
            Affine::scale_non_uniform(pw / cw, ph / ch) * Affine::translate((-cell.x0, -cell.y0));
        for g in geometry {
            fill_into(&mut tile, g, color, to_tile);
        }

        let mask: Vec<u8> = self.image.pixels().map(|p| p.0[3]).collect();
        let (w, h) = self.image.dimensions();
        let Some(mut tiled) = tiny_skia::Pixmap::new(w, h) else {
            return;
        };
        let Some(full) = tiny_skia::Rect::from_xywh(0.0, 0.0, w as f32, h as f32) else {
            return;
        };
        // Tile pixels back to user units, then into this surface's pixels.
        let spread = self.to_pixel()
            * Affine::translate((cell.x0, cell.y0))
            * Affine::scale_non_uniform(cw / pw, ch / ph);
        let paint = tiny_skia::Paint {
            shader: tiny_skia::Pattern::new(
                tile.as_ref(),
                tiny_skia::SpreadMode::Repeat,
                tiny_skia::FilterQuality::Nearest,
                1.0,
                to_skia_transform(spread),
            ),
            anti_alias: true,
            ..tiny_skia::Paint::default()
        };
        tiled.fill_rect(full, &paint, tiny_skia::Transform::identity(), None);
        let Some(mut image) = RgbaImage::from_raw(w, h, tiled.take()) else {
            return;
        };
        multiply_by(&mut image, &mask);
        self.image = image;
    }

    /// Keep only the parts of the image covered by every level; the paths of one level are
    /// unioned.
    pub fn mask_with(&mut self, levels: &[Vec<PathSpec>]) {
        for level in levels {
            let mut coverage = Self {
                image: RgbaImage::new(self.width(), self.height()),
                region: self.region,
                scale: self.scale,
            };
            coverage.fill_all(level, Rgba8::BLACK);
            let mask: Vec<u8> = coverage.image.pixels().map(|p| p.0[3]).collect();
            multiply_by(&mut self.image, &mask);
        }
    }

    /// Fill every path in one pass over the pixels.
    pub fn fill_all(&mut self, paths: &[PathSpec], color: Rgba8) {
        let xf = self.to_pixel();
        self.with_pixmap(|pm| {
            for p in paths {
                fill_into(pm, p, color, xf);
            }
        });
    }

    /// Source-over composite of a premultiplied image of the same size.
    pub fn composite_over(&mut self, top: &RgbaImage) {
        if top.dimensions() != self.image.dimensions() {
            return;
        }
        for (dst, src) in self.image.pixels_mut().zip(top.pixels()) {
            let inv = 255 - u16::from(src.0[3]);
            for c in 0..4 {
                let d = (u16::from(dst.0[c]) * inv + 127) / 255;
                dst.0[c] = (u16::from(src.0[c]) + d).min(255) as u8;
            }
        }
    }

    fn with_pixmap(&mut self, draw: impl FnOnce(&mut tiny_skia::Pixmap)) {
        let (w, h) = self.image.dimensions();
        let Some(size) = tiny_skia::IntSize::from_wh(w, h) else {
            return;
        };
        let raw = std::mem::take(&mut self.image).into_raw();
        let Some(mut pm) = tiny_skia::Pixmap::from_vec(raw, size) else {
            self.image = RgbaImage::new(w, h);
            return;
        };
        draw(&mut pm);
        self.image = RgbaImage::from_raw(w, h, pm.take()).unwrap_or_else(|| RgbaImage::new(w, h));
    }
}

const MAX_CELL_PX: f64 = 4096.0;

fn fill_into(pm: &mut tiny_skia::Pixmap, path: &PathSpec, color: Rgba8, xf: Affine) {
    let Some(sk_path) = to_skia(path.path(), xf) else {
        return;
    };
    let mut paint = tiny_skia::Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    let rule = match path.fill_rule() {
        FillRule::NonZero => tiny_skia::FillRule::Winding,
        FillRule::EvenOdd => tiny_skia::FillRule::EvenOdd,
    };
    pm.fill_path(&sk_path, &paint, rule, tiny_skia::Transform::identity(), None);
}

fn to_skia_transform(a: Affine) -> tiny_skia::Transform {
    let [sx, ky, kx, sy, tx, ty] = a.as_coeffs().map(|c| c as f32);
    tiny_skia::Transform::from_row(sx, ky, kx, sy, tx, ty)
}

fn multiply_by(image: &mut RgbaImage, mask: &[u8]) {
    for (px, m) in image.pixels_mut().zip(mask) {
        for c in px.0.iter_mut() {
            *c = ((u16::from(*c) * u16::from(*m) + 127) / 255) as u8;
        }
    }
}

fn to_skia(path: &kurbo::BezPath, xf: Affine) -> Option<tiny_skia::Path> {
    let mut pb = tiny_skia::PathBuilder::new();
    let p = |pt: Point| {
        let q = xf * pt;
        (q.x as f32, q.y as f32)
    };
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(a) => {
                let (x, y) = p(a);
                pb.move_to(x, y);
            }
            PathEl::LineTo(a) => {
                let (x, y) = p(a);
                pb.line_to(x, y);
            }
            PathEl::QuadTo(a, b) => {
                let ((x1, y1), (x, y)) = (p(a), p(b));
                pb.quad_to(x1, y1, x, y);
            }
            PathEl::CurveTo(a, b, c) => {
                let ((x1, y1), (x2, y2), (x, y)) = (p(a), p(b), p(c));
                pb.cubic_to(x1, y1, x2, y2, x, y);
            }
            PathEl::ClosePath => pb.close(),
        }
    }
    pb.finish()
}

#[cfg(test)]
#[path = "../../tests/unit/raster/surface.rs"]
mod tests;
