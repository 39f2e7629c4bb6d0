//! Pixel implementations of the filter primitives, on premultiplied RGBA8 images.

use image::RgbaImage;

use crate::foundation::core::{Point, Rgba8};
use crate::model::{
    ComponentTransferParams, ConvolveParams, DisplacementParams, EdgeMode, LightSource,
    MorphologyOperator,
};

/// Separable per-channel min (erode) or max (dilate) over a `(2rx+1) x (2ry+1)` window.
/// Pixels outside the image count as transparent black.
///
/// Each pass runs in time linear in the image size whatever the radius.
pub fn morphology(src: &RgbaImage, op: MorphologyOperator, rx: u32, ry: u32) -> RgbaImage {
    if rx == 0 && ry == 0 {
        return src.clone();
    }
    let pick = |a: u8, b: u8| match op {
        MorphologyOperator::Erode => a.min(b),
        MorphologyOperator::Dilate => a.max(b),
    };
    let (w, h) = src.dimensions();
    // Any window at least as wide as the image already reaches past both edges.
    let (rx, ry) = (rx.min(w) as usize, ry.min(h) as usize);
    let mut out = src.clone();
    let mut line = Vec::new();
    let mut result = Vec::new();
    if rx > 0 {
        for y in 0..h {
            for c in 0..4 {
                line.clear();
                line.extend((0..w).map(|x| out.get_pixel(x, y).0[c]));
                sliding_extreme(&line, rx, pick, &mut result);
                for (x, v) in (0..w).zip(&result) {
                    out.get_pixel_mut(x, y).0[c] = *v;
                }
            }
        }
    }
    if ry > 0 {
        for x in 0..w {
            for c in 0..4 {
                line.clear();
                line.extend((0..h).map(|y| out.get_pixel(x, y).0[c]));
                sliding_extreme(&line, ry, pick, &mut result);
                for (y, v) in (0..h).zip(&result) {
                    out.get_pixel_mut(x, y).0[c] = *v;
                }
            }
        }
    }
    out
}

// Van Herk / Gil-Werman running extreme over a zero-padded `2r+1` window.
fn sliding_extreme(line: &[u8], r: usize, pick: impl Fn(u8, u8) -> u8, out: &mut Vec<u8>) {
    let k = 2 * r + 1;
    let mut padded = vec![0u8; r];
    padded.extend_from_slice(line);
    padded.resize(line.len() + 2 * r, 0);
    let m = padded.len();
    let mut fwd = padded.clone();
    for i in 1..m {
        if i % k != 0 {
            fwd[i] = pick(fwd[i - 1], padded[i]);
        }
    }
    let mut bwd = padded.clone();
    for i in (0..m.saturating_sub(1)).rev() {
        if (i + 1) % k != 0 {
            bwd[i] = pick(bwd[i + 1], padded[i]);
        }
    }
    out.clear();
    out.extend((0..line.len()).map(|x| pick(bwd[x], fwd[x + k - 1])));
}

fn fetch(src: &RgbaImage, x: i64, y: i64, edge: EdgeMode) -> [f64; 4] {
    let (w, h) = (i64::from(src.width()), i64::from(src.height()));
    let (x, y) = match edge {
        EdgeMode::Duplicate => (x.clamp(0, w - 1), y.clamp(0, h - 1)),
        EdgeMode::Wrap => (x.rem_euclid(w), y.rem_euclid(h)),
        EdgeMode::None => {
            if x < 0 || y < 0 || x >= w || y >= h {
                return [0.0; 4];
            }
            (x, y)
        }
    };
    let p = src.get_pixel(x as u32, y as u32).0;
    [p[0], p[1], p[2], p[3]].map(|c| f64::from(c) / 255.0)
}

/// Matrix convolution with divisor, bias, target offset, edge mode and preserve-alpha.
pub fn convolve(src: &RgbaImage, params: &ConvolveParams) -> RgbaImage {
    let (w, h) = src.dimensions();
    if !params.is_well_formed() || w == 0 || h == 0 {
        return src.clone();
    }
    let (ox, oy) = (params.order_x as i64, params.order_y as i64);
    let (tx, ty) = params.target();
    let (tx, ty) = (i64::from(tx), i64::from(ty));
    let divisor = params.effective_divisor();
    let mut out = RgbaImage::new(w, h);
    for y in 0..i64::from(h) {
        for x in 0..i64::from(w) {
            let mut sum = [0.0f64; 4];
            for j in 0..oy {
                for i in 0..ox {
                    // Kernel is applied rotated by 180 degrees.
                    let k = params.kernel[((oy - 1 - j) * ox + (ox - 1 - i)) as usize];
                    if k == 0.0 {
                        continue;
                    }
                    let mut px = fetch(src, x - tx + i, y - ty + j, params.edge_mode);
                    if params.preserve_alpha {
                        unpremultiply(&mut px);
                    }
                    for c in 0..4 {
                        sum[c] += px[c] * k;
                    }
                }
            }
            let orig = fetch(src, x, y, EdgeMode::None);
            let mut res = sum.map(|s| (s / divisor + params.bias).clamp(0.0, 1.0));
            if params.preserve_alpha {
                res[3] = orig[3];
                for c in 0..3 {
                    res[c] *= res[3];
                }
            } else {
                for c in 0..3 {
                    res[c] = res[c].min(res[3]);
                }
            }
            out.put_pixel(x as u32, y as u32, image::Rgba(res.map(to_u8)));
        }
    }
    out
}

/// Per-channel transfer applied to unpremultiplied values.
pub fn component_transfer(src: &RgbaImage, params: &ComponentTransferParams) -> RgbaImage {
    let mut out = src.clone();
    for px in out.pixels_mut() {
        let mut c = px.0.map(|v| f64::from(v) / 255.0);
        unpremultiply(&mut c);
        let mapped = [
            params.func_r.apply(c[0]),
            params.func_g.apply(c[1]),
            params.func_b.apply(c[2]),
            params.func_a.apply(c[3]),
        ];
        let a = mapped[3];
        px.0 = [mapped[0] * a, mapped[1] * a, mapped[2] * a, a].map(to_u8);
    }
    out
}

/// Light source mapped into pixel space.
#[derive(Clone, Copy, Debug)]
pub enum PixelLight {
    Distant {
        azimuth: f64,
        elevation: f64,
    },
    Point {
        at: [f64; 3],
    },
    Spot {
        at: [f64; 3],
        towards: [f64; 3],
        exponent: f64,
        cone: Option<f64>,
    },
}

impl PixelLight {
    /// Map `light` with the user-to-pixel `to_px` affine; `z` scales by `scale`.
    pub fn from_user(light: &LightSource, to_px: kurbo::Affine, scale: f64) -> Self {
        let map = |x: f64, y: f64, z: f64| {
            let p = to_px * Point::new(x, y);
            [p.x, p.y, z * scale]
        };
        match *light {
            LightSource::Distant { azimuth, elevation } => Self::Distant { azimuth, elevation },
            LightSource::Point { x, y, z } => Self::Point { at: map(x, y, z) },
            LightSource::Spot {
                x,
                y,
                z,
                points_at_x,
                points_at_y,
                points_at_z,
                specular_exponent,
                limiting_cone_angle,
            } => Self::Spot {
                at: map(x, y, z),
                towards: map(points_at_x, points_at_y, points_at_z),
                exponent: specular_exponent,
                cone: limiting_cone_angle,
            },
        }
    }

    // Unit vector to the light and the light color factor at surface point `s`.
    fn at(&self, s: [f64; 3]) -> ([f64; 3], f64) {
        match *self {
            Self::Distant { azimuth, elevation } => {
                let (a, e) = (azimuth.to_radians(), elevation.to_radians());
                ([a.cos() * e.cos(), a.sin() * e.cos(), e.sin()], 1.0)
            }
            Self::Point { at } => (normalize(sub(at, s)), 1.0),
            Self::Spot {
                at,
                towards,
                exponent,
                cone,
            } => {
                let l = normalize(sub(at, s));
                let dir = normalize(sub(towards, at));
                let minus_l_dot_s = -dot(l, dir);
                if minus_l_dot_s <= 0.0 {
                    return (l, 0.0);
                }
                if let Some(c) = cone {
                    if minus_l_dot_s < c.abs().to_radians().cos() {
                        return (l, 0.0);
                    }
                }
                (l, minus_l_dot_s.powf(exponent.max(0.0)))
            }
        }
    }
}

/// Shading model of [`lighting`].
#[derive(Clone, Copy, Debug)]
pub enum Shading {
    Diffuse { constant: f64 },
    Specular { constant: f64, exponent: f64 },
}

/// Diffuse or specular lighting of the alpha-channel height map.
pub fn lighting(
    src: &RgbaImage,
    light: PixelLight,
    shading: Shading,
    surface_scale: f64,
    color: Rgba8,
) -> RgbaImage {
    let (w, h) = src.dimensions();
    let alpha = |x: i64, y: i64| {
        let x = x.clamp(0, i64::from(w) - 1) as u32;
        let y = y.clamp(0, i64::from(h) - 1) as u32;
        f64::from(src.get_pixel(x, y).0[3]) / 255.0
    };
    let light_rgb = [color.r, color.g, color.b].map(|c| f64::from(c) / 255.0);
    let mut out = RgbaImage::new(w, h);
    for y in 0..i64::from(h) {
        for x in 0..i64::from(w) {
            let nx = -surface_scale / 4.0
                * ((alpha(x + 1, y - 1) + 2.0 * alpha(x + 1, y) + alpha(x + 1, y + 1))
                    - (alpha(x - 1, y - 1) + 2.0 * alpha(x - 1, y) + alpha(x - 1, y + 1)));
            let ny = -surface_scale / 4.0
                * ((alpha(x - 1, y + 1) + 2.0 * alpha(x, y + 1) + alpha(x + 1, y + 1))
                    - (alpha(x - 1, y - 1) + 2.0 * alpha(x, y - 1) + alpha(x + 1, y - 1)));
            let n = normalize([nx, ny, 1.0]);
            let surface = [x as f64, y as f64, surface_scale * alpha(x, y)];
            let (l, factor) = light.at(surface);
            let lc = light_rgb.map(|c| c * factor);
            let px = match shading {
                Shading::Diffuse { constant } => {
                    let k = (constant * dot(n, l)).max(0.0);
                    [lc[0] * k, lc[1] * k, lc[2] * k, 1.0]
                }
                Shading::Specular { constant, exponent } => {
                    let half = normalize([l[0], l[1], l[2] + 1.0]);
                    let k = constant * dot(n, half).max(0.0).powf(exponent);
                    let rgb = [lc[0] * k, lc[1] * k, lc[2] * k].map(|c| c.clamp(0.0, 1.0));
                    let a = rgb[0].max(rgb[1]).max(rgb[2]);
                    [rgb[0], rgb[1], rgb[2], a]
                }
            };
            out.put_pixel(
                x as u32,
                y as u32,
                image::Rgba(px.map(|c| to_u8(c.clamp(0.0, 1.0)))),
            );
        }
    }
    out
}

/// Displace `src` by the map stretched over the image; `scale_px` is in pixels.
pub fn displace(src: &RgbaImage, params: &DisplacementParams, scale_px: f64) -> RgbaImage {
    let Some(map) = params.map.as_ref() else {
        return src.clone();
    };
    let (w, h) = src.dimensions();
    let mut out = RgbaImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let u = (f64::from(x) + 0.5) / f64::from(w);
            let v = (f64::from(y) + 0.5) / f64::from(h);
            let dx = scale_px * (map.sample(u, v, params.x_channel) - 0.5);
            let dy = scale_px * (map.sample(u, v, params.y_channel) - 0.5);
            let sx = (f64::from(x) + dx).round() as i64;
            let sy = (f64::from(y) + dy).round() as i64;
            if sx >= 0 && sy >= 0 && sx < i64::from(w) && sy < i64::from(h) {
                out.put_pixel(x, y, *src.get_pixel(sx as u32, sy as u32));
            }
        }
    }
    out
}

fn unpremultiply(c: &mut [f64; 4]) {
    let a = c[3];
    if a > 0.0 {
        for v in c.iter_mut().take(3) {
            *v = (*v / a).min(1.0);
        }
    } else {
        *c = [0.0; 4];
    }
}

fn to_u8(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn normalize(v: [f64; 3]) -> [f64; 3] {
    let len = dot(v, v).sqrt();
    if len > 0.0 && len.is_finite() {
        v.map(|c| c / len)
    } else {
        [0.0, 0.0, 1.0]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/kernels.rs"]
mod tests;
