//! Closed-form parameter patterns that make a primitive native-eligible.

use crate::foundation::core::{Rgba8, unit_to_u8};
use crate::model::{ComponentTransferParams, ConvolveParams, TransferFunction};

const EPS: f64 = 1e-9;

/// Outer ring of a 3x3 kernel, clockwise from the top-left cell.
const RING: [usize; 8] = [0, 1, 2, 5, 8, 7, 6, 3];
const SOBEL_RING: [f64; 8] = [1.0, 2.0, 1.0, 0.0, -1.0, -2.0, -1.0, 0.0];
const LAPLACIAN_4: [f64; 9] = [0.0, 1.0, 0.0, 1.0, -4.0, 1.0, 0.0, 1.0, 0.0];
const LAPLACIAN_8: [f64; 9] = [1.0, 1.0, 1.0, 1.0, -8.0, 1.0, 1.0, 1.0, 1.0];

/// Canonical edge-detection kernels, up to a non-zero scalar factor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum KnownKernel {
    /// Sobel gradient; `rotation` is the ring rotation in degrees (multiples of 45), 0 being
    /// the horizontal-edge kernel `[1 2 1; 0 0 0; -1 -2 -1]`.
    Sobel { rotation: u16 },
    Laplacian4,
    Laplacian8,
}

/// Match `params` against the known kernels; `max_order` bounds the kernel side.
pub fn classify_kernel(params: &ConvolveParams, max_order: u32) -> Option<KnownKernel> {
    if !params.is_well_formed() || params.order_x != 3 || params.order_y != 3 || max_order < 3 {
        return None;
    }
    let k = params.kernel.as_slice();
    if scaled_match(k, &LAPLACIAN_4, true) {
        return Some(KnownKernel::Laplacian4);
    }
    if scaled_match(k, &LAPLACIAN_8, true) {
        return Some(KnownKernel::Laplacian8);
    }
    if k[4].abs() > EPS {
        return None;
    }
    (0..8u16).find_map(|r| {
        let mut reference = [0.0; 9];
        for (i, &cell) in RING.iter().enumerate() {
            reference[cell] = SOBEL_RING[(i + 8 - r as usize) % 8];
        }
        // Negated Sobel kernels are the 180 degree rotations.
        scaled_match(k, &reference, false).then_some(KnownKernel::Sobel { rotation: r * 45 })
    })
}

fn scaled_match(k: &[f64], reference: &[f64; 9], allow_negative: bool) -> bool {
    let Some(pivot) = reference.iter().position(|v| v.abs() > EPS) else {
        return false;
    };
    let factor = k[pivot] / reference[pivot];
    if !factor.is_finite() || factor.abs() < EPS || (!allow_negative && factor < 0.0) {
        return false;
    }
    let tol = EPS * factor.abs().max(1.0);
    k.iter()
        .zip(reference)
        .all(|(a, b)| (a - factor * b).abs() <= tol)
}

/// Shape of a component-transfer function set.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TransferShape {
    /// Every channel maps to itself.
    Identity,
    /// Same 0/1 step function on each color channel.
    BinaryThreshold { threshold: f64 },
    /// Two-entry ramps: black maps to `dark`, white to `light`.
    Duotone { dark: Rgba8, light: Rgba8 },
    /// Same constant output on each color channel.
    Grayscale { level: f64 },
    /// Same pure power curve on each color channel.
    Gamma { exponent: f64 },
    /// Same non-inverting linear map on each color channel, as brightness/contrast around
    /// mid-gray. Only maps whose brightness and contrast fit in `[-1, 1]` take this shape.
    Luminance { brightness: f64, contrast: f64 },
    /// Color untouched, alpha scaled by `amount`.
    AlphaModulate { amount: f64 },
}

/// Classify `params`, or `None` when it matches no mapped shape.
pub fn classify_transfer(params: &ComponentTransferParams) -> Option<TransferShape> {
    let rgb = [&params.func_r, &params.func_g, &params.func_b];
    let alpha = &params.func_a;
    let rgb_identity = rgb.iter().all(|f| f.is_identity());

    if rgb_identity {
        if alpha.is_identity() {
            return Some(TransferShape::Identity);
        }
        return alpha_scale(alpha).map(|amount| TransferShape::AlphaModulate { amount });
    }
    if !alpha.is_identity() {
        return None;
    }

    let consts: Vec<f64> = rgb.iter().filter_map(|f| constant(f)).collect();
    if consts.len() == 3 && consts.iter().all(|c| (c - consts[0]).abs() < EPS) {
        return Some(TransferShape::Grayscale { level: consts[0] });
    }

    let same = rgb.iter().all(|f| *f == rgb[0]);
    if same {
        match rgb[0] {
            TransferFunction::Discrete { table_values } => {
                if let Some(threshold) = step_threshold(table_values) {
                    return Some(TransferShape::BinaryThreshold { threshold });
                }
            }
            TransferFunction::Gamma {
                amplitude,
                exponent,
                offset,
            } if (amplitude - 1.0).abs() < EPS
                && offset.abs() < EPS
                && exponent.is_finite()
                && *exponent > 0.0 =>
            {
                return Some(TransferShape::Gamma {
                    exponent: *exponent,
                });
            }
            TransferFunction::Linear { slope, intercept } => {
                if let Some(shape) = luminance(*slope, *intercept) {
                    return Some(shape);
                }
            }
            _ => {}
        }
    }

    let ramps: Vec<(f64, f64)> = rgb.iter().filter_map(|f| two_entry(f)).collect();
    if ramps.len() == 3 {
        let dark = Rgba8::rgb(
            unit_to_u8(ramps[0].0 as f32),
            unit_to_u8(ramps[1].0 as f32),
            unit_to_u8(ramps[2].0 as f32),
        );
        let light = Rgba8::rgb(
            unit_to_u8(ramps[0].1 as f32),
            unit_to_u8(ramps[1].1 as f32),
            unit_to_u8(ramps[2].1 as f32),
        );
        return Some(TransferShape::Duotone { dark, light });
    }
    None
}

fn constant(f: &TransferFunction) -> Option<f64> {
    match f {
        TransferFunction::Table { table_values: t } | TransferFunction::Discrete { table_values: t }
            if !t.is_empty() && t.iter().all(|v| (v - t[0]).abs() < EPS) =>
        {
            Some(t[0].clamp(0.0, 1.0))
        }
        TransferFunction::Linear { slope, intercept } if slope.abs() < EPS => {
            Some(intercept.clamp(0.0, 1.0))
        }
        TransferFunction::Gamma {
            amplitude, offset, ..
        } if amplitude.abs() < EPS => Some(offset.clamp(0.0, 1.0)),
        _ => None,
    }
}

fn two_entry(f: &TransferFunction) -> Option<(f64, f64)> {
    match f {
        TransferFunction::Table { table_values: t } if t.len() == 2 => unit_ramp(t[0], t[1]),
        TransferFunction::Identity => Some((0.0, 1.0)),
        TransferFunction::Linear { slope, intercept } => unit_ramp(*intercept, slope + intercept),
        _ => None,
    }
}

// A ramp is a duotone leg only when neither end needs clamping.
fn unit_ramp(dark: f64, light: f64) -> Option<(f64, f64)> {
    let unit = |v: f64| (0.0..=1.0).contains(&v);
    (unit(dark) && unit(light)).then_some((dark, light))
}

fn luminance(slope: f64, intercept: f64) -> Option<TransferShape> {
    let brightness = intercept + 0.5 * slope - 0.5;
    let contrast = slope - 1.0;
    let fits = |v: f64| v.is_finite() && (-1.0..=1.0).contains(&v);
    (slope >= 0.0 && fits(brightness) && fits(contrast)).then_some(TransferShape::Luminance {
        brightness,
        contrast,
    })
}

// Monotone 0/1 discrete table containing both levels.
fn step_threshold(t: &[f64]) -> Option<f64> {
    let binary = t.iter().all(|v| v.abs() < EPS || (v - 1.0).abs() < EPS);
    let first_one = t.iter().position(|v| (v - 1.0).abs() < EPS)?;
    let monotone = t[first_one..].iter().all(|v| (v - 1.0).abs() < EPS);
    (binary && monotone && first_one > 0).then(|| first_one as f64 / t.len() as f64)
}

fn alpha_scale(f: &TransferFunction) -> Option<f64> {
    match f {
        TransferFunction::Linear { slope, intercept }
            if intercept.abs() < EPS && slope.is_finite() && *slope >= 0.0 =>
        {
            Some(*slope)
        }
        TransferFunction::Table { table_values: t }
            if t.len() == 2 && t[0].abs() < EPS && t[1].is_finite() && t[1] >= 0.0 =>
        {
            Some(t[1])
        }
        _ => None,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/strategy/patterns.rs"]
mod tests;
