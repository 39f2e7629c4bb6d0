use kurbo::{Cap, Join, Stroke, StrokeOpts};

use crate::foundation::core::{Affine, Point};
use crate::geometry::path::{PathSpec, sanitize_tolerance};

/// Outline of the band swept by a round pen of radii `(rx, ry)` following `path`.
///
/// The result is a `nonzero` fill. Anisotropic radii stroke in a normalized space (unit pen) and
/// scale back, which turns the round pen into an ellipse.
pub fn stroke_outline(path: &PathSpec, rx: f64, ry: f64, tolerance: f64) -> PathSpec {
    if path.is_empty() || !(rx > 0.0 && ry > 0.0) || !rx.is_finite() || !ry.is_finite() {
        return PathSpec::empty();
    }
    let tolerance = sanitize_tolerance(tolerance);
    let style = Stroke::new(2.0)
        .with_join(Join::Round)
        .with_caps(Cap::Round);
    let to_unit = Affine::scale_non_uniform(1.0 / rx, 1.0 / ry);
    let from_unit = Affine::scale_non_uniform(rx, ry);
    let unit_path = to_unit * path.path().clone();
    let unit_tol = tolerance / rx.max(ry);
    let stroked = kurbo::stroke(
        unit_path.iter(),
        &style,
        &StrokeOpts::default(),
        unit_tol,
    );
    PathSpec::new(from_unit * stroked, crate::geometry::path::FillRule::NonZero)
}

/// Flatten `path` and split every edge so no piece is longer than `step`.
pub fn subdivide(path: &PathSpec, step: f64, tolerance: f64) -> Vec<Vec<Point>> {
    let step = if step.is_finite() && step > 0.0 {
        step
    } else {
        f64::INFINITY
    };
    path.flatten(tolerance)
        .into_iter()
        .map(|contour| {
            let n = contour.len();
            let mut out = Vec::with_capacity(n);
            for i in 0..n {
                let a = contour[i];
                let b = contour[(i + 1) % n];
                let pieces = pieces_for((b - a).hypot(), step);
                for k in 0..pieces {
                    out.push(a.lerp(b, k as f64 / pieces as f64));
                }
            }
            out
        })
        .collect()
}

/// Number of vertices [`subdivide`] would produce, without building them.
pub fn subdivided_vertex_count(path: &PathSpec, step: f64, tolerance: f64) -> usize {
    let step = if step.is_finite() && step > 0.0 {
        step
    } else {
        f64::INFINITY
    };
    path.flatten(tolerance)
        .iter()
        .map(|contour| {
            let n = contour.len();
            (0..n)
                .map(|i| pieces_for((contour[(i + 1) % n] - contour[i]).hypot(), step))
                .sum::<usize>()
        })
        .sum()
}

fn pieces_for(len: f64, step: f64) -> usize {
    if !len.is_finite() || len <= step {
        return 1;
    }
    ((len / step).ceil() as usize).max(1)
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/outline.rs"]
mod tests;
