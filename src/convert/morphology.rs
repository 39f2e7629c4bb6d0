use crate::convert::{ConvertContext, Deferral, VectorStage};
use crate::foundation::error::DmlfxResult;
use crate::geometry::outline::stroke_outline;
use crate::model::{MorphologyOperator, MorphologyParams};
use crate::raster::{RasterSurface, kernels};

/// Grow or shrink every shape by the stroke outline of its own boundary.
///
/// A non-positive radius on either axis disables the primitive. Each shape's radius is checked
/// against the same proportional threshold the analyzer applies to the whole subject.
pub fn vector(
    ctx: &ConvertContext<'_>,
    params: &MorphologyParams,
    input: &VectorStage,
) -> Result<VectorStage, Deferral> {
    let (rx, ry) = (params.radius_x, params.radius_y);
    if !(rx > 0.0 && ry > 0.0) {
        return Ok(input.clone());
    }
    if !(rx.is_finite() && ry.is_finite()) {
        return Err("morphology radius is not finite".to_string());
    }
    let ratio = ctx.options.budget.morphology_max_radius_ratio;
    let mut out = input.clone();
    for shape in &mut out.shapes {
        let b = shape.geometry.bounds();
        let limit = ratio * b.width().min(b.height());
        if rx.max(ry) > limit {
            return Err(format!(
                "radius {:.3} exceeds {limit:.3} for a {:.3}x{:.3} shape",
                rx.max(ry),
                b.width(),
                b.height()
            ));
        }
        let band = stroke_outline(&shape.geometry, rx, ry, ctx.tolerance());
        shape.geometry = match params.operator {
            MorphologyOperator::Dilate => ctx.engine.union(&[shape.geometry.clone(), band]),
            MorphologyOperator::Erode => ctx.engine.difference(&shape.geometry, &[band]),
        };
    }
    Ok(out)
}

pub fn raster(params: &MorphologyParams, surface: &mut RasterSurface) -> DmlfxResult<()> {
    let (rx, ry) = (params.radius_x, params.radius_y);
    if !(rx > 0.0 && ry > 0.0 && rx.is_finite() && ry.is_finite()) {
        return Ok(());
    }
    let px = |r: f64| (r * surface.scale()).round().max(1.0) as u32;
    let img = kernels::morphology(surface.image(), params.operator, px(rx), px(ry));
    surface.replace(img)
}
