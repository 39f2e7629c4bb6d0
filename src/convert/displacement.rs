use crate::convert::{ConvertContext, Deferral, VectorStage};
use crate::foundation::core::Point;
use crate::foundation::error::DmlfxResult;
use crate::geometry::PathBuilder;
use crate::geometry::outline::subdivide;
use crate::model::{DisplacementMap, DisplacementParams, Diagnostic, DiagnosticKind};
use crate::raster::{RasterSurface, kernels};
use crate::strategy::analyzer::displacement_step;

/// Subdivide every shape and move each vertex by the map value under it.
///
/// The map is stretched over the filter region; a vertex at `p` moves by
/// `-scale * (channel(p) - 0.5)` on each axis, which is where the pixel kernel would show it.
pub fn vector(
    ctx: &mut ConvertContext<'_>,
    index: usize,
    params: &DisplacementParams,
    input: &VectorStage,
) -> Result<VectorStage, Deferral> {
    let Some(map) = active_map(params) else {
        ctx.diagnose(
            Diagnostic::new(
                DiagnosticKind::IdentityPassThrough,
                "displacement without a map or scale leaves its input unchanged",
            )
            .at(index),
        );
        return Ok(input.clone());
    };
    map.validate().map_err(|e| e.to_string())?;

    let budget = &ctx.options.budget;
    let step = displacement_step(params.scale, budget);
    let region = ctx.region;
    let offset = |p: Point| {
        let u = if region.width() > 0.0 {
            (p.x - region.x0) / region.width()
        } else {
            0.5
        };
        let v = if region.height() > 0.0 {
            (p.y - region.y0) / region.height()
        } else {
            0.5
        };
        Point::new(
            p.x - params.scale * (map.sample(u, v, params.x_channel) - 0.5),
            p.y - params.scale * (map.sample(u, v, params.y_channel) - 0.5),
        )
    };

    let mut vertices = 0;
    let mut out = input.clone();
    for shape in &mut out.shapes {
        let contours = subdivide(&shape.geometry, step, ctx.engine.tolerance());
        vertices += contours.iter().map(Vec::len).sum::<usize>();
        if vertices > budget.displacement_max_vertices {
            return Err(format!(
                "subdivision needs more than {} vertices",
                budget.displacement_max_vertices
            ));
        }
        let mut b = PathBuilder::new(shape.geometry.fill_rule());
        for contour in contours {
            for (i, p) in contour.into_iter().enumerate() {
                if i == 0 {
                    b.move_to(offset(p));
                } else {
                    b.line_to(offset(p));
                }
            }
            b.close();
        }
        shape.geometry = b.build();
    }
    Ok(out)
}

fn active_map(params: &DisplacementParams) -> Option<&DisplacementMap> {
    params
        .map
        .as_ref()
        .filter(|_| params.scale.is_finite() && params.scale != 0.0)
}

pub fn raster(params: &DisplacementParams, surface: &mut RasterSurface) -> DmlfxResult<()> {
    let Some(map) = active_map(params) else {
        return Ok(());
    };
    map.validate()?;
    let img = kernels::displace(surface.image(), params, params.scale * surface.scale());
    surface.replace(img)
}
