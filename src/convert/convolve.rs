use crate::convert::{ConvertContext, Deferral, VectorStage};
use crate::foundation::core::Rgba8;
use crate::foundation::error::{DmlfxError, DmlfxResult};
use crate::model::{ConvolveParams, Fill, ShapeNode, StrokeStyle};
use crate::raster::{RasterSurface, kernels};
use crate::strategy::{KnownKernel, classify_kernel};

// Width of the band an edge kernel lights up, in device pixels.
const EDGE_PX: f64 = 2.0;

/// Known edge-detection kernels become outlines: Laplacians trace every edge with a solid line,
/// directional Sobel kernels with a dashed one.
pub fn vector(
    ctx: &ConvertContext<'_>,
    params: &ConvolveParams,
    input: &VectorStage,
) -> Result<VectorStage, Deferral> {
    let kernel = classify_kernel(params, ctx.options.budget.max_known_kernel_order)
        .ok_or_else(|| "kernel matches no known edge-detection kernel".to_string())?;
    let width = EDGE_PX / ctx.options.raster.pixels_per_unit;
    let mut out = input.clone();
    for shape in &mut out.shapes {
        let color = edge_color(shape);
        shape.stroke = Some(match kernel {
            KnownKernel::Laplacian4 | KnownKernel::Laplacian8 => StrokeStyle::solid(color, width),
            KnownKernel::Sobel { .. } => {
                StrokeStyle::dashed(color, width, vec![width * 2.0, width * 2.0])
            }
        });
        if !params.preserve_alpha {
            shape.fill = Fill::None;
        }
    }
    Ok(out)
}

fn edge_color(shape: &ShapeNode) -> Rgba8 {
    match (&shape.fill, &shape.stroke) {
        (Fill::Solid(c), _) => Rgba8 { a: 255, ..*c },
        (_, Some(s)) => Rgba8 { a: 255, ..s.color },
        _ => Rgba8::BLACK,
    }
}

/// Pixel convolution; kernels wider than `max_order` on either axis are rejected.
pub fn raster(
    params: &ConvolveParams,
    max_order: u32,
    surface: &mut RasterSurface,
) -> DmlfxResult<()> {
    if params.order_x > max_order || params.order_y > max_order {
        return Err(DmlfxError::validation(format!(
            "kernel order {}x{} exceeds raster limit {max_order}",
            params.order_x, params.order_y
        )));
    }
    let img = kernels::convolve(surface.image(), params);
    surface.replace(img)
}
