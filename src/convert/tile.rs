use crate::convert::{ConvertContext, VectorStage};
use crate::emf::PatternParams;
use crate::geometry::PathSpec;
use crate::model::{Fill, ResourceSlot, ShapeNode};
use crate::raster::RasterSurface;

/// Every shape, cut to the filter region, filled with the cached library pattern.
///
/// The fill always points at slot 0, which the dispatcher binds to the pattern's metafile.
pub fn vector(
    ctx: &ConvertContext<'_>,
    params: &PatternParams,
    input: &VectorStage,
) -> VectorStage {
    let entry = ctx.patterns.get_or_create_pattern(params);
    let region = PathSpec::rect(ctx.region);
    let shapes = input
        .shapes
        .iter()
        .filter_map(|s| {
            let g = ctx.engine.intersect(&s.geometry, std::slice::from_ref(&region));
            (!g.is_empty()).then(|| {
                ShapeNode::new(
                    g,
                    Fill::Tiled {
                        resource: ResourceSlot(0),
                        tile: entry.cell,
                    },
                )
            })
        })
        .collect();
    VectorStage {
        shapes,
        pattern: Some(entry),
    }
}

pub fn raster(ctx: &ConvertContext<'_>, params: &PatternParams, surface: &mut RasterSurface) {
    let entry = ctx.patterns.get_or_create_pattern(params);
    surface.fill_tiled_masked(&entry.geometry, entry.cell, entry.key.color);
}
