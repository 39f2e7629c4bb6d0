//! One conversion routine per primitive family.
//!
//! Every routine tries a native vector mapping first. When the analyzer or the mapping itself
//! rejects it, the element is rasterized over the filter region and the primitive runs as a pixel
//! kernel instead; from then on the element stays raster, so it yields at most one raster block.

pub mod convolve;
pub mod displacement;
pub mod lighting;
pub mod morphology;
pub mod tile;
pub mod transfer;

use std::sync::Arc;

use crate::config::ConvertOptions;
use crate::emf::{PatternCache, PatternEntry};
use crate::foundation::core::{Rect, Rgba8};
use crate::foundation::error::DmlfxResult;
use crate::geometry::{GeometryEngine, PathSpec};
use crate::model::{
    Diagnostic, DiagnosticKind, Fill, FilterPrimitiveNode, PrimitiveKind, ShapeNode, ShapeStyle,
};
use crate::raster::RasterSurface;
use crate::strategy::{Strategy, StrategyDecision};

/// Shared inputs of one element's conversion plus the diagnostics it collects.
#[derive(Debug)]
pub struct ConvertContext<'a> {
    pub options: &'a ConvertOptions,
    pub engine: &'a dyn GeometryEngine,
    pub patterns: &'a PatternCache,
    /// Filter region in user space.
    pub region: Rect,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> ConvertContext<'a> {
    pub fn new(
        options: &'a ConvertOptions,
        engine: &'a dyn GeometryEngine,
        patterns: &'a PatternCache,
        region: Rect,
    ) -> Self {
        Self {
            options,
            engine,
            patterns,
            region,
            diagnostics: Vec::new(),
        }
    }

    pub fn diagnose(&mut self, d: Diagnostic) {
        tracing::warn!(kind = ?d.kind, node = ?d.node, "{}", d.message);
        self.diagnostics.push(d);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    pub(crate) fn tolerance(&self) -> f64 {
        self.engine.tolerance()
    }
}

/// Editable shapes in user space.
#[derive(Clone, Debug, Default)]
pub struct VectorStage {
    pub shapes: Vec<ShapeNode>,
    /// Pattern behind every `Fill::Tiled` shape.
    pub pattern: Option<Arc<PatternEntry>>,
}

impl VectorStage {
    pub fn new(shapes: Vec<ShapeNode>) -> Self {
        Self {
            shapes,
            pattern: None,
        }
    }

    /// The element itself, painted with its style.
    pub fn source(subject: &PathSpec, style: &ShapeStyle) -> Self {
        let fill = style.effective_fill().map_or(Fill::None, Fill::Solid);
        let mut shape = ShapeNode::new(subject.clone(), fill);
        shape.stroke = style.effective_stroke();
        Self::new(vec![shape])
    }

    /// The element's coverage in opaque black.
    pub fn source_alpha(subject: &PathSpec) -> Self {
        Self::new(vec![ShapeNode::new(
            subject.clone(),
            Fill::Solid(Rgba8::BLACK),
        )])
    }

    /// Geometry of every shape, in order.
    pub fn geometry(&self) -> Vec<PathSpec> {
        self.shapes.iter().map(|s| s.geometry.clone()).collect()
    }

    /// Keep only geometry-carrying shapes.
    pub(crate) fn prune(mut self) -> Self {
        self.shapes.retain(|s| !s.geometry.is_empty());
        self
    }

    fn outline(paths: &[PathSpec]) -> Self {
        Self::new(
            paths
                .iter()
                .map(|p| ShapeNode::new(p.clone(), Fill::None))
                .collect(),
        )
    }
}

/// The element rasterized over the filter region.
#[derive(Clone, Debug)]
pub struct RasterStage {
    pub surface: RasterSurface,
    /// Vector outline kept while every deferral so far was hybrid.
    pub outline: Option<Vec<PathSpec>>,
}

/// Intermediate result flowing between chain nodes.
#[derive(Clone, Debug)]
pub enum Stage {
    Vector(VectorStage),
    Raster(RasterStage),
}

/// Reason a native mapping was abandoned.
pub(crate) type Deferral = String;

/// Apply one primitive to `input` following `decision`.
pub fn convert_primitive(
    ctx: &mut ConvertContext<'_>,
    index: usize,
    node: &FilterPrimitiveNode,
    decision: &StrategyDecision,
    input: Stage,
) -> Stage {
    if let PrimitiveKind::Unsupported { name } = &node.kind {
        ctx.diagnose(
            Diagnostic::new(
                DiagnosticKind::IdentityPassThrough,
                format!("primitive '{name}' has no mapping; input passed through"),
            )
            .at(index),
        );
        return input;
    }
    match input {
        Stage::Vector(v) => from_vector(ctx, index, &node.kind, decision, v),
        Stage::Raster(mut r) => {
            r.outline = match (decision.strategy, r.outline.take()) {
                (Strategy::BinaryFallback, _) | (_, None) => None,
                (_, Some(paths)) => native(ctx, index, &node.kind, &VectorStage::outline(&paths))
                    .ok()
                    .map(|v| v.geometry()),
            };
            apply_raster(ctx, index, &node.kind, &mut r.surface);
            Stage::Raster(r)
        }
    }
}

fn from_vector(
    ctx: &mut ConvertContext<'_>,
    index: usize,
    kind: &PrimitiveKind,
    decision: &StrategyDecision,
    input: VectorStage,
) -> Stage {
    if let PrimitiveKind::Tile(params) = kind {
        return Stage::Vector(tile::vector(ctx, params, &input));
    }
    match decision.strategy {
        Strategy::NativeVector => match native(ctx, index, kind, &input) {
            Ok(v) => Stage::Vector(v),
            Err(reason) => {
                ctx.diagnose(
                    Diagnostic::new(
                        DiagnosticKind::Unsupported,
                        format!("{}: {reason}; rasterized", kind.name()),
                    )
                    .at(index),
                );
                defer(ctx, index, kind, input, None)
            }
        },
        Strategy::Hybrid => {
            let outline = native(ctx, index, kind, &input).ok().map(|v| v.geometry());
            defer(ctx, index, kind, input, outline)
        }
        Strategy::BinaryFallback => defer(ctx, index, kind, input, None),
    }
}

fn native(
    ctx: &mut ConvertContext<'_>,
    index: usize,
    kind: &PrimitiveKind,
    input: &VectorStage,
) -> Result<VectorStage, Deferral> {
    let out = match kind {
        PrimitiveKind::Morphology(p) => morphology::vector(ctx, p, input)?,
        PrimitiveKind::DiffuseLighting(p) => lighting::vector_diffuse(p, input)?,
        PrimitiveKind::SpecularLighting(p) => lighting::vector_specular(p, input)?,
        PrimitiveKind::ComponentTransfer(p) => transfer::vector(p, input)?,
        PrimitiveKind::DisplacementMap(p) => displacement::vector(ctx, index, p, input)?,
        PrimitiveKind::ConvolveMatrix(p) => convolve::vector(ctx, p, input)?,
        PrimitiveKind::Tile(p) => tile::vector(ctx, p, input),
        PrimitiveKind::Unsupported { name } => return Err(format!("no mapping for '{name}'")),
    };
    Ok(out.prune())
}

fn defer(
    ctx: &mut ConvertContext<'_>,
    index: usize,
    kind: &PrimitiveKind,
    input: VectorStage,
    outline: Option<Vec<PathSpec>>,
) -> Stage {
    match rasterize(ctx, index, &input) {
        Ok(mut surface) => {
            apply_raster(ctx, index, kind, &mut surface);
            Stage::Raster(RasterStage { surface, outline })
        }
        Err(e) => {
            ctx.diagnose(
                Diagnostic::new(
                    DiagnosticKind::IdentityPassThrough,
                    format!("{} cannot be rasterized ({e}); input passed through", kind.name()),
                )
                .at(index),
            );
            Stage::Vector(input)
        }
    }
}

/// Paint `input` onto a fresh surface over the filter region.
///
/// Native effects attached by earlier nodes have no pixel form here and are dropped.
pub fn rasterize(
    ctx: &mut ConvertContext<'_>,
    index: usize,
    input: &VectorStage,
) -> DmlfxResult<RasterSurface> {
    let mut surface = RasterSurface::new(ctx.region, &ctx.options.raster)?;
    let mut dropped = 0;
    for shape in &input.shapes {
        dropped += shape.effects.len();
        match (&shape.fill, &input.pattern) {
            (Fill::Solid(c), _) => surface.fill(&shape.geometry, *c),
            (Fill::Tiled { .. }, Some(p)) => {
                let mut layer = RasterSurface::new(ctx.region, &ctx.options.raster)?;
                layer.fill(&shape.geometry, Rgba8::BLACK);
                layer.fill_tiled_masked(&p.geometry, p.cell, p.key.color);
                surface.composite_over(layer.image());
            }
            _ => {}
        }
        if let Some(stroke) = &shape.stroke {
            surface.stroke(&shape.geometry, stroke);
        }
    }
    if dropped > 0 {
        ctx.diagnose(
            Diagnostic::new(
                DiagnosticKind::Unsupported,
                format!("{dropped} native effect(s) dropped when rasterizing"),
            )
            .at(index),
        );
    }
    Ok(surface)
}

fn apply_raster(
    ctx: &mut ConvertContext<'_>,
    index: usize,
    kind: &PrimitiveKind,
    surface: &mut RasterSurface,
) {
    let result = match kind {
        PrimitiveKind::Morphology(p) => morphology::raster(p, surface),
        PrimitiveKind::DiffuseLighting(p) => lighting::raster_diffuse(p, surface),
        PrimitiveKind::SpecularLighting(p) => lighting::raster_specular(p, surface),
        PrimitiveKind::ComponentTransfer(p) => transfer::raster(p, surface),
        PrimitiveKind::DisplacementMap(p) => displacement::raster(p, surface),
        PrimitiveKind::ConvolveMatrix(p) => {
            convolve::raster(p, ctx.options.budget.max_raster_kernel_order, surface)
        }
        PrimitiveKind::Tile(p) => {
            tile::raster(ctx, p, surface);
            Ok(())
        }
        PrimitiveKind::Unsupported { .. } => Ok(()),
    };
    if let Err(e) = result {
        ctx.diagnose(
            Diagnostic::new(
                DiagnosticKind::IdentityPassThrough,
                format!("{} kernel failed ({e}); input passed through", kind.name()),
            )
            .at(index),
        );
    }
}

#[cfg(test)]
#[path = "../../tests/unit/convert/mod.rs"]
mod tests;
