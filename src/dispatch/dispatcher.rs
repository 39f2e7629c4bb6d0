use std::sync::Arc;

use rayon::prelude::*;

use crate::clip::{ClipChain, ClipOutcome, follow_chain, map_children, resolve_chain};
use crate::config::ConvertOptions;
use crate::convert::{
    ConvertContext, RasterStage, Stage, VectorStage, convert_primitive, rasterize,
};
use crate::dispatch::result::{ConversionResult, ElementOutput};
use crate::emf::{EmfDocument, PatternCache, emit_clipped, emit_raster_block};
use crate::foundation::core::{Affine, Rect, affine_is_finite, rects_overlap};
use crate::foundation::error::{DmlfxError, DmlfxResult};
use crate::geometry::{GeometryEngine, PathSpec, create_engine, encloses_area};
use crate::model::{
    ClipDefinition, ClipLibrary, Diagnostic, DiagnosticKind, DrawNode, ElementInput, Fill,
    FilterChain, PrimitiveKind, ResolvedInput, ResourceSlot, ShapeNode, VectorFragment,
};
use crate::strategy::{Strategy, StrategyDecision, analyze_chain, analyze_clip};

/// Runs clip resolution, strategy analysis and primitive conversion for elements.
///
/// Elements never share state except through the pattern cache, so [`convert_all`] may run them
/// on any number of threads and still match sequential output.
///
/// [`convert_all`]: Self::convert_all
#[derive(Debug)]
pub struct Dispatcher {
    options: ConvertOptions,
    engine: Box<dyn GeometryEngine>,
    patterns: Arc<PatternCache>,
    threads: Option<usize>,
}

impl Dispatcher {
    /// Dispatcher over validated `options` sharing `patterns`.
    pub fn new(options: ConvertOptions, patterns: Arc<PatternCache>) -> DmlfxResult<Self> {
        options.validate()?;
        let engine = create_engine(options.geometry.backend, options.geometry.tolerance);
        Ok(Self {
            options,
            engine,
            patterns,
            threads: None,
        })
    }

    /// Run [`convert_all`](Self::convert_all) on a dedicated pool of `threads` workers.
    pub fn with_threads(mut self, threads: usize) -> DmlfxResult<Self> {
        if threads == 0 {
            return Err(DmlfxError::validation("dispatch threads must be >= 1 when set"));
        }
        self.threads = Some(threads);
        Ok(self)
    }

    /// Options every element is converted with.
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Pattern library shared with other dispatchers.
    pub fn patterns(&self) -> &Arc<PatternCache> {
        &self.patterns
    }

    /// Convert every element in parallel; output order follows input order.
    #[tracing::instrument(skip_all, fields(elements = elements.len()))]
    pub fn convert_all(
        &self,
        elements: &[ElementInput],
        clips: &ClipLibrary,
    ) -> DmlfxResult<Vec<ElementOutput>> {
        let run = || {
            elements
                .par_iter()
                .map(|e| self.convert(e, clips))
                .collect::<DmlfxResult<Vec<_>>>()
        };
        match self.threads {
            Some(n) => build_thread_pool(n)?.install(run),
            None => run(),
        }
    }

    /// Convert elements one after another.
    pub fn convert_sequential(
        &self,
        elements: &[ElementInput],
        clips: &ClipLibrary,
    ) -> DmlfxResult<Vec<ElementOutput>> {
        elements.iter().map(|e| self.convert(e, clips)).collect()
    }

    /// Convert one element. Only an internal invariant violation is an error; everything else
    /// ends up as a diagnostic on the output.
    #[tracing::instrument(skip_all, fields(element = %element.id))]
    pub fn convert(
        &self,
        element: &ElementInput,
        clips: &ClipLibrary,
    ) -> DmlfxResult<ElementOutput> {
        let mut diagnostics = Vec::new();
        let transform = if affine_is_finite(element.transform) {
            element.transform
        } else {
            diagnostics.push(malformed("element transform is not finite; identity used"));
            Affine::IDENTITY
        };
        let original = if element.path.is_finite() {
            element.path.clone()
        } else {
            diagnostics.push(malformed("element path has non-finite coordinates; emptied"));
            PathSpec::empty()
        };
        if original.is_empty() {
            return Ok(removed(element, diagnostics));
        }
        // A stroke still draws an open or zero-area outline; a bare fill does not.
        if element.style.stroke.is_none() && !encloses_area(&original, self.engine.tolerance()) {
            diagnostics.push(malformed("element path encloses no area; removed"));
            return Ok(removed(element, diagnostics));
        }

        let mut subject = original.clone();
        let mut clip_levels: Option<Vec<Vec<PathSpec>>> = None;
        if let Some(id) = &element.clip {
            let chain = follow_chain(id, clips);
            diagnostics.extend(chain.diagnostics.iter().cloned());
            if !chain.is_empty() {
                let decision =
                    analyze_clip(&flatten_chain(&chain), &subject, &self.options.budget);
                if decision.strategy == Strategy::BinaryFallback {
                    diagnostics.push(budget_exceeded(&decision, None));
                    match mapped_levels(&subject, &chain, self.engine.tolerance()) {
                        Some(levels) => clip_levels = Some(levels),
                        None => return Ok(removed(element, diagnostics)),
                    }
                } else {
                    match resolve_chain(&subject, &chain, Affine::IDENTITY, self.engine.as_ref()) {
                        ClipOutcome::Unclipped => {}
                        ClipOutcome::Clipped(p) => subject = p,
                        ClipOutcome::Removed => return Ok(removed(element, diagnostics)),
                    }
                }
            }
        }

        let chain = element.filter.as_ref().filter(|c| !c.is_empty());
        let (stage, decisions) = match (chain, &clip_levels) {
            (None, Some(levels)) => {
                let doc = match clip_fallback(&subject, levels, element, self.engine.as_ref()) {
                    Ok(doc) => doc,
                    Err(e) => {
                        tracing::debug!(error = %e, "clipped metafile has no visible area");
                        return Ok(removed(element, diagnostics));
                    }
                };
                let result = picture_result(element, transform, doc, diagnostics);
                result.check()?;
                return Ok(ElementOutput::Drawn(result));
            }
            (None, None) => (
                Stage::Vector(VectorStage::source(&subject, &element.style)),
                Vec::new(),
            ),
            (Some(chain), levels) => {
                let region = chain.region.resolve(original.bounds());
                self.run_chain(
                    chain,
                    element,
                    &subject,
                    levels.as_deref(),
                    region,
                    &mut diagnostics,
                )
            }
        };

        let Some((nodes, resources, strategy)) = assemble(stage)? else {
            return Ok(removed(element, diagnostics));
        };
        let mut fragment = VectorFragment::new(element.id.clone(), transform);
        fragment.nodes = nodes;
        let result = ConversionResult {
            vector_fragment: fragment,
            embedded_resources: resources,
            strategy,
            decisions,
            diagnostics,
        };
        result.check()?;
        tracing::debug!(
            strategy = ?result.strategy,
            resources = result.embedded_resources.len(),
            "element converted"
        );
        Ok(ElementOutput::Drawn(result))
    }

    fn run_chain(
        &self,
        chain: &FilterChain,
        element: &ElementInput,
        subject: &PathSpec,
        clip_levels: Option<&[Vec<PathSpec>]>,
        region: Rect,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> (Stage, Vec<StrategyDecision>) {
        let analysis = analyze_chain(
            chain,
            subject,
            &self.options.budget,
            self.options.geometry.tolerance,
        );
        for (i, (node, d)) in chain.nodes.iter().zip(&analysis.nodes).enumerate() {
            if d.is_forced()
                && !matches!(
                    node.kind,
                    PrimitiveKind::Tile(_) | PrimitiveKind::Unsupported { .. }
                )
            {
                diagnostics.push(budget_exceeded(d, Some(i)));
            }
        }
        let (inputs, dangling) = chain.resolve_inputs();
        for (i, name) in dangling {
            tracing::warn!(node = i, input = %name, "dangling filter input");
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::DanglingReference,
                    format!("input '{name}' is not an earlier result; previous output used"),
                )
                .at(i),
            );
        }

        let mut ctx = ConvertContext::new(
            &self.options,
            self.engine.as_ref(),
            &self.patterns,
            region,
        );
        let source = VectorStage::source(subject, &element.style);
        let alpha = VectorStage::source_alpha(subject);
        let (source, alpha) = match clip_levels {
            None => (Stage::Vector(source), Stage::Vector(alpha)),
            Some(levels) => (
                masked(&mut ctx, &source, levels),
                masked(&mut ctx, &alpha, levels),
            ),
        };

        let mut outputs: Vec<Stage> = Vec::with_capacity(chain.len());
        for (i, node) in chain.nodes.iter().enumerate() {
            let input = match inputs[i] {
                ResolvedInput::Source => source.clone(),
                ResolvedInput::SourceAlpha => alpha.clone(),
                ResolvedInput::Node(j) => outputs[j].clone(),
            };
            let out = convert_primitive(&mut ctx, i, node, &analysis.nodes[i], input);
            outputs.push(out);
        }
        diagnostics.extend(ctx.take_diagnostics());
        let last = outputs.pop().unwrap_or(source);
        (last, analysis.nodes)
    }
}

fn build_thread_pool(threads: usize) -> DmlfxResult<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| DmlfxError::invariant(format!("failed to build rayon thread pool: {e}")))
}

fn malformed(message: &str) -> Diagnostic {
    tracing::warn!("{message}");
    Diagnostic::new(DiagnosticKind::Malformed, message)
}

fn budget_exceeded(d: &StrategyDecision, node: Option<usize>) -> Diagnostic {
    let reason = d
        .rationale
        .iter()
        .rev()
        .find_map(|r| r.strip_prefix("forced: "))
        .unwrap_or("complexity budget exceeded");
    tracing::warn!(node = ?node, "{reason}");
    let kind = if reason.contains("exceed") || reason.contains("budget") {
        DiagnosticKind::BudgetExceeded
    } else {
        DiagnosticKind::Unsupported
    };
    let diag = Diagnostic::new(kind, reason);
    match node {
        Some(i) => diag.at(i),
        None => diag,
    }
}

fn removed(element: &ElementInput, diagnostics: Vec<Diagnostic>) -> ElementOutput {
    tracing::debug!(element = %element.id, "element removed");
    ElementOutput::Removed {
        id: element.id.clone(),
        diagnostics,
    }
}

// Every child of every level, for sizing the chain as a whole.
fn flatten_chain(chain: &ClipChain<'_>) -> ClipDefinition {
    ClipDefinition::new(
        chain
            .levels
            .iter()
            .flat_map(|d| d.children.iter().cloned())
            .collect(),
    )
}

// Children of every level in the subject's space, keeping only those that enclose area. `None`
// when some level cannot overlap what the levels before it leave visible, so nothing is drawn.
fn mapped_levels(
    subject: &PathSpec,
    chain: &ClipChain<'_>,
    tolerance: f64,
) -> Option<Vec<Vec<PathSpec>>> {
    let mut visible = subject.bounds();
    let mut levels = Vec::with_capacity(chain.levels.len());
    for d in &chain.levels {
        let children: Vec<PathSpec> = map_children(subject, d, Affine::IDENTITY)?
            .into_iter()
            .filter(|c| encloses_area(c, tolerance))
            .collect();
        let reach = children
            .iter()
            .map(PathSpec::bounds)
            .reduce(|a, b| a.union(b))?;
        if !rects_overlap(visible, reach) {
            return None;
        }
        visible = visible.intersect(reach);
        levels.push(children);
    }
    Some(levels)
}

fn clip_fallback(
    subject: &PathSpec,
    levels: &[Vec<PathSpec>],
    element: &ElementInput,
    engine: &dyn GeometryEngine,
) -> DmlfxResult<EmfDocument> {
    let (first, nested) = levels
        .split_first()
        .map_or((&[][..], &[][..]), |(f, n)| (&f[..], n));
    // Only the first level is unioned by the metafile itself.
    let nested: Vec<PathSpec> = nested.iter().map(|level| engine.union(level)).collect();
    emit_clipped(first, &nested, std::slice::from_ref(subject), &element.style)
}

fn picture_result(
    element: &ElementInput,
    transform: Affine,
    doc: EmfDocument,
    diagnostics: Vec<Diagnostic>,
) -> ConversionResult {
    let mut fragment = VectorFragment::new(element.id.clone(), transform);
    fragment.nodes.push(DrawNode::Picture {
        resource: ResourceSlot(0),
        bounds: doc.bounds(),
    });
    ConversionResult {
        vector_fragment: fragment,
        embedded_resources: vec![Arc::new(doc)],
        strategy: Strategy::BinaryFallback,
        decisions: Vec::new(),
        diagnostics,
    }
}

fn masked(ctx: &mut ConvertContext<'_>, input: &VectorStage, levels: &[Vec<PathSpec>]) -> Stage {
    match rasterize(ctx, 0, input) {
        Ok(mut surface) => {
            surface.mask_with(levels);
            Stage::Raster(RasterStage {
                surface,
                outline: None,
            })
        }
        Err(e) => {
            ctx.diagnose(Diagnostic::new(
                DiagnosticKind::IdentityPassThrough,
                format!("clipped source cannot be rasterized ({e}); clip ignored"),
            ));
            Stage::Vector(input.clone())
        }
    }
}

type Assembled = (Vec<DrawNode>, Vec<Arc<EmfDocument>>, Strategy);

// Turn the final stage into drawing nodes and resources. `None` when nothing is left to draw.
fn assemble(stage: Stage) -> DmlfxResult<Option<Assembled>> {
    match stage {
        Stage::Vector(v) => {
            if v.shapes.is_empty() {
                return Ok(None);
            }
            let tiled = v
                .shapes
                .iter()
                .any(|s| matches!(s.fill, Fill::Tiled { .. }));
            let nodes = v.shapes.into_iter().map(DrawNode::Shape).collect();
            match (tiled, v.pattern) {
                (true, Some(p)) => Ok(Some((
                    nodes,
                    vec![Arc::clone(&p.document)],
                    Strategy::BinaryFallback,
                ))),
                (true, None) => Err(DmlfxError::invariant(
                    "tiled fill without a pattern entry",
                )),
                (false, _) => Ok(Some((nodes, Vec::new(), Strategy::NativeVector))),
            }
        }
        Stage::Raster(r) => {
            let region = r.surface.region();
            let doc = Arc::new(emit_raster_block(r.surface.image(), region)?);
            let outline: Vec<PathSpec> = r
                .outline
                .unwrap_or_default()
                .into_iter()
                .filter(|p| !p.is_empty())
                .collect();
            if outline.is_empty() {
                let node = DrawNode::Picture {
                    resource: ResourceSlot(0),
                    bounds: region,
                };
                return Ok(Some((vec![node], vec![doc], Strategy::BinaryFallback)));
            }
            let nodes = outline
                .into_iter()
                .map(|p| {
                    DrawNode::Shape(ShapeNode::new(
                        p,
                        Fill::Picture {
                            resource: ResourceSlot(0),
                            bounds: region,
                        },
                    ))
                })
                .collect();
            Ok(Some((nodes, vec![doc], Strategy::Hybrid)))
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/dispatch/dispatcher.rs"]
mod tests;
