use crate::config::ComplexityBudget;
use crate::geometry::PathSpec;
use crate::geometry::outline::subdivided_vertex_count;
use crate::model::{
    ClipDefinition, FilterChain, FilterPrimitiveNode, LightSource, PrimitiveKind,
};
use crate::strategy::patterns::{classify_kernel, classify_transfer};

/// How an element or primitive is rendered, cheapest first.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Native, editable vector constructs only.
    NativeVector,
    /// Vector outline filled with an embedded raster.
    Hybrid,
    /// Embedded metafile.
    BinaryFallback,
}

/// Outcome of an analysis; never mutated after construction.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StrategyDecision {
    pub strategy: Strategy,
    pub complexity_score: f64,
    pub rationale: Vec<String>,
}

impl StrategyDecision {
    fn new(strategy: Strategy, complexity_score: f64, rationale: Vec<String>) -> Self {
        Self {
            strategy,
            complexity_score,
            rationale,
        }
    }

    /// `true` when a budget or feasibility rule, not the score, picked binary fallback.
    pub fn is_forced(&self) -> bool {
        self.strategy == Strategy::BinaryFallback
            && self.rationale.iter().any(|r| r.starts_with("forced:"))
    }
}

/// Per-node decisions for a whole chain.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ChainAnalysis {
    pub nodes: Vec<StrategyDecision>,
    pub total_score: f64,
}

impl ChainAnalysis {
    /// Costliest strategy over all nodes; native for an empty chain.
    pub fn overall(&self) -> Strategy {
        self.nodes
            .iter()
            .map(|d| d.strategy)
            .max()
            .unwrap_or(Strategy::NativeVector)
    }

    /// Index of the first node that does not stay native vector.
    pub fn first_deferred(&self) -> Option<usize> {
        self.nodes
            .iter()
            .position(|d| d.strategy != Strategy::NativeVector)
    }
}

/// What [`analyze`] looks at.
#[derive(Clone, Copy, Debug)]
pub enum AnalysisInput<'a> {
    Chain(&'a FilterChain),
    Clip(&'a ClipDefinition),
}

/// Single decision for a chain (its costliest node) or a clip.
pub fn analyze(
    input: AnalysisInput<'_>,
    subject: &PathSpec,
    budget: &ComplexityBudget,
    tolerance: f64,
) -> StrategyDecision {
    match input {
        AnalysisInput::Clip(clip) => analyze_clip(clip, subject, budget),
        AnalysisInput::Chain(chain) => {
            let analysis = analyze_chain(chain, subject, budget, tolerance);
            let strategy = analysis.overall();
            let mut rationale = vec![format!(
                "{} node(s), total score {:.3}",
                analysis.nodes.len(),
                analysis.total_score
            )];
            for (i, d) in analysis.nodes.iter().enumerate() {
                if d.strategy == strategy {
                    rationale.extend(d.rationale.iter().map(|r| format!("node {i}: {r}")));
                }
            }
            StrategyDecision::new(strategy, analysis.total_score, rationale)
        }
    }
}

/// Decide every node of `chain` applied to `subject`. `tolerance` is the flattening tolerance
/// the converters will use.
#[tracing::instrument(skip_all, fields(nodes = chain.len()))]
pub fn analyze_chain(
    chain: &FilterChain,
    subject: &PathSpec,
    budget: &ComplexityBudget,
    tolerance: f64,
) -> ChainAnalysis {
    let too_deep = chain.len() > budget.max_chain_depth;
    let mut total = 0.0;
    let mut over_total = false;
    let mut nodes = Vec::with_capacity(chain.len());

    for (i, node) in chain.nodes.iter().enumerate() {
        let mut d = analyze_node(node, i, subject, budget, tolerance);
        total += d.complexity_score;
        if too_deep {
            d = force(
                d,
                format!(
                    "chain depth {} exceeds budget {}",
                    chain.len(),
                    budget.max_chain_depth
                ),
            );
        } else if over_total || total > budget.max_total_score {
            over_total = true;
            d = force(
                d,
                format!(
                    "cumulative score {total:.3} exceeds budget {:.3}",
                    budget.max_total_score
                ),
            );
        }
        tracing::debug!(
            node = i,
            kind = node.kind.name(),
            strategy = ?d.strategy,
            score = d.complexity_score,
            "primitive strategy"
        );
        nodes.push(d);
    }

    ChainAnalysis {
        nodes,
        total_score: total,
    }
}

/// Decide one node at chain position `index`.
pub fn analyze_node(
    node: &FilterPrimitiveNode,
    index: usize,
    subject: &PathSpec,
    budget: &ComplexityBudget,
    tolerance: f64,
) -> StrategyDecision {
    let segments = subject.segment_count();
    let w = &budget.weights;
    let mut rationale = Vec::new();
    let mut forced: Option<String> = None;

    let weight = match &node.kind {
        PrimitiveKind::Morphology(p) => {
            let b = subject.bounds();
            let limit = budget.morphology_max_radius_ratio * b.width().min(b.height());
            let r = p.radius_x.max(p.radius_y);
            if r > limit {
                forced = Some(format!(
                    "morphology radius {r:.3} exceeds safety threshold {limit:.3}"
                ));
            }
            w.morphology
        }
        PrimitiveKind::DiffuseLighting(p) => {
            forced = cone_rule(&p.light);
            w.diffuse_lighting
        }
        PrimitiveKind::SpecularLighting(p) => {
            forced = cone_rule(&p.light);
            w.specular_lighting
        }
        PrimitiveKind::ComponentTransfer(p) => match classify_transfer(p) {
            Some(shape) => {
                rationale.push(format!("transfer classified as {shape:?}"));
                w.component_transfer
            }
            None => {
                forced = Some("transfer functions match no classified shape".to_string());
                w.component_transfer
            }
        },
        PrimitiveKind::DisplacementMap(p) => {
            if p.map.is_some() && p.scale.is_finite() && p.scale != 0.0 {
                let step = displacement_step(p.scale, budget);
                let n = subdivided_vertex_count(subject, step, tolerance);
                rationale.push(format!("subdivision yields {n} vertices"));
                if n > budget.displacement_max_vertices {
                    forced = Some(format!(
                        "subdivision needs {n} vertices, budget {}",
                        budget.displacement_max_vertices
                    ));
                }
            }
            w.displacement_map
        }
        PrimitiveKind::ConvolveMatrix(p) => {
            if !p.is_well_formed() {
                forced = Some("kernel size does not match its order".to_string());
                w.convolve_matrix
            } else if p.order_x > budget.max_known_kernel_order
                || p.order_y > budget.max_known_kernel_order
            {
                forced = Some(format!(
                    "kernel order {}x{} exceeds bound {}",
                    p.order_x, p.order_y, budget.max_known_kernel_order
                ));
                w.convolve_matrix
            } else if let Some(k) = classify_kernel(p, budget.max_known_kernel_order) {
                rationale.push(format!("kernel matches {k:?}"));
                w.known_kernel
            } else {
                forced = Some("kernel matches no known edge-detection kernel".to_string());
                w.convolve_matrix
            }
        }
        PrimitiveKind::Tile(_) => {
            forced = Some("tile always references the pattern library".to_string());
            w.tile
        }
        PrimitiveKind::Unsupported { name } => {
            forced = Some(format!("no mapping for primitive '{name}'"));
            w.unsupported
        }
    };

    let score = weight * (1.0 + segments as f64 / budget.segment_norm)
        + budget.depth_weight * index as f64;
    rationale.insert(
        0,
        format!(
            "{}: weight {weight:.3}, {segments} segment(s), depth {index} -> score {score:.3}",
            node.kind.name()
        ),
    );

    let decision = StrategyDecision::new(by_score(score, budget), score, rationale);
    match forced {
        Some(reason) => force(decision, reason),
        None => decision,
    }
}

/// Boolean resolution while the combined segment count stays within budget, else a metafile.
pub fn analyze_clip(
    clip: &ClipDefinition,
    subject: &PathSpec,
    budget: &ComplexityBudget,
) -> StrategyDecision {
    let segments = clip.segment_count() + subject.segment_count();
    let score = segments as f64 / budget.segment_norm;
    let mut rationale = vec![format!(
        "clip: {} child(ren), {segments} segment(s) with subject -> score {score:.3}",
        clip.children.len()
    )];
    let strategy = if segments > budget.max_clip_segments {
        rationale.push(format!(
            "forced: {segments} segments exceed clip budget {}",
            budget.max_clip_segments
        ));
        Strategy::BinaryFallback
    } else {
        Strategy::NativeVector
    };
    tracing::debug!(strategy = ?strategy, score, "clip strategy");
    StrategyDecision::new(strategy, score, rationale)
}

/// Subdivision step for a displacement of `scale`.
pub(crate) fn displacement_step(scale: f64, budget: &ComplexityBudget) -> f64 {
    1.0 / (budget.displacement_density * scale.abs()).max(1e-6)
}

fn by_score(score: f64, budget: &ComplexityBudget) -> Strategy {
    if score <= budget.native_ceiling {
        Strategy::NativeVector
    } else if score <= budget.hybrid_ceiling {
        Strategy::Hybrid
    } else {
        Strategy::BinaryFallback
    }
}

fn force(mut d: StrategyDecision, reason: String) -> StrategyDecision {
    d.strategy = Strategy::BinaryFallback;
    d.rationale.push(format!("forced: {reason}"));
    d
}

fn cone_rule(light: &LightSource) -> Option<String> {
    match light {
        LightSource::Spot {
            limiting_cone_angle: Some(a),
            ..
        } => Some(format!("spot light with a {a:.1} degree cone has no light rig")),
        _ => None,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/strategy/analyzer.rs"]
mod tests;
