use std::collections::BTreeSet;

use crate::foundation::core::{Affine, Rect, affine_is_finite};
use crate::geometry::{GeometryEngine, PathSpec};
use crate::model::{ClipDefinition, ClipLibrary, Diagnostic, DiagnosticKind, UnitsMode};

/// Outcome of clipping one element.
#[derive(Clone, Debug, PartialEq)]
pub enum ClipOutcome {
    /// No usable clip; the element is drawn as is.
    Unclipped,
    /// The resolved element geometry.
    Clipped(PathSpec),
    /// Nothing of the element survives.
    Removed,
}

/// A reference chain followed to its end.
#[derive(Clone, Debug, Default)]
pub struct ClipChain<'a> {
    /// Definitions in reference order; the first is the element's own clip.
    pub levels: Vec<&'a ClipDefinition>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ClipChain<'_> {
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Combined segment count of every level.
    pub fn segment_count(&self) -> usize {
        self.levels.iter().map(|d| d.segment_count()).sum()
    }
}

/// Follow `id` through `library` until a definition without a further reference.
///
/// A missing id ends the chain with a dangling-reference diagnostic; an id seen twice ends it with
/// a cycle diagnostic. Either way the offending reference contributes no clipping.
pub fn follow_chain<'a>(id: &str, library: &'a ClipLibrary) -> ClipChain<'a> {
    let mut chain = ClipChain::default();
    let mut visited = BTreeSet::new();
    let mut next = Some(id.to_string());
    while let Some(id) = next.take() {
        if !visited.insert(id.clone()) {
            tracing::warn!(clip = %id, "clip reference cycle");
            chain.diagnostics.push(Diagnostic::new(
                DiagnosticKind::ReferenceCycle,
                format!("clip reference '{id}' loops back; ignored"),
            ));
            break;
        }
        match library.get(&id) {
            Some(def) => {
                chain.levels.push(def);
                next = def.clip_ref.clone();
            }
            None => {
                tracing::warn!(clip = %id, "dangling clip reference");
                chain.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::DanglingReference,
                    format!("clip '{id}' is not defined; no clipping"),
                ));
            }
        }
    }
    chain
}

/// Clip children mapped into the element's space.
///
/// `element` and the result live in the space reached through `cumulative`; the bounding box of
/// bbox-mode clips is measured in the element's own user space. `None` when `cumulative` is not
/// invertible.
pub fn map_children(
    element: &PathSpec,
    clip: &ClipDefinition,
    cumulative: Affine,
) -> Option<Vec<PathSpec>> {
    if !affine_is_finite(cumulative) || cumulative.determinant().abs() < 1e-12 {
        return None;
    }
    let matrix = match clip.units {
        UnitsMode::UserSpaceOnUse => cumulative * clip.transform,
        UnitsMode::ObjectBoundingBox => {
            let bbox = element.transformed(cumulative.inverse()).bounds();
            cumulative * bbox_matrix(bbox) * clip.transform
        }
    };
    if !affine_is_finite(matrix) {
        return None;
    }
    Some(clip.children.iter().map(|c| c.transformed(matrix)).collect())
}

fn bbox_matrix(bbox: Rect) -> Affine {
    Affine::new([bbox.width(), 0.0, 0.0, bbox.height(), bbox.x0, bbox.y0])
}

/// Intersect `element` with one clip definition.
///
/// Children are unioned first. `None` means the element is fully clipped, which also covers a
/// clip without children and a degenerate bounding box.
#[tracing::instrument(skip_all, fields(children = clip.children.len()))]
pub fn resolve(
    element: &PathSpec,
    clip: &ClipDefinition,
    cumulative: Affine,
    engine: &dyn GeometryEngine,
) -> Option<PathSpec> {
    let region = clip_region(element, clip, cumulative, engine)?;
    let out = engine.intersect(element, &[region]);
    (!out.is_empty()).then_some(out)
}

/// Resolve the clip chain starting at `id` for `element`.
pub fn resolve_reference(
    element: &PathSpec,
    id: &str,
    library: &ClipLibrary,
    cumulative: Affine,
    engine: &dyn GeometryEngine,
) -> (ClipOutcome, Vec<Diagnostic>) {
    let chain = follow_chain(id, library);
    let outcome = resolve_chain(element, &chain, cumulative, engine);
    (outcome, chain.diagnostics)
}

/// Intersect `element` with every level of `chain`.
pub fn resolve_chain(
    element: &PathSpec,
    chain: &ClipChain<'_>,
    cumulative: Affine,
    engine: &dyn GeometryEngine,
) -> ClipOutcome {
    if chain.is_empty() {
        return ClipOutcome::Unclipped;
    }
    let mut regions = Vec::with_capacity(chain.levels.len());
    for def in &chain.levels {
        match clip_region(element, def, cumulative, engine) {
            Some(r) => regions.push(r),
            None => return ClipOutcome::Removed,
        }
    }
    let out = engine.intersect(element, &regions);
    if out.is_empty() {
        ClipOutcome::Removed
    } else {
        ClipOutcome::Clipped(out)
    }
}

fn clip_region(
    element: &PathSpec,
    clip: &ClipDefinition,
    cumulative: Affine,
    engine: &dyn GeometryEngine,
) -> Option<PathSpec> {
    let children = map_children(element, clip, cumulative)?;
    let region = engine.union(&children);
    (!region.is_empty()).then_some(region)
}

#[cfg(test)]
#[path = "../../tests/unit/clip/resolver.rs"]
mod tests;
