use kurbo::PathEl;

use crate::foundation::core::{
    Affine, Point, Rect, affine_is_finite, rect_contains_rect, rects_overlap,
};
use crate::geometry::boolean::{BoolOp, boolean};
use crate::geometry::path::{FillRule, PathSpec, sanitize_tolerance};

/// Fill-rule-aware path algebra.
///
/// Implementations must never panic on degenerate input; anything that does not enclose area
/// resolves to [`PathSpec::empty`]. Callers only depend on this trait, so engines can be swapped
/// through [`GeometryBackend`] without touching them.
pub trait GeometryEngine: Send + Sync + std::fmt::Debug {
    /// `subject` intersected with every path in `clips`. No clips leaves the subject unclipped.
    fn intersect(&self, subject: &PathSpec, clips: &[PathSpec]) -> PathSpec;

    /// Region covered by any of `paths`.
    fn union(&self, paths: &[PathSpec]) -> PathSpec;

    /// `subject` minus the union of `clips`.
    fn difference(&self, subject: &PathSpec, clips: &[PathSpec]) -> PathSpec;

    /// Flattening tolerance in user units.
    fn tolerance(&self) -> f64;
}

/// Available boolean engines.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum GeometryBackend {
    /// Flatten curves to polygons for every operation.
    Flattening,
    /// Keep curves untouched whenever the result is exactly one of the inputs (or a disjoint
    /// concatenation of them); flatten otherwise.
    #[default]
    CurvePreserving,
}

/// Create the boolean engine selected by `backend`.
pub fn create_engine(backend: GeometryBackend, tolerance: f64) -> Box<dyn GeometryEngine> {
    let flat = FlatteningEngine::new(tolerance);
    match backend {
        GeometryBackend::Flattening => Box::new(flat),
        GeometryBackend::CurvePreserving => Box::new(CurvePreservingEngine { flat }),
    }
}

/// Apply `matrix` to `path`. A non-finite matrix yields the empty path.
pub fn transform(path: &PathSpec, matrix: Affine) -> PathSpec {
    if !affine_is_finite(matrix) {
        return PathSpec::empty();
    }
    path.transformed(matrix)
}

/// Tight bounds of `path`; [`Rect::ZERO`] when empty.
pub fn bounds(path: &PathSpec) -> Rect {
    path.bounds()
}

/// `true` when `path` covers a region of positive area under its own fill rule.
///
/// Non-zero paths with a net signed area answer from the flattened contours alone. Anything else
/// (even-odd paths, windings that cancel) is settled by a single-operand union.
pub fn encloses_area(path: &PathSpec, tolerance: f64) -> bool {
    if path.is_empty() {
        return false;
    }
    let tolerance = sanitize_tolerance(tolerance);
    if path.fill_rule() == FillRule::NonZero {
        let signed: f64 = path.flatten(tolerance).iter().map(|c| signed_area(c)).sum();
        if signed.abs() > 1e-9 {
            return true;
        }
    }
    !boolean(&[path], BoolOp::Union, tolerance).is_empty()
}

fn signed_area(pts: &[Point]) -> f64 {
    let n = pts.len();
    (0..n)
        .map(|i| {
            let (a, b) = (pts[i], pts[(i + 1) % n]);
            a.x * b.y - b.x * a.y
        })
        .sum::<f64>()
        * 0.5
}

/// Polygon engine: curves are flattened with `tolerance` before the slab sweep.
#[derive(Clone, Copy, Debug)]
pub struct FlatteningEngine {
    tolerance: f64,
}

impl FlatteningEngine {
    /// Engine with the given flattening tolerance.
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance: sanitize_tolerance(tolerance),
        }
    }
}

impl GeometryEngine for FlatteningEngine {
    fn intersect(&self, subject: &PathSpec, clips: &[PathSpec]) -> PathSpec {
        if clips.is_empty() {
            return subject.clone();
        }
        let mut operands = Vec::with_capacity(clips.len() + 1);
        operands.push(subject);
        operands.extend(clips.iter());
        boolean(&operands, BoolOp::Intersect, self.tolerance)
    }

    fn union(&self, paths: &[PathSpec]) -> PathSpec {
        let operands: Vec<&PathSpec> = paths.iter().collect();
        boolean(&operands, BoolOp::Union, self.tolerance)
    }

    fn difference(&self, subject: &PathSpec, clips: &[PathSpec]) -> PathSpec {
        if clips.is_empty() {
            return subject.clone();
        }
        let mut operands = Vec::with_capacity(clips.len() + 1);
        operands.push(subject);
        operands.extend(clips.iter());
        boolean(&operands, BoolOp::Difference, self.tolerance)
    }

    fn tolerance(&self) -> f64 {
        self.tolerance
    }
}

/// Engine that answers from bounds whenever the result is provably one of its inputs, so curved
/// outlines stay curved. Pass-through results keep the input's own fill rule, and only operands
/// that enclose area are ever passed through.
#[derive(Clone, Copy, Debug)]
pub struct CurvePreservingEngine {
    flat: FlatteningEngine,
}

impl GeometryEngine for CurvePreservingEngine {
    fn intersect(&self, subject: &PathSpec, clips: &[PathSpec]) -> PathSpec {
        if clips.is_empty() {
            return subject.clone();
        }
        if subject.is_empty() || clips.iter().any(PathSpec::is_empty) {
            return PathSpec::empty();
        }
        let sb = subject.bounds();
        if clips.iter().any(|c| !rects_overlap(sb, c.bounds())) {
            return PathSpec::empty();
        }
        if clips
            .iter()
            .all(|c| axis_rect(c).is_some_and(|r| rect_contains_rect(r, sb)))
        {
            return self.pass_through(subject);
        }
        if let [clip] = clips {
            if axis_rect(subject).is_some_and(|r| rect_contains_rect(r, clip.bounds())) {
                return self.pass_through(clip);
            }
        }
        self.flat.intersect(subject, clips)
    }

    fn union(&self, paths: &[PathSpec]) -> PathSpec {
        let live: Vec<&PathSpec> = paths.iter().filter(|p| !p.is_empty()).collect();
        match live.as_slice() {
            [] => return PathSpec::empty(),
            [one] => return self.pass_through(one),
            _ => {}
        }
        let rule = live[0].fill_rule();
        let same_rule = live.iter().all(|p| p.fill_rule() == rule);
        let disjoint = live.iter().enumerate().all(|(i, a)| {
            live[i + 1..]
                .iter()
                .all(|b| !rects_overlap(a.bounds(), b.bounds()))
        });
        if same_rule && disjoint && live.iter().all(|p| self.encloses(p)) {
            let mut out = kurbo::BezPath::new();
            for p in &live {
                out.extend(p.path().iter());
            }
            return PathSpec::new(out, rule);
        }
        self.flat.union(paths)
    }

    fn difference(&self, subject: &PathSpec, clips: &[PathSpec]) -> PathSpec {
        if subject.is_empty() {
            return PathSpec::empty();
        }
        let sb = subject.bounds();
        let touching: Vec<PathSpec> = clips
            .iter()
            .filter(|c| !c.is_empty() && rects_overlap(sb, c.bounds()))
            .cloned()
            .collect();
        if touching.is_empty() {
            return self.pass_through(subject);
        }
        self.flat.difference(subject, &touching)
    }

    fn tolerance(&self) -> f64 {
        self.flat.tolerance
    }
}

impl CurvePreservingEngine {
    fn encloses(&self, path: &PathSpec) -> bool {
        encloses_area(path, self.flat.tolerance)
    }

    // The operand itself as the result, or empty when its windings cancel out.
    fn pass_through(&self, path: &PathSpec) -> PathSpec {
        if self.encloses(path) {
            path.clone()
        } else {
            PathSpec::empty()
        }
    }
}

/// Detect a single axis-aligned rectangle made of straight segments.
pub(crate) fn axis_rect(p: &PathSpec) -> Option<Rect> {
    let mut pts = Vec::with_capacity(5);
    for el in p.path().elements() {
        match *el {
            PathEl::MoveTo(pt) => {
                if !pts.is_empty() {
                    return None;
                }
                pts.push(pt);
            }
            PathEl::LineTo(pt) => {
                if pts.last() != Some(&pt) {
                    pts.push(pt);
                }
            }
            PathEl::ClosePath => {}
            PathEl::QuadTo(..) | PathEl::CurveTo(..) => return None,
        }
    }
    if pts.len() == 5 && pts[0] == pts[4] {
        pts.pop();
    }
    if pts.len() != 4 {
        return None;
    }
    for i in 0..4 {
        let a = pts[i];
        let b = pts[(i + 1) % 4];
        if a.x != b.x && a.y != b.y {
            return None;
        }
    }
    let r = Rect::from_points(pts[0], pts[2]);
    if r.width() > 0.0 && r.height() > 0.0 {
        Some(r)
    } else {
        None
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/engine.rs"]
mod tests;
