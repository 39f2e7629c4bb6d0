use kurbo::{PathEl, Shape as _};

use crate::foundation::core::{Affine, BezPath, Point, Rect, Vec2};
use crate::foundation::error::{DmlfxError, DmlfxResult};

/// Winding convention that decides which regions of a path are inside.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum FillRule {
    /// Inside when the winding number is non-zero.
    #[default]
    NonZero,
    /// Inside when the winding number is odd.
    EvenOdd,
}

impl FillRule {
    /// Apply the rule to a winding number.
    pub fn is_inside(self, winding: i32) -> bool {
        match self {
            Self::NonZero => winding != 0,
            Self::EvenOdd => winding % 2 != 0,
        }
    }
}

/// Immutable path geometry tagged with its fill rule.
///
/// Segments are stored as a [`BezPath`]; elliptical arcs are lowered to cubic segments when the
/// path is built, so every consumer only sees move/line/quad/cubic/close elements.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "PathSpecRepr", into = "PathSpecRepr")]
pub struct PathSpec {
    path: BezPath,
    fill_rule: FillRule,
}

/// Wire form: SVG path data plus fill rule.
#[derive(serde::Serialize, serde::Deserialize)]
struct PathSpecRepr {
    d: String,
    #[serde(default)]
    fill_rule: FillRule,
}

impl TryFrom<PathSpecRepr> for PathSpec {
    type Error = DmlfxError;

    fn try_from(r: PathSpecRepr) -> Result<Self, Self::Error> {
        Self::from_svg(&r.d, r.fill_rule)
    }
}

impl From<PathSpec> for PathSpecRepr {
    fn from(p: PathSpec) -> Self {
        Self {
            d: p.path.to_svg(),
            fill_rule: p.fill_rule,
        }
    }
}

impl PathSpec {
    /// Wrap an existing path.
    pub fn new(path: BezPath, fill_rule: FillRule) -> Self {
        Self { path, fill_rule }
    }

    /// The empty path ("nothing to draw").
    pub fn empty() -> Self {
        Self::default()
    }

    /// Axis-aligned rectangle, clockwise in a y-down space.
    pub fn rect(r: Rect) -> Self {
        Self::new(r.to_path(0.1), FillRule::NonZero)
    }

    /// Ellipse inscribed in `r`, flattened-free (cubic approximation).
    pub fn ellipse(r: Rect, tolerance: f64) -> Self {
        let e = kurbo::Ellipse::from_rect(r);
        Self::new(e.to_path(tolerance), FillRule::NonZero)
    }

    /// Circle around `center`.
    pub fn circle(center: Point, radius: f64, tolerance: f64) -> Self {
        Self::new(
            kurbo::Circle::new(center, radius).to_path(tolerance),
            FillRule::NonZero,
        )
    }

    /// Closed polygon through `points`.
    pub fn polygon(points: &[Point], fill_rule: FillRule) -> Self {
        let mut b = PathBuilder::new(fill_rule);
        for (i, p) in points.iter().enumerate() {
            if i == 0 {
                b.move_to(*p);
            } else {
                b.line_to(*p);
            }
        }
        b.close();
        b.build()
    }

    /// Parse SVG path data (`d` attribute syntax).
    pub fn from_svg(d: &str, fill_rule: FillRule) -> DmlfxResult<Self> {
        let path = BezPath::from_svg(d)
            .map_err(|e| DmlfxError::validation(format!("invalid svg path data: {e}")))?;
        Ok(Self::new(path, fill_rule))
    }

    /// Underlying path elements.
    pub fn path(&self) -> &BezPath {
        &self.path
    }

    /// Fill rule of this path.
    pub fn fill_rule(&self) -> FillRule {
        self.fill_rule
    }

    /// Same geometry with a different fill rule.
    pub fn with_fill_rule(&self, fill_rule: FillRule) -> Self {
        Self {
            path: self.path.clone(),
            fill_rule,
        }
    }

    /// `true` when the path has no drawing segments.
    pub fn is_empty(&self) -> bool {
        !self
            .path
            .elements()
            .iter()
            .any(|el| matches!(el, PathEl::LineTo(_) | PathEl::QuadTo(..) | PathEl::CurveTo(..)))
    }

    /// Number of drawing segments (lines and curves), used as a complexity measure.
    pub fn segment_count(&self) -> usize {
        self.path
            .elements()
            .iter()
            .filter(|el| !matches!(el, PathEl::MoveTo(_)))
            .count()
    }

    /// `true` when any segment is a curve.
    pub fn has_curves(&self) -> bool {
        self.path
            .elements()
            .iter()
            .any(|el| matches!(el, PathEl::QuadTo(..) | PathEl::CurveTo(..)))
    }

    /// `true` when every coordinate is finite.
    pub fn is_finite(&self) -> bool {
        self.path.elements().iter().all(|el| match *el {
            PathEl::MoveTo(p) | PathEl::LineTo(p) => p.is_finite(),
            PathEl::QuadTo(a, b) => a.is_finite() && b.is_finite(),
            PathEl::CurveTo(a, b, c) => a.is_finite() && b.is_finite() && c.is_finite(),
            PathEl::ClosePath => true,
        })
    }

    /// Tight bounds of the drawn geometry; [`Rect::ZERO`] for empty paths.
    pub fn bounds(&self) -> Rect {
        if self.is_empty() {
            return Rect::ZERO;
        }
        self.path.bounding_box()
    }

    /// Geometry mapped through `affine`. The fill rule is kept.
    pub fn transformed(&self, affine: Affine) -> Self {
        Self {
            path: affine * self.path.clone(),
            fill_rule: self.fill_rule,
        }
    }

    /// Flatten into closed polylines. Every subpath is treated as implicitly closed, which is
    /// how fills interpret open subpaths.
    pub fn flatten(&self, tolerance: f64) -> Vec<Vec<Point>> {
        let tolerance = sanitize_tolerance(tolerance);
        let mut contours = Vec::<Vec<Point>>::new();
        let mut current = Vec::<Point>::new();
        kurbo::flatten(self.path.iter(), tolerance, |el| match el {
            PathEl::MoveTo(p) => {
                if current.len() > 1 {
                    contours.push(std::mem::take(&mut current));
                }
                current.clear();
                current.push(p);
            }
            PathEl::LineTo(p) => {
                if current.last() != Some(&p) {
                    current.push(p);
                }
            }
            PathEl::ClosePath => {
                if current.len() > 1 {
                    let start = current[0];
                    contours.push(std::mem::take(&mut current));
                    current.push(start);
                }
            }
            PathEl::QuadTo(..) | PathEl::CurveTo(..) => {}
        });
        if current.len() > 1 {
            contours.push(current);
        }
        for c in &mut contours {
            if c.len() > 1 && c.first() == c.last() {
                c.pop();
            }
        }
        contours.retain(|c| c.len() > 2);
        contours
    }
}

pub(crate) fn sanitize_tolerance(tolerance: f64) -> f64 {
    if tolerance.is_finite() && tolerance > 1e-6 {
        tolerance
    } else {
        0.1
    }
}

/// Incremental [`PathSpec`] builder accepting every source segment kind, including SVG arcs.
#[derive(Debug)]
pub struct PathBuilder {
    path: BezPath,
    fill_rule: FillRule,
    current: Option<Point>,
    start: Option<Point>,
    arc_tolerance: f64,
}

impl PathBuilder {
    /// Start an empty path.
    pub fn new(fill_rule: FillRule) -> Self {
        Self {
            path: BezPath::new(),
            fill_rule,
            current: None,
            start: None,
            arc_tolerance: 0.1,
        }
    }

    /// Tolerance used when lowering arcs to cubics.
    pub fn with_arc_tolerance(mut self, tolerance: f64) -> Self {
        self.arc_tolerance = sanitize_tolerance(tolerance);
        self
    }

    /// Begin a subpath.
    pub fn move_to(&mut self, p: impl Into<Point>) -> &mut Self {
        let p = p.into();
        self.path.move_to(p);
        self.current = Some(p);
        self.start = Some(p);
        self
    }

    /// Straight segment.
    pub fn line_to(&mut self, p: impl Into<Point>) -> &mut Self {
        let p = p.into();
        self.ensure_started(p);
        self.path.line_to(p);
        self.current = Some(p);
        self
    }

    /// Quadratic segment.
    pub fn quad_to(&mut self, c: impl Into<Point>, p: impl Into<Point>) -> &mut Self {
        let (c, p) = (c.into(), p.into());
        self.ensure_started(c);
        self.path.quad_to(c, p);
        self.current = Some(p);
        self
    }

    /// Cubic segment.
    pub fn curve_to(
        &mut self,
        c1: impl Into<Point>,
        c2: impl Into<Point>,
        p: impl Into<Point>,
    ) -> &mut Self {
        let (c1, c2, p) = (c1.into(), c2.into(), p.into());
        self.ensure_started(c1);
        self.path.curve_to(c1, c2, p);
        self.current = Some(p);
        self
    }

    /// SVG elliptical arc. Degenerate radii turn the arc into a straight line, as in SVG.
    pub fn arc_to(
        &mut self,
        radii: Vec2,
        x_rotation_rad: f64,
        large_arc: bool,
        sweep: bool,
        to: impl Into<Point>,
    ) -> &mut Self {
        let to = to.into();
        let Some(from) = self.current else {
            return self.move_to(to);
        };
        let svg_arc = kurbo::SvgArc {
            from,
            to,
            radii,
            x_rotation: x_rotation_rad,
            large_arc,
            sweep,
        };
        match kurbo::Arc::from_svg_arc(&svg_arc) {
            Some(arc) => {
                for el in arc.append_iter(self.arc_tolerance) {
                    self.path.push(el);
                }
            }
            None => self.path.line_to(to),
        }
        self.current = Some(to);
        self
    }

    /// Close the current subpath.
    pub fn close(&mut self) -> &mut Self {
        if self.current.is_some() {
            self.path.close_path();
            self.current = self.start;
        }
        self
    }

    /// Finish the path.
    pub fn build(&mut self) -> PathSpec {
        PathSpec::new(std::mem::take(&mut self.path), self.fill_rule)
    }

    fn ensure_started(&mut self, p: Point) {
        if self.current.is_none() {
            self.move_to(p);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/path.rs"]
mod tests;
