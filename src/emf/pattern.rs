use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use crate::emf::document::EmfDocument;
use crate::emf::emitter::emit_paths_in;
use crate::foundation::core::{Affine, Point, Rect, Rgba8, Vec2};
use crate::geometry::{FillRule, FlatteningEngine, GeometryEngine, PathSpec};
use crate::model::ShapeStyle;

const CELL_TOLERANCE: f64 = 0.01;
/// Smallest pattern scale; a dense cell is then half a user unit wide.
pub const MIN_PATTERN_SCALE: f64 = 0.125;

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    #[default]
    Hatch,
    Crosshatch,
    Diagonal,
    Dot,
    Grid,
    Brick,
}

impl PatternKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Hatch => "hatch",
            Self::Crosshatch => "crosshatch",
            Self::Diagonal => "diagonal",
            Self::Dot => "dot",
            Self::Grid => "grid",
            Self::Brick => "brick",
        }
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Density {
    Sparse,
    #[default]
    Medium,
    Dense,
}

impl Density {
    pub fn name(self) -> &'static str {
        match self {
            Self::Sparse => "sparse",
            Self::Medium => "medium",
            Self::Dense => "dense",
        }
    }

    /// Cell side in user units at scale 1.
    fn spacing(self) -> f64 {
        match self {
            Self::Sparse => 16.0,
            Self::Medium => 8.0,
            Self::Dense => 4.0,
        }
    }
}

fn one() -> f64 {
    1.0
}

fn black() -> Rgba8 {
    Rgba8::BLACK
}

/// Parameters of a pattern-library entry.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PatternParams {
    #[serde(default)]
    pub kind: PatternKind,
    #[serde(default)]
    pub density: Density,
    #[serde(default = "one")]
    pub scale: f64,
    /// Degrees, applied to the cell content around the cell center.
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "black")]
    pub color: Rgba8,
}

impl Default for PatternParams {
    fn default() -> Self {
        Self::new(PatternKind::Hatch, Density::Medium)
    }
}

impl PatternParams {
    pub fn new(kind: PatternKind, density: Density) -> Self {
        Self {
            kind,
            density,
            scale: 1.0,
            rotation: 0.0,
            color: Rgba8::BLACK,
        }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn with_color(mut self, color: Rgba8) -> Self {
        self.color = color;
        self
    }

    /// Cache key; scale and rotation are quantized so near-equal floats share an entry. Scales
    /// below [`MIN_PATTERN_SCALE`] are raised to it.
    pub fn key(&self) -> PatternKey {
        let scale = if self.scale.is_finite() && self.scale > 0.0 {
            self.scale.max(MIN_PATTERN_SCALE)
        } else {
            1.0
        };
        let rotation = if self.rotation.is_finite() {
            self.rotation.rem_euclid(360.0)
        } else {
            0.0
        };
        PatternKey {
            kind: self.kind,
            density: self.density,
            scale_milli: (scale * 1000.0).round() as i64,
            rotation_centi: ((rotation * 100.0).round() as i64).rem_euclid(36_000),
            color: self.color,
        }
    }
}

/// `(kind, density, scale, rotation, color)` identity of a cached pattern.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct PatternKey {
    pub kind: PatternKind,
    pub density: Density,
    /// Scale in thousandths.
    pub scale_milli: i64,
    /// Rotation in hundredths of a degree, in `[0, 36000)`.
    pub rotation_centi: i64,
    pub color: Rgba8,
}

impl PatternKey {
    pub fn scale(&self) -> f64 {
        self.scale_milli as f64 / 1000.0
    }

    pub fn rotation(&self) -> f64 {
        self.rotation_centi as f64 / 100.0
    }
}

/// One generated pattern: the tile geometry and its metafile.
#[derive(Debug)]
pub struct PatternEntry {
    pub key: PatternKey,
    /// One tile, anchored at the origin.
    pub cell: Rect,
    /// Filled geometry of the tile content, clipped to `cell`.
    pub geometry: Vec<PathSpec>,
    pub document: Arc<EmfDocument>,
}

type Slot = Arc<OnceLock<Arc<PatternEntry>>>;

/// Lazily populated pattern library.
///
/// Concurrent misses for one key generate the entry exactly once: the first caller initializes
/// the key's slot while the others block on it and reuse the result. Entries are only dropped by
/// [`clear`](Self::clear).
#[derive(Debug, Default)]
pub struct PatternCache {
    slots: RwLock<HashMap<PatternKey, Slot>>,
    generated: AtomicU64,
}

impl PatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached entry for `params`, generating it on first use.
    pub fn get_or_create_pattern(&self, params: &PatternParams) -> Arc<PatternEntry> {
        let key = params.key();
        let slot = self.slot(key);
        Arc::clone(slot.get_or_init(|| {
            self.generated.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(
                kind = key.kind.name(),
                density = key.density.name(),
                "generating pattern"
            );
            Arc::new(build_entry(key))
        }))
    }

    /// Entry for `params` if it has already been generated.
    pub fn get(&self, params: &PatternParams) -> Option<Arc<PatternEntry>> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        slots.get(&params.key()).and_then(|s| s.get()).cloned()
    }

    /// Number of generated entries.
    pub fn len(&self) -> usize {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        slots.values().filter(|s| s.get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of generations since construction (not reset by [`clear`](Self::clear)).
    pub fn generated(&self) -> u64 {
        self.generated.load(Ordering::Relaxed)
    }

    /// Drop every entry. Handles already returned stay valid.
    pub fn clear(&self) {
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn slot(&self, key: PatternKey) -> Slot {
        {
            let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(s) = slots.get(&key) {
                return Arc::clone(s);
            }
        }
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(key).or_default())
    }
}

fn build_entry(key: PatternKey) -> PatternEntry {
    let s = key.density.spacing() * key.scale();
    let cell = Rect::new(0.0, 0.0, s, s);
    let geometry = cell_geometry(key.kind, s, key.rotation());
    let document = emit_paths_in(&geometry, &ShapeStyle::filled(key.color), cell);
    PatternEntry {
        key,
        cell,
        geometry,
        document: Arc::new(document),
    }
}

/// Tile content for a cell of side `s`.
pub(crate) fn cell_geometry(kind: PatternKind, s: f64, rotation: f64) -> Vec<PathSpec> {
    let w = s / 8.0;
    let band_h = |y: f64| PathSpec::rect(Rect::new(0.0, y - w / 2.0, s, y + w / 2.0));
    let band_v =
        |x: f64, y0: f64, y1: f64| PathSpec::rect(Rect::new(x - w / 2.0, y0, x + w / 2.0, y1));
    let raw: Vec<PathSpec> = match kind {
        PatternKind::Hatch => vec![band_h(s / 2.0)],
        PatternKind::Crosshatch => vec![band_h(s / 2.0), band_v(s / 2.0, 0.0, s)],
        PatternKind::Diagonal => (-1..=1)
            .map(|k| {
                let o = f64::from(k) * s;
                // Half band width along the (1, 1) normal.
                let d = w / (2.0 * std::f64::consts::SQRT_2);
                // Overlong segment of the line x + y = o + s; the cell clip trims it.
                let (a, b) = (Point::new(o - s, 2.0 * s), Point::new(o + 2.0 * s, -s));
                let n = Vec2::new(d, d);
                PathSpec::polygon(&[a + n, b + n, b - n, a - n], FillRule::NonZero)
            })
            .collect(),
        PatternKind::Dot => vec![PathSpec::circle(
            Point::new(s / 2.0, s / 2.0),
            s / 6.0,
            CELL_TOLERANCE,
        )],
        // Edge bands are split across opposite edges so neighbouring tiles join up.
        PatternKind::Grid => vec![
            band_h(0.0),
            band_h(s),
            band_v(0.0, 0.0, s),
            band_v(s, 0.0, s),
        ],
        PatternKind::Brick => vec![
            band_h(0.0),
            band_h(s / 2.0),
            band_h(s),
            band_v(0.0, 0.0, s / 2.0),
            band_v(s, 0.0, s / 2.0),
            band_v(s / 2.0, s / 2.0, s),
        ],
    };
    let cell = PathSpec::rect(Rect::new(0.0, 0.0, s, s));
    let spin = Affine::rotate_about(rotation.to_radians(), Point::new(s / 2.0, s / 2.0));
    let engine = FlatteningEngine::new(CELL_TOLERANCE);
    raw.iter()
        .map(|p| {
            let p = if rotation == 0.0 { p.clone() } else { p.transformed(spin) };
            engine.intersect(&p, std::slice::from_ref(&cell))
        })
        .filter(|p| !p.is_empty())
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/emf/pattern.rs"]
mod tests;
