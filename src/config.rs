//! Per-request conversion configuration.
//!
//! Nothing here is global: every conversion call receives a [`ConvertOptions`] value. All weights
//! and thresholds are policy, so each one is exposed and overridable; the presets only pick
//! starting points.

use crate::foundation::error::{DmlfxError, DmlfxResult};
use crate::geometry::GeometryBackend;

/// Named starting points for [`ComplexityBudget`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// Prefer binary fallbacks early; smallest amount of geometry work.
    Speed,
    /// Default trade-off.
    #[default]
    Balanced,
    /// Keep effects native and editable as long as possible.
    Quality,
}

/// Base cost of one primitive of each kind, before geometry and depth factors.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct KindWeights {
    /// Single-operation morphology.
    pub morphology: f64,
    /// Diffuse lighting.
    pub diffuse_lighting: f64,
    /// Specular lighting.
    pub specular_lighting: f64,
    /// Component transfer.
    pub component_transfer: f64,
    /// Displacement map.
    pub displacement_map: f64,
    /// Convolution with an arbitrary kernel (per-pixel evaluation).
    pub convolve_matrix: f64,
    /// Convolution whose kernel matches a known edge-detection kernel.
    pub known_kernel: f64,
    /// Tile reference into the pattern library.
    pub tile: f64,
    /// Primitive kinds without a mapping.
    pub unsupported: f64,
}

impl Default for KindWeights {
    fn default() -> Self {
        Self {
            morphology: 1.0,
            diffuse_lighting: 2.0,
            specular_lighting: 2.5,
            component_transfer: 0.5,
            displacement_map: 3.0,
            convolve_matrix: 8.0,
            known_kernel: 1.0,
            tile: 1.0,
            unsupported: 10.0,
        }
    }
}

/// Thresholds steering the native-vector / hybrid / binary-fallback decision.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ComplexityBudget {
    /// Per-kind base weights.
    pub weights: KindWeights,
    /// Score added per preceding node in the chain.
    pub depth_weight: f64,
    /// Segment count that doubles a node's base weight.
    pub segment_norm: f64,
    /// Node scores up to this value stay native vector.
    pub native_ceiling: f64,
    /// Node scores up to this value become hybrid; above it, binary fallback.
    pub hybrid_ceiling: f64,
    /// Chains longer than this fall back entirely.
    pub max_chain_depth: usize,
    /// Cumulative chain score above which every further node falls back.
    pub max_total_score: f64,
    /// Morphology radius limit as a fraction of the smaller bbox side.
    pub morphology_max_radius_ratio: f64,
    /// Upper bound on vertices produced by displacement subdivision.
    pub displacement_max_vertices: usize,
    /// Subdivision vertices per user unit of displacement scale.
    pub displacement_density: f64,
    /// Largest kernel side considered for known-kernel matching.
    pub max_known_kernel_order: u32,
    /// Largest kernel side evaluated by the raster fallback; beyond it the primitive is dropped.
    pub max_raster_kernel_order: u32,
    /// Clip resolution above this many segments (subject plus clip) is emitted as a metafile
    /// clip instead of boolean geometry.
    pub max_clip_segments: usize,
}

impl Default for ComplexityBudget {
    fn default() -> Self {
        Self::preset(Preset::Balanced)
    }
}

impl ComplexityBudget {
    /// Budget for a named preset.
    pub fn preset(preset: Preset) -> Self {
        let base = Self {
            weights: KindWeights::default(),
            depth_weight: 0.25,
            segment_norm: 256.0,
            native_ceiling: 4.0,
            hybrid_ceiling: 7.0,
            max_chain_depth: 8,
            max_total_score: 40.0,
            morphology_max_radius_ratio: 1.0,
            displacement_max_vertices: 20_000,
            displacement_density: 0.5,
            max_known_kernel_order: 3,
            max_raster_kernel_order: 15,
            max_clip_segments: 20_000,
        };
        match preset {
            Preset::Balanced => base,
            Preset::Speed => Self {
                segment_norm: 128.0,
                native_ceiling: 3.0,
                hybrid_ceiling: 5.0,
                max_chain_depth: 4,
                max_total_score: 16.0,
                displacement_max_vertices: 5_000,
                max_raster_kernel_order: 9,
                max_clip_segments: 5_000,
                ..base
            },
            Preset::Quality => Self {
                segment_norm: 512.0,
                native_ceiling: 6.0,
                hybrid_ceiling: 10.0,
                max_chain_depth: 16,
                max_total_score: 80.0,
                morphology_max_radius_ratio: 2.0,
                displacement_max_vertices: 80_000,
                displacement_density: 1.0,
                max_clip_segments: 80_000,
                ..base
            },
        }
    }

    /// Reject budgets that would make scoring meaningless.
    pub fn validate(&self) -> DmlfxResult<()> {
        let finite_pos = |v: f64| v.is_finite() && v > 0.0;
        if !finite_pos(self.segment_norm) {
            return Err(DmlfxError::validation("segment_norm must be finite and > 0"));
        }
        if !(self.native_ceiling.is_finite() && self.hybrid_ceiling.is_finite()) {
            return Err(DmlfxError::validation("strategy ceilings must be finite"));
        }
        if self.native_ceiling > self.hybrid_ceiling {
            return Err(DmlfxError::validation(
                "native_ceiling must be <= hybrid_ceiling",
            ));
        }
        if !finite_pos(self.morphology_max_radius_ratio) {
            return Err(DmlfxError::validation(
                "morphology_max_radius_ratio must be finite and > 0",
            ));
        }
        if !finite_pos(self.displacement_density) {
            return Err(DmlfxError::validation(
                "displacement_density must be finite and > 0",
            ));
        }
        if self.max_known_kernel_order == 0 {
            return Err(DmlfxError::validation("max_known_kernel_order must be >= 1"));
        }
        let w = &self.weights;
        for (name, v) in [
            ("morphology", w.morphology),
            ("diffuse_lighting", w.diffuse_lighting),
            ("specular_lighting", w.specular_lighting),
            ("component_transfer", w.component_transfer),
            ("displacement_map", w.displacement_map),
            ("convolve_matrix", w.convolve_matrix),
            ("known_kernel", w.known_kernel),
            ("tile", w.tile),
            ("unsupported", w.unsupported),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(DmlfxError::validation(format!(
                    "weight '{name}' must be finite and >= 0"
                )));
            }
        }
        Ok(())
    }
}

/// Boolean engine selection and flattening tolerance.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GeometryOptions {
    /// Which engine implements path algebra.
    pub backend: GeometryBackend,
    /// Maximum distance between a curve and its flattened polygon, in user units.
    pub tolerance: f64,
}

impl Default for GeometryOptions {
    fn default() -> Self {
        Self {
            backend: GeometryBackend::CurvePreserving,
            tolerance: 0.1,
        }
    }
}

/// Raster fallback resolution limits.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RasterOptions {
    /// Device pixels per user unit.
    pub pixels_per_unit: f64,
    /// Upper bound on pixels per raster block; resolution drops to fit.
    pub max_pixels: u64,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            pixels_per_unit: 2.0,
            max_pixels: 4_000_000,
        }
    }
}

/// Everything one conversion request is parameterized by.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Strategy thresholds.
    pub budget: ComplexityBudget,
    /// Geometry engine settings.
    pub geometry: GeometryOptions,
    /// Raster fallback settings.
    pub raster: RasterOptions,
}

impl ConvertOptions {
    /// Options built around a budget preset.
    pub fn preset(preset: Preset) -> Self {
        Self {
            budget: ComplexityBudget::preset(preset),
            ..Self::default()
        }
    }

    /// Parse options from JSON. Missing fields take their defaults.
    pub fn from_json_str(s: &str) -> DmlfxResult<Self> {
        let opts: Self = serde_json::from_str(s).map_err(|e| DmlfxError::serde(e.to_string()))?;
        opts.validate()?;
        Ok(opts)
    }

    /// Validate every nested section.
    pub fn validate(&self) -> DmlfxResult<()> {
        self.budget.validate()?;
        if !(self.geometry.tolerance.is_finite() && self.geometry.tolerance > 0.0) {
            return Err(DmlfxError::validation(
                "geometry.tolerance must be finite and > 0",
            ));
        }
        if !(self.raster.pixels_per_unit.is_finite() && self.raster.pixels_per_unit > 0.0) {
            return Err(DmlfxError::validation(
                "raster.pixels_per_unit must be finite and > 0",
            ));
        }
        if self.raster.max_pixels == 0 {
            return Err(DmlfxError::validation("raster.max_pixels must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
