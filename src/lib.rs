//! dmlfx resolves SVG filter primitives and clip paths into constructs a presentation format can
//! draw natively, falling back to embedded EMF metafiles where no native mapping exists.
//!
//! The flow for one element:
//!
//! - Resolve its clip chain to plain geometry (or a clipped metafile when too complex)
//! - Pick a [`Strategy`] per filter node against a [`ComplexityBudget`]
//! - Run the converters in chain order and assemble a [`ConversionResult`]
//!
//! A [`Dispatcher`] does this per element, in parallel for batches.
#![forbid(unsafe_code)]

mod foundation;

pub mod clip;
pub mod config;
pub mod convert;
pub mod dispatch;
pub mod emf;
pub mod geometry;
pub mod import;
pub mod model;
pub mod raster;
pub mod strategy;

pub use crate::foundation::core::{Affine, BezPath, Point, Rect, Rgba8, Vec2};
pub use crate::foundation::error::{DmlfxError, DmlfxResult};
pub use crate::foundation::hash::Fingerprint;

pub use crate::config::{ComplexityBudget, ConvertOptions, GeometryOptions, Preset, RasterOptions};
pub use crate::dispatch::{
    ConversionRequest, ConversionResult, Dispatcher, ElementOutput, ElementReport,
};
pub use crate::emf::{Density, EmfDocument, PatternCache, PatternKind, PatternParams};
pub use crate::geometry::{FillRule, GeometryBackend, GeometryEngine, PathSpec};
pub use crate::model::{
    ClipDefinition, ClipLibrary, Diagnostic, DiagnosticKind, DrawNode, ElementInput, FilterChain,
    FilterPrimitiveNode, PrimitiveKind, ShapeStyle, VectorFragment,
};
pub use crate::strategy::{Strategy, StrategyDecision};
