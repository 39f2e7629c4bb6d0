pub mod clip;
pub mod element;
pub mod filter;
pub mod fragment;

pub use clip::{ClipDefinition, ClipLibrary};
pub use element::{ElementInput, ShapeStyle, StrokeStyle};
pub use filter::{
    ChannelSelector, ComponentTransferParams, ConvolveParams, DiffuseLightingParams,
    DisplacementMap, DisplacementParams, EdgeMode, FilterChain, FilterPrimitiveNode, FilterRegion,
    InputRef, LightSource, MorphologyOperator, MorphologyParams, PrimitiveKind, ResolvedInput,
    SpecularLightingParams, TransferFunction, UnitsMode,
};
pub use fragment::{
    BevelPreset, ColorEffect, Diagnostic, DiagnosticKind, DrawNode, Effect, Fill, LightDirection,
    LightRig, Material, ResourceSlot, ShapeNode, VectorFragment,
};

pub use crate::foundation::core::Rgba8;

#[cfg(test)]
#[path = "../../tests/unit/model/mod.rs"]
mod tests;
