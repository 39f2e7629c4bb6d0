pub mod document;
pub mod emitter;
pub mod pattern;
pub mod records;

pub use document::EmfDocument;
pub use emitter::{emit_clipped, emit_paths, emit_raster_block};
pub use pattern::{
    Density, MIN_PATTERN_SCALE, PatternCache, PatternEntry, PatternKey, PatternKind, PatternParams,
};
pub use records::{EmfRecord, PolyFillMode, RectL};
