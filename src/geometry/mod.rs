pub(crate) mod boolean;
pub mod engine;
pub mod outline;
pub mod path;

pub use engine::{
    CurvePreservingEngine, FlatteningEngine, GeometryBackend, GeometryEngine, bounds,
    create_engine, encloses_area, transform,
};
pub use path::{FillRule, PathBuilder, PathSpec};
