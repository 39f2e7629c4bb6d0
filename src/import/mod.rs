//! Builders for the core's inputs from already-parsed source documents.

pub mod svg;

pub use svg::{SvgImport, import_svg, path_from_usvg};
