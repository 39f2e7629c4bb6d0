//! Per-element orchestration: clip, analysis, conversion, assembly.

pub mod dispatcher;
pub mod request;
pub mod result;

pub use dispatcher::Dispatcher;
pub use request::{ConversionRequest, ElementReport};
pub use result::{ConversionResult, ElementOutput};

pub use crate::model::{Diagnostic, DiagnosticKind, DrawNode, VectorFragment};
