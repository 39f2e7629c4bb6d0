use super::*;
use crate::emf::emit_paths;
use crate::foundation::core::{Affine, Rect};
use crate::geometry::PathSpec;
use crate::model::{DiagnosticKind, DrawNode, Fill, ResourceSlot, ShapeNode, ShapeStyle};

fn square() -> PathSpec {
    PathSpec::rect(Rect::new(0.0, 0.0, 10.0, 10.0))
}

fn result(strategy: Strategy, nodes: Vec<DrawNode>, resources: usize) -> ConversionResult {
    let mut fragment = VectorFragment::new("e", Affine::IDENTITY);
    fragment.nodes = nodes;
    let doc = Arc::new(emit_paths(&[square()], &ShapeStyle::default()));
    ConversionResult {
        vector_fragment: fragment,
        embedded_resources: (0..resources).map(|_| Arc::clone(&doc)).collect(),
        strategy,
        decisions: Vec::new(),
        diagnostics: Vec::new(),
    }
}

fn shape() -> DrawNode {
    DrawNode::Shape(ShapeNode::new(square(), Fill::Solid(crate::model::Rgba8::BLACK)))
}

fn picture(slot: u32) -> DrawNode {
    DrawNode::Picture {
        resource: ResourceSlot(slot),
        bounds: Rect::new(0.0, 0.0, 10.0, 10.0),
    }
}

#[test]
fn native_without_resources_is_valid() {
    assert!(result(Strategy::NativeVector, vec![shape()], 0).check().is_ok());
}

#[test]
fn native_with_resource_is_rejected() {
    let err = result(Strategy::NativeVector, vec![shape()], 1)
        .check()
        .unwrap_err();
    assert!(err.to_string().contains("native"));
}

#[test]
fn fallback_requires_a_resource() {
    assert!(result(Strategy::BinaryFallback, vec![shape()], 0).check().is_err());
    assert!(result(Strategy::BinaryFallback, vec![picture(0)], 1).check().is_ok());
}

#[test]
fn slot_past_the_end_is_rejected() {
    let err = result(Strategy::Hybrid, vec![picture(1)], 1).check().unwrap_err();
    assert!(err.to_string().contains("slot 1"));
}

#[test]
fn fingerprint_tracks_content() {
    let a = result(Strategy::NativeVector, vec![shape()], 0);
    let b = a.clone();
    assert_eq!(a.fingerprint(), b.fingerprint());

    let mut c = a.clone();
    c.diagnostics
        .push(Diagnostic::new(DiagnosticKind::Malformed, "changed"));
    assert_ne!(a.fingerprint(), c.fingerprint());
}

#[test]
fn removed_output_exposes_id_and_diagnostics() {
    let out = ElementOutput::Removed {
        id: "gone".into(),
        diagnostics: vec![Diagnostic::new(DiagnosticKind::DanglingReference, "x")],
    };
    assert!(out.is_removed());
    assert_eq!(out.id(), "gone");
    assert_eq!(out.diagnostics().len(), 1);
    assert!(out.as_drawn().is_none());
}
