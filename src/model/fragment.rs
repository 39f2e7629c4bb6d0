//! Format-agnostic drawing tree handed to the document assembler.
//!
//! Resources are referenced through [`ResourceSlot`] indices into the owning result's
//! `embedded_resources`; the assembler turns them into real relationship ids.

use crate::foundation::core::{Affine, Rect, Rgba8};
use crate::foundation::hash::StableHasher;
use crate::geometry::PathSpec;
use crate::model::clip::identity;
use crate::model::element::StrokeStyle;

/// Placeholder handle: index into `ConversionResult::embedded_resources`.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct ResourceSlot(pub u32);

/// Drawing tree for one element.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VectorFragment {
    pub id: String,
    /// User space to document space, applied to every node.
    #[serde(default = "identity")]
    pub transform: Affine,
    pub nodes: Vec<DrawNode>,
}

impl VectorFragment {
    pub fn new(id: impl Into<String>, transform: Affine) -> Self {
        Self {
            id: id.into(),
            transform,
            nodes: Vec::new(),
        }
    }

    /// Every resource slot referenced anywhere in the tree, in tree order.
    pub fn resource_slots(&self) -> Vec<ResourceSlot> {
        self.nodes.iter().filter_map(DrawNode::resource_slot).collect()
    }

    pub(crate) fn hash_into(&self, h: &mut StableHasher) {
        h.write_str(&self.id);
        for c in self.transform.as_coeffs() {
            h.write_f64(c);
        }
        h.write_u64(self.nodes.len() as u64);
        for node in &self.nodes {
            node.hash_into(h);
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum DrawNode {
    /// Custom geometry with fill, outline and native effects.
    Shape(ShapeNode),
    /// An embedded resource placed into `bounds` (user space).
    Picture { resource: ResourceSlot, bounds: Rect },
}

impl DrawNode {
    pub fn resource_slot(&self) -> Option<ResourceSlot> {
        match self {
            Self::Shape(s) => match s.fill {
                Fill::Picture { resource, .. } | Fill::Tiled { resource, .. } => Some(resource),
                Fill::None | Fill::Solid(_) => None,
            },
            Self::Picture { resource, .. } => Some(*resource),
        }
    }

    fn hash_into(&self, h: &mut StableHasher) {
        match self {
            Self::Shape(s) => {
                h.write_u8(0);
                s.hash_into(h);
            }
            Self::Picture { resource, bounds } => {
                h.write_u8(1);
                h.write_u32(resource.0);
                hash_rect(h, *bounds);
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ShapeNode {
    pub geometry: PathSpec,
    pub fill: Fill,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<StrokeStyle>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<Effect>,
}

impl ShapeNode {
    pub fn new(geometry: PathSpec, fill: Fill) -> Self {
        Self {
            geometry,
            fill,
            stroke: None,
            effects: Vec::new(),
        }
    }

    fn hash_into(&self, h: &mut StableHasher) {
        h.write_str(&self.geometry.path().to_svg());
        h.write_u8(self.geometry.fill_rule() as u8);
        hash_json(h, &self.fill);
        hash_json(h, &self.stroke);
        hash_json(h, &self.effects);
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Fill {
    #[default]
    None,
    Solid(Rgba8),
    /// Resource stretched over `bounds`.
    Picture { resource: ResourceSlot, bounds: Rect },
    /// Resource repeated with one tile covering `tile`.
    Tiled { resource: ResourceSlot, tile: Rect },
}

/// Native 3D bevel presets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BevelPreset {
    Circle,
    SoftRound,
    Angle,
    Convex,
}

/// Material preset of a 3D surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Material {
    Matte,
    Plastic,
    Metal,
    SoftEdge,
}

/// Compass direction of a light rig, clockwise from top.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LightDirection {
    T,
    Tr,
    R,
    Br,
    B,
    Bl,
    L,
    Tl,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LightRig {
    ThreePt,
    Balanced,
    Harsh,
    Soft,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "effect", rename_all = "kebab-case")]
pub enum ColorEffect {
    /// Pixels at or above `threshold` luminance become white, the rest black.
    BiLevel { threshold: f64 },
    Duotone { dark: Rgba8, light: Rgba8 },
    Grayscale,
    Gamma { exponent: f64 },
    /// Brightness and contrast offsets in `[-1, 1]`.
    Luminance { brightness: f64, contrast: f64 },
    AlphaModulate { amount: f64 },
}

/// Native effect attached to a shape.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Effect {
    Bevel {
        preset: BevelPreset,
        width: f64,
        height: f64,
    },
    Scene {
        rig: LightRig,
        direction: LightDirection,
        material: Material,
    },
    InnerShadow {
        color: Rgba8,
        blur: f64,
        distance: f64,
        /// Degrees clockwise from the positive x axis.
        direction: f64,
    },
    OuterShadow {
        color: Rgba8,
        blur: f64,
        distance: f64,
        direction: f64,
    },
    Color(ColorEffect),
}

/// Category of an element-local problem.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    /// Construct without a mapping; degraded to fallback or identity.
    Unsupported,
    /// Geometry or parameters normalized or emptied.
    Malformed,
    /// Reference to a missing clip or filter output.
    DanglingReference,
    /// Clip reference chain loops back on itself.
    ReferenceCycle,
    /// Complexity budget forced a fallback.
    BudgetExceeded,
    /// Node dropped; its input passes through unchanged.
    IdentityPassThrough,
}

/// Element-local problem recorded instead of failing the element.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<usize>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            node: None,
            message: message.into(),
        }
    }

    pub fn at(mut self, node: usize) -> Self {
        self.node = Some(node);
        self
    }
}

fn hash_rect(h: &mut StableHasher, r: Rect) {
    for v in [r.x0, r.y0, r.x1, r.y1] {
        h.write_f64(v);
    }
}

// serde_json output is deterministic for these types (no maps).
fn hash_json<T: serde::Serialize>(h: &mut StableHasher, v: &T) {
    match serde_json::to_vec(v) {
        Ok(bytes) => h.write_bytes(&bytes),
        Err(_) => h.write_u8(0xff),
    }
}
