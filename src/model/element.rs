use crate::foundation::core::{Affine, Rgba8};
use crate::geometry::PathSpec;
use crate::model::clip::identity;
use crate::model::filter::FilterChain;

fn black() -> Option<Rgba8> {
    Some(Rgba8::BLACK)
}

fn opaque() -> f64 {
    1.0
}

/// Stroke attributes of a shape.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StrokeStyle {
    pub color: Rgba8,
    pub width: f64,
    /// Dash lengths in user units; empty is solid.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dash: Vec<f64>,
}

impl StrokeStyle {
    pub fn solid(color: Rgba8, width: f64) -> Self {
        Self {
            color,
            width,
            dash: Vec::new(),
        }
    }

    pub fn dashed(color: Rgba8, width: f64, dash: Vec<f64>) -> Self {
        Self { color, width, dash }
    }
}

/// Paint of the source element.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ShapeStyle {
    #[serde(default = "black")]
    pub fill: Option<Rgba8>,
    #[serde(default)]
    pub stroke: Option<StrokeStyle>,
    #[serde(default = "opaque")]
    pub opacity: f64,
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            fill: Some(Rgba8::BLACK),
            stroke: None,
            opacity: 1.0,
        }
    }
}

impl ShapeStyle {
    pub fn filled(color: Rgba8) -> Self {
        Self {
            fill: Some(color),
            ..Self::default()
        }
    }

    /// Fill color with opacity folded into alpha.
    pub(crate) fn effective_fill(&self) -> Option<Rgba8> {
        self.fill.map(|c| with_opacity(c, self.opacity))
    }

    pub(crate) fn effective_stroke(&self) -> Option<StrokeStyle> {
        self.stroke.as_ref().map(|s| StrokeStyle {
            color: with_opacity(s.color, self.opacity),
            ..s.clone()
        })
    }
}

fn with_opacity(c: Rgba8, opacity: f64) -> Rgba8 {
    let o = if opacity.is_finite() {
        opacity.clamp(0.0, 1.0)
    } else {
        1.0
    };
    Rgba8 {
        a: (f64::from(c.a) * o).round() as u8,
        ..c
    }
}

/// One element handed to the dispatcher.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ElementInput {
    pub id: String,
    /// Geometry in the element's user space.
    pub path: PathSpec,
    #[serde(default)]
    pub style: ShapeStyle,
    /// Cumulative user-space to document-space transform.
    #[serde(default = "identity")]
    pub transform: Affine,
    /// Id into the request's clip library.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterChain>,
}

impl ElementInput {
    pub fn new(id: impl Into<String>, path: PathSpec) -> Self {
        Self {
            id: id.into(),
            path,
            style: ShapeStyle::default(),
            transform: Affine::IDENTITY,
            clip: None,
            filter: None,
        }
    }

    pub fn with_style(mut self, style: ShapeStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_transform(mut self, transform: Affine) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_clip(mut self, id: impl Into<String>) -> Self {
        self.clip = Some(id.into());
        self
    }

    pub fn with_filter(mut self, chain: FilterChain) -> Self {
        self.filter = Some(chain);
        self
    }
}
