use std::collections::BTreeMap;

use crate::emf::pattern::PatternParams;
use crate::foundation::core::{Rect, Rgba8};
use crate::foundation::error::{DmlfxError, DmlfxResult};

/// Coordinate system a region or clip is expressed in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnitsMode {
    /// Values are in the user space of the referencing element.
    #[default]
    UserSpaceOnUse,
    /// Values are fractions of the element's bounding box.
    ObjectBoundingBox,
}

/// Filter effects region.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FilterRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub units: UnitsMode,
}

impl Default for FilterRegion {
    // -10% / 120% of the bounding box.
    fn default() -> Self {
        Self {
            x: -0.1,
            y: -0.1,
            width: 1.2,
            height: 1.2,
            units: UnitsMode::ObjectBoundingBox,
        }
    }
}

impl FilterRegion {
    /// Region in user space for an element with bounding box `bbox`.
    pub fn resolve(&self, bbox: Rect) -> Rect {
        let r = match self.units {
            UnitsMode::UserSpaceOnUse => {
                Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
            }
            UnitsMode::ObjectBoundingBox => {
                let x0 = bbox.x0 + self.x * bbox.width();
                let y0 = bbox.y0 + self.y * bbox.height();
                Rect::new(
                    x0,
                    y0,
                    x0 + self.width * bbox.width(),
                    y0 + self.height * bbox.height(),
                )
            }
        };
        r.abs()
    }
}

/// Where a node takes its input from.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputRef {
    SourceGraphic,
    SourceAlpha,
    /// Output of an earlier node with this `output_name`.
    Result(String),
}

/// One node of a filter DAG.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FilterPrimitiveNode {
    pub kind: PrimitiveKind,
    /// Empty means "previous node's output" (or the source graphic for the first node).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub input_refs: Vec<InputRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_name: Option<String>,
}

impl FilterPrimitiveNode {
    /// Node reading the previous output, without a name of its own.
    pub fn new(kind: PrimitiveKind) -> Self {
        Self {
            kind,
            input_refs: Vec::new(),
            output_name: None,
        }
    }

    pub fn with_input(mut self, input: InputRef) -> Self {
        self.input_refs.push(input);
        self
    }

    pub fn with_output(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }
}

/// Closed set of primitive families, plus an explicit escape hatch.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PrimitiveKind {
    Morphology(MorphologyParams),
    DiffuseLighting(DiffuseLightingParams),
    SpecularLighting(SpecularLightingParams),
    ComponentTransfer(ComponentTransferParams),
    DisplacementMap(DisplacementParams),
    ConvolveMatrix(ConvolveParams),
    Tile(PatternParams),
    /// Source kind without a mapping; carries the original name for diagnostics.
    Unsupported { name: String },
}

impl PrimitiveKind {
    /// Stable kebab-case name.
    pub fn name(&self) -> &str {
        match self {
            Self::Morphology(_) => "morphology",
            Self::DiffuseLighting(_) => "diffuse-lighting",
            Self::SpecularLighting(_) => "specular-lighting",
            Self::ComponentTransfer(_) => "component-transfer",
            Self::DisplacementMap(_) => "displacement-map",
            Self::ConvolveMatrix(_) => "convolve-matrix",
            Self::Tile(_) => "tile",
            Self::Unsupported { name } => name,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MorphologyOperator {
    #[default]
    Erode,
    Dilate,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MorphologyParams {
    pub operator: MorphologyOperator,
    pub radius_x: f64,
    pub radius_y: f64,
}

impl MorphologyParams {
    pub fn dilate(radius: f64) -> Self {
        Self {
            operator: MorphologyOperator::Dilate,
            radius_x: radius,
            radius_y: radius,
        }
    }

    pub fn erode(radius: f64) -> Self {
        Self {
            operator: MorphologyOperator::Erode,
            radius_x: radius,
            radius_y: radius,
        }
    }
}

/// Light source of a lighting primitive. Positions are in user space.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum LightSource {
    /// Angles in degrees.
    Distant { azimuth: f64, elevation: f64 },
    Point { x: f64, y: f64, z: f64 },
    Spot {
        x: f64,
        y: f64,
        z: f64,
        points_at_x: f64,
        points_at_y: f64,
        points_at_z: f64,
        #[serde(default = "one")]
        specular_exponent: f64,
        /// Cone half-angle in degrees; `None` means unbounded.
        #[serde(default)]
        limiting_cone_angle: Option<f64>,
    },
}

impl Default for LightSource {
    fn default() -> Self {
        Self::Distant {
            azimuth: 0.0,
            elevation: 0.0,
        }
    }
}

fn one() -> f64 {
    1.0
}

fn white() -> Rgba8 {
    Rgba8::WHITE
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DiffuseLightingParams {
    #[serde(default = "one")]
    pub surface_scale: f64,
    #[serde(default = "one")]
    pub diffuse_constant: f64,
    #[serde(default = "white")]
    pub lighting_color: Rgba8,
    #[serde(default)]
    pub light: LightSource,
}

impl Default for DiffuseLightingParams {
    fn default() -> Self {
        Self {
            surface_scale: 1.0,
            diffuse_constant: 1.0,
            lighting_color: Rgba8::WHITE,
            light: LightSource::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SpecularLightingParams {
    #[serde(default = "one")]
    pub surface_scale: f64,
    #[serde(default = "one")]
    pub specular_constant: f64,
    #[serde(default = "one")]
    pub specular_exponent: f64,
    #[serde(default = "white")]
    pub lighting_color: Rgba8,
    #[serde(default)]
    pub light: LightSource,
}

impl Default for SpecularLightingParams {
    fn default() -> Self {
        Self {
            surface_scale: 1.0,
            specular_constant: 1.0,
            specular_exponent: 1.0,
            lighting_color: Rgba8::WHITE,
            light: LightSource::default(),
        }
    }
}

/// Per-channel transfer function.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TransferFunction {
    #[default]
    Identity,
    Table {
        table_values: Vec<f64>,
    },
    Discrete {
        table_values: Vec<f64>,
    },
    Linear {
        #[serde(default = "one")]
        slope: f64,
        #[serde(default)]
        intercept: f64,
    },
    Gamma {
        #[serde(default = "one")]
        amplitude: f64,
        #[serde(default = "one")]
        exponent: f64,
        #[serde(default)]
        offset: f64,
    },
}

impl TransferFunction {
    /// Map a channel value in `[0, 1]`; the result is clamped to `[0, 1]`.
    pub fn apply(&self, c: f64) -> f64 {
        let c = c.clamp(0.0, 1.0);
        let v = match self {
            Self::Identity => c,
            Self::Table { table_values: t } => match t.len() {
                0 => c,
                1 => t[0],
                n => {
                    let pos = c * (n - 1) as f64;
                    let k = (pos.floor() as usize).min(n - 2);
                    let f = pos - k as f64;
                    t[k] + (t[k + 1] - t[k]) * f
                }
            },
            Self::Discrete { table_values: t } => match t.len() {
                0 => c,
                n => t[((c * n as f64).floor() as usize).min(n - 1)],
            },
            Self::Linear { slope, intercept } => slope * c + intercept,
            Self::Gamma {
                amplitude,
                exponent,
                offset,
            } => amplitude * c.powf(*exponent) + offset,
        };
        if v.is_finite() { v.clamp(0.0, 1.0) } else { c }
    }

    /// `true` when [`apply`](Self::apply) is the identity on `[0, 1]`.
    pub fn is_identity(&self) -> bool {
        const E: f64 = 1e-9;
        match self {
            Self::Identity => true,
            Self::Table { table_values: t } => {
                t.is_empty()
                    || (t.len() >= 2
                        && t.iter().enumerate().all(|(i, v)| {
                            (v - i as f64 / (t.len() - 1) as f64).abs() < E
                        }))
            }
            Self::Discrete { table_values: t } => t.is_empty(),
            Self::Linear { slope, intercept } => (slope - 1.0).abs() < E && intercept.abs() < E,
            Self::Gamma {
                amplitude,
                exponent,
                offset,
            } => (amplitude - 1.0).abs() < E && (exponent - 1.0).abs() < E && offset.abs() < E,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ComponentTransferParams {
    pub func_r: TransferFunction,
    pub func_g: TransferFunction,
    pub func_b: TransferFunction,
    pub func_a: TransferFunction,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ChannelSelector {
    R,
    G,
    B,
    #[default]
    A,
}

impl ChannelSelector {
    pub(crate) fn index(self) -> usize {
        match self {
            Self::R => 0,
            Self::G => 1,
            Self::B => 2,
            Self::A => 3,
        }
    }
}

/// Straight-alpha RGBA8 image used as the displacement source, stretched over the filter region.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DisplacementMap {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA, `width * height * 4` bytes.
    pub rgba: Vec<u8>,
}

impl DisplacementMap {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> DmlfxResult<Self> {
        let m = Self {
            width,
            height,
            rgba,
        };
        m.validate()?;
        Ok(m)
    }

    pub fn validate(&self) -> DmlfxResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(DmlfxError::validation(
                "displacement map width/height must be > 0",
            ));
        }
        let expected = self.width as usize * self.height as usize * 4;
        if self.rgba.len() != expected {
            return Err(DmlfxError::validation(format!(
                "displacement map expects {expected} bytes, got {}",
                self.rgba.len()
            )));
        }
        Ok(())
    }

    /// Channel value in `[0, 1]` at normalized coordinates `(u, v)`, bilinear, edge-clamped.
    pub fn sample(&self, u: f64, v: f64, channel: ChannelSelector) -> f64 {
        if self.validate().is_err() {
            return 0.5;
        }
        let w = self.width as usize;
        let h = self.height as usize;
        let fx = (u.clamp(0.0, 1.0) * w as f64 - 0.5).clamp(0.0, (w - 1) as f64);
        let fy = (v.clamp(0.0, 1.0) * h as f64 - 0.5).clamp(0.0, (h - 1) as f64);
        let x0 = fx.floor() as usize;
        let y0 = fy.floor() as usize;
        let x1 = (x0 + 1).min(w - 1);
        let y1 = (y0 + 1).min(h - 1);
        let tx = fx - x0 as f64;
        let ty = fy - y0 as f64;
        let ch = channel.index();
        let px = |x: usize, y: usize| f64::from(self.rgba[(y * w + x) * 4 + ch]) / 255.0;
        let top = px(x0, y0) * (1.0 - tx) + px(x1, y0) * tx;
        let bot = px(x0, y1) * (1.0 - tx) + px(x1, y1) * tx;
        top * (1.0 - ty) + bot * ty
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DisplacementParams {
    #[serde(default)]
    pub scale: f64,
    #[serde(default)]
    pub x_channel: ChannelSelector,
    #[serde(default)]
    pub y_channel: ChannelSelector,
    /// Second input; absent means nothing to displace by.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<DisplacementMap>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeMode {
    #[default]
    Duplicate,
    Wrap,
    None,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ConvolveParams {
    pub order_x: u32,
    pub order_y: u32,
    /// Row-major, `order_x * order_y` values.
    pub kernel: Vec<f64>,
    /// `None` means the kernel sum (or 1 when the sum is 0).
    #[serde(default)]
    pub divisor: Option<f64>,
    #[serde(default)]
    pub bias: f64,
    #[serde(default)]
    pub target_x: Option<u32>,
    #[serde(default)]
    pub target_y: Option<u32>,
    #[serde(default)]
    pub edge_mode: EdgeMode,
    #[serde(default)]
    pub preserve_alpha: bool,
}

impl ConvolveParams {
    /// Square kernel of side `order` with default attributes.
    pub fn square(order: u32, kernel: Vec<f64>) -> Self {
        Self {
            order_x: order,
            order_y: order,
            kernel,
            divisor: None,
            bias: 0.0,
            target_x: None,
            target_y: None,
            edge_mode: EdgeMode::Duplicate,
            preserve_alpha: false,
        }
    }

    /// `true` when the kernel length matches its declared order.
    pub fn is_well_formed(&self) -> bool {
        self.order_x > 0
            && self.order_y > 0
            && self.kernel.len() == self.order_x as usize * self.order_y as usize
            && self.kernel.iter().all(|v| v.is_finite())
    }

    pub fn effective_divisor(&self) -> f64 {
        match self.divisor {
            Some(d) if d.is_finite() && d != 0.0 => d,
            _ => {
                let sum: f64 = self.kernel.iter().sum();
                if sum == 0.0 { 1.0 } else { sum }
            }
        }
    }

    pub fn target(&self) -> (u32, u32) {
        (
            self.target_x
                .filter(|t| *t < self.order_x)
                .unwrap_or(self.order_x / 2),
            self.target_y
                .filter(|t| *t < self.order_y)
                .unwrap_or(self.order_y / 2),
        )
    }
}

/// The filter DAG applied to one element.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FilterChain {
    pub nodes: Vec<FilterPrimitiveNode>,
    #[serde(default)]
    pub region: FilterRegion,
}

impl FilterChain {
    pub fn new(nodes: Vec<FilterPrimitiveNode>) -> Self {
        Self {
            nodes,
            region: FilterRegion::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Resolve each node's primary input against the outputs defined before it.
    ///
    /// Named references that do not match an earlier `output_name` fall back to the previous
    /// node's output and are reported in the second list (node index, reference name).
    pub fn resolve_inputs(&self) -> (Vec<ResolvedInput>, Vec<(usize, String)>) {
        let mut named: BTreeMap<&str, usize> = BTreeMap::new();
        let mut resolved = Vec::with_capacity(self.nodes.len());
        let mut dangling = Vec::new();
        for (i, node) in self.nodes.iter().enumerate() {
            let previous = if i == 0 {
                ResolvedInput::Source
            } else {
                ResolvedInput::Node(i - 1)
            };
            let input = match node.input_refs.first() {
                None => previous,
                Some(InputRef::SourceGraphic) => ResolvedInput::Source,
                Some(InputRef::SourceAlpha) => ResolvedInput::SourceAlpha,
                Some(InputRef::Result(name)) => match named.get(name.as_str()) {
                    Some(&j) => ResolvedInput::Node(j),
                    None => {
                        dangling.push((i, name.clone()));
                        previous
                    }
                },
            };
            resolved.push(input);
            if let Some(name) = &node.output_name {
                named.insert(name.as_str(), i);
            }
        }
        (resolved, dangling)
    }
}

/// Primary input of a node after name resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolvedInput {
    Source,
    SourceAlpha,
    Node(usize),
}
