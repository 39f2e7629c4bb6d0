use usvg::tiny_skia_path::PathSegment;

use crate::config::ConvertOptions;
use crate::dispatch::ConversionRequest;
use crate::foundation::core::{Affine, Rgba8};
use crate::foundation::error::{DmlfxError, DmlfxResult};
use crate::geometry::{FillRule, PathBuilder, PathSpec};
use crate::model::{ClipDefinition, ClipLibrary, ElementInput, ShapeStyle, StrokeStyle, UnitsMode};

/// Elements and clip definitions pulled out of an SVG document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SvgImport {
    pub clips: ClipLibrary,
    pub elements: Vec<ElementInput>,
    /// Groups carrying filters; their filters are not imported.
    pub skipped_filters: usize,
}

impl SvgImport {
    pub fn into_request(self, options: ConvertOptions) -> ConversionRequest {
        ConversionRequest {
            options,
            clips: self.clips,
            elements: self.elements,
        }
    }
}

/// Parse `data` with usvg and collect every filled or stroked path.
///
/// Each path is expressed in the coordinate space of its nearest clipped ancestor, with that
/// ancestor's absolute transform as the element transform, so the clip applies in the element's
/// user space. Clips of further ancestors are not carried over.
#[tracing::instrument(skip_all, fields(bytes = data.len()))]
pub fn import_svg(data: &[u8]) -> DmlfxResult<SvgImport> {
    let tree = usvg::Tree::from_data(data, &usvg::Options::default())
        .map_err(|e| DmlfxError::validation(format!("parse svg tree: {e}")))?;
    let mut out = SvgImport::default();
    let mut walker = Walker {
        out: &mut out,
        next_id: 0,
    };
    let root = tree.root();
    walker.group(root, Space::root(root.abs_transform()));
    tracing::debug!(
        elements = out.elements.len(),
        clips = out.clips.len(),
        "svg imported"
    );
    Ok(out)
}

#[derive(Clone)]
struct Space {
    /// Group transforms accumulated below `base`.
    local: usvg::Transform,
    /// Absolute transform of the space the elements are expressed in.
    base: usvg::Transform,
    clip: Option<String>,
}

impl Space {
    fn root(base: usvg::Transform) -> Self {
        Self {
            local: usvg::Transform::identity(),
            base,
            clip: None,
        }
    }
}

struct Walker<'a> {
    out: &'a mut SvgImport,
    next_id: usize,
}

impl Walker<'_> {
    fn group(&mut self, group: &usvg::Group, space: Space) {
        for node in group.children() {
            match node {
                usvg::Node::Group(g) => {
                    if !g.filters().is_empty() {
                        tracing::warn!(group = g.id(), "svg filters are not imported");
                        self.out.skipped_filters += 1;
                    }
                    let inner = match g.clip_path() {
                        Some(clip) => Space {
                            local: usvg::Transform::identity(),
                            base: g.abs_transform(),
                            clip: Some(self.clip(clip)),
                        },
                        None => Space {
                            local: space.local.pre_concat(g.transform()),
                            ..space.clone()
                        },
                    };
                    self.group(g, inner);
                }
                usvg::Node::Path(p) => self.path(p, &space),
                _ => {}
            }
        }
    }

    fn path(&mut self, p: &usvg::Path, space: &Space) {
        if !p.is_visible() || (p.fill().is_none() && p.stroke().is_none()) {
            return;
        }
        let geometry = path_from_usvg(p).transformed(affine(space.local));
        let id = self.id(p.id(), "path");
        let mut element = ElementInput::new(id, geometry)
            .with_style(style(p))
            .with_transform(affine(space.base));
        element.clip = space.clip.clone();
        self.out.elements.push(element);
    }

    // Registers `clip` (and the clips it references) and returns its library id.
    fn clip(&mut self, clip: &usvg::ClipPath) -> String {
        let id = self.id(clip.id(), "clip");
        if self.out.clips.get(&id).is_some() {
            return id;
        }
        let mut children = Vec::new();
        collect_clip_children(clip.root(), usvg::Transform::identity(), &mut children);
        let mut def = ClipDefinition::new(children)
            .with_units(UnitsMode::UserSpaceOnUse)
            .with_transform(affine(clip.transform()));
        if let Some(inner) = clip.clip_path() {
            def = def.with_clip_ref(self.clip(inner));
        }
        self.out.clips.insert(id.clone(), def);
        id
    }

    fn id(&mut self, id: &str, prefix: &str) -> String {
        if id.is_empty() {
            self.next_id += 1;
            format!("{prefix}{}", self.next_id)
        } else {
            id.to_string()
        }
    }
}

fn collect_clip_children(group: &usvg::Group, t: usvg::Transform, out: &mut Vec<PathSpec>) {
    for node in group.children() {
        match node {
            usvg::Node::Group(g) => collect_clip_children(g, t.pre_concat(g.transform()), out),
            usvg::Node::Path(p) => out.push(path_from_usvg(p).transformed(affine(t))),
            _ => {}
        }
    }
}

/// Path data of `p` in its own coordinate space, with its fill rule.
pub fn path_from_usvg(p: &usvg::Path) -> PathSpec {
    let rule = match p.fill().map(usvg::Fill::rule) {
        Some(usvg::FillRule::EvenOdd) => FillRule::EvenOdd,
        Some(usvg::FillRule::NonZero) | None => FillRule::NonZero,
    };
    let mut b = PathBuilder::new(rule);
    for seg in p.data().segments() {
        match seg {
            PathSegment::MoveTo(pt) => {
                b.move_to((f64::from(pt.x), f64::from(pt.y)));
            }
            PathSegment::LineTo(pt) => {
                b.line_to((f64::from(pt.x), f64::from(pt.y)));
            }
            PathSegment::QuadTo(c, pt) => {
                b.quad_to(
                    (f64::from(c.x), f64::from(c.y)),
                    (f64::from(pt.x), f64::from(pt.y)),
                );
            }
            PathSegment::CubicTo(c1, c2, pt) => {
                b.curve_to(
                    (f64::from(c1.x), f64::from(c1.y)),
                    (f64::from(c2.x), f64::from(c2.y)),
                    (f64::from(pt.x), f64::from(pt.y)),
                );
            }
            PathSegment::Close => {
                b.close();
            }
        }
    }
    b.build()
}

fn affine(t: usvg::Transform) -> Affine {
    Affine::new([
        f64::from(t.sx),
        f64::from(t.ky),
        f64::from(t.kx),
        f64::from(t.sy),
        f64::from(t.tx),
        f64::from(t.ty),
    ])
}

// Gradients and patterns have no flat color; they import as black.
fn color(paint: &usvg::Paint, opacity: f32) -> Rgba8 {
    let a = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
    match paint {
        usvg::Paint::Color(c) => Rgba8::rgba(c.red, c.green, c.blue, a),
        _ => Rgba8 { a, ..Rgba8::BLACK },
    }
}

fn style(p: &usvg::Path) -> ShapeStyle {
    ShapeStyle {
        fill: p.fill().map(|f| color(f.paint(), f.opacity().get())),
        stroke: p.stroke().map(|s| {
            let dash = s
                .dasharray()
                .map(|d| d.iter().map(|v| f64::from(*v)).collect())
                .unwrap_or_default();
            StrokeStyle::dashed(
                color(s.paint(), s.opacity().get()),
                f64::from(s.width().get()),
                dash,
            )
        }),
        opacity: 1.0,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/import/svg.rs"]
mod tests;
