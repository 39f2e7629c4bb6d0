use crate::convert::{Deferral, VectorStage};
use crate::foundation::core::{Rect, Rgba8};
use crate::foundation::error::DmlfxResult;
use crate::model::{
    BevelPreset, DiffuseLightingParams, Effect, LightDirection, LightRig, LightSource, Material,
    SpecularLightingParams,
};
use crate::raster::RasterSurface;
use crate::raster::kernels::{self, PixelLight, Shading};

/// Light position reduced to what a native light rig can express.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightAngles {
    /// Degrees clockwise from the positive x axis (y down).
    pub azimuth: f64,
    /// Degrees above the surface plane.
    pub elevation: f64,
}

impl LightAngles {
    /// Direction to `light` as seen from the centre of `bounds`.
    pub fn of(light: &LightSource, bounds: Rect) -> Result<Self, Deferral> {
        let c = bounds.center();
        let towards = |x: f64, y: f64, z: f64| {
            let (dx, dy) = (x - c.x, y - c.y);
            let planar = dx.hypot(dy);
            Self {
                azimuth: if planar > 0.0 { dy.atan2(dx).to_degrees() } else { 0.0 },
                elevation: z.atan2(planar).to_degrees(),
            }
        };
        let angles = match *light {
            LightSource::Distant { azimuth, elevation } => Self {
                azimuth,
                elevation,
            },
            LightSource::Point { x, y, z } => towards(x, y, z),
            LightSource::Spot {
                limiting_cone_angle: Some(a),
                ..
            } => return Err(format!("spot light cone of {a:.1} degrees")),
            LightSource::Spot { x, y, z, .. } => towards(x, y, z),
        };
        if angles.azimuth.is_finite() && angles.elevation.is_finite() {
            Ok(angles)
        } else {
            Err("light position is not finite".to_string())
        }
    }

    /// Nearest of the eight rig directions.
    pub fn direction(&self) -> LightDirection {
        const COMPASS: [LightDirection; 8] = [
            LightDirection::T,
            LightDirection::Tr,
            LightDirection::R,
            LightDirection::Br,
            LightDirection::B,
            LightDirection::Bl,
            LightDirection::L,
            LightDirection::Tl,
        ];
        // Compass angle is measured clockwise from up.
        let step = ((self.azimuth + 90.0) / 45.0).round() as i64;
        COMPASS[step.rem_euclid(8) as usize]
    }

    pub fn rig(&self) -> LightRig {
        match self.elevation {
            e if e >= 60.0 => LightRig::Soft,
            e if e >= 30.0 => LightRig::Balanced,
            e if e >= 10.0 => LightRig::ThreePt,
            _ => LightRig::Harsh,
        }
    }
}

fn bevel(preset: BevelPreset, surface_scale: f64, elevation: f64) -> Effect {
    let width = (surface_scale.abs() * 2.0).clamp(0.5, 64.0);
    Effect::Bevel {
        preset,
        width,
        height: width * elevation.to_radians().sin().max(0.1),
    }
}

// Shade on the side facing away from the light.
fn inner_shadow(surface_scale: f64, angles: LightAngles) -> Effect {
    let slant = angles.elevation.to_radians().cos().clamp(0.0, 1.0);
    Effect::InnerShadow {
        color: Rgba8::rgba(0, 0, 0, (160.0 * slant).round() as u8),
        blur: surface_scale.abs().clamp(0.5, 32.0) * 2.0,
        distance: surface_scale.abs() * slant,
        direction: (angles.azimuth + 180.0).rem_euclid(360.0),
    }
}

fn with_effects(input: &VectorStage, effects: &[Effect]) -> VectorStage {
    let mut out = input.clone();
    for s in &mut out.shapes {
        s.effects.extend(effects.iter().cloned());
    }
    out
}

fn stage_bounds(input: &VectorStage) -> Rect {
    input
        .shapes
        .iter()
        .map(|s| s.geometry.bounds())
        .reduce(|a, b| a.union(b))
        .unwrap_or(Rect::ZERO)
}

/// Bevel, light rig and inner shadow approximating a diffuse lit surface.
pub fn vector_diffuse(
    params: &DiffuseLightingParams,
    input: &VectorStage,
) -> Result<VectorStage, Deferral> {
    let angles = LightAngles::of(&params.light, stage_bounds(input))?;
    Ok(with_effects(
        input,
        &[
            bevel(BevelPreset::SoftRound, params.surface_scale, angles.elevation),
            Effect::Scene {
                rig: angles.rig(),
                direction: angles.direction(),
                material: Material::Matte,
            },
            inner_shadow(params.surface_scale, angles),
        ],
    ))
}

/// As [`vector_diffuse`] with a glossy material and an outer glow in the light color.
pub fn vector_specular(
    params: &SpecularLightingParams,
    input: &VectorStage,
) -> Result<VectorStage, Deferral> {
    let angles = LightAngles::of(&params.light, stage_bounds(input))?;
    let (preset, material) = if params.specular_exponent >= 20.0 {
        (BevelPreset::Convex, Material::Metal)
    } else {
        (BevelPreset::Circle, Material::Plastic)
    };
    let glow = (params.specular_constant.clamp(0.0, 1.0) * 200.0).round() as u8;
    let c = params.lighting_color;
    Ok(with_effects(
        input,
        &[
            bevel(preset, params.surface_scale, angles.elevation),
            Effect::Scene {
                rig: angles.rig(),
                direction: angles.direction(),
                material,
            },
            inner_shadow(params.surface_scale, angles),
            Effect::OuterShadow {
                color: Rgba8::rgba(c.r, c.g, c.b, glow),
                blur: (params.specular_exponent.max(1.0)).sqrt() * 2.0,
                distance: params.surface_scale.abs() * 0.5,
                direction: angles.azimuth.rem_euclid(360.0),
            },
        ],
    ))
}

fn pixel_light(light: &LightSource, surface: &RasterSurface) -> PixelLight {
    PixelLight::from_user(light, surface.to_pixel(), surface.scale())
}

pub fn raster_diffuse(
    params: &DiffuseLightingParams,
    surface: &mut RasterSurface,
) -> DmlfxResult<()> {
    let img = kernels::lighting(
        surface.image(),
        pixel_light(&params.light, surface),
        Shading::Diffuse {
            constant: params.diffuse_constant,
        },
        params.surface_scale,
        params.lighting_color,
    );
    surface.replace(img)
}

pub fn raster_specular(
    params: &SpecularLightingParams,
    surface: &mut RasterSurface,
) -> DmlfxResult<()> {
    let img = kernels::lighting(
        surface.image(),
        pixel_light(&params.light, surface),
        Shading::Specular {
            constant: params.specular_constant,
            exponent: params.specular_exponent,
        },
        params.surface_scale,
        params.lighting_color,
    );
    surface.replace(img)
}
