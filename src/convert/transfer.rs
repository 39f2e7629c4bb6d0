use crate::convert::{Deferral, VectorStage};
use crate::foundation::core::Rgba8;
use crate::foundation::error::DmlfxResult;
use crate::model::{ColorEffect, ComponentTransferParams, Effect, Fill};
use crate::raster::{RasterSurface, kernels};
use crate::strategy::{TransferShape, classify_transfer};

/// Map a classified transfer onto the matching native color effect. Identity is elided.
pub fn vector(
    params: &ComponentTransferParams,
    input: &VectorStage,
) -> Result<VectorStage, Deferral> {
    let shape = classify_transfer(params)
        .ok_or_else(|| "transfer functions match no native color effect".to_string())?;
    let mut out = input.clone();
    let effect = match shape {
        TransferShape::Identity => return Ok(out),
        TransferShape::BinaryThreshold { threshold } => ColorEffect::BiLevel { threshold },
        TransferShape::Duotone { dark, light } => ColorEffect::Duotone { dark, light },
        TransferShape::Grayscale { level } => {
            let gray = Rgba8::gray(level as f32);
            for s in &mut out.shapes {
                if let Fill::Solid(c) = s.fill {
                    s.fill = Fill::Solid(Rgba8 { a: c.a, ..gray });
                }
                if let Some(stroke) = &mut s.stroke {
                    stroke.color = Rgba8 {
                        a: stroke.color.a,
                        ..gray
                    };
                }
            }
            ColorEffect::Grayscale
        }
        TransferShape::Gamma { exponent } => ColorEffect::Gamma { exponent },
        TransferShape::Luminance {
            brightness,
            contrast,
        } => ColorEffect::Luminance {
            brightness,
            contrast,
        },
        TransferShape::AlphaModulate { amount } => ColorEffect::AlphaModulate { amount },
    };
    for s in &mut out.shapes {
        s.effects.push(Effect::Color(effect.clone()));
    }
    Ok(out)
}

pub fn raster(params: &ComponentTransferParams, surface: &mut RasterSurface) -> DmlfxResult<()> {
    let img = kernels::component_transfer(surface.image(), params);
    surface.replace(img)
}
