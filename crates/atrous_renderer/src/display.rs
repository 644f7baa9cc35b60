//! Conversion of renderer buffers to 8-bit RGBA.

use atrous_core::Color;
use atrous_math::{Aabb, Vec3};
use rayon::prelude::*;

use crate::config::{GBufferView, ToneMap};
use crate::error::{RenderError, Result};
use crate::gbuffer::GBufferTexel;

/// One output pixel.
pub type Rgba8 = [u8; 4];

/// Apply gamma correction (gamma = 2.0).
#[inline]
fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

#[inline]
fn to_byte(x: f32) -> u8 {
    (255.0 * x.clamp(0.0, 1.0)) as u8
}

/// Convert a linear color to 8-bit RGBA.
pub fn color_to_rgba(color: Color, tone_map: ToneMap) -> Rgba8 {
    let mapped = match tone_map {
        ToneMap::Clamp => color,
        ToneMap::Gamma => Color::new(
            linear_to_gamma(color.x),
            linear_to_gamma(color.y),
            linear_to_gamma(color.z),
        ),
    };
    [to_byte(mapped.x), to_byte(mapped.y), to_byte(mapped.z), 255]
}

/// Fail unless `out` holds exactly `expected` pixels.
pub fn check_len(out: &[Rgba8], expected: usize) -> Result<()> {
    if out.len() != expected {
        return Err(RenderError::BufferSize {
            expected,
            actual: out.len(),
        });
    }
    Ok(())
}

/// Write `colors * scale`, tone-mapped, into `out`.
pub fn write_colors(out: &mut [Rgba8], colors: &[Color], scale: f32, tone_map: ToneMap) -> Result<()> {
    check_len(out, colors.len())?;
    out.par_iter_mut()
        .zip(colors.par_iter())
        .for_each(|(pixel, color)| *pixel = color_to_rgba(*color * scale, tone_map));
    Ok(())
}

/// Visualize one G-buffer channel. Misses are black.
///
/// Positions are normalized into `bounds`; depth is `1 - t / diagonal` of
/// `bounds` so near surfaces are bright.
pub fn write_gbuffer(out: &mut [Rgba8], texels: &[GBufferTexel], view: GBufferView, bounds: &Aabb) -> Result<()> {
    check_len(out, texels.len())?;

    let min = bounds.min();
    let extent = (bounds.max() - min).max(Vec3::splat(f32::EPSILON));
    let diagonal = extent.length();

    out.par_iter_mut().zip(texels.par_iter()).for_each(|(pixel, texel)| {
        let color = if texel.is_miss() {
            Color::ZERO
        } else {
            match view {
                GBufferView::Normal => texel.normal * 0.5 + Vec3::splat(0.5),
                GBufferView::Position => (texel.position - min) / extent,
                GBufferView::Depth => Color::splat(1.0 - texel.t / diagonal),
            }
        };
        *pixel = color_to_rgba(color, ToneMap::Clamp);
    });
    Ok(())
}
