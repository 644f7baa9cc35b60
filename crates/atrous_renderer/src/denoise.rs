//! Edge-avoiding à-trous wavelet filter.
//!
//! Each pass convolves with a 5x5 B3-spline kernel whose taps are spread
//! `2^pass` pixels apart, so a few passes cover a large footprint. Every tap
//! is further weighted by how similar its color, normal and position are to
//! the center pixel, which keeps geometric edges sharp.

use atrous_core::Color;
use atrous_math::distance_squared;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::gbuffer::{GBuffer, GBufferTexel};

/// 1D B3-spline taps; the 2D weight of tap `(i, j)` is `KERNEL[i] * KERNEL[j]`.
pub const KERNEL: [f32; 5] = [1.0 / 16.0, 1.0 / 4.0, 3.0 / 8.0, 1.0 / 4.0, 1.0 / 16.0];

/// Upper bound on the number of passes.
pub const MAX_PASSES: u32 = 10;

/// Edge weights at or below this are raised to it.
pub const MIN_EDGE_WEIGHT: f32 = 1e-6;

/// Filter controls.
///
/// Larger weights tolerate larger differences; a weight near zero makes
/// that channel a hard edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DenoiseParams {
    /// Footprint in pixels; below 5 the filter is disabled
    pub filter_size: u32,
    pub color_weight: f32,
    pub normal_weight: f32,
    pub position_weight: f32,
}

impl Default for DenoiseParams {
    fn default() -> Self {
        Self {
            filter_size: 80,
            color_weight: 0.45,
            normal_weight: 0.35,
            position_weight: 0.2,
        }
    }
}

impl DenoiseParams {
    pub fn new(filter_size: u32, color_weight: f32, normal_weight: f32, position_weight: f32) -> Self {
        Self {
            filter_size,
            color_weight,
            normal_weight,
            position_weight,
        }
    }

    /// Number of passes whose combined support fits in `filter_size`.
    ///
    /// After `n` passes the support is `4 * (2^n - 1) + 1` pixels wide.
    pub fn pass_count(&self) -> u32 {
        let mut passes = 0;
        while passes < MAX_PASSES && 4 * ((1u64 << (passes + 1)) - 1) + 1 <= u64::from(self.filter_size) {
            passes += 1;
        }
        passes
    }

    /// Copy with every weight raised to at least [`MIN_EDGE_WEIGHT`].
    pub fn sanitized(&self) -> Self {
        Self {
            filter_size: self.filter_size,
            color_weight: sanitize_weight("color", self.color_weight),
            normal_weight: sanitize_weight("normal", self.normal_weight),
            position_weight: sanitize_weight("position", self.position_weight),
        }
    }
}

fn sanitize_weight(name: &str, weight: f32) -> f32 {
    if weight > MIN_EDGE_WEIGHT {
        weight
    } else {
        log::debug!("Denoise {} weight {} out of range, using {}", name, weight, MIN_EDGE_WEIGHT);
        MIN_EDGE_WEIGHT
    }
}

#[inline]
fn edge_stop(distance_sq: f32, weight: f32) -> f32 {
    (-distance_sq / weight).exp()
}

/// Filter `image` (row-major, one color per G-buffer texel).
///
/// Returns a copy of the input when the filter is disabled.
pub fn denoise(image: &[Color], gbuffer: &GBuffer, params: &DenoiseParams) -> Vec<Color> {
    debug_assert_eq!(image.len(), gbuffer.texels().len());
    let passes = params.pass_count();
    let mut src = image.to_vec();
    if passes == 0 || src.is_empty() {
        return src;
    }

    let params = params.sanitized();
    let width = gbuffer.width() as usize;
    let mut dst = vec![Color::ZERO; src.len()];

    for pass in 0..passes {
        let step = 1usize << pass;
        dst.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
            for (x, out) in row.iter_mut().enumerate() {
                *out = filter_pixel(&src, gbuffer, &params, x, y, step);
            }
        });
        std::mem::swap(&mut src, &mut dst);
    }

    log::trace!("Denoised {} pixels in {} passes", src.len(), passes);
    src
}

fn filter_pixel(src: &[Color], gbuffer: &GBuffer, params: &DenoiseParams, x: usize, y: usize, step: usize) -> Color {
    let width = gbuffer.width() as usize;
    let height = gbuffer.height() as usize;
    let texels = gbuffer.texels();

    let center_index = y * width + x;
    let center_color = src[center_index];
    let center = &texels[center_index];

    let mut sum = Color::ZERO;
    let mut weight_sum = 0.0;

    for (j, ky) in KERNEL.iter().enumerate() {
        let Some(sy) = offset(y, j, step, height) else {
            continue;
        };
        for (i, kx) in KERNEL.iter().enumerate() {
            let Some(sx) = offset(x, i, step, width) else {
                continue;
            };

            let index = sy * width + sx;
            let color = src[index];
            let spatial = kx * ky;

            let weight = if index == center_index || center.is_miss() {
                spatial
            } else {
                spatial * edge_weight(center_color, center, color, &texels[index], params)
            };

            sum += color * weight;
            weight_sum += weight;
        }
    }

    // The center tap always contributes
    sum / weight_sum
}

/// Combined edge-stopping weight of a sample against a hit center.
#[inline]
fn edge_weight(
    center_color: Color,
    center: &GBufferTexel,
    color: Color,
    sample: &GBufferTexel,
    params: &DenoiseParams,
) -> f32 {
    if sample.is_miss() {
        return 0.0;
    }
    edge_stop(distance_squared(center_color, color), params.color_weight)
        * edge_stop(distance_squared(center.normal, sample.normal), params.normal_weight)
        * edge_stop(distance_squared(center.position, sample.position), params.position_weight)
}

/// Coordinate of kernel tap `tap` around `center`, if inside `[0, len)`.
#[inline]
fn offset(center: usize, tap: usize, step: usize, len: usize) -> Option<usize> {
    let shifted = (center + tap * step).checked_sub(2 * step)?;
    (shifted < len).then_some(shifted)
}
