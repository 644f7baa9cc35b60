//! One progressive iteration: generate, intersect, shade, compact, gather.
//!
//! Each stage is a rayon parallel pass over the active paths and returns
//! before the next one starts. Paths are independent, so no stage needs
//! locks.

use atrous_core::{Color, Scene};
use atrous_math::{max_component, Ray};
use rayon::prelude::*;
use std::sync::Arc;

use crate::config::RenderConfig;
use crate::device::DeviceState;
use crate::intersect::Intersection;
use crate::path::{compact, generate_camera_paths, PathSegment, PathStatus};
use crate::rng::{gen_f32, path_rng};
use crate::scatter;

/// Distance new rays are pushed off the surface they leave.
pub const RAY_EPSILON: f32 = 1e-4;

/// Counters from one iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IterationStats {
    /// Intersect/shade rounds executed
    pub bounces: u32,
    /// Samples dropped for a zero pdf or a non-finite value
    pub degenerate_samples: usize,
}

/// Advance one path by one event.
///
/// `hit` is the nearest intersection of `path.ray`, or `None` on a miss.
pub fn shade_path(
    path: &mut PathSegment,
    hit: Option<&Intersection>,
    scene: &Scene,
    config: &RenderConfig,
    iteration: u32,
) {
    let Some(hit) = hit else {
        path.radiance += path.throughput * scene.background;
        path.finish();
        return;
    };

    // Validated scenes always resolve
    let Some(material) = scene.material(hit.material) else {
        path.discard();
        return;
    };

    if material.is_emissive() {
        path.radiance += path.throughput * scatter::emitted(material, hit);
        path.finish();
        return;
    }

    let mut rng = path_rng(iteration, path.pixel_index, path.depth + 1);
    let Some(sample) = scatter::sample(material, path.ray.direction, hit, &mut rng) else {
        path.finish();
        return;
    };

    let throughput = match sample.weight() {
        Some(weight) => path.throughput * weight,
        None => Color::NAN,
    };
    if !throughput.is_finite() {
        log::trace!(
            "Degenerate sample at pixel {} depth {} (pdf {})",
            path.pixel_index,
            path.depth,
            sample.pdf
        );
        path.discard();
        return;
    }

    path.throughput = throughput;
    path.depth += 1;
    path.remaining_bounces = path.remaining_bounces.saturating_sub(1);

    if path.remaining_bounces == 0 || max_component(throughput) <= 0.0 {
        path.finish();
        return;
    }

    if let Some(roulette) = config.russian_roulette {
        let strength = max_component(throughput);
        if path.depth >= roulette.min_depth && strength < roulette.threshold {
            let survival = roulette.survival_probability(strength);
            if gen_f32(&mut rng) >= survival {
                path.finish();
                return;
            }
            path.throughput /= survival;
        }
    }

    let offset = if sample.transmitted { -hit.normal } else { hit.normal };
    path.ray = Ray::new(hit.point + offset * RAY_EPSILON, sample.direction);
}

/// Run iteration `iteration` and add its samples to the accumulation buffer.
///
/// Captures the G-buffer from the primary hits when it is not valid.
pub(crate) fn trace_iteration(state: &mut DeviceState, config: &RenderConfig, iteration: u32) -> IterationStats {
    let scene = Arc::clone(&state.scene);
    let capture_gbuffer = !state.gbuffer.is_valid();
    let mut stats = IterationStats::default();

    if let Some(roulette) = config.russian_roulette {
        if roulette.survival_floor() != roulette.min_survival {
            log::debug!(
                "Roulette min_survival {} out of range, using {}",
                roulette.min_survival,
                roulette.survival_floor()
            );
        }
    }

    generate_camera_paths(&scene.camera, iteration, config.bounce_budget(), &mut state.paths);
    state.finished.clear();

    while !state.paths.is_empty() {
        let bvh = &state.bvh;
        state.hits.clear();
        state.hits.par_extend(
            state
                .paths
                .par_iter()
                .map(|path| bvh.intersect(&scene.primitives, &path.ray)),
        );

        // Before the first compaction paths are still one per pixel, in order
        if stats.bounces == 0 && capture_gbuffer {
            state.gbuffer.capture(&state.hits);
        }

        state
            .paths
            .par_iter_mut()
            .zip(state.hits.par_iter())
            .for_each(|(path, hit)| shade_path(path, hit.as_ref(), &scene, config, iteration));

        compact(&mut state.paths, &mut state.finished);
        stats.bounces += 1;
    }

    state.frame_radiance.fill(Color::ZERO);
    for path in &state.finished {
        match path.status {
            PathStatus::Finished => state.frame_radiance[path.pixel_index as usize] += path.radiance,
            PathStatus::Degenerate => stats.degenerate_samples += 1,
            PathStatus::Active => {}
        }
    }

    stats.degenerate_samples += state.accumulation.accumulate_frame(&state.frame_radiance);
    stats
}
