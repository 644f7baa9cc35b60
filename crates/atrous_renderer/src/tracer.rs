//! The progressive path tracer session.

use atrous_core::{Color, Scene};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::RenderConfig;
use crate::denoise::{denoise, DenoiseParams};
use crate::device::DeviceState;
use crate::display::{self, Rgba8};
use crate::error::{RenderError, Result};
use crate::gbuffer::GBuffer;
use crate::integrator::trace_iteration;

/// Summary of one `render` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderStats {
    pub frame: u32,
    pub iteration: u32,
    /// Intersect/shade rounds executed
    pub bounces: u32,
    /// Samples dropped for a zero pdf or a non-finite value
    pub degenerate_samples: usize,
    pub elapsed: Duration,
}

/// Progressive path tracer with an à-trous denoised view.
///
/// Lifecycle: [`init`](Self::init) with a scene, call [`render`](Self::render)
/// once per iteration (1, 2, 3, ...), read back with the `show_*` views, and
/// [`free`](Self::free) when done.
#[derive(Debug, Default)]
pub struct PathTracer {
    config: RenderConfig,
    state: Option<DeviceState>,
}

impl PathTracer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config, state: None }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Mutable configuration; takes effect on the next `render` or view.
    pub fn config_mut(&mut self) -> &mut RenderConfig {
        &mut self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    /// Validate `scene` and reserve every working buffer for it.
    ///
    /// On error the tracer stays uninitialized.
    pub fn init(&mut self, scene: Arc<Scene>) -> Result<()> {
        if self.state.is_some() {
            return Err(RenderError::InvalidState("init called while already initialized"));
        }
        scene.validate()?;

        let state = DeviceState::allocate(scene, self.config.memory_budget)?;
        let (width, height) = state.scene.resolution();
        log::info!(
            "Initialized '{}' at {}x{}: {} primitives, {} BVH nodes, {} bytes reserved",
            state.scene.name,
            width,
            height,
            state.scene.primitives.len(),
            state.bvh.node_count(),
            state.reserved_bytes
        );

        self.state = Some(state);
        Ok(())
    }

    /// Release every buffer.
    pub fn free(&mut self) -> Result<()> {
        let state = self
            .state
            .take()
            .ok_or(RenderError::InvalidState("free called before init"))?;
        log::info!("Freed '{}' ({} bytes)", state.scene.name, state.reserved_bytes);
        Ok(())
    }

    /// Clear accumulated samples and the G-buffer, e.g. after the camera moved.
    pub fn reset(&mut self) -> Result<()> {
        self.state_mut("reset called before init")?.reset();
        log::debug!("Accumulation reset");
        Ok(())
    }

    /// Trace one sample per pixel and add it to the running sums.
    ///
    /// `iteration` seeds the random streams and should count up from 1
    /// after `init` or `reset`; `frame` is informational.
    pub fn render(&mut self, frame: u32, iteration: u32) -> Result<RenderStats> {
        let state = self
            .state
            .as_mut()
            .ok_or(RenderError::InvalidState("render called before init"))?;

        let start = Instant::now();
        let stats = trace_iteration(state, &self.config, iteration);
        let elapsed = start.elapsed();

        if stats.degenerate_samples > 0 {
            log::debug!(
                "Iteration {}: dropped {} degenerate samples",
                iteration,
                stats.degenerate_samples
            );
        }
        log::debug!(
            "Frame {} iteration {} traced in {:.2?} ({} bounces)",
            frame,
            iteration,
            elapsed,
            stats.bounces
        );

        Ok(RenderStats {
            frame,
            iteration,
            bounces: stats.bounces,
            degenerate_samples: stats.degenerate_samples,
            elapsed,
        })
    }

    /// Write the configured G-buffer channel into `out`.
    pub fn show_gbuffer(&self, out: &mut [Rgba8]) -> Result<()> {
        let state = self.state("show_gbuffer called before init")?;
        display::write_gbuffer(out, state.gbuffer.texels(), self.config.gbuffer_view, &state.bounds)
    }

    /// Write the running average after `iteration` samples into `out`.
    pub fn show_image(&self, out: &mut [Rgba8], iteration: u32) -> Result<()> {
        let state = self.state("show_image called before init")?;
        let scale = 1.0 / iteration.max(1) as f32;
        display::write_colors(out, state.accumulation.sums(), scale, self.config.tone_map)
    }

    /// Denoise the running average and write it into `out`.
    pub fn show_denoised_image(&self, out: &mut [Rgba8], params: &DenoiseParams, iteration: u32) -> Result<()> {
        let state = self.state("show_denoised_image called before init")?;
        display::check_len(out, state.accumulation.len())?;

        let image = state.accumulation.average(iteration);
        let filtered = denoise(&image, &state.gbuffer, params);
        display::write_colors(out, &filtered, 1.0, self.config.tone_map)
    }

    /// Raw per-pixel radiance sums.
    pub fn accumulated(&self) -> Option<&[Color]> {
        self.state.as_ref().map(|state| state.accumulation.sums())
    }

    pub fn gbuffer(&self) -> Option<&GBuffer> {
        self.state.as_ref().map(|state| &state.gbuffer)
    }

    /// Resolution of the initialized scene.
    pub fn resolution(&self) -> Option<(u32, u32)> {
        self.state.as_ref().map(|state| state.scene.resolution())
    }

    fn state(&self, context: &'static str) -> Result<&DeviceState> {
        self.state.as_ref().ok_or(RenderError::InvalidState(context))
    }

    fn state_mut(&mut self, context: &'static str) -> Result<&mut DeviceState> {
        self.state.as_mut().ok_or(RenderError::InvalidState(context))
    }
}
