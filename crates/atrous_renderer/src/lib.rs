//! Atrous Renderer - progressive CPU path tracing with an à-trous denoiser
//!
//! A Monte Carlo path tracer that adds one sample per pixel per call to
//! [`PathTracer::render`], plus an edge-avoiding à-trous wavelet filter
//! guided by a G-buffer captured from the primary rays.
//!
//! Each iteration runs as a wavefront: all camera paths are generated, then
//! intersected, shaded and compacted bounce by bounce, with rayon doing the
//! per-path work.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use atrous_core::presets;
//! use atrous_renderer::{DenoiseParams, PathTracer, RenderConfig};
//!
//! let scene = Arc::new(presets::cornell_box(16, 16));
//! let mut tracer = PathTracer::new(RenderConfig::default());
//! tracer.init(scene).unwrap();
//!
//! for iteration in 1..=4 {
//!     tracer.render(0, iteration).unwrap();
//! }
//!
//! let mut pixels = vec![[0u8; 4]; 16 * 16];
//! tracer.show_denoised_image(&mut pixels, &DenoiseParams::default(), 4).unwrap();
//! tracer.free().unwrap();
//! ```

mod accumulate;
mod bvh;
mod config;
mod denoise;
mod device;
mod display;
mod error;
mod gbuffer;
mod integrator;
mod intersect;
mod path;
mod rng;
mod scatter;
mod tracer;

pub use accumulate::AccumulationBuffer;
pub use bvh::Bvh;
pub use config::{GBufferView, RenderConfig, RussianRoulette, ToneMap};
pub use denoise::{denoise, DenoiseParams, KERNEL, MAX_PASSES, MIN_EDGE_WEIGHT};
pub use display::{color_to_rgba, Rgba8};
pub use error::{RenderError, Result};
pub use gbuffer::{GBuffer, GBufferTexel};
pub use integrator::{shade_path, IterationStats, RAY_EPSILON};
pub use intersect::{Intersection, T_MIN};
pub use path::{camera_ray, compact, generate_camera_paths, PathSegment, PathStatus};
pub use rng::{path_rng, PathRng};
pub use scatter::ScatterSample;
pub use tracer::{PathTracer, RenderStats};

/// Re-export the scene types the renderer consumes
pub use atrous_core::{Color, Scene};
