//! Path state, camera ray generation and compaction.

use atrous_core::{Camera, CameraFrame, Color};
use atrous_math::Ray;
use rayon::prelude::*;

use crate::rng::{path_rng, random_in_unit_disk, sample_square};

/// Lifecycle of a path within one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStatus {
    /// Still bouncing
    Active,
    /// Terminated normally; `radiance` is its contribution
    Finished,
    /// Dropped after a zero-pdf or non-finite scatter event
    Degenerate,
}

/// State of one in-flight camera path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathSegment {
    pub pixel_index: u32,
    pub ray: Ray,
    /// Product of `f * cos / pdf` along the path so far
    pub throughput: Color,
    /// Radiance gathered so far
    pub radiance: Color,
    pub remaining_bounces: u32,
    /// Scatter events taken so far
    pub depth: u32,
    pub status: PathStatus,
}

impl PathSegment {
    pub fn new(pixel_index: u32, ray: Ray, bounce_budget: u32) -> Self {
        Self {
            pixel_index,
            ray,
            throughput: Color::ONE,
            radiance: Color::ZERO,
            remaining_bounces: bounce_budget,
            depth: 0,
            status: PathStatus::Active,
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == PathStatus::Active
    }

    /// Terminate, keeping what has been gathered.
    #[inline]
    pub fn finish(&mut self) {
        self.status = PathStatus::Finished;
    }

    /// Terminate and discard the sample.
    #[inline]
    pub fn discard(&mut self) {
        self.status = PathStatus::Degenerate;
        self.radiance = Color::ZERO;
    }
}

/// Primary ray through linear pixel index `pixel` on `iteration`.
///
/// Jitter and lens samples come from bounce 0 of the pixel's stream.
pub fn camera_ray(camera: &Camera, frame: &CameraFrame, pixel: u32, iteration: u32) -> Ray {
    let i = pixel % camera.image_width;
    let j = pixel / camera.image_width;
    let mut rng = path_rng(iteration, pixel, 0);

    let offset = sample_square(&mut rng);
    let target = frame.pixel_sample(i, j, offset);
    let origin = if frame.has_defocus {
        frame.lens_sample(random_in_unit_disk(&mut rng))
    } else {
        frame.center
    };

    Ray::normalized(origin, target - origin)
}

/// Fill `paths` with one fresh path per pixel, in pixel order.
///
/// Reuses the vector's capacity; nothing is allocated when it was sized by
/// the device state.
pub fn generate_camera_paths(camera: &Camera, iteration: u32, bounce_budget: u32, paths: &mut Vec<PathSegment>) {
    let frame = camera.frame();
    // Scene validation keeps the pixel count within u32
    let pixel_count = u32::try_from(camera.pixel_count()).unwrap_or(u32::MAX);

    paths.clear();
    paths.par_extend((0..pixel_count).into_par_iter().map(|pixel| {
        PathSegment::new(pixel, camera_ray(camera, &frame, pixel, iteration), bounce_budget)
    }));
}

/// Move terminated paths from `active` to `finished`, keeping `active` dense
/// and in their existing relative order.
///
/// Returns the number of paths moved.
pub fn compact(active: &mut Vec<PathSegment>, finished: &mut Vec<PathSegment>) -> usize {
    let before = finished.len();
    let mut write = 0;

    for read in 0..active.len() {
        let path = active[read];
        if path.is_active() {
            active[write] = path;
            write += 1;
        } else {
            finished.push(path);
        }
    }

    active.truncate(write);
    finished.len() - before
}
