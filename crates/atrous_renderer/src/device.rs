//! Working buffers owned by an initialized tracer.
//!
//! Everything an iteration touches is reserved up front by [`DeviceState::allocate`];
//! rendering afterwards only reuses capacity.

use atrous_core::{Color, Scene};
use atrous_math::Aabb;
use std::mem::size_of;
use std::sync::Arc;

use crate::accumulate::AccumulationBuffer;
use crate::bvh::Bvh;
use crate::error::{RenderError, Result};
use crate::gbuffer::{GBuffer, GBufferTexel};
use crate::intersect::Intersection;
use crate::path::PathSegment;

/// Fallible reservation against an optional byte budget.
#[derive(Debug)]
pub(crate) struct Allocator {
    budget: Option<usize>,
    used: usize,
}

impl Allocator {
    pub fn new(budget: Option<usize>) -> Self {
        Self { budget, used: 0 }
    }

    /// Bytes reserved so far.
    pub fn used(&self) -> usize {
        self.used
    }

    /// Empty vector with room for exactly `len` elements.
    pub fn reserve<T>(&mut self, buffer: &'static str, len: usize) -> Result<Vec<T>> {
        let overflow = RenderError::Allocation {
            buffer,
            bytes: usize::MAX,
        };
        let bytes = len.checked_mul(size_of::<T>()).ok_or(overflow.clone())?;
        let total = self.used.checked_add(bytes).ok_or(overflow)?;

        if self.budget.is_some_and(|budget| total > budget) {
            return Err(RenderError::Allocation { buffer, bytes });
        }

        let mut storage = Vec::new();
        storage
            .try_reserve_exact(len)
            .map_err(|_| RenderError::Allocation { buffer, bytes })?;

        self.used = total;
        Ok(storage)
    }
}

/// Buffers and acceleration data for one scene at one resolution.
#[derive(Debug)]
pub(crate) struct DeviceState {
    pub scene: Arc<Scene>,
    pub bvh: Bvh,
    /// World bounds, used to normalize the position view
    pub bounds: Aabb,
    pub accumulation: AccumulationBuffer,
    pub gbuffer: GBuffer,
    /// Active paths, dense after every compaction
    pub paths: Vec<PathSegment>,
    /// Paths terminated during the current iteration
    pub finished: Vec<PathSegment>,
    /// Nearest hit per active path, index-aligned with `paths`
    pub hits: Vec<Option<Intersection>>,
    /// Per-pixel radiance gathered from `finished`
    pub frame_radiance: Vec<Color>,
    /// Total bytes reserved for the buffers above
    pub reserved_bytes: usize,
}

impl DeviceState {
    /// Reserve every buffer for `scene`. The scene must already be validated.
    pub fn allocate(scene: Arc<Scene>, budget: Option<usize>) -> Result<Self> {
        let (width, height) = scene.resolution();
        let pixel_count = scene.pixel_count();
        let mut allocator = Allocator::new(budget);

        let accumulation = allocator.reserve::<Color>("accumulation", pixel_count)?;
        let gbuffer = allocator.reserve::<GBufferTexel>("gbuffer", pixel_count)?;
        let paths = allocator.reserve::<PathSegment>("paths", pixel_count)?;
        let finished = allocator.reserve::<PathSegment>("finished paths", pixel_count)?;
        let hits = allocator.reserve::<Option<Intersection>>("intersections", pixel_count)?;
        let mut frame_radiance = allocator.reserve::<Color>("frame radiance", pixel_count)?;
        frame_radiance.resize(pixel_count, Color::ZERO);

        let bvh = Bvh::build(&scene.primitives);
        let bounds = scene.world_bounds();

        Ok(Self {
            bvh,
            bounds,
            accumulation: AccumulationBuffer::from_storage(accumulation, pixel_count),
            gbuffer: GBuffer::from_storage(gbuffer, width, height),
            paths,
            finished,
            hits,
            frame_radiance,
            reserved_bytes: allocator.used(),
            scene,
        })
    }

    /// Drop accumulated samples and captured geometry, keeping the buffers.
    pub fn reset(&mut self) {
        self.accumulation.clear();
        self.gbuffer.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atrous_core::presets;

    #[test]
    fn test_allocator_tracks_bytes() {
        let mut allocator = Allocator::new(None);
        let v: Vec<u32> = allocator.reserve("test", 10).unwrap();
        assert!(v.capacity() >= 10);
        assert_eq!(allocator.used(), 40);
    }

    #[test]
    fn test_allocator_budget() {
        let mut allocator = Allocator::new(Some(100));
        allocator.reserve::<u64>("first", 10).unwrap();
        let err = allocator.reserve::<u64>("second", 10).unwrap_err();
        assert_eq!(
            err,
            RenderError::Allocation {
                buffer: "second",
                bytes: 80
            }
        );
        assert_eq!(allocator.used(), 80);
    }

    #[test]
    fn test_allocator_overflow() {
        let mut allocator = Allocator::new(None);
        let err = allocator.reserve::<u64>("huge", usize::MAX).unwrap_err();
        assert_eq!(
            err,
            RenderError::Allocation {
                buffer: "huge",
                bytes: usize::MAX
            }
        );
    }

    #[test]
    fn test_device_state_sizes() {
        let scene = Arc::new(presets::cornell_box(8, 4));
        let state = DeviceState::allocate(scene, None).unwrap();

        assert_eq!(state.accumulation.len(), 32);
        assert_eq!(state.gbuffer.texels().len(), 32);
        assert_eq!(state.frame_radiance.len(), 32);
        assert!(state.paths.capacity() >= 32);
        assert!(!state.gbuffer.is_valid());
        assert!(!state.bvh.is_empty());
        assert!(state.reserved_bytes > 0);
    }
}
