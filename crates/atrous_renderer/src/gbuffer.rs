//! Primary-hit geometry buffer.

use atrous_math::Vec3;

use crate::intersect::Intersection;

/// Geometry seen by the primary ray of one pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GBufferTexel {
    /// Hit distance, negative on a miss
    pub t: f32,
    /// Unit normal facing the camera ray; zero on a miss
    pub normal: Vec3,
    /// World-space hit point; zero on a miss
    pub position: Vec3,
}

impl GBufferTexel {
    /// Sentinel for primary rays that left the scene.
    pub const MISS: Self = Self {
        t: -1.0,
        normal: Vec3::ZERO,
        position: Vec3::ZERO,
    };

    pub fn from_hit(hit: &Intersection) -> Self {
        Self {
            t: hit.t,
            normal: hit.normal,
            position: hit.point,
        }
    }

    #[inline]
    pub fn is_miss(&self) -> bool {
        self.t < 0.0
    }
}

impl Default for GBufferTexel {
    fn default() -> Self {
        Self::MISS
    }
}

/// One texel per pixel, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct GBuffer {
    width: u32,
    height: u32,
    texels: Vec<GBufferTexel>,
    valid: bool,
}

impl GBuffer {
    /// An invalid (all-miss) buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self::from_storage(Vec::new(), width, height)
    }

    pub(crate) fn from_storage(mut storage: Vec<GBufferTexel>, width: u32, height: u32) -> Self {
        storage.clear();
        storage.resize(width as usize * height as usize, GBufferTexel::MISS);
        Self {
            width,
            height,
            texels: storage,
            valid: false,
        }
    }

    /// A valid buffer from explicit texels.
    ///
    /// # Panics
    ///
    /// Panics if `texels.len() != width * height`.
    pub fn from_texels(width: u32, height: u32, texels: Vec<GBufferTexel>) -> Self {
        assert_eq!(texels.len(), width as usize * height as usize, "texel count mismatch");
        Self {
            width,
            height,
            texels,
            valid: true,
        }
    }

    /// Record primary hits, one per pixel in pixel order.
    pub fn capture(&mut self, primary_hits: &[Option<Intersection>]) {
        debug_assert_eq!(primary_hits.len(), self.texels.len());
        for (texel, hit) in self.texels.iter_mut().zip(primary_hits) {
            *texel = hit.as_ref().map_or(GBufferTexel::MISS, GBufferTexel::from_hit);
        }
        self.valid = true;
    }

    /// Forget the captured geometry; the next iteration recaptures it.
    pub fn invalidate(&mut self) {
        self.texels.fill(GBufferTexel::MISS);
        self.valid = false;
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn texels(&self) -> &[GBufferTexel] {
        &self.texels
    }

    pub fn get(&self, x: u32, y: u32) -> &GBufferTexel {
        &self.texels[y as usize * self.width as usize + x as usize]
    }
}
