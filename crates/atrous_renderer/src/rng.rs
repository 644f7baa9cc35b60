//! Stateless random number streams.
//!
//! Every random decision is drawn from a generator seeded purely by
//! `(iteration, pixel, bounce)`, so the stages can run in any order on any
//! number of threads and still produce the same image.

use atrous_math::{Vec2, Vec3};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::PI;

/// Generator type used by every stage.
pub type PathRng = SmallRng;

#[inline]
fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9e37_79b9_7f4a_7c15);
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}

/// Generator for one (iteration, pixel, bounce) triple.
///
/// Bounce 0 is consumed by camera ray generation; shading at depth `d`
/// uses bounce `d + 1`.
pub fn path_rng(iteration: u32, pixel: u32, bounce: u32) -> PathRng {
    let key = (u64::from(iteration) << 32) | u64::from(pixel);
    PathRng::seed_from_u64(splitmix64(key) ^ splitmix64(u64::from(bounce).wrapping_add(0x5851_f42d)))
}

/// Uniform float in [0, 1).
#[inline]
pub fn gen_f32(rng: &mut PathRng) -> f32 {
    rng.gen::<f32>()
}

/// Sample a random point in the unit square [-0.5, 0.5] x [-0.5, 0.5].
pub fn sample_square(rng: &mut PathRng) -> Vec2 {
    Vec2::new(gen_f32(rng) - 0.5, gen_f32(rng) - 0.5)
}

/// Sample a random point in the unit disk.
pub fn random_in_unit_disk(rng: &mut PathRng) -> Vec2 {
    loop {
        let p = Vec2::new(gen_f32(rng) * 2.0 - 1.0, gen_f32(rng) * 2.0 - 1.0);
        if p.length_squared() < 1.0 {
            return p;
        }
    }
}

/// Cosine-weighted direction in the hemisphere around `normal`.
///
/// Density is `cos(theta) / PI`.
pub fn cosine_hemisphere(normal: Vec3, rng: &mut PathRng) -> Vec3 {
    let r1 = gen_f32(rng);
    let r2 = gen_f32(rng);
    let phi = 2.0 * PI * r1;
    let r = r2.sqrt();
    let (tangent, bitangent) = normal.any_orthonormal_pair();

    let local_x = r * phi.cos();
    let local_y = r * phi.sin();
    let local_z = (1.0 - r2).max(0.0).sqrt();

    (tangent * local_x + bitangent * local_y + normal * local_z).normalize()
}
