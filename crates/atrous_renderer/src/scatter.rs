//! Material sampling.
//!
//! Each material is importance-sampled and reports `f`, `pdf` and the cosine
//! term separately, so the integrator can apply `f * cos / pdf` in one place
//! and catch degenerate samples there. Delta lobes (mirror, glass) carry
//! their whole weight in `f` with unit pdf and cosine.

use atrous_core::{Color, Material};
use atrous_math::Vec3;
use std::f32::consts::FRAC_1_PI;

use crate::intersect::Intersection;
use crate::rng::{cosine_hemisphere, gen_f32, PathRng};

/// One importance-sampled continuation direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterSample {
    pub direction: Vec3,
    /// BSDF value (or delta weight)
    pub f: Color,
    pub pdf: f32,
    pub cos_theta: f32,
    /// The new direction crosses the surface
    pub transmitted: bool,
}

impl ScatterSample {
    /// Throughput multiplier `f * cos / pdf`, or `None` for a degenerate sample.
    pub fn weight(&self) -> Option<Color> {
        if !(self.pdf > 0.0) || !self.direction.is_finite() {
            return None;
        }
        let weight = self.f * (self.cos_theta / self.pdf);
        weight.is_finite().then_some(weight)
    }
}

/// Radiance leaving the surface toward the incoming ray.
pub fn emitted(material: &Material, hit: &Intersection) -> Color {
    match material {
        Material::Emissive { radiance } if hit.front_face => *radiance,
        _ => Color::ZERO,
    }
}

/// Sample a continuation for a ray arriving along `incoming`.
///
/// Returns `None` when the material absorbs (emitters).
pub fn sample(material: &Material, incoming: Vec3, hit: &Intersection, rng: &mut PathRng) -> Option<ScatterSample> {
    match material {
        Material::Lambertian { albedo } => {
            let direction = cosine_hemisphere(hit.normal, rng);
            let cos_theta = direction.dot(hit.normal);
            Some(ScatterSample {
                direction,
                f: *albedo * FRAC_1_PI,
                pdf: cos_theta * FRAC_1_PI,
                cos_theta,
                transmitted: false,
            })
        }
        Material::Mirror { albedo } => Some(ScatterSample {
            direction: reflect(incoming, hit.normal),
            f: *albedo,
            pdf: 1.0,
            cos_theta: 1.0,
            transmitted: false,
        }),
        Material::Dielectric { tint, ior } => {
            let refraction_ratio = if hit.front_face { 1.0 / ior } else { *ior };

            let unit_direction = incoming.normalize();
            let cos_theta = (-unit_direction).dot(hit.normal).min(1.0);
            let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();

            // Check for total internal reflection
            let cannot_refract = refraction_ratio * sin_theta > 1.0;
            let reflects = cannot_refract || reflectance(cos_theta, refraction_ratio) > gen_f32(rng);

            let direction = if reflects {
                reflect(unit_direction, hit.normal)
            } else {
                refract(unit_direction, hit.normal, refraction_ratio)
            };

            Some(ScatterSample {
                direction: direction.normalize(),
                f: *tint,
                pdf: 1.0,
                cos_theta: 1.0,
                transmitted: !reflects,
            })
        }
        Material::Emissive { .. } => None,
    }
}

/// Schlick's approximation for reflectance
fn reflectance(cosine: f32, ior: f32) -> f32 {
    let r0 = ((1.0 - ior) / (1.0 + ior)).powi(2);
    r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
}

/// Reflect a vector about a normal.
#[inline]
fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract a vector through a surface.
#[inline]
fn refract(uv: Vec3, n: Vec3, etai_over_etat: f32) -> Vec3 {
    let cos_theta = (-uv).dot(n).min(1.0);
    let r_out_perp = etai_over_etat * (uv + cos_theta * n);
    let r_out_parallel = -(1.0 - r_out_perp.length_squared()).abs().sqrt() * n;
    r_out_perp + r_out_parallel
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::path_rng;
    use atrous_core::MaterialId;
    use atrous_math::Vec2;

    fn floor_hit() -> Intersection {
        Intersection {
            t: 1.0,
            primitive: 0,
            material: MaterialId(0),
            point: Vec3::ZERO,
            normal: Vec3::Y,
            front_face: true,
            uv: Vec2::ZERO,
        }
    }

    #[test]
    fn test_lambertian_weight_is_albedo() {
        let albedo = Color::new(0.2, 0.5, 0.8);
        let material = Material::lambertian(albedo);
        let mut rng = path_rng(1, 2, 3);

        for _ in 0..64 {
            let s = sample(&material, Vec3::NEG_Y, &floor_hit(), &mut rng).unwrap();
            assert!(s.direction.dot(Vec3::Y) >= 0.0);
            if let Some(w) = s.weight() {
                assert!((w - albedo).length() < 1e-4);
            }
        }
    }

    #[test]
    fn test_zero_pdf_is_degenerate() {
        let s = ScatterSample {
            direction: Vec3::X,
            f: Color::ONE,
            pdf: 0.0,
            cos_theta: 0.0,
            transmitted: false,
        };
        assert!(s.weight().is_none());

        let nan = ScatterSample { pdf: f32::NAN, ..s };
        assert!(nan.weight().is_none());
    }

    #[test]
    fn test_mirror_reflects() {
        let material = Material::mirror(Color::splat(0.9));
        let incoming = Vec3::new(1.0, -1.0, 0.0).normalize();
        let mut rng = path_rng(0, 0, 1);

        let s = sample(&material, incoming, &floor_hit(), &mut rng).unwrap();
        let expected = Vec3::new(1.0, 1.0, 0.0).normalize();
        assert!((s.direction - expected).length() < 1e-5);
        assert_eq!(s.weight(), Some(Color::splat(0.9)));
    }

    #[test]
    fn test_dielectric_total_internal_reflection() {
        let material = Material::dielectric(1.5);
        let mut hit = floor_hit();
        hit.front_face = false;
        // Grazing ray leaving glass must reflect
        let incoming = Vec3::new(1.0, -0.1, 0.0).normalize();
        let mut rng = path_rng(0, 0, 1);

        for _ in 0..16 {
            let s = sample(&material, incoming, &hit, &mut rng).unwrap();
            assert!(!s.transmitted);
            assert!(s.direction.y > 0.0);
        }
    }

    #[test]
    fn test_dielectric_head_on_mostly_transmits() {
        let material = Material::dielectric(1.5);
        let mut rng = path_rng(4, 4, 1);
        let transmitted = (0..256)
            .filter(|_| sample(&material, Vec3::NEG_Y, &floor_hit(), &mut rng).unwrap().transmitted)
            .count();
        // Normal-incidence reflectance for glass is 4%
        assert!(transmitted > 220, "transmitted {}", transmitted);
    }

    #[test]
    fn test_emission_front_face_only() {
        let light = Material::emissive(Color::ONE, 3.0);
        let mut hit = floor_hit();
        assert_eq!(emitted(&light, &hit), Color::splat(3.0));
        hit.front_face = false;
        assert_eq!(emitted(&light, &hit), Color::ZERO);
        let mut rng = path_rng(0, 0, 1);
        assert!(sample(&light, Vec3::NEG_Y, &hit, &mut rng).is_none());
    }
}
