//! Surface materials.
//!
//! Materials are plain data here. Sampling lives in the renderer so the
//! scene description stays independent of any random number source.

use atrous_math::Vec3;
use serde::{Deserialize, Serialize};

/// Color type alias (linear RGB radiance or reflectance)
pub type Color = Vec3;

/// Index of a material inside [`crate::Scene::materials`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaterialId(pub usize);

/// How a surface responds to light.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Material {
    /// Ideal diffuse reflector.
    Lambertian { albedo: Color },
    /// Perfect specular reflector.
    Mirror { albedo: Color },
    /// Smooth glass-like interface.
    ///
    /// `ior`: index of refraction (1.0 = air, 1.5 = glass, 2.4 = diamond)
    Dielectric { tint: Color, ior: f32 },
    /// Area light. Emits from its front face and absorbs everything.
    Emissive { radiance: Color },
}

impl Material {
    pub fn lambertian(albedo: Color) -> Self {
        Material::Lambertian { albedo }
    }

    pub fn mirror(albedo: Color) -> Self {
        Material::Mirror { albedo }
    }

    pub fn dielectric(ior: f32) -> Self {
        Material::Dielectric { tint: Color::ONE, ior }
    }

    /// Emissive material with `color * strength` radiance.
    pub fn emissive(color: Color, strength: f32) -> Self {
        Material::Emissive {
            radiance: color * strength,
        }
    }

    pub fn is_emissive(&self) -> bool {
        matches!(self, Material::Emissive { .. })
    }

    /// Reason the parameters are unusable, if any.
    pub(crate) fn invalid_reason(&self) -> Option<&'static str> {
        let color = match self {
            Material::Lambertian { albedo } | Material::Mirror { albedo } => *albedo,
            Material::Dielectric { tint, ior } => {
                if !ior.is_finite() || *ior <= 0.0 {
                    return Some("index of refraction must be positive");
                }
                *tint
            }
            Material::Emissive { radiance } => *radiance,
        };

        if !color.is_finite() || color.min_element() < 0.0 {
            return Some("colors must be finite and non-negative");
        }
        None
    }
}

impl Default for Material {
    fn default() -> Self {
        Material::Lambertian {
            albedo: Color::splat(0.5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emissive_scales_radiance() {
        let light = Material::emissive(Color::ONE, 5.0);
        assert!(light.is_emissive());
        assert_eq!(light, Material::Emissive { radiance: Color::splat(5.0) });
    }

    #[test]
    fn test_invalid_reason() {
        assert!(Material::dielectric(1.5).invalid_reason().is_none());
        assert!(Material::dielectric(0.0).invalid_reason().is_some());
        assert!(Material::lambertian(Color::new(-0.1, 0.0, 0.0))
            .invalid_reason()
            .is_some());
        assert!(Material::mirror(Color::splat(f32::NAN)).invalid_reason().is_some());
    }
}
