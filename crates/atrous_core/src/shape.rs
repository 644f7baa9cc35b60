//! Geometric primitives.

use atrous_math::{Aabb, Mat3, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Transform components that can be composed into a matrix.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Build from translation, XYZ Euler rotation in degrees, and scale.
    pub fn from_trs_degrees(translation: Vec3, rotation_degrees: Vec3, scale: Vec3) -> Self {
        let rotation = Quat::from_euler(
            glam::EulerRot::XYZ,
            rotation_degrees.x.to_radians(),
            rotation_degrees.y.to_radians(),
            rotation_degrees.z.to_radians(),
        );
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// Convert to a 4x4 transformation matrix.
    ///
    /// Order: Scale -> Rotate -> Translate (SRT)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// Unit cube `[-0.5, 0.5]^3` placed in the world by a transform.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cuboid {
    pub transform: Transform,
    object_to_world: Mat4,
    world_to_object: Mat4,
    normal_matrix: Mat3,
}

impl Cuboid {
    pub fn new(transform: Transform) -> Self {
        let object_to_world = transform.to_matrix();
        let world_to_object = object_to_world.inverse();
        let normal_matrix = Mat3::from_mat4(world_to_object).transpose();
        Self {
            transform,
            object_to_world,
            world_to_object,
            normal_matrix,
        }
    }

    pub fn world_to_object(&self) -> &Mat4 {
        &self.world_to_object
    }

    /// Inverse transpose of the linear part, for carrying normals to world space.
    pub fn normal_matrix(&self) -> &Mat3 {
        &self.normal_matrix
    }

    fn bounding_box(&self) -> Aabb {
        let mut bbox = Aabb::EMPTY;
        for corner in 0..8u32 {
            let local = Vec3::new(
                if corner & 1 == 0 { -0.5 } else { 0.5 },
                if corner & 2 == 0 { -0.5 } else { 0.5 },
                if corner & 4 == 0 { -0.5 } else { 0.5 },
            );
            bbox = bbox.include_point(self.object_to_world.transform_point3(local));
        }
        Aabb::from_points(bbox.min(), bbox.max())
    }
}

/// Geometry of a single primitive.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Sphere { center: Vec3, radius: f32 },
    Cuboid(Cuboid),
    Triangle { v0: Vec3, v1: Vec3, v2: Vec3 },
}

impl Shape {
    pub fn sphere(center: Vec3, radius: f32) -> Self {
        Shape::Sphere { center, radius }
    }

    /// Cuboid from translation, rotation in degrees and scale.
    pub fn cuboid(translation: Vec3, rotation_degrees: Vec3, scale: Vec3) -> Self {
        Shape::Cuboid(Cuboid::new(Transform::from_trs_degrees(
            translation,
            rotation_degrees,
            scale,
        )))
    }

    pub fn triangle(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        Shape::Triangle { v0, v1, v2 }
    }

    /// World-space bounds.
    pub fn bounding_box(&self) -> Aabb {
        match self {
            Shape::Sphere { center, radius } => {
                let rvec = Vec3::splat(*radius);
                Aabb::from_points(*center - rvec, *center + rvec)
            }
            Shape::Cuboid(cuboid) => cuboid.bounding_box(),
            Shape::Triangle { v0, v1, v2 } => Aabb::from_points(v0.min(*v1).min(*v2), v0.max(*v1).max(*v2)),
        }
    }

    pub(crate) fn invalid_reason(&self) -> Option<&'static str> {
        match self {
            Shape::Sphere { center, radius } => {
                if !center.is_finite() || !radius.is_finite() || *radius <= 0.0 {
                    return Some("sphere needs a finite center and positive radius");
                }
            }
            Shape::Cuboid(cuboid) => {
                let scale = cuboid.transform.scale;
                if !scale.is_finite() || scale.abs().min_element() <= 0.0 {
                    return Some("cuboid scale must be non-zero on every axis");
                }
            }
            Shape::Triangle { v0, v1, v2 } => {
                if (*v1 - *v0).cross(*v2 - *v0).length_squared() <= f32::EPSILON * f32::EPSILON {
                    return Some("triangle has zero area");
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cuboid_bounds_follow_scale() {
        let shape = Shape::cuboid(Vec3::new(0.0, 5.0, 0.0), Vec3::ZERO, Vec3::new(10.0, 0.01, 10.0));
        let bbox = shape.bounding_box();
        assert!((bbox.x.min + 5.0).abs() < 1e-4);
        assert!((bbox.x.max - 5.0).abs() < 1e-4);
        assert!((bbox.y.min - 4.995).abs() < 1e-3);
    }

    #[test]
    fn test_cuboid_rotation_swaps_extent() {
        let shape = Shape::cuboid(Vec3::ZERO, Vec3::new(0.0, 0.0, 90.0), Vec3::new(4.0, 1.0, 1.0));
        let bbox = shape.bounding_box();
        assert!((bbox.y.size() - 4.0).abs() < 1e-3);
        assert!((bbox.x.size() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_degenerate_shapes_are_rejected() {
        assert!(Shape::sphere(Vec3::ZERO, 0.0).invalid_reason().is_some());
        assert!(Shape::triangle(Vec3::ZERO, Vec3::X, Vec3::X * 2.0)
            .invalid_reason()
            .is_some());
        assert!(Shape::cuboid(Vec3::ZERO, Vec3::ZERO, Vec3::new(1.0, 0.0, 1.0))
            .invalid_reason()
            .is_some());
        assert!(Shape::sphere(Vec3::ZERO, 1.0).invalid_reason().is_none());
    }
}
