//! Ray-primitive intersection.
//!
//! Accepted hit distances are `T_MIN < t <= ray_t.max`. The inclusive upper
//! bound lets the BVH see hits at exactly the current closest distance, which
//! is what makes the lowest-primitive-index tie-break independent of
//! traversal order.

use atrous_core::{Cuboid, MaterialId, Shape};
use atrous_math::{Interval, Ray, Vec2, Vec3};
use std::f32::consts::PI;

/// Smallest accepted hit distance.
pub const T_MIN: f32 = 1e-4;

/// Nearest-hit record for one path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    /// Distance along the (unit) ray direction
    pub t: f32,
    /// Index of the primitive in the scene
    pub primitive: usize,
    pub material: MaterialId,
    /// World-space hit point
    pub point: Vec3,
    /// Unit surface normal, always pointing against the incoming ray
    pub normal: Vec3,
    /// Whether the ray hit the outside of the surface
    pub front_face: bool,
    /// Surface parameterization (sphere angles, cube face coords, barycentrics)
    pub uv: Vec2,
}

impl Intersection {
    /// Build the record, orienting the normal against the ray.
    pub(crate) fn new(ray: &Ray, hit: SurfaceHit, primitive: usize, material: MaterialId) -> Self {
        let front_face = ray.direction.dot(hit.outward_normal) < 0.0;
        let normal = if front_face {
            hit.outward_normal
        } else {
            -hit.outward_normal
        };
        Self {
            t: hit.t,
            primitive,
            material,
            point: ray.at(hit.t),
            normal,
            front_face,
            uv: hit.uv,
        }
    }
}

/// Raw shape hit before material and orientation are attached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SurfaceHit {
    pub t: f32,
    pub outward_normal: Vec3,
    pub uv: Vec2,
}

#[inline]
fn accepts(ray_t: Interval, t: f32) -> bool {
    ray_t.min < t && t <= ray_t.max
}

/// Intersect one shape within `ray_t`.
pub(crate) fn intersect_shape(shape: &Shape, ray: &Ray, ray_t: Interval) -> Option<SurfaceHit> {
    match shape {
        Shape::Sphere { center, radius } => intersect_sphere(*center, *radius, ray, ray_t),
        Shape::Cuboid(cuboid) => intersect_cuboid(cuboid, ray, ray_t),
        Shape::Triangle { v0, v1, v2 } => intersect_triangle(*v0, *v1, *v2, ray, ray_t),
    }
}

fn intersect_sphere(center: Vec3, radius: f32, ray: &Ray, ray_t: Interval) -> Option<SurfaceHit> {
    let oc = center - ray.origin;
    let a = ray.direction.length_squared();
    let h = ray.direction.dot(oc);
    let c = oc.length_squared() - radius * radius;

    let discriminant = h * h - a * c;
    if discriminant < 0.0 {
        return None;
    }

    let sqrtd = discriminant.sqrt();

    // Find the nearest root in the acceptable range
    let mut root = (h - sqrtd) / a;
    if !accepts(ray_t, root) {
        root = (h + sqrtd) / a;
        if !accepts(ray_t, root) {
            return None;
        }
    }

    let outward_normal = (ray.at(root) - center) / radius;
    let theta = (-outward_normal.y).clamp(-1.0, 1.0).acos();
    let phi = (-outward_normal.z).atan2(outward_normal.x) + PI;

    Some(SurfaceHit {
        t: root,
        outward_normal,
        uv: Vec2::new(phi / (2.0 * PI), theta / PI),
    })
}

/// Slab test in object space against the unit cube.
///
/// The object-space direction is not renormalized, so the slab parameters
/// are world-space ray parameters.
fn intersect_cuboid(cuboid: &Cuboid, ray: &Ray, ray_t: Interval) -> Option<SurfaceHit> {
    let to_object = cuboid.world_to_object();
    let origin = to_object.transform_point3(ray.origin);
    let direction = to_object.transform_vector3(ray.direction);

    let mut t_near = f32::NEG_INFINITY;
    let mut near_face = (0, 0.0);
    let mut t_far = f32::INFINITY;
    let mut far_face = (0, 0.0);

    for axis in 0..3 {
        let o = origin[axis];
        let d = direction[axis];
        if d.abs() < 1e-12 {
            if !(-0.5..=0.5).contains(&o) {
                return None;
            }
            continue;
        }

        let t0 = (-0.5 - o) / d;
        let t1 = (0.5 - o) / d;
        let (enter, enter_sign, exit, exit_sign) = if t0 < t1 {
            (t0, -1.0, t1, 1.0)
        } else {
            (t1, 1.0, t0, -1.0)
        };

        if enter > t_near {
            t_near = enter;
            near_face = (axis, enter_sign);
        }
        if exit < t_far {
            t_far = exit;
            far_face = (axis, exit_sign);
        }
    }

    if t_near > t_far {
        return None;
    }

    let (t, (axis, sign)) = if accepts(ray_t, t_near) {
        (t_near, near_face)
    } else if accepts(ray_t, t_far) {
        (t_far, far_face)
    } else {
        return None;
    };

    let mut local_normal = Vec3::ZERO;
    local_normal[axis] = sign;
    let outward_normal = (*cuboid.normal_matrix() * local_normal).normalize();

    let local_point = origin + direction * t;
    let uv = match axis {
        0 => Vec2::new(local_point.y, local_point.z),
        1 => Vec2::new(local_point.x, local_point.z),
        _ => Vec2::new(local_point.x, local_point.y),
    } + Vec2::splat(0.5);

    Some(SurfaceHit {
        t,
        outward_normal,
        uv,
    })
}

/// Möller-Trumbore ray-triangle intersection.
fn intersect_triangle(v0: Vec3, v1: Vec3, v2: Vec3, ray: &Ray, ray_t: Interval) -> Option<SurfaceHit> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;

    let h = ray.direction.cross(edge2);
    let a = edge1.dot(h);

    // Ray is parallel to triangle
    if a.abs() < 1e-8 {
        return None;
    }

    let f = 1.0 / a;
    let s = ray.origin - v0;
    let u = f * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * ray.direction.dot(q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(q);
    if !accepts(ray_t, t) {
        return None;
    }

    Some(SurfaceHit {
        t,
        outward_normal: edge1.cross(edge2).normalize(),
        uv: Vec2::new(u, v),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_interval() -> Interval {
        Interval::new(T_MIN, f32::INFINITY)
    }

    #[test]
    fn test_sphere_hit() {
        let sphere = Shape::sphere(Vec3::new(0.0, 0.0, -1.0), 0.5);
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);

        let hit = intersect_shape(&sphere, &ray, open_interval()).unwrap();
        assert!((hit.t - 0.5).abs() < 1e-4);
        assert!((hit.outward_normal - Vec3::Z).length() < 1e-4);
    }

    #[test]
    fn test_sphere_miss() {
        let sphere = Shape::sphere(Vec3::new(0.0, 0.0, -1.0), 0.5);
        let ray = Ray::new(Vec3::ZERO, Vec3::Y);
        assert!(intersect_shape(&sphere, &ray, open_interval()).is_none());
    }

    #[test]
    fn test_inside_sphere_hits_far_side_back_face() {
        let sphere = Shape::sphere(Vec3::ZERO, 2.0);
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        let hit = intersect_shape(&sphere, &ray, open_interval()).unwrap();
        let record = Intersection::new(&ray, hit, 0, MaterialId(0));
        assert!((record.t - 2.0).abs() < 1e-4);
        assert!(!record.front_face);
        assert!((record.normal - Vec3::NEG_X).length() < 1e-4);
    }

    #[test]
    fn test_cuboid_hit_top_face() {
        let slab = Shape::cuboid(Vec3::ZERO, Vec3::ZERO, Vec3::new(10.0, 0.02, 10.0));
        let ray = Ray::new(Vec3::new(1.0, 3.0, 2.0), Vec3::NEG_Y);

        let hit = intersect_shape(&slab, &ray, open_interval()).unwrap();
        assert!((hit.t - 2.99).abs() < 1e-4);
        assert!((hit.outward_normal - Vec3::Y).length() < 1e-4);
    }

    #[test]
    fn test_rotated_cuboid_normal() {
        // Thin slab rotated 90 degrees about Z becomes a wall facing X
        let wall = Shape::cuboid(Vec3::ZERO, Vec3::new(0.0, 0.0, 90.0), Vec3::new(4.0, 0.02, 4.0));
        let ray = Ray::new(Vec3::new(5.0, 0.5, 0.5), Vec3::NEG_X);

        let hit = intersect_shape(&wall, &ray, open_interval()).unwrap();
        assert!((hit.t - 4.99).abs() < 1e-3);
        assert!((hit.outward_normal - Vec3::X).length() < 1e-4);
    }

    #[test]
    fn test_cuboid_parallel_ray_outside_misses() {
        let cube = Shape::cuboid(Vec3::ZERO, Vec3::ZERO, Vec3::ONE);
        let ray = Ray::new(Vec3::new(0.0, 2.0, -5.0), Vec3::Z);
        assert!(intersect_shape(&cube, &ray, open_interval()).is_none());
    }

    #[test]
    fn test_triangle_hit_and_miss() {
        let tri = Shape::triangle(
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(0.0, 1.0, -1.0),
        );

        let toward = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        let hit = intersect_shape(&tri, &toward, open_interval()).unwrap();
        assert!((hit.t - 1.0).abs() < 1e-4);

        let away = Ray::new(Vec3::ZERO, Vec3::Z);
        assert!(intersect_shape(&tri, &away, open_interval()).is_none());
    }

    #[test]
    fn test_upper_bound_is_inclusive() {
        let sphere = Shape::sphere(Vec3::new(0.0, 0.0, -1.0), 0.5);
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        let t = intersect_shape(&sphere, &ray, open_interval()).unwrap().t;
        assert!(intersect_shape(&sphere, &ray, Interval::new(T_MIN, t)).is_some());
    }
}
