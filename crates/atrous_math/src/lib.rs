// Re-export glam for convenience
pub use glam::*;

// Atrous math types
mod aabb;
mod interval;
mod ray;

pub use aabb::Aabb;
pub use interval::Interval;
pub use ray::Ray;

/// Largest of the three components, used for throughput tests.
#[inline]
pub fn max_component(v: Vec3) -> f32 {
    v.x.max(v.y).max(v.z)
}

/// Squared euclidean distance between two vectors.
#[inline]
pub fn distance_squared(a: Vec3, b: Vec3) -> f32 {
    (a - b).length_squared()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_component() {
        assert_eq!(max_component(Vec3::new(0.2, 0.9, 0.4)), 0.9);
        assert_eq!(max_component(Vec3::new(-1.0, -2.0, -3.0)), -1.0);
    }

    #[test]
    fn test_distance_squared() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 6.0, 3.0);
        assert_eq!(distance_squared(a, b), 25.0);
    }
}
