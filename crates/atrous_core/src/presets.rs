//! Built-in scenes.

use atrous_math::Vec3;

use crate::{Camera, Color, Material, Scene, Shape};

/// The classic Cornell box: white floor, ceiling and back wall, red left
/// wall, green right wall, a ceiling light and a mirror sphere.
pub fn cornell_box(width: u32, height: u32) -> Scene {
    let camera = Camera::new()
        .with_resolution(width, height)
        .with_position(Vec3::new(0.0, 5.0, 10.5), Vec3::new(0.0, 5.0, 0.0), Vec3::Y)
        .with_lens(45.0, 0.0, 10.5);

    let mut scene = Scene::new("cornell", camera);

    let light = scene.add_material(Material::emissive(Color::ONE, 5.0));
    let white = scene.add_material(Material::lambertian(Color::splat(0.98)));
    let red = scene.add_material(Material::lambertian(Color::new(0.85, 0.35, 0.35)));
    let green = scene.add_material(Material::lambertian(Color::new(0.35, 0.85, 0.35)));
    let mirror = scene.add_material(Material::mirror(Color::splat(0.98)));

    // Ceiling light
    scene.add_primitive(
        Shape::cuboid(Vec3::new(0.0, 10.0, 0.0), Vec3::ZERO, Vec3::new(3.0, 0.3, 3.0)),
        light,
    );
    // Floor
    scene.add_primitive(
        Shape::cuboid(Vec3::ZERO, Vec3::ZERO, Vec3::new(10.0, 0.01, 10.0)),
        white,
    );
    // Ceiling
    scene.add_primitive(
        Shape::cuboid(Vec3::new(0.0, 10.0, 0.0), Vec3::new(0.0, 0.0, 90.0), Vec3::new(0.01, 10.0, 10.0)),
        white,
    );
    // Back wall
    scene.add_primitive(
        Shape::cuboid(Vec3::new(0.0, 5.0, -5.0), Vec3::new(0.0, 90.0, 0.0), Vec3::new(0.01, 10.0, 10.0)),
        white,
    );
    // Left wall
    scene.add_primitive(
        Shape::cuboid(Vec3::new(-5.0, 5.0, 0.0), Vec3::ZERO, Vec3::new(0.01, 10.0, 10.0)),
        red,
    );
    // Right wall
    scene.add_primitive(
        Shape::cuboid(Vec3::new(5.0, 5.0, 0.0), Vec3::ZERO, Vec3::new(0.01, 10.0, 10.0)),
        green,
    );
    // Sphere
    scene.add_primitive(Shape::sphere(Vec3::new(-1.0, 4.0, -1.0), 1.5), mirror);

    scene
}

/// A large diffuse slab lit only by a uniform sky, seen from straight above.
///
/// Every camera ray hits the slab's top face, and every bounce off it
/// escapes, so each pixel converges to `albedo * sky`.
pub fn floor_under_sky(width: u32, height: u32, albedo: Color, sky: Color) -> Scene {
    let camera = Camera::new()
        .with_resolution(width, height)
        .with_position(Vec3::new(0.0, 1.0, 0.0), Vec3::ZERO, Vec3::NEG_Z)
        .with_lens(40.0, 0.0, 1.0);

    let mut scene = Scene::new("floor", camera).with_background(sky);
    let floor = scene.add_material(Material::lambertian(albedo));
    scene.add_primitive(
        Shape::cuboid(Vec3::new(0.0, -0.5, 0.0), Vec3::ZERO, Vec3::new(1000.0, 1.0, 1000.0)),
        floor,
    );
    scene
}

/// Two perpendicular diffuse walls meeting in a vertical crease at the
/// image center, under a uniform sky.
///
/// The left half of the image sees a dark wall facing +Z, the right half a
/// bright wall facing +X, which makes a sharp normal discontinuity in the
/// G-buffer.
pub fn perpendicular_walls(width: u32, height: u32, sky: Color) -> Scene {
    let camera = Camera::new()
        .with_resolution(width, height)
        .with_position(Vec3::new(3.0, 0.0, 3.0), Vec3::ZERO, Vec3::Y)
        .with_lens(30.0, 0.0, 1.0);

    let mut scene = Scene::new("walls", camera).with_background(sky);
    let dark = scene.add_material(Material::lambertian(Color::splat(0.3)));
    let bright = scene.add_material(Material::lambertian(Color::splat(0.8)));

    // Wall in the x = 0 plane facing +X
    scene.add_primitive(
        Shape::cuboid(Vec3::new(-0.5, 0.0, -10.0), Vec3::ZERO, Vec3::new(1.0, 40.0, 20.0)),
        bright,
    );
    // Wall in the z = 0 plane facing +Z
    scene.add_primitive(
        Shape::cuboid(Vec3::new(-10.0, 0.0, -0.5), Vec3::ZERO, Vec3::new(20.0, 40.0, 1.0)),
        dark,
    );
    scene
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        assert!(cornell_box(32, 32).validate().is_ok());
        assert!(floor_under_sky(8, 8, Color::splat(0.5), Color::ONE).validate().is_ok());
        assert!(perpendicular_walls(16, 16, Color::ONE).validate().is_ok());
    }

    #[test]
    fn test_cornell_has_one_light() {
        let scene = cornell_box(16, 16);
        assert_eq!(scene.light_count(), 1);
        assert_eq!(scene.primitives.len(), 7);
    }
}
