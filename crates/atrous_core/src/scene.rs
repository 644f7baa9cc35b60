//! The scene handed to the renderer.
//!
//! A `Scene` is assembled by the host (or one of the [`crate::presets`]),
//! validated once, and then shared read-only with the path tracer.

use atrous_math::Aabb;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Camera, Color, Material, MaterialId, Shape};

/// Problems that make a scene unrenderable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("Camera resolution {width}x{height} has no pixels")]
    EmptyResolution { width: u32, height: u32 },

    #[error("Camera resolution {width}x{height} has more pixels than fit in a u32 index")]
    ResolutionTooLarge { width: u32, height: u32 },

    #[error("Invalid camera: {0}")]
    InvalidCamera(&'static str),

    #[error("Background radiance must be finite and non-negative")]
    InvalidBackground,

    #[error("Primitive {primitive} references missing material {material}")]
    MissingMaterial { primitive: usize, material: usize },

    #[error("Invalid material {index}: {reason}")]
    InvalidMaterial { index: usize, reason: &'static str },

    #[error("Invalid shape for primitive {index}: {reason}")]
    InvalidShape { index: usize, reason: &'static str },
}

/// A shape bound to a material.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Primitive {
    pub shape: Shape,
    pub material: MaterialId,
}

/// A complete scene: camera, materials, primitives and environment.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Scene {
    /// Scene name (for logging)
    pub name: String,

    pub camera: Camera,

    /// Radiance returned by rays that leave the scene
    pub background: Color,

    pub materials: Vec<Material>,

    /// Primitive index = position in this list; used as the intersection tie-break.
    pub primitives: Vec<Primitive>,
}

impl Scene {
    /// Create an empty scene with a black background.
    pub fn new(name: impl Into<String>, camera: Camera) -> Self {
        Self {
            name: name.into(),
            camera,
            background: Color::ZERO,
            materials: Vec::new(),
            primitives: Vec::new(),
        }
    }

    /// Set the environment radiance seen by escaping rays.
    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }

    /// Add a material to the scene and return its ID.
    pub fn add_material(&mut self, material: Material) -> MaterialId {
        let id = MaterialId(self.materials.len());
        self.materials.push(material);
        id
    }

    /// Add a primitive and return its index.
    pub fn add_primitive(&mut self, shape: Shape, material: MaterialId) -> usize {
        let index = self.primitives.len();
        self.primitives.push(Primitive { shape, material });
        index
    }

    /// Get a material by ID.
    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.0)
    }

    /// Output resolution as `(width, height)`.
    pub fn resolution(&self) -> (u32, u32) {
        (self.camera.image_width, self.camera.image_height)
    }

    pub fn pixel_count(&self) -> usize {
        self.camera.pixel_count()
    }

    /// World-space bounds of all primitives.
    pub fn world_bounds(&self) -> Aabb {
        self.primitives
            .iter()
            .fold(Aabb::EMPTY, |acc, p| Aabb::surrounding(&acc, &p.shape.bounding_box()))
    }

    /// Check everything the renderer relies on.
    pub fn validate(&self) -> Result<(), SceneError> {
        let (width, height) = self.resolution();
        if width == 0 || height == 0 {
            return Err(SceneError::EmptyResolution { width, height });
        }
        if u32::try_from(self.pixel_count()).is_err() {
            return Err(SceneError::ResolutionTooLarge { width, height });
        }

        let camera = &self.camera;
        if !(camera.vfov > 0.0 && camera.vfov < 180.0) {
            return Err(SceneError::InvalidCamera("vertical fov must be in (0, 180) degrees"));
        }
        if !(camera.focus_dist > 0.0) {
            return Err(SceneError::InvalidCamera("focus distance must be positive"));
        }
        let forward = camera.look_from - camera.look_at;
        if forward.length_squared() <= f32::EPSILON {
            return Err(SceneError::InvalidCamera("look_from and look_at coincide"));
        }
        if camera.vup.cross(forward).length_squared() <= f32::EPSILON {
            return Err(SceneError::InvalidCamera("up vector is parallel to the view direction"));
        }
        if !self.background.is_finite() || self.background.min_element() < 0.0 {
            return Err(SceneError::InvalidBackground);
        }

        for (index, material) in self.materials.iter().enumerate() {
            if let Some(reason) = material.invalid_reason() {
                return Err(SceneError::InvalidMaterial { index, reason });
            }
        }

        for (index, primitive) in self.primitives.iter().enumerate() {
            if primitive.material.0 >= self.materials.len() {
                return Err(SceneError::MissingMaterial {
                    primitive: index,
                    material: primitive.material.0,
                });
            }
            if let Some(reason) = primitive.shape.invalid_reason() {
                return Err(SceneError::InvalidShape { index, reason });
            }
        }

        log::debug!(
            "Scene '{}' validated: {}x{}, {} primitives, {} materials",
            self.name,
            width,
            height,
            self.primitives.len(),
            self.materials.len()
        );
        Ok(())
    }

    /// Count of emissive primitives.
    pub fn light_count(&self) -> usize {
        self.primitives
            .iter()
            .filter(|p| self.material(p.material).is_some_and(Material::is_emissive))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atrous_math::Vec3;

    fn small_camera() -> Camera {
        Camera::new()
            .with_resolution(4, 4)
            .with_position(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y)
    }

    #[test]
    fn test_scene_creation() {
        let mut scene = Scene::new("test", small_camera());
        let white = scene.add_material(Material::lambertian(Color::ONE));
        let light = scene.add_material(Material::emissive(Color::ONE, 2.0));

        assert_eq!(scene.add_primitive(Shape::sphere(Vec3::ZERO, 1.0), white), 0);
        assert_eq!(scene.add_primitive(Shape::sphere(Vec3::Y * 3.0, 0.5), light), 1);

        assert_eq!(scene.light_count(), 1);
        assert_eq!(scene.pixel_count(), 16);
        assert!(scene.validate().is_ok());
    }

    #[test]
    fn test_missing_material_is_rejected() {
        let mut scene = Scene::new("broken", small_camera());
        scene.add_primitive(Shape::sphere(Vec3::ZERO, 1.0), MaterialId(3));
        assert_eq!(
            scene.validate(),
            Err(SceneError::MissingMaterial { primitive: 0, material: 3 })
        );
    }

    #[test]
    fn test_zero_resolution_is_rejected() {
        let scene = Scene::new("empty", small_camera().with_resolution(0, 10));
        assert!(matches!(
            scene.validate(),
            Err(SceneError::EmptyResolution { width: 0, height: 10 })
        ));
    }

    #[test]
    fn test_oversized_resolution_is_rejected() {
        let scene = Scene::new("huge", small_camera().with_resolution(65536, 65536));
        assert!(matches!(
            scene.validate(),
            Err(SceneError::ResolutionTooLarge { width: 65536, height: 65536 })
        ));
        let scene = Scene::new("wide", small_camera().with_resolution(65536, 65535));
        assert!(!matches!(scene.validate(), Err(SceneError::ResolutionTooLarge { .. })));
    }

    #[test]
    fn test_degenerate_camera_is_rejected() {
        let camera = small_camera().with_position(Vec3::ZERO, Vec3::ZERO, Vec3::Y);
        let scene = Scene::new("camera", camera);
        assert!(matches!(scene.validate(), Err(SceneError::InvalidCamera(_))));
    }

    #[test]
    fn test_world_bounds() {
        let mut scene = Scene::new("bounds", small_camera());
        let white = scene.add_material(Material::default());
        scene.add_primitive(Shape::sphere(Vec3::ZERO, 1.0), white);
        scene.add_primitive(Shape::sphere(Vec3::new(4.0, 0.0, 0.0), 1.0), white);

        let bounds = scene.world_bounds();
        assert_eq!(bounds.x.min, -1.0);
        assert_eq!(bounds.x.max, 5.0);
    }
}
