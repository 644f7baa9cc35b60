//! Atrous Core - scene description consumed by the path tracer.
//!
//! This crate provides:
//!
//! - **Camera**: resolution, pose and thin-lens settings
//! - **Materials**: Lambertian, mirror, dielectric and emissive surfaces
//! - **Geometry**: spheres, transformed cuboids and triangles
//! - **Scene**: the immutable bundle handed to the renderer
//! - **Presets**: ready-made scenes for demos and tests
//!
//! # Example
//!
//! ```
//! use atrous_core::{presets, Scene};
//!
//! let scene: Scene = presets::cornell_box(64, 64);
//! assert!(scene.validate().is_ok());
//! assert_eq!(scene.resolution(), (64, 64));
//! ```

pub mod camera;
pub mod material;
pub mod presets;
pub mod scene;
pub mod shape;

// Re-export commonly used types
pub use camera::{Camera, CameraFrame};
pub use material::{Color, Material, MaterialId};
pub use scene::{Primitive, Scene, SceneError};
pub use shape::{Cuboid, Shape, Transform};
