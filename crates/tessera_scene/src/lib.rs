//! Tessera scene files.
//!
//! Scenes are JSON documents holding a camera, a background, a texture
//! list, a material list and an object list. [`SceneLoader`] resolves material and object
//! kinds through registries and produces a [`LoadedScene`] ready to hand to
//! the renderer.
//!
//! ```ignore
//! use tessera_scene::SceneLoader;
//!
//! let loaded = SceneLoader::new().load_file("demos/spheres.json")?;
//! let image = tessera_renderer::render(&loaded.scene, &loaded.camera, &Default::default())?;
//! ```

pub mod description;
mod error;
mod loader;

pub use description::{
    BackgroundDescription, CameraDescription, ColorInput, FloatInput, MaterialEntry, MaterialRef,
    ObjectEntry, Roughness, SceneDescription, TextureEntry, TextureRef,
};
pub use error::{SceneError, SceneResult};
pub use loader::{
    parse_params, LoadedScene, MaterialBuilder, MaterialTable, SceneLoader, ShapeBuilder,
    TextureTable,
};
