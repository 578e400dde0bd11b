//! Serde model of the scene file.
//!
//! Only the outer structure is typed here. Texture, material and object
//! entries keep their kind-specific fields as raw JSON; the loader decodes
//! them once the kind is known.

use serde::Deserialize;
use serde_json::{Map, Value};
use tessera_math::Vec3;
use tessera_renderer::{Background, Camera, Color};

use crate::{SceneError, SceneResult, TextureTable};

/// Top-level scene document.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneDescription {
    pub camera: CameraDescription,
    #[serde(default)]
    pub background: BackgroundDescription,
    #[serde(default)]
    pub textures: Vec<TextureEntry>,
    #[serde(default)]
    pub materials: Vec<MaterialEntry>,
    #[serde(default)]
    pub objects: Vec<ObjectEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CameraDescription {
    pub position: [f32; 3],
    pub look_at: [f32; 3],
    pub image_height: u32,
    pub aspect_ratio: f32,
    pub vfov: f32,
    #[serde(default)]
    pub up: Option<[f32; 3]>,
    /// Cone angle of the thin lens in degrees; 0 is a pinhole.
    #[serde(default)]
    pub defocus_angle: f32,
    #[serde(default)]
    pub focus_dist: Option<f32>,
}

impl CameraDescription {
    pub fn build(&self) -> SceneResult<Camera> {
        if self.image_height == 0 {
            return Err(SceneError::invalid("camera", "image_height must be positive"));
        }
        if !(self.aspect_ratio.is_finite() && self.aspect_ratio > 0.0) {
            return Err(SceneError::invalid("camera", "aspect_ratio must be positive"));
        }
        if !(self.vfov > 0.0 && self.vfov < 180.0) {
            return Err(SceneError::invalid("camera", "vfov must lie in (0, 180) degrees"));
        }
        let position = Vec3::from_array(self.position);
        let look_at = Vec3::from_array(self.look_at);
        if position == look_at {
            return Err(SceneError::invalid("camera", "position and look_at coincide"));
        }

        let mut camera = Camera::new(position, look_at, self.image_height, self.aspect_ratio, self.vfov);
        if let Some(up) = self.up {
            camera = camera.with_up(Vec3::from_array(up));
        }
        if self.defocus_angle > 0.0 || self.focus_dist.is_some() {
            camera = camera.with_defocus(self.defocus_angle, self.focus_dist);
        }
        Ok(camera)
    }
}

/// `"sky"`, an RGB triple, or `{"environment": <image texture>}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum BackgroundDescription {
    Named(String),
    Solid([f32; 3]),
    Environment { environment: TextureRef },
}

impl Default for BackgroundDescription {
    fn default() -> Self {
        BackgroundDescription::Named("sky".to_string())
    }
}

impl BackgroundDescription {
    pub fn build(&self, textures: &TextureTable) -> SceneResult<Background> {
        match self {
            BackgroundDescription::Named(name) if name == "sky" => Ok(Background::Sky),
            BackgroundDescription::Named(name) => Err(SceneError::invalid(
                "background",
                format!("unknown background '{name}', expected \"sky\", [r, g, b] or {{\"environment\": ...}}"),
            )),
            BackgroundDescription::Solid(rgb) => Ok(Background::Solid(Color::from_array(*rgb))),
            BackgroundDescription::Environment { environment } => {
                Ok(Background::Environment(textures.image(environment)?))
            }
        }
    }
}

/// Reference to a texture by declared name or `{"texture": index}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TextureRef {
    Name(String),
    Index { texture: usize },
}

impl std::fmt::Display for TextureRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TextureRef::Index { texture } => write!(f, "#{texture}"),
            TextureRef::Name(name) => write!(f, "'{name}'"),
        }
    }
}

/// An RGB parameter: a literal triple or a texture.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ColorInput {
    Constant([f32; 3]),
    Texture(TextureRef),
}

/// A scalar parameter: a literal number or a texture.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FloatInput {
    Constant(f32),
    Texture(TextureRef),
}

/// Reference to a material by declared name or by position.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum MaterialRef {
    Index(usize),
    Name(String),
}

impl std::fmt::Display for MaterialRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MaterialRef::Index(index) => write!(f, "#{index}"),
            MaterialRef::Name(name) => write!(f, "'{name}'"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextureEntry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Kind-specific fields.
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MaterialEntry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Kind-specific fields.
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub material: MaterialRef,
    /// Kind-specific fields.
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

/// Roughness along both tangent axes, or `[u, v]`. Each entry may be a
/// texture.
// Arrays first: a one-element array would otherwise read as `{"texture": n}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Roughness {
    Axes([FloatInput; 2]),
    Single([FloatInput; 1]),
    Uniform(FloatInput),
}

impl Default for Roughness {
    fn default() -> Self {
        Roughness::Uniform(FloatInput::Constant(0.0))
    }
}

impl Roughness {
    /// `(u, v)` inputs.
    pub fn axes(&self) -> (&FloatInput, &FloatInput) {
        match self {
            Roughness::Uniform(r) | Roughness::Single([r]) => (r, r),
            Roughness::Axes([u, v]) => (u, v),
        }
    }
}
