//! Scene loading through kind registries.
//!
//! Each material and object entry names its kind with a `"type"` field. The
//! loader owns two tables mapping those names to builder functions; the
//! defaults are registered in [`SceneLoader::new`] and callers may add their
//! own before loading. Textures are declared ahead of materials and come in
//! a fixed set of kinds.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use tessera_math::Vec3;
use tessera_renderer::{
    Camera, Color, ColorTexture, ConductorMaterial, DielectricMaterial, DiffuseLight,
    DiffuseMaterial, FloatTexture, ImageTexture, Material, MaterialId, MixMaterial, Primitive,
    Scene, Sphere, Triangle,
};

use crate::description::{
    ColorInput, FloatInput, MaterialRef, Roughness, SceneDescription, TextureEntry, TextureRef,
};
use crate::{SceneError, SceneResult};

/// Builds a material from its kind-specific fields. Earlier materials and
/// all textures are reachable through the table.
pub type MaterialBuilder = fn(&Map<String, Value>, &MaterialTable) -> SceneResult<Arc<dyn Material>>;

/// Builds the primitives of one object entry, all bound to `material`.
pub type ShapeBuilder = fn(&Map<String, Value>, MaterialId) -> SceneResult<Vec<Primitive>>;

#[derive(Debug, Clone)]
enum TextureSlot {
    Color(Color),
    Float(f32),
    /// Usable as a color or, through its red channel, as a scalar.
    Image(Arc<ImageTexture>),
}

/// Declared textures, addressable by index or name.
#[derive(Debug, Default)]
pub struct TextureTable {
    slots: Vec<TextureSlot>,
    names: HashMap<String, usize>,
}

impl TextureTable {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn slot(&self, reference: &TextureRef) -> SceneResult<&TextureSlot> {
        let index = match reference {
            TextureRef::Index { texture } => *texture,
            TextureRef::Name(name) => *self
                .names
                .get(name)
                .ok_or_else(|| SceneError::UnknownTexture(name.clone()))?,
        };
        self.slots.get(index).ok_or(SceneError::TextureIndexOutOfRange {
            index,
            count: self.slots.len(),
        })
    }

    pub fn color(&self, input: &ColorInput) -> SceneResult<ColorTexture> {
        let reference = match input {
            ColorInput::Constant(rgb) => return Ok(ColorTexture::Solid(Color::from_array(*rgb))),
            ColorInput::Texture(reference) => reference,
        };
        match self.slot(reference)? {
            TextureSlot::Color(color) => Ok(ColorTexture::Solid(*color)),
            TextureSlot::Image(image) => Ok(ColorTexture::Image(image.clone())),
            TextureSlot::Float(_) => Err(mismatch(reference, "a color")),
        }
    }

    pub fn float(&self, input: &FloatInput) -> SceneResult<FloatTexture> {
        let reference = match input {
            FloatInput::Constant(value) => return Ok(FloatTexture::Constant(*value)),
            FloatInput::Texture(reference) => reference,
        };
        match self.slot(reference)? {
            TextureSlot::Float(value) => Ok(FloatTexture::Constant(*value)),
            TextureSlot::Image(image) => Ok(FloatTexture::Image(image.clone())),
            TextureSlot::Color(_) => Err(mismatch(reference, "a scalar")),
        }
    }

    pub fn image(&self, reference: &TextureRef) -> SceneResult<Arc<ImageTexture>> {
        match self.slot(reference)? {
            TextureSlot::Image(image) => Ok(image.clone()),
            _ => Err(mismatch(reference, "an image")),
        }
    }

    /// `(u, v)` roughness textures. Constant values must lie in `[0, 1]`.
    pub fn roughness(&self, roughness: &Roughness, context: &str) -> SceneResult<(FloatTexture, FloatTexture)> {
        let (u, v) = roughness.axes();
        let (u, v) = (self.float(u)?, self.float(v)?);
        for r in [&u, &v] {
            if let FloatTexture::Constant(r) = r {
                if !(0.0..=1.0).contains(r) {
                    return Err(SceneError::invalid(context, format!("roughness {r} outside [0, 1]")));
                }
            }
        }
        Ok((u, v))
    }

    fn push(&mut self, name: Option<&str>, slot: TextureSlot) -> SceneResult<usize> {
        let index = self.slots.len();
        if let Some(name) = name {
            if self.names.contains_key(name) {
                return Err(SceneError::DuplicateTextureName(name.to_string()));
            }
            self.names.insert(name.to_string(), index);
        }
        self.slots.push(slot);
        Ok(index)
    }
}

fn mismatch(reference: &TextureRef, expected: &'static str) -> SceneError {
    SceneError::TextureKindMismatch {
        texture: reference.to_string(),
        expected,
    }
}

/// Materials declared so far, addressable by index or name, plus the
/// scene's textures.
#[derive(Default)]
pub struct MaterialTable {
    materials: Vec<Arc<dyn Material>>,
    names: HashMap<String, MaterialId>,
    textures: TextureTable,
}

impl MaterialTable {
    fn with_textures(textures: TextureTable) -> Self {
        Self {
            textures,
            ..Self::default()
        }
    }

    pub fn textures(&self) -> &TextureTable {
        &self.textures
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn resolve(&self, reference: &MaterialRef) -> SceneResult<MaterialId> {
        match reference {
            MaterialRef::Index(index) if *index < self.materials.len() => Ok(*index),
            MaterialRef::Index(index) => Err(SceneError::MaterialIndexOutOfRange {
                index: *index,
                count: self.materials.len(),
            }),
            MaterialRef::Name(name) => self
                .names
                .get(name)
                .copied()
                .ok_or_else(|| SceneError::UnknownMaterial(name.clone())),
        }
    }

    pub fn get(&self, reference: &MaterialRef) -> SceneResult<Arc<dyn Material>> {
        let id = self.resolve(reference)?;
        Ok(self.materials[id].clone())
    }

    fn push(&mut self, name: Option<&str>, material: Arc<dyn Material>) -> SceneResult<MaterialId> {
        let id = self.materials.len();
        if let Some(name) = name {
            if self.names.contains_key(name) {
                return Err(SceneError::DuplicateMaterialName(name.to_string()));
            }
            self.names.insert(name.to_string(), id);
        }
        self.materials.push(material);
        Ok(id)
    }

    fn into_materials(self) -> Vec<Arc<dyn Material>> {
        self.materials
    }
}

/// A loaded scene ready to render.
pub struct LoadedScene {
    pub camera: Camera,
    pub scene: Scene,
}

/// Turns scene descriptions into renderable scenes.
pub struct SceneLoader {
    materials: HashMap<String, MaterialBuilder>,
    shapes: HashMap<String, ShapeBuilder>,
}

impl Default for SceneLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneLoader {
    /// Loader with the built-in material and object kinds registered.
    pub fn new() -> Self {
        let mut loader = Self::empty();
        loader.register_material("diffuse", build_diffuse);
        loader.register_material("conductor", build_conductor);
        loader.register_material("dielectric", build_dielectric);
        loader.register_material("light", build_light);
        loader.register_material("mix", build_mix);

        loader.register_shape("sphere", build_sphere);
        loader.register_shape("plane", build_plane);
        loader.register_shape("quad", build_quad);
        loader.register_shape("triangle", build_triangle);
        loader.register_shape("cube", build_cube);
        loader
    }

    /// Loader that knows no kinds at all.
    pub fn empty() -> Self {
        Self {
            materials: HashMap::new(),
            shapes: HashMap::new(),
        }
    }

    /// Register a material kind. Returns false if the kind was already
    /// registered; the existing builder is kept.
    pub fn register_material(&mut self, kind: &str, builder: MaterialBuilder) -> bool {
        if self.materials.contains_key(kind) {
            return false;
        }
        self.materials.insert(kind.to_string(), builder);
        true
    }

    /// Register an object kind. Returns false if the kind was already
    /// registered; the existing builder is kept.
    pub fn register_shape(&mut self, kind: &str, builder: ShapeBuilder) -> bool {
        if self.shapes.contains_key(kind) {
            return false;
        }
        self.shapes.insert(kind.to_string(), builder);
        true
    }

    pub fn is_material_registered(&self, kind: &str) -> bool {
        self.materials.contains_key(kind)
    }

    pub fn is_shape_registered(&self, kind: &str) -> bool {
        self.shapes.contains_key(kind)
    }

    /// Read and load a scene file. Texture paths are relative to the file.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> SceneResult<LoadedScene> {
        let path = path.as_ref();
        log::info!("Loading scene from '{}'", path.display());
        let text = std::fs::read_to_string(path)?;
        let description: SceneDescription = serde_json::from_str(&text)?;
        self.load_relative_to(&description, path.parent().unwrap_or(Path::new("")))
    }

    /// Load from a JSON string. Texture paths are relative to the working
    /// directory.
    pub fn load_str(&self, json: &str) -> SceneResult<LoadedScene> {
        let description: SceneDescription = serde_json::from_str(json)?;
        self.load(&description)
    }

    pub fn load(&self, description: &SceneDescription) -> SceneResult<LoadedScene> {
        self.load_relative_to(description, Path::new(""))
    }

    /// Load a description whose relative texture paths start at `base_dir`.
    pub fn load_relative_to(&self, description: &SceneDescription, base_dir: &Path) -> SceneResult<LoadedScene> {
        let camera = description.camera.build()?;

        let mut textures = TextureTable::default();
        for (index, entry) in description.textures.iter().enumerate() {
            let slot = build_texture(entry, index, base_dir)?;
            textures.push(entry.name.as_deref(), slot)?;
        }
        let background = description.background.build(&textures)?;

        let mut table = MaterialTable::with_textures(textures);
        for (index, entry) in description.materials.iter().enumerate() {
            let builder = self.materials.get(&entry.kind).ok_or_else(|| {
                SceneError::UnknownMaterialKind {
                    kind: entry.kind.clone(),
                    index,
                }
            })?;
            let material = builder(&entry.params, &table)?;
            table.push(entry.name.as_deref(), material)?;
        }

        let mut primitives = Vec::with_capacity(description.objects.len());
        for (index, entry) in description.objects.iter().enumerate() {
            let builder = self
                .shapes
                .get(&entry.kind)
                .ok_or_else(|| SceneError::UnknownShapeKind {
                    kind: entry.kind.clone(),
                    index,
                })?;
            let material = table.resolve(&entry.material)?;
            primitives.extend(builder(&entry.params, material)?);
        }

        log::info!(
            "Loaded {} textures, {} materials and {} primitives from {} objects",
            table.textures().len(),
            table.len(),
            primitives.len(),
            description.objects.len()
        );

        Ok(LoadedScene {
            camera,
            scene: Scene::new(primitives, table.into_materials(), background),
        })
    }
}

/// Decode the kind-specific fields of an entry.
pub fn parse_params<T: DeserializeOwned>(kind: &str, params: &Map<String, Value>) -> SceneResult<T> {
    serde_json::from_value(Value::Object(params.clone())).map_err(|e| SceneError::invalid(kind, e))
}

fn vec3(v: [f32; 3]) -> Vec3 {
    Vec3::from_array(v)
}

// =============================================================================
// Textures
// =============================================================================

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ColorTextureParams {
    value: [f32; 3],
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct FloatTextureParams {
    value: f32,
}

fn default_scale() -> f32 {
    1.0
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ImageTextureParams {
    path: PathBuf,
    #[serde(default = "default_scale")]
    scale: f32,
}

fn build_texture(entry: &TextureEntry, index: usize, base_dir: &Path) -> SceneResult<TextureSlot> {
    match entry.kind.as_str() {
        "color" => {
            let p: ColorTextureParams = parse_params("color texture", &entry.params)?;
            Ok(TextureSlot::Color(Color::from_array(p.value)))
        }
        "float" => {
            let p: FloatTextureParams = parse_params("float texture", &entry.params)?;
            Ok(TextureSlot::Float(p.value))
        }
        "image" => {
            let p: ImageTextureParams = parse_params("image texture", &entry.params)?;
            if !(p.scale.is_finite() && p.scale >= 0.0) {
                return Err(SceneError::invalid("image texture", format!("scale {} must be non-negative", p.scale)));
            }
            let image = ImageTexture::open(&base_dir.join(&p.path))?.with_scale(p.scale);
            Ok(TextureSlot::Image(Arc::new(image)))
        }
        _ => Err(SceneError::UnknownTextureKind {
            kind: entry.kind.clone(),
            index,
        }),
    }
}

// =============================================================================
// Material builders
// =============================================================================

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DiffuseParams {
    albedo: ColorInput,
}

fn build_diffuse(params: &Map<String, Value>, table: &MaterialTable) -> SceneResult<Arc<dyn Material>> {
    let p: DiffuseParams = parse_params("diffuse material", params)?;
    Ok(Arc::new(DiffuseMaterial::new(table.textures().color(&p.albedo)?)))
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ConductorParams {
    albedo: ColorInput,
    #[serde(default)]
    roughness: Roughness,
}

fn build_conductor(params: &Map<String, Value>, table: &MaterialTable) -> SceneResult<Arc<dyn Material>> {
    let p: ConductorParams = parse_params("conductor material", params)?;
    let textures = table.textures();
    let (u, v) = textures.roughness(&p.roughness, "conductor material")?;
    Ok(Arc::new(ConductorMaterial::from_roughness(textures.color(&p.albedo)?, u, v)))
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DielectricParams {
    eta: FloatInput,
    #[serde(default)]
    roughness: Roughness,
}

fn build_dielectric(params: &Map<String, Value>, table: &MaterialTable) -> SceneResult<Arc<dyn Material>> {
    let p: DielectricParams = parse_params("dielectric material", params)?;
    let textures = table.textures();
    let eta = textures.float(&p.eta)?;
    if let FloatTexture::Constant(eta) = eta {
        if !(eta.is_finite() && eta > 0.0) {
            return Err(SceneError::invalid("dielectric material", format!("eta {eta} must be positive")));
        }
    }
    let (u, v) = textures.roughness(&p.roughness, "dielectric material")?;
    Ok(Arc::new(DielectricMaterial::from_roughness(eta, u, v)))
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct LightParams {
    emit: ColorInput,
}

fn build_light(params: &Map<String, Value>, table: &MaterialTable) -> SceneResult<Arc<dyn Material>> {
    let p: LightParams = parse_params("light material", params)?;
    Ok(Arc::new(DiffuseLight::new(table.textures().color(&p.emit)?)))
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct MixParams {
    first: MaterialRef,
    second: MaterialRef,
    factor: f32,
}

fn build_mix(params: &Map<String, Value>, table: &MaterialTable) -> SceneResult<Arc<dyn Material>> {
    let p: MixParams = parse_params("mix material", params)?;
    if !(0.0..=1.0).contains(&p.factor) {
        return Err(SceneError::invalid("mix material", format!("factor {} outside [0, 1]", p.factor)));
    }
    Ok(Arc::new(MixMaterial::new(table.get(&p.first)?, table.get(&p.second)?, p.factor)))
}

// =============================================================================
// Shape builders
// =============================================================================

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SphereParams {
    center: [f32; 3],
    radius: f32,
}

fn build_sphere(params: &Map<String, Value>, material: MaterialId) -> SceneResult<Vec<Primitive>> {
    let p: SphereParams = parse_params("sphere", params)?;
    if !(p.radius.is_finite() && p.radius > 0.0) {
        return Err(SceneError::invalid("sphere", format!("radius {} must be positive", p.radius)));
    }
    Ok(vec![Primitive::new(Sphere::new(vec3(p.center), p.radius), material)])
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PointsParams {
    points: [[f32; 3]; 3],
}

impl PointsParams {
    fn parse(kind: &str, params: &Map<String, Value>) -> SceneResult<[Vec3; 3]> {
        let p: PointsParams = parse_params(kind, params)?;
        let [p0, p1, p2] = p.points.map(vec3);
        if (p1 - p0).cross(p2 - p0).length_squared() == 0.0 {
            return Err(SceneError::invalid(kind, "points are collinear"));
        }
        Ok([p0, p1, p2])
    }
}

fn build_plane(params: &Map<String, Value>, material: MaterialId) -> SceneResult<Vec<Primitive>> {
    let [p0, p1, p2] = PointsParams::parse("plane", params)?;
    Ok(vec![Primitive::plane(p0, p1, p2, material)])
}

fn build_quad(params: &Map<String, Value>, material: MaterialId) -> SceneResult<Vec<Primitive>> {
    let [p0, p1, p2] = PointsParams::parse("quad", params)?;
    Ok(vec![Primitive::parallelogram(p0, p1, p2, material)])
}

fn build_triangle(params: &Map<String, Value>, material: MaterialId) -> SceneResult<Vec<Primitive>> {
    let [p0, p1, p2] = PointsParams::parse("triangle", params)?;
    Ok(vec![Primitive::new(Triangle::new(p0, p1, p2), material)])
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CubeParams {
    origin: [f32; 3],
    edges: [[f32; 3]; 3],
}

/// Parallelepiped spanned by three edge vectors from `origin`, as six
/// parallelogram faces.
fn build_cube(params: &Map<String, Value>, material: MaterialId) -> SceneResult<Vec<Primitive>> {
    let p: CubeParams = parse_params("cube", params)?;
    let o = vec3(p.origin);
    let [e1, e2, e3] = p.edges.map(vec3);
    if e1.cross(e2).dot(e3) == 0.0 {
        return Err(SceneError::invalid("cube", "edges do not span a volume"));
    }

    // Three faces meet at the origin, three at the opposite corner
    let q = o + e1 + e2 + e3;
    Ok(vec![
        Primitive::parallelogram(o, o + e1, o + e2, material),
        Primitive::parallelogram(o, o + e1, o + e3, material),
        Primitive::parallelogram(o, o + e2, o + e3, material),
        Primitive::parallelogram(q, q - e1, q - e2, material),
        Primitive::parallelogram(q, q - e1, q - e3, material),
        Primitive::parallelogram(q, q - e2, q - e3, material),
    ])
}
