//! Material trait and the surface materials a scene can reference.

use crate::sampling::gen_f32;
use crate::{
    Bsdf, Color, ColorTexture, Conductor, Dielectric, FloatTexture, HitRecord, Lambertian,
    TrowbridgeReitz, Vec2,
};
use rand::RngCore;
use std::sync::Arc;

/// Trait for materials that describe how light interacts with surfaces.
pub trait Material: Send + Sync {
    /// Build the scattering function at a hit.
    ///
    /// The BSDF frame is taken from `rec.normal`, which faces the incoming
    /// ray. Materials that do not scatter return [`Bsdf::empty`].
    fn calc_bsdf(&self, rec: &HitRecord, rng: &mut dyn RngCore) -> Bsdf;

    /// Radiance emitted at the hit point. Most materials emit nothing.
    fn emission(&self, _rec: &HitRecord) -> Color {
        Color::ZERO
    }

    /// Whether [`Material::emission`] can be nonzero anywhere. Primitives
    /// with emissive materials are sampled directly as lights.
    fn is_emissive(&self) -> bool {
        false
    }
}

/// Lambertian (diffuse) material.
#[derive(Debug, Clone)]
pub struct DiffuseMaterial {
    albedo: ColorTexture,
}

impl DiffuseMaterial {
    pub fn new(albedo: impl Into<ColorTexture>) -> Self {
        Self {
            albedo: albedo.into(),
        }
    }

    pub fn albedo(&self) -> &ColorTexture {
        &self.albedo
    }
}

impl Material for DiffuseMaterial {
    fn calc_bsdf(&self, rec: &HitRecord, _rng: &mut dyn RngCore) -> Bsdf {
        Bsdf::new(Lambertian::new(self.albedo.evaluate(rec.uv)), rec.normal)
    }
}

/// Perceptual roughness per tangent axis, mapped to GGX alphas per hit.
#[derive(Debug, Clone)]
struct RoughnessPair {
    u: FloatTexture,
    v: FloatTexture,
}

impl RoughnessPair {
    fn from_alphas(alpha_x: f32, alpha_z: f32) -> Self {
        Self {
            u: FloatTexture::Constant(alpha_x * alpha_x),
            v: FloatTexture::Constant(alpha_z * alpha_z),
        }
    }

    fn distribution(&self, uv: Vec2) -> TrowbridgeReitz {
        TrowbridgeReitz::new(
            TrowbridgeReitz::roughness_to_alpha(self.u.evaluate(uv)),
            TrowbridgeReitz::roughness_to_alpha(self.v.evaluate(uv)),
        )
    }
}

/// Metal. Smooth alphas give a mirror, larger ones a GGX glossy lobe.
#[derive(Debug, Clone)]
pub struct ConductorMaterial {
    color: ColorTexture,
    roughness: RoughnessPair,
}

impl ConductorMaterial {
    /// Constant GGX alphas.
    pub fn new(color: impl Into<ColorTexture>, alpha_x: f32, alpha_z: f32) -> Self {
        Self {
            color: color.into(),
            roughness: RoughnessPair::from_alphas(alpha_x, alpha_z),
        }
    }

    /// Create from perceptual roughness in `[0, 1]` per tangent axis.
    pub fn from_roughness(
        color: impl Into<ColorTexture>,
        roughness_u: impl Into<FloatTexture>,
        roughness_v: impl Into<FloatTexture>,
    ) -> Self {
        Self {
            color: color.into(),
            roughness: RoughnessPair {
                u: roughness_u.into(),
                v: roughness_v.into(),
            },
        }
    }

    /// Microfacet distribution at a surface point.
    pub fn distribution(&self, uv: Vec2) -> TrowbridgeReitz {
        self.roughness.distribution(uv)
    }
}

impl Material for ConductorMaterial {
    fn calc_bsdf(&self, rec: &HitRecord, _rng: &mut dyn RngCore) -> Bsdf {
        let conductor = Conductor::new(self.distribution(rec.uv), self.color.evaluate(rec.uv));
        Bsdf::new(conductor, rec.normal)
    }
}

/// Glass-like material with index of refraction `eta` relative to the
/// surrounding medium.
#[derive(Debug, Clone)]
pub struct DielectricMaterial {
    eta: FloatTexture,
    roughness: RoughnessPair,
}

impl DielectricMaterial {
    /// Constant GGX alphas.
    pub fn new(eta: impl Into<FloatTexture>, alpha_x: f32, alpha_z: f32) -> Self {
        Self {
            eta: eta.into(),
            roughness: RoughnessPair::from_alphas(alpha_x, alpha_z),
        }
    }

    /// Perfectly smooth glass.
    pub fn smooth(eta: f32) -> Self {
        Self::new(eta, 0.0, 0.0)
    }

    pub fn from_roughness(
        eta: impl Into<FloatTexture>,
        roughness_u: impl Into<FloatTexture>,
        roughness_v: impl Into<FloatTexture>,
    ) -> Self {
        Self {
            eta: eta.into(),
            roughness: RoughnessPair {
                u: roughness_u.into(),
                v: roughness_v.into(),
            },
        }
    }
}

impl Material for DielectricMaterial {
    fn calc_bsdf(&self, rec: &HitRecord, _rng: &mut dyn RngCore) -> Bsdf {
        let eta = self.eta.evaluate(rec.uv);
        // Entering from outside vs leaving the medium
        let eta = if rec.front_face { 1.0 / eta } else { eta };
        Bsdf::new(Dielectric::new(eta, self.roughness.distribution(rec.uv)), rec.normal)
    }
}

/// Emissive material for light sources. Emits on both faces.
#[derive(Debug, Clone)]
pub struct DiffuseLight {
    emit: ColorTexture,
}

impl DiffuseLight {
    pub fn new(emit: impl Into<ColorTexture>) -> Self {
        Self { emit: emit.into() }
    }
}

impl Material for DiffuseLight {
    fn calc_bsdf(&self, _rec: &HitRecord, _rng: &mut dyn RngCore) -> Bsdf {
        Bsdf::empty()
    }

    fn emission(&self, rec: &HitRecord) -> Color {
        self.emit.evaluate(rec.uv)
    }

    fn is_emissive(&self) -> bool {
        !self.emit.is_black()
    }
}

/// Stochastic blend of two materials: each shading query picks `first`
/// with probability `factor` and `second` otherwise.
#[derive(Clone)]
pub struct MixMaterial {
    first: Arc<dyn Material>,
    second: Arc<dyn Material>,
    factor: f32,
}

impl MixMaterial {
    pub fn new(first: Arc<dyn Material>, second: Arc<dyn Material>, factor: f32) -> Self {
        Self {
            first,
            second,
            factor: factor.clamp(0.0, 1.0),
        }
    }

    pub fn factor(&self) -> f32 {
        self.factor
    }

    /// Resolve to one of the two materials.
    pub fn select(&self, rng: &mut dyn RngCore) -> &dyn Material {
        if gen_f32(rng) < self.factor {
            self.first.as_ref()
        } else {
            self.second.as_ref()
        }
    }
}

impl Material for MixMaterial {
    fn calc_bsdf(&self, rec: &HitRecord, rng: &mut dyn RngCore) -> Bsdf {
        self.select(rng).calc_bsdf(rec, rng)
    }

    fn emission(&self, rec: &HitRecord) -> Color {
        self.first.emission(rec) * self.factor + self.second.emission(rec) * (1.0 - self.factor)
    }

    fn is_emissive(&self) -> bool {
        (self.factor > 0.0 && self.first.is_emissive())
            || (self.factor < 1.0 && self.second.is_emissive())
    }
}
