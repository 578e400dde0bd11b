//! BSDF: a scattering lobe placed in the world by a shading frame.

use crate::bxdf::{BsdfSample, Bxdf, BxdfFlags, BxdfKind};
use crate::{Color, Quat, Vec3};
use rand::RngCore;

/// Zero or one BxDF plus the rotation taking the world shading normal onto
/// the local `+Y` axis. An empty BSDF absorbs everything.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bsdf {
    bxdf: Option<BxdfKind>,
    world_to_local: Quat,
}

impl Bsdf {
    pub fn new(bxdf: impl Into<BxdfKind>, normal: Vec3) -> Self {
        let normal = normal.try_normalize().unwrap_or(Vec3::Y);
        Self {
            bxdf: Some(bxdf.into()),
            world_to_local: Quat::from_rotation_arc(normal, Vec3::Y),
        }
    }

    /// A BSDF that never scatters (light sources).
    pub fn empty() -> Self {
        Self {
            bxdf: None,
            world_to_local: Quat::IDENTITY,
        }
    }

    pub fn bxdf(&self) -> Option<&BxdfKind> {
        self.bxdf.as_ref()
    }

    pub fn flags(&self) -> BxdfFlags {
        self.bxdf.map_or(BxdfFlags::NONE, |b| b.flags())
    }

    /// True if the lobe can be evaluated for arbitrary direction pairs,
    /// which light sampling needs.
    pub fn has_density(&self) -> bool {
        self.bxdf.is_some_and(|b| b.has_density())
    }

    #[inline]
    pub fn to_local(&self, v: Vec3) -> Vec3 {
        self.world_to_local * v
    }

    #[inline]
    pub fn to_world(&self, v: Vec3) -> Vec3 {
        self.world_to_local.inverse() * v
    }

    /// Distribution value for world directions, restricted to lobes
    /// matching `flags`.
    pub fn f(&self, wi: Vec3, wo: Vec3, flags: BxdfFlags) -> Color {
        match &self.bxdf {
            Some(bxdf) if bxdf.flags().matches(flags) => bxdf.f(self.to_local(wi), self.to_local(wo)),
            _ => Color::ZERO,
        }
    }

    /// Sample a scattered world direction for the incoming world direction
    /// `wi`. Samples carrying no energy are dropped.
    pub fn sample_f(&self, wi: Vec3, rng: &mut dyn RngCore) -> Option<BsdfSample> {
        let bxdf = self.bxdf.as_ref()?;
        let sample = bxdf.sample_f(self.to_local(wi), rng)?;
        if sample.pdf <= 0.0 || sample.f == Color::ZERO {
            return None;
        }
        Some(BsdfSample {
            wo: self.to_world(sample.wo),
            ..sample
        })
    }

    pub fn pdf(&self, wi: Vec3, wo: Vec3, flags: BxdfFlags) -> f32 {
        match &self.bxdf {
            Some(bxdf) if bxdf.flags().matches(flags) => bxdf.pdf(self.to_local(wi), self.to_local(wo)),
            _ => 0.0,
        }
    }
}
