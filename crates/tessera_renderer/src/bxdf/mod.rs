//! Scattering lobes in the local shading frame.
//!
//! The frame has the shading normal along `+Y`. `wi` is the direction the
//! incoming ray travels (towards the surface) and `wo` the scattered
//! direction (away from it), so an ordinary reflection has `wi.y < 0` and
//! `wo.y > 0`.

mod conductor;
mod dielectric;
mod lambertian;

pub use conductor::Conductor;
pub use dielectric::Dielectric;
pub use lambertian::Lambertian;

use crate::{Color, Vec3};
use rand::RngCore;
use std::ops::{BitAnd, BitOr, BitOrAssign};

/// Capability bits of a scattering lobe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BxdfFlags(u8);

impl BxdfFlags {
    pub const NONE: BxdfFlags = BxdfFlags(0);
    pub const REFLECTION: BxdfFlags = BxdfFlags(1 << 0);
    pub const TRANSMISSION: BxdfFlags = BxdfFlags(1 << 1);
    pub const DIFFUSE: BxdfFlags = BxdfFlags(1 << 2);
    pub const GLOSSY: BxdfFlags = BxdfFlags(1 << 3);
    pub const SPECULAR: BxdfFlags = BxdfFlags(1 << 4);
    pub const ALL: BxdfFlags = BxdfFlags(0b1_1111);

    /// True if any bit of `other` is set here.
    pub const fn matches(self, other: BxdfFlags) -> bool {
        self.0 & other.0 != 0
    }

    /// True if every bit of `other` is set here.
    pub const fn contains(self, other: BxdfFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn is_specular(self) -> bool {
        self.matches(BxdfFlags::SPECULAR)
    }

    pub const fn is_reflective(self) -> bool {
        self.matches(BxdfFlags::REFLECTION)
    }

    pub const fn is_transmissive(self) -> bool {
        self.matches(BxdfFlags::TRANSMISSION)
    }
}

impl BitOr for BxdfFlags {
    type Output = BxdfFlags;

    fn bitor(self, rhs: BxdfFlags) -> BxdfFlags {
        BxdfFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for BxdfFlags {
    fn bitor_assign(&mut self, rhs: BxdfFlags) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for BxdfFlags {
    type Output = BxdfFlags;

    fn bitand(self, rhs: BxdfFlags) -> BxdfFlags {
        BxdfFlags(self.0 & rhs.0)
    }
}

/// Outcome of importance sampling a lobe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BsdfSample {
    /// Value of the lobe for the sampled pair. For specular and
    /// proportional samples this is already the path throughput weight.
    pub f: Color,
    pub wo: Vec3,
    pub pdf: f32,
    /// Flags of the lobe that produced the sample.
    pub flags: BxdfFlags,
    /// The sample was drawn from a density only known up to a constant;
    /// `f` then carries the full weight and `pdf` is 1.
    pub pdf_is_proportional: bool,
}

impl BsdfSample {
    pub fn new(f: Color, wo: Vec3, pdf: f32, flags: BxdfFlags) -> Self {
        Self {
            f,
            wo,
            pdf,
            flags,
            pdf_is_proportional: false,
        }
    }

    pub fn is_specular(&self) -> bool {
        self.flags.is_specular()
    }

    pub fn is_transmission(&self) -> bool {
        self.flags.is_transmissive()
    }
}

/// A scattering lobe evaluated in the local shading frame.
pub trait Bxdf {
    fn flags(&self) -> BxdfFlags;

    /// Distribution value for the pair `(wi, wo)`.
    fn f(&self, wi: Vec3, wo: Vec3) -> Color;

    /// Draw `wo` roughly proportional to `f * |cos wo|`.
    fn sample_f(&self, wi: Vec3, rng: &mut dyn RngCore) -> Option<BsdfSample>;

    /// Density with which [`Bxdf::sample_f`] produces `wo`.
    fn pdf(&self, wi: Vec3, wo: Vec3) -> f32;

    /// Whether [`Bxdf::f`] and [`Bxdf::pdf`] describe the lobe, so that it
    /// can be evaluated for directions it did not sample.
    fn has_density(&self) -> bool {
        !self.flags().is_specular()
    }
}

/// The closed set of lobes a BSDF can hold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BxdfKind {
    Lambertian(Lambertian),
    Conductor(Conductor),
    Dielectric(Dielectric),
}

impl Bxdf for BxdfKind {
    fn flags(&self) -> BxdfFlags {
        match self {
            BxdfKind::Lambertian(b) => b.flags(),
            BxdfKind::Conductor(b) => b.flags(),
            BxdfKind::Dielectric(b) => b.flags(),
        }
    }

    fn f(&self, wi: Vec3, wo: Vec3) -> Color {
        match self {
            BxdfKind::Lambertian(b) => b.f(wi, wo),
            BxdfKind::Conductor(b) => b.f(wi, wo),
            BxdfKind::Dielectric(b) => b.f(wi, wo),
        }
    }

    fn sample_f(&self, wi: Vec3, rng: &mut dyn RngCore) -> Option<BsdfSample> {
        match self {
            BxdfKind::Lambertian(b) => b.sample_f(wi, rng),
            BxdfKind::Conductor(b) => b.sample_f(wi, rng),
            BxdfKind::Dielectric(b) => b.sample_f(wi, rng),
        }
    }

    fn pdf(&self, wi: Vec3, wo: Vec3) -> f32 {
        match self {
            BxdfKind::Lambertian(b) => b.pdf(wi, wo),
            BxdfKind::Conductor(b) => b.pdf(wi, wo),
            BxdfKind::Dielectric(b) => b.pdf(wi, wo),
        }
    }

    fn has_density(&self) -> bool {
        match self {
            BxdfKind::Lambertian(b) => b.has_density(),
            BxdfKind::Conductor(b) => b.has_density(),
            BxdfKind::Dielectric(b) => b.has_density(),
        }
    }
}

impl From<Lambertian> for BxdfKind {
    fn from(b: Lambertian) -> Self {
        BxdfKind::Lambertian(b)
    }
}

impl From<Conductor> for BxdfKind {
    fn from(b: Conductor) -> Self {
        BxdfKind::Conductor(b)
    }
}

impl From<Dielectric> for BxdfKind {
    fn from(b: Dielectric) -> Self {
        BxdfKind::Dielectric(b)
    }
}

// =============================================================================
// Local frame helpers
// =============================================================================

#[inline]
pub(crate) fn cos2_theta(w: Vec3) -> f32 {
    w.y * w.y
}

#[inline]
pub(crate) fn abs_cos_theta(w: Vec3) -> f32 {
    w.y.abs()
}

#[inline]
pub(crate) fn sin2_theta(w: Vec3) -> f32 {
    (1.0 - cos2_theta(w)).max(0.0)
}

#[inline]
pub(crate) fn tan2_theta(w: Vec3) -> f32 {
    sin2_theta(w) / cos2_theta(w)
}

#[inline]
pub(crate) fn cos_phi(w: Vec3) -> f32 {
    let sin_theta = sin2_theta(w).sqrt();
    if sin_theta == 0.0 {
        1.0
    } else {
        (w.z / sin_theta).clamp(-1.0, 1.0)
    }
}

#[inline]
pub(crate) fn sin_phi(w: Vec3) -> f32 {
    let sin_theta = sin2_theta(w).sqrt();
    if sin_theta == 0.0 {
        0.0
    } else {
        (w.x / sin_theta).clamp(-1.0, 1.0)
    }
}

/// Both directions on the same side of the `y = 0` plane.
#[inline]
pub(crate) fn same_hemisphere(a: Vec3, b: Vec3) -> bool {
    a.y * b.y > 0.0
}

/// Reflect a vector about a normal.
#[inline]
pub(crate) fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract a unit vector through a surface with normal `n` facing against
/// it. `etai_over_etat` is the incident over transmitted index.
#[inline]
pub(crate) fn refract(uv: Vec3, n: Vec3, etai_over_etat: f32) -> Vec3 {
    let cos_theta = (-uv).dot(n).min(1.0);
    let r_out_perp = etai_over_etat * (uv + cos_theta * n);
    let r_out_parallel = -(1.0 - r_out_perp.length_squared()).abs().sqrt() * n;
    r_out_perp + r_out_parallel
}

/// Schlick's approximation for reflectance
#[inline]
pub(crate) fn schlick_reflectance(cosine: f32, eta: f32) -> f32 {
    let r0 = ((1.0 - eta) / (1.0 + eta)).powi(2);
    r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
}
