//! Trowbridge-Reitz (GGX) microfacet distribution.
//!
//! Anisotropic: `alpha_x` controls roughness along the local `x` axis and
//! `alpha_z` along `z`, with the macro normal on `+Y`. Visible normals are
//! sampled by stretching the view direction into the configuration of a
//! unit-roughness distribution, sampling the projected hemisphere there and
//! un-stretching the result.

use crate::bxdf::{abs_cos_theta, cos2_theta, cos_phi, sin_phi, tan2_theta};
use crate::sampling::sample_uniform_disk_polar;
use crate::{Vec2, Vec3};
use std::f32::consts::PI;

/// Below this on both axes the surface is treated as a perfect mirror.
const SMOOTH_ALPHA: f32 = 1e-3;
/// Rough distributions never go below this alpha.
const MIN_ALPHA: f32 = 1e-4;
/// Floor for the un-stretched normal's `y`; keeps sampled normals inside the
/// support of `d`.
const MIN_SAMPLED_Y: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrowbridgeReitz {
    alpha_x: f32,
    alpha_z: f32,
}

impl TrowbridgeReitz {
    pub fn new(alpha_x: f32, alpha_z: f32) -> Self {
        let mut dist = Self { alpha_x, alpha_z };
        if !dist.effectively_smooth() {
            dist.alpha_x = dist.alpha_x.max(MIN_ALPHA);
            dist.alpha_z = dist.alpha_z.max(MIN_ALPHA);
        }
        dist
    }

    /// Map a user-facing roughness in `[0, 1]` to an alpha.
    pub fn roughness_to_alpha(roughness: f32) -> f32 {
        roughness.max(0.0).sqrt()
    }

    pub fn alpha_x(&self) -> f32 {
        self.alpha_x
    }

    pub fn alpha_z(&self) -> f32 {
        self.alpha_z
    }

    pub fn effectively_smooth(&self) -> bool {
        self.alpha_x < SMOOTH_ALPHA && self.alpha_z < SMOOTH_ALPHA
    }

    /// Microfacet normal distribution `D(wm)`.
    pub fn d(&self, wm: Vec3) -> f32 {
        let tan2 = tan2_theta(wm);
        if tan2.is_infinite() || tan2.is_nan() {
            return 0.0;
        }
        let cos4 = cos2_theta(wm) * cos2_theta(wm);
        if cos4 < 1e-16 {
            return 0.0;
        }
        let e = tan2 * ((cos_phi(wm) / self.alpha_z).powi(2) + (sin_phi(wm) / self.alpha_x).powi(2));
        1.0 / (PI * self.alpha_x * self.alpha_z * cos4 * (1.0 + e).powi(2))
    }

    /// Smith's auxiliary function for the masking of direction `w`.
    pub fn lambda(&self, w: Vec3) -> f32 {
        let tan2 = tan2_theta(w);
        if tan2.is_infinite() || tan2.is_nan() {
            return 0.0;
        }
        let alpha2 = (cos_phi(w) * self.alpha_z).powi(2) + (sin_phi(w) * self.alpha_x).powi(2);
        ((1.0 + alpha2 * tan2).sqrt() - 1.0) / 2.0
    }

    /// Fraction of microfacets facing `w` that are visible from it.
    pub fn g1(&self, w: Vec3) -> f32 {
        1.0 / (1.0 + self.lambda(w))
    }

    /// Height-correlated masking-shadowing for an incoming travel direction
    /// `wi` and an outgoing `wo`.
    pub fn g(&self, wi: Vec3, wo: Vec3) -> f32 {
        1.0 / (1.0 + self.lambda(-wi) + self.lambda(wo))
    }

    /// Distribution of normals visible from `w`.
    pub fn d_visible(&self, w: Vec3, wm: Vec3) -> f32 {
        let cos = abs_cos_theta(w);
        if cos == 0.0 {
            return 0.0;
        }
        self.g1(w) / cos * self.d(wm) * w.dot(wm).abs()
    }

    /// Density of [`TrowbridgeReitz::sample_wm`] producing `wm` from `w`.
    pub fn pdf(&self, w: Vec3, wm: Vec3) -> f32 {
        self.d_visible(w, wm)
    }

    /// Sample a microfacet normal visible from `w` (which points away from
    /// the surface) given two uniforms `u`.
    pub fn sample_wm(&self, w: Vec3, u: Vec2) -> Vec3 {
        // Hemispherical to ellipsoid transform
        let mut wh = Vec3::new(self.alpha_x * w.x, w.y, self.alpha_z * w.z).normalize();
        if wh.y < 0.0 {
            wh = -wh;
        }

        // Orthonormal basis around the stretched direction
        let t1 = if wh.y < 0.99999 {
            Vec3::Y.cross(wh).normalize()
        } else {
            Vec3::Z
        };
        let t2 = wh.cross(t1);

        // Disk sample warped towards the visible part of the projection
        let mut p = sample_uniform_disk_polar(u);
        let h = (1.0 - p.x * p.x).max(0.0).sqrt();
        let s = (1.0 + wh.y) / 2.0;
        p.y = h + s * (p.y - h);

        // Project back to hemisphere
        let py = (1.0 - p.length_squared()).max(0.0).sqrt();
        let nh = p.x * t1 + p.y * t2 + py * wh;

        // Ellipsoid to hemisphere
        Vec3::new(self.alpha_x * nh.x, nh.y.max(MIN_SAMPLED_Y), self.alpha_z * nh.z).normalize()
    }
}
