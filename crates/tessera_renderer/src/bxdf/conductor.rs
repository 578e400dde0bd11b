use super::{abs_cos_theta, reflect, same_hemisphere, BsdfSample, Bxdf, BxdfFlags};
use crate::sampling::gen_vec2;
use crate::{Color, TrowbridgeReitz, Vec3};
use rand::RngCore;

/// Metal: a perfect mirror when the distribution is effectively smooth,
/// Torrance-Sparrow microfacet reflection otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conductor {
    distrib: TrowbridgeReitz,
    color: Color,
}

impl Conductor {
    pub fn new(distrib: TrowbridgeReitz, color: Color) -> Self {
        Self { distrib, color }
    }

    pub fn distribution(&self) -> &TrowbridgeReitz {
        &self.distrib
    }

    /// Half vector of a reflection pair, flipped onto the `+Y` side.
    fn half_vector(wi: Vec3, wo: Vec3) -> Option<Vec3> {
        let wm = wo - wi;
        if wm.length_squared() < 1e-12 {
            return None;
        }
        let wm = wm.normalize();
        Some(if wm.y < 0.0 { -wm } else { wm })
    }

    fn torrance_sparrow(&self, wi: Vec3, wo: Vec3, wm: Vec3) -> Color {
        let cos_i = abs_cos_theta(wi);
        let cos_o = abs_cos_theta(wo);
        if cos_i == 0.0 || cos_o == 0.0 {
            return Color::ZERO;
        }
        self.color * (self.distrib.d(wm) * self.distrib.g(wi, wo) / (4.0 * cos_i * cos_o))
    }
}

impl Bxdf for Conductor {
    fn flags(&self) -> BxdfFlags {
        if self.distrib.effectively_smooth() {
            BxdfFlags::REFLECTION | BxdfFlags::SPECULAR
        } else {
            BxdfFlags::REFLECTION | BxdfFlags::GLOSSY
        }
    }

    fn f(&self, wi: Vec3, wo: Vec3) -> Color {
        if self.distrib.effectively_smooth() || !same_hemisphere(-wi, wo) {
            return Color::ZERO;
        }
        match Self::half_vector(wi, wo) {
            Some(wm) => self.torrance_sparrow(wi, wo, wm),
            None => Color::ZERO,
        }
    }

    fn sample_f(&self, wi: Vec3, rng: &mut dyn RngCore) -> Option<BsdfSample> {
        if self.distrib.effectively_smooth() {
            let wo = Vec3::new(wi.x, -wi.y, wi.z);
            return Some(BsdfSample::new(self.color, wo, 1.0, self.flags()));
        }

        if wi.y == 0.0 {
            return None;
        }

        // Facets are seen from the side the ray arrives from
        let view = -wi;
        let flip = if view.y < 0.0 { -1.0 } else { 1.0 };
        let up = |v: Vec3| Vec3::new(v.x, v.y * flip, v.z);

        let wm = up(self.distrib.sample_wm(up(view), gen_vec2(rng)));
        let wo = reflect(wi, wm);
        if !same_hemisphere(view, wo) {
            return None;
        }

        let cos_o = wo.dot(wm).abs();
        if cos_o == 0.0 {
            return None;
        }
        let pdf = self.distrib.pdf(up(view), up(wm)) / (4.0 * cos_o);
        let f = self.torrance_sparrow(wi, wo, up(wm));
        if pdf == 0.0 || f == Color::ZERO {
            return None;
        }
        Some(BsdfSample::new(f, wo, pdf, self.flags()))
    }

    fn pdf(&self, wi: Vec3, wo: Vec3) -> f32 {
        if self.distrib.effectively_smooth() || !same_hemisphere(-wi, wo) {
            return 0.0;
        }
        let Some(wm) = Self::half_vector(wi, wo) else {
            return 0.0;
        };

        let cos_o = wo.dot(wm).abs();
        if cos_o == 0.0 {
            return 0.0;
        }
        // The visible density is even in y, so evaluate from the upper side
        let view = -wi;
        let view = Vec3::new(view.x, view.y.abs(), view.z);
        self.distrib.pdf(view, wm) / (4.0 * cos_o)
    }
}
