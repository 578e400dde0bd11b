use super::{reflect, refract, schlick_reflectance, BsdfSample, Bxdf, BxdfFlags};
use crate::sampling::{gen_f32, gen_vec2};
use crate::{Color, TrowbridgeReitz, Vec3};
use rand::RngCore;

/// Glass-like interface between two media.
///
/// `eta` is relative: the index on the side the ray arrives from over the
/// index on the far side. The caller picks it per hit from the face that was
/// struck. Each sample follows either the reflected or the transmitted
/// branch, chosen with Schlick's reflectance, so a sample is a one-sample
/// estimate of both lobes and the BxDF has no density to evaluate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dielectric {
    eta: f32,
    distrib: TrowbridgeReitz,
}

impl Dielectric {
    pub fn new(eta: f32, distrib: TrowbridgeReitz) -> Self {
        Self { eta, distrib }
    }

    pub fn eta(&self) -> f32 {
        self.eta
    }

    /// Probability of taking the reflected branch for a unit incoming
    /// direction meeting a facet with normal `n` (facing against it).
    pub fn reflect_probability(&self, wi: Vec3, n: Vec3) -> f32 {
        let cos_theta = (-wi).dot(n).clamp(0.0, 1.0);
        let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
        if self.eta * sin_theta > 1.0 {
            1.0
        } else {
            schlick_reflectance(cos_theta, self.eta)
        }
    }

    fn branch(&self, wi: Vec3, n: Vec3, rng: &mut dyn RngCore) -> (Vec3, BxdfFlags) {
        if gen_f32(rng) < self.reflect_probability(wi, n) {
            (reflect(wi, n), BxdfFlags::REFLECTION)
        } else {
            (refract(wi, n, self.eta), BxdfFlags::TRANSMISSION)
        }
    }
}

impl Bxdf for Dielectric {
    fn flags(&self) -> BxdfFlags {
        // Schlick still reflects at grazing angles when eta is 1
        let lobe = BxdfFlags::REFLECTION | BxdfFlags::TRANSMISSION;
        if self.distrib.effectively_smooth() {
            lobe | BxdfFlags::SPECULAR
        } else {
            lobe | BxdfFlags::GLOSSY
        }
    }

    fn f(&self, _wi: Vec3, _wo: Vec3) -> Color {
        Color::ZERO
    }

    fn sample_f(&self, wi: Vec3, rng: &mut dyn RngCore) -> Option<BsdfSample> {
        let wi = wi.try_normalize()?;
        // Work as if the ray arrives from above, then restore the side
        let flip = if wi.y > 0.0 { -1.0 } else { 1.0 };
        let to_upper = |v: Vec3| Vec3::new(v.x, v.y * flip, v.z);
        let w = to_upper(wi);

        if self.distrib.effectively_smooth() {
            let (wo, lobe) = self.branch(w, Vec3::Y, rng);
            return Some(BsdfSample::new(
                Color::ONE,
                to_upper(wo),
                1.0,
                lobe | BxdfFlags::SPECULAR,
            ));
        }

        let wm = self.distrib.sample_wm(-w, gen_vec2(rng));
        if (-w).dot(wm) <= 0.0 {
            return None;
        }
        let (wo, lobe) = self.branch(w, wm, rng);

        // The branch must leave on the side its lobe belongs to
        let valid = if lobe == BxdfFlags::REFLECTION { wo.y > 0.0 } else { wo.y < 0.0 };
        if !valid {
            return None;
        }

        let weight = self.distrib.g(w, wo) / self.distrib.g1(-w);
        Some(BsdfSample {
            f: Color::splat(weight),
            wo: to_upper(wo),
            pdf: 1.0,
            flags: lobe | BxdfFlags::GLOSSY,
            pdf_is_proportional: true,
        })
    }

    fn pdf(&self, _wi: Vec3, _wo: Vec3) -> f32 {
        0.0
    }

    fn has_density(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn glass(alpha: f32) -> Dielectric {
        Dielectric::new(1.0 / 1.5, TrowbridgeReitz::new(alpha, alpha))
    }

    #[test]
    fn test_smooth_branches_are_exact() {
        let d = glass(0.0);
        let mut rng = StdRng::seed_from_u64(8);
        let wi = Vec3::new(0.6, -0.8, 0.0);

        let mut saw_reflection = false;
        let mut saw_transmission = false;
        for _ in 0..500 {
            let s = d.sample_f(wi, &mut rng).expect("smooth glass always samples");
            assert!(s.is_specular());
            assert_eq!(s.pdf, 1.0);
            assert_eq!(s.f, Color::ONE);

            if s.is_transmission() {
                saw_transmission = true;
                assert!(s.wo.y < 0.0);
                // Snell: sin_t = eta * sin_i
                assert!((s.wo.x - 0.6 / 1.5).abs() < 1e-5);
            } else {
                saw_reflection = true;
                assert!((s.wo - Vec3::new(0.6, 0.8, 0.0)).length() < 1e-6);
            }
        }
        assert!(saw_reflection && saw_transmission);
    }

    #[test]
    fn test_fractions_follow_schlick() {
        let d = glass(0.0);
        let mut rng = StdRng::seed_from_u64(9);
        let wi = Vec3::new(0.8, -0.6, 0.0);
        let n = 100_000;

        let mut reflected = 0usize;
        for _ in 0..n {
            let s = d.sample_f(wi, &mut rng).expect("sample");
            if !s.flags.is_transmissive() {
                assert!(s.flags.is_reflective());
                reflected += 1;
            }
        }

        let r = reflected as f64 / n as f64;

        let expected = schlick_reflectance(0.6, 1.0 / 1.5) as f64;
        let se = (expected * (1.0 - expected) / n as f64).sqrt();
        assert!((r - expected).abs() < 4.0 * se, "r = {r}, expected {expected}");
    }

    #[test]
    fn test_total_internal_reflection() {
        // Leaving glass at a grazing angle cannot refract
        let d = Dielectric::new(1.5, TrowbridgeReitz::new(0.0, 0.0));
        let mut rng = StdRng::seed_from_u64(10);
        let wi = Vec3::new(0.9, -0.2, 0.0).normalize();

        assert_eq!(d.reflect_probability(wi, Vec3::Y), 1.0);
        for _ in 0..100 {
            let s = d.sample_f(wi, &mut rng).expect("sample");
            assert!(!s.is_transmission());
            assert!(s.wo.y > 0.0);
        }
    }

    #[test]
    fn test_ray_from_below_keeps_its_side() {
        let d = glass(0.0);
        let mut rng = StdRng::seed_from_u64(11);
        let wi = Vec3::new(0.0, 1.0, 0.0);

        for _ in 0..100 {
            let s = d.sample_f(wi, &mut rng).expect("sample");
            if s.is_transmission() {
                assert!(s.wo.y > 0.0);
            } else {
                assert!(s.wo.y < 0.0);
            }
        }
    }

    #[test]
    fn test_rough_samples_are_proportional() {
        let d = glass(0.4);
        let mut rng = StdRng::seed_from_u64(12);
        let wi = Vec3::new(0.3, -0.9, -0.2).normalize();

        let mut count = 0;
        for _ in 0..2000 {
            let Some(s) = d.sample_f(wi, &mut rng) else {
                continue;
            };
            count += 1;
            assert!(s.pdf_is_proportional);
            assert_eq!(s.pdf, 1.0);
            assert!(s.f.x > 0.0 && s.f.x <= 1.0 + 1e-5);
            assert!(s.flags.matches(BxdfFlags::GLOSSY));
            if s.is_transmission() {
                assert!(s.wo.y < 0.0);
            } else {
                assert!(s.wo.y > 0.0);
            }
        }
        assert!(count > 1500);
    }

    /// Mean throughput over all samples, dropped ones counting as zero, and
    /// the fraction of samples dropped.
    fn rough_energy(alpha: f32, seed: u64) -> (f64, f64) {
        let d = glass(alpha);
        let mut rng = StdRng::seed_from_u64(seed);
        let n = 100_000;

        let mut sum = 0.0_f64;
        let mut dropped = 0usize;
        for _ in 0..n {
            match d.sample_f(Vec3::NEG_Y, &mut rng) {
                Some(s) => sum += s.f.x as f64,
                None => dropped += 1,
            }
        }
        (sum / n as f64, dropped as f64 / n as f64)
    }

    #[test]
    fn test_rough_energy_loss_grows_with_alpha() {
        let (e_fine, drop_fine) = rough_energy(0.01, 21);
        let (e_mid, drop_mid) = rough_energy(0.1, 22);
        let (e_rough, drop_rough) = rough_energy(0.4, 23);

        // Nearly smooth facets keep everything
        assert!(e_fine > 0.999, "energy {e_fine}");
        assert!(drop_fine < 0.001, "dropped {drop_fine}");

        assert!(e_mid > 0.995 && e_mid <= 1.0, "energy {e_mid}");
        assert!(drop_mid < 0.005, "dropped {drop_mid}");

        // Masking and samples leaving on the wrong side cost a few percent
        assert!(e_rough > 0.96 && e_rough < 0.995, "energy {e_rough}");
        assert!(drop_rough > 0.005 && drop_rough < 0.03, "dropped {drop_rough}");

        assert!(e_fine >= e_mid && e_mid > e_rough);
    }

    #[test]
    fn test_index_matched_interface_can_reflect() {
        let matched = Dielectric::new(1.0, TrowbridgeReitz::new(0.0, 0.0));
        assert!(matched.flags().contains(BxdfFlags::REFLECTION | BxdfFlags::TRANSMISSION));

        // Grazing incidence: Schlick with r0 = 0 still picks reflection
        let mut rng = StdRng::seed_from_u64(24);
        let wi = Vec3::new(0.999, -0.045, 0.0).normalize();
        let reflected = (0..1000)
            .filter_map(|_| matched.sample_f(wi, &mut rng))
            .filter(|s| !s.is_transmission())
            .inspect(|s| assert!(matched.flags().contains(s.flags)))
            .count();
        assert!(reflected > 0);
    }

    #[test]
    fn test_no_density() {
        let d = glass(0.4);
        assert_eq!(d.f(Vec3::NEG_Y, Vec3::Y), Color::ZERO);
        assert_eq!(d.pdf(Vec3::NEG_Y, Vec3::NEG_Y), 0.0);
        assert!(!d.has_density());
    }
}
