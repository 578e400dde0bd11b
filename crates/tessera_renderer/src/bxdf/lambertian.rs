use super::{abs_cos_theta, same_hemisphere, BsdfSample, Bxdf, BxdfFlags};
use crate::sampling::{gen_vec2, sample_cosine_hemisphere};
use crate::{Color, Vec3};
use rand::RngCore;
use std::f32::consts::FRAC_1_PI;

/// Ideal diffuse reflection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lambertian {
    albedo: Color,
}

impl Lambertian {
    pub fn new(albedo: Color) -> Self {
        Self { albedo }
    }
}

impl Bxdf for Lambertian {
    fn flags(&self) -> BxdfFlags {
        BxdfFlags::DIFFUSE | BxdfFlags::REFLECTION
    }

    fn f(&self, wi: Vec3, wo: Vec3) -> Color {
        if same_hemisphere(-wi, wo) {
            self.albedo * FRAC_1_PI
        } else {
            Color::ZERO
        }
    }

    fn sample_f(&self, wi: Vec3, rng: &mut dyn RngCore) -> Option<BsdfSample> {
        let mut wo = sample_cosine_hemisphere(gen_vec2(rng));
        // Scatter back to the side the ray came from
        if wi.y > 0.0 {
            wo.y = -wo.y;
        }

        let pdf = self.pdf(wi, wo);
        if pdf == 0.0 {
            return None;
        }
        Some(BsdfSample::new(self.f(wi, wo), wo, pdf, self.flags()))
    }

    fn pdf(&self, wi: Vec3, wo: Vec3) -> f32 {
        if same_hemisphere(-wi, wo) {
            abs_cos_theta(wo) * FRAC_1_PI
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::f32::consts::PI;

    const N: usize = 20_000;

    #[test]
    fn test_f_is_albedo_over_pi_on_reflection_side() {
        let lambert = Lambertian::new(Color::new(0.5, 0.25, 1.0));
        let wi = Vec3::new(0.3, -0.9, 0.1).normalize();

        assert!((lambert.f(wi, Vec3::Y) - Color::new(0.5, 0.25, 1.0) / PI).length() < 1e-6);
        assert_eq!(lambert.f(wi, Vec3::NEG_Y), Color::ZERO);
        assert_eq!(lambert.pdf(wi, Vec3::NEG_Y), 0.0);
    }

    #[test]
    fn test_samples_leave_on_incoming_side() {
        let lambert = Lambertian::new(Color::ONE);
        let mut rng = StdRng::seed_from_u64(1);

        for wi in [Vec3::new(0.0, -1.0, 0.0), Vec3::new(0.2, 0.9, 0.0).normalize()] {
            for _ in 0..1000 {
                let s = lambert.sample_f(wi, &mut rng).expect("diffuse always samples");
                assert!(same_hemisphere(-wi, s.wo));
                assert!((s.pdf - lambert.pdf(wi, s.wo)).abs() < 1e-6);
                assert_eq!(s.flags, BxdfFlags::DIFFUSE | BxdfFlags::REFLECTION);
            }
        }
    }

    /// Monte Carlo estimate of the cosine integral over the hemisphere
    /// from cosine-distributed samples.
    #[test]
    fn test_cosine_integral_converges_to_pi() {
        let lambert = Lambertian::new(Color::ONE);
        let mut rng = StdRng::seed_from_u64(2);
        let wi = Vec3::NEG_Y;

        let estimate: f64 = (0..N)
            .map(|_| {
                let s = lambert.sample_f(wi, &mut rng).expect("sample");
                (abs_cos_theta(s.wo) / s.pdf) as f64
            })
            .sum::<f64>()
            / N as f64;
        assert!((estimate - std::f64::consts::PI).abs() < 1e-3);

        // Mean cosine under cosine weighting is 2/3
        let mean_cos: f64 = (0..N)
            .map(|_| abs_cos_theta(lambert.sample_f(wi, &mut rng).expect("sample").wo) as f64)
            .sum::<f64>()
            / N as f64;
        assert!((mean_cos - 2.0 / 3.0).abs() < 0.01);
    }

    #[test]
    fn test_throughput_equals_albedo() {
        let albedo = Color::new(0.8, 0.6, 0.4);
        let lambert = Lambertian::new(albedo);
        let mut rng = StdRng::seed_from_u64(3);
        let wi = Vec3::new(0.5, -0.5, 0.5).normalize();

        for _ in 0..100 {
            let s = lambert.sample_f(wi, &mut rng).expect("sample");
            let weight = s.f * abs_cos_theta(s.wo) / s.pdf;
            assert!((weight - albedo).length() < 1e-4);
        }
    }
}
