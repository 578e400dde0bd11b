//! Recursive Monte Carlo radiance estimator.
//!
//! Emission is gathered two ways. BSDF sampling finds it when a scattered
//! ray happens to hit a light; light sampling traces a shadow ray towards a
//! point picked on a light. When both run at a vertex their estimates are
//! combined with the power heuristic, so each is weighted by how likely it
//! was to find that light.

use crate::{
    Bsdf, BxdfFlags, Color, HitRecord, ImageTexture, Interval, Ray, Scene, SphericalMap, Vec3,
};
use rand::RngCore;
use std::fmt;
use std::sync::Arc;

/// Closest hit distance accepted for a ray leaving a surface.
pub const HIT_EPSILON: f32 = 1e-3;

/// Radiance arriving along rays that leave the scene.
#[derive(Clone, Default)]
pub enum Background {
    /// White at the horizon blending to light blue overhead.
    #[default]
    Sky,
    Solid(Color),
    /// Equirectangular image looked up by ray direction.
    Environment(Arc<ImageTexture>),
}

impl Background {
    pub fn radiance(&self, ray: &Ray) -> Color {
        match self {
            Background::Sky => sky_gradient(ray),
            Background::Solid(color) => *color,
            Background::Environment(image) => image.evaluate(SphericalMap.map(ray.direction())),
        }
    }
}

impl PartialEq for Background {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Background::Sky, Background::Sky) => true,
            (Background::Solid(a), Background::Solid(b)) => a == b,
            (Background::Environment(a), Background::Environment(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Background {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Background::Sky => write!(f, "Sky"),
            Background::Solid(color) => f.debug_tuple("Solid").field(color).finish(),
            Background::Environment(image) => f.debug_tuple("Environment").field(image).finish(),
        }
    }
}

fn sky_gradient(ray: &Ray) -> Color {
    let unit_direction = ray.direction().normalize_or_zero();
    let a = 0.5 * (unit_direction.y + 1.0);
    let white = Color::new(1.0, 1.0, 1.0);
    let blue = Color::new(0.5, 0.7, 1.0);
    white * (1.0 - a) + blue * a
}

/// Power heuristic with exponent 2 for two one-sample strategies.
pub fn power_heuristic(pdf: f32, other: f32) -> f32 {
    let (a, b) = (pdf * pdf, other * other);
    if a + b == 0.0 || !(a + b).is_finite() {
        return if a.is_infinite() { 1.0 } else { 0.0 };
    }
    a / (a + b)
}

/// The vertex a ray was scattered from, when light sampling also ran there.
#[derive(Debug, Clone, Copy)]
struct ScatterOrigin {
    origin: Vec3,
    bsdf_pdf: f32,
}

/// Unidirectional path tracer with a hard depth cutoff.
#[derive(Debug, Clone, PartialEq)]
pub struct Integrator {
    max_depth: u32,
    background: Background,
    light_sampling: bool,
}

impl Integrator {
    /// Integrator with light sampling enabled.
    pub fn new(max_depth: u32, background: Background) -> Self {
        Self {
            max_depth,
            background,
            light_sampling: true,
        }
    }

    /// Turn light sampling on or off. Without it emission is found by BSDF
    /// sampling alone; both converge to the same image.
    pub fn with_light_sampling(mut self, enabled: bool) -> Self {
        self.light_sampling = enabled;
        self
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn background(&self) -> &Background {
        &self.background
    }

    pub fn light_sampling(&self) -> bool {
        self.light_sampling
    }

    /// Estimate the radiance arriving along `ray`.
    ///
    /// Camera rays start at depth 0. Paths are cut off once `depth` exceeds
    /// the maximum, so a path collects emission from at most
    /// `max_depth + 1` surfaces.
    pub fn li(&self, scene: &Scene, ray: &Ray, depth: u32, rng: &mut dyn RngCore) -> Color {
        self.trace(scene, ray, depth, None, rng)
    }

    fn trace(
        &self,
        scene: &Scene,
        ray: &Ray,
        depth: u32,
        from: Option<ScatterOrigin>,
        rng: &mut dyn RngCore,
    ) -> Color {
        if depth > self.max_depth {
            return Color::ZERO;
        }

        let Some((index, rec)) = scene.hit_primitive(ray, Interval::new(HIT_EPSILON, f32::INFINITY)) else {
            return self.background.radiance(ray);
        };

        // Dangling material reference: absorb
        let Some(material) = rec.material else {
            return Color::ZERO;
        };

        let mut emission = material.emission(&rec);
        if let Some(from) = from {
            if emission != Color::ZERO {
                let light_pdf = scene.light_pdf(index, from.origin, &rec);
                emission *= power_heuristic(from.bsdf_pdf, light_pdf);
            }
        }

        let Some(wi) = ray.direction().try_normalize() else {
            return emission;
        };

        let bsdf = material.calc_bsdf(&rec, rng);
        // Emission one bounce further must still be within the depth limit
        let sample_lights = self.light_sampling
            && depth < self.max_depth
            && bsdf.has_density()
            && !scene.lights().is_empty();

        let direct = if sample_lights {
            self.sample_direct(scene, &rec, &bsdf, wi, rng)
        } else {
            Color::ZERO
        };

        let Some(sample) = bsdf.sample_f(wi, rng) else {
            return emission + direct;
        };

        // Specular and proportional samples already carry the throughput
        let weight = if sample.is_specular() || sample.pdf_is_proportional {
            sample.f
        } else {
            sample.f * sample.wo.dot(rec.normal).abs() / sample.pdf
        };

        let next = sample_lights.then_some(ScatterOrigin {
            origin: rec.p,
            bsdf_pdf: sample.pdf,
        });
        let scattered = Ray::new(rec.p, sample.wo);
        emission + direct + weight * self.trace(scene, &scattered, depth + 1, next, rng)
    }

    /// One light-sampled estimate of the emission arriving at `rec` and
    /// scattered back along `wi`.
    fn sample_direct(
        &self,
        scene: &Scene,
        rec: &HitRecord,
        bsdf: &Bsdf,
        wi: Vec3,
        rng: &mut dyn RngCore,
    ) -> Color {
        let Some(light) = scene.sample_light(rec.p, rng) else {
            return Color::ZERO;
        };
        if light.pdf <= 0.0 || !light.pdf.is_finite() {
            return Color::ZERO;
        }

        let f = bsdf.f(wi, light.wi, BxdfFlags::ALL);
        if f == Color::ZERO {
            return Color::ZERO;
        }

        // Only an unobstructed view of the sampled light counts
        let shadow = Ray::new(rec.p, light.wi);
        let Some((index, hit)) = scene.hit_primitive(&shadow, Interval::new(HIT_EPSILON, f32::INFINITY)) else {
            return Color::ZERO;
        };
        if index != light.primitive {
            return Color::ZERO;
        }
        let Some(emitter) = hit.material else {
            return Color::ZERO;
        };

        let bsdf_pdf = bsdf.pdf(wi, light.wi, BxdfFlags::ALL);
        let weight = power_heuristic(light.pdf, bsdf_pdf);
        f * emitter.emission(&hit) * light.wi.dot(rec.normal).abs() * weight / light.pdf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ConductorMaterial, DielectricMaterial, DiffuseLight, DiffuseMaterial, Material, Primitive,
        Sphere,
    };
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn single_sphere(material: Arc<dyn Material>) -> Scene {
        Scene::new(
            vec![Primitive::new(Sphere::new(Vec3::ZERO, 1.0), 0)],
            vec![material],
            Background::Solid(Color::ONE),
        )
    }

    #[test]
    fn test_sky_gradient() {
        let up = sky_gradient(&Ray::new(Vec3::ZERO, Vec3::Y));
        let down = sky_gradient(&Ray::new(Vec3::ZERO, Vec3::NEG_Y));
        assert!((up - Color::new(0.5, 0.7, 1.0)).length() < 1e-6);
        assert!((down - Color::ONE).length() < 1e-6);
    }

    #[test]
    fn test_miss_returns_background() {
        let scene = Scene::new(Vec::new(), Vec::new(), Background::Sky);
        let integrator = Integrator::new(5, Background::Solid(Color::new(0.1, 0.2, 0.3)));
        let mut rng = StdRng::seed_from_u64(1);

        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        assert_eq!(integrator.li(&scene, &ray, 0, &mut rng), Color::new(0.1, 0.2, 0.3));
    }

    #[test]
    fn test_past_max_depth_is_black() {
        let scene = Scene::new(Vec::new(), Vec::new(), Background::Solid(Color::ONE));
        let integrator = Integrator::new(3, Background::Solid(Color::ONE));
        let mut rng = StdRng::seed_from_u64(2);

        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        assert_eq!(integrator.li(&scene, &ray, 3, &mut rng), Color::ONE);
        assert_eq!(integrator.li(&scene, &ray, 4, &mut rng), Color::ZERO);
    }

    #[test]
    fn test_light_returns_emission() {
        let scene = single_sphere(Arc::new(DiffuseLight::new(Color::splat(2.0))));
        let integrator = Integrator::new(5, Background::Solid(Color::ZERO));
        let mut rng = StdRng::seed_from_u64(3);

        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        assert_eq!(integrator.li(&scene, &ray, 0, &mut rng), Color::splat(2.0));
    }

    #[test]
    fn test_mirror_sphere_reflects_background() {
        let scene = single_sphere(Arc::new(ConductorMaterial::new(Color::splat(0.5), 0.0, 0.0)));
        let integrator = Integrator::new(5, Background::Solid(Color::ONE));
        let mut rng = StdRng::seed_from_u64(4);

        // Head-on: bounces straight back out to the background
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        let li = integrator.li(&scene, &ray, 0, &mut rng);
        assert!((li - Color::splat(0.5)).length() < 1e-5);
    }

    #[test]
    fn test_white_furnace_diffuse() {
        // A white diffuse sphere under a uniform white sky reflects exactly
        // the sky: every path escapes after one bounce.
        let scene = single_sphere(Arc::new(DiffuseMaterial::new(Color::ONE)));
        let integrator = Integrator::new(8, Background::Solid(Color::ONE));
        let mut rng = StdRng::seed_from_u64(5);

        for _ in 0..200 {
            let ray = Ray::new(Vec3::new(0.3, 0.2, -5.0), Vec3::Z);
            let li = integrator.li(&scene, &ray, 0, &mut rng);
            assert!((li - Color::ONE).length() < 1e-4, "li = {li}");
        }
    }

    #[test]
    fn test_smooth_glass_passes_uniform_background() {
        let scene = single_sphere(Arc::new(DielectricMaterial::smooth(1.5)));
        let integrator = Integrator::new(32, Background::Solid(Color::ONE));
        let mut rng = StdRng::seed_from_u64(6);

        // Lossless interface: every escaping path carries weight one
        let ray = Ray::new(Vec3::new(0.2, -0.1, -5.0), Vec3::Z);
        let mut escaped = 0;
        for _ in 0..200 {
            let li = integrator.li(&scene, &ray, 0, &mut rng);
            if li != Color::ZERO {
                assert!((li - Color::ONE).length() < 1e-4);
                escaped += 1;
            }
        }
        assert!(escaped > 190);
    }

    /// Grey floor at `y = 0` lit by `light` and nothing else.
    fn lit_floor(light: Primitive) -> Scene {
        let materials: Vec<Arc<dyn Material>> = vec![
            Arc::new(DiffuseMaterial::new(Color::splat(0.5))),
            Arc::new(DiffuseLight::new(Color::ONE)),
        ];
        Scene::new(
            vec![Primitive::plane(Vec3::ZERO, Vec3::Z, Vec3::X, 0), light],
            materials,
            Background::Solid(Color::ZERO),
        )
    }

    /// Mean and variance of the red channel looking straight down at the
    /// floor's origin.
    fn floor_estimate(scene: &Scene, integrator: &Integrator, n: usize, seed: u64) -> (f64, f64) {
        let mut rng = StdRng::seed_from_u64(seed);
        let ray = Ray::new(Vec3::new(0.0, 0.5, 0.0), Vec3::NEG_Y);
        let values: Vec<f64> = (0..n)
            .map(|_| integrator.li(scene, &ray, 0, &mut rng).x as f64)
            .collect();
        let mean = values.iter().sum::<f64>() / n as f64;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
        (mean, var)
    }

    #[test]
    fn test_power_heuristic() {
        assert!((power_heuristic(1.0, 1.0) - 0.5).abs() < 1e-6);
        assert!((power_heuristic(3.0, 1.0) - 0.9).abs() < 1e-6);
        assert_eq!(power_heuristic(2.0, 0.0), 1.0);
        assert_eq!(power_heuristic(0.0, 2.0), 0.0);
        assert_eq!(power_heuristic(0.0, 0.0), 0.0);
        assert_eq!(power_heuristic(f32::INFINITY, 1.0), 1.0);
    }

    #[test]
    fn test_light_sampling_is_on_by_default() {
        let integrator = Integrator::new(4, Background::Sky);
        assert!(integrator.light_sampling());
        assert!(!integrator.clone().with_light_sampling(false).light_sampling());
    }

    #[test]
    fn test_quad_light_matches_form_factor() {
        // Square of side 2 one unit above the floor. Outgoing radiance is
        // albedo * L * form factor, and the form factor of each 1x1 quarter
        // is sqrt(2) atan(1 / sqrt(2)) / (2 pi).
        let light = Primitive::parallelogram(
            Vec3::new(-1.0, 1.0, -1.0),
            Vec3::new(1.0, 1.0, -1.0),
            Vec3::new(-1.0, 1.0, 1.0),
            1,
        );
        let scene = lit_floor(light);
        assert_eq!(scene.lights(), &[1]);

        let quarter = 2.0_f64.sqrt() * (1.0 / 2.0_f64.sqrt()).atan() / (2.0 * std::f64::consts::PI);
        let expected = 0.5 * 4.0 * quarter;

        let mis = Integrator::new(1, Background::Solid(Color::ZERO));
        let bsdf_only = mis.clone().with_light_sampling(false);
        let (mean_mis, var_mis) = floor_estimate(&scene, &mis, 20_000, 30);
        let (mean_bsdf, var_bsdf) = floor_estimate(&scene, &bsdf_only, 20_000, 31);

        assert!((mean_mis - expected).abs() < 0.01, "mis {mean_mis}, expected {expected}");
        assert!((mean_bsdf - expected).abs() < 0.01, "bsdf {mean_bsdf}, expected {expected}");
        assert!(var_mis < var_bsdf, "variance {var_mis} vs {var_bsdf}");
    }

    #[test]
    fn test_sphere_light_matches_solid_angle() {
        // Irradiance from a sphere straight overhead is pi L r^2 / d^2
        let light = Primitive::new(Sphere::new(Vec3::new(0.0, 2.0, 0.0), 0.5), 1);
        let scene = lit_floor(light);
        let expected = 0.5 * 0.25 / 4.0;

        let mis = Integrator::new(1, Background::Solid(Color::ZERO));
        let (mean_mis, _) = floor_estimate(&scene, &mis, 40_000, 32);
        let (mean_bsdf, _) = floor_estimate(&scene, &mis.clone().with_light_sampling(false), 40_000, 33);

        assert!((mean_mis - expected).abs() < 0.003, "mis {mean_mis}, expected {expected}");
        assert!((mean_bsdf - expected).abs() < 0.003, "bsdf {mean_bsdf}, expected {expected}");
    }

    #[test]
    fn test_direct_light_respects_depth_limit() {
        let light = Primitive::new(Sphere::new(Vec3::new(0.0, 2.0, 0.0), 0.5), 1);
        let scene = lit_floor(light);
        let integrator = Integrator::new(0, Background::Solid(Color::ZERO));
        let (mean, _) = floor_estimate(&scene, &integrator, 200, 34);
        assert_eq!(mean, 0.0);
    }

    #[test]
    fn test_blocked_light_is_not_counted() {
        let light = Primitive::new(Sphere::new(Vec3::new(0.0, 2.0, 0.0), 0.5), 1);
        let blocker = Primitive::parallelogram(
            Vec3::new(-3.0, 1.0, -3.0),
            Vec3::new(3.0, 1.0, -3.0),
            Vec3::new(-3.0, 1.0, 3.0),
            0,
        );
        let materials: Vec<Arc<dyn Material>> = vec![
            Arc::new(DiffuseMaterial::new(Color::splat(0.5))),
            Arc::new(DiffuseLight::new(Color::ONE)),
        ];
        let scene = Scene::new(
            vec![Primitive::plane(Vec3::ZERO, Vec3::Z, Vec3::X, 0), light, blocker],
            materials,
            Background::Solid(Color::ZERO),
        );
        let integrator = Integrator::new(1, Background::Solid(Color::ZERO));
        let (mean, _) = floor_estimate(&scene, &integrator, 500, 35);
        assert_eq!(mean, 0.0);
    }

    #[test]
    fn test_environment_background() {
        // Black on the left half of the map, white on the right
        let image = Arc::new(ImageTexture::new(2, 1, vec![Color::ZERO, Color::ONE]));
        let background = Background::Environment(image.clone());

        let along = |dir: Vec3| background.radiance(&Ray::new(Vec3::ZERO, dir));
        assert!((along(Vec3::X) - Color::splat(0.5)).length() < 1e-5);
        assert!((along(Vec3::Z) - Color::splat(0.75)).length() < 1e-5);
        assert!((along(Vec3::NEG_Z) - Color::splat(0.25)).length() < 1e-5);

        assert_eq!(background, Background::Environment(image));
        let other = Arc::new(ImageTexture::new(2, 1, vec![Color::ZERO, Color::ONE]));
        assert_ne!(background, Background::Environment(other));
        assert_ne!(background, Background::Sky);
    }

    #[test]
    fn test_environment_lights_the_scene() {
        let image = Arc::new(ImageTexture::new(1, 1, vec![Color::ONE]));
        let scene = single_sphere(Arc::new(DiffuseMaterial::new(Color::ONE)));
        let integrator = Integrator::new(8, Background::Environment(image));
        let mut rng = StdRng::seed_from_u64(36);

        // Uniform environment: a white sphere is a white furnace
        for _ in 0..100 {
            let ray = Ray::new(Vec3::new(0.1, 0.4, -5.0), Vec3::Z);
            let li = integrator.li(&scene, &ray, 0, &mut rng);
            assert!((li - Color::ONE).length() < 1e-4, "li = {li}");
        }
    }
}
