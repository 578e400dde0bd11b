//! Random sampling helpers shared by the camera and the BxDFs.

use crate::{Vec2, Vec3};
use rand::{Rng, RngCore};
use std::f32::consts::PI;

/// Uniform float in `[0, 1)` from a type-erased generator.
#[inline]
pub fn gen_f32(rng: &mut dyn RngCore) -> f32 {
    rng.gen::<f32>()
}

/// Two independent uniforms in `[0, 1)`.
#[inline]
pub fn gen_vec2(rng: &mut dyn RngCore) -> Vec2 {
    Vec2::new(gen_f32(rng), gen_f32(rng))
}

/// Map `u` in the unit square to the unit disk (polar mapping).
pub fn sample_uniform_disk_polar(u: Vec2) -> Vec2 {
    let r = u.x.sqrt();
    let theta = 2.0 * PI * u.y;
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Cosine-weighted direction on the `+Y` hemisphere.
pub fn sample_cosine_hemisphere(u: Vec2) -> Vec3 {
    let phi = 2.0 * PI * u.x;
    let radius = u.y.sqrt();
    let up = (1.0 - u.y).max(0.0).sqrt();
    Vec3::new(phi.cos() * radius, up, phi.sin() * radius)
}

/// Random offset in `[-0.5, 0.5)^2` for pixel jitter.
pub fn sample_square(rng: &mut dyn RngCore) -> Vec2 {
    gen_vec2(rng) - Vec2::splat(0.5)
}

/// Random point in the unit disk by rejection.
pub fn random_in_unit_disk(rng: &mut dyn RngCore) -> Vec2 {
    loop {
        let p = gen_vec2(rng) * 2.0 - Vec2::ONE;
        if p.length_squared() < 1.0 {
            return p;
        }
    }
}
