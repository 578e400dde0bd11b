//! Tessera renderer - CPU Monte Carlo path tracing.
//!
//! Scenes are flat lists of primitives accelerated by a BVH. Surfaces
//! scatter through a BSDF built per hit from the primitive's material;
//! rough conductors and dielectrics share the Trowbridge-Reitz microfacet
//! distribution. Images are rendered bucket by bucket on a rayon pool.

mod bsdf;
mod bucket;
mod bvh;
mod camera;
mod ggx;
mod hittable;
mod integrator;
mod material;
mod planar;
mod primitive;
mod renderer;
mod sampling;
mod scene;
mod sphere;
mod texture;
mod triangle;

pub mod bxdf;

pub use bsdf::Bsdf;
pub use bucket::{generate_buckets, Bucket, BucketResult, DEFAULT_BUCKET_SIZE};
pub use bvh::Bvh;
pub use bxdf::{BsdfSample, Bxdf, BxdfFlags, BxdfKind, Conductor, Dielectric, Lambertian};
pub use camera::Camera;
pub use ggx::TrowbridgeReitz;
pub use hittable::{HitRecord, Hittable};
pub use integrator::{Background, Integrator};
pub use material::{
    ConductorMaterial, DielectricMaterial, DiffuseLight, DiffuseMaterial, Material, MixMaterial,
};
pub use planar::{Parallelogram, Plane};
pub use primitive::{DirectionSample, MaterialId, Primitive, Shape};
pub use renderer::{
    color_to_rgb8, linear_to_gamma, render, render_with_progress, ImageBuffer, RenderConfig,
    RenderProgress,
};
pub use sampling::gen_f32;
pub use scene::{LightSample, Scene};
pub use sphere::Sphere;
pub use texture::{
    ColorTexture, FloatTexture, ImageTexture, SphericalMap, TextureError, TextureResult,
};
pub use triangle::Triangle;

/// Linear RGB radiance.
pub type Color = Vec3;

/// Re-export the math types used throughout the renderer API
pub use tessera_math::{Aabb, Interval, Quat, Ray, Transform, Vec2, Vec3};
