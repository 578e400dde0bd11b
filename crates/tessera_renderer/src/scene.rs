//! Scene: primitives in a BVH plus the material arena they index.

use crate::sampling::{gen_f32, gen_vec2};
use crate::{
    Aabb, Background, Bvh, HitRecord, Hittable, Interval, Material, Primitive, Ray, Vec3,
};
use rand::RngCore;
use std::sync::Arc;

/// A direction towards one of the scene's lights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSample {
    /// Index of the light's primitive.
    pub primitive: usize,
    pub wi: Vec3,
    /// Solid angle density, including the choice of light.
    pub pdf: f32,
}

/// Everything a render needs besides the camera. Built once, then shared
/// read-only by every worker.
pub struct Scene {
    bvh: Bvh<Primitive>,
    materials: Vec<Arc<dyn Material>>,
    background: Background,
    /// Emissive primitives that can be sampled directly, ascending.
    lights: Vec<usize>,
}

impl Scene {
    pub fn new(
        primitives: Vec<Primitive>,
        materials: Vec<Arc<dyn Material>>,
        background: Background,
    ) -> Self {
        let dangling = primitives
            .iter()
            .filter(|p| p.material() >= materials.len())
            .count();
        if dangling > 0 {
            log::warn!(
                "{} primitives reference missing materials and will render black",
                dangling
            );
        }

        let bvh = Bvh::new(primitives);
        log::info!(
            "Built BVH: {} primitives, {} nodes, depth {}",
            bvh.len(),
            bvh.node_count(),
            bvh.depth()
        );

        let emissive: Vec<usize> = bvh
            .items()
            .iter()
            .enumerate()
            .filter(|(_, p)| materials.get(p.material()).is_some_and(|m| m.is_emissive()))
            .map(|(i, _)| i)
            .collect();
        let lights: Vec<usize> = emissive
            .iter()
            .copied()
            .filter(|&i| bvh.items()[i].is_sampleable())
            .collect();
        if lights.len() < emissive.len() {
            log::debug!(
                "{} emissive primitives are reached only by BSDF sampling",
                emissive.len() - lights.len()
            );
        }
        log::debug!("{} light primitives", lights.len());

        Self {
            bvh,
            materials,
            background,
            lights,
        }
    }

    pub fn primitives(&self) -> &[Primitive] {
        self.bvh.items()
    }

    pub fn materials(&self) -> &[Arc<dyn Material>] {
        &self.materials
    }

    pub fn background(&self) -> &Background {
        &self.background
    }

    /// Indices of the primitives sampled as lights.
    pub fn lights(&self) -> &[usize] {
        &self.lights
    }

    pub fn len(&self) -> usize {
        self.bvh.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bvh.is_empty()
    }

    /// Closest hit along with the index of the primitive that was struck.
    pub fn hit_primitive<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<(usize, HitRecord<'a>)> {
        let (index, mut rec) = self.bvh.hit_item(ray, ray_t)?;
        let id = self.bvh.items()[index].material();
        rec.material = self.materials.get(id).map(|m| m.as_ref());
        Some((index, rec))
    }

    /// Pick a light uniformly and sample a direction towards it from
    /// `origin`.
    pub fn sample_light(&self, origin: Vec3, rng: &mut dyn RngCore) -> Option<LightSample> {
        if self.lights.is_empty() {
            return None;
        }
        let n = self.lights.len();
        let pick = ((gen_f32(rng) * n as f32) as usize).min(n - 1);
        let primitive = self.lights[pick];

        let sample = self.bvh.items()[primitive].sample_toward(origin, gen_vec2(rng))?;
        Some(LightSample {
            primitive,
            wi: sample.wi,
            pdf: sample.pdf / n as f32,
        })
    }

    /// Density with which [`Scene::sample_light`] from `origin` produces
    /// the direction that reached `rec` on primitive `index`. Zero for
    /// primitives that are not sampled as lights.
    pub fn light_pdf(&self, index: usize, origin: Vec3, rec: &HitRecord) -> f32 {
        if self.lights.binary_search(&index).is_err() {
            return 0.0;
        }
        self.bvh.items()[index].pdf_toward(origin, rec) / self.lights.len() as f32
    }
}

impl Hittable for Scene {
    /// Closest hit with its material resolved from the arena.
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'a>> {
        self.hit_primitive(ray, ray_t).map(|(_, rec)| rec)
    }

    fn bounding_box(&self) -> Aabb {
        self.bvh.bounding_box()
    }
}
