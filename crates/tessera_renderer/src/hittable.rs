//! Hittable trait and HitRecord for ray-object intersection.

use crate::{Aabb, Interval, Material, Ray, Vec2, Vec3};

/// Record of a ray-object intersection.
#[derive(Clone, Copy)]
pub struct HitRecord<'a> {
    /// Parameter t where the intersection occurs
    pub t: f32,
    /// Point of intersection
    pub p: Vec3,
    /// Surface normal at intersection (always points against ray)
    pub normal: Vec3,
    /// Whether the ray hit the front face (outside) of the surface
    pub front_face: bool,
    /// Surface parameterization of the hit point
    pub uv: Vec2,
    /// Material at the intersection point. Shapes leave this empty; the
    /// scene fills it in from its material arena.
    pub material: Option<&'a dyn Material>,
}

impl<'a> HitRecord<'a> {
    /// Build a record for a hit at `t`, orienting `outward_normal` against
    /// the ray.
    pub fn new(ray: &Ray, t: f32, outward_normal: Vec3, uv: Vec2) -> Self {
        let mut rec = Self {
            t,
            p: ray.at(t),
            normal: outward_normal,
            front_face: true,
            uv,
            material: None,
        };
        rec.set_face_normal(ray, outward_normal);
        rec
    }

    /// Set the face normal based on ray direction and outward normal.
    ///
    /// The normal is always stored pointing against the ray direction,
    /// so we need to track whether we hit the front or back face.
    pub fn set_face_normal(&mut self, ray: &Ray, outward_normal: Vec3) {
        self.front_face = ray.direction().dot(outward_normal) < 0.0;
        self.normal = if self.front_face {
            outward_normal
        } else {
            -outward_normal
        };
    }
}

impl std::fmt::Debug for HitRecord<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HitRecord")
            .field("t", &self.t)
            .field("p", &self.p)
            .field("normal", &self.normal)
            .field("front_face", &self.front_face)
            .field("uv", &self.uv)
            .field("has_material", &self.material.is_some())
            .finish()
    }
}

/// Trait for objects that can be hit by rays.
pub trait Hittable: Send + Sync {
    /// Closest intersection with `t` strictly inside `ray_t`, if any.
    ///
    /// Reported times are always finite.
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'a>>;

    /// Get the axis-aligned bounding box of this object.
    fn bounding_box(&self) -> Aabb;
}

impl<H: Hittable + ?Sized> Hittable for Box<H> {
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'a>> {
        (**self).hit(ray, ray_t)
    }

    fn bounding_box(&self) -> Aabb {
        (**self).bounding_box()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_normal_against_ray() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);

        let front = HitRecord::new(&ray, 4.0, Vec3::NEG_Z, Vec2::ZERO);
        assert!(front.front_face);
        assert_eq!(front.normal, Vec3::NEG_Z);
        assert_eq!(front.p, Vec3::new(0.0, 0.0, -1.0));

        let back = HitRecord::new(&ray, 6.0, Vec3::Z, Vec2::ZERO);
        assert!(!back.front_face);
        assert_eq!(back.normal, Vec3::NEG_Z);
        assert!(back.material.is_none());
    }
}
