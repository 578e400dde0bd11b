//! Planar shapes in canonical local space.
//!
//! All of them lie on `y = 0` with outward normal `+Y`; a primitive's
//! transform places them in the world (see [`crate::Transform::from_points`]).

use crate::{Aabb, HitRecord, Hittable, Interval, Ray, Vec2, Vec3};

/// Time at which `ray` crosses `y = 0`, if it lies inside `ray_t`.
#[inline]
fn cross_ground(ray: &Ray, ray_t: Interval) -> Option<f32> {
    let t = -ray.origin.y / ray.direction.y;
    (t.is_finite() && ray_t.surrounds(t)).then_some(t)
}

/// The infinite plane `y = 0`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Plane;

impl Hittable for Plane {
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'a>> {
        let t = cross_ground(ray, ray_t)?;
        let p = ray.at(t);
        Some(HitRecord::new(ray, t, Vec3::Y, Vec2::new(p.x, p.z)))
    }

    fn bounding_box(&self) -> Aabb {
        Aabb::new(Interval::UNIVERSE, Interval::new(0.0, 0.0), Interval::UNIVERSE).pad()
    }
}

/// The unit square `x, z in [0, 1]` on `y = 0`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Parallelogram;

impl Hittable for Parallelogram {
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'a>> {
        let t = cross_ground(ray, ray_t)?;
        let p = ray.at(t);
        let inside = (0.0..=1.0).contains(&p.x) && (0.0..=1.0).contains(&p.z);
        inside.then(|| HitRecord::new(ray, t, Vec3::Y, Vec2::new(p.x, p.z)))
    }

    fn bounding_box(&self) -> Aabb {
        Aabb::from_points(Vec3::ZERO, Vec3::new(1.0, 0.0, 1.0)).pad()
    }
}
