//! Triangle shape for ray tracing.
//!
//! Uses the Möller-Trumbore algorithm for ray-triangle intersection.

use crate::{Aabb, HitRecord, Hittable, Interval, Ray, Vec2, Vec3};

/// A triangle given directly in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    v0: Vec3,
    edge1: Vec3,
    edge2: Vec3,
    /// Pre-computed face normal (unit length)
    normal: Vec3,
    bbox: Aabb,
}

impl Triangle {
    /// Create a new triangle from three vertices. The outward side is the
    /// one `(v1 - v0) x (v2 - v0)` points to.
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        let edge1 = v1 - v0;
        let edge2 = v2 - v0;
        let normal = edge1.cross(edge2).normalize_or_zero();

        let min = v0.min(v1).min(v2);
        let max = v0.max(v1).max(v2);
        let bbox = Aabb::from_points(min, max).pad();

        Self {
            v0,
            edge1,
            edge2,
            normal,
            bbox,
        }
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    pub fn vertices(&self) -> [Vec3; 3] {
        [self.v0, self.v0 + self.edge1, self.v0 + self.edge2]
    }
}

impl Hittable for Triangle {
    /// Möller-Trumbore ray-triangle intersection algorithm.
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'a>> {
        let h = ray.direction().cross(self.edge2);
        let a = self.edge1.dot(h);

        // Ray is parallel to triangle
        if a.abs() < 1e-8 {
            return None;
        }

        let f = 1.0 / a;
        let s = ray.origin() - self.v0;
        let u = f * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(self.edge1);
        let v = f * ray.direction().dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * self.edge2.dot(q);
        if !t.is_finite() || !ray_t.surrounds(t) {
            return None;
        }

        Some(HitRecord::new(ray, t, self.normal, Vec2::new(u, v)))
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}
