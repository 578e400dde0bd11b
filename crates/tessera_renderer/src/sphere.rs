//! Sphere shape for ray tracing.

use crate::{Aabb, DirectionSample, HitRecord, Hittable, Interval, Ray, Vec2, Vec3};
use std::f32::consts::PI;

/// A sphere given directly in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    center: Vec3,
    radius: f32,
    bbox: Aabb,
}

impl Sphere {
    /// Create a new sphere. Negative radii are clamped to zero.
    pub fn new(center: Vec3, radius: f32) -> Self {
        let radius = radius.max(0.0);
        let rvec = Vec3::splat(radius);
        let bbox = Aabb::from_points(center - rvec, center + rvec);

        Self {
            center,
            radius,
            bbox,
        }
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Uniformly sample the cone of directions from `origin` that meet the
    /// sphere. Nothing is sampled from inside.
    pub fn sample_toward(&self, origin: Vec3, u: Vec2) -> Option<DirectionSample> {
        let (axis, cone) = self.visible_cone(origin)?;
        let cos_theta = 1.0 - u.x * cone;
        let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
        let phi = 2.0 * PI * u.y;

        let (tangent, bitangent) = axis.any_orthonormal_pair();
        let wi = (tangent * phi.cos() + bitangent * phi.sin()) * sin_theta + axis * cos_theta;
        Some(DirectionSample {
            wi,
            pdf: 1.0 / (2.0 * PI * cone),
        })
    }

    /// Solid angle density of [`Sphere::sample_toward`]; zero from inside.
    pub fn pdf_toward(&self, origin: Vec3) -> f32 {
        self.visible_cone(origin)
            .map_or(0.0, |(_, cone)| 1.0 / (2.0 * PI * cone))
    }

    /// Unit axis towards the centre and `1 - cos(theta_max)` of the cone the
    /// sphere subtends.
    fn visible_cone(&self, origin: Vec3) -> Option<(Vec3, f32)> {
        let to_center = self.center - origin;
        let dist2 = to_center.length_squared();
        let r2 = self.radius * self.radius;
        if r2 == 0.0 || dist2 <= r2 {
            return None;
        }

        let sin2_max = r2 / dist2;
        // Series form keeps precision for small, distant spheres
        let cone = if sin2_max < 1e-4 {
            0.5 * sin2_max
        } else {
            1.0 - (1.0 - sin2_max).sqrt()
        };
        Some((to_center / dist2.sqrt(), cone))
    }

    /// Get the UV coordinates for a point on the unit sphere.
    fn get_sphere_uv(p: Vec3) -> Vec2 {
        // theta: angle down from +Y
        // phi: angle around Y axis from +X
        let theta = (-p.y).clamp(-1.0, 1.0).acos();
        let phi = (-p.z).atan2(p.x) + PI;
        Vec2::new(phi / (2.0 * PI), theta / PI)
    }
}

impl Hittable for Sphere {
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'a>> {
        let oc = self.center - ray.origin();
        let a = ray.direction().length_squared();
        let h = ray.direction().dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = h * h - a * c;
        if discriminant < 0.0 || a == 0.0 {
            return None;
        }

        let sqrtd = discriminant.sqrt();

        // Find the nearest root in the acceptable range
        let mut root = (h - sqrtd) / a;
        if !ray_t.surrounds(root) {
            root = (h + sqrtd) / a;
            if !ray_t.surrounds(root) {
                return None;
            }
        }
        if !root.is_finite() {
            return None;
        }

        let p = ray.at(root);
        let outward_normal = if self.radius > 0.0 {
            (p - self.center) / self.radius
        } else {
            -ray.direction().normalize()
        };
        let uv = Self::get_sphere_uv(outward_normal);
        Some(HitRecord::new(ray, root, outward_normal, uv))
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}
