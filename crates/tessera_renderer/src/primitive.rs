//! Primitives: a shape, the material it is shaded with and where it sits.

use crate::{
    Aabb, HitRecord, Hittable, Interval, Parallelogram, Plane, Ray, Sphere, Transform, Triangle,
    Vec2, Vec3,
};

/// Index into a scene's material arena.
pub type MaterialId = usize;

/// The closed set of shapes a scene can hold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Sphere(Sphere),
    Triangle(Triangle),
    /// Canonical `y = 0` plane; needs a transform to be placed.
    Plane(Plane),
    /// Canonical unit square; needs a transform to be placed.
    Parallelogram(Parallelogram),
}

impl Hittable for Shape {
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'a>> {
        match self {
            Shape::Sphere(s) => s.hit(ray, ray_t),
            Shape::Triangle(s) => s.hit(ray, ray_t),
            Shape::Plane(s) => s.hit(ray, ray_t),
            Shape::Parallelogram(s) => s.hit(ray, ray_t),
        }
    }

    fn bounding_box(&self) -> Aabb {
        match self {
            Shape::Sphere(s) => s.bounding_box(),
            Shape::Triangle(s) => s.bounding_box(),
            Shape::Plane(s) => s.bounding_box(),
            Shape::Parallelogram(s) => s.bounding_box(),
        }
    }
}

impl From<Sphere> for Shape {
    fn from(s: Sphere) -> Self {
        Shape::Sphere(s)
    }
}

impl From<Triangle> for Shape {
    fn from(s: Triangle) -> Self {
        Shape::Triangle(s)
    }
}

/// A direction from a shading point towards a light, with its solid angle
/// density.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionSample {
    pub wi: Vec3,
    pub pdf: f32,
}

/// A shape bound to a material, optionally placed by a local-to-world
/// transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Primitive {
    shape: Shape,
    material: MaterialId,
    transform: Option<Transform>,
    bbox: Aabb,
}

impl Primitive {
    /// A primitive whose shape is already expressed in world space.
    pub fn new(shape: impl Into<Shape>, material: MaterialId) -> Self {
        let shape = shape.into();
        Self {
            shape,
            material,
            transform: None,
            bbox: shape.bounding_box(),
        }
    }

    /// A primitive whose shape lives in a canonical local space.
    pub fn with_transform(shape: impl Into<Shape>, material: MaterialId, transform: Transform) -> Self {
        let shape = shape.into();
        Self {
            shape,
            material,
            transform: Some(transform),
            bbox: transform.aabb(&shape.bounding_box()).pad(),
        }
    }

    /// The infinite plane through `p0`, `p1`, `p2`.
    pub fn plane(p0: Vec3, p1: Vec3, p2: Vec3, material: MaterialId) -> Self {
        Self::with_transform(Shape::Plane(Plane), material, Transform::from_points(p0, p1, p2))
    }

    /// The parallelogram with corner `p0` and edges `p1 - p0`, `p2 - p0`.
    pub fn parallelogram(
        p0: Vec3,
        p1: Vec3,
        p2: Vec3,
        material: MaterialId,
    ) -> Self {
        Self::with_transform(
            Shape::Parallelogram(Parallelogram),
            material,
            Transform::from_points(p0, p1, p2),
        )
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn material(&self) -> MaterialId {
        self.material
    }

    pub fn transform(&self) -> Option<&Transform> {
        self.transform.as_ref()
    }

    /// Whether directions towards this primitive can be sampled. Infinite
    /// planes and transformed spheres cannot.
    pub fn is_sampleable(&self) -> bool {
        match self.shape {
            Shape::Sphere(_) => self.transform.is_none(),
            Shape::Triangle(_) | Shape::Parallelogram(_) => true,
            Shape::Plane(_) => false,
        }
    }

    /// World-space corner and edges of a flat finite primitive, and whether
    /// it is the triangle they span rather than the parallelogram.
    fn planar_frame(&self) -> Option<(Vec3, Vec3, Vec3, bool)> {
        let (corner, e1, e2, triangle) = match self.shape {
            Shape::Triangle(t) => {
                let [a, b, c] = t.vertices();
                (a, b - a, c - a, true)
            }
            Shape::Parallelogram(_) => (Vec3::ZERO, Vec3::X, Vec3::Z, false),
            _ => return None,
        };
        Some(match &self.transform {
            Some(t) => (t.point(corner), t.vector(e1), t.vector(e2), triangle),
            None => (corner, e1, e2, triangle),
        })
    }

    /// Surface area of a triangle or parallelogram.
    pub fn area(&self) -> Option<f32> {
        let (_, e1, e2, triangle) = self.planar_frame()?;
        let area = e1.cross(e2).length();
        Some(if triangle { 0.5 * area } else { area })
    }

    /// Sample a direction from `origin` towards the primitive. Flat shapes
    /// are sampled uniformly by area, spheres by the cone they subtend.
    pub fn sample_toward(&self, origin: Vec3, u: Vec2) -> Option<DirectionSample> {
        if let Shape::Sphere(sphere) = &self.shape {
            return if self.transform.is_none() {
                sphere.sample_toward(origin, u)
            } else {
                None
            };
        }

        let (corner, e1, e2, triangle) = self.planar_frame()?;
        let (a, b) = if triangle && u.x + u.y > 1.0 {
            (1.0 - u.x, 1.0 - u.y)
        } else {
            (u.x, u.y)
        };
        let p = corner + a * e1 + b * e2;
        let normal = e1.cross(e2).normalize_or_zero();

        let to_light = p - origin;
        let dist2 = to_light.length_squared();
        if dist2 == 0.0 {
            return None;
        }
        let wi = to_light / dist2.sqrt();
        let pdf = self.area_to_solid_angle(dist2, normal.dot(wi).abs())?;
        Some(DirectionSample { wi, pdf })
    }

    /// Density of [`Primitive::sample_toward`] from `origin` for the
    /// direction that reached `rec` on this primitive.
    pub fn pdf_toward(&self, origin: Vec3, rec: &HitRecord) -> f32 {
        match self.shape {
            Shape::Sphere(sphere) if self.transform.is_none() => sphere.pdf_toward(origin),
            Shape::Triangle(_) | Shape::Parallelogram(_) => {
                let to_light = rec.p - origin;
                let dist2 = to_light.length_squared();
                if dist2 == 0.0 {
                    return 0.0;
                }
                let cos_light = rec.normal.dot(to_light).abs() / dist2.sqrt();
                self.area_to_solid_angle(dist2, cos_light).unwrap_or(0.0)
            }
            _ => 0.0,
        }
    }

    fn area_to_solid_angle(&self, dist2: f32, cos_light: f32) -> Option<f32> {
        let area = self.area()?;
        if cos_light < 1e-6 || area <= 0.0 {
            return None;
        }
        Some(dist2 / (cos_light * area))
    }
}

impl Hittable for Primitive {
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'a>> {
        let Some(transform) = &self.transform else {
            return self.shape.hit(ray, ray_t);
        };

        // The local ray keeps an unnormalized direction, so t is shared
        let local_ray = transform.ray_to_local(ray);
        let mut rec = self.shape.hit(&local_ray, ray_t)?;
        if !rec.t.is_finite() {
            return None;
        }
        rec.p = ray.at(rec.t);
        // Already faces the local ray; the inverse transpose keeps that side
        rec.normal = transform.normal(rec.normal);
        Some(rec)
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}
