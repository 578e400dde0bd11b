// Affine local-to-world transforms for primitives.
//
// Wraps a glam::Mat4 together with its inverse so rays can be carried into a
// shape's canonical space and hit data carried back out without re-inverting
// per query.

use crate::{Aabb, Mat4, Ray, Vec3, Vec4};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    matrix: Mat4,
    inverse: Mat4,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        matrix: Mat4::IDENTITY,
        inverse: Mat4::IDENTITY,
    };

    /// Wrap an invertible matrix.
    pub fn from_mat4(matrix: Mat4) -> Self {
        Self {
            matrix,
            inverse: matrix.inverse(),
        }
    }

    /// Map the canonical local axes onto `x_axis`, `y_axis`, `z_axis` and the
    /// local origin onto `origin`.
    pub fn from_frame(origin: Vec3, x_axis: Vec3, y_axis: Vec3, z_axis: Vec3) -> Self {
        Self::from_mat4(Mat4::from_cols(
            x_axis.extend(0.0),
            y_axis.extend(0.0),
            z_axis.extend(0.0),
            origin.extend(1.0),
        ))
    }

    /// Transform for the planar shapes whose canonical form lies on `y = 0`
    /// spanned by local `x` and `z`: `p0` is the local origin, `p1` the tip of
    /// local `x` and `p2` the tip of local `z`. Local `y` becomes the unit
    /// normal of the triangle `(p0, p1, p2)`.
    pub fn from_points(p0: Vec3, p1: Vec3, p2: Vec3) -> Self {
        let e1 = p1 - p0;
        let e2 = p2 - p0;
        let normal = e2.cross(e1).normalize_or_zero();
        Self::from_frame(p0, e1, normal, e2)
    }

    #[inline]
    pub fn point(&self, p: Vec3) -> Vec3 {
        self.matrix.transform_point3(p)
    }

    /// Transform a direction (w = 0): translation does not apply.
    #[inline]
    pub fn vector(&self, v: Vec3) -> Vec3 {
        let t = self.matrix * Vec4::new(v.x, v.y, v.z, 0.0);
        Vec3::new(t.x, t.y, t.z)
    }

    /// Transform a surface normal with the inverse transpose and renormalize.
    #[inline]
    pub fn normal(&self, n: Vec3) -> Vec3 {
        self.inverse.transpose().transform_vector3(n).normalize_or_zero()
    }

    /// Carry a world ray into local space. The direction is not renormalized
    /// so hit times stay valid in both spaces.
    #[inline]
    pub fn ray_to_local(&self, r: &Ray) -> Ray {
        Ray::new(
            self.inverse.transform_point3(r.origin),
            self.inverse.transform_vector3(r.direction),
        )
    }

    /// Bounding box of the 8 transformed corners. Unbounded boxes stay the
    /// universe box since their corners have no finite image.
    pub fn aabb(&self, aabb: &Aabb) -> Aabb {
        let lo = aabb.min_point();
        let hi = aabb.max_point();
        // Inverted bounds hold nothing; flat boxes (min == max) still transform
        if lo.cmpgt(hi).any() {
            return Aabb::EMPTY;
        }
        if !lo.is_finite() || !hi.is_finite() {
            return Aabb::UNIVERSE;
        }

        let corners = aabb.corners();
        let first = self.point(corners[0]);
        let (min, max) = corners[1..]
            .iter()
            .map(|&c| self.point(c))
            .fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));

        Aabb::from_points(min, max)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Transform::IDENTITY
    }
}
