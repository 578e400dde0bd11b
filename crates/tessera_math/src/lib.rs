// Re-export glam for convenience
pub use glam::*;

// Tessera math types
mod aabb;
mod interval;
mod ray;
mod transform;

pub use aabb::Aabb;
pub use interval::Interval;
pub use ray::Ray;
pub use transform::Transform;

/// Index of an axis (0=X, 1=Y, 2=Z) into a vector.
#[inline]
pub fn axis_component(v: Vec3, axis: usize) -> f32 {
    match axis {
        0 => v.x,
        1 => v.y,
        _ => v.z,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_component() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(axis_component(v, 0), 1.0);
        assert_eq!(axis_component(v, 1), 2.0);
        assert_eq!(axis_component(v, 2), 3.0);
    }
}
