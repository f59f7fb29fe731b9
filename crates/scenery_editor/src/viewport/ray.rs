//! World- and object-space rays
//!
//! Degenerate inputs (zero-length directions, degenerate triangles,
//! non-invertible transforms) report "no hit" rather than propagating
//! NaN or Inf into pick distances.

use crate::foundation::math::{Mat3, Mat4, Vec3, Vec4};
use crate::scene::Aabb;

const DET_EPSILON: f32 = 1e-8;

/// A ray with origin and (not necessarily normalized) direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Ray origin
    pub origin: Vec3,
    /// Ray direction
    pub direction: Vec3,
}

impl Ray {
    /// Create a ray
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Re-express the ray in the space described by `matrix`
    ///
    /// The origin moves through the full inverse, the direction through the
    /// inverse of the linear part only. `None` if the matrix is singular.
    pub fn transformed_into(&self, matrix: &Mat4) -> Option<Ray> {
        let inverse = matrix.try_inverse()?;
        let inverse_linear = linear_part(matrix).try_inverse()?;

        let origin = inverse * Vec4::new(self.origin.x, self.origin.y, self.origin.z, 1.0);
        Some(Ray {
            origin: Vec3::new(origin.x, origin.y, origin.z),
            direction: inverse_linear * self.direction,
        })
    }

    /// Slab-method ray/box test
    ///
    /// Returns the entry distance (0 when the origin is inside the box).
    /// Axis-parallel rays degrade to infinite slab distances rather than
    /// dividing by zero.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> Option<f32> {
        let inv_dir = Vec3::new(
            if self.direction.x != 0.0 {
                1.0 / self.direction.x
            } else {
                f32::INFINITY
            },
            if self.direction.y != 0.0 {
                1.0 / self.direction.y
            } else {
                f32::INFINITY
            },
            if self.direction.z != 0.0 {
                1.0 / self.direction.z
            } else {
                f32::INFINITY
            },
        );

        let t1 = (aabb.min.x - self.origin.x) * inv_dir.x;
        let t2 = (aabb.max.x - self.origin.x) * inv_dir.x;
        let t3 = (aabb.min.y - self.origin.y) * inv_dir.y;
        let t4 = (aabb.max.y - self.origin.y) * inv_dir.y;
        let t5 = (aabb.min.z - self.origin.z) * inv_dir.z;
        let t6 = (aabb.max.z - self.origin.z) * inv_dir.z;

        let tmin = t1.min(t2).max(t3.min(t4)).max(t5.min(t6));
        let tmax = t1.max(t2).min(t3.max(t4)).min(t5.max(t6));

        if tmax >= tmin && tmax >= 0.0 {
            Some(tmin.max(0.0))
        } else {
            None
        }
    }

    /// Möller–Trumbore ray/triangle test, front and back faces
    ///
    /// Degenerate triangles and near-parallel rays produce `None`; the
    /// comparison is written so NaN determinants also fall out as misses.
    pub fn intersects_triangle(&self, a: Vec3, b: Vec3, c: Vec3) -> Option<f32> {
        let edge1 = b - a;
        let edge2 = c - a;

        let p = self.direction.cross(&edge2);
        let det = edge1.dot(&p);
        if !(det.abs() > DET_EPSILON) {
            return None;
        }
        let inv_det = 1.0 / det;

        let s = self.origin - a;
        let u = s.dot(&p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(&edge1);
        let v = self.direction.dot(&q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = edge2.dot(&q) * inv_det;
        (t > 0.0).then_some(t)
    }
}

pub(crate) fn linear_part(matrix: &Mat4) -> Mat3 {
    Mat3::new(
        matrix.m11, matrix.m12, matrix.m13, //
        matrix.m21, matrix.m22, matrix.m23, //
        matrix.m31, matrix.m32, matrix.m33,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn toward_origin_from_z() -> Ray {
        Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0))
    }

    #[test]
    fn test_aabb_hit_and_miss() {
        let bounds = Aabb::from_center_extents(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));

        let hit = toward_origin_from_z().intersects_aabb(&bounds);
        assert_relative_eq!(hit.unwrap(), 4.0, epsilon = 1e-5);

        let miss = Ray::new(Vec3::new(5.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(miss.intersects_aabb(&bounds).is_none());
    }

    #[test]
    fn test_aabb_origin_inside_returns_zero() {
        let bounds = Aabb::from_center_extents(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        let inside = Ray::new(Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(inside.intersects_aabb(&bounds), Some(0.0));
    }

    #[test]
    fn test_triangle_hit() {
        let t = toward_origin_from_z().intersects_triangle(
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        assert_relative_eq!(t.unwrap(), 5.0, epsilon = 1e-5);
    }

    #[test]
    fn test_triangle_behind_ray_misses() {
        let behind = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, -1.0));
        let t = behind.intersects_triangle(
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        assert!(t.is_none());
    }

    #[test]
    fn test_degenerate_triangle_misses_without_nan() {
        let point = Vec3::new(0.0, 0.0, 0.0);
        let t = toward_origin_from_z().intersects_triangle(point, point, point);
        assert!(t.is_none());
    }

    #[test]
    fn test_zero_direction_misses() {
        let stuck = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::zeros());
        let t = stuck.intersects_triangle(
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        assert!(t.is_none());
    }

    #[test]
    fn test_transformed_into_local_space() {
        let world = Mat4::new_translation(&Vec3::new(10.0, 0.0, 0.0));
        let ray = Ray::new(Vec3::new(10.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));

        let local = ray.transformed_into(&world).expect("translation inverts");
        assert_relative_eq!(local.origin, Vec3::new(0.0, 0.0, 5.0), epsilon = 1e-5);
        assert_relative_eq!(local.direction, ray.direction, epsilon = 1e-5);
    }

    #[test]
    fn test_transformed_into_singular_matrix() {
        let flat = Mat4::new_nonuniform_scaling(&Vec3::new(1.0, 0.0, 1.0));
        let ray = toward_origin_from_z();
        assert!(ray.transformed_into(&flat).is_none());
    }
}
