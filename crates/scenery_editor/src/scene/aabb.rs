//! Axis-aligned bounding boxes

use crate::foundation::math::Vec3;

/// Axis-aligned bounding box in some object or world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl Aabb {
    /// Create a new box from min and max corners
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create a box centered at a point with given half-extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// An inverted box that unions correctly with any point
    pub fn empty() -> Self {
        Self {
            min: Vec3::new(f32::MAX, f32::MAX, f32::MAX),
            max: Vec3::new(f32::MIN, f32::MIN, f32::MIN),
        }
    }

    /// Tightest box enclosing a set of points
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut bounds = Self::empty();
        for point in points {
            bounds.grow(point);
        }
        bounds
    }

    /// Get the center of the box
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the half-size of the box
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Whether the box encloses no volume (never grown, or degenerate)
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Expand the box to contain a point
    pub fn grow(&mut self, point: Vec3) {
        self.min = self.min.inf(&point);
        self.max = self.max.sup(&point);
    }

    /// Expand the box to contain another box
    pub fn union(&mut self, other: &Aabb) {
        if other.is_empty() {
            return;
        }
        self.grow(other.min);
        self.grow(other.max);
    }

    /// Check if this box contains a point
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points_and_center() {
        let bounds = Aabb::from_points([
            Vec3::new(-1.0, 0.0, 2.0),
            Vec3::new(3.0, -2.0, 0.0),
            Vec3::new(1.0, 1.0, 1.0),
        ]);

        assert_eq!(bounds.min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(3.0, 1.0, 2.0));
        assert_eq!(bounds.center(), Vec3::new(1.0, -0.5, 1.0));
    }

    #[test]
    fn test_empty_unions_as_identity() {
        let mut bounds = Aabb::empty();
        assert!(bounds.is_empty());

        bounds.union(&Aabb::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0)));
        assert!(!bounds.is_empty());
        assert_eq!(bounds.min, Vec3::zeros());

        bounds.union(&Aabb::empty());
        assert_eq!(bounds.max, Vec3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_contains_point() {
        let bounds = Aabb::from_center_extents(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        assert!(bounds.contains_point(Vec3::new(0.5, -0.5, 1.0)));
        assert!(!bounds.contains_point(Vec3::new(0.0, 0.0, 1.1)));
    }
}
