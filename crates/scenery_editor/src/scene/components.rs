//! Entity components
//!
//! Plain data attached to scene entities. The transform component tracks
//! Euler angles alongside the quaternion so gizmo rotation edits accumulate
//! through the same representation the user sees, instead of collapsing
//! whole revolutions on every decompose.

use crate::core::AnyRef;
use crate::foundation::math::{
    decompose_transform, euler_angles, quat_from_euler, Mat4, Quat, Vec3,
};

/// Local-space transform of an entity, relative to its parent
#[derive(Debug, Clone, PartialEq)]
pub struct TransformComponent {
    /// Translation relative to the parent
    pub translation: Vec3,
    /// Scale factors relative to the parent
    pub scale: Vec3,
    rotation: Quat,
    rotation_euler: Vec3,
}

impl Default for TransformComponent {
    fn default() -> Self {
        Self {
            translation: Vec3::zeros(),
            scale: Vec3::new(1.0, 1.0, 1.0),
            rotation: Quat::identity(),
            rotation_euler: Vec3::zeros(),
        }
    }
}

impl TransformComponent {
    /// Create an identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// The rotation quaternion
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Intrinsic XYZ Euler angles (radians) tracked for this rotation
    pub fn rotation_euler(&self) -> Vec3 {
        self.rotation_euler
    }

    /// Set rotation from a quaternion, re-deriving the tracked Euler angles
    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
        self.rotation_euler = euler_angles(&rotation);
    }

    /// Set rotation from Euler angles, keeping them as the tracked state
    pub fn set_rotation_euler(&mut self, euler: Vec3) {
        self.rotation_euler = euler;
        self.rotation = quat_from_euler(euler);
    }

    /// Replace the whole transform by decomposing a TRS matrix
    pub fn set_transform(&mut self, matrix: &Mat4) {
        let (translation, rotation, scale) = decompose_transform(matrix);
        self.translation = translation;
        self.scale = scale;
        self.set_rotation(rotation);
    }

    /// Compose the local TRS matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.translation)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }
}

/// Attaches a mesh asset to an entity
///
/// The handle is type-erased; consumers downcast to
/// [`Mesh`](crate::assets::Mesh) and treat any other payload as "no
/// geometry".
#[derive(Debug, Clone)]
pub struct MeshComponent {
    /// Type-erased mesh asset handle
    pub mesh: AnyRef,
    /// Which submesh of the source this entity draws
    pub submesh_index: usize,
}

/// Attaches a static mesh asset to an entity
///
/// Unlike [`MeshComponent`], every submesh of the source participates.
#[derive(Debug, Clone)]
pub struct StaticMeshComponent {
    /// Type-erased static mesh asset handle
    pub static_mesh: AnyRef,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::constants;
    use approx::assert_relative_eq;

    #[test]
    fn test_euler_tracking_survives_quat_roundtrip() {
        let mut transform = TransformComponent::identity();
        transform.set_rotation_euler(Vec3::new(0.25, -1.0, 0.5));

        let matrix = transform.to_matrix();
        let mut decomposed = TransformComponent::identity();
        decomposed.set_transform(&matrix);

        assert_relative_eq!(
            decomposed.rotation_euler(),
            transform.rotation_euler(),
            epsilon = 1e-4
        );
    }

    #[test]
    fn test_set_transform_recovers_components() {
        let mut transform = TransformComponent::identity();
        transform.translation = Vec3::new(4.0, -2.0, 7.0);
        transform.scale = Vec3::new(2.0, 0.5, 3.0);
        transform.set_rotation_euler(Vec3::new(0.0, constants::HALF_PI * 0.5, 0.0));

        let mut recovered = TransformComponent::identity();
        recovered.set_transform(&transform.to_matrix());

        assert_relative_eq!(recovered.translation, transform.translation, epsilon = 1e-4);
        assert_relative_eq!(recovered.scale, transform.scale, epsilon = 1e-4);
        assert_relative_eq!(
            recovered.rotation_euler(),
            transform.rotation_euler(),
            epsilon = 1e-4
        );
    }
}
