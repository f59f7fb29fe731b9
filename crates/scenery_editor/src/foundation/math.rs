//! Math utilities and types
//!
//! Provides fundamental math types for the 3D viewport and transform tooling.

pub use nalgebra::{Matrix3, Matrix4, Quaternion, Unit, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Transform representing position, rotation, and scale
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Convert to a transformation matrix (TRS order)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Create a transform from a transformation matrix
    pub fn from_matrix(matrix: Mat4) -> Self {
        let (position, rotation, scale) = decompose_transform(&matrix);
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Combine this transform with another (parent * child)
    pub fn combine(&self, other: &Transform) -> Transform {
        Transform {
            position: self.position + self.rotation * (self.scale.component_mul(&other.position)),
            rotation: self.rotation * other.rotation,
            scale: self.scale.component_mul(&other.scale),
        }
    }

    /// Get the inverse transform
    pub fn inverse(&self) -> Transform {
        let inv_scale = Vec3::new(1.0 / self.scale.x, 1.0 / self.scale.y, 1.0 / self.scale.z);
        let inv_rotation = self.rotation.inverse();
        let inv_position = inv_rotation * (-self.position.component_mul(&inv_scale));

        Transform {
            position: inv_position,
            rotation: inv_rotation,
            scale: inv_scale,
        }
    }
}

/// Decompose a TRS matrix into translation, rotation, and scale
///
/// Scale is recovered from the column magnitudes, rotation from the
/// scale-normalized upper 3x3 block. Shear is not representable and is
/// folded into the rotation approximation.
pub fn decompose_transform(matrix: &Mat4) -> (Vec3, Quat, Vec3) {
    let translation = Vec3::new(matrix.m14, matrix.m24, matrix.m34);

    let scale_x = Vec3::new(matrix.m11, matrix.m21, matrix.m31).magnitude();
    let scale_y = Vec3::new(matrix.m12, matrix.m22, matrix.m32).magnitude();
    let scale_z = Vec3::new(matrix.m13, matrix.m23, matrix.m33).magnitude();
    let scale = Vec3::new(scale_x, scale_y, scale_z);

    // Degenerate columns would divide to NaN; fall back to identity rotation.
    if scale_x <= f32::EPSILON || scale_y <= f32::EPSILON || scale_z <= f32::EPSILON {
        return (translation, Quat::identity(), scale);
    }

    let rotation_matrix = Mat3::new(
        matrix.m11 / scale_x,
        matrix.m12 / scale_y,
        matrix.m13 / scale_z,
        matrix.m21 / scale_x,
        matrix.m22 / scale_y,
        matrix.m23 / scale_z,
        matrix.m31 / scale_x,
        matrix.m32 / scale_y,
        matrix.m33 / scale_z,
    );
    let rotation = Quat::from_matrix(&rotation_matrix);

    (translation, rotation, scale)
}

/// Wrap an angle in radians to the `[-PI, PI]` range
pub fn wrap_pi(angle: f32) -> f32 {
    (angle + constants::PI).rem_euclid(constants::TAU) - constants::PI
}

/// Extract intrinsic XYZ Euler angles (radians) from a quaternion
pub fn euler_angles(rotation: &Quat) -> Vec3 {
    let (roll, pitch, yaw) = rotation.euler_angles();
    Vec3::new(roll, pitch, yaw)
}

/// Build a quaternion from intrinsic XYZ Euler angles (radians)
pub fn quat_from_euler(euler: Vec3) -> Quat {
    Quat::from_euler_angles(euler.x, euler.y, euler.z)
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// 2 * Pi
    pub const TAU: f32 = 2.0 * PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Radians to degrees conversion factor
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
}

/// Extension trait for Mat4 with additional convenience methods
pub trait Mat4Ext {
    /// Create a perspective projection matrix (depth mapped to `[0, 1]`)
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Create a right-handed look-at view matrix
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let tan_half_fovy = (fov_y * 0.5).tan();

        let mut result = Mat4::zeros();
        result[(0, 0)] = 1.0 / (aspect * tan_half_fovy);
        result[(1, 1)] = 1.0 / tan_half_fovy;
        result[(2, 2)] = far / (far - near);
        result[(2, 3)] = -(near * far) / (far - near);
        result[(3, 2)] = 1.0;

        result
    }

    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        let forward = (target - eye).normalize();
        let right = forward.cross(&up).normalize();
        let camera_up = right.cross(&forward);

        let translation = Mat4::new(
            1.0, 0.0, 0.0, -eye.x, //
            0.0, 1.0, 0.0, -eye.y, //
            0.0, 0.0, 1.0, -eye.z, //
            0.0, 0.0, 0.0, 1.0,
        );

        let rotation = Mat4::new(
            right.x,
            right.y,
            right.z,
            0.0,
            camera_up.x,
            camera_up.y,
            camera_up.z,
            0.0,
            -forward.x,
            -forward.y,
            -forward.z,
            0.0,
            0.0,
            0.0,
            0.0,
            1.0,
        );

        rotation * translation
    }
}
