//! Editor viewport camera

use crate::foundation::math::{Mat4, Mat4Ext, Vec2, Vec3};

/// Perspective camera driving the editor viewport
///
/// Owns the projection parameters, the look-at view state, and the pixel
/// bounds of the viewport region it renders into. Picking ray construction
/// reads all three.
#[derive(Debug, Clone)]
pub struct EditorCamera {
    position: Vec3,
    view: Mat4,
    fov_y: f32,
    aspect: f32,
    near: f32,
    far: f32,
    viewport_bounds: [Vec2; 2],
}

impl EditorCamera {
    /// Create a camera at the origin looking down -Z
    pub fn new(fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            position: Vec3::zeros(),
            view: Mat4::identity(),
            fov_y,
            aspect,
            near,
            far,
            viewport_bounds: [Vec2::zeros(), Vec2::zeros()],
        };
        camera.look_at(Vec3::zeros(), Vec3::new(0.0, 0.0, -1.0), Vec3::y());
        camera
    }

    /// Place the camera and aim it at a target
    pub fn look_at(&mut self, eye: Vec3, target: Vec3, up: Vec3) {
        self.position = eye;
        self.view = Mat4::look_at(eye, target, up);
    }

    /// The camera's world position
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// The current view matrix
    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    /// The current projection matrix
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective(self.fov_y, self.aspect, self.near, self.far)
    }

    /// Update the aspect ratio, typically on viewport resize
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    /// Set the pixel rectangle this camera renders into
    pub fn set_viewport_bounds(&mut self, min: Vec2, max: Vec2) {
        self.viewport_bounds = [min, max];
    }

    /// The pixel rectangle this camera renders into, `[min, max]`
    pub fn viewport_bounds(&self) -> &[Vec2; 2] {
        &self.viewport_bounds
    }
}
