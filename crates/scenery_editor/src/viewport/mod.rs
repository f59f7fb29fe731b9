//! Viewport: camera, picking rays, and gizmo application

pub mod camera;
pub mod gizmo;
pub mod picking;
pub mod ray;

pub use camera::EditorCamera;
pub use gizmo::{
    GizmoEngine, GizmoMode, NullOperationLog, OperationLog, SnapSettings, TransformTarget,
};
pub use picking::{cast_ray, mouse_to_viewport_space, pick, pick_candidates, PickCandidate, PickModifiers};
pub use ray::Ray;
