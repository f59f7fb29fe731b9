//! Transform gizmo application
//!
//! The widget that draws handles and produces manipulated matrices lives in
//! the UI layer; this engine turns those matrices into scene transform
//! edits. Single selections re-express the manipulated world matrix in
//! parent space and write back only the active mode's component, which keeps
//! repeated manipulations from compounding floating-point drift into the
//! untouched components. Multi selections manipulate a synthetic mean pivot
//! and apply the resulting delta per the configured target policy.
//!
//! Rotation edits travel through Euler angles in both paths: deltas are
//! wrapped to `[-pi, pi]` and sub-milliradian deltas are snapped to zero,
//! so whole revolutions accumulated on an entity survive round-trips
//! through matrix decomposition.

use crate::foundation::math::{
    decompose_transform, euler_angles, quat_from_euler, wrap_pi, Mat4, Vec3,
};
use crate::scene::{EntityId, Scene, TransformComponent};
use log::debug;
use serde::{Deserialize, Serialize};

/// Rotation deltas below this are treated as numerical noise (radians)
const ROTATION_EPSILON: f32 = 0.001;

/// Which transform component the gizmo manipulates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GizmoMode {
    /// Move the selection
    Translate,
    /// Rotate the selection
    Rotate,
    /// Scale the selection
    Scale,
}

/// How a multi-entity manipulation is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransformTarget {
    /// Apply the full delta about the shared mean pivot
    MedianPoint,
    /// Apply the decomposed delta about each entity's own origin
    IndividualOrigins,
}

/// Per-operation snap increments
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapSettings {
    /// Translation increment in world units
    pub translation: f32,
    /// Rotation increment in radians
    pub rotation: f32,
    /// Scale-factor increment
    pub scale: f32,
}

impl Default for SnapSettings {
    fn default() -> Self {
        Self {
            translation: 0.5,
            rotation: 45.0_f32.to_radians(),
            scale: 0.5,
        }
    }
}

/// Undo/redo collaborator bracketing each manipulation
///
/// `begin_transform` hands over the pre-manipulation snapshot;
/// `commit` closes the bracket once the edit is written back.
pub trait OperationLog {
    /// A manipulation of `entity` is about to be applied
    fn begin_transform(&mut self, entity: EntityId, snapshot: &TransformComponent);

    /// The manipulation opened by the last `begin_transform` is complete
    fn commit(&mut self);
}

/// Discards all operation notifications
#[derive(Debug, Default, Clone, Copy)]
pub struct NullOperationLog;

impl OperationLog for NullOperationLog {
    fn begin_transform(&mut self, _entity: EntityId, _snapshot: &TransformComponent) {}
    fn commit(&mut self) {}
}

/// Applies gizmo manipulation results to scene transforms
#[derive(Debug, Clone)]
pub struct GizmoEngine {
    /// Active manipulation mode
    pub mode: GizmoMode,
    /// Multi-entity application policy
    pub target: TransformTarget,
    /// Manipulate along world axes instead of the selection's local axes
    ///
    /// Interpretation-only: toggling changes how the widget orients its
    /// handles, never any transform.
    pub world_orientation: bool,
    /// Snap increments used while the snap modifier is held
    pub snap: SnapSettings,
}

impl Default for GizmoEngine {
    fn default() -> Self {
        Self {
            mode: GizmoMode::Translate,
            target: TransformTarget::MedianPoint,
            world_orientation: true,
            snap: SnapSettings::default(),
        }
    }
}

impl GizmoEngine {
    /// Create an engine with default mode and snap settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a manipulated world matrix to a single selected entity
    ///
    /// `manipulated_world` is the entity's world matrix as returned by the
    /// gizmo widget. With a parent, the matrix is first re-expressed in the
    /// parent's space; only the active mode's component of the decomposition
    /// is written back. Returns `false` (leaving the scene untouched) for
    /// unknown entities or a non-invertible parent transform.
    pub fn manipulate_single(
        &self,
        scene: &mut Scene,
        entity: EntityId,
        manipulated_world: &Mat4,
        snap_held: bool,
        log: &mut dyn OperationLog,
    ) -> bool {
        let Some(snapshot) = scene.transform(entity).cloned() else {
            return false;
        };

        let mut local = *manipulated_world;
        if let Some(parent) = scene.parent(entity) {
            let Some(inverse_parent) = scene.world_matrix(parent).try_inverse() else {
                debug!("skipping gizmo edit of {entity}: parent transform not invertible");
                return false;
            };
            local = inverse_parent * local;
        }
        let (translation, rotation, scale) = decompose_transform(&local);

        log.begin_transform(entity, &snapshot);
        let Some(transform) = scene.transform_mut(entity) else {
            return false;
        };
        match self.mode {
            GizmoMode::Translate => {
                let mut delta = translation - snapshot.translation;
                if snap_held {
                    delta = quantize_vec(delta, self.snap.translation);
                }
                transform.translation = snapshot.translation + delta;
            }
            GizmoMode::Rotate => {
                // The widget reports angles in [-pi, pi]; compare against the
                // wrapped original so revolutions beyond a full turn survive.
                let original = snapshot.rotation_euler();
                let wrapped = Vec3::new(
                    wrap_pi(original.x),
                    wrap_pi(original.y),
                    wrap_pi(original.z),
                );
                let delta = corrected_rotation_delta(
                    euler_angles(&rotation) - wrapped,
                    snap_held.then_some(self.snap.rotation),
                );
                transform.set_rotation_euler(original + delta);
            }
            GizmoMode::Scale => {
                let mut delta = scale - snapshot.scale;
                if snap_held {
                    delta = quantize_vec(delta, self.snap.scale);
                }
                transform.scale = snapshot.scale + delta;
            }
        }
        log.commit();
        true
    }

    /// The synthetic pivot matrix for a multi-entity manipulation
    ///
    /// Arithmetic mean of the selected entities' translation, scale, and
    /// Euler rotation; identity when the selection is empty.
    pub fn median_pivot(&self, scene: &Scene, selections: &[EntityId]) -> Mat4 {
        if selections.is_empty() {
            return Mat4::identity();
        }

        let mut translation = Vec3::zeros();
        let mut scale = Vec3::zeros();
        let mut rotation = Vec3::zeros();
        for &entity in selections {
            if let Some(transform) = scene.transform(entity) {
                translation += transform.translation;
                scale += transform.scale;
                rotation += transform.rotation_euler();
            }
        }
        #[allow(clippy::cast_precision_loss)]
        let count = selections.len() as f32;
        compose(
            translation / count,
            rotation / count,
            scale / count,
        )
    }

    /// Apply a pivot-space delta matrix to a multi-entity selection
    ///
    /// `delta` is the before/after difference of the manipulated
    /// [`median_pivot`](Self::median_pivot) matrix. Scale in median-pivot
    /// mode is rejected outright; the combined operation shears. Returns
    /// `false` when nothing was applied.
    pub fn manipulate_multi(
        &self,
        scene: &mut Scene,
        selections: &[EntityId],
        delta: &Mat4,
        snap_held: bool,
        log: &mut dyn OperationLog,
    ) -> bool {
        if selections.is_empty() {
            return false;
        }
        if self.target == TransformTarget::MedianPoint && self.mode == GizmoMode::Scale {
            debug!("median-point multi-scale is disabled");
            return false;
        }

        let delta = if snap_held {
            self.quantize_delta(delta)
        } else {
            *delta
        };

        match self.target {
            TransformTarget::MedianPoint => {
                for &entity in selections {
                    let Some(snapshot) = scene.transform(entity).cloned() else {
                        continue;
                    };
                    log.begin_transform(entity, &snapshot);
                    let manipulated = delta * snapshot.to_matrix();
                    if let Some(transform) = scene.transform_mut(entity) {
                        transform.set_transform(&manipulated);
                    }
                    log.commit();
                }
            }
            TransformTarget::IndividualOrigins => {
                let (delta_translation, delta_rotation, delta_scale) =
                    decompose_transform(&delta);
                let delta_euler = corrected_rotation_delta(euler_angles(&delta_rotation), None);

                for &entity in selections {
                    let Some(snapshot) = scene.transform(entity).cloned() else {
                        continue;
                    };
                    log.begin_transform(entity, &snapshot);
                    if let Some(transform) = scene.transform_mut(entity) {
                        match self.mode {
                            GizmoMode::Translate => {
                                transform.translation += delta_translation;
                            }
                            GizmoMode::Rotate => {
                                transform
                                    .set_rotation_euler(transform.rotation_euler() + delta_euler);
                            }
                            GizmoMode::Scale => {
                                if delta_scale != Vec3::new(1.0, 1.0, 1.0) {
                                    transform.scale.component_mul_assign(&delta_scale);
                                }
                            }
                        }
                    }
                    log.commit();
                }
            }
        }
        true
    }

    // Quantizes only the active mode's component of the delta, leaving the
    // others untouched.
    fn quantize_delta(&self, delta: &Mat4) -> Mat4 {
        let (translation, rotation, scale) = decompose_transform(delta);
        let euler = euler_angles(&rotation);
        match self.mode {
            GizmoMode::Translate => compose(
                quantize_vec(translation, self.snap.translation),
                euler,
                scale,
            ),
            GizmoMode::Rotate => compose(
                translation,
                quantize_vec(euler, self.snap.rotation),
                scale,
            ),
            GizmoMode::Scale => {
                let ones = Vec3::new(1.0, 1.0, 1.0);
                compose(
                    translation,
                    euler,
                    ones + quantize_vec(scale - ones, self.snap.scale),
                )
            }
        }
    }
}

/// Wrap a per-axis rotation delta to `[-pi, pi]` and flush noise to zero
fn corrected_rotation_delta(delta: Vec3, snap: Option<f32>) -> Vec3 {
    let mut corrected = Vec3::new(wrap_pi(delta.x), wrap_pi(delta.y), wrap_pi(delta.z));
    for axis in 0..3 {
        if corrected[axis].abs() < ROTATION_EPSILON {
            corrected[axis] = 0.0;
        }
    }
    if let Some(increment) = snap {
        corrected = quantize_vec(corrected, increment);
    }
    corrected
}

/// Round each component to the nearest multiple of `increment`
fn quantize_vec(value: Vec3, increment: f32) -> Vec3 {
    Vec3::new(
        quantize(value.x, increment),
        quantize(value.y, increment),
        quantize(value.z, increment),
    )
}

fn quantize(value: f32, increment: f32) -> f32 {
    if increment > 0.0 {
        (value / increment).round() * increment
    } else {
        value
    }
}

fn compose(translation: Vec3, euler: Vec3, scale: Vec3) -> Mat4 {
    Mat4::new_translation(&translation)
        * quat_from_euler(euler).to_homogeneous()
        * Mat4::new_nonuniform_scaling(&scale)
}
