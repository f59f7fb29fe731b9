//! Mouse picking against scene mesh geometry
//!
//! A click becomes a world-space ray, the ray is tested against every
//! entity exposing mesh geometry (box reject first, then the cached
//! triangle list), and the nearest hit drives the selection update. Entities
//! without resolvable mesh assets are skipped; a handle of the wrong
//! concrete type is "no geometry", not an error.

use crate::assets::{Mesh, StaticMesh, Submesh};
use crate::foundation::math::{Vec2, Vec3, Vec4};
use crate::scene::{EntityId, Scene};
use crate::selection::SelectionManager;
use crate::viewport::camera::EditorCamera;
use crate::viewport::ray::{linear_part, Ray};
use bitflags::bitflags;
use log::debug;

bitflags! {
    /// Modifier keys held during a pick click
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PickModifiers: u8 {
        /// Toggle the hit entity, preserving the rest of the selection
        const CTRL = 1;
        /// Select the hit entity's outermost ancestor instead of the leaf
        const SHIFT = 1 << 1;
    }
}

/// One ray hit against an entity's geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickCandidate {
    /// The entity owning the geometry
    pub entity: EntityId,
    /// Which submesh of the entity's source was hit
    pub submesh_index: usize,
    /// Distance from the ray origin to the hit, in submesh-local units
    pub distance: f32,
}

/// Map a pixel position into normalized viewport space
///
/// Output spans `(-1, 1)` on both axes with Y up; `None` when the position
/// is outside the viewport bounds or the bounds are degenerate.
pub fn mouse_to_viewport_space(mouse: Vec2, bounds: &[Vec2; 2]) -> Option<(f32, f32)> {
    let size = bounds[1] - bounds[0];
    if size.x <= 0.0 || size.y <= 0.0 {
        return None;
    }
    let local = mouse - bounds[0];
    let mx = (local.x / size.x) * 2.0 - 1.0;
    let my = ((local.y / size.y) * 2.0 - 1.0) * -1.0;

    (mx > -1.0 && mx < 1.0 && my > -1.0 && my < 1.0).then_some((mx, my))
}

/// Build a world-space pick ray through a normalized viewport position
///
/// Unprojects through the inverse projection, rotates by the inverse of the
/// rotation-only view matrix, and originates at the camera position. `None`
/// if either matrix fails to invert.
pub fn cast_ray(camera: &EditorCamera, mx: f32, my: f32) -> Option<Ray> {
    let clip = Vec4::new(mx, my, -1.0, 1.0);

    let inverse_projection = camera.projection_matrix().try_inverse()?;
    let inverse_view = linear_part(&camera.view_matrix()).try_inverse()?;

    let eye = inverse_projection * clip;
    // The projection maps view space onto +Z clip depth while the view
    // matrix looks down -Z, so the unprojected depth flips sign here.
    let direction = inverse_view * Vec3::new(eye.x, eye.y, -eye.z);

    Some(Ray::new(camera.position(), direction))
}

/// All ray hits across the scene, sorted by ascending distance
pub fn pick_candidates(scene: &Scene, ray: &Ray) -> Vec<PickCandidate> {
    let mut candidates = Vec::new();
    for entity in scene.entities() {
        collect_mesh_hits(scene, entity, ray, &mut candidates);
        collect_static_mesh_hits(scene, entity, ray, &mut candidates);
    }
    candidates.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    candidates
}

/// Resolve a click into a selection update
///
/// Callers gate this on the click actually reaching the viewport: clicks
/// consumed by a gizmo handle or other UI, or arriving while the scene is
/// locked, must not be forwarded here. Out-of-bounds positions mutate
/// nothing. Otherwise: a plain click replaces the scene's selection with
/// the nearest hit (or clears it on a miss), CTRL toggles the hit entity
/// while preserving the rest, and SHIFT selects the hit's outermost
/// ancestor.
pub fn pick(
    scene: &Scene,
    selection: &mut SelectionManager,
    camera: &EditorCamera,
    mouse: Vec2,
    modifiers: PickModifiers,
) -> Option<PickCandidate> {
    let (mx, my) = mouse_to_viewport_space(mouse, camera.viewport_bounds())?;
    let ray = cast_ray(camera, mx, my)?;
    let candidates = pick_candidates(scene, &ray);

    if !modifiers.contains(PickModifiers::CTRL) {
        selection.deselect_all_in(scene.id());
    }

    let nearest = *candidates.first()?;
    let mut entity = nearest.entity;
    if modifiers.contains(PickModifiers::SHIFT) {
        entity = scene.root_ancestor(entity);
    }

    if modifiers.contains(PickModifiers::CTRL) && selection.is_selected_in(scene.id(), entity) {
        selection.deselect(scene.id(), entity);
    } else {
        selection.select(scene.id(), entity);
    }
    debug!(
        "pick {entity} at distance {:.3} ({} candidates)",
        nearest.distance,
        candidates.len()
    );
    Some(nearest)
}

fn collect_mesh_hits(
    scene: &Scene,
    entity: EntityId,
    ray: &Ray,
    candidates: &mut Vec<PickCandidate>,
) {
    let Some(component) = scene.mesh(entity) else {
        return;
    };
    let Some(mesh) = component.mesh.downcast::<Mesh>() else {
        return;
    };
    let Some(source) = mesh.source().get() else {
        return;
    };
    let Some(submesh) = source.submeshes().get(component.submesh_index) else {
        return;
    };

    let world = scene.world_matrix(entity);
    let Some(local_ray) = ray.transformed_into(&world) else {
        return;
    };
    if let Some(distance) = hit_submesh(&local_ray, submesh) {
        candidates.push(PickCandidate {
            entity,
            submesh_index: component.submesh_index,
            distance,
        });
    }
}

fn collect_static_mesh_hits(
    scene: &Scene,
    entity: EntityId,
    ray: &Ray,
    candidates: &mut Vec<PickCandidate>,
) {
    let Some(component) = scene.static_mesh(entity) else {
        return;
    };
    let Some(static_mesh) = component.static_mesh.downcast::<StaticMesh>() else {
        return;
    };
    let Some(source) = static_mesh.source().get() else {
        return;
    };

    let world = scene.world_matrix(entity);
    for &submesh_index in static_mesh.submesh_indices() {
        let Some(submesh) = source.submeshes().get(submesh_index) else {
            continue;
        };
        let Some(local_ray) = ray.transformed_into(&(world * submesh.local_transform)) else {
            continue;
        };
        if let Some(distance) = hit_submesh(&local_ray, submesh) {
            candidates.push(PickCandidate {
                entity,
                submesh_index,
                distance,
            });
        }
    }
}

// First triangle hit per submesh wins; the box test is the cheap reject.
fn hit_submesh(ray: &Ray, submesh: &Submesh) -> Option<f32> {
    ray.intersects_aabb(&submesh.bounds)?;
    submesh
        .triangles
        .iter()
        .find_map(|triangle| ray.intersects_triangle(triangle.a, triangle.b, triangle.c))
}
