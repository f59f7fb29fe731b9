//! Asset types shared through the ownership core
//!
//! A minimal polymorphic asset hierarchy: mesh geometry sources, the mesh and
//! static-mesh assets that reference them, and prefabs. Assets are held as
//! type-erased [`AnyRef`] handles and recovered with
//! [`AnyRef::downcast`](crate::core::AnyRef::downcast); a failed downcast
//! means "asset not of the expected type" and yields `None` without touching
//! reference counts.
//!
//! Loading and serialization are handled elsewhere; these types carry the
//! geometry the viewport needs for picking.

use crate::core::{AnyRef, Ref, RefCounted, RefCounter};
use crate::foundation::math::{Mat4, Vec3};
use crate::scene::Aabb;
use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};

/// Discriminates the concrete asset behind a type-erased handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetType {
    /// Not a recognized asset
    None,
    /// Shared mesh geometry ([`MeshSource`])
    MeshSource,
    /// A dynamic mesh instance ([`Mesh`])
    Mesh,
    /// A non-deforming mesh instance ([`StaticMesh`])
    StaticMesh,
    /// A reusable entity template ([`Prefab`])
    Prefab,
}

/// Opaque per-asset identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssetHandle(u64);

impl AssetHandle {
    /// Allocate the next process-unique handle
    pub fn generate() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw handle value
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Common surface of every asset
pub trait Asset: RefCounted {
    /// The concrete kind of this asset
    fn asset_type(&self) -> AssetType;

    /// This asset's identifier
    fn handle(&self) -> AssetHandle;
}

/// A single triangle, positions only
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// First corner
    pub a: Vec3,
    /// Second corner
    pub b: Vec3,
    /// Third corner
    pub c: Vec3,
}

impl Triangle {
    /// Create a triangle from three corners
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self { a, b, c }
    }
}

/// One drawable section of a mesh source
///
/// Carries its own object-space bounding box and a local offset transform
/// applied beneath the owning entity's world transform. The triangle list is
/// a picking cache; render vertex data lives with the renderer.
#[derive(Debug, Clone)]
pub struct Submesh {
    /// Bounding box around the triangle list, in submesh-local space
    pub bounds: Aabb,
    /// Offset of this submesh relative to the mesh origin
    pub local_transform: Mat4,
    /// Position-only triangle cache used by ray picking
    pub triangles: Vec<Triangle>,
}

impl Submesh {
    /// Build a submesh from triangles, computing the bounding box
    pub fn from_triangles(local_transform: Mat4, triangles: Vec<Triangle>) -> Self {
        let bounds = Aabb::from_points(
            triangles
                .iter()
                .flat_map(|triangle| [triangle.a, triangle.b, triangle.c]),
        );
        Self {
            bounds,
            local_transform,
            triangles,
        }
    }
}

/// Shared mesh geometry referenced by [`Mesh`] and [`StaticMesh`] assets
#[derive(Debug)]
pub struct MeshSource {
    counter: RefCounter,
    handle: AssetHandle,
    submeshes: Vec<Submesh>,
    bounds: Aabb,
}

impl MeshSource {
    /// Create a mesh source, computing the whole-mesh bounding box
    pub fn new(submeshes: Vec<Submesh>) -> Self {
        let mut bounds = Aabb::empty();
        for submesh in &submeshes {
            bounds.union(&submesh.bounds);
        }
        Self {
            counter: RefCounter::new(),
            handle: AssetHandle::generate(),
            submeshes,
            bounds,
        }
    }

    /// All submeshes in source order
    pub fn submeshes(&self) -> &[Submesh] {
        &self.submeshes
    }

    /// Union of the submesh bounding boxes
    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }
}

impl RefCounted for MeshSource {
    fn ref_counter(&self) -> &RefCounter {
        &self.counter
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Asset for MeshSource {
    fn asset_type(&self) -> AssetType {
        AssetType::MeshSource
    }
    fn handle(&self) -> AssetHandle {
        self.handle
    }
}

/// A mesh asset: shared geometry plus a submesh selection
#[derive(Debug)]
pub struct Mesh {
    counter: RefCounter,
    handle: AssetHandle,
    source: Ref<MeshSource>,
    submesh_indices: Vec<usize>,
}

impl Mesh {
    /// Create a mesh exposing every submesh of its source
    pub fn new(source: Ref<MeshSource>) -> Self {
        let submesh_indices = source
            .get()
            .map_or_else(Vec::new, |s| (0..s.submeshes().len()).collect());
        Self::with_submeshes(source, submesh_indices)
    }

    /// Create a mesh exposing a subset of its source's submeshes
    pub fn with_submeshes(source: Ref<MeshSource>, submesh_indices: Vec<usize>) -> Self {
        Self {
            counter: RefCounter::new(),
            handle: AssetHandle::generate(),
            source,
            submesh_indices,
        }
    }

    /// The shared geometry
    pub fn source(&self) -> &Ref<MeshSource> {
        &self.source
    }

    /// Indices into the source's submesh list
    pub fn submesh_indices(&self) -> &[usize] {
        &self.submesh_indices
    }
}

impl RefCounted for Mesh {
    fn ref_counter(&self) -> &RefCounter {
        &self.counter
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Asset for Mesh {
    fn asset_type(&self) -> AssetType {
        AssetType::Mesh
    }
    fn handle(&self) -> AssetHandle {
        self.handle
    }
}

/// A non-deforming mesh asset
///
/// Same shape as [`Mesh`]; the split matters to the renderer, while picking
/// treats both identically.
#[derive(Debug)]
pub struct StaticMesh {
    counter: RefCounter,
    handle: AssetHandle,
    source: Ref<MeshSource>,
    submesh_indices: Vec<usize>,
}

impl StaticMesh {
    /// Create a static mesh exposing every submesh of its source
    pub fn new(source: Ref<MeshSource>) -> Self {
        let submesh_indices = source
            .get()
            .map_or_else(Vec::new, |s| (0..s.submeshes().len()).collect());
        Self {
            counter: RefCounter::new(),
            handle: AssetHandle::generate(),
            source,
            submesh_indices,
        }
    }

    /// The shared geometry
    pub fn source(&self) -> &Ref<MeshSource> {
        &self.source
    }

    /// Indices into the source's submesh list
    pub fn submesh_indices(&self) -> &[usize] {
        &self.submesh_indices
    }
}

impl RefCounted for StaticMesh {
    fn ref_counter(&self) -> &RefCounter {
        &self.counter
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Asset for StaticMesh {
    fn asset_type(&self) -> AssetType {
        AssetType::StaticMesh
    }
    fn handle(&self) -> AssetHandle {
        self.handle
    }
}

/// A reusable entity template asset
///
/// Carries no payload here; its instantiation machinery lives with the
/// project layer. It exists so scene components can reference one and so the
/// downcast path has a second unrelated asset kind to reject.
#[derive(Debug)]
pub struct Prefab {
    counter: RefCounter,
    handle: AssetHandle,
}

impl Prefab {
    /// Create an empty prefab
    pub fn new() -> Self {
        Self {
            counter: RefCounter::new(),
            handle: AssetHandle::generate(),
        }
    }
}

impl Default for Prefab {
    fn default() -> Self {
        Self::new()
    }
}

impl RefCounted for Prefab {
    fn ref_counter(&self) -> &RefCounter {
        &self.counter
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Asset for Prefab {
    fn asset_type(&self) -> AssetType {
        AssetType::Prefab
    }
    fn handle(&self) -> AssetHandle {
        self.handle
    }
}

/// Kind of the asset behind a type-erased handle, `None` for non-assets
pub fn asset_type_of(handle: &AnyRef) -> AssetType {
    if handle.is::<Mesh>() {
        AssetType::Mesh
    } else if handle.is::<StaticMesh>() {
        AssetType::StaticMesh
    } else if handle.is::<MeshSource>() {
        AssetType::MeshSource
    } else if handle.is::<Prefab>() {
        AssetType::Prefab
    } else {
        AssetType::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_quad_source() -> MeshSource {
        let triangles = vec![
            Triangle::new(
                Vec3::new(-1.0, -1.0, 0.0),
                Vec3::new(1.0, -1.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
            ),
            Triangle::new(
                Vec3::new(-1.0, -1.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(-1.0, 1.0, 0.0),
            ),
        ];
        MeshSource::new(vec![Submesh::from_triangles(Mat4::identity(), triangles)])
    }

    #[test]
    fn test_submesh_bounds_cover_triangles() {
        let source = unit_quad_source();
        let bounds = source.bounds();

        assert_eq!(bounds.min, Vec3::new(-1.0, -1.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_mesh_defaults_to_all_submeshes() {
        let source = Ref::new(unit_quad_source());
        let mesh = Mesh::new(source.clone());

        assert_eq!(mesh.submesh_indices(), &[0]);
        assert_eq!(source.use_count(), 2);
    }

    #[test]
    fn test_downcast_recovers_concrete_asset() {
        let source = Ref::new(unit_quad_source());
        let mesh = Ref::new(Mesh::new(source));
        let erased = mesh.to_any();

        let recovered = erased.downcast::<Mesh>().expect("handle holds a Mesh");
        assert_eq!(recovered.asset_type(), AssetType::Mesh);
        assert_eq!(recovered.handle(), mesh.handle());

        assert!(erased.downcast::<StaticMesh>().is_none());
        assert_eq!(asset_type_of(&erased), AssetType::Mesh);
    }

    #[test]
    fn test_asset_handles_are_unique() {
        let a = Prefab::new();
        let b = Prefab::new();
        assert_ne!(a.handle(), b.handle());
    }
}
